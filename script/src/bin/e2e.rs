//! End-to-end run: deposit → spend_22 → spend_11 against an in-process vault.
//!
//! Runs the full shielded vault lifecycle with the selected backend:
//!   1. Deposits three notes (one proof for the whole batch)
//!   2. Spends two notes into a recipient note and change (2-in-2-out)
//!   3. Replays the spend and checks it is rejected
//!   4. Spends the recipient note with a fee (1-in-1-out)
//!   5. Verifies final state (commitment states, balances)
//!   6. Proves every circuit variant concurrently and reports timings
//!
//! Usage:
//!   cargo run --release -p shielded-vault-script --bin e2e
//!   VAULT_PROVER=sp1 SP1_PROVER=network cargo run --release --features sp1 --bin e2e
//!
//! Optional env vars (from .env):
//!   VAULT_PROVER      mock | sp1 (default: mock)
//!   VAULT_MOCK_KEY    hex setup key of the mock backend
//!   VAULT_STATE       registry snapshot, loaded if present and rewritten at the end
//!   DEPOSIT_A/B/C     deposit note amounts (default: 600, 400, 0)
//!   DEPOSIT_FEE       deposit relayer fee (default: 5)
//!   SPEND_FEE         fee of each spend (default: 10)

use alloy_primitives::{Address, Bytes, U256};
use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use shielded_vault_ledger::{
    CommitmentRegistry, DepositCommitmentParams, DepositParams, MockToken, SpendArgs,
    TokenLedger, Vault, VaultError,
};
use shielded_vault_lib::{CircuitVariant, Fr, Note, Pipeline, ProofError, Witness, DEPOSIT_SLOTS};
use shielded_vault_script::backend::Backend;
use shielded_vault_script::config::{init_tracing, ProverArgs, StateArgs};
use shielded_vault_script::wallet::{random_note, Wallet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

const VAULT_ADDRESS: Address = Address::repeat_byte(0xaa);
const TOKEN_ADDRESS: Address = Address::repeat_byte(0x70);
const DEPOSITOR: Address = Address::repeat_byte(0x01);
const RELAYER: Address = Address::repeat_byte(0xfe);

#[derive(Parser)]
#[command(name = "e2e")]
#[command(about = "In-process shielded vault lifecycle")]
struct Cli {
    #[command(flatten)]
    prover: ProverArgs,

    #[command(flatten)]
    state: StateArgs,

    #[arg(long, env = "DEPOSIT_A", default_value_t = 600)]
    deposit_a: u64,
    #[arg(long, env = "DEPOSIT_B", default_value_t = 400)]
    deposit_b: u64,
    #[arg(long, env = "DEPOSIT_C", default_value_t = 0)]
    deposit_c: u64,
    #[arg(long, env = "DEPOSIT_FEE", default_value_t = 5)]
    deposit_fee: u64,
    #[arg(long, env = "SPEND_FEE", default_value_t = 10)]
    spend_fee: u64,

    /// Skip the concurrent proving report
    #[arg(long)]
    skip_perf: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("fixtures")
}

fn load_registry(path: &Path) -> Result<CommitmentRegistry> {
    if !path.exists() {
        return Ok(CommitmentRegistry::new());
    }
    let json =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let registry: CommitmentRegistry = serde_json::from_str(&json)?;
    println!("    Loaded {} commitments from {}", registry.len(), path.display());
    Ok(registry)
}

fn save_registry(path: &Path, registry: &CommitmentRegistry) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(registry)?)?;
    println!("    Registry snapshot saved to {}", path.display());
    Ok(())
}

fn commitments(notes: &[Note]) -> Vec<Fr> {
    notes.iter().map(Note::commitment).collect()
}

/// A satisfying witness for `variant`: the inputs are split evenly and the
/// first output takes everything but the fee.
fn sample_witness(variant: CircuitVariant, rng: &mut impl rand::Rng) -> Witness {
    if variant.is_deposit() {
        let notes: Vec<_> = (0..DEPOSIT_SLOTS)
            .map(|i| random_note(rng, 100 * (i as u64 + 1)))
            .collect();
        return Witness::deposit(&notes);
    }
    let fee = 10u64;
    let inputs: Vec<_> = (0..variant.inputs()).map(|_| random_note(rng, 100)).collect();
    let total = 100 * variant.inputs() as u64 - fee;
    let outputs: Vec<_> = (0..variant.outputs())
        .map(|i| random_note(rng, if i == 0 { total } else { 0 }))
        .collect();
    Witness::spend(&inputs, &outputs, fee)
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing("shielded_vault_ledger=info,e2e=info");
    let cli = Cli::parse();

    // ── Step 0: Load config ────────────────────────────────────────────
    println!("\n=== Shielded Vault E2E Test ===\n");

    let total_deposit = cli.deposit_a + cli.deposit_b + cli.deposit_c;
    let spendable = (cli.deposit_a + cli.deposit_b)
        .checked_sub(cli.spend_fee)
        .context("DEPOSIT_A + DEPOSIT_B must cover SPEND_FEE")?;
    let change_amount = spendable / 2;
    let transfer_amount = spendable - change_amount;
    ensure!(
        transfer_amount >= cli.spend_fee,
        "recipient note ({transfer_amount}) must cover the second SPEND_FEE"
    );

    let backend = Arc::new(cli.prover.backend()?);
    let state_path = cli
        .state
        .state
        .clone()
        .unwrap_or_else(|| fixtures_dir().join("vault_state.json"));

    println!("Backend:          {}", backend.name());
    println!("Vault:            {VAULT_ADDRESS}");
    println!("Token:            {TOKEN_ADDRESS}");
    println!(
        "Deposit:          {} + {} + {} (fee {})",
        cli.deposit_a, cli.deposit_b, cli.deposit_c, cli.deposit_fee
    );
    println!("Transfer amount:  {transfer_amount}");
    println!("Spend fee:        {}\n", cli.spend_fee);

    // ── Step 1: Set up token and vault ─────────────────────────────────
    let registry = load_registry(&state_path)?;
    let mut token = MockToken::new(VAULT_ADDRESS);
    let funding = U256::from(total_deposit + cli.deposit_fee);
    token.mint(DEPOSITOR, funding);
    token.approve(DEPOSITOR, funding);

    let mut vault = Vault::with_registry(VAULT_ADDRESS, Pipeline::new(&*backend), registry);
    vault.register_token(TOKEN_ADDRESS, token)?;
    println!("[1] Vault ready, depositor funded with {funding}");

    // ── Step 2: Create notes ───────────────────────────────────────────
    let mut rng = rand::thread_rng();
    let mut wallet = Wallet::default();
    let deposit_notes = [
        random_note(&mut rng, cli.deposit_a),
        random_note(&mut rng, cli.deposit_b),
        random_note(&mut rng, cli.deposit_c),
    ];
    for (label, note) in ["deposit_a", "deposit_b", "deposit_c"].iter().zip(&deposit_notes) {
        wallet.push(label, note);
    }
    println!("[2] Notes: {} + {} + {} = {total_deposit}", cli.deposit_a, cli.deposit_b, cli.deposit_c);

    // ── Step 3: Deposit ────────────────────────────────────────────────
    println!("[3] Proving deposit...");
    let started = Instant::now();
    let (proof, _) = vault
        .pipeline()
        .prove(&Witness::deposit(&deposit_notes), CircuitVariant::Deposit)?;
    println!("    Proof: {} bytes in {:?}", proof.as_bytes().len(), started.elapsed());

    let params = DepositParams {
        token: TOKEN_ADDRESS,
        total_deposit_amount: U256::from(total_deposit),
        deposit_commitment_params: deposit_notes
            .iter()
            .map(|note| DepositCommitmentParams {
                poseidon_hash: note.commitment(),
                owner: DEPOSITOR,
                metadata: Bytes::new(),
            })
            .collect(),
        fee: U256::from(cli.deposit_fee),
        fee_recipient: RELAYER,
    };
    let receipt = vault.deposit(DEPOSITOR, &params, &proof)?;
    println!("    Deposit accepted, {} events", receipt.events.len());

    // ── Step 4: Spend 2-in-2-out ───────────────────────────────────────
    println!("[4] Spending deposit_a + deposit_b...");
    println!("    {transfer_amount} → recipient, {change_amount} → change, {} fee", cli.spend_fee);
    let recipient_note = random_note(&mut rng, transfer_amount);
    let change_note = random_note(&mut rng, change_amount);
    let inputs = &deposit_notes[..2];
    let outputs = [recipient_note, change_note];
    let (proof_22, _) = vault.pipeline().prove(
        &Witness::spend(inputs, &outputs, cli.spend_fee),
        CircuitVariant::Spend22,
    )?;
    let args_22 = SpendArgs {
        inputs_hashes: [inputs[0].commitment(), inputs[1].commitment()],
        outputs_hashes: [recipient_note.commitment(), change_note.commitment()],
        fee: U256::from(cli.spend_fee),
    };
    vault.spend_22(TOKEN_ADDRESS, RELAYER, args_22, &proof_22)?;
    for note in inputs {
        wallet.mark_spent(note.commitment());
    }
    wallet.push("spend_recipient", &recipient_note);
    wallet.push("spend_change", &change_note);
    println!("    Spend accepted");

    // ── Step 5: Replay ─────────────────────────────────────────────────
    println!("[5] Replaying the same spend...");
    match vault.spend_22(TOKEN_ADDRESS, RELAYER, args_22, &proof_22) {
        Err(err @ VaultError::CommitmentAlreadyUsed) => println!("    Rejected: {err}"),
        other => bail!("replay was not rejected as a double spend: {other:?}"),
    }

    // A witness that does not conserve value never yields a proof
    let forged = random_note(&mut rng, transfer_amount + 1);
    match vault.pipeline().prove(
        &Witness::spend(&[recipient_note], &[forged], 0u64),
        CircuitVariant::Spend11,
    ) {
        Err(ProofError::Constraint(err)) => println!("    Inflating spend refused: {err}"),
        other => bail!("inflating spend produced {other:?}"),
    }

    // ── Step 6: Spend 1-in-1-out ───────────────────────────────────────
    println!("[6] Spending the recipient note...");
    let final_note = random_note(&mut rng, transfer_amount - cli.spend_fee);
    let (proof_11, _) = vault.pipeline().prove(
        &Witness::spend(&[recipient_note], &[final_note], cli.spend_fee),
        CircuitVariant::Spend11,
    )?;
    vault.spend_11(
        TOKEN_ADDRESS,
        RELAYER,
        SpendArgs {
            inputs_hashes: [recipient_note.commitment()],
            outputs_hashes: [final_note.commitment()],
            fee: U256::from(cli.spend_fee),
        },
        &proof_11,
    )?;
    wallet.mark_spent(recipient_note.commitment());
    wallet.push("spend_final", &final_note);
    println!("    Spend accepted");

    // ── Step 7: Verify final state ─────────────────────────────────────
    println!("\n[7] Verifying final state...");
    for note in &deposit_notes[..2] {
        ensure!(vault.is_spent(TOKEN_ADDRESS, note.commitment()), "deposit note not spent");
    }
    ensure!(vault.is_registered(TOKEN_ADDRESS, deposit_notes[2].commitment()), "deposit_c lost");
    ensure!(vault.is_spent(TOKEN_ADDRESS, recipient_note.commitment()), "recipient note not spent");
    for commitment in commitments(&[change_note, final_note]) {
        ensure!(vault.is_registered(TOKEN_ADDRESS, commitment), "output not registered");
    }
    println!("    Commitment states: OK");

    let token = vault.token(TOKEN_ADDRESS).context("token vanished")?;
    let fees = cli.deposit_fee + 2 * cli.spend_fee;
    ensure!(token.balance_of(RELAYER) == U256::from(fees), "relayer fees mismatch");
    ensure!(
        token.balance_of(VAULT_ADDRESS) == U256::from(total_deposit - 2 * cli.spend_fee),
        "pool balance mismatch"
    );
    let unspent = wallet
        .unspent()
        .fold(U256::ZERO, |acc, note| acc + note.amount.value());
    ensure!(
        unspent == token.balance_of(VAULT_ADDRESS),
        "unspent notes ({unspent}) do not add up to the pool balance"
    );
    println!("     Pool balance: {} (= unspent notes)", token.balance_of(VAULT_ADDRESS));
    println!("     Relayer fees: {fees}");

    // ── Save wallet and registry ───────────────────────────────────────
    wallet.save(&fixtures_dir().join("wallet.json"))?;
    save_registry(&state_path, vault.registry())?;

    // ── Step 8: Concurrent proving report ──────────────────────────────
    if !cli.skip_perf {
        println!("\n[8] Proving every circuit variant concurrently...");
        let timings = prove_all(&backend).await?;
        for (variant, elapsed) in timings {
            println!("     {:<10} {elapsed:?}", variant.name());
        }
    }

    println!("\n=== E2E Test Passed! ===\n");
    Ok(())
}

/// Proves a sample witness for every variant, each on its own blocking task.
async fn prove_all(backend: &Arc<Backend>) -> Result<Vec<(CircuitVariant, Duration)>> {
    let tasks: Vec<_> = CircuitVariant::ALL
        .into_iter()
        .map(|variant| {
            let backend = Arc::clone(backend);
            tokio::task::spawn_blocking(move || {
                let witness = sample_witness(variant, &mut rand::thread_rng());
                let pipeline = Pipeline::new(&*backend);
                let started = Instant::now();
                let (proof, signals) = pipeline.prove(&witness, variant)?;
                let elapsed = started.elapsed();
                ensure!(
                    pipeline.verify(&proof, &signals, variant),
                    "{variant} proof failed to verify"
                );
                Ok((variant, elapsed))
            })
        })
        .collect();

    let mut timings = Vec::with_capacity(tasks.len());
    for task in tasks {
        timings.push(task.await??);
    }
    Ok(timings)
}
