//! Proof generation CLI for the shielded vault.
//!
//! Subcommands:
//!   commit    - Compute the commitment of an amount
//!   prove     - Generate a proof for one circuit from a witness JSON file
//!   verify    - Verify a proof file
//!   calldata  - Print the verifier calldata of a proof file
//!   circuits  - List the compiled circuit family
//!   vkeys     - Print verification keys (sp1 builds only)

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use shielded_vault_lib::{
    encode_public_values, to_verifier_call_data, CircuitInput, CircuitVariant, Fr, Note, Pipeline,
    Witness,
};
use shielded_vault_script::config::{init_tracing, ProverArgs};
use shielded_vault_script::wallet::note_entropy;
use shielded_vault_script::ProofOutput;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "shielded-vault")]
#[command(about = "Proof generation for the shielded vault")]
struct Cli {
    #[command(flatten)]
    prover: ProverArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute commit(amount, entropy); uses a fixed default entropy if none is given
    Commit {
        /// Amount, decimal or 0x hex; a leading '-' encodes p - k
        amount: String,
        /// Blinding entropy, decimal or 0x hex
        #[arg(long)]
        entropy: Option<String>,
        /// Draw fresh random entropy instead of the default
        #[arg(long, conflicts_with = "entropy")]
        random: bool,
    },
    /// Generate a proof for one circuit variant
    Prove {
        /// Circuit name, e.g. deposit, spend_22, spend_161
        #[arg(long)]
        circuit: String,
        /// Path to JSON file with the witness
        #[arg(long)]
        input: PathBuf,
        /// Path to write proof output JSON
        #[arg(long)]
        output: PathBuf,
        /// Just execute without generating a real proof (fast, for testing)
        #[arg(long, default_value = "false")]
        execute_only: bool,
    },
    /// Verify a proof file written by `prove`
    Verify {
        #[arg(long)]
        proof: PathBuf,
    },
    /// Print the ABI-encoded verifyProof(bytes,uint256[]) calldata of a proof file
    Calldata {
        #[arg(long)]
        proof: PathBuf,
    },
    /// List every circuit variant
    Circuits,
    /// Print the verification keys (for deploying verifiers)
    #[cfg(feature = "sp1")]
    Vkeys,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing("shielded_vault_script=info,shielded_vault_ledger=info");
    let cli = Cli::parse();

    match cli.command {
        Commands::Commit {
            amount,
            entropy,
            random,
        } => commit(&amount, entropy.as_deref(), random)?,
        Commands::Prove {
            circuit,
            input,
            output,
            execute_only,
        } => {
            let variant = parse_circuit(&circuit)?;
            generate_proof(&cli.prover, variant, &input, &output, execute_only)?;
        }
        Commands::Verify { proof } => {
            let output = read_proof(&proof)?;
            let (proof_bytes, signals) = output.decode()?;
            let pipeline = Pipeline::new(cli.prover.backend()?);
            ensure!(
                pipeline.verify(&proof_bytes, &signals, output.circuit),
                "[{}] proof rejected",
                output.circuit
            );
            println!("[{}] Proof verified", output.circuit);
        }
        Commands::Calldata { proof } => {
            let output = read_proof(&proof)?;
            let (proof_bytes, signals) = output.decode()?;
            let call = to_verifier_call_data(&proof_bytes, &signals);
            println!("0x{}", hex::encode(call.abi_encode()));
        }
        Commands::Circuits => {
            println!("{:<10} {:>3} {:>6} {:>7} {:>8}", "name", "id", "inputs", "outputs", "signals");
            for variant in CircuitVariant::ALL {
                println!(
                    "{:<10} {:>3} {:>6} {:>7} {:>8}",
                    variant.name(),
                    variant.id(),
                    variant.inputs(),
                    variant.outputs(),
                    variant.signal_count()
                );
            }
        }
        #[cfg(feature = "sp1")]
        Commands::Vkeys => {
            let backend = cli.prover.backend()?;
            for variant in [CircuitVariant::Deposit, CircuitVariant::Spend11] {
                let vkey = backend
                    .vkey(variant)
                    .context("selected backend has no verification keys")?;
                let label = if variant.is_deposit() { "DEPOSIT" } else { "SPEND" };
                println!("{label}_VKEY: 0x{vkey}");
            }
        }
    }

    Ok(())
}

fn parse_circuit(name: &str) -> Result<CircuitVariant> {
    CircuitVariant::from_name(name).with_context(|| {
        let known: Vec<_> = CircuitVariant::ALL.iter().map(|v| v.name()).collect();
        format!("unknown circuit {name:?}, expected one of {}", known.join(", "))
    })
}

fn parse_fr(label: &str, text: &str) -> Result<Fr> {
    Fr::parse(text).with_context(|| format!("invalid {label} {text:?}"))
}

fn commit(amount: &str, entropy: Option<&str>, random: bool) -> Result<()> {
    let amount = parse_fr("amount", amount)?;
    let entropy = note_entropy(entropy, random)?;
    let note = Note { amount, entropy };
    println!("amount:     {amount}");
    println!("entropy:    {entropy}");
    println!("commitment: {}", note.commitment());
    Ok(())
}

fn read_proof(path: &Path) -> Result<ProofOutput> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(serde_json::from_str(&json)?)
}

fn generate_proof(
    prover: &ProverArgs,
    variant: CircuitVariant,
    input_path: &Path,
    output_path: &Path,
    execute_only: bool,
) -> Result<()> {
    let name = variant.name();

    // 1. Read the witness
    let input_json = fs::read_to_string(input_path)
        .with_context(|| format!("reading {}", input_path.display()))?;
    let witness: Witness = serde_json::from_str(&input_json)?;
    let backend = prover.backend()?;
    info!(circuit = name, backend = backend.name(), "loaded witness");

    if execute_only {
        // Execute without proof: fast sanity check
        let execution = backend.execute(&CircuitInput { variant, witness })?;
        println!("[{name}] Execution successful. Signals: {}", execution.signals.len());
        if let Some(cycles) = execution.cycles {
            println!("[{name}] Cycles: {cycles}");
        }
        return Ok(());
    }

    // 2. Prove
    println!("[{name}] Generating proof with the {} backend...", backend.name());
    let vkey = backend.vkey(variant);
    let pipeline = Pipeline::new(backend);
    let (proof, signals) = pipeline.prove(&witness, variant)?;

    // 3. Verify locally
    ensure!(
        pipeline.verify(&proof, &signals, variant),
        "[{name}] freshly generated proof failed to verify"
    );
    println!("[{name}] Proof verified locally");

    // 4. Write output as JSON
    let public_values = encode_public_values(variant, &signals);
    println!(
        "[{name}] Proof size: {} bytes, Public values size: {} bytes",
        proof.as_bytes().len(),
        public_values.len()
    );
    let output = ProofOutput {
        circuit: variant,
        proof: hex::encode(proof.as_bytes()),
        public_values: hex::encode(&public_values),
        public_signals: signals,
        vkey,
    };
    fs::write(output_path, serde_json::to_string_pretty(&output)?)?;
    println!("[{name}] Proof written to {}", output_path.display());

    Ok(())
}
