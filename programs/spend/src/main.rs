//! SP1 Spend Circuit: consume N notes, create M notes, pay a fee.
//!
//! One program serves every compiled arity; the arity is read as part of the
//! input and committed as the first public word, so a proof for 1-in/2-out
//! can never pass as 2-in/1-out.
//!
//! Proves:
//! - Every input and output hash == commit(amount, entropy)
//! - Every amount and the fee fit in RANGE_BITS
//! - sum(inputs) == sum(outputs) + fee
//!
//! Public values committed ((N + M + 2) x 32-byte words):
//!   [variant tag, inputs_hashes.., outputs_hashes.., fee]

#![no_main]
sp1_zkvm::entrypoint!(main);

use shielded_vault_lib::{encode_public_values, synthesize, CircuitInput};

pub fn main() {
    // 1. Read the witness from the prover (host)
    let input = sp1_zkvm::io::read::<CircuitInput>();
    assert!(!input.variant.is_deposit(), "spend program got deposit");

    // 2. Enforce the constraint system for this arity
    let signals = match synthesize(input.variant, &input.witness) {
        Ok(signals) => signals,
        Err(err) => panic!("unsatisfiable {} witness: {err}", input.variant),
    };

    // 3. Commit public values
    sp1_zkvm::io::commit_slice(&encode_public_values(input.variant, &signals));
}
