//! The circuit family: one fixed-arity constraint system per variant.
//!
//! Every variant enforces the same three relations over its witness:
//! - commitment binding: each supplied hash equals `commit(amount, entropy)`
//! - range: each amount fits in [`RANGE_BITS`] bits, which also proves it is
//!   not a wrapped negative value `p - k`
//! - conservation: deposit `sum(amounts) = total`, spend
//!   `sum(inputs) = sum(outputs) + fee`
//!
//! Only commitments, the fee and (deposit) the total leave the circuit as
//! public signals.

use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::commitment::{commit, Note};
use crate::field::Fr;
use crate::signals::PublicSignals;

/// Bit-width every amount must decompose into.
pub const RANGE_BITS: usize = 240;

/// Number of note slots in the deposit circuit.
pub const DEPOSIT_SLOTS: usize = 3;

// =============================================================================
//                           CIRCUIT VARIANTS
// =============================================================================

/// A compiled circuit instance. Arity is public: the variant a proof was made
/// for is visible to everybody who verifies it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitVariant {
    Deposit,
    Spend11,
    Spend12,
    Spend13,
    Spend21,
    Spend22,
    Spend23,
    Spend31,
    Spend32,
    Spend161,
}

impl CircuitVariant {
    pub const ALL: [CircuitVariant; 10] = [
        CircuitVariant::Deposit,
        CircuitVariant::Spend11,
        CircuitVariant::Spend12,
        CircuitVariant::Spend13,
        CircuitVariant::Spend21,
        CircuitVariant::Spend22,
        CircuitVariant::Spend23,
        CircuitVariant::Spend31,
        CircuitVariant::Spend32,
        CircuitVariant::Spend161,
    ];

    /// (inputs, outputs). Deposit has no inputs; its note slots count as outputs.
    const fn arity(self) -> (usize, usize) {
        match self {
            CircuitVariant::Deposit => (0, DEPOSIT_SLOTS),
            CircuitVariant::Spend11 => (1, 1),
            CircuitVariant::Spend12 => (1, 2),
            CircuitVariant::Spend13 => (1, 3),
            CircuitVariant::Spend21 => (2, 1),
            CircuitVariant::Spend22 => (2, 2),
            CircuitVariant::Spend23 => (2, 3),
            CircuitVariant::Spend31 => (3, 1),
            CircuitVariant::Spend32 => (3, 2),
            CircuitVariant::Spend161 => (16, 1),
        }
    }

    pub const fn inputs(self) -> usize {
        self.arity().0
    }

    pub const fn outputs(self) -> usize {
        self.arity().1
    }

    pub const fn is_deposit(self) -> bool {
        matches!(self, CircuitVariant::Deposit)
    }

    /// Length of the public signal vector.
    pub const fn signal_count(self) -> usize {
        self.inputs() + self.outputs() + 1
    }

    /// Circuit name as used by the proving tooling, e.g. `spend_161`.
    pub const fn name(self) -> &'static str {
        match self {
            CircuitVariant::Deposit => "deposit",
            CircuitVariant::Spend11 => "spend_11",
            CircuitVariant::Spend12 => "spend_12",
            CircuitVariant::Spend13 => "spend_13",
            CircuitVariant::Spend21 => "spend_21",
            CircuitVariant::Spend22 => "spend_22",
            CircuitVariant::Spend23 => "spend_23",
            CircuitVariant::Spend31 => "spend_31",
            CircuitVariant::Spend32 => "spend_32",
            CircuitVariant::Spend161 => "spend_161",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.name() == name)
    }

    /// Stable one-byte tag, committed alongside the public signals.
    pub const fn id(self) -> u8 {
        match self {
            CircuitVariant::Deposit => 0,
            CircuitVariant::Spend11 => 1,
            CircuitVariant::Spend12 => 2,
            CircuitVariant::Spend13 => 3,
            CircuitVariant::Spend21 => 4,
            CircuitVariant::Spend22 => 5,
            CircuitVariant::Spend23 => 6,
            CircuitVariant::Spend31 => 7,
            CircuitVariant::Spend32 => 8,
            CircuitVariant::Spend161 => 9,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.id() == id)
    }

    /// The spend variant with `inputs` inputs and `outputs` outputs, if compiled.
    pub fn spend(inputs: usize, outputs: usize) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| !v.is_deposit() && v.arity() == (inputs, outputs))
    }
}

impl fmt::Display for CircuitVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
//                               WITNESSES
// =============================================================================

/// Private assignment for the deposit circuit.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepositWitness {
    /// Public: one commitment per slot
    pub hashes: Vec<Fr>,
    /// Public: declared total deposit
    pub total_amount: Fr,
    pub amounts: Vec<Fr>,
    pub entropies: Vec<Fr>,
}

/// Private assignment for a spend circuit.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpendWitness {
    /// Public: commitments being consumed
    pub input_hashes: Vec<Fr>,
    /// Public: commitments being created
    pub output_hashes: Vec<Fr>,
    /// Public: fee paid out of the pool
    pub fee: Fr,
    pub input_amounts: Vec<Fr>,
    pub input_entropies: Vec<Fr>,
    pub output_amounts: Vec<Fr>,
    pub output_entropies: Vec<Fr>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Witness {
    Deposit(DepositWitness),
    Spend(SpendWitness),
}

impl Witness {
    /// Deposit witness whose total is the sum of the note amounts.
    pub fn deposit(notes: &[Note]) -> Self {
        Witness::Deposit(DepositWitness {
            hashes: notes.iter().map(Note::commitment).collect(),
            total_amount: notes.iter().map(|n| n.amount).sum(),
            amounts: notes.iter().map(|n| n.amount).collect(),
            entropies: notes.iter().map(|n| n.entropy).collect(),
        })
    }

    pub fn spend(inputs: &[Note], outputs: &[Note], fee: impl Into<Fr>) -> Self {
        Witness::Spend(SpendWitness {
            input_hashes: inputs.iter().map(Note::commitment).collect(),
            output_hashes: outputs.iter().map(Note::commitment).collect(),
            fee: fee.into(),
            input_amounts: inputs.iter().map(|n| n.amount).collect(),
            input_entropies: inputs.iter().map(|n| n.entropy).collect(),
            output_amounts: outputs.iter().map(|n| n.amount).collect(),
            output_entropies: outputs.iter().map(|n| n.entropy).collect(),
        })
    }
}

/// What a guest program reads from the host.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CircuitInput {
    pub variant: CircuitVariant,
    pub witness: Witness,
}

// =============================================================================
//                               ERRORS
// =============================================================================

/// Position of a value inside a witness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// Deposit note slot
    Note(usize),
    Input(usize),
    Output(usize),
    Fee,
    Total,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Note(i) => write!(f, "note[{i}]"),
            Slot::Input(i) => write!(f, "input[{i}]"),
            Slot::Output(i) => write!(f, "output[{i}]"),
            Slot::Fee => f.write_str("fee"),
            Slot::Total => f.write_str("total"),
        }
    }
}

/// Which slot vector had the wrong length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotGroup {
    Notes,
    Inputs,
    Outputs,
}

/// Why a witness does not satisfy its circuit. No proof exists for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintError {
    /// A deposit witness was supplied for a spend variant or vice versa.
    VariantMismatch { variant: CircuitVariant },
    ArityMismatch {
        group: SlotGroup,
        expected: usize,
        actual: usize,
    },
    AmountOutOfRange { slot: Slot },
    FeeOutOfRange,
    TotalOutOfRange,
    CommitmentMismatch { slot: Slot },
    SumMismatch,
}

impl fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintError::VariantMismatch { variant } => {
                write!(f, "witness kind does not match circuit {variant}")
            }
            ConstraintError::ArityMismatch {
                group,
                expected,
                actual,
            } => write!(f, "{group:?}: expected {expected} slots, got {actual}"),
            ConstraintError::AmountOutOfRange { slot } => {
                write!(f, "{slot} amount does not fit in {RANGE_BITS} bits")
            }
            ConstraintError::FeeOutOfRange => {
                write!(f, "fee does not fit in {RANGE_BITS} bits")
            }
            ConstraintError::TotalOutOfRange => {
                write!(f, "total amount does not fit in {RANGE_BITS} bits")
            }
            ConstraintError::CommitmentMismatch { slot } => {
                write!(f, "{slot} hash does not match commit(amount, entropy)")
            }
            ConstraintError::SumMismatch => f.write_str("amounts don't balance"),
        }
    }
}

impl core::error::Error for ConstraintError {}

// =============================================================================
//                              CONSTRAINTS
// =============================================================================

/// Equivalent of decomposing `value` into `RANGE_BITS` boolean wires and
/// recomposing it: satisfiable iff the canonical representative is small.
pub fn in_range(value: Fr) -> bool {
    value.bit_len() <= RANGE_BITS
}

/// Shared slot gadget: range-check and bind every `(hash, amount, entropy)`
/// triple of one slot group, returning the field sum of its amounts.
fn bind_notes(
    group: SlotGroup,
    expected: usize,
    hashes: &[Fr],
    amounts: &[Fr],
    entropies: &[Fr],
) -> Result<Fr, ConstraintError> {
    for actual in [hashes.len(), amounts.len(), entropies.len()] {
        if actual != expected {
            return Err(ConstraintError::ArityMismatch {
                group,
                expected,
                actual,
            });
        }
    }

    let slot = |i| match group {
        SlotGroup::Notes => Slot::Note(i),
        SlotGroup::Inputs => Slot::Input(i),
        SlotGroup::Outputs => Slot::Output(i),
    };

    let mut sum = Fr::ZERO;
    for (i, ((hash, amount), entropy)) in hashes.iter().zip(amounts).zip(entropies).enumerate() {
        if !in_range(*amount) {
            return Err(ConstraintError::AmountOutOfRange { slot: slot(i) });
        }
        if commit(*amount, *entropy) != *hash {
            return Err(ConstraintError::CommitmentMismatch { slot: slot(i) });
        }
        sum += *amount;
    }
    Ok(sum)
}

fn synthesize_deposit(w: &DepositWitness) -> Result<PublicSignals, ConstraintError> {
    let sum = bind_notes(
        SlotGroup::Notes,
        DEPOSIT_SLOTS,
        &w.hashes,
        &w.amounts,
        &w.entropies,
    )?;
    if !in_range(w.total_amount) {
        return Err(ConstraintError::TotalOutOfRange);
    }
    if sum != w.total_amount {
        return Err(ConstraintError::SumMismatch);
    }
    Ok(PublicSignals::deposit(&w.hashes, w.total_amount))
}

fn synthesize_spend(
    variant: CircuitVariant,
    w: &SpendWitness,
) -> Result<PublicSignals, ConstraintError> {
    let input_sum = bind_notes(
        SlotGroup::Inputs,
        variant.inputs(),
        &w.input_hashes,
        &w.input_amounts,
        &w.input_entropies,
    )?;
    let output_sum = bind_notes(
        SlotGroup::Outputs,
        variant.outputs(),
        &w.output_hashes,
        &w.output_amounts,
        &w.output_entropies,
    )?;
    if !in_range(w.fee) {
        return Err(ConstraintError::FeeOutOfRange);
    }
    // With every term below 2^240 and at most 17 terms per side, neither side
    // can wrap around p, so field equality is integer equality.
    if input_sum != output_sum + w.fee {
        return Err(ConstraintError::SumMismatch);
    }
    Ok(PublicSignals::spend(&w.input_hashes, &w.output_hashes, w.fee))
}

/// Check `witness` against `variant`'s constraint system and compute its
/// public signals. `Err` means the witness is unsatisfiable.
pub fn synthesize(
    variant: CircuitVariant,
    witness: &Witness,
) -> Result<PublicSignals, ConstraintError> {
    match (variant.is_deposit(), witness) {
        (true, Witness::Deposit(w)) => synthesize_deposit(w),
        (false, Witness::Spend(w)) => synthesize_spend(variant, w),
        _ => Err(ConstraintError::VariantMismatch { variant }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn note(amount: u64, seed: u64) -> Note {
        Note::new(amount, Fr::from(0xdead_0000 + seed))
    }

    fn notes(amounts: &[u64], seed: u64) -> Vec<Note> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, a)| note(*a, seed * 100 + i as u64))
            .collect()
    }

    #[test]
    fn test_variant_metadata() {
        for v in CircuitVariant::ALL {
            assert_eq!(CircuitVariant::from_name(v.name()), Some(v));
            assert_eq!(CircuitVariant::from_id(v.id()), Some(v));
        }
        assert_eq!(CircuitVariant::spend(16, 1), Some(CircuitVariant::Spend161));
        assert_eq!(CircuitVariant::spend(0, 3), None);
        assert_eq!(CircuitVariant::spend(4, 4), None);
        assert_eq!(CircuitVariant::Spend161.signal_count(), 18);
        assert_eq!(CircuitVariant::Deposit.signal_count(), 4);
    }

    #[test]
    fn test_deposit_valid() {
        let witness = Witness::deposit(&notes(&[30, 40, 60], 1));
        let signals = synthesize(CircuitVariant::Deposit, &witness).unwrap();
        assert_eq!(signals.total(CircuitVariant::Deposit), Some(Fr::from(130u64)));
    }

    #[test]
    fn test_deposit_zero_slot_is_valid() {
        let witness = Witness::deposit(&notes(&[10, 0, 40], 2));
        assert!(synthesize(CircuitVariant::Deposit, &witness).is_ok());
    }

    #[test]
    fn test_deposit_sum_mismatch() {
        let Witness::Deposit(mut w) = Witness::deposit(&notes(&[100, 200, 300], 3)) else {
            unreachable!()
        };
        w.total_amount = Fr::from(1000u64);
        assert_eq!(
            synthesize(CircuitVariant::Deposit, &Witness::Deposit(w)),
            Err(ConstraintError::SumMismatch)
        );
    }

    #[test]
    fn test_deposit_negative_amount() {
        // -100 + 1100 + 0 = 1000 over the field, but -100 is p - 100
        let entropies = [Fr::from(1u64), Fr::from(2u64), Fr::from(3u64)];
        let amounts = [
            Fr::parse("-100").unwrap(),
            Fr::from(1100u64),
            Fr::ZERO,
        ];
        let w = DepositWitness {
            hashes: amounts.iter().zip(&entropies).map(|(a, e)| commit(*a, *e)).collect(),
            total_amount: Fr::from(1000u64),
            amounts: amounts.to_vec(),
            entropies: entropies.to_vec(),
        };
        assert_eq!(
            synthesize(CircuitVariant::Deposit, &Witness::Deposit(w)),
            Err(ConstraintError::AmountOutOfRange { slot: Slot::Note(0) })
        );
    }

    #[test]
    fn test_range_boundary() {
        let max = Fr::from_canonical((U256::from(1u64) << RANGE_BITS) - U256::from(1u64)).unwrap();
        let over = Fr::from_canonical(U256::from(1u64) << RANGE_BITS).unwrap();
        assert!(in_range(max));
        assert!(!in_range(over));
        assert!(in_range(Fr::ZERO));
    }

    #[test]
    fn test_deposit_wrong_slot_count() {
        let witness = Witness::deposit(&notes(&[1, 2], 4));
        assert_eq!(
            synthesize(CircuitVariant::Deposit, &witness),
            Err(ConstraintError::ArityMismatch {
                group: SlotGroup::Notes,
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_spend_11_valid() {
        let witness = Witness::spend(&notes(&[1010], 5), &notes(&[1000], 6), 10u64);
        let signals = synthesize(CircuitVariant::Spend11, &witness).unwrap();
        assert_eq!(signals.len(), 3);
        assert_eq!(signals.fee(CircuitVariant::Spend11), Some(Fr::from(10u64)));
    }

    #[test]
    fn test_spend_amount_mismatch() {
        let witness = Witness::spend(&notes(&[1000], 7), &notes(&[1000], 8), 10u64);
        assert_eq!(
            synthesize(CircuitVariant::Spend11, &witness),
            Err(ConstraintError::SumMismatch)
        );
    }

    #[test]
    fn test_spend_negative_output() {
        let input = note(1010, 9);
        let output = Note::new(Fr::parse("-100").unwrap(), Fr::from(10u64));
        let witness = Witness::spend(&[input], &[output], 10u64);
        assert_eq!(
            synthesize(CircuitVariant::Spend11, &witness),
            Err(ConstraintError::AmountOutOfRange {
                slot: Slot::Output(0)
            })
        );
    }

    #[test]
    fn test_spend_oversized_amounts_balanced() {
        // 2^240 + 10 = 2^240 + fee balances, but neither amount fits the range
        let big = U256::from(1u64) << RANGE_BITS;
        let input = Note::new(Fr::from_canonical(big + U256::from(10u64)).unwrap(), Fr::from(13u64));
        let output = Note::new(Fr::from_canonical(big).unwrap(), Fr::from(14u64));
        let witness = Witness::spend(&[input], &[output], 10u64);
        assert_eq!(
            synthesize(CircuitVariant::Spend11, &witness),
            Err(ConstraintError::AmountOutOfRange {
                slot: Slot::Input(0)
            })
        );

        let pipeline = crate::pipeline::Pipeline::new(crate::mock::MockBackend::default());
        assert!(matches!(
            pipeline.prove(&witness, CircuitVariant::Spend11),
            Err(crate::pipeline::ProofError::Constraint(ConstraintError::AmountOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_spend_invalid_input_hash() {
        let Witness::Spend(mut w) = Witness::spend(&notes(&[1010], 11), &notes(&[1000], 12), 10u64)
        else {
            unreachable!()
        };
        w.input_hashes[0] = Fr::from(123_456_789u64);
        assert_eq!(
            synthesize(CircuitVariant::Spend11, &Witness::Spend(w)),
            Err(ConstraintError::CommitmentMismatch {
                slot: Slot::Input(0)
            })
        );
    }

    #[test]
    fn test_wrapped_fee_cannot_inflate() {
        // inputs 1000, outputs 1010, fee -10: balances over the field
        let witness = Witness::spend(
            &notes(&[1000], 13),
            &notes(&[1010], 14),
            -Fr::from(10u64),
        );
        assert_eq!(
            synthesize(CircuitVariant::Spend11, &witness),
            Err(ConstraintError::FeeOutOfRange)
        );
    }

    #[test]
    fn test_witness_kind_must_match_variant() {
        let witness = Witness::deposit(&notes(&[1, 2, 3], 15));
        assert_eq!(
            synthesize(CircuitVariant::Spend21, &witness),
            Err(ConstraintError::VariantMismatch {
                variant: CircuitVariant::Spend21
            })
        );
    }

    #[test]
    fn test_spend_arity_must_match_variant() {
        let witness = Witness::spend(&notes(&[600, 400], 16), &notes(&[990], 17), 10u64);
        assert!(synthesize(CircuitVariant::Spend21, &witness).is_ok());
        assert!(matches!(
            synthesize(CircuitVariant::Spend12, &witness),
            Err(ConstraintError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn test_witness_json_shape() {
        let witness = Witness::spend(&notes(&[5], 18), &notes(&[5], 19), 0u64);
        let json = serde_json::to_value(&witness).unwrap();
        assert_eq!(json["kind"], "spend");
        assert_eq!(json["input_amounts"][0], Fr::from(5u64).to_string());
        let back: Witness = serde_json::from_value(json).unwrap();
        assert_eq!(back, witness);
    }
}
