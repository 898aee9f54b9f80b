//! Persistent commitment set keyed by `(token, commitment)`.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use shielded_vault_lib::Fr;
use std::collections::BTreeMap;

/// Lifecycle of a commitment. Transitions only ever go left to right:
/// `Absent -> Registered -> Spent`; `Spent` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentState {
    Absent,
    /// Created by a deposit or a spend output; spendable.
    Registered,
    /// Consumed as a spend input.
    Spent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentEntry {
    pub token: Address,
    pub commitment: Fr,
    pub state: CommitmentState,
}

/// Absent commitments are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitmentRegistry {
    entries: BTreeMap<(Address, Fr), CommitmentState>,
}

impl CommitmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, token: Address, commitment: Fr) -> CommitmentState {
        self.entries
            .get(&(token, commitment))
            .copied()
            .unwrap_or(CommitmentState::Absent)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Absent -> Registered. Callers check the precondition first.
    pub(crate) fn register(&mut self, token: Address, commitment: Fr) {
        debug_assert_eq!(self.state(token, commitment), CommitmentState::Absent);
        self.entries
            .insert((token, commitment), CommitmentState::Registered);
    }

    /// Registered -> Spent. Callers check the precondition first.
    pub(crate) fn mark_spent(&mut self, token: Address, commitment: Fr) {
        debug_assert_eq!(self.state(token, commitment), CommitmentState::Registered);
        self.entries.insert((token, commitment), CommitmentState::Spent);
    }

    pub fn entries(&self) -> impl Iterator<Item = CommitmentEntry> + '_ {
        self.entries
            .iter()
            .map(|(&(token, commitment), &state)| CommitmentEntry {
                token,
                commitment,
                state,
            })
    }
}

// Snapshots are a flat list so they read well as JSON.
impl Serialize for CommitmentRegistry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries())
    }
}

impl<'de> Deserialize<'de> for CommitmentRegistry {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = Vec::<CommitmentEntry>::deserialize(deserializer)?;
        let mut entries = BTreeMap::new();
        for entry in list {
            if entry.state == CommitmentState::Absent {
                continue;
            }
            if entries
                .insert((entry.token, entry.commitment), entry.state)
                .is_some()
            {
                return Err(serde::de::Error::custom(format!(
                    "duplicate commitment {} for token {}",
                    entry.commitment, entry.token
                )));
            }
        }
        Ok(CommitmentRegistry { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: Address = Address::repeat_byte(0x11);

    #[test]
    fn test_lifecycle() {
        let mut registry = CommitmentRegistry::new();
        let c = Fr::from(42u64);
        assert_eq!(registry.state(TOKEN, c), CommitmentState::Absent);
        registry.register(TOKEN, c);
        assert_eq!(registry.state(TOKEN, c), CommitmentState::Registered);
        registry.mark_spent(TOKEN, c);
        assert_eq!(registry.state(TOKEN, c), CommitmentState::Spent);
        // other tokens are independent
        assert_eq!(
            registry.state(Address::repeat_byte(0x22), c),
            CommitmentState::Absent
        );
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut registry = CommitmentRegistry::new();
        registry.register(TOKEN, Fr::from(1u64));
        registry.register(TOKEN, Fr::from(2u64));
        registry.mark_spent(TOKEN, Fr::from(1u64));

        let json = serde_json::to_string(&registry).unwrap();
        let restored: CommitmentRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, registry);
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn test_snapshot_rejects_duplicates() {
        let entry = CommitmentEntry {
            token: TOKEN,
            commitment: Fr::from(1u64),
            state: CommitmentState::Registered,
        };
        let json = serde_json::to_string(&[entry.clone(), entry]).unwrap();
        assert!(serde_json::from_str::<CommitmentRegistry>(&json).is_err());
    }
}
