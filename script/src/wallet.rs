//! Note bookkeeping for the host: fresh entropy and a JSON wallet of openings.

use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use shielded_vault_lib::{Fr, Note};
use std::path::Path;

/// Entropy the `commit` helper uses when none is given, so its output is
/// reproducible across runs.
pub const DEFAULT_ENTROPY: [u8; 32] = [
    0x00, 0x58, 0xcb, 0x7d, 0xeb, 0x6c, 0x37, 0xf0, 0xc9, 0x59, 0xd0, 0xb9, 0x45, 0x75, 0xc9, 0xa9,
    0x11, 0x4a, 0xd7, 0x7b, 0x74, 0x56, 0x23, 0x1c, 0x1b, 0x7a, 0x4c, 0x1f, 0x51, 0xe2, 0xb2, 0xb8,
];

/// Entropy for a commitment: the explicit value if given, fresh randomness
/// if `random`, otherwise `DEFAULT_ENTROPY`.
pub fn note_entropy(entropy: Option<&str>, random: bool) -> Result<Fr> {
    match entropy {
        Some(text) => Fr::parse(text).with_context(|| format!("invalid entropy {text:?}")),
        None if random => Ok(random_entropy(&mut rand::thread_rng())),
        None => Ok(Fr::from_be_bytes_reduced(DEFAULT_ENTROPY)),
    }
}

/// Uniform-ish entropy: 32 random bytes reduced into the field.
pub fn random_entropy<R: Rng>(rng: &mut R) -> Fr {
    Fr::from_be_bytes_reduced(rng.gen())
}

pub fn random_note<R: Rng>(rng: &mut R, amount: u64) -> Note {
    Note::new(amount, random_entropy(rng))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletNote {
    /// Human label (e.g. "deposit_a", "spend_change")
    pub label: String,
    pub amount: Fr,
    pub entropy: Fr,
    pub commitment: Fr,
    /// Set once the note has been consumed by a spend
    #[serde(default)]
    pub spent: bool,
}

/// Every note opening created during a session. Losing an opening loses the
/// funds behind it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub notes: Vec<WalletNote>,
}

impl Wallet {
    pub fn push(&mut self, label: &str, note: &Note) {
        self.notes.push(WalletNote {
            label: label.to_string(),
            amount: note.amount,
            entropy: note.entropy,
            commitment: note.commitment(),
            spent: false,
        });
    }

    pub fn mark_spent(&mut self, commitment: Fr) {
        for note in self.notes.iter_mut().filter(|n| n.commitment == commitment) {
            note.spent = true;
        }
    }

    /// Openings of the notes not yet spent.
    pub fn unspent(&self) -> impl Iterator<Item = Note> + '_ {
        self.notes
            .iter()
            .filter(|n| !n.spent)
            .map(|n| Note::new(n.amount, n.entropy))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading wallet {}", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("writing wallet {}", path.display()))?;
        Ok(())
    }
}
