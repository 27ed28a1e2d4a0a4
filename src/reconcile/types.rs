use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One (day, time-slot) pair a doctor can be available for.
///
/// The slot label is stored in canonical form (trimmed, upper-cased) so that
/// "Mattina" and "MATTINA" aggregate into the same slot. Presentation layers
/// decide how to render it; aggregation always works on the canonical key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub day: u32,
    pub slot: String,
}

impl SlotKey {
    pub fn new(day: u32, slot: &str) -> Self {
        SlotKey {
            day,
            slot: slot.trim().to_uppercase(),
        }
    }
}

/// The set of (day, slot) pairs declared in one or more responses.
/// A BTreeSet keeps iteration order deterministic for output and diffing.
pub type Availability = BTreeSet<SlotKey>;

/// One survey row after extraction: who answered, when, and which slots.
#[derive(Debug, Clone)]
pub struct SurveyResponse {
    /// Position of the row in the original file, used as the ordering
    /// tie-break when timestamps are missing or equal.
    pub row_index: usize,
    pub name: String,
    pub email: Option<String>,
    pub submitted_at: Option<NaiveDateTime>,
    pub availability: Availability,
}

/// How multiple responses from the same identity combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// Anyone who ever said yes to a slot counts as available.
    Union,
    /// A later submission replaces earlier ones entirely.
    LatestWins,
}

#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    pub policy: ReconcilePolicy,
    /// When true, an identity that resent an identical response still gets a
    /// change entry (with empty added/removed sets). When false, only
    /// effective changes are reported.
    pub include_unchanged: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        ReconcileOptions {
            policy: ReconcilePolicy::Union,
            include_unchanged: false,
        }
    }
}

/// All responses for one canonical identity, plus the derived final
/// availability under the selected policy.
#[derive(Debug, Clone)]
pub struct ReconciledEntry {
    pub key: String,
    /// Display name taken from the latest response.
    pub display_name: String,
    /// Every distinct raw display name observed under this key. More than
    /// one entry means the identity is a duplicate-alias case.
    pub aliases: BTreeSet<String>,
    /// Ordered by submission time ascending, then original row index.
    pub responses: Vec<SurveyResponse>,
    pub availability: Availability,
}

/// Added/removed slots between an identity's prior responses and its latest.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEntry {
    pub key: String,
    pub display_name: String,
    pub added: Availability,
    pub removed: Availability,
}

impl ChangeEntry {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_key_canonicalizes_case_and_whitespace() {
        assert_eq!(SlotKey::new(3, " Mattina "), SlotKey::new(3, "MATTINA"));
        assert_eq!(SlotKey::new(3, "mattina").slot, "MATTINA");
    }

    #[test]
    fn slot_keys_order_by_day_then_slot() {
        let mut set = Availability::new();
        set.insert(SlotKey::new(2, "Notte"));
        set.insert(SlotKey::new(1, "Pomeriggio"));
        set.insert(SlotKey::new(1, "Mattina"));
        let order: Vec<_> = set.iter().map(|k| (k.day, k.slot.as_str())).collect();
        assert_eq!(
            order,
            vec![(1, "MATTINA"), (1, "POMERIGGIO"), (2, "NOTTE")]
        );
    }
}
