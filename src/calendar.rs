use std::collections::{BTreeMap, BTreeSet};

use crate::reconcile::{ReconciledEntry, SlotKey};

/// Canonical slot ordering for the grid columns; labels outside this list
/// are appended afterwards in lexicographic order.
pub const PREFERRED_SLOT_ORDER: &[&str] = &["MATTINA", "POMERIGGIO", "SERA", "NOTTE"];

/// (day, slot) -> doctors available for it, after reconciliation.
pub type ScheduleCells = BTreeMap<SlotKey, BTreeSet<String>>;

/// Unions the final availability of every reconciled identity into the
/// per-cell name sets.
pub fn build_cells(entries: &[ReconciledEntry]) -> ScheduleCells {
    let mut cells = ScheduleCells::new();
    for entry in entries {
        if entry.display_name.is_empty() {
            continue;
        }
        for slot in &entry.availability {
            cells
                .entry(slot.clone())
                .or_default()
                .insert(entry.display_name.clone());
        }
    }
    cells
}

/// Dense day × slot grid over everything discovered in the input.
///
/// Rows are the distinct days ascending; columns are the distinct slot
/// labels, preferred ones first, the rest alphabetically. Every (day, slot)
/// combination is part of the grid even when no doctor is available for it.
#[derive(Debug, Clone)]
pub struct Calendar {
    pub days: Vec<u32>,
    pub slots: Vec<String>,
    cells: ScheduleCells,
}

impl Calendar {
    pub fn build(cells: ScheduleCells) -> Self {
        let days: Vec<u32> = cells
            .keys()
            .map(|k| k.day)
            .collect::<BTreeSet<u32>>()
            .into_iter()
            .collect();

        let discovered: BTreeSet<&str> = cells.keys().map(|k| k.slot.as_str()).collect();
        let mut slots: Vec<String> = PREFERRED_SLOT_ORDER
            .iter()
            .filter(|s| discovered.contains(**s))
            .map(|s| s.to_string())
            .collect();
        for slot in &discovered {
            if !PREFERRED_SLOT_ORDER.contains(slot) {
                slots.push(slot.to_string());
            }
        }

        Calendar { days, slots, cells }
    }

    /// Comma-joined sorted names for one cell, empty string when vacant.
    pub fn cell(&self, day: u32, slot: &str) -> String {
        let key = SlotKey {
            day,
            slot: slot.to_string(),
        };
        match self.cells.get(&key) {
            Some(names) => names.iter().cloned().collect::<Vec<_>>().join(", "),
            None => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{Availability, ReconciledEntry};

    fn entry(name: &str, slots: &[(u32, &str)]) -> ReconciledEntry {
        let availability: Availability =
            slots.iter().map(|(d, s)| SlotKey::new(*d, s)).collect();
        ReconciledEntry {
            key: name.to_lowercase(),
            display_name: name.to_string(),
            aliases: [name.to_string()].into_iter().collect(),
            responses: Vec::new(),
            availability,
        }
    }

    #[test]
    fn grid_is_dense_over_discovered_days_and_slots() {
        let entries = vec![
            entry("Rossi", &[(1, "Mattina")]),
            entry("Bianchi", &[(3, "Notte")]),
        ];
        let calendar = Calendar::build(build_cells(&entries));

        assert_eq!(calendar.days, vec![1, 3]);
        assert_eq!(calendar.slots, vec!["MATTINA", "NOTTE"]);
        assert_eq!(calendar.cell(1, "MATTINA"), "Rossi");
        assert_eq!(calendar.cell(3, "NOTTE"), "Bianchi");
        // Discovered but unoccupied combinations render as empty cells.
        assert_eq!(calendar.cell(1, "NOTTE"), "");
        assert_eq!(calendar.cell(3, "MATTINA"), "");
    }

    #[test]
    fn unknown_slot_labels_follow_the_preferred_ones_alphabetically() {
        let entries = vec![entry(
            "Rossi",
            &[(1, "Notte"), (1, "Guardia"), (1, "Ambulatorio"), (1, "Mattina")],
        )];
        let calendar = Calendar::build(build_cells(&entries));
        assert_eq!(
            calendar.slots,
            vec!["MATTINA", "NOTTE", "AMBULATORIO", "GUARDIA"]
        );
    }

    #[test]
    fn cell_names_are_sorted_and_comma_joined() {
        let entries = vec![
            entry("Rossi", &[(2, "Mattina")]),
            entry("Bianchi", &[(2, "Mattina")]),
            entry("Verdi", &[(2, "Mattina")]),
        ];
        let calendar = Calendar::build(build_cells(&entries));
        assert_eq!(calendar.cell(2, "MATTINA"), "Bianchi, Rossi, Verdi");
    }
}
