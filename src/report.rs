use std::collections::HashMap;
use std::fmt::Write;

use serde::Serialize;

use crate::calendar::ScheduleCells;
use crate::reconcile::{ChangeEntry, ReconciledEntry};

/// One row of the slot-count report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorCount {
    pub name: String,
    pub slots: usize,
}

/// A canonical identity that was observed under more than one raw name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateAlias {
    pub key: String,
    pub names: Vec<String>,
}

/// Number of (day, slot) cells each doctor appears in, sorted by count
/// descending with name ascending as the tie-break.
pub fn slot_counts(cells: &ScheduleCells) -> Vec<DoctorCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for names in cells.values() {
        for name in names {
            *counts.entry(name.as_str()).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<DoctorCount> = counts
        .into_iter()
        .map(|(name, slots)| DoctorCount {
            name: name.to_string(),
            slots,
        })
        .collect();
    rows.sort_by(|a, b| b.slots.cmp(&a.slots).then_with(|| a.name.cmp(&b.name)));
    rows
}

/// Identities whose responses carried more than one distinct display name.
/// These are never merged silently; the caller is expected to show them.
pub fn duplicate_aliases(entries: &[ReconciledEntry]) -> Vec<DuplicateAlias> {
    let mut duplicates: Vec<DuplicateAlias> = entries
        .iter()
        .filter(|e| e.aliases.len() > 1)
        .map(|e| DuplicateAlias {
            key: e.key.clone(),
            names: e.aliases.iter().cloned().collect(),
        })
        .collect();
    duplicates.sort_by(|a, b| a.key.cmp(&b.key));
    duplicates
}

/// Human-readable summary of counts, response changes and duplicate aliases.
pub fn render_report(
    counts: &[DoctorCount],
    changes: &[ChangeEntry],
    duplicates: &[DuplicateAlias],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Riepilogo disponibilità");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Turni per medico");
    if counts.is_empty() {
        let _ = writeln!(output, "Nessuna disponibilità registrata.");
    } else {
        for row in counts {
            let _ = writeln!(output, "- {}: {} turni", row.name, row.slots);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Variazioni tra risposte");
    if changes.is_empty() {
        let _ = writeln!(output, "Nessuna variazione tra risposte successive.");
    } else {
        for change in changes {
            if change.is_unchanged() {
                let _ = writeln!(
                    output,
                    "- {}: reinvio senza variazioni",
                    change.display_name
                );
                continue;
            }
            let _ = writeln!(output, "- {}:", change.display_name);
            for slot in &change.added {
                let _ = writeln!(output, "    + giorno {} {}", slot.day, slot.slot);
            }
            for slot in &change.removed {
                let _ = writeln!(output, "    - giorno {} {}", slot.day, slot.slot);
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Nomi duplicati");
    if duplicates.is_empty() {
        let _ = writeln!(output, "Nessun nome duplicato rilevato.");
    } else {
        for dup in duplicates {
            let _ = writeln!(output, "- {}: {}", dup.key, dup.names.join(" / "));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::build_cells;
    use crate::reconcile::{Availability, SlotKey};

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
    fn counts_sort_descending_with_name_tie_break() {
        let entries = vec![
            entry("Rossi", &[(1, "Mattina"), (2, "Mattina")]),
            entry("Bianchi", &[(1, "Notte"), (2, "Notte")]),
            entry("Verdi", &[(1, "Mattina"), (1, "Notte"), (2, "Mattina")]),
        ];
        let counts = slot_counts(&build_cells(&entries));
        let order: Vec<(&str, usize)> =
            counts.iter().map(|c| (c.name.as_str(), c.slots)).collect();
        assert_eq!(
            order,
            vec![("Verdi", 3), ("Bianchi", 2), ("Rossi", 2)]
        );
    }

    #[test]
    fn duplicate_aliases_lists_only_multi_name_identities() {
        let mut dup = entry("Mario Rossi", &[(1, "Mattina")]);
        dup.aliases.insert("M. Rossi".to_string());
        let entries = vec![dup, entry("Bianchi", &[(1, "Notte")])];

        let duplicates = duplicate_aliases(&entries);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(
            duplicates[0].names,
            vec!["M. Rossi".to_string(), "Mario Rossi".to_string()]
        );
    }

    #[test]
    fn report_mentions_every_section() {
        let entries = vec![entry("Rossi", &[(1, "Mattina")])];
        let counts = slot_counts(&build_cells(&entries));
        let text = render_report(&counts, &[], &[]);
        assert!(text.contains("Turni per medico"));
        assert!(text.contains("- Rossi: 1 turni"));
        assert!(text.contains("Nessuna variazione"));
        assert!(text.contains("Nessun nome duplicato"));
    }
}
