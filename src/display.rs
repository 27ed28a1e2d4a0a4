use std::path::Path;

use crate::calendar::Calendar;
use crate::error::{ConvertError, ConvertResult};
use crate::reconcile::ChangeEntry;
use crate::report::DoctorCount;

fn calendar_header(calendar: &Calendar) -> Vec<String> {
    let mut header = vec!["Giorno".to_string()];
    header.extend(calendar.slots.iter().cloned());
    header
}

fn calendar_row(calendar: &Calendar, day: u32) -> Vec<String> {
    let mut row = vec![day.to_string()];
    for slot in &calendar.slots {
        row.push(calendar.cell(day, slot));
    }
    row
}

/// Writes the converted calendar: first column is the day number, then one
/// column per slot label, cells holding the comma-joined doctor names.
pub fn write_calendar_csv<P: AsRef<Path>>(calendar: &Calendar, path: P) -> ConvertResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(calendar_header(calendar))?;
    for &day in &calendar.days {
        writer.write_record(calendar_row(calendar, day))?;
    }
    writer.flush()?;
    Ok(())
}

/// Same calendar table as in-memory CSV bytes, for the download endpoint.
pub fn calendar_csv_bytes(calendar: &Calendar) -> ConvertResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(calendar_header(calendar))?;
    for &day in &calendar.days {
        writer.write_record(calendar_row(calendar, day))?;
    }
    writer
        .into_inner()
        .map_err(|e| ConvertError::Io(e.into_error()))
}

/// Writes the per-doctor slot-count report as a two-column CSV.
pub fn write_counts_csv<P: AsRef<Path>>(counts: &[DoctorCount], path: P) -> ConvertResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Medico", "Turni"])?;
    for row in counts {
        let slots = row.slots.to_string();
        writer.write_record([row.name.as_str(), slots.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Prints the calendar grid in a readable fixed-width layout.
pub fn print_calendar(calendar: &Calendar) {
    if calendar.is_empty() {
        println!("Nessuna disponibilità trovata nel file.");
        return;
    }

    println!("\n=== Calendario disponibilità ===");
    let width = 24;
    print!("{:<8}", "Giorno");
    for slot in &calendar.slots {
        print!("{:<width$}", slot, width = width);
    }
    println!();
    for &day in &calendar.days {
        print!("{:<8}", day);
        for slot in &calendar.slots {
            print!("{:<width$}", calendar.cell(day, slot), width = width);
        }
        println!();
    }
}

/// Prints the per-doctor additions/removals between responses.
pub fn print_changes(changes: &[ChangeEntry]) {
    println!("\n=== Variazioni tra risposte ===");
    if changes.is_empty() {
        println!("Nessuna variazione tra risposte successive.");
        return;
    }
    for change in changes {
        if change.is_unchanged() {
            println!("  {} -> reinvio senza variazioni", change.display_name);
            continue;
        }
        println!("  {}:", change.display_name);
        for slot in &change.added {
            println!("    + giorno {} {}", slot.day, slot.slot);
        }
        for slot in &change.removed {
            println!("    - giorno {} {}", slot.day, slot.slot);
        }
    }
}
