use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::{ConvertError, ConvertResult};
use crate::reconcile::{IdentityPolicy, SlotKey, SurveyResponse};

/// Header prefix marking an availability column in the survey export.
pub const AVAILABILITY_PREFIX: &str = "Disponibilità";

/// Timestamp formats seen in form exports (Italian Google Forms first).
const TIMESTAMP_FORMATS: &[&str] = &[
    "%d/%m/%Y %H.%M.%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Resolved header row: where identity, timestamp and availability live.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    pub name_col: Option<usize>,
    pub email_col: Option<usize>,
    pub timestamp_col: Option<usize>,
    /// (column index, day number) for every header that parsed.
    pub availability_cols: Vec<(usize, u32)>,
}

impl ColumnLayout {
    /// Email is the only key unique per respondent, so grouping uses it
    /// whenever the export carries an email column.
    pub fn identity_policy(&self) -> IdentityPolicy {
        if self.email_col.is_some() {
            IdentityPolicy::ByEmail
        } else {
            IdentityPolicy::ByNormalizedName
        }
    }
}

fn day_pattern() -> &'static Regex {
    static DAY_PATTERN: OnceLock<Regex> = OnceLock::new();
    DAY_PATTERN.get_or_init(|| Regex::new(r"\[(.+?) (\d{1,2})\]").unwrap())
}

/// Extracts the day number from a bracketed `[<day-name> <day-number>]`
/// token, e.g. `Disponibilità  [Lunedì 5]` -> 5. Returns None when the
/// bracket pattern is absent; such headers are metadata, not availability.
pub fn parse_day(label: &str) -> Option<u32> {
    day_pattern()
        .captures(label)?
        .get(2)?
        .as_str()
        .parse()
        .ok()
}

/// Locates the identity, timestamp and availability columns in a header row.
///
/// Availability headers that carry the prefix but no parseable bracket are
/// skipped silently. Missing identity columns abort the run: without a name
/// or an email there is nothing to group rows by.
pub fn detect_columns(headers: &csv::StringRecord) -> ConvertResult<ColumnLayout> {
    let mut layout = ColumnLayout {
        name_col: None,
        email_col: None,
        timestamp_col: None,
        availability_cols: Vec::new(),
    };

    for (idx, header) in headers.iter().enumerate() {
        let lower = header.to_lowercase();

        if header.trim_start().starts_with(AVAILABILITY_PREFIX) {
            if let Some(day) = parse_day(header) {
                layout.availability_cols.push((idx, day));
            }
            continue;
        }

        if layout.name_col.is_none()
            && (lower.contains("medico") || lower.contains("nome e cognome"))
        {
            layout.name_col = Some(idx);
        } else if layout.email_col.is_none()
            && (lower.contains("email") || lower.contains("e-mail"))
        {
            layout.email_col = Some(idx);
        } else if layout.timestamp_col.is_none()
            && (lower.contains("informazioni cronologiche") || lower.contains("timestamp"))
        {
            layout.timestamp_col = Some(idx);
        }
    }

    if layout.name_col.is_none() && layout.email_col.is_none() {
        return Err(ConvertError::MissingColumn {
            wanted: "MEDICO: Nome e Cognome (o una colonna email)".to_string(),
        });
    }

    Ok(layout)
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

/// Turns one data row into a response. Returns None for rows with no
/// identity at all (trailing blank lines in exports are common).
pub fn extract_response(
    record: &csv::StringRecord,
    layout: &ColumnLayout,
    row_index: usize,
) -> Option<SurveyResponse> {
    let cell = |col: Option<usize>| col.and_then(|i| record.get(i)).unwrap_or("").trim();

    let name = cell(layout.name_col).to_string();
    let email = {
        let value = cell(layout.email_col);
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    };

    if name.is_empty() && email.is_none() {
        return None;
    }

    let submitted_at = parse_timestamp(cell(layout.timestamp_col));

    let mut availability = std::collections::BTreeSet::new();
    for &(idx, day) in &layout.availability_cols {
        let value = record.get(idx).unwrap_or("");
        for token in value.split([',', ';']) {
            let token = token.trim();
            if !token.is_empty() {
                availability.insert(SlotKey::new(day, token));
            }
        }
    }

    Some(SurveyResponse {
        row_index,
        name,
        email,
        submitted_at,
        availability,
    })
}

/// Parses a whole survey export: header detection plus per-row extraction.
/// Also reports which identity policy the header supports.
pub fn parse_survey<R: Read>(input: R) -> ConvertResult<(Vec<SurveyResponse>, IdentityPolicy)> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let layout = detect_columns(reader.headers()?)?;
    let policy = layout.identity_policy();

    let mut responses = Vec::new();
    for (row_index, result) in reader.records().enumerate() {
        let record = result?;
        if let Some(response) = extract_response(&record, &layout, row_index) {
            responses.push(response);
        }
    }

    Ok((responses, policy))
}

/// Loads a survey export from disk.
pub fn load_survey<P: AsRef<Path>>(
    csv_path: P,
) -> ConvertResult<(Vec<SurveyResponse>, IdentityPolicy)> {
    let file = File::open(csv_path)?;
    parse_survey(file)
}
