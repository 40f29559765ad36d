//! Collaborator-facing export schema: each match becomes two rows sharing
//! a `match_id`, one per record, so downstream sinks (CSV, database,
//! stream) can render the pair side by side. The sink itself is not this
//! crate's concern.

use serde::{Deserialize, Serialize};

use crate::data::Record;
use crate::score::Match;
use crate::types::{MatchId, RecordId};

/// Which record of the pair a row describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    /// The record with the lower id.
    A,
    /// The record with the higher id.
    B,
}

/// One export row: match metadata plus the raw record fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportRow {
    /// Shared identifier of the pair, `"{id_a}_{id_b}"`.
    pub match_id: MatchId,
    /// Whether this row is the A or B side of the pair.
    pub position: Position,
    /// Confidence of the match, `[0, 100]`.
    pub confidence: u8,
    /// Classification of the match.
    pub match_type: crate::score::MatchType,
    /// Id of the record this row describes.
    pub id: RecordId,
    /// Raw first name.
    pub given_name: Option<String>,
    /// Raw last name.
    pub surname: Option<String>,
    /// Raw secondary name.
    pub secondary_name: Option<String>,
    /// Raw street.
    pub street: Option<String>,
    /// Raw house number.
    pub house_number: Option<String>,
    /// Raw postal code.
    pub postal_code: Option<String>,
    /// Raw city.
    pub city: Option<String>,
    /// Raw birth date.
    pub birth_date: Option<String>,
    /// Raw birth year.
    pub birth_year: Option<i32>,
}

/// Flatten matches into export rows, two per match.
///
/// `records` must be the dataset the matches were produced from, indexed
/// by record id (the adapter's stable row index). Matches referring to
/// ids outside the dataset are skipped.
pub fn export_rows(matches: &[Match], records: &[Record]) -> Vec<ExportRow> {
    let by_id: std::collections::HashMap<RecordId, &Record> =
        records.iter().map(|record| (record.id, record)).collect();
    let mut rows = Vec::with_capacity(matches.len() * 2);
    for m in matches {
        let (Some(&record_a), Some(&record_b)) = (by_id.get(&m.id_a), by_id.get(&m.id_b)) else {
            continue;
        };
        let match_id = format!("{}_{}", m.id_a, m.id_b);
        rows.push(row_for(m, &match_id, Position::A, record_a));
        rows.push(row_for(m, &match_id, Position::B, record_b));
    }
    rows
}

fn row_for(m: &Match, match_id: &str, position: Position, record: &Record) -> ExportRow {
    ExportRow {
        match_id: match_id.to_string(),
        position,
        confidence: m.confidence,
        match_type: m.match_type,
        id: record.id,
        given_name: record.given_name.clone(),
        surname: record.surname.clone(),
        secondary_name: record.secondary_name.clone(),
        street: record.street.clone(),
        house_number: record.house_number.clone(),
        postal_code: record.postal_code.clone(),
        city: record.city.clone(),
        birth_date: record.birth_date.clone(),
        birth_year: record.birth_year,
    }
}
