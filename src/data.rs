use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::blocking::blocking_key;
use crate::normalize::{
    extract_year, normalize_house_number, normalize_postal, normalize_street, normalize_text,
};
use crate::phonetic;
use crate::types::{BlockKey, NormalizedValue, PhoneticCode, RecordId};

/// Raw person/address tuple as supplied by the ingestion adapter.
///
/// Missing values are `None`; the adapter binds source columns by semantic
/// role. `id` must be unique and stable for the dataset (typically the row
/// index).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Record {
    /// Stable index of the record in the dataset.
    pub id: RecordId,
    /// First name.
    pub given_name: Option<String>,
    /// Last name.
    pub surname: Option<String>,
    /// Middle/secondary name component.
    pub secondary_name: Option<String>,
    /// Street name, possibly with an embedded house number.
    pub street: Option<String>,
    /// Building number.
    pub house_number: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// City or locality.
    pub city: Option<String>,
    /// Full birth date if known; any layout carrying a four-digit year.
    pub birth_date: Option<String>,
    /// Standalone birth year.
    pub birth_year: Option<i32>,
}

/// Canonical form of a [`Record`], derived once at load time and immutable
/// thereafter. Every downstream stage reads only this representation;
/// absent fields are empty strings.
#[derive(Clone, Debug)]
pub struct NormalizedRecord {
    /// Stable index of the record in the dataset.
    pub id: RecordId,
    /// Normalized first name.
    pub given_name: NormalizedValue,
    /// Normalized last name.
    pub surname: NormalizedValue,
    /// Normalized secondary name component.
    pub secondary_name: NormalizedValue,
    /// Normalized street with house numbers stripped and suffix expanded.
    pub street: NormalizedValue,
    /// Normalized house number (digits plus letter suffix).
    pub house_number: NormalizedValue,
    /// Digit-only postal code.
    pub postal_code: NormalizedValue,
    /// Normalized city.
    pub city: NormalizedValue,
    /// Birth year: the birth date's year when present, else the standalone
    /// year. The date takes precedence as a rule, not as a fallback.
    pub effective_year: Option<i32>,
    /// Kölner Phonetik code of the given name.
    pub given_phon: PhoneticCode,
    /// Kölner Phonetik code of the surname.
    pub surname_phon: PhoneticCode,
    /// Blocking key under the four-strategy scheme.
    pub blocking_key: BlockKey,
}

impl NormalizedRecord {
    /// Normalize one raw record. Pure and thread-safe.
    pub fn from_record(record: &Record) -> Self {
        let given_name = normalize_text(record.given_name.as_deref().unwrap_or(""));
        let surname = normalize_text(record.surname.as_deref().unwrap_or(""));
        let secondary_name = normalize_text(record.secondary_name.as_deref().unwrap_or(""));
        let street = normalize_street(record.street.as_deref().unwrap_or(""));
        let house_number = normalize_house_number(record.house_number.as_deref().unwrap_or(""));
        let postal_code = normalize_postal(record.postal_code.as_deref().unwrap_or(""));
        let city = normalize_text(record.city.as_deref().unwrap_or(""));
        let effective_year = record
            .birth_date
            .as_deref()
            .and_then(extract_year)
            .or(record.birth_year);
        let given_phon = phonetic::encode(&given_name);
        let surname_phon = phonetic::encode(&surname);
        let blocking_key = blocking_key(&postal_code, &street, &given_phon, &surname_phon);
        Self {
            id: record.id,
            given_name,
            surname,
            secondary_name,
            street,
            house_number,
            postal_code,
            city,
            effective_year,
            given_phon,
            surname_phon,
            blocking_key,
        }
    }

    /// Whether both name fields survived normalization non-empty.
    pub fn has_full_name(&self) -> bool {
        !self.given_name.is_empty() && !self.surname.is_empty()
    }
}

/// The normalized dataset: one [`NormalizedRecord`] per input record, in
/// input order. Shared read-only across all workers.
#[derive(Clone, Debug, Default)]
pub struct NormalizedDataset {
    records: Vec<NormalizedRecord>,
}

impl NormalizedDataset {
    /// Normalize a slice of raw records, in parallel for large inputs.
    pub fn from_records(records: &[Record]) -> Self {
        let records = records
            .par_iter()
            .map(NormalizedRecord::from_record)
            .collect();
        Self { records }
    }

    /// All normalized records in input order.
    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    /// Record at a dataset offset.
    pub fn get(&self, offset: usize) -> &NormalizedRecord {
        &self.records[offset]
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fraction of address fields equal after normalization, over the fields
/// {street, house number, postal code, city} that are non-empty in *both*
/// records. `0.0` when no common field is populated.
pub fn address_ratio(a: &NormalizedRecord, b: &NormalizedRecord) -> f64 {
    let fields = [
        (&a.street, &b.street),
        (&a.house_number, &b.house_number),
        (&a.postal_code, &b.postal_code),
        (&a.city, &b.city),
    ];
    let mut populated = 0usize;
    let mut equal = 0usize;
    for (left, right) in fields {
        if !left.is_empty() && !right.is_empty() {
            populated += 1;
            if left == right {
                equal += 1;
            }
        }
    }
    if populated == 0 {
        0.0
    } else {
        equal as f64 / populated as f64
    }
}
