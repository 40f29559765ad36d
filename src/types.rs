/// Stable record identifier: the record's index in the source dataset.
/// Example: `184201`
pub type RecordId = usize;
/// Blocking key derived from normalized address fields or phonetic codes.
/// Examples: `8000|hauptstrasse`, `plz|10115`, `str|bahnhofstrasse`, `phon|068|67`
pub type BlockKey = String;
/// Kölner Phonetik digit string for a normalized name.
/// Examples: `67` (meyer/maier/mayer/meier), `862` (schmidt/schmitt)
pub type PhoneticCode = String;
/// Normalized field value (lowercased, umlaut-expanded, accent-folded).
/// Examples: `mueller`, `hauptstrasse`, `zuerich`
pub type NormalizedValue = String;
/// Shared identifier for the two export rows of one match.
/// Example: `1042_77813`
pub type MatchId = String;
