//! Hard business-rule gate evaluated on every candidate pair before any
//! similarity work. Both rules must hold; the cheaper secondary-name rule
//! runs first.

use crate::config::MissingYearPolicy;
use crate::data::NormalizedRecord;

/// Evaluate the full gate: secondary-name rule, then birth-year rule.
pub fn gate_passes(a: &NormalizedRecord, b: &NormalizedRecord, policy: MissingYearPolicy) -> bool {
    secondary_name_rule(a, b) && birth_year_rule(a, b, policy)
}

/// Secondary-name rule.
///
/// - both secondary names empty: pass
/// - both populated: pass iff equal after normalization
/// - exactly one populated: pass iff it is a suffix of the *other* record's
///   surname. This covers the compound-surname convention where one source
///   stores `rohner-stassek` as the surname and the other splits it into
///   surname `rohner` plus secondary name `-stassek`.
pub fn secondary_name_rule(a: &NormalizedRecord, b: &NormalizedRecord) -> bool {
    match (a.secondary_name.is_empty(), b.secondary_name.is_empty()) {
        (true, true) => true,
        (false, false) => a.secondary_name == b.secondary_name,
        (false, true) => b.surname.ends_with(&a.secondary_name),
        (true, false) => a.surname.ends_with(&b.secondary_name),
    }
}

/// Birth-year rule over the records' effective years.
///
/// Both absent passes, both present requires equality. When exactly one
/// side has a year the pair is ambiguous: identity can neither be confirmed
/// nor ruled out, and the configured policy decides (business default is
/// reject).
pub fn birth_year_rule(
    a: &NormalizedRecord,
    b: &NormalizedRecord,
    policy: MissingYearPolicy,
) -> bool {
    match (a.effective_year, b.effective_year) {
        (None, None) => true,
        (Some(year_a), Some(year_b)) => year_a == year_b,
        _ => policy == MissingYearPolicy::Accept,
    }
}
