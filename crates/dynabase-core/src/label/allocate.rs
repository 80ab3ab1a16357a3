use crate::{
    Error,
    db::repository,
    field::FieldInvariants,
    label::{Label, LabelPrefix},
};
use rusqlite::Connection;

/// Next label for a field with these invariants.
///
/// Degree-1 fields take the reserved rational label. Otherwise the ordinal
/// follows every label the prefix has ever issued, live or deleted. The
/// result is only a candidate unless `conn` is inside a write transaction;
/// the label's primary key decides on insert.
pub fn allocate_label(conn: &Connection, invariants: &FieldInvariants) -> Result<Label, Error> {
    if invariants.degree == 1 {
        return Ok(Label::rational());
    }

    let prefix = LabelPrefix::from_invariants(invariants);
    let ordinal = next_ordinal(conn, &prefix)?;

    Ok(prefix.label(ordinal))
}

/// `max(live count, highest live ordinal, highest issued ordinal) + 1`.
///
/// Without deletions this is the live count plus one.
pub fn next_ordinal(conn: &Connection, prefix: &LabelPrefix) -> Result<u64, Error> {
    let live = repository::labels_with_prefix(conn, &prefix.to_string())?;

    let highest_live = live
        .iter()
        .filter_map(|label| label.parse::<Label>().ok())
        .map(|label| label.ordinal)
        .max()
        .unwrap_or(0);
    let issued = repository::last_ordinal(conn, prefix)?;
    let count = u64::try_from(live.len()).unwrap_or(u64::MAX);

    Ok(count.max(highest_live).max(issued).saturating_add(1))
}
