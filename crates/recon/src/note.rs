//! Wording helpers for reconciliation notes.

/// Inflect `word` for `count`.
pub(crate) fn plural(word: &str, count: usize) -> String {
    if count == 1 {
        return word.to_string();
    }
    match word {
        "is" => "are".into(),
        "was" => "were".into(),
        "The" => "All".into(),
        "box" => "boxes".into(),
        _ => format!("{word}s"),
    }
}

/// "3 records", "1 record".
pub(crate) fn records(count: usize) -> String {
    format!("{count} {}", plural("record", count))
}

/// "2 blanks", "1 blank".
pub(crate) fn blanks(count: usize) -> String {
    format!("{count} {}", plural("blank", count))
}

/// "All 3 records are blank" / "The 1 record is blank".
pub(crate) fn all_blank(count: usize) -> String {
    format!(
        "{} {} {} blank",
        plural("The", count),
        records(count),
        plural("is", count)
    )
}

/// "There are 2 of 3 box records": participation note for geometric fields.
pub(crate) fn participation(present: usize, row_count: usize, what: &str) -> String {
    format!(
        "There {} {present} of {row_count} {what} {}",
        plural("is", present),
        plural("record", row_count)
    )
}
