//! Controlled-vocabulary voting shared by select and mark-index fields.

use crate::flag::Flag;
use crate::note;

use super::{Field, FieldValue};

const PLACEHOLDER: &str = "placeholder";

#[derive(Debug)]
struct Entry<'a> {
    spelling: &'a str,
    key: String,
    count: usize,
    index: Option<i64>,
}

/// Case-insensitive tally of the chosen values, most popular first.
#[derive(Debug, Default)]
struct Tally<'a> {
    entries: Vec<Entry<'a>>,
    present: usize,
    placeholders: usize,
}

impl<'a> Tally<'a> {
    fn build(values: impl Iterator<Item = (&'a str, Option<i64>)>) -> Self {
        let mut tally = Tally::default();
        for (raw, index) in values {
            tally.present += 1;
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }
            let key = value.to_lowercase();
            if key == PLACEHOLDER {
                tally.placeholders += 1;
                continue;
            }
            match tally.entries.iter_mut().find(|e| e.key == key) {
                Some(entry) => entry.count += 1,
                None => tally.entries.push(Entry { spelling: value, key, count: 1, index }),
            }
        }
        // Stable sort keeps first-seen order among equal counts.
        tally.entries.sort_by(|a, b| b.count.cmp(&a.count));
        tally
    }

    fn chosen(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }
}

struct Vote<'a> {
    winner: Option<&'a Entry<'a>>,
    note: String,
    flag: Flag,
}

fn vote<'a>(tally: &'a Tally<'a>, row_count: usize) -> Vote<'a> {
    let blanks = row_count.saturating_sub(tally.chosen());
    let Some(top) = tally.entries.first() else {
        if tally.placeholders > 0 {
            return Vote {
                winner: None,
                note: format!(
                    "Placeholder values in {} of {}",
                    tally.placeholders,
                    note::records(row_count)
                ),
                flag: Flag::Placeholders,
            };
        }
        return Vote { winner: None, note: note::all_blank(row_count), flag: Flag::AllBlank };
    };

    let runner_up = tally.entries.get(1).map_or(0, |e| e.count);

    if tally.entries.len() == 1 && top.count > 1 && top.count == tally.present {
        return Vote {
            winner: Some(top),
            note: format!("Unanimous match, {} of {}", top.count, note::records(row_count)),
            flag: Flag::Unanimous,
        };
    }
    if top.count > 1 && runner_up == top.count {
        return Vote {
            winner: Some(top),
            note: format!(
                "Match is a tie, {} of {} with {}",
                top.count,
                note::records(row_count),
                note::blanks(blanks)
            ),
            flag: Flag::Majority,
        };
    }
    if top.count > 1 {
        return Vote {
            winner: Some(top),
            note: format!(
                "Match {} of {} with {}",
                top.count,
                note::records(row_count),
                note::blanks(blanks)
            ),
            flag: Flag::Majority,
        };
    }
    if tally.entries.len() == 1 {
        return Vote {
            winner: Some(top),
            note: format!("Only 1 transcript in {}", note::records(row_count)),
            flag: Flag::OnlyOne,
        };
    }
    Vote {
        winner: None,
        note: format!(
            "No match on {} with {}",
            note::records(row_count),
            note::blanks(blanks)
        ),
        flag: Flag::NoMatch,
    }
}

pub(super) fn reconcile_select(template: &Field, group: &[Option<&Field>], row_count: usize) -> Field {
    let tally = Tally::build(group.iter().flatten().map(|f| (f.text_value(), None)));
    let vote = vote(&tally, row_count);
    let value = vote.winner.map(|e| e.spelling.to_string()).unwrap_or_default();
    Field::like(template, FieldValue::Select(value), vote.note, vote.flag)
}

pub(super) fn reconcile_mark_index(
    template: &Field,
    group: &[Option<&Field>],
    row_count: usize,
) -> Field {
    let tally = Tally::build(group.iter().flatten().map(|f| match &f.value {
        FieldValue::MarkIndex { value, index } => (value.as_str(), *index),
        _ => (f.text_value(), None),
    }));
    let vote = vote(&tally, row_count);
    let value = FieldValue::MarkIndex {
        value: vote.winner.map(|e| e.spelling.to_string()).unwrap_or_default(),
        index: vote.winner.and_then(|e| e.index),
    };
    Field::like(template, value, vote.note, vote.flag)
}
