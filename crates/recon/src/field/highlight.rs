//! Highlighted-text reconciliation.
//!
//! Each row's spans are joined first, then all rows are pooled and joined
//! again into fragments. A fragment is voted on by the rows with a span
//! inside it.

use crate::flag::Flag;
use crate::note;
use crate::spans::{contains, merge_spans};

use super::{Field, FieldValue, HighlightSpan, ReconcileArgs};

pub(super) fn reconcile(
    template: &Field,
    group: &[Option<&Field>],
    row_count: usize,
    args: &ReconcileArgs<'_>,
) -> Field {
    let join_distance = args.config.join_distance;

    let per_row: Vec<Vec<HighlightSpan>> = group
        .iter()
        .flatten()
        .filter_map(|f| match &f.value {
            FieldValue::Highlight(spans) => Some(merge_spans(spans, join_distance)),
            _ => None,
        })
        .filter(|spans| !spans.is_empty())
        .collect();

    if per_row.is_empty() {
        return Field::like(
            template,
            FieldValue::Highlight(Vec::new()),
            note::all_blank(row_count),
            Flag::AllBlank,
        );
    }

    let pooled: Vec<HighlightSpan> = per_row.iter().flatten().cloned().collect();
    let mut fragments = merge_spans(&pooled, join_distance);

    let mut notes = Vec::with_capacity(fragments.len());
    let mut worst = Flag::NoFlag;
    for fragment in &mut fragments {
        let contributions: Vec<HighlightSpan> = per_row
            .iter()
            .filter_map(|spans| {
                let inside: Vec<HighlightSpan> =
                    spans.iter().filter(|s| contains(fragment, s)).cloned().collect();
                // A row's pieces inside one fragment count as a single answer.
                merge_spans(&inside, u32::MAX).into_iter().next()
            })
            .collect();

        fragment.support = contributions.len();
        let (flag, vote) = vote(&contributions, row_count);
        worst = worst.max(flag);
        notes.push(format!(
            "{} {}-{}: {vote}",
            fragment.label, fragment.start, fragment.end
        ));
    }

    Field::like(template, FieldValue::Highlight(fragments), notes.join("; "), worst)
}

fn vote(contributions: &[HighlightSpan], row_count: usize) -> (Flag, String) {
    let support = contributions.len();
    let blanks = row_count.saturating_sub(support);

    let mut counts: Vec<(&HighlightSpan, usize)> = Vec::new();
    for c in contributions {
        match counts
            .iter_mut()
            .find(|(seen, _)| (seen.start, seen.end, &seen.text) == (c.start, c.end, &c.text))
        {
            Some((_, n)) => *n += 1,
            None => counts.push((c, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let top = counts.first().map_or(0, |(_, n)| *n);
    let runner_up = counts.get(1).map_or(0, |(_, n)| *n);

    if support == 1 {
        return (Flag::OnlyOne, format!("Only 1 transcript in {}", note::records(row_count)));
    }
    if counts.len() == 1 {
        return (
            Flag::Unanimous,
            format!("Unanimous match, {top} of {}", note::records(row_count)),
        );
    }
    if top > 1 && runner_up == top {
        return (
            Flag::Majority,
            format!(
                "Match is a tie, {top} of {} with {}",
                note::records(row_count),
                note::blanks(blanks)
            ),
        );
    }
    if top > 1 {
        return (
            Flag::Majority,
            format!(
                "Match {top} of {} with {}",
                note::records(row_count),
                note::blanks(blanks)
            ),
        );
    }
    (
        Flag::NoMatch,
        format!(
            "No match on {} with {}",
            note::records(row_count),
            note::blanks(blanks)
        ),
    )
}
