//! Joining of highlighted text spans.

use crate::field::HighlightSpan;

/// Join spans with the same label whose gap is at most `join_distance`
/// characters. Overlapping spans have a negative gap and always join.
///
/// Output is sorted by `(label, start)` and does not depend on input order.
pub fn merge_spans(spans: &[HighlightSpan], join_distance: u32) -> Vec<HighlightSpan> {
    let mut sorted: Vec<&HighlightSpan> = spans.iter().collect();
    sorted.sort_by(|a, b| {
        (&a.label, a.start, a.end, &a.text).cmp(&(&b.label, b.start, b.end, &b.text))
    });

    let mut merged: Vec<HighlightSpan> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match merged.last_mut() {
            Some(prev) if prev.label == span.label && gap(prev, span) <= i64::from(join_distance) => {
                stitch(prev, span);
            }
            _ => merged.push(span.clone()),
        }
    }
    merged
}

/// True when `inner` lies within `outer` (same label).
pub fn contains(outer: &HighlightSpan, inner: &HighlightSpan) -> bool {
    outer.label == inner.label && outer.start <= inner.start && inner.end <= outer.end
}

fn gap(prev: &HighlightSpan, next: &HighlightSpan) -> i64 {
    next.start as i64 - prev.end as i64
}

fn stitch(prev: &mut HighlightSpan, next: &HighlightSpan) {
    prev.support = prev.support.max(next.support);
    if next.end <= prev.end {
        return;
    }
    if next.start < prev.end {
        let overlap = prev.end - next.start;
        prev.text.extend(next.text.chars().skip(overlap));
    } else {
        if next.start > prev.end {
            prev.text.push(' ');
        }
        prev.text.push_str(&next.text);
    }
    prev.end = next.end;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize, text: &str) -> HighlightSpan {
        HighlightSpan::new("name", start, end, text)
    }

    #[test]
    fn overlapping_spans_join() {
        let merged = merge_spans(&[span(0, 5, "Querc"), span(3, 9, "rcus a")], 0);
        assert_eq!(merged.len(), 1);
        assert_eq!((merged[0].start, merged[0].end), (0, 9));
        assert_eq!(merged[0].text, "Quercus a");
    }

    #[test]
    fn distant_spans_stay_apart() {
        let merged = merge_spans(&[span(0, 5, "Querc"), span(10, 15, "albaL")], 4);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn gap_within_distance_joins_with_space() {
        let merged = merge_spans(&[span(8, 12, "alba"), span(0, 7, "Quercus")], 1);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "Quercus alba");
        assert_eq!((merged[0].start, merged[0].end), (0, 12));
    }

    #[test]
    fn adjacent_spans_join_without_space() {
        let merged = merge_spans(&[span(0, 3, "Que"), span(3, 7, "rcus")], 0);
        assert_eq!(merged[0].text, "Quercus");
    }

    #[test]
    fn contained_span_is_absorbed() {
        let merged = merge_spans(&[span(0, 7, "Quercus"), span(2, 4, "er")], 0);
        assert_eq!(merged, vec![span(0, 7, "Quercus")]);
    }

    #[test]
    fn labels_never_mix() {
        let other = HighlightSpan::new("date", 3, 9, "1901");
        let merged = merge_spans(&[span(0, 5, "Querc"), other], 10);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn order_independent() {
        let a = span(0, 5, "Querc");
        let b = span(3, 9, "rcus a");
        let c = span(20, 24, "alba");
        let forward = merge_spans(&[a.clone(), b.clone(), c.clone()], 2);
        let backward = merge_spans(&[c, b, a], 2);
        assert_eq!(forward, backward);
    }
}
