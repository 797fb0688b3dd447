//! Free-text reconciliation: exact votes, then normalized votes, then fuzzy
//! pairwise matching.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::flag::Flag;
use crate::fuzzy;
use crate::note;

use super::{Field, FieldValue, ReconcileArgs};

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]+").unwrap());

/// One transcription after whitespace collapsing.
struct Candidate<'a> {
    value: String,
    user: Option<&'a str>,
}

struct Cluster<'a> {
    key: String,
    /// Representative spelling of the cluster.
    value: &'a str,
    count: usize,
}

struct Outcome {
    value: String,
    note: String,
    flag: Flag,
}

impl Outcome {
    fn new(value: impl Into<String>, note: String, flag: Flag) -> Self {
        Self { value: value.into(), note, flag }
    }
}

pub(super) fn reconcile(
    template: &Field,
    group: &[Option<&Field>],
    row_count: usize,
    args: &ReconcileArgs<'_>,
) -> Field {
    let mut present = 0;
    let mut filled: Vec<Candidate<'_>> = Vec::new();
    for (i, field) in group.iter().enumerate() {
        let Some(field) = field else { continue };
        present += 1;
        let value = collapse_whitespace(field.text_value());
        if !value.is_empty() {
            filled.push(Candidate { value, user: args.user(i) });
        }
    }

    let outcome = exact_match(&filled, present, row_count)
        .or_else(|| normalized_match(&filled, present, row_count))
        .or_else(|| partial_ratio_match(&filled, row_count, args))
        .or_else(|| token_set_match(&filled, row_count, args))
        .unwrap_or_else(|| {
            Outcome::new(
                "",
                format!(
                    "No text match on {} with {}",
                    note::records(row_count),
                    note::blanks(row_count.saturating_sub(filled.len()))
                ),
                Flag::NoMatch,
            )
        });

    Field::like(template, FieldValue::Text(outcome.value), outcome.note, outcome.flag)
}

pub(crate) fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize(value: &str) -> String {
    NON_WORD.replace_all(value, "").to_lowercase()
}

/// Count candidates by `key`, keeping the longest spelling of each cluster,
/// then order by count, representative length and first appearance.
fn cluster<'a>(filled: &'a [Candidate<'_>], key: impl Fn(&str) -> String) -> Vec<Cluster<'a>> {
    let mut clusters: Vec<Cluster<'a>> = Vec::new();
    for candidate in filled {
        let k = key(&candidate.value);
        match clusters.iter_mut().find(|c| c.key == k) {
            Some(c) => {
                c.count += 1;
                if candidate.value.chars().count() > c.value.chars().count() {
                    c.value = candidate.value.as_str();
                }
            }
            None => clusters.push(Cluster { key: k, value: candidate.value.as_str(), count: 1 }),
        }
    }
    clusters.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.value.chars().count().cmp(&a.value.chars().count()))
    });
    clusters
}

/// Shared unanimous / tie / majority decision for the two voting stages.
fn vote(
    clusters: &[Cluster<'_>],
    present: usize,
    row_count: usize,
    blanks: usize,
    stage: &str,
) -> Option<Outcome> {
    let top = clusters.first()?;
    let runner_up = clusters.get(1).map_or(0, |c| c.count);

    if clusters.len() == 1 && top.count > 1 && top.count == present {
        return Some(Outcome::new(
            top.value,
            format!("{stage} unanimous match, {} of {}", top.count, note::records(row_count)),
            Flag::Unanimous,
        ));
    }
    if top.count > 1 && runner_up == top.count {
        return Some(Outcome::new(
            top.value,
            format!(
                "{stage} match is a tie, {} of {} with {}",
                top.count,
                note::records(row_count),
                note::blanks(blanks)
            ),
            Flag::Majority,
        ));
    }
    if top.count > 1 {
        return Some(Outcome::new(
            top.value,
            format!(
                "{stage} match, {} of {} with {}",
                top.count,
                note::records(row_count),
                note::blanks(blanks)
            ),
            Flag::Majority,
        ));
    }
    None
}

fn exact_match(filled: &[Candidate<'_>], present: usize, row_count: usize) -> Option<Outcome> {
    if filled.is_empty() {
        return Some(Outcome::new("", note::all_blank(row_count), Flag::AllBlank));
    }
    if filled.len() == 1 {
        return Some(Outcome::new(
            filled[0].value.clone(),
            format!("Only 1 transcript in {}", note::records(row_count)),
            Flag::OnlyOne,
        ));
    }
    let clusters = cluster(filled, str::to_string);
    vote(&clusters, present, row_count, row_count.saturating_sub(filled.len()), "Exact")
}

fn normalized_match(filled: &[Candidate<'_>], present: usize, row_count: usize) -> Option<Outcome> {
    let blanks = row_count.saturating_sub(filled.len());
    if filled.iter().all(|c| normalize(&c.value).is_empty()) {
        return Some(Outcome::new(
            "",
            format!(
                "No text match on {} with {}",
                note::records(row_count),
                note::blanks(blanks)
            ),
            Flag::NoMatch,
        ));
    }
    let clusters = cluster(filled, normalize);
    vote(&clusters, present, row_count, blanks, "Normalized")
}

/// Best-scoring pair under `score`. `prefer_second` picks which value of
/// the pair is kept; earlier pairs win ties.
fn best_pair<'a>(
    filled: &'a [Candidate<'a>],
    args: &ReconcileArgs<'_>,
    score: fn(&str, &str) -> i32,
    prefer_second: fn(&str, &str) -> bool,
) -> Option<(i32, &'a str)> {
    let mut best: Option<(i32, &'a str)> = None;
    for (i, a) in filled.iter().enumerate() {
        for b in &filled[i + 1..] {
            let chosen = if prefer_second(&a.value, &b.value) { b } else { a };
            let s = score(&a.value, &b.value) + args.config.user_weight(chosen.user);
            if best.map_or(true, |(top, _)| s > top) {
                best = Some((s, chosen.value.as_str()));
            }
        }
    }
    best
}

fn longer(a: &str, b: &str) -> bool {
    b.chars().count() > a.chars().count()
}

fn more_tokens_then_shorter(a: &str, b: &str) -> bool {
    let tokens_a = a.split_whitespace().count();
    let tokens_b = b.split_whitespace().count();
    tokens_b > tokens_a || (tokens_b == tokens_a && b.chars().count() < a.chars().count())
}

fn partial_ratio_match(
    filled: &[Candidate<'_>],
    row_count: usize,
    args: &ReconcileArgs<'_>,
) -> Option<Outcome> {
    let (score, value) = best_pair(filled, args, fuzzy::partial_ratio, longer)?;
    if score < args.config.fuzzy_ratio_threshold {
        return None;
    }
    Some(Outcome::new(
        value,
        format!(
            "Partial ratio match on {} with {}, score={score}",
            note::records(row_count),
            note::blanks(row_count.saturating_sub(filled.len()))
        ),
        Flag::Fuzzy,
    ))
}

fn token_set_match(
    filled: &[Candidate<'_>],
    row_count: usize,
    args: &ReconcileArgs<'_>,
) -> Option<Outcome> {
    let (score, value) =
        best_pair(filled, args, fuzzy::token_set_ratio, more_tokens_then_shorter)?;
    if score < args.config.fuzzy_set_threshold {
        return None;
    }
    Some(Outcome::new(
        value,
        format!(
            "Token set ratio match on {} with {}, score={score}",
            note::records(row_count),
            note::blanks(row_count.saturating_sub(filled.len()))
        ),
        Flag::Fuzzy,
    ))
}
