//! String similarity scores on a 0-100 scale.
//!
//! `ratio` is Levenshtein similarity; `partial_ratio` and `token_set_ratio`
//! build on it the way the common fuzzy-matching libraries do.

use std::collections::BTreeSet;

/// Levenshtein similarity of the whole strings. Empty input scores 0.
pub fn ratio(a: &str, b: &str) -> i32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    (strsim::normalized_levenshtein(a, b) * 100.0).round_ties_even() as i32
}

/// Best `ratio` of the shorter string against every equally long window of
/// the longer one.
pub fn partial_ratio(a: &str, b: &str) -> i32 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (short, long) = if a_chars.len() <= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };

    let width = short.len();
    if width == 0 {
        return 0;
    }
    let short: String = short.into_iter().collect();
    if width == long.len() {
        return ratio(&short, &long.iter().collect::<String>());
    }

    let mut best = 0;
    for start in 0..=(long.len() - width) {
        let window: String = long[start..start + width].iter().collect();
        best = best.max(ratio(&short, &window));
        if best == 100 {
            break;
        }
    }
    best
}

/// Compare the shared tokens against each side's remainder and keep the
/// best of the three ratios.
pub fn token_set_ratio(a: &str, b: &str) -> i32 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0;
    }

    let shared: Vec<&str> = tokens_a.intersection(&tokens_b).map(String::as_str).collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).map(String::as_str).collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).map(String::as_str).collect();

    let sect = shared.join(" ");
    let combined_a = join_nonempty(&sect, &only_a.join(" "));
    let combined_b = join_nonempty(&sect, &only_b.join(" "));

    [
        ratio(&sect, &combined_a),
        ratio(&sect, &combined_b),
        ratio(&combined_a, &combined_b),
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
}

/// Lowercased alphanumeric tokens.
pub fn tokenize(s: &str) -> BTreeSet<String> {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{a} {b}"),
    }
}
