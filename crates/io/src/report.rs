// HTML summary report

use std::collections::HashMap;

use chrono::NaiveDateTime;

use labelrecon::{Flag, ReconConfig, ReconSummary, Row, Table};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Groups per detail page.
    pub page_size: usize,
    /// Include the per-group detail section.
    pub detail: bool,
    /// Shown in the header; usually the input file name.
    pub input_name: String,
    pub generated: NaiveDateTime,
}

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse;margin-bottom:1.5em}\
th,td{border:1px solid #ccc;padding:4px 8px;text-align:left;vertical-align:top}\
th{background:#f3f3f3}\
tr.reconciled td{background:#eef7ee}\
tr.explanation td{color:#555;font-style:italic}\
td.problem{color:#a00;font-weight:bold}\
nav.pages a{margin-right:.5em}";

pub fn render_summary(
    unreconciled: &Table,
    reconciled: &Table,
    summary: &ReconSummary,
    config: &ReconConfig,
    options: &ReportOptions,
) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Summary of {}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n",
        escape(&summary.workflow)
    ));
    html.push_str(&format!("<h1>Summary of {}</h1>\n", escape(&summary.workflow)));
    html.push_str(&format!(
        "<p>Input <code>{}</code>, generated {}</p>\n",
        escape(&options.input_name),
        options.generated.format("%Y-%m-%d %H:%M")
    ));

    push_totals(&mut html, summary);
    push_flag_counts(&mut html, summary);
    push_transcribers(&mut html, summary);
    push_problems(&mut html, summary);
    if options.detail {
        push_detail(&mut html, unreconciled, reconciled, config, options.page_size.max(1));
    }

    html.push_str("</body>\n</html>\n");
    html
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn push_totals(html: &mut String, summary: &ReconSummary) {
    html.push_str("<h2>Totals</h2>\n<table>\n");
    let rows = [
        ("Subjects", summary.subjects.to_string()),
        ("Transcripts", summary.transcripts.to_string()),
        ("Transcripts per subject", format!("{:.2}", summary.transcripts_per_subject)),
        ("Transcribers", summary.transcribers.len().to_string()),
    ];
    for (label, value) in rows {
        html.push_str(&format!("<tr><th>{label}</th><td>{value}</td></tr>\n"));
    }
    html.push_str("</table>\n");
}

fn push_flag_counts(html: &mut String, summary: &ReconSummary) {
    let flags: Vec<Flag> = Flag::ALL
        .into_iter()
        .filter(|f| summary.flag_total(*f) > 0)
        .collect();

    html.push_str("<h2>Reconciliation outcomes</h2>\n");
    if flags.is_empty() {
        html.push_str("<p>No reconciled fields.</p>\n");
        return;
    }

    html.push_str("<table>\n<tr><th>Column</th><th>Type</th>");
    for flag in &flags {
        html.push_str(&format!("<th>{flag}</th>"));
    }
    html.push_str("</tr>\n");
    for column in &summary.columns {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td>",
            escape(&column.column),
            column.kind
        ));
        for flag in &flags {
            let n = column.counts.get(flag).copied().unwrap_or(0);
            let class = if n > 0 && flag.is_problem() { " class=\"problem\"" } else { "" };
            html.push_str(&format!("<td{class}>{n}</td>"));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
}

fn push_transcribers(html: &mut String, summary: &ReconSummary) {
    if summary.transcribers.is_empty() {
        return;
    }
    let mut users: Vec<(&String, &usize)> = summary.transcribers.iter().collect();
    users.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    html.push_str("<h2>Transcribers</h2>\n<table>\n<tr><th>User</th><th>Transcripts</th></tr>\n");
    for (user, count) in users {
        html.push_str(&format!("<tr><td>{}</td><td>{count}</td></tr>\n", escape(user)));
    }
    html.push_str("</table>\n");
}

fn push_problems(html: &mut String, summary: &ReconSummary) {
    html.push_str(&format!("<h2>Problems ({})</h2>\n", summary.problems.len()));
    if summary.problems.is_empty() {
        html.push_str("<p>None.</p>\n");
        return;
    }
    html.push_str("<table>\n<tr><th>Subject</th><th>Column</th><th>Flag</th><th>Explanation</th></tr>\n");
    for p in &summary.problems {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"problem\">{}</td><td>{}</td></tr>\n",
            escape(&p.group),
            escape(&p.column),
            p.flag,
            escape(&p.note)
        ));
    }
    html.push_str("</table>\n");
}

fn push_detail(
    html: &mut String,
    unreconciled: &Table,
    reconciled: &Table,
    config: &ReconConfig,
    page_size: usize,
) {
    let by_key: HashMap<&str, &Row> = reconciled
        .rows()
        .iter()
        .filter_map(|r| r.value(&config.group_by).map(|k| (k, r)))
        .collect();
    let groups = unreconciled.groups(&config.group_by);
    let pages: Vec<_> = groups.chunks(page_size).collect();

    html.push_str("<h2>Details</h2>\n");
    if pages.len() > 1 {
        html.push_str("<nav class=\"pages\">");
        for i in 1..=pages.len() {
            html.push_str(&format!("<a href=\"#page-{i}\">{i}</a>"));
        }
        html.push_str("</nav>\n");
    }

    for (i, page) in pages.iter().enumerate() {
        html.push_str(&format!("<section id=\"page-{}\">\n", i + 1));
        for group in page.iter() {
            let Some(merged) = by_key.get(group.key.as_str()) else { continue };
            push_group(html, &group.key, merged, &group.rows, config);
        }
        html.push_str("</section>\n");
    }
}

fn push_group(html: &mut String, key: &str, merged: &Row, rows: &[&Row], config: &ReconConfig) {
    let reconciled_record = merged.to_record(true, false);

    let mut headers: Vec<String> = reconciled_record.iter().map(|(k, _)| k.clone()).collect();
    let records: Vec<Vec<(String, String)>> = rows.iter().map(|r| r.to_record(false, false)).collect();
    for (k, _) in records.iter().flatten() {
        if !headers.contains(k) {
            headers.push(k.clone());
        }
    }

    let mut explanations: HashMap<String, &str> = HashMap::new();
    for field in merged.fields() {
        if let Some((first, _)) = field.to_flat(true).into_iter().next() {
            explanations.insert(first, field.note.as_str());
        }
    }

    html.push_str(&format!("<h3>{} {}</h3>\n<table>\n<tr><th></th>", escape(&config.group_by), escape(key)));
    for h in &headers {
        html.push_str(&format!("<th>{}</th>", escape(h)));
    }
    html.push_str("</tr>\n");

    let lookup = |record: &[(String, String)], header: &str| -> String {
        record
            .iter()
            .find(|(k, _)| k == header)
            .map(|(_, v)| cell(v))
            .unwrap_or_default()
    };

    html.push_str("<tr class=\"reconciled\"><th>Reconciled</th>");
    for h in &headers {
        html.push_str(&format!("<td>{}</td>", lookup(&reconciled_record, h)));
    }
    html.push_str("</tr>\n<tr class=\"explanation\"><th>Explanation</th>");
    for h in &headers {
        let note = explanations.get(h).copied().unwrap_or_default();
        html.push_str(&format!("<td>{}</td>", escape(note)));
    }
    html.push_str("</tr>\n");

    for (row, record) in rows.iter().zip(&records) {
        let label = row.value(&config.row_key).unwrap_or("transcript");
        html.push_str(&format!("<tr><th>{}</th>", escape(label)));
        for h in &headers {
            html.push_str(&format!("<td>{}</td>", lookup(record, h)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Escaped cell contents; bare URLs become links.
fn cell(value: &str) -> String {
    let trimmed = value.trim();
    if is_url(trimmed) {
        let url = escape(trimmed);
        format!("<a href=\"{url}\" target=\"_blank\">{url}</a>")
    } else {
        escape(value)
    }
}

fn is_url(value: &str) -> bool {
    (value.starts_with("http://") || value.starts_with("https://"))
        && !value.chars().any(char::is_whitespace)
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
