use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::ReconConfig;
use crate::field::FieldKind;
use crate::flag::Flag;
use crate::table::Table;

/// A reconciled field a curator should check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Problem {
    pub group: String,
    pub column: String,
    pub flag: Flag,
    pub note: String,
}

/// Flag counts for one reconciled column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnFlags {
    pub column: String,
    pub kind: FieldKind,
    pub counts: BTreeMap<Flag, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub workflow: String,
    pub subjects: usize,
    pub transcripts: usize,
    pub transcripts_per_subject: f64,
    /// Transcriptions per volunteer; empty without a user column.
    pub transcribers: BTreeMap<String, usize>,
    pub columns: Vec<ColumnFlags>,
    pub problems: Vec<Problem>,
}

impl ReconSummary {
    pub fn build(unreconciled: &Table, reconciled: &Table, config: &ReconConfig) -> Self {
        let subjects = reconciled.len();
        let transcripts = unreconciled.len();

        let mut transcribers: BTreeMap<String, usize> = BTreeMap::new();
        if let Some(user_column) = config.user_column.as_deref() {
            for row in unreconciled.rows() {
                if let Some(user) = row.value(user_column) {
                    *transcribers.entry(user.to_string()).or_insert(0) += 1;
                }
            }
        }

        let mut columns: Vec<ColumnFlags> = reconciled
            .columns()
            .into_iter()
            .filter(|c| c.kind != FieldKind::NoOp)
            .map(|c| ColumnFlags { column: c.name, kind: c.kind, counts: BTreeMap::new() })
            .collect();

        let mut problems = Vec::new();
        for row in reconciled.rows() {
            let group = row.value(&config.group_by).unwrap_or_default();
            for field in row.fields() {
                let name = field.field_name();
                if let Some(column) = columns.iter_mut().find(|c| c.column == name) {
                    *column.counts.entry(field.flag).or_insert(0) += 1;
                }
                if field.flag.is_problem() {
                    problems.push(Problem {
                        group: group.to_string(),
                        column: name,
                        flag: field.flag,
                        note: field.note.clone(),
                    });
                }
            }
        }

        Self {
            workflow: config.workflow_label(),
            subjects,
            transcripts,
            transcripts_per_subject: if subjects == 0 {
                0.0
            } else {
                transcripts as f64 / subjects as f64
            },
            transcribers,
            columns,
            problems,
        }
    }

    /// Count of `flag` over every column.
    pub fn flag_total(&self, flag: Flag) -> usize {
        self.columns.iter().filter_map(|c| c.counts.get(&flag)).sum()
    }
}
