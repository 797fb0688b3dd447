use std::collections::{HashMap, HashSet};

use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::field::{self, Field, FieldKind, ReconcileArgs};
use crate::row::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Unreconciled,
    Reconciled,
}

/// One column of the table schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: FieldKind,
}

/// Rows sharing one group-key value, in input order.
#[derive(Debug)]
pub struct Group<'a> {
    pub key: String,
    pub rows: Vec<&'a Row>,
}

#[derive(Debug, Clone)]
pub struct Table {
    rows: Vec<Row>,
    state: TableState,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows, state: TableState::Unreconciled }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    // -----------------------------------------------------------------------
    // Schema + serialization
    // -----------------------------------------------------------------------

    /// Column keys in first-seen order across all rows.
    pub fn columns(&self) -> Vec<Column> {
        let mut seen = HashSet::new();
        let mut columns: Vec<Column> = Vec::new();
        for field in self.rows.iter().flat_map(Row::fields) {
            let name = field.field_name();
            if seen.insert(name.clone()) {
                columns.push(Column { name, kind: field.kind() });
            }
        }
        columns
    }

    /// Flat headers: each column's value headers, then its explanation
    /// header when `add_notes` is set.
    pub fn headers(&self, add_notes: bool) -> Vec<String> {
        struct ColumnHeaders {
            keys: Vec<String>,
            note: String,
        }

        let reconciled = self.state == TableState::Reconciled;
        let mut order: Vec<String> = Vec::new();
        let mut per_column: HashMap<String, ColumnHeaders> = HashMap::new();

        for field in self.rows.iter().flat_map(Row::fields) {
            let name = field.field_name();
            let column = per_column.entry(name.clone()).or_insert_with(|| {
                order.push(name);
                ColumnHeaders { keys: Vec::new(), note: field.note_header() }
            });
            for (key, _) in field.to_flat(reconciled) {
                if !column.keys.contains(&key) {
                    column.keys.push(key);
                }
            }
        }

        let mut headers = Vec::new();
        for name in order {
            if let Some(column) = per_column.remove(&name) {
                headers.extend(column.keys);
                if add_notes {
                    headers.push(column.note);
                }
            }
        }
        headers
    }

    /// One ordered key/value record per row.
    pub fn records(&self, add_notes: bool) -> Vec<Vec<(String, String)>> {
        let reconciled = self.state == TableState::Reconciled;
        self.rows
            .iter()
            .map(|row| row.to_record(reconciled, add_notes))
            .collect()
    }

    /// Records aligned to `headers(add_notes)`; missing cells are empty.
    pub fn grid(&self, add_notes: bool) -> (Vec<String>, Vec<Vec<String>>) {
        let headers = self.headers(add_notes);
        let rows = self
            .records(add_notes)
            .into_iter()
            .map(|record| {
                let mut by_key: HashMap<String, String> = record.into_iter().collect();
                headers
                    .iter()
                    .map(|h| by_key.remove(h).unwrap_or_default())
                    .collect()
            })
            .collect();
        (headers, rows)
    }

    // -----------------------------------------------------------------------
    // Grouping + reconciliation
    // -----------------------------------------------------------------------

    /// Partition rows by `group_by` in first-seen key order. Rows without a
    /// key value are skipped.
    pub fn groups(&self, group_by: &str) -> Vec<Group<'_>> {
        let mut groups: Vec<Group<'_>> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for (i, row) in self.rows.iter().enumerate() {
            let Some(key) = row.value(group_by) else {
                log::warn!("row {} has no '{group_by}' value; skipping it", i + 1);
                continue;
            };
            match index.get(key) {
                Some(&g) => groups[g].rows.push(row),
                None => {
                    index.insert(key, groups.len());
                    groups.push(Group { key: key.to_string(), rows: vec![row] });
                }
            }
        }
        groups
    }

    /// Reconcile every group into one row. The source table is untouched.
    pub fn reconcile(&self, config: &ReconConfig) -> Result<Table, ReconError> {
        let empty = || ReconError::EmptyInput { workflow: config.workflow_label() };
        if self.rows.is_empty() {
            return Err(empty());
        }

        let groups = self.groups(&config.group_by);
        if groups.is_empty() {
            return Err(empty());
        }

        let mut rows = Vec::with_capacity(groups.len());
        for mut group in groups {
            if let Some(cap) = config.max_transcriptions {
                if group.rows.len() > cap {
                    log::debug!(
                        "group '{}': keeping {cap} of {} transcriptions",
                        group.key,
                        group.rows.len()
                    );
                    group.rows.truncate(cap);
                }
            }

            let fields = reconcile_group(&group, config);
            if fields.is_empty() {
                log::debug!("group '{}' produced no fields", group.key);
                continue;
            }
            rows.push(Row::from_reconciled(fields));
        }

        log::info!("reconciled {} rows into {} groups", self.rows.len(), rows.len());
        Ok(Table { rows, state: TableState::Reconciled })
    }
}

fn reconcile_group(group: &Group<'_>, config: &ReconConfig) -> Vec<Field> {
    let row_count = group.rows.len();

    let mut keys: Vec<(&str, usize)> = Vec::new();
    for field in group.rows.iter().flat_map(|r| r.fields()) {
        let key = field.key();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    let users: Vec<Option<&str>> = group
        .rows
        .iter()
        .map(|r| config.user_column.as_deref().and_then(|c| r.value(c)))
        .collect();
    let args = ReconcileArgs::new(config, &users);

    let mut fields: Vec<Field> = Vec::with_capacity(keys.len());
    for (name_group, suffix) in keys {
        let column: Vec<Option<&Field>> =
            group.rows.iter().map(|r| r.get(name_group, suffix)).collect();
        let Some(kind) = column.iter().flatten().next().map(|f| f.kind()) else {
            continue;
        };
        fields.extend(field::reconcile(kind, &column, row_count, &args));
    }

    field::reconcile_row(&mut fields);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldValue, PointCoords};
    use crate::flag::Flag;

    fn row(subject: &str, user: &str, color: &str) -> Row {
        Row::from_fields([
            Field::new("subject_id", FieldValue::Same(subject.into())),
            Field::new("user_name", FieldValue::NoOp(user.into())),
            Field::new("color", FieldValue::Select(color.into())),
        ])
    }

    #[test]
    fn empty_table_is_an_error() {
        let config = ReconConfig { workflow_name: Some("Labels".into()), ..Default::default() };
        let err = Table::new(Vec::new()).reconcile(&config).unwrap_err();
        assert_eq!(err.to_string(), "workflow 'Labels' has no data");
    }

    #[test]
    fn rows_without_keys_are_not_usable() {
        let table = Table::new(vec![row("", "alice", "red")]);
        assert!(matches!(
            table.reconcile(&ReconConfig::default()),
            Err(ReconError::EmptyInput { .. })
        ));
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let table = Table::new(vec![
            row("s2", "a", "red"),
            row("s1", "b", "red"),
            row("s2", "c", "blue"),
            row("", "d", "blue"),
            row("s3", "e", "red"),
        ]);
        let groups = table.groups("subject_id");
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["s2", "s1", "s3"]);
        assert_eq!(groups[0].rows.len(), 2);

        let reconciled = table.reconcile(&ReconConfig::default()).unwrap();
        assert_eq!(reconciled.state(), TableState::Reconciled);
        let subjects: Vec<Option<&str>> =
            reconciled.rows().iter().map(|r| r.value("subject_id")).collect();
        assert_eq!(subjects, vec![Some("s2"), Some("s1"), Some("s3")]);
        assert_eq!(table.state(), TableState::Unreconciled);
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn cap_limits_transcriptions() {
        let table = Table::new(vec![
            row("s1", "a", "red"),
            row("s1", "b", "red"),
            row("s1", "c", "blue"),
            row("s1", "d", "blue"),
        ]);
        let config = ReconConfig { max_transcriptions: Some(2), ..Default::default() };
        let reconciled = table.reconcile(&config).unwrap();
        let color = reconciled.rows()[0].get("color", 1).unwrap();
        assert_eq!(color.flag, Flag::Unanimous);
        assert_eq!(color.note, "Unanimous match, 2 of 2 records");
    }

    #[test]
    fn absent_columns_drop_out_of_schema() {
        let with_pin = Row::from_fields([
            Field::new("subject_id", FieldValue::Same("s1".into())),
            Field::new("pin", FieldValue::Point(PointCoords { x: 2.0, y: 4.0 })),
        ]);
        let without_pin = Row::from_fields([Field::new("subject_id", FieldValue::Same("s2".into()))]);
        let table = Table::new(vec![with_pin, without_pin]);
        let reconciled = table.reconcile(&ReconConfig::default()).unwrap();

        assert!(reconciled.rows()[1].get("pin", 1).is_none());
        let names: Vec<String> = reconciled.columns().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["subject_id", "pin"]);
    }

    #[test]
    fn headers_follow_columns_with_notes() {
        let table = Table::new(vec![row("s1", "alice", "red"), row("s1", "bob", "red")]);
        let reconciled = table.reconcile(&ReconConfig::default()).unwrap();
        assert_eq!(
            reconciled.headers(true),
            vec![
                "subject_id",
                "subject_id: Explanation",
                "user_name",
                "user_name: Explanation",
                "color",
                "color: Explanation",
            ]
        );
        let (headers, grid) = reconciled.grid(false);
        assert_eq!(headers, vec!["subject_id", "user_name", "color"]);
        assert_eq!(grid, vec![vec!["s1".to_string(), String::new(), "red".to_string()]]);
    }

    #[test]
    fn grid_fills_missing_cells() {
        let table = Table::new(vec![
            Row::from_fields([Field::new("a", FieldValue::NoOp("1".into()))]),
            Row::from_fields([Field::new("b", FieldValue::NoOp("2".into()))]),
        ]);
        let (headers, grid) = table.grid(false);
        assert_eq!(headers, vec!["a", "b"]);
        assert_eq!(grid[0], vec!["1".to_string(), String::new()]);
        assert_eq!(grid[1], vec![String::new(), "2".to_string()]);
    }

    #[test]
    fn headers_keep_first_seen_order_across_rows() {
        let table = Table::new(vec![
            Row::from_fields([Field::new("b", FieldValue::NoOp("1".into()))]),
            Row::from_fields([
                Field::new("a", FieldValue::NoOp("2".into())),
                Field::new("b", FieldValue::NoOp("3".into())),
            ]),
            Row::from_fields([Field::new("c", FieldValue::NoOp("4".into()))]),
        ]);
        assert_eq!(
            table.headers(true),
            vec!["b", "b: Explanation", "a", "a: Explanation", "c", "c: Explanation"]
        );
        let names: Vec<String> = table.columns().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
