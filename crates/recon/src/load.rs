//! Flat exports (CSV text, JSON arrays) to unreconciled tables.
//!
//! Callers own file access; these functions take the file contents.

use serde_json::Value;

use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::field::{parse_cell, FieldKind};
use crate::row::Row;
use crate::table::Table;

/// Column that, when present, names each row's workflow.
pub const WORKFLOW_COLUMN: &str = "workflow_id";

pub fn table_from_csv(data: &str, config: &ReconConfig) -> Result<Table, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::InputFormat(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if !headers.iter().any(|h| *h == config.group_by) {
        return Err(ReconError::MissingColumn { column: config.group_by.clone() });
    }
    warn_unmatched_types(config, &headers);

    let kinds: Vec<FieldKind> = headers.iter().map(|h| config.kind_for(h)).collect();
    let workflow_idx = headers.iter().position(|h| h == WORKFLOW_COLUMN);
    if config.workflow_id.is_some() && workflow_idx.is_none() {
        return Err(ReconError::MissingColumn { column: WORKFLOW_COLUMN.into() });
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| ReconError::InputFormat(format!("line {}: {e}", i + 2)))?;

        if !in_workflow(config, workflow_idx.and_then(|idx| record.get(idx))) {
            continue;
        }

        let cells = headers
            .iter()
            .zip(&kinds)
            .enumerate()
            .map(|(idx, (column, kind))| (column.as_str(), *kind, record.get(idx).unwrap_or("")));
        rows.push(build_row(cells)?);
    }

    log::debug!("read {} rows with {} columns", rows.len(), headers.len());
    Ok(Table::new(rows))
}

/// Read a JSON array of flat objects. Nested values are kept as JSON text
/// so geometric columns parse the same way they do from CSV.
pub fn table_from_json(data: &str, config: &ReconConfig) -> Result<Table, ReconError> {
    let json: Value =
        serde_json::from_str(data).map_err(|e| ReconError::InputFormat(e.to_string()))?;
    let Value::Array(items) = json else {
        return Err(ReconError::InputFormat("expected a JSON array of records".into()));
    };

    let mut seen_group_by = false;
    let mut seen_workflow = false;
    let mut rows = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Value::Object(obj) = item else {
            return Err(ReconError::InputFormat(format!("record {} is not an object", i + 1)));
        };
        seen_group_by |= obj.contains_key(&config.group_by);
        seen_workflow |= obj.contains_key(WORKFLOW_COLUMN);

        let cells: Vec<(&str, String)> =
            obj.iter().map(|(k, v)| (k.as_str(), cell_text(v))).collect();

        let workflow = cells
            .iter()
            .find(|(k, _)| *k == WORKFLOW_COLUMN)
            .map(|(_, v)| v.as_str());
        if !in_workflow(config, workflow) {
            continue;
        }

        rows.push(build_row(
            cells.iter().map(|(column, raw)| (*column, config.kind_for(column), raw.as_str())),
        )?);
    }

    if !items.is_empty() && !seen_group_by {
        return Err(ReconError::MissingColumn { column: config.group_by.clone() });
    }
    if !items.is_empty() && config.workflow_id.is_some() && !seen_workflow {
        return Err(ReconError::MissingColumn { column: WORKFLOW_COLUMN.into() });
    }

    log::debug!("read {} records", rows.len());
    Ok(Table::new(rows))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// With a workflow selected, only rows naming exactly that workflow pass.
fn in_workflow(config: &ReconConfig, value: Option<&str>) -> bool {
    let Some(wanted) = config.workflow_id else {
        return true;
    };
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .is_some_and(|id| id == wanted)
}

/// Parse every cell and assemble the row. Cells that do not parse are
/// logged and left out, so the row counts as absent for that column; any
/// other error ends the load.
fn build_row<'a>(
    cells: impl Iterator<Item = (&'a str, FieldKind, &'a str)>,
) -> Result<Row, ReconError> {
    let mut fields = Vec::new();
    for (column, kind, raw) in cells {
        match parse_cell(kind, column, raw) {
            Ok(parsed) => fields.extend(parsed),
            Err(e) if e.is_partial() => log::warn!("{e}; treating the cell as blank"),
            Err(e) => return Err(e),
        }
    }
    Ok(Row::from_fields(fields))
}

fn warn_unmatched_types(config: &ReconConfig, headers: &[String]) {
    for column in config.column_types.keys() {
        if !headers.contains(column) {
            log::warn!("column type given for '{column}' but the input has no such column");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;

    fn config(types: &str) -> ReconConfig {
        let mut config = ReconConfig::default();
        config.parse_column_types(types).unwrap();
        config
    }

    #[test]
    fn csv_columns_get_their_kinds() {
        let data = "subject_id,user_name,country,pin\n\
                    s1,alice,USA,\"{\"\"x\"\":1,\"\"y\"\":2}\"\n";
        let table = table_from_csv(data, &config("country:select,pin:point")).unwrap();
        let row = &table.rows()[0];
        assert_eq!(row.get("subject_id", 1).unwrap().kind(), FieldKind::Same);
        assert_eq!(row.get("user_name", 1).unwrap().kind(), FieldKind::NoOp);
        assert_eq!(row.get("country", 1).unwrap().kind(), FieldKind::Select);
        assert_eq!(row.get("pin", 1).unwrap().kind(), FieldKind::Point);
    }

    #[test]
    fn csv_requires_group_by_column() {
        let err = table_from_csv("id,color\n1,red\n", &ReconConfig::default()).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { ref column } if column == "subject_id"));
    }

    #[test]
    fn bad_cell_is_absent_not_fatal() {
        let data = "subject_id,pin\ns1,{broken\ns1,\"{\"\"x\"\":3,\"\"y\"\":4}\"\n";
        let table = table_from_csv(data, &config("pin:point")).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.rows()[0].get("pin", 1).is_none());
        assert!(table.rows()[1].get("pin", 1).is_some());
    }

    #[test]
    fn workflow_filter() {
        let data = "subject_id,workflow_id,color\ns1,10,red\ns1,11,blue\ns2,,green\n";
        let mut cfg = config("color:select");
        cfg.workflow_id = Some(10);
        let table = table_from_csv(data, &cfg).unwrap();
        let colors: Vec<&str> =
            table.rows().iter().map(|r| r.get("color", 1).unwrap().text_value()).collect();
        assert_eq!(colors, vec!["red"]);
    }

    #[test]
    fn workflow_filter_needs_workflow_column() {
        let mut cfg = config("color:select");
        cfg.workflow_id = Some(10);

        let err = table_from_csv("subject_id,color\ns1,red\n", &cfg).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { ref column } if column == "workflow_id"));

        let err = table_from_json(r#"[{"subject_id": "s1", "color": "red"}]"#, &cfg).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { ref column } if column == "workflow_id"));

        let json = r#"[{"subject_id": "s1", "workflow_id": 10}, {"subject_id": "s2", "workflow_id": null}]"#;
        assert_eq!(table_from_json(json, &cfg).unwrap().len(), 1);
    }

    #[test]
    fn json_keeps_key_order_and_nested_shapes() {
        let data = r#"[
            {"subject_id": "s1", "user_name": "alice", "box": {"x": 1, "y": 2, "width": 3, "height": 4}, "n": 5},
            {"subject_id": "s1", "user_name": null, "box": [{"x": 0, "y": 0, "width": 1, "height": 1}, {"x": 5, "y": 5, "width": 1, "height": 1}]}
        ]"#;
        let table = table_from_json(data, &config("box:box")).unwrap();
        let names: Vec<String> = table.columns().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["subject_id", "user_name", "box", "n", "box #2"]);
        assert_eq!(table.rows()[0].value("n"), Some("5"));
        assert!(matches!(table.rows()[1].get("box", 2).unwrap().value, FieldValue::Box(_)));
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        let cfg = ReconConfig::default();
        assert!(matches!(table_from_json("{}", &cfg), Err(ReconError::InputFormat(_))));
        assert!(matches!(table_from_json("[1]", &cfg), Err(ReconError::InputFormat(_))));
        assert!(matches!(
            table_from_json(r#"[{"id": 1}]"#, &cfg),
            Err(ReconError::MissingColumn { .. })
        ));
        assert!(table_from_json("[]", &cfg).unwrap().is_empty());
    }
}
