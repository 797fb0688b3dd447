use crate::flag::Flag;
use crate::note;

use super::{Field, FieldValue};

pub(super) fn reconcile_noop(template: &Field) -> Field {
    Field::like(
        template,
        FieldValue::NoOp(String::new()),
        "Not reconciled".into(),
        Flag::Empty,
    )
}

/// Columns that must agree across the group, such as the group key.
pub(super) fn reconcile_same(template: &Field, group: &[Option<&Field>]) -> Field {
    let values: Vec<&str> = group.iter().flatten().map(|f| f.text_value()).collect();

    let mut distinct: Vec<&str> = Vec::new();
    for &v in &values {
        if !distinct.contains(&v) {
            distinct.push(v);
        }
    }

    match distinct.as_slice() {
        [only] => {
            let note = if values.len() == 1 {
                "There is only one record".to_string()
            } else {
                format!("All {} are identical", note::records(values.len()))
            };
            Field::like(template, FieldValue::Same((*only).to_string()), note, Flag::Ok)
        }
        _ => {
            let listed: Vec<String> = distinct.iter().map(|v| format!("'{v}'")).collect();
            let note = format!(
                "No match on {}: {}",
                note::records(values.len()),
                listed.join(", ")
            );
            Field::like(template, FieldValue::Same(String::new()), note, Flag::NoMatch)
        }
    }
}
