//! Cell parsing: raw export strings to typed fields.
//!
//! Geometric cells hold JSON. A JSON array of shapes yields one field per
//! shape; the row assigns their suffixes.

use serde_json::{Map, Value};

use crate::error::ReconError;

use super::{BoxCoords, Field, FieldKind, FieldValue, HighlightSpan, LengthLine, PointCoords};

type Object = Map<String, Value>;

/// Parse one cell of `column` as `kind`.
///
/// Blank geometric cells yield no fields; blank text-like cells yield one
/// empty field so they count as blanks during voting.
pub fn parse_cell(kind: FieldKind, column: &str, raw: &str) -> Result<Vec<Field>, ReconError> {
    let values = match kind {
        FieldKind::NoOp => Ok(vec![FieldValue::NoOp(raw.to_string())]),
        FieldKind::Same => Ok(vec![FieldValue::Same(raw.to_string())]),
        FieldKind::Select => Ok(vec![FieldValue::Select(raw.to_string())]),
        FieldKind::Text => Ok(vec![FieldValue::Text(raw.to_string())]),
        _ if raw.trim().is_empty() => Ok(Vec::new()),
        FieldKind::MarkIndex => Ok(parse_mark_index(raw)),
        FieldKind::Box => from_json(raw, |json| shapes(json, parse_box)),
        FieldKind::Point => from_json(raw, |json| shapes(json, parse_point)),
        FieldKind::Length => from_json(raw, |json| shapes(json, parse_length)),
        FieldKind::Polygon => from_json(raw, parse_polygons),
        FieldKind::Highlight => from_json(raw, |json| parse_highlight(json, column).map(|v| vec![v])),
    }
    .map_err(|reason| ReconError::FieldParse {
        column: column.to_string(),
        kind,
        value: raw.to_string(),
        reason,
    })?;

    Ok(values.into_iter().map(|v| Field::new(column, v)).collect())
}

fn from_json(
    raw: &str,
    parse: impl FnOnce(&Value) -> Result<Vec<FieldValue>, String>,
) -> Result<Vec<FieldValue>, String> {
    let json: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    parse(&json)
}

/// One shape per object, whether the cell holds an object or an array.
fn shapes(json: &Value, parse: fn(&Object) -> Result<FieldValue, String>) -> Result<Vec<FieldValue>, String> {
    match json {
        Value::Object(obj) => Ok(vec![parse(obj)?]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_object().ok_or_else(|| "expected an object".to_string()).and_then(parse))
            .collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err("expected an object or an array of objects".into()),
    }
}

fn number(obj: &Object, key: &str) -> Result<f64, String> {
    match obj.get(key) {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| format!("'{key}' is out of range")),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| format!("'{key}' is not a number")),
        Some(_) => Err(format!("'{key}' is not a number")),
        None => Err(format!("missing '{key}'")),
    }
}

fn parse_box(obj: &Object) -> Result<FieldValue, String> {
    let coords = if obj.contains_key("width") || obj.contains_key("height") {
        let (x, y) = (number(obj, "x")?, number(obj, "y")?);
        BoxCoords {
            left: x,
            top: y,
            right: x + number(obj, "width")?,
            bottom: y + number(obj, "height")?,
        }
    } else {
        BoxCoords {
            left: number(obj, "left")?,
            top: number(obj, "top")?,
            right: number(obj, "right")?,
            bottom: number(obj, "bottom")?,
        }
    };
    Ok(FieldValue::Box(coords))
}

fn point(obj: &Object) -> Result<PointCoords, String> {
    Ok(PointCoords { x: number(obj, "x")?, y: number(obj, "y")? })
}

fn parse_point(obj: &Object) -> Result<FieldValue, String> {
    point(obj).map(FieldValue::Point)
}

fn parse_length(obj: &Object) -> Result<FieldValue, String> {
    Ok(FieldValue::Length(LengthLine {
        x1: number(obj, "x1")?,
        y1: number(obj, "y1")?,
        x2: number(obj, "x2")?,
        y2: number(obj, "y2")?,
        ..LengthLine::default()
    }))
}

fn polygon_points(json: &Value) -> Result<Vec<PointCoords>, String> {
    let items = match json {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("points") {
            Some(Value::Array(items)) => items,
            _ => return Err("polygon object needs a 'points' array".into()),
        },
        _ => return Err("expected a list of points".into()),
    };
    items
        .iter()
        .map(|p| p.as_object().ok_or_else(|| "point must be an object".to_string()).and_then(point))
        .collect()
}

/// `[{x, y}, …]` or `{"points": [...]}` is one polygon; an array of
/// either is several.
fn parse_polygons(json: &Value) -> Result<Vec<FieldValue>, String> {
    match json {
        Value::Array(items) if items.is_empty() => Ok(Vec::new()),
        Value::Array(items) if items[0].is_array() || items[0].get("points").is_some() => {
            items.iter().map(|p| polygon_points(p).map(FieldValue::Polygon)).collect()
        }
        Value::Null => Ok(Vec::new()),
        _ => Ok(vec![FieldValue::Polygon(polygon_points(json)?)]),
    }
}

fn parse_highlight(json: &Value, column: &str) -> Result<FieldValue, String> {
    let items: Vec<&Value> = match json {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![json],
        Value::Null => Vec::new(),
        _ => return Err("expected a list of spans".into()),
    };

    let mut spans = Vec::with_capacity(items.len());
    for item in items {
        let obj = item.as_object().ok_or_else(|| "span must be an object".to_string())?;
        let start = offset(obj, "start")?;
        let end = offset(obj, "end")?;
        if end < start {
            return Err(format!("span end {end} is before start {start}"));
        }
        let label = obj.get("label").and_then(Value::as_str).unwrap_or(column);
        match obj.get("text").and_then(Value::as_str) {
            Some(text) => spans.extend(trimmed_span(label, start, end, text)),
            None => spans.push(HighlightSpan::new(label, start, end, "")),
        }
    }
    Ok(FieldValue::Highlight(spans))
}

fn offset(obj: &Object, key: &str) -> Result<usize, String> {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|v| v as usize)
            .ok_or_else(|| format!("'{key}' must be a non-negative integer")),
        Some(_) => Err(format!("'{key}' must be a non-negative integer")),
        None => Err(format!("missing '{key}'")),
    }
}

/// Trim the span's text and move its offsets to match. Whitespace-only
/// spans are dropped.
fn trimmed_span(label: &str, start: usize, end: usize, text: &str) -> Option<HighlightSpan> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lead = text.chars().count() - text.trim_start().chars().count();
    let trail = text.chars().count() - text.trim_end().chars().count();
    let start = start + lead;
    let end = end.saturating_sub(trail).max(start);
    Some(HighlightSpan::new(label, start, end, trimmed))
}

fn parse_mark_index(raw: &str) -> Vec<FieldValue> {
    let mark = |value: String, index: Option<i64>| FieldValue::MarkIndex { value, index };
    let from_object = |obj: &Object| {
        let value = match obj.get("value") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        mark(value, obj.get("index").and_then(Value::as_i64))
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(obj)) => vec![from_object(&obj)],
        Ok(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Object(obj) => from_object(obj),
                Value::String(s) => mark(s.clone(), None),
                other => mark(other.to_string(), None),
            })
            .collect(),
        Ok(Value::String(s)) => vec![mark(s, None)],
        Ok(Value::Null) => Vec::new(),
        _ => vec![mark(raw.trim().to_string(), None)],
    }
}
