//! Typed fields: one variant per annotation type, each with its own
//! serialization and reconciliation rule.

mod geometry;
mod highlight;
mod length;
mod parse;
mod same;
mod text;
mod vocab;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ReconConfig;
use crate::flag::Flag;

pub use length::{Calibration, LengthScale};
pub use parse::parse_cell;

/// Column suffix carrying a field's reconciliation note.
pub const EXPLAIN_SUFFIX: &str = ": Explanation";

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// Column type. The serde names are the canonical spellings accepted in
/// TOML, on the command line and in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[serde(rename = "noop", alias = "no_op")]
    NoOp,
    Same,
    Select,
    Text,
    Box,
    Point,
    #[serde(alias = "line")]
    Length,
    Polygon,
    #[serde(alias = "highlighter")]
    Highlight,
    #[serde(alias = "markindex")]
    MarkIndex,
}

impl FieldKind {
    /// Task fields get per-name-group suffixes; plain columns do not.
    pub fn is_task(self) -> bool {
        !matches!(self, Self::NoOp | Self::Same)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoOp => "noop",
            Self::Same => "same",
            Self::Select => "select",
            Self::Text => "text",
            Self::Box => "box",
            Self::Point => "point",
            Self::Length => "length",
            Self::Polygon => "polygon",
            Self::Highlight => "highlight",
            Self::MarkIndex => "mark_index",
        }
    }
}

impl FromStr for FieldKind {
    type Err = String;

    /// Case-insensitive parse of a serde name or alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use serde::de::value::{Error, StrDeserializer};
        use serde::de::IntoDeserializer;

        let name = s.trim().to_ascii_lowercase();
        let de: StrDeserializer<'_, Error> = name.as_str().into_deserializer();
        Self::deserialize(de).map_err(|_| format!("unknown field type '{name}'"))
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BoxCoords {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointCoords {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LengthLine {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    /// Distance between the endpoints, filled in on reconciliation.
    pub pixel_length: f64,
    /// Real-world length once a scale or ruler is known.
    pub calibration: Option<Calibration>,
    /// Units per pixel when this line is itself a ruler.
    pub ruler: Option<Calibration>,
}

/// One highlighted stretch of text. `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HighlightSpan {
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Rows backing this span after reconciliation; 1 before.
    pub support: usize,
}

impl HighlightSpan {
    pub fn new(label: impl Into<String>, start: usize, end: usize, text: impl Into<String>) -> Self {
        Self { label: label.into(), start, end, text: text.into(), support: 1 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    NoOp(String),
    Same(String),
    Select(String),
    Text(String),
    Box(BoxCoords),
    Point(PointCoords),
    Length(LengthLine),
    Polygon(Vec<PointCoords>),
    Highlight(Vec<HighlightSpan>),
    /// Marked value plus its category index when the source supplied one.
    MarkIndex { value: String, index: Option<i64> },
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::NoOp(_) => FieldKind::NoOp,
            Self::Same(_) => FieldKind::Same,
            Self::Select(_) => FieldKind::Select,
            Self::Text(_) => FieldKind::Text,
            Self::Box(_) => FieldKind::Box,
            Self::Point(_) => FieldKind::Point,
            Self::Length(_) => FieldKind::Length,
            Self::Polygon(_) => FieldKind::Polygon,
            Self::Highlight(_) => FieldKind::Highlight,
            Self::MarkIndex { .. } => FieldKind::MarkIndex,
        }
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Base column or task name shared by repeated instances.
    pub name_group: String,
    /// 1-based occurrence of `name_group` within its row.
    pub suffix: usize,
    pub note: String,
    pub flag: Flag,
    pub value: FieldValue,
}

impl Field {
    pub fn new(name_group: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name_group: name_group.into(),
            suffix: 1,
            note: String::new(),
            flag: Flag::NoFlag,
            value,
        }
    }

    /// A reconciled field in the same column as `template`.
    pub(crate) fn like(template: &Field, value: FieldValue, note: String, flag: Flag) -> Self {
        Self {
            name_group: template.name_group.clone(),
            suffix: template.suffix,
            note,
            flag,
            value,
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.value.kind()
    }

    /// Column key: the name group, tie-broken with ` #n` after the first.
    pub fn field_name(&self) -> String {
        if self.suffix <= 1 {
            self.name_group.clone()
        } else {
            format!("{} #{}", self.name_group, self.suffix)
        }
    }

    pub fn key(&self) -> (&str, usize) {
        (&self.name_group, self.suffix)
    }

    fn header(&self, attr: &str) -> String {
        format!("{}: {attr}", self.field_name())
    }

    /// Scalar value for string-valued variants; empty for geometry.
    pub fn text_value(&self) -> &str {
        match &self.value {
            FieldValue::NoOp(v)
            | FieldValue::Same(v)
            | FieldValue::Select(v)
            | FieldValue::Text(v)
            | FieldValue::MarkIndex { value: v, .. } => v,
            _ => "",
        }
    }

    /// Flat column → value pairs, in output order.
    pub fn to_flat(&self, reconciled: bool) -> Vec<(String, String)> {
        match &self.value {
            FieldValue::NoOp(v) | FieldValue::Same(v) | FieldValue::Select(v) | FieldValue::Text(v) => {
                vec![(self.field_name(), v.clone())]
            }
            FieldValue::MarkIndex { value, index } => vec![
                (self.field_name(), value.clone()),
                (self.header("index"), index.map(|i| i.to_string()).unwrap_or_default()),
            ],
            FieldValue::Box(b) => vec![
                (self.header("left"), fmt_num(b.left)),
                (self.header("top"), fmt_num(b.top)),
                (self.header("right"), fmt_num(b.right)),
                (self.header("bottom"), fmt_num(b.bottom)),
            ],
            FieldValue::Point(p) => vec![
                (self.header("x"), fmt_num(p.x)),
                (self.header("y"), fmt_num(p.y)),
            ],
            FieldValue::Length(line) => {
                let mut flat = vec![
                    (self.header("x1"), fmt_num(line.x1)),
                    (self.header("y1"), fmt_num(line.y1)),
                    (self.header("x2"), fmt_num(line.x2)),
                    (self.header("y2"), fmt_num(line.y2)),
                ];
                if reconciled {
                    flat.push((self.header("pixel length"), fmt_num(line.pixel_length)));
                    if let Some(cal) = &line.calibration {
                        flat.push((self.header(&format!("length {}", cal.units)), fmt_num(cal.value)));
                    }
                }
                flat
            }
            FieldValue::Polygon(points) => {
                let rounded: Vec<serde_json::Value> = points
                    .iter()
                    .map(|p| serde_json::json!({ "x": p.x.round_ties_even() as i64, "y": p.y.round_ties_even() as i64 }))
                    .collect();
                vec![(self.header("points"), serde_json::Value::Array(rounded).to_string())]
            }
            FieldValue::Highlight(spans) => {
                let items: Vec<serde_json::Value> = spans
                    .iter()
                    .map(|s| {
                        let mut obj = serde_json::json!({
                            "label": s.label,
                            "start": s.start,
                            "end": s.end,
                            "text": s.text,
                        });
                        if reconciled {
                            obj["support"] = serde_json::json!(s.support);
                        }
                        obj
                    })
                    .collect();
                vec![(self.header("spans"), serde_json::Value::Array(items).to_string())]
            }
        }
    }

    /// Header of the explanation column.
    pub fn note_header(&self) -> String {
        format!("{}{EXPLAIN_SUFFIX}", self.field_name())
    }
}

/// Integers print without a fraction; everything else to 2 places.
pub fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let s = format!("{value:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

// ---------------------------------------------------------------------------
// Reconcile dispatch
// ---------------------------------------------------------------------------

/// Everything a variant may consult besides the group itself.
pub struct ReconcileArgs<'a> {
    pub config: &'a ReconConfig,
    /// Contributing user per group entry, in row order.
    pub users: &'a [Option<&'a str>],
}

impl<'a> ReconcileArgs<'a> {
    pub fn new(config: &'a ReconConfig, users: &'a [Option<&'a str>]) -> Self {
        Self { config, users }
    }

    pub(crate) fn user(&self, index: usize) -> Option<&'a str> {
        self.users.get(index).copied().flatten()
    }
}

/// Reconcile one column of a group.
///
/// `group` holds one entry per row, `None` where the row lacks the field.
/// Returns `None` only when every entry is absent.
pub fn reconcile(
    kind: FieldKind,
    group: &[Option<&Field>],
    row_count: usize,
    args: &ReconcileArgs<'_>,
) -> Option<Field> {
    let template = group.iter().flatten().next()?;

    let field = match kind {
        FieldKind::NoOp => same::reconcile_noop(template),
        FieldKind::Same => same::reconcile_same(template, group),
        FieldKind::Select => vocab::reconcile_select(template, group, row_count),
        FieldKind::MarkIndex => vocab::reconcile_mark_index(template, group, row_count),
        FieldKind::Text => text::reconcile(template, group, row_count, args),
        FieldKind::Box => geometry::reconcile_box(template, group, row_count),
        FieldKind::Point => geometry::reconcile_point(template, group, row_count),
        FieldKind::Polygon => geometry::reconcile_polygon(template, group, row_count),
        FieldKind::Length => length::reconcile(template, group, row_count),
        FieldKind::Highlight => highlight::reconcile(template, group, row_count, args),
    };

    Some(field)
}

/// Row-level pass over a group's reconciled fields.
pub fn reconcile_row(fields: &mut [Field]) {
    length::calibrate_with_ruler(fields);
}
