use std::fmt;

use crate::field::FieldKind;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (threshold out of range, empty group-by, etc.).
    ConfigValidation(String),
    /// A column-type mapping names a type that does not exist.
    UnknownFieldType { column: String, kind: String },
    /// No usable rows for the selected workflow.
    EmptyInput { workflow: String },
    /// A cell does not hold the shape its column type expects.
    FieldParse { column: String, kind: FieldKind, value: String, reason: String },
    /// Input that is not a table of records (bad CSV, non-array JSON).
    InputFormat(String),
    /// Missing required column in input data.
    MissingColumn { column: String },
    /// IO error (file read, write, archive).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownFieldType { column, kind } => {
                write!(f, "column '{column}': unknown column type '{kind}'")
            }
            Self::EmptyInput { workflow } => write!(f, "workflow {workflow} has no data"),
            Self::FieldParse { column, kind, value, reason } => {
                write!(f, "column '{column}': cannot parse {kind} from '{value}': {reason}")
            }
            Self::InputFormat(msg) => write!(f, "input format error: {msg}"),
            Self::MissingColumn { column } => write!(f, "missing column '{column}'"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl ReconError {
    /// True for errors that only cost a single cell, not the run.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::FieldParse { .. })
    }
}
