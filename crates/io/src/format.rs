// Input format registry

use std::collections::BTreeMap;
use std::path::Path;

use labelrecon::{ReconConfig, ReconError, Table};

/// Reads one input file into an unreconciled table.
pub type Reader = fn(&Path, &ReconConfig) -> Result<Table, ReconError>;

/// Input readers by format name. Built once at start-up and passed down.
pub struct Readers {
    readers: BTreeMap<&'static str, Reader>,
}

impl Readers {
    /// The formats this crate ships: `csv` and `json`.
    pub fn builtin() -> Self {
        let mut readers: BTreeMap<&'static str, Reader> = BTreeMap::new();
        readers.insert("csv", crate::csv::import);
        readers.insert("json", crate::json::import);
        Self { readers }
    }

    pub fn get(&self, format: &str) -> Option<Reader> {
        self.readers.get(format).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.readers.keys().copied()
    }

    /// Read `path` with the named format.
    pub fn read(&self, format: &str, path: &Path, config: &ReconConfig) -> Result<Table, ReconError> {
        let reader = self.get(format).ok_or_else(|| {
            let known: Vec<&str> = self.names().collect();
            ReconError::ConfigValidation(format!(
                "unknown input format '{format}' (expected one of: {})",
                known.join(", ")
            ))
        })?;
        reader(path, config)
    }
}

/// Format implied by a file extension, if any.
pub fn format_for_path(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "csv" => Some("csv"),
        "json" => Some("json"),
        _ => None,
    }
}
