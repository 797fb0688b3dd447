// JSON import

use std::path::Path;

use labelrecon::load::table_from_json;
use labelrecon::{ReconConfig, ReconError, Table};

/// Import a JSON array of flat records. Key order sets column order.
pub fn import(path: &Path, config: &ReconConfig) -> Result<Table, ReconError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ReconError::Io(format!("{}: {e}", path.display())))?;
    table_from_json(&content, config)
}
