// CSV import/export

use std::io::Read;
use std::path::Path;

use labelrecon::load::table_from_csv;
use labelrecon::{ReconConfig, ReconError, Table};

pub fn import(path: &Path, config: &ReconConfig) -> Result<Table, ReconError> {
    let content = read_file_as_utf8(path)
        .map_err(|e| ReconError::Io(format!("{}: {e}", path.display())))?;
    table_from_csv(&content, config)
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            log::warn!("{} is not UTF-8; decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Render `table` as CSV bytes, with explanation columns when `add_notes`.
pub fn render(table: &Table, add_notes: bool) -> Result<Vec<u8>, String> {
    let (headers, rows) = table.grid(add_notes);

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(&headers).map_err(|e| e.to_string())?;
    for row in &rows {
        writer.write_record(row).map_err(|e| e.to_string())?;
    }
    writer.into_inner().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn config() -> ReconConfig {
        let mut config = ReconConfig::default();
        config.parse_column_types("color:select").unwrap();
        config
    }

    #[test]
    fn test_import_reads_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.csv");
        fs::write(&path, "subject_id,user_name,color\ns1,alice,red\ns1,bob,red\n").unwrap();

        let table = import(&path, &config()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].value("user_name"), Some("bob"));
    }

    #[test]
    fn test_import_strips_bom_and_decodes_latin1() {
        let dir = tempdir().unwrap();
        let bom = dir.path().join("bom.csv");
        fs::write(&bom, "\u{feff}subject_id,color\ns1,red\n").unwrap();
        assert_eq!(import(&bom, &config()).unwrap().len(), 1);

        let latin = dir.path().join("latin.csv");
        let mut bytes = b"subject_id,place\ns1,Bogot".to_vec();
        bytes.push(0xE1); // 'á' in Windows-1252
        bytes.push(b'\n');
        fs::write(&latin, bytes).unwrap();
        let table = import(&latin, &config()).unwrap();
        assert_eq!(table.rows()[0].value("place"), Some("Bogotá"));
    }

    #[test]
    fn test_import_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = import(&dir.path().join("nope.csv"), &config()).unwrap_err();
        assert!(matches!(err, ReconError::Io(_)));
    }

    #[test]
    fn test_render_reconciled_with_notes() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.csv");
        fs::write(&input, "subject_id,color\ns1,red\ns1,\"red\"\ns2,blue\n").unwrap();
        let config = config();
        let reconciled = import(&input, &config).unwrap().reconcile(&config).unwrap();

        let content = String::from_utf8(render(&reconciled, true).unwrap()).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("subject_id,subject_id: Explanation,color,color: Explanation")
        );
        assert_eq!(
            lines.next(),
            Some("s1,All 2 records are identical,red,\"Unanimous match, 2 of 2 records\"")
        );
        assert_eq!(
            lines.next(),
            Some("s2,There is only one record,blue,Only 1 transcript in 1 record")
        );
    }

    #[test]
    fn test_render_without_notes() {
        let table = labelrecon::load::table_from_csv("subject_id,color\ns1,red\n", &config()).unwrap();
        let bytes = render(&table, false).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "subject_id,color\ns1,red\n");
    }
}
