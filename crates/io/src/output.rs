// Output files

use std::path::PathBuf;

/// A fully rendered output waiting to be written.
#[derive(Debug, Clone)]
pub struct PendingOutput {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl PendingOutput {
    pub fn new(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { path: path.into(), bytes: bytes.into() }
    }
}

/// Write every output, or none: on the first failure the files already
/// written by this call are removed again.
pub fn write_all(outputs: Vec<PendingOutput>) -> Result<Vec<PathBuf>, String> {
    let mut written: Vec<PathBuf> = Vec::with_capacity(outputs.len());
    for output in outputs {
        if let Err(e) = std::fs::write(&output.path, &output.bytes) {
            for path in &written {
                let _ = std::fs::remove_file(path);
            }
            return Err(format!("{}: {e}", output.path.display()));
        }
        log::debug!("wrote {} ({} bytes)", output.path.display(), output.bytes.len());
        written.push(output.path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_write_all() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.html");

        let written = write_all(vec![
            PendingOutput::new(&a, "x\n"),
            PendingOutput::new(&b, "<p></p>"),
        ])
        .unwrap();

        assert_eq!(written, vec![a.clone(), b.clone()]);
        assert_eq!(fs::read_to_string(a).unwrap(), "x\n");
        assert_eq!(fs::read_to_string(b).unwrap(), "<p></p>");
    }

    #[test]
    fn test_failure_removes_earlier_outputs() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let bad = dir.path().join("missing-dir").join("b.csv");

        let err = write_all(vec![PendingOutput::new(&a, "x\n"), PendingOutput::new(&bad, "y\n")])
            .unwrap_err();

        assert!(err.contains("b.csv"));
        assert!(!a.exists());
    }
}
