// Zip archive of run outputs

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Pack `members` into `zip_path` by file name. Unless `keep_originals`, the
/// members are removed once the archive is complete.
pub fn zip_outputs(zip_path: &Path, members: &[PathBuf], keep_originals: bool) -> Result<(), String> {
    let file = File::create(zip_path).map_err(|e| format!("{}: {e}", zip_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for member in members {
        let name = member
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("{}: not a file name", member.display()))?;
        let bytes = std::fs::read(member).map_err(|e| format!("{}: {e}", member.display()))?;
        zip.start_file(name, options).map_err(|e| e.to_string())?;
        zip.write_all(&bytes).map_err(|e| e.to_string())?;
    }
    zip.finish().map_err(|e| e.to_string())?;
    log::debug!("wrote {} ({} members)", zip_path.display(), members.len());

    if !keep_originals {
        for member in members {
            if let Err(e) = std::fs::remove_file(member) {
                log::warn!("could not remove {}: {e}", member.display());
            }
        }
    }
    Ok(())
}
