use std::fs::{self, File};
use std::io;
use std::path::Path;

use crate::ProvisionError;

/// Unpacks a zip archive into `dest`, returning the number of files written.
///
/// Entries whose names would land outside `dest` fail the extraction.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<usize, ProvisionError> {
    let extraction = |message: String| ProvisionError::Extraction {
        archive: archive_path.to_path_buf(),
        message,
    };

    fs::create_dir_all(dest)
        .map_err(|err| extraction(format!("failed to create {}: {err}", dest.display())))?;
    let file = File::open(archive_path).map_err(|err| extraction(err.to_string()))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|err| extraction(format!("not a zip archive: {err}")))?;

    let mut written = 0_usize;
    for idx in 0..archive.len() {
        let mut entry = archive
            .by_index(idx)
            .map_err(|err| extraction(format!("failed to read entry #{idx}: {err}")))?;
        let Some(rel) = entry.enclosed_name() else {
            return Err(extraction(format!(
                "entry '{}' escapes the target directory",
                entry.name()
            )));
        };
        let out_path = dest.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|err| {
                extraction(format!("failed to create {}: {err}", out_path.display()))
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                extraction(format!("failed to create {}: {err}", parent.display()))
            })?;
        }
        let mut out = File::create(&out_path)
            .map_err(|err| extraction(format!("failed to create {}: {err}", out_path.display())))?;
        io::copy(&mut entry, &mut out).map_err(|err| {
            extraction(format!("failed to unpack {}: {err}", out_path.display()))
        })?;
        written += 1;
    }

    if written == 0 {
        return Err(extraction("archive contained no files".to_string()));
    }
    Ok(written)
}
