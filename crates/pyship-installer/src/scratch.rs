use std::fs;
use std::io;

use tempfile::TempPath;

use crate::fs_utils::remove_path;
use crate::{InstallLayout, ProvisionError};

/// Reserves a uniquely named file in the install's scratch directory. The
/// file is deleted when the returned path is dropped, on every exit path.
pub fn scratch_temp_path(
    layout: &InstallLayout,
    prefix: &str,
    suffix: &str,
) -> Result<TempPath, ProvisionError> {
    let dir = layout.scratch_dir();
    fs::create_dir_all(&dir)
        .map_err(|err| ProvisionError::io(format!("failed to create {}", dir.display()), err))?;
    let file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile_in(&dir)
        .map_err(|err| {
            ProvisionError::io(format!("failed to create temp file in {}", dir.display()), err)
        })?;
    Ok(file.into_temp_path())
}

pub fn remove_scratch_dir(layout: &InstallLayout) -> io::Result<()> {
    match remove_path(&layout.scratch_dir()) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
