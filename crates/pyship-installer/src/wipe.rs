use std::fs;
use std::path::{Path, PathBuf};

use crate::fs_utils::remove_path;
use crate::{ProvisionError, Recovered, RunLog};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WipeReport {
    pub removed: Vec<PathBuf>,
    pub preserved: Vec<PathBuf>,
    pub failures: Vec<Recovered>,
}

/// Deletes every immediate child of `root` except those that are, or
/// contain, one of `preserve`.
///
/// Per-entry failures (typically files locked by a running copy of the
/// application) are logged and collected; the wipe carries on.
pub fn wipe_install_dir(
    root: &Path,
    preserve: &[PathBuf],
    log: &RunLog,
) -> Result<WipeReport, ProvisionError> {
    let entries = fs::read_dir(root).map_err(|err| {
        ProvisionError::io(format!("failed to enumerate {}", root.display()), err)
    })?;

    let mut children = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| {
            ProvisionError::io(format!("failed to enumerate {}", root.display()), err)
        })?;
        children.push(entry.path());
    }
    children.sort();

    let mut report = WipeReport::default();
    for child in children {
        if preserve.iter().any(|keep| covers(&child, keep)) {
            log.info(&format!("preserving {}", child.display()));
            report.preserved.push(child);
            continue;
        }

        match remove_path(&child) {
            Ok(()) => {
                log.info(&format!("removed {}", child.display()));
                report.removed.push(child);
            }
            Err(err) => {
                let failure =
                    Recovered::error(format!("failed to remove {}: {err}", child.display()));
                log.error(&failure.message);
                report.failures.push(failure);
            }
        }
    }

    Ok(report)
}

fn covers(child: &Path, keep: &Path) -> bool {
    if keep.starts_with(child) {
        return true;
    }
    match (fs::canonicalize(child), fs::canonicalize(keep)) {
        (Ok(child), Ok(keep)) => keep.starts_with(child),
        _ => false,
    }
}
