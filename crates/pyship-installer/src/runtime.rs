use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pyship_core::{DottedVersion, RuntimeSource};

use crate::archive::extract_zip;
use crate::download::sha256_file;
use crate::{
    scratch_temp_path, Downloader, InstallLayout, InstalledState, ProvisionError, Recovered,
    RunLog,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeAction {
    Reused,
    Provisioned {
        archive_url: String,
        archive_sha256: String,
        files: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PthPatch {
    NotNeeded,
    Applied { path: PathBuf },
    SkippedNoTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeReport {
    pub action: RuntimeAction,
    pub pth: PthPatch,
    pub recovered: Vec<Recovered>,
}

/// Ensures `layout.env_dir()` holds an interpreter of `version`.
///
/// A compatible runtime is left alone unless `force` is set. Anything else
/// is deleted and replaced wholesale from the vendor archive.
pub fn provision_runtime(
    layout: &InstallLayout,
    version: &DottedVersion,
    source: &RuntimeSource,
    state: &InstalledState,
    force: bool,
    downloader: &dyn Downloader,
    log: &RunLog,
) -> Result<RuntimeReport, ProvisionError> {
    if state.is_compatible() && !force {
        log.info(&format!(
            "runtime {} already present at {}; no action",
            version,
            layout.env_dir().display()
        ));
        return Ok(RuntimeReport {
            action: RuntimeAction::Reused,
            pth: PthPatch::NotNeeded,
            recovered: Vec::new(),
        });
    }

    let env_dir = layout.env_dir();
    if fs::symlink_metadata(&env_dir).is_ok() {
        log.info(&format!("removing existing runtime at {}", env_dir.display()));
        crate::fs_utils::remove_path(&env_dir).map_err(|err| {
            ProvisionError::io(
                format!("failed to remove stale runtime {}", env_dir.display()),
                err,
            )
        })?;
    }
    fs::create_dir_all(&env_dir).map_err(|err| {
        ProvisionError::io(format!("failed to create {}", env_dir.display()), err)
    })?;

    let url = source.archive_url(version);
    let archive = scratch_temp_path(layout, "runtime-", ".zip")?;
    log.info(&format!("downloading runtime {version} from {url}"));
    let bytes = downloader.fetch(&url, &archive)?;
    let archive_sha256 = sha256_file(&archive).map_err(|err| {
        ProvisionError::io(format!("failed to hash {}", archive.display()), err)
    })?;
    log.info(&format!(
        "downloaded {bytes} bytes (sha256 {archive_sha256})"
    ));

    let files = extract_zip(&archive, &env_dir)?;
    drop(archive);
    if !layout.interpreter_path().is_file() {
        return Err(ProvisionError::Extraction {
            archive: PathBuf::from(source.archive_name(version)),
            message: format!(
                "archive did not contain {}",
                layout.interpreter_path().display()
            ),
        });
    }
    log.info(&format!(
        "extracted {files} files into {}",
        env_dir.display()
    ));

    let mut recovered = Vec::new();
    let pth = patch_pth(layout, version, log, &mut recovered)?;

    Ok(RuntimeReport {
        action: RuntimeAction::Provisioned {
            archive_url: url,
            archive_sha256,
            files,
        },
        pth,
        recovered,
    })
}

/// Overwrites the runtime's `._pth` with the bundled template so the
/// embedded interpreter can import installed packages.
fn patch_pth(
    layout: &InstallLayout,
    version: &DottedVersion,
    log: &RunLog,
    recovered: &mut Vec<Recovered>,
) -> Result<PthPatch, ProvisionError> {
    let template_path = layout.pth_template_path();
    let template = match fs::read_to_string(&template_path) {
        Ok(template) => template,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let warning = Recovered::warn(format!(
                "path template {} not found; keeping default isolation, installed packages may not be importable",
                template_path.display()
            ));
            log.warn(&warning.message);
            recovered.push(warning);
            return Ok(PthPatch::SkippedNoTemplate);
        }
        Err(err) => {
            return Err(ProvisionError::io(
                format!("failed to read {}", template_path.display()),
                err,
            ))
        }
    };

    let target = find_pth_file(&layout.env_dir())?.unwrap_or_else(|| layout.pth_path(version));
    fs::write(&target, template.as_bytes()).map_err(|err| {
        ProvisionError::io(format!("failed to write {}", target.display()), err)
    })?;
    log.info(&format!("patched {} from {}", target.display(), template_path.display()));
    Ok(PthPatch::Applied { path: target })
}

fn find_pth_file(env_dir: &Path) -> Result<Option<PathBuf>, ProvisionError> {
    let entries = fs::read_dir(env_dir).map_err(|err| {
        ProvisionError::io(format!("failed to read {}", env_dir.display()), err)
    })?;
    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| {
            ProvisionError::io(format!("failed to read {}", env_dir.display()), err)
        })?;
        let path = entry.path();
        let is_pth = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with("._pth"));
        if is_pth && path.is_file() {
            candidates.push(path);
        }
    }
    candidates.sort();
    Ok(candidates.into_iter().next())
}
