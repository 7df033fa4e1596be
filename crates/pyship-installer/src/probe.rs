use std::path::Path;
use std::process::Command;

use pyship_core::{parse_interpreter_version, DottedVersion};

use crate::{CommandRunner, InstallLayout, InstalledStateRecord, ProvisionError, RegistryStore};

/// What the install directory and registry say about a prior installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstalledState {
    NoPriorInstall,
    CompatibleInstall {
        record: InstalledStateRecord,
        runtime_version: DottedVersion,
    },
    IncompatibleOrStale {
        record: InstalledStateRecord,
        reason: StaleReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    RuntimeMissing,
    InterpreterMissing,
    InstallPathMismatch { recorded: String },
    VersionQueryFailed { detail: String },
    VersionMismatch { found: String, required: String },
}

impl InstalledState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoPriorInstall => "NoPriorInstall",
            Self::CompatibleInstall { .. } => "CompatibleInstall",
            Self::IncompatibleOrStale { .. } => "IncompatibleOrStale",
        }
    }

    pub fn is_compatible(&self) -> bool {
        matches!(self, Self::CompatibleInstall { .. })
    }
}

impl StaleReason {
    pub fn describe(&self) -> String {
        match self {
            Self::RuntimeMissing => "runtime directory is missing".to_string(),
            Self::InterpreterMissing => {
                "runtime directory exists but the interpreter executable is missing".to_string()
            }
            Self::InstallPathMismatch { recorded } => {
                format!("record points at a different install path ({recorded})")
            }
            Self::VersionQueryFailed { detail } => {
                format!("interpreter did not report its version: {detail}")
            }
            Self::VersionMismatch { found, required } => {
                format!("runtime version {found} does not match required {required}")
            }
        }
    }
}

/// Loads the registry record for `registry_id` and classifies the install.
pub fn probe_installed_state(
    layout: &InstallLayout,
    store: &dyn RegistryStore,
    registry_id: &str,
    required: &DottedVersion,
    runner: &dyn CommandRunner,
) -> Result<InstalledState, ProvisionError> {
    let record = store.load(registry_id)?;
    Ok(classify_installed_state(
        layout,
        record.as_ref(),
        required,
        runner,
    ))
}

/// A runtime directory without its interpreter counts as stale, which is
/// what a crashed extraction leaves behind.
pub fn classify_installed_state(
    layout: &InstallLayout,
    record: Option<&InstalledStateRecord>,
    required: &DottedVersion,
    runner: &dyn CommandRunner,
) -> InstalledState {
    let Some(record) = record else {
        return InstalledState::NoPriorInstall;
    };
    let stale = |reason| InstalledState::IncompatibleOrStale {
        record: record.clone(),
        reason,
    };

    if !same_install_path(&record.install_path, layout.root()) {
        return stale(StaleReason::InstallPathMismatch {
            recorded: record.install_path.display().to_string(),
        });
    }
    if !layout.env_dir().is_dir() {
        return stale(StaleReason::RuntimeMissing);
    }
    if !layout.interpreter_path().is_file() {
        return stale(StaleReason::InterpreterMissing);
    }

    match query_runtime_version(layout, runner) {
        Ok(found) if found.numeric_cmp(required).is_eq() => InstalledState::CompatibleInstall {
            record: record.clone(),
            runtime_version: found,
        },
        Ok(found) => stale(StaleReason::VersionMismatch {
            found: found.to_string(),
            required: required.to_string(),
        }),
        Err(detail) => stale(StaleReason::VersionQueryFailed { detail }),
    }
}

/// Asks the provisioned interpreter for its version (`python --version`).
pub fn query_runtime_version(
    layout: &InstallLayout,
    runner: &dyn CommandRunner,
) -> Result<DottedVersion, String> {
    let mut command = Command::new(layout.interpreter_path());
    command.arg("--version");
    let output = runner.run(&mut command).map_err(|err| err.to_string())?;
    if !output.success() {
        return Err(format!("{}: {}", output.status_label(), output.stderr.trim()));
    }
    // Interpreters before 3.4 print the banner on stderr.
    parse_interpreter_version(&output.stdout)
        .or_else(|| parse_interpreter_version(&output.stderr))
        .ok_or_else(|| format!("unrecognized version output '{}'", output.stdout.trim()))
}

fn same_install_path(recorded: &Path, current: &Path) -> bool {
    if recorded == current {
        return true;
    }
    let normalize = |path: &Path| {
        let text = path.to_string_lossy();
        let trimmed = text.trim_end_matches(|c: char| c == '/' || c == '\\').to_string();
        if cfg!(windows) {
            trimmed.replace('/', "\\").to_ascii_lowercase()
        } else {
            trimmed
        }
    };
    normalize(recorded) == normalize(current)
}
