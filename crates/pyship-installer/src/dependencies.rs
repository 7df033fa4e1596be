use std::fs;
use std::io;

use pyship_core::{DependencySpecList, PackageMetadata};

use crate::bootstrap::pip_command;
use crate::process::{render_command_line, run_checked};
use crate::{scratch_temp_path, CommandRunner, InstallLayout, ProvisionError, Recovered, RunLog};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySync {
    NoDescriptor,
    NothingToInstall,
    Installed { specs: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyReport {
    pub sync: DependencySync,
    pub recovered: Vec<Recovered>,
}

/// Brings the runtime's packages in line with the application's descriptor.
pub fn sync_dependencies(
    layout: &InstallLayout,
    metadata: &PackageMetadata,
    runner: &dyn CommandRunner,
    log: &RunLog,
) -> Result<DependencyReport, ProvisionError> {
    let descriptor = layout.requirements_path(&metadata.app_folder);
    let raw = match fs::read_to_string(&descriptor) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let warning = Recovered::warn(format!(
                "dependency descriptor {} not found; skipping dependency installation",
                descriptor.display()
            ));
            log.warn(&warning.message);
            return Ok(DependencyReport {
                sync: DependencySync::NoDescriptor,
                recovered: vec![warning],
            });
        }
        Err(err) => {
            return Err(ProvisionError::io(
                format!("failed to read {}", descriptor.display()),
                err,
            ))
        }
    };

    let specs = DependencySpecList::from_descriptor(&raw);
    if specs.is_empty() {
        log.info("no third-party dependencies to install");
        return Ok(DependencyReport {
            sync: DependencySync::NothingToInstall,
            recovered: Vec::new(),
        });
    }
    log.info(&format!(
        "installing {} requirement(s) into {}: {}",
        specs.len(),
        layout.site_packages_dir().display(),
        specs.specs().join(", ")
    ));

    let filtered = scratch_temp_path(layout, "requirements-", ".txt")?;
    fs::write(&filtered, specs.to_descriptor()).map_err(|err| {
        ProvisionError::io(format!("failed to write {}", filtered.display()), err)
    })?;

    let mut command = pip_command(layout);
    command
        .arg("install")
        .arg("--upgrade")
        .arg("--no-cache-dir")
        .arg("--no-warn-script-location")
        .arg("--disable-pip-version-check")
        .arg("-r")
        .arg(&*filtered);
    log.info(&format!("running {}", render_command_line(&command)));
    let output = run_checked(runner, &mut command, "dependency installation failed");
    drop(filtered);
    let output = output?;

    if !output.stdout.trim().is_empty() {
        log.info(&format!("dependency installer output:\n{}", output.stdout.trim()));
    }
    if !output.stderr.trim().is_empty() {
        log.warn(&format!(
            "dependency installer diagnostics:\n{}",
            output.stderr.trim()
        ));
    }

    Ok(DependencyReport {
        sync: DependencySync::Installed {
            specs: specs.specs().to_vec(),
        },
        recovered: Vec::new(),
    })
}
