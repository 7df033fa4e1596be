use std::process::Command;

use crate::process::{render_command_line, run_checked};
use crate::{
    scratch_temp_path, CapturedOutput, CommandRunner, Downloader, InstallLayout, ProvisionError,
    RunLog,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapAction {
    AlreadyPresent { version_line: String },
    Installed { version_line: String },
}

impl BootstrapAction {
    pub fn version_line(&self) -> &str {
        match self {
            Self::AlreadyPresent { version_line } | Self::Installed { version_line } => {
                version_line
            }
        }
    }
}

pub(crate) fn pip_command(layout: &InstallLayout) -> Command {
    let mut command = Command::new(layout.interpreter_path());
    command.arg("-m").arg("pip");
    command
}

fn probe_pip(layout: &InstallLayout, runner: &dyn CommandRunner) -> Result<String, String> {
    let mut command = pip_command(layout);
    command.arg("--version");
    match runner.run(&mut command) {
        Ok(output) if output.success() => Ok(output.stdout.trim().to_string()),
        Ok(output) => Err(describe_failure(&output)),
        Err(err) => Err(err.to_string()),
    }
}

fn describe_failure(output: &CapturedOutput) -> String {
    let stderr = output.stderr.trim();
    if stderr.is_empty() {
        output.status_label()
    } else {
        format!("{}: {stderr}", output.status_label())
    }
}

/// Makes sure `python -m pip` works inside the provisioned runtime, running
/// the vendor bootstrap script once when it does not.
pub fn ensure_package_manager(
    layout: &InstallLayout,
    bootstrap_url: &str,
    runner: &dyn CommandRunner,
    downloader: &dyn Downloader,
    log: &RunLog,
) -> Result<BootstrapAction, ProvisionError> {
    match probe_pip(layout, runner) {
        Ok(version_line) => {
            log.info(&format!("package manager present: {version_line}"));
            return Ok(BootstrapAction::AlreadyPresent { version_line });
        }
        Err(detail) => log.info(&format!(
            "package manager not available ({detail}); bootstrapping from {bootstrap_url}"
        )),
    }

    let script = scratch_temp_path(layout, "get-pip-", ".py")?;
    downloader.fetch(bootstrap_url, &script)?;

    let mut command = Command::new(layout.interpreter_path());
    command
        .arg(&*script)
        .arg("--no-warn-script-location")
        .current_dir(layout.env_dir());
    log.info(&format!("running {}", render_command_line(&command)));
    let output = run_checked(runner, &mut command, "package manager bootstrap failed")?;
    if !output.stdout.trim().is_empty() {
        log.info(&format!("bootstrap output:\n{}", output.stdout.trim()));
    }
    drop(script);

    match probe_pip(layout, runner) {
        Ok(version_line) => {
            log.info(&format!("package manager installed: {version_line}"));
            Ok(BootstrapAction::Installed { version_line })
        }
        Err(detail) => {
            let mut probe = pip_command(layout);
            probe.arg("--version");
            Err(ProvisionError::Process {
                context: "package manager still unavailable after bootstrap".to_string(),
                command_line: render_command_line(&probe),
                status: "failure".to_string(),
                stdout: String::new(),
                stderr: detail,
            })
        }
    }
}
