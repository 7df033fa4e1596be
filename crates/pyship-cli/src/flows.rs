use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use pyship_core::{compare_versions, pth_file_name, render_pth_template, DottedVersion};
use pyship_installer::{
    default_registry_root, probe_installed_state, read_package_metadata, Collaborators,
    FileRegistryStore, HttpDownloader, InstallLayout, ProvisionConfig, ProvisionRequest,
    Provisioner, RunLog, SystemRunner,
};

use crate::render::{format_probe_lines, format_report_lines, TerminalRenderer};

pub(crate) fn resolve_registry_root(registry_root: Option<PathBuf>) -> Result<PathBuf> {
    match registry_root {
        Some(root) => Ok(root),
        None => Ok(default_registry_root()?),
    }
}

/// Directory holding the running executable. A clean reinstall never removes it.
fn current_exe_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

pub(crate) fn build_request(
    install_path: PathBuf,
    previous_version: Option<String>,
    new_version: String,
    registry_id: String,
) -> ProvisionRequest {
    ProvisionRequest {
        install_path,
        previous_version: previous_version.filter(|version| !version.trim().is_empty()),
        new_version: Some(new_version),
        registry_id,
        preserve: current_exe_dir().into_iter().collect(),
    }
}

pub(crate) fn run_provision(
    renderer: TerminalRenderer,
    registry_root: Option<PathBuf>,
    request: ProvisionRequest,
) -> Result<()> {
    let log = RunLog::open_for_install(
        &request.install_path,
        &std::env::temp_dir().join("pyship-logs"),
    )?;
    renderer.print_status("info", &format!("logging to {}", log.path().display()));

    let registry_root = match resolve_registry_root(registry_root) {
        Ok(root) => root,
        Err(err) => {
            log.fatal(&format!("{err:#}"));
            return Err(err);
        }
    };
    tracing::debug!(registry_root = %registry_root.display(), "resolved installed-state registry");
    let registry = FileRegistryStore::new(registry_root);

    let progress = renderer.download_progress();
    let mut downloader = HttpDownloader::new()?;
    if let Some(progress_bar) = progress.clone() {
        downloader = downloader.with_progress(Box::new(move |downloaded: u64, total: Option<u64>| {
            if let Some(total) = total {
                progress_bar.set_length(total);
            }
            progress_bar.set_position(downloaded);
        }));
    }
    let runner = SystemRunner;

    let mut provisioner = Provisioner::new(
        Collaborators {
            runner: &runner,
            downloader: &downloader,
            registry: &registry,
        },
        &log,
    );
    let result = provisioner.run(&request);
    if let Some(progress_bar) = progress {
        progress_bar.finish_and_clear();
    }

    match result {
        Ok(report) => {
            renderer.print_section("provisioned");
            renderer.print_lines(&format_report_lines(&report, renderer.style()));
            renderer.print_status("ok", "provisioning complete");
            Ok(())
        }
        Err(failure) => {
            renderer.print_status(
                "fail",
                &format!("installation may be partial; see {}", log.path().display()),
            );
            Err(failure.into())
        }
    }
}

pub(crate) fn run_probe(
    renderer: TerminalRenderer,
    registry_root: Option<PathBuf>,
    install_path: PathBuf,
    registry_id: &str,
) -> Result<()> {
    let config = ProvisionConfig::load(&InstallLayout::new(&install_path).config_path())?;
    let layout = InstallLayout::with_config(&install_path, &config);
    let metadata = read_package_metadata(&layout, &config)?;

    let registry = FileRegistryStore::new(resolve_registry_root(registry_root)?);
    let state = probe_installed_state(
        &layout,
        &registry,
        registry_id,
        &metadata.runtime_version,
        &SystemRunner,
    )?;
    renderer.print_lines(&format_probe_lines(&state));
    Ok(())
}

pub(crate) fn compare_line(a: &str, b: &str) -> String {
    compare_versions(a, b).as_str().to_string()
}

pub(crate) fn pth_output(version: &str) -> Result<(String, String)> {
    let version = DottedVersion::parse(version)
        .ok_or_else(|| anyhow!("invalid runtime version '{version}'"))?;
    Ok((pth_file_name(&version), render_pth_template(&version)))
}
