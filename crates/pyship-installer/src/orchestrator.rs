use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use pyship_core::{
    compare_versions, detect_runtime_pin, PackageMetadata, RuntimeVersionSource, VersionOrdering,
};
use thiserror::Error;

use crate::fs_utils::probe_writable;
use crate::registry::current_unix_timestamp;
use crate::{
    classify_installed_state, ensure_package_manager, provision_runtime, remove_scratch_dir,
    sync_dependencies, wipe_install_dir, BootstrapAction, CommandRunner, DependencyReport,
    Downloader, InstallLayout, InstalledState, InstalledStateRecord, ProvisionConfig,
    ProvisionError, RegistryStore, RunLog, RuntimeReport, WipePolicy, WipeReport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Fresh,
    Update,
    CleanReinstall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Start,
    MetadataLoaded,
    Classified(Classification),
    RuntimeReady,
    DependencyManagerReady,
    DependenciesSynced,
    RegistryUpdated,
    Done,
    Failed,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "Fresh",
            Self::Update => "Update",
            Self::CleanReinstall => "CleanReinstall",
        }
    }
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("Start"),
            Self::MetadataLoaded => f.write_str("MetadataLoaded"),
            Self::Classified(classification) => {
                write!(f, "Classified({})", classification.as_str())
            }
            Self::RuntimeReady => f.write_str("RuntimeReady"),
            Self::DependencyManagerReady => f.write_str("DependencyManagerReady"),
            Self::DependenciesSynced => f.write_str("DependenciesSynced"),
            Self::RegistryUpdated => f.write_str("RegistryUpdated"),
            Self::Done => f.write_str("Done"),
            Self::Failed => f.write_str("Failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationDecision {
    pub classification: Classification,
    pub recorded_version: Option<String>,
    pub ordering: Option<VersionOrdering>,
}

/// Decides fresh install, in-place update, or clean reinstall from the
/// recorded version alone. An incomparable pair never wipes.
pub fn classify(
    recorded_version: Option<&str>,
    new_version: &str,
    policy: WipePolicy,
) -> ClassificationDecision {
    let Some(recorded) = recorded_version else {
        return ClassificationDecision {
            classification: Classification::Fresh,
            recorded_version: None,
            ordering: None,
        };
    };

    let ordering = compare_versions(new_version, recorded);
    let classification = match (ordering, policy) {
        (VersionOrdering::Incomparable, _) => Classification::Update,
        (_, WipePolicy::Never) => Classification::Update,
        (_, WipePolicy::Always) => Classification::CleanReinstall,
        (VersionOrdering::Greater, WipePolicy::EqualOrOlder) => Classification::Update,
        (VersionOrdering::Equal | VersionOrdering::Less, WipePolicy::EqualOrOlder) => {
            Classification::CleanReinstall
        }
    };

    ClassificationDecision {
        classification,
        recorded_version: Some(recorded.to_string()),
        ordering: Some(ordering),
    }
}

/// Reads the staged package metadata, filling a missing runtime version from
/// a pin in the application's dependency descriptor before the default.
pub fn read_package_metadata(
    layout: &InstallLayout,
    config: &ProvisionConfig,
) -> Result<PackageMetadata, ProvisionError> {
    let path = layout.metadata_path();
    let raw = fs::read_to_string(&path).map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            ProvisionError::configuration(format!(
                "package metadata not found at {}",
                path.display()
            ))
        } else {
            ProvisionError::io(format!("failed to read {}", path.display()), err)
        }
    })?;
    let metadata = PackageMetadata::parse(&raw, &config.default_runtime_version)?;

    let folder = metadata.app_folder.as_str();
    if folder.starts_with('.') || folder.contains(|c: char| c == '/' || c == '\\') {
        return Err(ProvisionError::configuration(format!(
            "AppFolder must be a single directory name, got '{folder}'"
        )));
    }

    if metadata.runtime_version_source != RuntimeVersionSource::Default {
        return Ok(metadata);
    }
    let pin = fs::read_to_string(layout.requirements_path(&metadata.app_folder))
        .ok()
        .and_then(|raw| detect_runtime_pin(&raw));
    match pin {
        Some(pin) => Ok(metadata.with_runtime_version(&pin, RuntimeVersionSource::Descriptor)?),
        None => Ok(metadata),
    }
}

/// Parameters the installer shell passes for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub install_path: PathBuf,
    pub previous_version: Option<String>,
    pub new_version: Option<String>,
    pub registry_id: String,
    /// Paths the clean-reinstall wipe must leave in place, such as the
    /// directory holding the running executable.
    pub preserve: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub metadata: PackageMetadata,
    pub decision: ClassificationDecision,
    pub wipe: Option<WipeReport>,
    pub installed_state: InstalledState,
    pub runtime: RuntimeReport,
    pub package_manager: BootstrapAction,
    pub dependencies: DependencyReport,
    pub record: InstalledStateRecord,
}

#[derive(Debug, Error)]
#[error("provisioning failed in state {failed_in}: {error}")]
pub struct ProvisionFailure {
    pub failed_in: ProvisionState,
    #[source]
    pub error: ProvisionError,
}

pub struct Collaborators<'a> {
    pub runner: &'a dyn CommandRunner,
    pub downloader: &'a dyn Downloader,
    pub registry: &'a dyn RegistryStore,
}

/// Drives one provisioning run from `Start` to `Done` or `Failed`.
pub struct Provisioner<'a> {
    collaborators: Collaborators<'a>,
    log: &'a RunLog,
    state: ProvisionState,
    trail: Vec<ProvisionState>,
}

impl<'a> Provisioner<'a> {
    pub fn new(collaborators: Collaborators<'a>, log: &'a RunLog) -> Self {
        Self {
            collaborators,
            log,
            state: ProvisionState::Start,
            trail: vec![ProvisionState::Start],
        }
    }

    pub fn state(&self) -> ProvisionState {
        self.state
    }

    /// Every state entered so far, in order.
    pub fn trail(&self) -> &[ProvisionState] {
        &self.trail
    }

    pub fn run(&mut self, request: &ProvisionRequest) -> Result<ProvisionReport, ProvisionFailure> {
        let result = self.execute(request);

        if request.install_path.is_dir() {
            if let Err(err) = remove_scratch_dir(&InstallLayout::new(&request.install_path)) {
                self.log
                    .warn(&format!("failed to remove scratch directory: {err}"));
            }
        }

        match result {
            Ok(report) => {
                self.transition(ProvisionState::Done);
                self.log.info("provisioning completed successfully");
                Ok(report)
            }
            Err(error) => {
                let failed_in = self.state;
                self.log.fatal(&format!(
                    "{} in state {failed_in}: {error}",
                    error.kind()
                ));
                self.log
                    .fatal("installed-state record left unchanged; installation may be partial");
                self.transition(ProvisionState::Failed);
                Err(ProvisionFailure { failed_in, error })
            }
        }
    }

    fn transition(&mut self, next: ProvisionState) {
        self.log.info(&format!("state {} -> {}", self.state, next));
        self.state = next;
        self.trail.push(next);
    }

    fn execute(&mut self, request: &ProvisionRequest) -> Result<ProvisionReport, ProvisionError> {
        let root = request.install_path.clone();
        self.log.info(&format!(
            "provisioning run started: install_path={} registry_id={} previous_version={} new_version={}",
            root.display(),
            request.registry_id,
            request.previous_version.as_deref().unwrap_or("<none>"),
            request.new_version.as_deref().unwrap_or("<none>"),
        ));
        if request.registry_id.trim().is_empty() {
            return Err(ProvisionError::configuration("registry id must not be empty"));
        }

        probe_writable(&root).map_err(|source| ProvisionError::Permission {
            path: root.clone(),
            source,
        })?;

        let config = ProvisionConfig::load(&InstallLayout::new(&root).config_path())?;
        let layout = InstallLayout::with_config(&root, &config);
        let metadata = self.load_metadata(&layout, &config, request)?;
        self.transition(ProvisionState::MetadataLoaded);

        let record = self.load_record(&request.registry_id);
        let recorded_version = record.as_ref().map(|record| record.version.clone());
        if record.is_none() {
            if let Some(version) = request
                .previous_version
                .as_deref()
                .map(str::trim)
                .filter(|version| !version.is_empty())
            {
                self.log.warn(&format!(
                    "no installed-state record for '{}'; installer reported previous version {version}, treating run as fresh",
                    request.registry_id
                ));
            }
        }

        let decision = classify(
            recorded_version.as_deref(),
            &metadata.version,
            config.wipe_policy,
        );
        self.log_decision(&decision, &metadata, config.wipe_policy);
        self.transition(ProvisionState::Classified(decision.classification));

        let wipe = if decision.classification == Classification::CleanReinstall {
            let mut preserve = request.preserve.clone();
            preserve.push(layout.staging_dir());
            preserve.push(layout.app_dir(&metadata.app_folder));
            if let Some(dir) = self.log.dir() {
                preserve.push(dir.to_path_buf());
            }
            self.log
                .info(&format!("wiping {} for clean reinstall", root.display()));
            let report = wipe_install_dir(&root, &preserve, self.log)?;
            if !report.failures.is_empty() {
                self.log.warn(&format!(
                    "{} item(s) could not be removed; continuing",
                    report.failures.len()
                ));
            }
            Some(report)
        } else {
            None
        };
        let wiped = wipe.is_some();

        let installed_state = if wiped {
            InstalledState::NoPriorInstall
        } else {
            classify_installed_state(
                &layout,
                record.as_ref(),
                &metadata.runtime_version,
                self.collaborators.runner,
            )
        };
        match &installed_state {
            InstalledState::IncompatibleOrStale { reason, .. } => self.log.info(&format!(
                "installed state: {} ({})",
                installed_state.label(),
                reason.describe()
            )),
            other => self
                .log
                .info(&format!("installed state: {}", other.label())),
        }

        let runtime = provision_runtime(
            &layout,
            &metadata.runtime_version,
            &config.runtime_source(),
            &installed_state,
            wiped,
            self.collaborators.downloader,
            self.log,
        )?;
        self.transition(ProvisionState::RuntimeReady);

        let package_manager = ensure_package_manager(
            &layout,
            &config.bootstrap_url,
            self.collaborators.runner,
            self.collaborators.downloader,
            self.log,
        )?;
        self.transition(ProvisionState::DependencyManagerReady);

        let dependencies =
            sync_dependencies(&layout, &metadata, self.collaborators.runner, self.log)?;
        self.transition(ProvisionState::DependenciesSynced);

        let record = InstalledStateRecord {
            app_name: metadata.app_name.clone(),
            version: metadata.version.clone(),
            install_path: root.clone(),
            installed_at_unix: current_unix_timestamp(),
        };
        self.collaborators
            .registry
            .save(&request.registry_id, &record)?;
        self.log.info(&format!(
            "recorded {} {} at {} under '{}'",
            record.app_name,
            record.version,
            record.install_path.display(),
            request.registry_id
        ));
        self.transition(ProvisionState::RegistryUpdated);

        Ok(ProvisionReport {
            metadata,
            decision,
            wipe,
            installed_state,
            runtime,
            package_manager,
            dependencies,
            record,
        })
    }

    fn load_metadata(
        &self,
        layout: &InstallLayout,
        config: &ProvisionConfig,
        request: &ProvisionRequest,
    ) -> Result<PackageMetadata, ProvisionError> {
        let metadata = read_package_metadata(layout, config)?;
        self.log.info(&format!(
            "metadata: AppName={} AppFolder={} EntryFile={} Version={} runtime={} ({})",
            metadata.app_name,
            metadata.app_folder,
            metadata.entry_file,
            metadata.version,
            metadata.runtime_version,
            metadata.runtime_version_source.as_str()
        ));

        if compare_versions(
            metadata.runtime_version.as_str(),
            &config.minimum_runtime_version,
        ) == VersionOrdering::Less
        {
            self.log.warn(&format!(
                "runtime {} is below the minimum recommended {}; compatibility issues may arise",
                metadata.runtime_version, config.minimum_runtime_version
            ));
        }

        if let Some(requested) = request
            .new_version
            .as_deref()
            .map(str::trim)
            .filter(|version| !version.is_empty())
        {
            if requested != metadata.version {
                self.log.warn(&format!(
                    "installer passed version {requested} but package metadata says {}; using metadata",
                    metadata.version
                ));
            }
        }

        Ok(metadata)
    }

    fn load_record(&self, registry_id: &str) -> Option<InstalledStateRecord> {
        match self.collaborators.registry.load(registry_id) {
            Ok(Some(record)) => {
                self.log.info(&format!(
                    "installed-state record: {} {} at {}",
                    record.app_name,
                    record.version,
                    record.install_path.display()
                ));
                Some(record)
            }
            Ok(None) => {
                self.log
                    .info(&format!("no installed-state record for '{registry_id}'"));
                None
            }
            Err(err) => {
                self.log.warn(&format!(
                    "ignoring unreadable installed-state record for '{registry_id}': {err}"
                ));
                None
            }
        }
    }

    fn log_decision(
        &self,
        decision: &ClassificationDecision,
        metadata: &PackageMetadata,
        policy: WipePolicy,
    ) {
        match (&decision.recorded_version, decision.ordering) {
            (Some(recorded), Some(VersionOrdering::Incomparable)) => self.log.warn(&format!(
                "versions {} and {recorded} are incomparable; proceeding without wipe",
                metadata.version
            )),
            (Some(recorded), Some(ordering)) => self.log.info(&format!(
                "new version {} is {} recorded {recorded} (wipe policy {})",
                metadata.version,
                match ordering {
                    VersionOrdering::Greater => "newer than",
                    VersionOrdering::Equal => "equal to",
                    _ => "older than",
                },
                policy.as_str()
            )),
            _ => {}
        }
        self.log.info(&format!(
            "classification: {}",
            decision.classification.as_str()
        ));
    }
}
