mod archive;
mod bootstrap;
mod config;
mod dependencies;
mod download;
mod error;
mod fs_utils;
mod layout;
mod log;
mod orchestrator;
mod probe;
mod process;
mod registry;
mod runtime;
mod scratch;
mod wipe;

pub use archive::extract_zip;
pub use bootstrap::{ensure_package_manager, BootstrapAction};
pub use config::{ProvisionConfig, WipePolicy, DEFAULT_RUNTIME_VERSION, MINIMUM_RUNTIME_VERSION};
pub use dependencies::{sync_dependencies, DependencyReport, DependencySync};
pub use download::{sha256_file, Downloader, HttpDownloader, ProgressFn};
pub use error::{ProvisionError, Recovered, RecoveredSeverity};
pub use fs_utils::{probe_writable, remove_path};
pub use layout::{
    InstallLayout, CONFIG_FILE_NAME, LOGS_DIR_NAME, METADATA_FILE_NAME, PTH_TEMPLATE_FILE_NAME,
    REQUIREMENTS_FILE_NAME, SCRATCH_DIR_NAME, STAGING_DIR_NAME,
};
pub use log::{LogLevel, RunLog};
pub use orchestrator::{
    classify, read_package_metadata, Classification, ClassificationDecision, Collaborators,
    ProvisionFailure, ProvisionReport, ProvisionRequest, ProvisionState, Provisioner,
};
pub use probe::{
    classify_installed_state, probe_installed_state, query_runtime_version, InstalledState,
    StaleReason,
};
pub use process::{render_command_line, run_checked, CapturedOutput, CommandRunner, SystemRunner};
pub use registry::{
    current_unix_timestamp, default_registry_root, sanitize_registry_id, FileRegistryStore,
    InstalledStateRecord, RegistryStore, REGISTRY_DIR_ENV,
};
pub use runtime::{provision_runtime, PthPatch, RuntimeAction, RuntimeReport};
pub use scratch::{remove_scratch_dir, scratch_temp_path};
pub use wipe::{wipe_install_dir, WipeReport};
