use std::path::{Path, PathBuf};

use pyship_core::{pth_file_name, DottedVersion, INTERPRETER_EXE};

use crate::ProvisionConfig;

pub const STAGING_DIR_NAME: &str = "_internal";
pub const LOGS_DIR_NAME: &str = "logs";
pub const SCRATCH_DIR_NAME: &str = ".pyship-tmp";
pub const CONFIG_FILE_NAME: &str = "provision.toml";
pub const METADATA_FILE_NAME: &str = "metadata.txt";
pub const PTH_TEMPLATE_FILE_NAME: &str = "custom_pth.txt";
pub const REQUIREMENTS_FILE_NAME: &str = "requirements.txt";

/// Paths inside an application's install directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
    env_dir_name: String,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, &ProvisionConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, config: &ProvisionConfig) -> Self {
        Self {
            root: root.into(),
            env_dir_name: config.env_dir.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn env_dir(&self) -> PathBuf {
        self.root.join(&self.env_dir_name)
    }

    pub fn interpreter_path(&self) -> PathBuf {
        self.env_dir().join(INTERPRETER_EXE)
    }

    pub fn site_packages_dir(&self) -> PathBuf {
        self.env_dir().join("Lib").join("site-packages")
    }

    pub fn pth_path(&self, version: &DottedVersion) -> PathBuf {
        self.env_dir().join(pth_file_name(version))
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR_NAME)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.staging_dir().join(METADATA_FILE_NAME)
    }

    pub fn pth_template_path(&self) -> PathBuf {
        self.staging_dir().join(PTH_TEMPLATE_FILE_NAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.staging_dir().join(CONFIG_FILE_NAME)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR_NAME)
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.root.join(SCRATCH_DIR_NAME)
    }

    pub fn app_dir(&self, app_folder: &str) -> PathBuf {
        self.root.join(app_folder)
    }

    pub fn requirements_path(&self, app_folder: &str) -> PathBuf {
        self.app_dir(app_folder).join(REQUIREMENTS_FILE_NAME)
    }
}
