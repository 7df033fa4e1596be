use std::fs;
use std::io;
use std::path::Path;

use pyship_core::{
    RuntimeSource, DEFAULT_BOOTSTRAP_URL, DEFAULT_RUNTIME_BASE_URL, DEFAULT_RUNTIME_PLATFORM,
};
use serde::{Deserialize, Serialize};

use crate::ProvisionError;

pub const DEFAULT_RUNTIME_VERSION: &str = "3.10.0";
pub const MINIMUM_RUNTIME_VERSION: &str = "3.9";

/// Optional `provision.toml` shipped in the staging directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ProvisionConfig {
    pub runtime_base_url: String,
    pub runtime_platform: String,
    pub bootstrap_url: String,
    pub default_runtime_version: String,
    pub minimum_runtime_version: String,
    pub env_dir: String,
    pub wipe_policy: WipePolicy,
}

/// What a re-run against a recorded installation wipes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WipePolicy {
    /// Wipe when the new version is equal to or older than the recorded one.
    #[default]
    EqualOrOlder,
    Never,
    Always,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            runtime_base_url: DEFAULT_RUNTIME_BASE_URL.to_string(),
            runtime_platform: DEFAULT_RUNTIME_PLATFORM.to_string(),
            bootstrap_url: DEFAULT_BOOTSTRAP_URL.to_string(),
            default_runtime_version: DEFAULT_RUNTIME_VERSION.to_string(),
            minimum_runtime_version: MINIMUM_RUNTIME_VERSION.to_string(),
            env_dir: "Env".to_string(),
            wipe_policy: WipePolicy::default(),
        }
    }
}

impl ProvisionConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ProvisionError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(ProvisionError::io(
                    format!("failed to read provisioning config {}", path.display()),
                    err,
                ))
            }
        };
        Self::from_toml_str(&raw).map_err(|err| {
            ProvisionError::configuration(format!(
                "invalid provisioning config {}: {err}",
                path.display()
            ))
        })
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ProvisionError> {
        let config: Self = toml::from_str(input).map_err(|err| {
            ProvisionError::configuration(format!("failed to parse provisioning config: {err}"))
        })?;
        let env_dir = config.env_dir.trim();
        if env_dir.is_empty()
            || env_dir.starts_with('.')
            || env_dir.contains(|c: char| c == '/' || c == '\\')
        {
            return Err(ProvisionError::configuration(format!(
                "env-dir must be a single directory name, got '{}'",
                config.env_dir
            )));
        }
        Ok(config)
    }

    pub fn runtime_source(&self) -> RuntimeSource {
        RuntimeSource {
            base_url: self.runtime_base_url.clone(),
            platform: self.runtime_platform.clone(),
        }
    }
}

impl WipePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EqualOrOlder => "equal-or-older",
            Self::Never => "never",
            Self::Always => "always",
        }
    }
}
