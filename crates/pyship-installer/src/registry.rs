use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::ProvisionError;

pub const REGISTRY_DIR_ENV: &str = "PYSHIP_REGISTRY_DIR";

/// What the most recent successful run installed, kept outside the install
/// directory so it survives a wipe of that directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstalledStateRecord {
    pub app_name: String,
    pub version: String,
    pub install_path: PathBuf,
    #[serde(default)]
    pub installed_at_unix: u64,
}

pub trait RegistryStore {
    fn load(&self, registry_id: &str) -> Result<Option<InstalledStateRecord>, ProvisionError>;
    fn save(&self, registry_id: &str, record: &InstalledStateRecord) -> Result<(), ProvisionError>;
}

/// One JSON document per registry id under a per-user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRegistryStore {
    root: PathBuf,
}

impl FileRegistryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, registry_id: &str) -> PathBuf {
        self.root
            .join(format!("{}.json", sanitize_registry_id(registry_id)))
    }
}

impl RegistryStore for FileRegistryStore {
    fn load(&self, registry_id: &str) -> Result<Option<InstalledStateRecord>, ProvisionError> {
        let path = self.record_path(registry_id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(ProvisionError::io(
                    format!("failed to read installed-state record {}", path.display()),
                    err,
                ))
            }
        };
        let record = serde_json::from_str(&raw).map_err(|err| {
            ProvisionError::configuration(format!(
                "failed to parse installed-state record {}: {err}",
                path.display()
            ))
        })?;
        Ok(Some(record))
    }

    fn save(&self, registry_id: &str, record: &InstalledStateRecord) -> Result<(), ProvisionError> {
        let registry_err = |message: String| ProvisionError::Registry {
            registry_id: registry_id.to_string(),
            message,
        };

        fs::create_dir_all(&self.root)
            .map_err(|err| registry_err(format!("failed to create {}: {err}", self.root.display())))?;

        let path = self.record_path(registry_id);
        let tmp_path = path.with_extension("json.tmp");
        let payload = serde_json::to_string_pretty(record)
            .map_err(|err| registry_err(format!("failed to encode record: {err}")))?;
        fs::write(&tmp_path, payload.as_bytes())
            .map_err(|err| registry_err(format!("failed to write {}: {err}", tmp_path.display())))?;
        fs::rename(&tmp_path, &path).map_err(|err| {
            let _ = fs::remove_file(&tmp_path);
            registry_err(format!("failed to move record into {}: {err}", path.display()))
        })?;
        Ok(())
    }
}

/// Registry ids often come from installer GUIDs such as `{1F2E...}_is1`.
pub fn sanitize_registry_id(registry_id: &str) -> String {
    let sanitized: String = registry_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_matches('.').to_string();
    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}

pub fn default_registry_root() -> Result<PathBuf, ProvisionError> {
    if let Some(dir) = std::env::var_os(REGISTRY_DIR_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    if cfg!(windows) {
        let app_data = std::env::var("LOCALAPPDATA").map_err(|_| {
            ProvisionError::configuration(
                "LOCALAPPDATA is not set; cannot resolve installed-state registry location",
            )
        })?;
        return Ok(PathBuf::from(app_data).join("PyShip").join("registry"));
    }

    let home = std::env::var("HOME").map_err(|_| {
        ProvisionError::configuration("HOME is not set; cannot resolve installed-state registry")
    })?;
    Ok(PathBuf::from(home).join(".pyship").join("registry"))
}

pub fn current_unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
