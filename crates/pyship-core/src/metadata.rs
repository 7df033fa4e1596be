use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::version::DottedVersion;

pub const DEFAULT_ENTRY_FILE: &str = "core.py";

/// Descriptor written next to the staged application by the packager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub app_name: String,
    pub app_folder: String,
    pub entry_file: String,
    pub version: String,
    pub runtime_version: DottedVersion,
    pub runtime_version_source: RuntimeVersionSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeVersionSource {
    Metadata,
    Descriptor,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MetadataField {
    AppName,
    AppFolder,
    Version,
    RuntimeVersion,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("metadata is missing required fields: {}", join_fields(.0))]
    MissingFields(Vec<MetadataField>),
    #[error("invalid runtime version '{value}' (expected dotted numeric, e.g. 3.11.4)")]
    InvalidRuntimeVersion { value: String },
}

impl MetadataField {
    pub fn key(self) -> &'static str {
        match self {
            Self::AppName => "AppName",
            Self::AppFolder => "AppFolder",
            Self::Version => "Version",
            Self::RuntimeVersion => "PythonVersion",
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl RuntimeVersionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::Descriptor => "dependency descriptor",
            Self::Default => "default",
        }
    }
}

fn join_fields(fields: &[MetadataField]) -> String {
    fields
        .iter()
        .map(|field| field.key())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Splits `Key = Value` lines, skipping blanks, `#` comments and lines
/// without a separator. Later keys win.
pub fn parse_key_values(raw: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    for line in raw.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        entries.insert(key.trim().to_string(), value.trim().to_string());
    }
    entries
}

impl PackageMetadata {
    /// Validates a descriptor in one pass, reporting every missing field.
    ///
    /// An absent or empty `PythonVersion` falls back to `default_runtime_version`.
    pub fn parse(raw: &str, default_runtime_version: &str) -> Result<Self, MetadataError> {
        let entries = parse_key_values(raw);
        let field = |key: &str| {
            entries
                .get(key)
                .map(String::as_str)
                .filter(|value| !value.is_empty())
        };

        let mut missing = Vec::new();
        let app_name = field(MetadataField::AppName.key());
        let app_folder = field(MetadataField::AppFolder.key());
        let version = field(MetadataField::Version.key());
        for (value, name) in [
            (app_name, MetadataField::AppName),
            (app_folder, MetadataField::AppFolder),
            (version, MetadataField::Version),
        ] {
            if value.is_none() {
                missing.push(name);
            }
        }

        let (runtime_raw, runtime_version_source) =
            match field(MetadataField::RuntimeVersion.key()) {
                Some(value) => (value, RuntimeVersionSource::Metadata),
                None => (default_runtime_version, RuntimeVersionSource::Default),
            };
        if runtime_raw.trim().is_empty() {
            missing.push(MetadataField::RuntimeVersion);
        }

        let (Some(app_name), Some(app_folder), Some(version)) = (app_name, app_folder, version)
        else {
            return Err(MetadataError::MissingFields(missing));
        };
        if !missing.is_empty() {
            return Err(MetadataError::MissingFields(missing));
        }

        let runtime_version = parse_runtime_version(runtime_raw)?;

        Ok(Self {
            app_name: app_name.to_string(),
            app_folder: app_folder.to_string(),
            entry_file: field("EntryFile").unwrap_or(DEFAULT_ENTRY_FILE).to_string(),
            version: version.to_string(),
            runtime_version,
            runtime_version_source,
        })
    }

    /// Replaces a defaulted runtime version with one pinned elsewhere.
    pub fn with_runtime_version(
        mut self,
        value: &str,
        source: RuntimeVersionSource,
    ) -> Result<Self, MetadataError> {
        self.runtime_version = parse_runtime_version(value)?;
        self.runtime_version_source = source;
        Ok(self)
    }
}

fn parse_runtime_version(value: &str) -> Result<DottedVersion, MetadataError> {
    DottedVersion::parse(value).ok_or_else(|| MetadataError::InvalidRuntimeVersion {
        value: value.to_string(),
    })
}
