use std::fmt;
use std::io;
use std::path::PathBuf;

use pyship_core::MetadataError;
use thiserror::Error;

/// Fatal conditions. Any of these aborts the run and yields a non-zero exit.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("{message}")]
    Configuration { message: String },
    #[error("install directory is not writable: {}: {source}", .path.display())]
    Permission { path: PathBuf, source: io::Error },
    #[error("download failed: {url}: {message}")]
    Network { url: String, message: String },
    #[error("failed to extract {}: {message}", .archive.display())]
    Extraction { archive: PathBuf, message: String },
    #[error(
        "{context}: `{command_line}` exited with {status}{}{}",
        render_stream("stdout", .stdout),
        render_stream("stderr", .stderr)
    )]
    Process {
        context: String,
        command_line: String,
        status: String,
        stdout: String,
        stderr: String,
    },
    #[error("{context}: {source}")]
    Io { context: String, source: io::Error },
    #[error("failed to write installed-state record for '{registry_id}': {message}")]
    Registry {
        registry_id: String,
        message: String,
    },
}

fn render_stream(name: &str, captured: &str) -> String {
    let trimmed = captured.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("; {name}:\n{trimmed}")
    }
}

impl ProvisionError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "ConfigurationError",
            Self::Permission { .. } => "PermissionError",
            Self::Network { .. } => "NetworkError",
            Self::Extraction { .. } => "ExtractionError",
            Self::Process { .. } => "ProcessError",
            Self::Io { .. } => "IoError",
            Self::Registry { .. } => "RegistryError",
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<MetadataError> for ProvisionError {
    fn from(value: MetadataError) -> Self {
        Self::configuration(value.to_string())
    }
}

/// A non-fatal problem a step worked around. The run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered {
    pub severity: RecoveredSeverity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveredSeverity {
    Warn,
    Error,
}

impl Recovered {
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            severity: RecoveredSeverity::Warn,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: RecoveredSeverity::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Recovered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
