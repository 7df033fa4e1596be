use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::{InstallLayout, ProvisionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

/// Append-only log for a single provisioning run.
///
/// Constructed once per run and handed to every step. Each line is also
/// mirrored to `tracing`.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Creates a fresh log file in `primary_dir`, or in `fallback_dir` when the
    /// primary location cannot be written.
    pub fn open(primary_dir: &Path, fallback_dir: &Path) -> Result<Self, ProvisionError> {
        match Self::create_in(primary_dir) {
            Ok(log) => Ok(log),
            Err(primary_err) => {
                let log = Self::create_in(fallback_dir).map_err(|err| {
                    ProvisionError::io(
                        format!(
                            "failed to create run log in {} or {}",
                            primary_dir.display(),
                            fallback_dir.display()
                        ),
                        err,
                    )
                })?;
                log.warn(&format!(
                    "could not create log in {} ({primary_err}); using fallback location",
                    primary_dir.display()
                ));
                Ok(log)
            }
        }
    }

    /// Opens the run log for an install directory. The log goes under
    /// `<install>/logs` only when the install directory already exists, so
    /// opening it never creates a mistyped install path.
    pub fn open_for_install(
        install_path: &Path,
        fallback_dir: &Path,
    ) -> Result<Self, ProvisionError> {
        if install_path.is_dir() {
            return Self::open(&InstallLayout::new(install_path).logs_dir(), fallback_dir);
        }
        let log = Self::create_in(fallback_dir).map_err(|err| {
            ProvisionError::io(
                format!("failed to create run log in {}", fallback_dir.display()),
                err,
            )
        })?;
        log.warn(&format!(
            "install directory {} does not exist or is not a directory; using fallback location",
            install_path.display()
        ));
        Ok(log)
    }

    fn create_in(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let pid = std::process::id();
        let mut attempt = 0_u32;
        loop {
            let name = if attempt == 0 {
                format!("setup_{stamp}_{pid}.log")
            } else {
                format!("setup_{stamp}_{pid}_{attempt}.log")
            };
            let path = dir.join(name);
            match OpenOptions::new().append(true).create_new(true).open(&path) {
                Ok(file) => return Ok(Self { path, file }),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists && attempt < 16 => {
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> Option<&Path> {
        self.path.parent()
    }

    pub fn info(&self, message: &str) {
        self.write(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.write(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.write(LogLevel::Error, message);
    }

    pub fn fatal(&self, message: &str) {
        self.write(LogLevel::Fatal, message);
    }

    pub fn write(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Error | LogLevel::Fatal => tracing::error!("{message}"),
        }

        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut line = String::new();
        for (idx, text) in message.lines().enumerate() {
            if idx == 0 {
                line.push_str(&format!("[{stamp}] [{}] {text}\n", level.as_str()));
            } else {
                line.push_str(&format!("    {text}\n"));
            }
        }
        if line.is_empty() {
            line = format!("[{stamp}] [{}]\n", level.as_str());
        }

        if let Err(err) = (&self.file).write_all(line.as_bytes()) {
            tracing::error!(path = %self.path.display(), "failed to append to run log: {err}");
        }
    }
}
