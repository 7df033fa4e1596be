use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::ProvisionError;

pub type ProgressFn = Box<dyn Fn(u64, Option<u64>)>;

/// Fetches a URL into a local file, returning the number of bytes written.
pub trait Downloader {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, ProvisionError>;
}

pub struct HttpDownloader {
    client: reqwest::blocking::Client,
    progress: Option<ProgressFn>,
}

impl HttpDownloader {
    pub fn new() -> Result<Self, ProvisionError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("pyship/", env!("CARGO_PKG_VERSION")))
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| ProvisionError::Network {
                url: String::new(),
                message: format!("failed to build HTTP client: {err}"),
            })?;
        Ok(Self {
            client,
            progress: None,
        })
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl Downloader for HttpDownloader {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, ProvisionError> {
        let network = |message: String| ProvisionError::Network {
            url: url.to_string(),
            message,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| network(err.to_string()))?;
        if !response.status().is_success() {
            return Err(network(format!("server responded {}", response.status())));
        }
        let total = response.content_length();

        let mut file = File::create(dest).map_err(|err| {
            ProvisionError::io(format!("failed to create {}", dest.display()), err)
        })?;
        let mut buf = vec![0_u8; 64 * 1024];
        let mut downloaded = 0_u64;
        loop {
            let read = match response.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(network(format!("transfer interrupted: {err}"))),
            };
            file.write_all(&buf[..read]).map_err(|err| {
                ProvisionError::io(format!("failed to write {}", dest.display()), err)
            })?;
            downloaded += read as u64;
            if let Some(progress) = &self.progress {
                progress(downloaded, total);
            }
        }
        file.flush()
            .map_err(|err| ProvisionError::io(format!("failed to flush {}", dest.display()), err))?;

        if let Some(expected) = total {
            if expected != downloaded {
                return Err(network(format!(
                    "truncated transfer: expected {expected} bytes, received {downloaded}"
                )));
            }
        }
        Ok(downloaded)
    }
}

/// Hex SHA-256 of a file, recorded in the run log for audit.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0_u8; 64 * 1024];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
