use crate::version::DottedVersion;

pub const DEFAULT_RUNTIME_BASE_URL: &str = "https://www.python.org/ftp/python";
pub const DEFAULT_RUNTIME_PLATFORM: &str = "amd64";
pub const DEFAULT_BOOTSTRAP_URL: &str = "https://bootstrap.pypa.io/get-pip.py";
pub const INTERPRETER_EXE: &str = "python.exe";

/// Where embeddable runtime archives are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSource {
    pub base_url: String,
    pub platform: String,
}

impl Default for RuntimeSource {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RUNTIME_BASE_URL.to_string(),
            platform: DEFAULT_RUNTIME_PLATFORM.to_string(),
        }
    }
}

impl RuntimeSource {
    pub fn archive_name(&self, version: &DottedVersion) -> String {
        format!("python-{}-embed-{}.zip", version, self.platform)
    }

    pub fn archive_url(&self, version: &DottedVersion) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            version,
            self.archive_name(version)
        )
    }
}

/// `python310` for `3.10.x`; single-segment versions collapse to their digits.
pub fn runtime_stem(version: &DottedVersion) -> String {
    match version.minor() {
        Some(minor) => format!("python{}{}", version.major(), minor),
        None => format!("python{}", version.as_str().replace('.', "")),
    }
}

/// Path-configuration file the embeddable distribution ships, e.g. `python310._pth`.
pub fn pth_file_name(version: &DottedVersion) -> String {
    format!("{}._pth", runtime_stem(version))
}

/// Template that opens the embedded runtime's module search to `Lib` and
/// enables `site`, so packages installed by pip become importable.
pub fn render_pth_template(version: &DottedVersion) -> String {
    format!("{}.zip\nLib\n.\nimport site\n", runtime_stem(version))
}

/// Parses `Python 3.10.0` as printed by `python --version`.
pub fn parse_interpreter_version(output: &str) -> Option<DottedVersion> {
    let line = output.lines().map(str::trim).find(|line| !line.is_empty())?;
    let rest = line.strip_prefix("Python").unwrap_or(line).trim();
    let token = rest.split_whitespace().next()?;
    DottedVersion::parse(token)
}
