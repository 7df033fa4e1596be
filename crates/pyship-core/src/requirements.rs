use std::sync::LazyLock;

use regex::Regex;

// Matches `python==3.11.4`, `python=="3.11.4"`, `python="3.11.4"` and
// `python_version="3.11.4"`, case-insensitively, with an optional
// `; <marker>` tail.
static RUNTIME_PIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*python(?:_version)?\s*={1,2}\s*["']?([0-9][0-9.]*)["']?\s*(?:;.*)?$"#)
        .expect("runtime pin pattern is valid")
});

/// Package requirement lines to hand to the dependency installer.
///
/// Derived from the application's descriptor, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySpecList {
    specs: Vec<String>,
}

impl DependencySpecList {
    pub fn from_descriptor(raw: &str) -> Self {
        let specs = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !line.starts_with('#'))
            .filter(|line| !is_runtime_pin(line))
            .map(str::to_string)
            .collect();
        Self { specs }
    }

    pub fn specs(&self) -> &[String] {
        &self.specs
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Renders the list in the line-per-spec format accepted by `pip -r`.
    pub fn to_descriptor(&self) -> String {
        let mut out = String::new();
        for spec in &self.specs {
            out.push_str(spec);
            out.push('\n');
        }
        out
    }
}

pub fn is_runtime_pin(line: &str) -> bool {
    runtime_pin_version(line).is_some()
}

/// First runtime version pinned in a descriptor, if any.
pub fn detect_runtime_pin(raw: &str) -> Option<String> {
    raw.lines().find_map(runtime_pin_version)
}

fn runtime_pin_version(line: &str) -> Option<String> {
    let line = strip_inline_comment(line);
    RUNTIME_PIN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('.').to_string())
}

fn strip_inline_comment(line: &str) -> &str {
    match line.find(" #").or_else(|| line.find("\t#")) {
        Some(idx) => &line[..idx],
        None => line,
    }
}
