use std::cmp::Ordering;
use std::fmt;

/// A dotted sequence of non-negative integers such as `3.11.4`.
///
/// Segments are kept as digit strings with leading zeros stripped, so there
/// is no upper bound on a segment's magnitude.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DottedVersion {
    raw: String,
    segments: Vec<String>,
}

/// Outcome of comparing two version strings.
///
/// `Incomparable` is never folded into `Equal`; callers pick their own
/// conservative behavior for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOrdering {
    Greater,
    Equal,
    Less,
    Incomparable,
}

impl DottedVersion {
    pub fn parse(input: &str) -> Option<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return None;
        }

        let mut segments = Vec::new();
        for segment in raw.split('.') {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let digits = segment.trim_start_matches('0');
            segments.push(if digits.is_empty() { "0" } else { digits }.to_string());
        }

        Some(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn major(&self) -> &str {
        &self.segments[0]
    }

    pub fn minor(&self) -> Option<&str> {
        self.segments.get(1).map(String::as_str)
    }

    /// Componentwise comparison with missing trailing segments read as zero.
    pub fn numeric_cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for idx in 0..len {
            let left = self.segments.get(idx).map_or("0", String::as_str);
            let right = other.segments.get(idx).map_or("0", String::as_str);
            match cmp_digits(left, right) {
                Ordering::Equal => continue,
                non_eq => return non_eq,
            }
        }
        Ordering::Equal
    }
}

// Both sides are normalized digit strings: longer means larger.
fn cmp_digits(left: &str, right: &str) -> Ordering {
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

impl fmt::Display for DottedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl VersionOrdering {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greater => "greater",
            Self::Equal => "equal",
            Self::Less => "less",
            Self::Incomparable => "incomparable",
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Self::Greater => Self::Less,
            Self::Less => Self::Greater,
            other => other,
        }
    }
}

impl From<Ordering> for VersionOrdering {
    fn from(value: Ordering) -> Self {
        match value {
            Ordering::Greater => Self::Greater,
            Ordering::Equal => Self::Equal,
            Ordering::Less => Self::Less,
        }
    }
}

pub fn compare_versions(a: &str, b: &str) -> VersionOrdering {
    match (DottedVersion::parse(a), DottedVersion::parse(b)) {
        (Some(left), Some(right)) => left.numeric_cmp(&right).into(),
        _ => VersionOrdering::Incomparable,
    }
}
