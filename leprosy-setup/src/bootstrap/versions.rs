//! Python version parsing and the minimum supported version.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Oldest Python the application and its helper scripts support.
pub const MIN_PYTHON: PythonVersion = PythonVersion {
    major: 3,
    minor: 8,
    patch: 0,
};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Could not parse Python version from {0:?}")]
pub struct VersionParseError(pub String);

/// A `major.minor.patch` interpreter version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PythonVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse the output of `python --version`, e.g. "Python 3.11.4".
    ///
    /// Pre-release suffixes ("3.13.0rc1") and missing patch numbers are tolerated.
    pub fn from_version_output(output: &str) -> Result<Self, VersionParseError> {
        let token = output
            .split_whitespace()
            .find(|t| t.starts_with(|c: char| c.is_ascii_digit()))
            .ok_or_else(|| VersionParseError(output.trim().to_string()))?;
        token.parse()
    }

    /// Only major and minor take part in the support check.
    pub fn meets(&self, minimum: &PythonVersion) -> bool {
        (self.major, self.minor) >= (minimum.major, minimum.minor)
    }

    pub fn short(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl FromStr for PythonVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || VersionParseError(s.to_string());
        let mut parts = s.trim().split('.');

        let major = parts
            .next()
            .and_then(leading_number)
            .ok_or_else(err)?;
        let minor = parts
            .next()
            .and_then(leading_number)
            .ok_or_else(err)?;
        let patch = parts.next().and_then(leading_number).unwrap_or(0);

        Ok(Self::new(major, minor, patch))
    }
}

/// Digits at the start of a version component ("0rc1" -> 0).
fn leading_number(part: &str) -> Option<u32> {
    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
