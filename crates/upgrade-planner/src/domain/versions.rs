//! Kubernetes version pair validation.

use std::fmt;
use std::num::ParseIntError;

/// Highest minor number before the major version rolls over
const MAX_MINOR: u32 = 99;

/// A `major.minor` Kubernetes version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinorVersion {
    pub major: u32,
    pub minor: u32,
}

impl MinorVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse the first two dot-separated components; anything after is ignored.
    pub fn parse(version: &str) -> Result<Self, VersionParseError> {
        let mut parts = version.trim().split('.');
        let (Some(major), Some(minor)) = (parts.next(), parts.next()) else {
            return Err(VersionParseError::Format);
        };
        Ok(Self {
            major: major.parse()?,
            minor: minor.parse()?,
        })
    }

    /// The next minor release, rolling the major over after `x.99`.
    pub fn next(self) -> Self {
        if self.minor >= MAX_MINOR {
            Self::new(self.major + 1, 0)
        } else {
            Self::new(self.major, self.minor + 1)
        }
    }

    /// Number of minor releases from `self` up to `other` (zero when `other` is not newer).
    pub fn minors_until(self, other: Self) -> u32 {
        let mut steps = 0;
        let mut current = self;
        while current < other {
            current = current.next();
            steps += 1;
        }
        steps
    }
}

impl fmt::Display for MinorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Why a version string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    #[error("版本必须是'x.y'格式")]
    Format,
    #[error("验证版本时出错: {0}")]
    Number(#[from] ParseIntError),
}

/// Outcome of [`validate_versions`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionCheck {
    pub valid: bool,
    /// Empty when valid
    pub error: String,
    /// Versions strictly after current up to and including target
    pub versions: Vec<String>,
}

impl VersionCheck {
    fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: error.into(),
            versions: Vec::new(),
        }
    }
}

/// Validate an upgrade from `current` to `target` and list the steps.
pub fn validate_versions(current: &str, target: &str) -> VersionCheck {
    let (current, target) = match (MinorVersion::parse(current), MinorVersion::parse(target)) {
        (Ok(c), Ok(t)) => (c, t),
        (Err(e), _) | (_, Err(e)) => return VersionCheck::invalid(e.to_string()),
    };

    if current >= target {
        return VersionCheck::invalid("目标版本必须大于当前版本");
    }

    let mut versions = Vec::new();
    let mut step = current;
    while step < target {
        step = step.next();
        versions.push(step.to_string());
    }

    VersionCheck {
        valid: true,
        error: String::new(),
        versions,
    }
}
