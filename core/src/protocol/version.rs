// Protocol versions - parsing, validation and negotiation
//
// A version is `major.minor`. Any version is backwards compatible with every
// earlier minor on the same major, and incompatible with every other major.
// Peers advertise a list with at most one entry per major, sorted by major,
// and negotiation picks the highest major both lists share.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Invalid version string: {0:?}")]
    Parse(String),
    #[error("No versions")]
    EmptyList,
    #[error("Invalid version: {0}")]
    InvalidMajor(ProtocolVersion),
    #[error("Duplicate major version: {0}")]
    DuplicateMajor(u64),
    #[error("Versions are not sorted")]
    Unsorted,
    #[error("Invalid version list {raw:?}: {source}")]
    InvalidList {
        raw: String,
        #[source]
        source: Box<VersionError>,
    },
}

// ============================================================================
// SINGLE VERSION
// ============================================================================

/// One version of the control-plane protocol.
///
/// e.g. `2.3` is backwards compatible with `2.2` but not with `1.2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub major: u64,
    pub minor: u64,
}

impl ProtocolVersion {
    pub const fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }

    /// Parse `"major.minor"`. Both parts are base-10 `u64`, major must be
    /// at least 1.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let invalid = || VersionError::Parse(text.to_string());

        let mut parts = text.split('.');
        let (major, minor) = match (parts.next(), parts.next(), parts.next()) {
            (Some(major), Some(minor), None) => (major, minor),
            _ => return Err(invalid()),
        };

        let major = parse_component(major).ok_or_else(invalid)?;
        if major == 0 {
            return Err(invalid());
        }
        let minor = parse_component(minor).ok_or_else(invalid)?;

        Ok(Self { major, minor })
    }

    /// Returns the lowest version compatible with both `self` and `other`,
    /// or `None` when the majors differ.
    pub fn is_compatible_with(&self, other: &ProtocolVersion) -> Option<ProtocolVersion> {
        if self.major != other.major {
            return None;
        }
        if self.minor < other.minor {
            Some(*self)
        } else {
            Some(*other)
        }
    }
}

/// `u64::from_str` also accepts a leading `+`, which is not part of the
/// advertisement grammar.
fn parse_component(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ProtocolVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// VERSION LIST
// ============================================================================

/// The versions supported by one peer.
///
/// A valid list is non-empty, has no zero major, and is strictly increasing
/// by major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersionList {
    pub versions: Vec<ProtocolVersion>,
}

impl ProtocolVersionList {
    /// Build a list and validate it.
    pub fn new(versions: Vec<ProtocolVersion>) -> Result<Self, VersionError> {
        let list = Self { versions };
        list.validate()?;
        Ok(list)
    }

    /// Parse `"major.minor,major.minor,..."`. Failures carry the raw text.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let wrap = |source: VersionError| VersionError::InvalidList {
            raw: text.to_string(),
            source: Box::new(source),
        };

        let versions = text
            .split(',')
            .map(ProtocolVersion::parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(wrap)?;

        let list = Self { versions };
        list.validate().map_err(wrap)?;
        Ok(list)
    }

    /// Check the structural invariants, reporting the first violation in
    /// list order.
    pub fn validate(&self) -> Result<(), VersionError> {
        if self.versions.is_empty() {
            return Err(VersionError::EmptyList);
        }
        for (i, version) in self.versions.iter().enumerate() {
            if version.major == 0 {
                return Err(VersionError::InvalidMajor(*version));
            }
            if i == 0 {
                continue;
            }
            let previous = self.versions[i - 1];
            if previous.major == version.major {
                return Err(VersionError::DuplicateMajor(version.major));
            }
            if previous.major > version.major {
                return Err(VersionError::Unsorted);
            }
        }
        Ok(())
    }

    /// Returns the best version compatible with both lists: the highest
    /// shared major, at the lower of the two minors on that major.
    pub fn negotiate(&self, other: &ProtocolVersionList) -> Option<ProtocolVersion> {
        let mut best: Option<ProtocolVersion> = None;
        for ours in &self.versions {
            for theirs in &other.versions {
                let Some(candidate) = ours.is_compatible_with(theirs) else {
                    continue;
                };
                if best.map_or(true, |b| candidate.major > b.major) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProtocolVersion> {
        self.versions.iter()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl fmt::Display for ProtocolVersionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, version) in self.versions.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", version)?;
        }
        Ok(())
    }
}

impl FromStr for ProtocolVersionList {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// SUPPORTED VERSIONS
// ============================================================================

// 1.1 adds device telemetry fields to the start request.
// 1.2 adds last-ping latency and preferred relay information to agent state.
// 1.3 adds soft network isolation to the start request.
const CURRENT_SUPPORTED_VERSIONS: &[ProtocolVersion] = &[ProtocolVersion::new(1, 3)];

/// The versions this build speaks.
pub fn current_supported_versions() -> ProtocolVersionList {
    ProtocolVersionList {
        versions: CURRENT_SUPPORTED_VERSIONS.to_vec(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
