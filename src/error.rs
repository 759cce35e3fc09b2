//! Error taxonomy
//!
//! Every fallible operation in the crate returns [`Result`]. The variants let
//! callers tell apart:
//! - a node that could not be reached (retry later): [`Error::Communication`]
//! - a node that cannot do what was asked (do not retry): [`Error::NotSupported`]
//! - a node whose current configuration rejects the request: [`Error::InvalidConfig`]
//! - a node that answered with an explicit failure: [`Error::NodeCommunication`]

use core::fmt;

use thiserror::Error;

use crate::NodeAddress;

/// Crate-wide result type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors returned by node operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The base station could not complete the exchange with the node.
    /// Retried internally wherever a retry budget applies.
    #[error("communication failure: {0}")]
    Communication(String),

    /// The node model/firmware has no mapping or capability for the request.
    #[error("{0} is not supported by this node")]
    NotSupported(String),

    /// The node's current configuration is incompatible with the request.
    #[error("invalid node configuration: {0}")]
    InvalidConfig(ConfigIssues),

    /// The node answered, but reported that the command failed.
    #[error("node {node}: {message}")]
    NodeCommunication {
        /// Node that reported the failure
        node: NodeAddress,
        /// What failed
        message: String,
    },

    /// A response could not be decoded into the expected value.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// An argument lies outside the range the node accepts.
    #[error("{name} {value} is out of range ({min}..={max})")]
    OutOfRange {
        /// Name of the rejected argument
        name: &'static str,
        /// Value given
        value: u32,
        /// Smallest accepted value
        min: u32,
        /// Largest accepted value
        max: u32,
    },
}

impl Error {
    /// Whether the error is a transient transport failure worth retrying.
    pub fn is_communication(&self) -> bool {
        matches!(self, Error::Communication(_))
    }
}

/// Area of the configuration a [`ConfigIssue`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigCategory {
    DefaultMode,
    InactivityTimeout,
    CheckRadioInterval,
    TransmitPower,
    SamplingMode,
    ActiveChannels,
    SampleRate,
    NumSweeps,
    TimeBetweenBursts,
    LostBeaconTimeout,
    HardwareOffset,
    LinearEquation,
    FatigueOptions,
    HistogramOptions,
}

/// A single problem found while verifying a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub category: ConfigCategory,
    pub message: String,
}

impl ConfigIssue {
    pub fn new(category: ConfigCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.category, self.message)
    }
}

/// Ordered list of configuration issues. Empty means the configuration is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigIssues(Vec<ConfigIssue>);

impl ConfigIssues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: ConfigCategory, message: impl Into<String>) {
        self.0.push(ConfigIssue::new(category, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigIssue> {
        self.0.iter()
    }

    /// Whether any issue was reported for `category`.
    pub fn contains(&self, category: ConfigCategory) -> bool {
        self.0.iter().any(|issue| issue.category == category)
    }
}

impl From<ConfigIssue> for ConfigIssues {
    fn from(issue: ConfigIssue) -> Self {
        Self(vec![issue])
    }
}

impl fmt::Display for ConfigIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issues_render_in_order() {
        let mut issues = ConfigIssues::new();
        issues.push(ConfigCategory::SamplingMode, "not non-sync");
        issues.push(ConfigCategory::NumSweeps, "zero sweeps");

        assert_eq!(issues.len(), 2);
        assert!(issues.contains(ConfigCategory::NumSweeps));
        assert!(!issues.contains(ConfigCategory::ActiveChannels));
        assert_eq!(
            issues.to_string(),
            "SamplingMode: not non-sync; NumSweeps: zero sweeps"
        );
    }

    #[test]
    fn only_transport_failures_count_as_communication() {
        assert!(Error::Communication("timeout".into()).is_communication());
        assert!(!Error::NotSupported("AutoCal".into()).is_communication());
        assert!(!Error::MalformedResponse("short".into()).is_communication());
    }
}
