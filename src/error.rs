//! Error taxonomy shared by every phase and provider.
//!
//! Fatal errors always carry the provider and/or category that failed, since
//! the person reading the staging log cannot see the internal registry order.

use std::path::PathBuf;
use thiserror::Error;

/// Provider category, used to label errors and log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Container,
    Jre,
    Agent,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Container => "container",
            Category::Jre => "jre",
            Category::Agent => "agent",
        };
        write!(f, "{}", name)
    }
}

/// Errors raised by the buildpack library
#[derive(Debug, Error)]
pub enum BuildpackError {
    /// More than one mutually-exclusive layout matched inside one provider
    #[error("{category} '{provider}' matched ambiguously: {detail}")]
    AmbiguousMatch {
        category: Category,
        provider: String,
        detail: String,
    },

    /// A version constraint resolved to nothing in the catalog
    #[error("no version of '{name}' matching '{constraint}' found in catalog '{catalog}'")]
    NotFound {
        name: String,
        constraint: String,
        catalog: String,
    },

    /// Finalize could not find something supply should have written
    #[error("{provider}: missing state from supply phase: {}", path.display())]
    MissingPriorState { provider: String, path: PathBuf },

    /// Finalize re-detection disagrees with what supply recorded
    #[error("{category} detection changed between supply and finalize: supplied {supplied}, detected {detected}")]
    DetectionMismatch {
        category: Category,
        supplied: String,
        detected: String,
    },

    /// No provider in a first-match or exactly-one category matched
    #[error("no {category} provider matched the application")]
    NoMatch { category: Category },

    /// Invalid configuration input
    #[error("invalid configuration in {variable}: {message}")]
    Configuration { variable: String, message: String },

    /// A version string or constraint could not be parsed
    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    /// A build-time path is not under the dependency slot it was translated against
    #[error("{} is not under {}", path.display(), root.display())]
    PathOutsideRoot { path: PathBuf, root: PathBuf },

    /// The installer collaborator failed
    #[error("failed to install {name} {version}: {message}")]
    Install {
        name: String,
        version: String,
        message: String,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BuildpackError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildpackError::Io {
            path: path.into(),
            source,
        }
    }

    /// Errors an individual agent may absorb without failing the build
    pub fn is_agent_skippable(&self) -> bool {
        !matches!(
            self,
            BuildpackError::AmbiguousMatch { .. }
                | BuildpackError::DetectionMismatch { .. }
                | BuildpackError::Configuration { .. }
        )
    }
}

impl From<serde_json::Error> for BuildpackError {
    fn from(err: serde_json::Error) -> Self {
        BuildpackError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for BuildpackError {
    fn from(err: serde_yaml::Error) -> Self {
        BuildpackError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BuildpackError>;
