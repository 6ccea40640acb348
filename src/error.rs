// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Error type shared by every duckman module

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Version '{0}' is not installed")]
    NotInstalled(String),

    #[error("Version '{0}' not found in the release catalog")]
    NotFoundRemote(String),

    #[error("Version '{version}' has no download for platform {platform}")]
    UnsupportedPlatform { version: String, platform: String },

    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Failed to extract {binary} from asset: {reason}")]
    Extract { binary: String, reason: String },

    #[error("Invalid release metadata from {url}: {source}")]
    InvalidRelease {
        url: String,
        source: serde_json::Error,
    },

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid inventory at {path:?}: {source}")]
    Serialization {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to launch {program:?}: {source}")]
    Launch {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not determine the home directory")]
    NoHomeDir,

    #[error("{operation} {version}: {source}")]
    Operation {
        operation: &'static str,
        version: String,
        source: Box<Error>,
    },
}

impl Error {
    /// Build an IO error that remembers which path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap the error with the operation and version it failed in.
    ///
    /// An error that already carries context is returned unchanged so nested
    /// operations (e.g. the install triggered by `run`) report once.
    #[must_use]
    pub fn during(self, operation: &'static str, version: &str) -> Self {
        match self {
            Self::Operation { .. } => self,
            other => Self::Operation {
                operation,
                version: version.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error kind, with any operation context peeled off
    #[must_use]
    pub fn root(&self) -> &Error {
        match self {
            Self::Operation { source, .. } => source.root(),
            other => other,
        }
    }
}
