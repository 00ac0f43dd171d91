use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while talking to the platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The request never produced a usable response.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    /// A response arrived but its body could not be decoded.
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The platform answered with a well-formed error envelope.
    #[error("platform rejected request with status {status}: {detail}")]
    Domain { status: u16, detail: String },

    #[error("request did not complete within {0:?}")]
    Deadline(Duration),
}

impl PlatformError {
    pub fn transport(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        PlatformError::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Transport and decode failures cannot be reported with a platform message.
    pub fn is_transport(&self) -> bool {
        !matches!(self, PlatformError::Domain { .. })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("failed to get account ID from API key")]
    MissingAccountId,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("project `{project}` requires an organization")]
    ProjectWithoutOrg { project: String },
}

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("refusing to write `{path}` outside of {root}")]
    UnsafePath { path: String, root: PathBuf },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MirrorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MirrorError::Io {
            path: path.into(),
            source,
        }
    }
}
