use thiserror::Error;

use crate::models::SportId;

/// Failures surfaced by the plugin registry.
///
/// All of these are local to the operation that caused them; none corrupt
/// registry state for other plugins, and the previously active plugin keeps
/// its slot until a replacement activates successfully.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Activation requested for an id that was never registered
    #[error("unknown sport plugin '{0}'")]
    UnknownPlugin(SportId),

    /// A manifest with this id is already registered
    #[error("sport plugin '{0}' is already registered")]
    Duplicate(SportId),

    /// Manifest's core-version requirement does not match this build
    #[error("plugin '{id}' requires core {requirement}, this build is {core}")]
    Incompatible {
        id: SportId,
        requirement: semver::VersionReq,
        core: semver::Version,
    },

    /// Loader factory or `on_load` failed; retryable, nothing was cached
    #[error("plugin '{id}' failed to load")]
    Load {
        id: SportId,
        #[source]
        source: anyhow::Error,
    },

    /// `on_activate` failed; the loaded instance stays cached so a retry
    /// skips re-loading
    #[error("plugin '{id}' failed to activate")]
    Activation {
        id: SportId,
        #[source]
        source: anyhow::Error,
    },
}

/// Failures talking to a sport's external provider.
///
/// These always propagate to the caller, who owns retry/backoff policy;
/// adapters never convert them into an empty scoreboard.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("provider returned status {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed provider payload: {0}")]
    Malformed(String),

    #[error("provider does not know game '{0}'")]
    UnknownGame(String),
}

impl FetchError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
