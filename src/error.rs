use reqwest::StatusCode;
use thiserror::Error;

/// Failure modes of a single geocoding lookup.
///
/// Not-found is not represented here: both resolvers report an authoritative
/// empty answer as `Ok(None)`, keeping "no such place" distinct from "the
/// call itself failed".
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The provider answered with a non-success status (auth rejections
    /// surface here as 401/403)
    #[error("provider returned {status}: {message}")]
    Provider { status: StatusCode, message: String },

    /// Connection, timeout, or response-body failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GeocodeError {
    /// Provider status code, if the provider got as far as answering
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
        }
    }
}
