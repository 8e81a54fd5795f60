use reqwest::StatusCode;
use thiserror::Error;

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failures raised while talking to the music catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Client id or secret is not configured.
    #[error("catalog credentials are not configured (missing `{var}`)")]
    MissingCredentials { var: &'static str },
    /// Building the HTTP client failed.
    #[error("failed to build catalog HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The token request could not be sent or decoded.
    #[error("failed to authenticate with catalog service")]
    Authentication {
        #[source]
        source: reqwest::Error,
    },
    /// The token endpoint rejected the credentials.
    #[error("failed to authenticate with catalog service (status {status})")]
    AuthenticationStatus { status: StatusCode },
    /// The search request could not be sent or decoded.
    #[error("failed to fetch tracks")]
    Search {
        #[source]
        source: reqwest::Error,
    },
    /// The search endpoint answered with an error status.
    #[error("failed to fetch tracks (status {status})")]
    SearchStatus { status: StatusCode },
    /// Requested page size is outside of what the catalog accepts.
    #[error("track limit must be between 1 and {max} (got {limit})")]
    InvalidLimit { limit: u8, max: u8 },
}
