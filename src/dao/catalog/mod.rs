//! Client for the third-party music catalog: client-credentials authentication and track
//! search.

mod client;
mod error;
mod models;
pub mod query;
mod transport;

pub use client::{CatalogClient, TrackQuery};
pub use error::{CatalogError, CatalogResult};
pub use transport::{AccessToken, CatalogCredentials, CatalogTransport, HttpCatalogTransport};

/// Largest page the search endpoint accepts.
pub const MAX_TRACK_LIMIT: u8 = 50;
