use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::Client;
use tracing::debug;

use crate::state::game::Track;

use super::{
    error::{CatalogError, CatalogResult},
    models::{SearchResponse, TokenResponse},
};

const CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";
const CLIENT_SECRET_ENV: &str = "SPOTIFY_CLIENT_SECRET";

/// Bearer token returned by the credentials exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_in: Duration,
}

/// Network seam of the catalog: one call per remote endpoint.
pub trait CatalogTransport: Send + Sync {
    /// Perform a client-credentials exchange.
    fn request_token(&self) -> BoxFuture<'static, CatalogResult<AccessToken>>;
    /// Run a track search with an already valid bearer token.
    fn search(
        &self,
        token: String,
        query: String,
        limit: u8,
    ) -> BoxFuture<'static, CatalogResult<Vec<Track>>>;
}

/// Application credentials for the client-credentials grant.
#[derive(Clone)]
pub struct CatalogCredentials {
    client_id: Arc<str>,
    client_secret: Arc<str>,
}

impl CatalogCredentials {
    /// Wrap an explicit id/secret pair.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Arc::from(client_id.into()),
            client_secret: Arc::from(client_secret.into()),
        }
    }

    /// Read `SPOTIFY_CLIENT_ID` and `SPOTIFY_CLIENT_SECRET`.
    pub fn from_env() -> CatalogResult<Self> {
        let client_id = std::env::var(CLIENT_ID_ENV)
            .map_err(|_| CatalogError::MissingCredentials { var: CLIENT_ID_ENV })?;
        let client_secret =
            std::env::var(CLIENT_SECRET_ENV).map_err(|_| CatalogError::MissingCredentials {
                var: CLIENT_SECRET_ENV,
            })?;
        Ok(Self::new(client_id, client_secret))
    }
}

impl std::fmt::Debug for CatalogCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// [`CatalogTransport`] speaking HTTP to the real catalog service.
#[derive(Clone)]
pub struct HttpCatalogTransport {
    client: Client,
    token_url: Arc<str>,
    api_base_url: Arc<str>,
    credentials: Option<CatalogCredentials>,
}

impl HttpCatalogTransport {
    /// Build the transport; missing credentials only fail once a token is requested.
    pub fn new(
        token_url: &str,
        api_base_url: &str,
        credentials: Option<CatalogCredentials>,
    ) -> CatalogResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CatalogError::ClientBuilder { source })?;

        Ok(Self {
            client,
            token_url: Arc::from(token_url),
            api_base_url: Arc::from(api_base_url.trim_end_matches('/')),
            credentials,
        })
    }
}

impl CatalogTransport for HttpCatalogTransport {
    fn request_token(&self) -> BoxFuture<'static, CatalogResult<AccessToken>> {
        let transport = self.clone();
        Box::pin(async move {
            let credentials = transport
                .credentials
                .as_ref()
                .ok_or(CatalogError::MissingCredentials { var: CLIENT_ID_ENV })?;

            let response = transport
                .client
                .post(transport.token_url.as_ref())
                .basic_auth(
                    credentials.client_id.as_ref(),
                    Some(credentials.client_secret.as_ref()),
                )
                .form(&[("grant_type", "client_credentials")])
                .send()
                .await
                .map_err(|source| CatalogError::Authentication { source })?;

            if !response.status().is_success() {
                return Err(CatalogError::AuthenticationStatus {
                    status: response.status(),
                });
            }

            let payload = response
                .json::<TokenResponse>()
                .await
                .map_err(|source| CatalogError::Authentication { source })?;

            Ok(AccessToken {
                value: payload.access_token,
                expires_in: Duration::from_secs(payload.expires_in),
            })
        })
    }

    fn search(
        &self,
        token: String,
        query: String,
        limit: u8,
    ) -> BoxFuture<'static, CatalogResult<Vec<Track>>> {
        let transport = self.clone();
        Box::pin(async move {
            let url = format!("{}/search", transport.api_base_url);
            debug!(%query, limit, "searching catalog");

            let response = transport
                .client
                .get(url)
                .bearer_auth(token)
                .query(&[
                    ("q", query),
                    ("type", "track".to_string()),
                    ("limit", limit.to_string()),
                ])
                .send()
                .await
                .map_err(|source| CatalogError::Search { source })?;

            if !response.status().is_success() {
                return Err(CatalogError::SearchStatus {
                    status: response.status(),
                });
            }

            let payload = response
                .json::<SearchResponse>()
                .await
                .map_err(|source| CatalogError::Search { source })?;

            Ok(payload.into_tracks())
        })
    }
}
