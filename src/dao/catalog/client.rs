use std::sync::Arc;

use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, info};

use crate::state::game::Track;

use super::{
    MAX_TRACK_LIMIT,
    error::{CatalogError, CatalogResult},
    query::build_query,
    transport::CatalogTransport,
};

/// Options of a track lookup; every field may be left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackQuery {
    /// Genre names, OR-ed together.
    pub genres: Vec<String>,
    /// Decade labels like `1990s`, OR-ed together.
    pub decades: Vec<String>,
    /// Page size; the client's default limit when `None`.
    pub limit: Option<u8>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Catalog client caching its bearer token until it expires.
pub struct CatalogClient {
    transport: Arc<dyn CatalogTransport>,
    token: Mutex<Option<CachedToken>>,
    default_limit: u8,
}

impl CatalogClient {
    /// Wrap a transport; `default_limit` applies when a query carries no limit.
    pub fn new(transport: Arc<dyn CatalogTransport>, default_limit: u8) -> Self {
        Self {
            transport,
            token: Mutex::new(None),
            default_limit: default_limit.clamp(1, MAX_TRACK_LIMIT),
        }
    }

    /// Return the cached token while it is valid, otherwise exchange credentials for a new one.
    ///
    /// The cache lock is held across the exchange so concurrent callers share a single
    /// request.
    pub async fn authenticate(&self) -> CatalogResult<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref().filter(|t| Instant::now() < t.expires_at) {
            debug!("reusing cached catalog token");
            return Ok(token.value.clone());
        }

        let fresh = self.transport.request_token().await?;
        info!(
            expires_in_secs = fresh.expires_in.as_secs(),
            "obtained catalog access token"
        );
        let cached = CachedToken {
            value: fresh.value,
            expires_at: Instant::now() + fresh.expires_in,
        };
        let value = cached.value.clone();
        *guard = Some(cached);
        Ok(value)
    }

    /// Search tracks matching the given genres and decades with a single request.
    pub async fn get_tracks(&self, query: TrackQuery) -> CatalogResult<Vec<Track>> {
        let limit = query.limit.unwrap_or(self.default_limit);
        if limit == 0 || limit > MAX_TRACK_LIMIT {
            return Err(CatalogError::InvalidLimit {
                limit,
                max: MAX_TRACK_LIMIT,
            });
        }

        let search = build_query(&query.genres, &query.decades);
        let token = self.authenticate().await?;
        let tracks = self.transport.search(token, search.clone(), limit).await?;
        info!(query = %search, count = tracks.len(), "fetched catalog tracks");
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Mutex as StdMutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use futures::future::BoxFuture;

    use super::*;
    use crate::dao::catalog::transport::AccessToken;

    #[derive(Default)]
    struct CountingTransport {
        exchanges: AtomicUsize,
        searches: StdMutex<Vec<(String, String, u8)>>,
    }

    impl CatalogTransport for CountingTransport {
        fn request_token(&self) -> BoxFuture<'static, CatalogResult<AccessToken>> {
            let n = self.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
            Box::pin(async move {
                Ok(AccessToken {
                    value: format!("token-{n}"),
                    expires_in: Duration::from_secs(3600),
                })
            })
        }

        fn search(
            &self,
            token: String,
            query: String,
            limit: u8,
        ) -> BoxFuture<'static, CatalogResult<Vec<Track>>> {
            self.searches.lock().unwrap().push((token, query, limit));
            Box::pin(async {
                Ok(vec![Track {
                    id: "t1".into(),
                    name: "Song".into(),
                    artist: "Artist".into(),
                    preview_url: Some("https://p.example/t1.mp3".into()),
                    artwork_url: None,
                }])
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn authenticate_twice_within_expiry_exchanges_once() {
        let transport = Arc::new(CountingTransport::default());
        let client = CatalogClient::new(transport.clone(), 20);

        let first = client.authenticate().await.unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        let second = client.authenticate().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.exchanges.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_token_is_exchanged_again() {
        let transport = Arc::new(CountingTransport::default());
        let client = CatalogClient::new(transport.clone(), 20);

        assert_eq!(client.authenticate().await.unwrap(), "token-1");
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(client.authenticate().await.unwrap(), "token-2");
        assert_eq!(transport.exchanges.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn get_tracks_sends_built_query_with_cached_token() {
        let transport = Arc::new(CountingTransport::default());
        let client = CatalogClient::new(transport.clone(), 20);

        let query = TrackQuery {
            genres: vec!["Rock".into()],
            decades: vec!["1990s".into()],
            limit: None,
        };
        let tracks = client.get_tracks(query.clone()).await.unwrap();
        client.get_tracks(query).await.unwrap();

        assert_eq!(tracks.len(), 1);
        assert_eq!(transport.exchanges.load(Ordering::SeqCst), 1);
        let searches = transport.searches.lock().unwrap();
        assert_eq!(
            searches[0],
            (
                "token-1".to_string(),
                "genre:\"Rock\" year:1990-1999".to_string(),
                20
            )
        );
    }

    #[tokio::test]
    async fn explicit_limit_is_honoured_and_bounded() {
        let transport = Arc::new(CountingTransport::default());
        let client = CatalogClient::new(transport.clone(), 20);

        client
            .get_tracks(TrackQuery {
                genres: vec!["Pop".into()],
                limit: Some(5),
                ..TrackQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(transport.searches.lock().unwrap()[0].2, 5);

        let err = client
            .get_tracks(TrackQuery {
                limit: Some(51),
                ..TrackQuery::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidLimit { limit: 51, .. }));
    }
}
