use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode, Url};
use tracing::info;

use crate::dao::{kv_store::KeyValueStore, storage::StorageResult};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::KvDocument,
};

/// Key-value store keeping one CouchDB document per key.
#[derive(Clone)]
pub struct CouchKvStore {
    client: Client,
    base_url: Arc<Url>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchKvStore {
    /// Connect to CouchDB and create the database when it does not exist yet.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|_| {
            CouchDaoError::InvalidBaseUrl {
                url: config.base_url.clone(),
            }
        })?;

        let store = Self {
            client,
            base_url: Arc::new(base_url),
            database: Arc::from(config.database),
            auth: config
                .credentials
                .map(|(user, pass)| (Arc::<str>::from(user), Arc::<str>::from(pass))),
        };

        store.ensure_database().await?;
        Ok(store)
    }

    /// URL of the database itself, or of a document when `doc_id` is given.
    fn url(&self, doc_id: Option<&str>) -> CouchResult<Url> {
        let mut url = (*self.base_url).clone();
        {
            let mut segments =
                url.path_segments_mut()
                    .map_err(|_| CouchDaoError::InvalidBaseUrl {
                        url: self.base_url.to_string(),
                    })?;
            segments.pop_if_empty().push(&self.database);
            if let Some(doc_id) = doc_id {
                segments.push(doc_id);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.auth {
            Some((user, pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    async fn send(&self, method: Method, url: Url) -> CouchResult<reqwest::Response> {
        let path = url.path().to_string();
        self.request(method, url)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend { path, source })
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let url = self.url(None)?;
        let path = url.path().to_string();
        let response = self.send(Method::GET, url.clone()).await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let created = self.send(Method::PUT, url).await?;
                if created.status().is_success() {
                    info!(database = %self.database, "created CouchDB database");
                    Ok(())
                } else {
                    Err(CouchDaoError::RequestStatus {
                        path,
                        status: created.status(),
                    })
                }
            }
            other => Err(CouchDaoError::RequestStatus {
                path,
                status: other,
            }),
        }
    }

    async fn get_document(&self, doc_id: &str) -> CouchResult<Option<KvDocument>> {
        let url = self.url(Some(doc_id))?;
        let path = url.path().to_string();
        let response = self.send(Method::GET, url).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<KvDocument>()
                .await
                .map(Some)
                .map_err(|source| CouchDaoError::DecodeResponse { path, source }),
            other => Err(CouchDaoError::RequestStatus {
                path,
                status: other,
            }),
        }
    }

    async fn put_document(&self, document: &KvDocument) -> CouchResult<()> {
        let url = self.url(Some(&document.id))?;
        let path = url.path().to_string();
        let response = self
            .request(Method::PUT, url)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: path.clone(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path,
                status: response.status(),
            })
        }
    }
}

impl KeyValueStore for CouchKvStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        let key = key.to_string();
        Box::pin(async move {
            let document = store.get_document(&key).await?;
            Ok(document.map(|doc| doc.value))
        })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = key.to_string();
        Box::pin(async move {
            // CouchDB rejects overwrites that do not carry the current revision.
            let rev = store.get_document(&key).await?.and_then(|doc| doc.rev);
            let document = KvDocument {
                id: key,
                rev,
                value,
            };
            store.put_document(&document).await.map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.url(None)?;
            let path = url.path().to_string();
            let response = store.send(Method::GET, url).await?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path,
                    status: response.status(),
                }
                .into())
            }
        })
    }
}
