use std::sync::Arc;

use futures::future::BoxFuture;

use crate::dao::{
    kv_store::KeyValueStore,
    models::TeamEntity,
    storage::{StorageError, StorageResult},
};

/// Storage key holding the serialized team array.
pub const TEAMS_STORAGE_KEY: &str = "@SongSmash:teams";

/// Whole-document persistence of the team list.
pub trait TeamPersistence: Send + Sync {
    /// Read the full team list; an empty list when nothing was stored yet.
    fn load(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    /// Overwrite the stored team list.
    fn save(&self, teams: Vec<TeamEntity>) -> BoxFuture<'static, StorageResult<()>>;
    /// Check that the underlying storage is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// [`TeamPersistence`] writing the team array as JSON under a single key.
#[derive(Clone)]
pub struct KeyValueTeamPersistence {
    store: Arc<dyn KeyValueStore>,
    key: Arc<str>,
}

impl KeyValueTeamPersistence {
    /// Persist teams under [`TEAMS_STORAGE_KEY`].
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, TEAMS_STORAGE_KEY)
    }

    /// Persist teams under a custom key.
    pub fn with_key(store: Arc<dyn KeyValueStore>, key: &str) -> Self {
        Self {
            store,
            key: Arc::from(key),
        }
    }
}

impl TeamPersistence for KeyValueTeamPersistence {
    fn load(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = Arc::clone(&self.store);
        let key = Arc::clone(&self.key);
        Box::pin(async move {
            let Some(raw) = store.get(&key).await? else {
                return Ok(Vec::new());
            };
            serde_json::from_str(&raw).map_err(|source| StorageError::Corrupted {
                key: key.to_string(),
                source,
            })
        })
    }

    fn save(&self, teams: Vec<TeamEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = Arc::clone(&self.store);
        let key = Arc::clone(&self.key);
        Box::pin(async move {
            let raw = serde_json::to_string(&teams).map_err(|source| StorageError::Corrupted {
                key: key.to_string(),
                source,
            })?;
            store.set(&key, raw).await
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.store.health_check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::kv_store::memory::MemoryKvStore;

    fn entity(id: &str, name: &str) -> TeamEntity {
        TeamEntity {
            id: id.into(),
            name: name.into(),
            avatar_url: None,
            color_hex: Some("#1DB954".into()),
        }
    }

    #[tokio::test]
    async fn empty_store_loads_no_teams() {
        let persistence = KeyValueTeamPersistence::new(Arc::new(MemoryKvStore::new()));
        assert!(persistence.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saved_array_uses_camel_case_fields() {
        let kv = MemoryKvStore::new();
        let persistence = KeyValueTeamPersistence::new(Arc::new(kv.clone()));

        persistence
            .save(vec![entity("1700000000000", "Team A")])
            .await
            .unwrap();

        let raw = kv.get(TEAMS_STORAGE_KEY).await.unwrap().unwrap();
        assert_eq!(
            raw,
            r##"[{"id":"1700000000000","name":"Team A","colorHex":"#1DB954"}]"##
        );
    }

    #[tokio::test]
    async fn malformed_document_is_reported_as_corrupted() {
        let kv = MemoryKvStore::new();
        kv.set(TEAMS_STORAGE_KEY, "{not json".into()).await.unwrap();
        let persistence = KeyValueTeamPersistence::new(Arc::new(kv));

        let err = persistence.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupted { ref key, .. } if key == TEAMS_STORAGE_KEY));
    }
}
