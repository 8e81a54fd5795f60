use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use tokio::fs;
use tracing::debug;

use crate::dao::{
    kv_store::KeyValueStore,
    storage::{StorageError, StorageResult},
};

const FILE_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

/// Stores every key as its own file inside a data directory.
#[derive(Clone)]
pub struct FileKvStore {
    root: Arc<PathBuf>,
}

impl FileKvStore {
    /// Open (and create if needed) the data directory.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|source| {
            StorageError::unavailable(
                format!("failed to create data directory `{}`", root.display()),
                source,
            )
        })?;

        Ok(Self {
            root: Arc::new(root),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root
            .join(file_stem(key))
            .with_extension(FILE_EXTENSION)
    }
}

/// Map a key onto a portable file name (`@SongSmash:teams` -> `_SongSmash_teams`).
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

async fn write_atomically(path: &Path, value: &str) -> std::io::Result<()> {
    let temp = path.with_extension(TEMP_EXTENSION);
    fs::write(&temp, value).await?;
    fs::rename(&temp, path).await
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let path = self.path_for(key);
        Box::pin(async move {
            match fs::read_to_string(&path).await {
                Ok(contents) => Ok(Some(contents)),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(err) => Err(StorageError::unavailable(
                    format!("failed to read `{}`", path.display()),
                    err,
                )),
            }
        })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.path_for(key);
        Box::pin(async move {
            write_atomically(&path, &value).await.map_err(|err| {
                StorageError::unavailable(format!("failed to write `{}`", path.display()), err)
            })?;
            debug!(path = %path.display(), bytes = value.len(), "stored value");
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let root = Arc::clone(&self.root);
        Box::pin(async move {
            let metadata = fs::metadata(root.as_path()).await.map_err(|err| {
                StorageError::unavailable(
                    format!("data directory `{}` is not accessible", root.display()),
                    err,
                )
            })?;
            if metadata.is_dir() {
                Ok(())
            } else {
                Err(StorageError::unavailable(
                    format!("`{}` is not a directory", root.display()),
                    std::io::Error::from(ErrorKind::NotADirectory),
                ))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKvStore::open(dir.path()).await.unwrap();

        assert_eq!(store.get("@SongSmash:teams").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_returns_last_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKvStore::open(dir.path()).await.unwrap();

        store.set("@SongSmash:teams", "[]".into()).await.unwrap();
        store
            .set("@SongSmash:teams", r#"[{"id":"1","name":"A"}]"#.into())
            .await
            .unwrap();

        assert_eq!(
            store.get("@SongSmash:teams").await.unwrap().as_deref(),
            Some(r#"[{"id":"1","name":"A"}]"#)
        );
        assert!(dir.path().join("_SongSmash_teams.json").exists());
        assert!(!dir.path().join("_SongSmash_teams.json.tmp").exists());
    }

    #[tokio::test]
    async fn values_survive_reopening_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileKvStore::open(dir.path()).await.unwrap();
            store.set("key", "value".into()).await.unwrap();
        }

        let reopened = FileKvStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.get("key").await.unwrap().as_deref(), Some("value"));
        assert!(reopened.health_check().await.is_ok());
    }

    #[test]
    fn file_stem_replaces_separators() {
        assert_eq!(file_stem("@SongSmash:teams"), "_SongSmash_teams");
        assert_eq!(file_stem("plain-key_1"), "plain-key_1");
    }
}
