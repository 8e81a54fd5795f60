//! Application-level configuration loading: storage, catalog endpoints, snippet policy and
//! the genre/decade options offered to players.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::game::SnippetPolicy;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SONG_SMASH_CONFIG_PATH";

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_TRACK_LIMIT: u8 = 20;
const DEFAULT_SNIPPET_LENGTH_SECS: u64 = 15;
const DEFAULT_PREVIEW_LENGTH_SECS: u64 = 30;
const DEFAULT_STATUS_TICK_MS: u64 = 250;
const DEFAULT_TRANSITION_TIMEOUT_SECS: u64 = 10;

const DEFAULT_GENRES: [&str; 10] = [
    "Pop",
    "Rock",
    "Hip-Hop",
    "Electronic",
    "Jazz",
    "Classical",
    "Country",
    "R&B",
    "Indie",
    "Metal",
];
const DEFAULT_DECADES: [&str; 7] = [
    "1960s", "1970s", "1980s", "1990s", "2000s", "2010s", "2020s",
];

/// Which key-value backend persists the team list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// One JSON file per key under the data directory.
    File,
    /// Process memory only; nothing survives a restart.
    Memory,
    /// CouchDB database configured through the `COUCH_*` environment variables.
    Couchdb,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    storage_backend: StorageBackend,
    data_dir: PathBuf,
    token_url: String,
    api_base_url: String,
    default_track_limit: u8,
    snippet_policy: SnippetPolicy,
    genres: Vec<String>,
    decades: Vec<String>,
    status_tick: Duration,
    transition_timeout: Option<Duration>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        backend = ?app_config.storage_backend,
                        genres = app_config.genres.len(),
                        decades = app_config.decades.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Backend used to persist the team list.
    pub fn storage_backend(&self) -> StorageBackend {
        self.storage_backend
    }

    /// Directory holding the file-backed key-value entries.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Client-credentials token endpoint of the catalog service.
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Base URL of the catalog REST API (the search endpoint lives below it).
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Track limit used when a catalog request does not specify one.
    pub fn default_track_limit(&self) -> u8 {
        self.default_track_limit
    }

    /// How snippet windows are cut out of track previews.
    pub fn snippet_policy(&self) -> SnippetPolicy {
        self.snippet_policy
    }

    /// Genres offered on the genre/decade screen.
    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    /// Decades offered on the genre/decade screen.
    pub fn decades(&self) -> &[String] {
        &self.decades
    }

    /// Interval between two playback status polls.
    pub fn status_tick(&self) -> Duration {
        self.status_tick
    }

    /// Upper bound for the side work of a flow transition.
    pub fn transition_timeout(&self) -> Option<Duration> {
        self.transition_timeout
    }

    /// Replace the storage backend, mostly useful for tests and local runs.
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.storage_backend = backend;
        self
    }

    /// Replace the snippet policy.
    pub fn with_snippet_policy(mut self, policy: SnippetPolicy) -> Self {
        self.snippet_policy = policy;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    storage: RawStorage,
    catalog: RawCatalog,
    snippet: RawSnippet,
    genres: Vec<String>,
    decades: Vec<String>,
    status_tick_ms: u64,
    /// `0` disables the timeout.
    transition_timeout_secs: u64,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            storage: RawStorage::default(),
            catalog: RawCatalog::default(),
            snippet: RawSnippet::default(),
            genres: DEFAULT_GENRES.iter().map(|g| g.to_string()).collect(),
            decades: DEFAULT_DECADES.iter().map(|d| d.to_string()).collect(),
            status_tick_ms: DEFAULT_STATUS_TICK_MS,
            transition_timeout_secs: DEFAULT_TRANSITION_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawStorage {
    backend: StorageBackend,
    data_dir: PathBuf,
}

impl Default for RawStorage {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawCatalog {
    token_url: String,
    api_base_url: String,
    default_limit: u8,
}

impl Default for RawCatalog {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            default_limit: DEFAULT_TRACK_LIMIT,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawSnippet {
    length_secs: u64,
    preview_length_secs: u64,
}

impl Default for RawSnippet {
    fn default() -> Self {
        Self {
            length_secs: DEFAULT_SNIPPET_LENGTH_SECS,
            preview_length_secs: DEFAULT_PREVIEW_LENGTH_SECS,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let snippet_policy = SnippetPolicy::new(
            Duration::from_secs(value.snippet.length_secs.max(1)),
            Duration::from_secs(value.snippet.preview_length_secs),
        );
        let default_track_limit = value.catalog.default_limit.clamp(1, 50);

        Self {
            storage_backend: value.storage.backend,
            data_dir: value.storage.data_dir,
            token_url: value.catalog.token_url,
            api_base_url: value.catalog.api_base_url.trim_end_matches('/').to_string(),
            default_track_limit,
            snippet_policy,
            genres: value.genres,
            decades: value.decades,
            status_tick: Duration::from_millis(value.status_tick_ms.max(10)),
            transition_timeout: (value.transition_timeout_secs > 0)
                .then(|| Duration::from_secs(value.transition_timeout_secs)),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"storage": {"backend": "memory"}, "status_tick_ms": 100}"#)
                .unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.storage_backend(), StorageBackend::Memory);
        assert_eq!(config.data_dir(), &PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.status_tick(), Duration::from_millis(100));
        assert_eq!(config.genres().len(), DEFAULT_GENRES.len());
        assert_eq!(config.default_track_limit(), DEFAULT_TRACK_LIMIT);
    }

    #[test]
    fn zero_timeout_disables_transition_timeout() {
        let raw: RawConfig = serde_json::from_str(r#"{"transition_timeout_secs": 0}"#).unwrap();
        assert_eq!(AppConfig::from(raw).transition_timeout(), None);
    }

    #[test]
    fn api_base_url_is_normalised() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"catalog": {"api_base_url": "http://localhost:9000/v1/"}}"#)
                .unwrap();
        assert_eq!(AppConfig::from(raw).api_base_url(), "http://localhost:9000/v1");
    }
}
