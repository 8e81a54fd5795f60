//! SongSmash Back binary entrypoint wiring storage, the catalog client, REST and SSE layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use song_smash_back::{
    config::{AppConfig, StorageBackend},
    dao::{
        catalog::{CatalogClient, CatalogCredentials, HttpCatalogTransport},
        kv_store::{KeyValueStore, file::FileKvStore, memory::MemoryKvStore},
        team_persistence::KeyValueTeamPersistence,
    },
    routes,
    state::{
        AppState, AudioFactory, SharedState,
        playback::{AudioBackend, ClockPlayer},
        teams::TeamStore,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();

    let kv_store = open_kv_store(&config).await?;
    let persistence = Arc::new(KeyValueTeamPersistence::new(kv_store));
    let teams = TeamStore::load(persistence)
        .await
        .context("loading teams from storage")?;

    let credentials = match CatalogCredentials::from_env() {
        Ok(credentials) => Some(credentials),
        Err(err) => {
            warn!(error = %err, "catalog credentials missing; track fetches will fail");
            None
        }
    };
    let transport = HttpCatalogTransport::new(
        config.token_url(),
        config.api_base_url(),
        credentials,
    )
    .context("building catalog transport")?;
    let catalog = CatalogClient::new(Arc::new(transport), config.default_track_limit());

    let audio: AudioFactory = Arc::new(|| Box::new(ClockPlayer::new()) as Box<dyn AudioBackend>);

    let app_state = AppState::new(config, teams, catalog, audio);
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Open the configured key-value backend.
async fn open_kv_store(config: &AppConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    match config.storage_backend() {
        StorageBackend::File => {
            let store = FileKvStore::open(config.data_dir().clone())
                .await
                .with_context(|| {
                    format!("opening data directory {}", config.data_dir().display())
                })?;
            info!(path = %config.data_dir().display(), "using file storage");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            warn!("using in-memory storage; teams are lost on restart");
            Ok(Arc::new(MemoryKvStore::new()))
        }
        StorageBackend::Couchdb => open_couch_store().await,
    }
}

#[cfg(feature = "couch-store")]
async fn open_couch_store() -> anyhow::Result<Arc<dyn KeyValueStore>> {
    use song_smash_back::dao::kv_store::couchdb::{CouchConfig, CouchKvStore};

    let couch_config = CouchConfig::from_env().context("reading CouchDB configuration")?;
    let store = CouchKvStore::connect(couch_config)
        .await
        .context("connecting to CouchDB")?;
    info!("using CouchDB storage");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "couch-store"))]
async fn open_couch_store() -> anyhow::Result<Arc<dyn KeyValueStore>> {
    anyhow::bail!("CouchDB storage requires the `couch-store` feature")
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
