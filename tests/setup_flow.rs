use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{Json, extract::State};
use futures::future::BoxFuture;

use song_smash_back::{
    config::{AppConfig, StorageBackend},
    dao::{
        catalog::{AccessToken, CatalogClient, CatalogError, CatalogResult, CatalogTransport},
        kv_store::memory::MemoryKvStore,
        team_persistence::KeyValueTeamPersistence,
    },
    dto::{
        flow::{CatalogRequest, DifficultyRequest, RouteParamsDto, ToggleOutcomeDto},
        game::GuessRequest,
        team::TeamInput,
    },
    error::ServiceError,
    routes,
    services::{flow_service, game_service, team_service},
    state::{
        AppState, AudioFactory, Screen, SharedState,
        game::Track,
        playback::{AudioBackend, ClockPlayer},
        route::{Difficulty, RouteParams},
        teams::TeamStore,
    },
};

/// Catalog double answering every search with the same tracks, or failing when asked to.
#[derive(Default)]
struct ScriptedCatalog {
    tracks: Vec<Track>,
    fail: bool,
    searches: Mutex<Vec<(String, u8)>>,
}

impl CatalogTransport for ScriptedCatalog {
    fn request_token(&self) -> BoxFuture<'static, CatalogResult<AccessToken>> {
        Box::pin(async {
            Ok(AccessToken {
                value: "token".into(),
                expires_in: Duration::from_secs(3600),
            })
        })
    }

    fn search(
        &self,
        _token: String,
        query: String,
        limit: u8,
    ) -> BoxFuture<'static, CatalogResult<Vec<Track>>> {
        self.searches.lock().unwrap().push((query, limit));
        let fail = self.fail;
        let tracks = self.tracks.clone();
        Box::pin(async move {
            if fail {
                Err(CatalogError::SearchStatus {
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                })
            } else {
                Ok(tracks)
            }
        })
    }
}

fn track(id: &str) -> Track {
    Track {
        id: id.into(),
        name: format!("Song {id}"),
        artist: "Artist".into(),
        preview_url: Some(format!("https://p.example/{id}.mp3")),
        artwork_url: Some(format!("https://i.example/{id}.jpg")),
    }
}

async fn app(catalog: Arc<ScriptedCatalog>) -> SharedState {
    let config = AppConfig::default().with_storage_backend(StorageBackend::Memory);
    let persistence = Arc::new(KeyValueTeamPersistence::new(Arc::new(MemoryKvStore::new())));
    let teams = TeamStore::load(persistence).await.unwrap();
    let audio: AudioFactory = Arc::new(|| Box::new(ClockPlayer::new()) as Box<dyn AudioBackend>);
    AppState::new(
        config,
        teams,
        CatalogClient::new(catalog, 20),
        audio,
    )
}

async fn create_team(state: &SharedState, name: &str) -> String {
    team_service::create_team(
        state,
        TeamInput {
            name: name.into(),
            avatar_url: None,
            color_hex: None,
        },
    )
    .await
    .unwrap()
    .id
}

/// Teams A and B selected, range easy..hard, then on the genre screen.
async fn reach_genre_screen(state: &SharedState) -> (String, String) {
    let a = create_team(state, "A").await;
    let b = create_team(state, "B").await;
    let c = create_team(state, "C").await;

    flow_service::toggle_team(state, a.clone()).await.unwrap();
    flow_service::toggle_team(state, b.clone()).await.unwrap();
    let third = flow_service::toggle_team(state, c).await.unwrap();
    assert!(matches!(third.outcome, ToggleOutcomeDto::Full));
    assert_eq!(third.selected_team_ids, vec![a.clone(), b.clone()]);

    flow_service::confirm_teams(state).await.unwrap();
    flow_service::choose_difficulty(
        state,
        DifficultyRequest {
            min: Difficulty::Easy,
            max: Difficulty::Hard,
        },
    )
    .await
    .unwrap();
    (a, b)
}

fn pop_2010s() -> CatalogRequest {
    CatalogRequest {
        genres: vec!["Pop".into()],
        decades: vec!["2010s".into()],
        limit: None,
    }
}

#[tokio::test]
async fn choices_reach_the_game_screen_unchanged() {
    let catalog = Arc::new(ScriptedCatalog {
        tracks: vec![track("t1"), track("t2")],
        ..Default::default()
    });
    let state = app(catalog.clone()).await;
    let (a, b) = reach_genre_screen(&state).await;

    let snapshot = flow_service::choose_catalog(&state, pop_2010s()).await.unwrap();
    assert_eq!(snapshot.screen, Screen::Game);
    assert!(matches!(
        snapshot.params,
        RouteParamsDto::Game { track_count: 2, .. }
    ));

    match &*state.route().await {
        RouteParams::Game(params) => {
            let ids: Vec<&str> = params.teams().iter().map(|t| t.id.as_str()).collect();
            assert_eq!(ids, vec![a.as_str(), b.as_str()]);
            assert_eq!(params.difficulty_range().min(), Difficulty::Easy);
            assert_eq!(params.difficulty_range().max(), Difficulty::Hard);
            assert_eq!(params.genres(), ["Pop"]);
            assert_eq!(params.decades(), ["2010s"]);
            assert_eq!(params.tracks().len(), 2);
        }
        other => panic!("expected game params, got {other:?}"),
    }

    assert_eq!(
        catalog.searches.lock().unwrap().as_slice(),
        [(r#"genre:"Pop" year:2010-2019"#.to_string(), 20)]
    );

    let game = game_service::game_state(&state).await.unwrap();
    assert_eq!(game.track_count, 2);
    assert_eq!(game.scores.len(), 2);
    assert!(game.scores.iter().all(|entry| entry.score == 0));
}

#[tokio::test]
async fn guesses_credit_the_first_team_and_finish_freezes_the_tally() {
    let catalog = Arc::new(ScriptedCatalog {
        tracks: vec![track("t1"), track("t2")],
        ..Default::default()
    });
    let state = app(catalog).await;
    let (a, _) = reach_genre_screen(&state).await;
    flow_service::choose_catalog(&state, pop_2010s()).await.unwrap();

    let first = game_service::submit_guess(
        &state,
        GuessRequest {
            title: "Song t1".into(),
            artist: "Artist".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(first.credited_team_id, a);
    assert!(first.advanced);

    let last = game_service::submit_guess(&state, GuessRequest {
        title: String::new(),
        artist: String::new(),
    })
    .await
    .unwrap();
    assert!(!last.advanced);

    let snapshot = flow_service::finish_game(&state).await.unwrap();
    assert_eq!(snapshot.screen, Screen::Results);
    assert!(state.game().read().await.is_none());

    let results = game_service::results(&state).await.unwrap();
    assert_eq!(
        results
            .scores
            .iter()
            .map(|entry| (entry.team.name.as_str(), entry.score))
            .collect::<Vec<_>>(),
        vec![("A", 2), ("B", 0)]
    );
    assert_eq!(results.rounds.len(), 2);
    assert_eq!(results.rounds[0].guessed_title, "Song t1");

    let snapshot = flow_service::restart(&state).await.unwrap();
    assert_eq!(snapshot.screen, Screen::TeamSelect);
    assert!(snapshot.selected_team_ids.is_empty());
}

#[tokio::test]
async fn back_discards_the_downstream_choices() {
    let catalog = Arc::new(ScriptedCatalog {
        tracks: vec![track("t1")],
        ..Default::default()
    });
    let state = app(catalog).await;
    reach_genre_screen(&state).await;
    flow_service::choose_catalog(&state, pop_2010s()).await.unwrap();

    let snapshot = flow_service::go_back(&state).await.unwrap();
    assert_eq!(snapshot.screen, Screen::Genre);
    assert!(state.game().read().await.is_none());
    match &*state.route().await {
        RouteParams::Genre(params) => {
            assert_eq!(params.difficulty_range().max(), Difficulty::Hard)
        }
        other => panic!("expected genre params, got {other:?}"),
    }

    let snapshot = flow_service::go_back(&state).await.unwrap();
    assert_eq!(snapshot.screen, Screen::Difficulty);
    assert!(matches!(snapshot.params, RouteParamsDto::Difficulty { .. }));
}

#[tokio::test]
async fn failed_fetch_keeps_the_genre_screen() {
    let catalog = Arc::new(ScriptedCatalog {
        tracks: vec![track("t1")],
        fail: true,
        ..Default::default()
    });
    let state = app(catalog).await;
    reach_genre_screen(&state).await;

    let err = flow_service::choose_catalog(&state, pop_2010s())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Catalog(_)));

    let snapshot = flow_service::flow_snapshot(&state).await;
    assert_eq!(snapshot.screen, Screen::Genre);
    assert!(snapshot.pending.is_none());
    assert!(state.game().read().await.is_none());
}

#[tokio::test]
async fn empty_selection_and_early_events_are_rejected() {
    let state = app(Arc::new(ScriptedCatalog::default())).await;

    let err = flow_service::confirm_teams(&state).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    assert_eq!(flow_service::flow_snapshot(&state).await.screen, Screen::TeamSelect);

    let err = flow_service::go_back(&state).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    reach_genre_screen(&state).await;
    let err = flow_service::choose_catalog(
        &state,
        CatalogRequest {
            genres: vec![],
            decades: vec![],
            limit: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn game_screen_hands_out_the_preview_to_play() {
    let catalog = Arc::new(ScriptedCatalog {
        tracks: vec![track("t1"), track("t2")],
        ..Default::default()
    });
    let state = app(catalog).await;
    reach_genre_screen(&state).await;
    flow_service::choose_catalog(&state, pop_2010s()).await.unwrap();

    let Json(game) = routes::game::get_game(State(state.clone())).await.unwrap();
    let current = game.current.expect("current track");
    assert_eq!(
        current.preview_url.as_deref(),
        Some("https://p.example/t1.mp3")
    );
    let body = serde_json::to_value(&current).unwrap();
    assert!(body.get("name").is_none());
    assert!(body.get("artist").is_none());

    let mut events = state.public_sse().subscribe();
    let guess = game_service::submit_guess(
        &state,
        GuessRequest {
            title: String::new(),
            artist: String::new(),
        },
    )
    .await
    .unwrap();
    assert_eq!(
        guess.current.and_then(|current| current.preview_url).as_deref(),
        Some("https://p.example/t2.mp3")
    );

    let mut track_changed = None;
    while let Ok(event) = events.try_recv() {
        if event.event.as_deref() == Some("track.changed") {
            track_changed = Some(event.data);
        }
    }
    let payload: serde_json::Value =
        serde_json::from_str(&track_changed.expect("track.changed event")).unwrap();
    assert_eq!(payload["current_index"], 1);
    assert_eq!(
        payload["current"]["preview_url"],
        "https://p.example/t2.mp3"
    );
}
