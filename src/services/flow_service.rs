use tracing::{info, warn};

use crate::{
    dao::catalog::TrackQuery,
    dto::{
        flow::{CatalogRequest, DifficultyRequest, FlowSnapshotResponse, ToggleTeamResponse},
        game::TrackChangedEvent,
    },
    error::ServiceError,
    services::{game_service, sse_events},
    state::{
        GameUpdate, RouteUpdate, Screen, SharedState,
        flow::FlowEvent,
        game::GameSession,
        route::{
            CatalogSelection, DifficultyParams, DifficultyRange, ResultsParams, RouteError,
            RouteParams,
        },
    },
};

/// Current screen, params and team selection.
pub async fn flow_snapshot(state: &SharedState) -> FlowSnapshotResponse {
    state.flow_view().await.into()
}

/// Select or deselect a team on the team-select screen.
pub async fn toggle_team(
    state: &SharedState,
    team_id: String,
) -> Result<ToggleTeamResponse, ServiceError> {
    ensure_screen(state, Screen::TeamSelect).await?;

    if state.teams().read().await.get(&team_id).is_none() {
        return Err(ServiceError::NotFound(format!("team `{team_id}` not found")));
    }

    let response = {
        let mut selection = state.selection().write().await;
        let outcome = selection.toggle(&team_id);
        ToggleTeamResponse {
            outcome: outcome.into(),
            selected_team_ids: selection.ids().map(str::to_string).collect(),
        }
    };

    sse_events::broadcast_flow_changed(state).await;
    Ok(response)
}

/// TeamSelect → Difficulty with the two selected teams.
pub async fn confirm_teams(state: &SharedState) -> Result<FlowSnapshotResponse, ServiceError> {
    state
        .run_transition(FlowEvent::TeamsConfirmed, move || async move {
            let ids: Vec<String> = {
                let selection = state.selection().read().await;
                selection.ids().map(str::to_string).collect()
            };
            let teams = {
                let store = state.teams().read().await;
                ids.iter()
                    .map(|id| {
                        store
                            .get(id)
                            .cloned()
                            .ok_or_else(|| ServiceError::NotFound(format!("team `{id}` not found")))
                    })
                    .collect::<Result<Vec<_>, _>>()?
            };
            let params = DifficultyParams::new(teams)?;
            Ok::<_, ServiceError>(RouteUpdate::params(RouteParams::Difficulty(params)))
        })
        .await?;

    finish_transition(state).await
}

/// Difficulty → Genre with the chosen range.
pub async fn choose_difficulty(
    state: &SharedState,
    request: DifficultyRequest,
) -> Result<FlowSnapshotResponse, ServiceError> {
    let range = DifficultyRange::new(request.min, request.max)?;

    state
        .run_transition(FlowEvent::DifficultyChosen, move || async move {
            let params = match current_params(state).await {
                RouteParams::Difficulty(params) => params,
                other => return Err(wrong_screen(Screen::Difficulty, &other)),
            };
            let params = RouteParams::Genre(params.choose(range));
            Ok::<_, ServiceError>(RouteUpdate::params(params))
        })
        .await?;

    finish_transition(state).await
}

/// Genre → Game: fetch tracks for the selection and start a game session.
///
/// A catalog failure or an empty result leaves the flow on the genre screen.
pub async fn choose_catalog(
    state: &SharedState,
    request: CatalogRequest,
) -> Result<FlowSnapshotResponse, ServiceError> {
    let selection = CatalogSelection::new(request.genres, request.decades)?;
    let limit = request.limit;

    state
        .run_transition(FlowEvent::CatalogChosen, move || async move {
            let params = match current_params(state).await {
                RouteParams::Genre(params) => params,
                other => return Err(wrong_screen(Screen::Genre, &other)),
            };

            let tracks = state
                .catalog()
                .get_tracks(TrackQuery {
                    genres: selection.genres().to_vec(),
                    decades: selection.decades().to_vec(),
                    limit,
                })
                .await?;
            info!(
                genres = ?selection.genres(),
                decades = ?selection.decades(),
                tracks = tracks.len(),
                "fetched tracks"
            );

            let params = params.choose(selection, tracks)?;
            let session = GameSession::start(
                &params,
                state.config().snippet_policy(),
                state.audio_backend(),
            );

            Ok::<_, ServiceError>(RouteUpdate {
                params: RouteParams::Game(params),
                game: GameUpdate::Start(session),
                clear_selection: false,
            })
        })
        .await?;

    let started = state.game().read().await.as_ref().map(TrackChangedEvent::from);
    match started {
        Some(track) => {
            game_service::spawn_status_ticker(state.clone(), track.session_id);
            sse_events::broadcast_track_changed(state, &track);
        }
        None => warn!("game screen entered without a session"),
    }

    finish_transition(state).await
}

/// Return to the previous screen, discarding what was chosen after it.
pub async fn go_back(state: &SharedState) -> Result<FlowSnapshotResponse, ServiceError> {
    state
        .run_transition(FlowEvent::Back, move || async move {
            let params = current_params(state).await;
            let leaving_game = params.screen() == Screen::Game;
            Ok::<_, ServiceError>(RouteUpdate {
                params: params.back()?,
                game: if leaving_game {
                    GameUpdate::End
                } else {
                    GameUpdate::Keep
                },
                clear_selection: false,
            })
        })
        .await?;

    finish_transition(state).await
}

/// Game → Results, freezing the tally.
pub async fn finish_game(state: &SharedState) -> Result<FlowSnapshotResponse, ServiceError> {
    state
        .run_transition(FlowEvent::Finish, move || async move {
            let results = {
                let game = state.game().read().await;
                let session = game
                    .as_ref()
                    .ok_or_else(|| ServiceError::InvalidState("no game in progress".into()))?;
                ResultsParams::new(session.scores().to_vec(), session.rounds().to_vec())
            };
            Ok::<_, ServiceError>(RouteUpdate {
                params: RouteParams::Results(results),
                game: GameUpdate::End,
                clear_selection: false,
            })
        })
        .await?;

    finish_transition(state).await
}

/// Results → TeamSelect with an empty selection.
pub async fn restart(state: &SharedState) -> Result<FlowSnapshotResponse, ServiceError> {
    state
        .run_transition(FlowEvent::Restart, move || async move {
            Ok::<_, ServiceError>(RouteUpdate {
                params: RouteParams::TeamSelect,
                game: GameUpdate::Keep,
                clear_selection: true,
            })
        })
        .await?;

    finish_transition(state).await
}

async fn finish_transition(state: &SharedState) -> Result<FlowSnapshotResponse, ServiceError> {
    let snapshot = flow_snapshot(state).await;
    info!(screen = ?snapshot.screen, version = snapshot.version, "screen changed");
    sse_events::broadcast_flow_changed(state).await;
    Ok(snapshot)
}

async fn current_params(state: &SharedState) -> RouteParams {
    state.route().await.clone()
}

async fn ensure_screen(state: &SharedState, expected: Screen) -> Result<(), ServiceError> {
    let actual = state.snapshot().await.screen;
    if actual != expected {
        return Err(RouteError::WrongScreen { expected, actual }.into());
    }
    Ok(())
}

fn wrong_screen(expected: Screen, params: &RouteParams) -> ServiceError {
    RouteError::WrongScreen {
        expected,
        actual: params.screen(),
    }
    .into()
}
