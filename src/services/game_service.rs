use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::{
        flow::ResultsResponse,
        game::{
            GameStateResponse, GuessRequest, GuessResponse, PlaybackDto, PlaybackStatusRequest,
            ScoreDto, SeekRequest, TrackChangedEvent,
        },
    },
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        game::{GameSession, Guess},
        playback::BackendStatus,
        route::RouteParams,
    },
};

/// Game screen state: current artwork, playback and scores.
pub async fn game_state(state: &SharedState) -> Result<GameStateResponse, ServiceError> {
    let game = state.game().read().await;
    let session = game.as_ref().ok_or_else(no_game)?;
    Ok(GameStateResponse::from(session))
}

/// Running tally.
pub async fn scores(state: &SharedState) -> Result<Vec<ScoreDto>, ServiceError> {
    let game = state.game().read().await;
    let session = game.as_ref().ok_or_else(no_game)?;
    Ok(session.scores().iter().map(ScoreDto::from).collect())
}

/// Play or pause the current snippet.
pub async fn toggle_playback(state: &SharedState) -> Result<PlaybackDto, ServiceError> {
    let playback = with_session_mut(state, |session| {
        let next = session.toggle_playback()?;
        debug!(state = ?next, "playback toggled");
        Ok(PlaybackDto::from(session.playback()))
    })
    .await?;

    sse_events::broadcast_playback_changed(state, &playback);
    Ok(playback)
}

/// Scrub to a position relative to the snippet start.
pub async fn seek(state: &SharedState, request: SeekRequest) -> Result<PlaybackDto, ServiceError> {
    let playback = with_session_mut(state, |session| {
        let offset = session
            .playback()
            .snippet
            .map(|snippet| snippet.offset_ms)
            .unwrap_or(0);
        session.seek(offset.saturating_add(request.position_ms))?;
        Ok(PlaybackDto::from(session.playback()))
    })
    .await?;

    sse_events::broadcast_playback_changed(state, &playback);
    Ok(playback)
}

/// Apply a status reported by the device playing the preview.
pub async fn report_status(
    state: &SharedState,
    request: PlaybackStatusRequest,
) -> Result<PlaybackDto, ServiceError> {
    let (changed, playback) = with_session_mut(state, |session| {
        let changed = session.report_status(BackendStatus {
            position_ms: request.position_ms,
            is_playing: request.is_playing,
        });
        Ok((changed, PlaybackDto::from(session.playback())))
    })
    .await?;

    if changed {
        sse_events::broadcast_playback_changed(state, &playback);
    }
    Ok(playback)
}

/// Record a guess for the current track and move on.
pub async fn submit_guess(
    state: &SharedState,
    request: GuessRequest,
) -> Result<GuessResponse, ServiceError> {
    let (outcome, scores, track) = with_session_mut(state, |session| {
        let outcome = session.submit_guess(Guess {
            title: request.title.trim().to_string(),
            artist: request.artist.trim().to_string(),
        });
        let scores: Vec<ScoreDto> = session.scores().iter().map(ScoreDto::from).collect();
        Ok((outcome, scores, TrackChangedEvent::from(&*session)))
    })
    .await?;

    info!(
        credited_team_id = %outcome.credited_team_id,
        advanced = outcome.advanced,
        current_index = outcome.current_index,
        "guess recorded"
    );
    sse_events::broadcast_score_changed(state, scores.clone());
    if outcome.advanced {
        sse_events::broadcast_track_changed(state, &track);
        sse_events::broadcast_playback_changed(state, &track.playback);
    }
    Ok(GuessResponse::new(outcome, track.current, scores))
}

/// Final tally once the flow reached the results screen.
pub async fn results(state: &SharedState) -> Result<ResultsResponse, ServiceError> {
    match &*state.route().await {
        RouteParams::Results(params) => Ok(ResultsResponse::from(params)),
        other => Err(ServiceError::InvalidState(format!(
            "results are not available on the {:?} screen",
            other.screen()
        ))),
    }
}

/// Poll the session's player until the session ends, broadcasting playback changes.
///
/// The ticker stops on its own once the session is torn down or replaced.
pub fn spawn_status_ticker(state: SharedState, session_id: Uuid) -> JoinHandle<()> {
    let period = state.config().status_tick();
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(%session_id, period_ms = period.as_millis() as u64, "status ticker started");

        loop {
            ticker.tick().await;
            let changed = {
                let mut game = state.game().write().await;
                match game.as_mut() {
                    Some(session) if session.id() == session_id => session
                        .poll_playback()
                        .then(|| PlaybackDto::from(session.playback())),
                    _ => break,
                }
            };
            if let Some(playback) = changed {
                sse_events::broadcast_playback_changed(&state, &playback);
            }
        }

        debug!(%session_id, "status ticker stopped");
    })
}

async fn with_session_mut<F, T>(state: &SharedState, f: F) -> Result<T, ServiceError>
where
    F: FnOnce(&mut GameSession) -> Result<T, ServiceError>,
{
    let mut game = state.game().write().await;
    let session = game.as_mut().ok_or_else(no_game)?;
    f(session)
}

fn no_game() -> ServiceError {
    ServiceError::InvalidState("no game in progress".into())
}
