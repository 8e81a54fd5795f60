use axum::{Json, Router, extract::State, routing::{get, post}};
use axum_valid::Valid;

use crate::{
    dto::{
        flow::ResultsResponse,
        game::{
            GameStateResponse, GuessRequest, GuessResponse, PlaybackDto, PlaybackStatusRequest,
            ScoreDto, SeekRequest,
        },
    },
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Game and results screen endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game", get(get_game))
        .route("/game/playback/toggle", post(toggle_playback))
        .route("/game/playback/seek", post(seek))
        .route("/game/playback/status", post(report_status))
        .route("/game/guess", post(submit_guess))
        .route("/game/scores", get(get_scores))
        .route("/results", get(get_results))
}

#[utoipa::path(
    get,
    path = "/game",
    tag = "game",
    responses(
        (status = 200, description = "Current track artwork, playback and scores", body = GameStateResponse),
        (status = 409, description = "No game in progress")
    )
)]
/// Game screen state.
pub async fn get_game(
    State(state): State<SharedState>,
) -> Result<Json<GameStateResponse>, AppError> {
    Ok(Json(game_service::game_state(&state).await?))
}

#[utoipa::path(
    post,
    path = "/game/playback/toggle",
    tag = "game",
    responses(
        (status = 200, description = "Playback after the toggle", body = PlaybackDto),
        (status = 409, description = "No game in progress")
    )
)]
/// Play or pause the snippet.
pub async fn toggle_playback(
    State(state): State<SharedState>,
) -> Result<Json<PlaybackDto>, AppError> {
    Ok(Json(game_service::toggle_playback(&state).await?))
}

#[utoipa::path(
    post,
    path = "/game/playback/seek",
    tag = "game",
    request_body = SeekRequest,
    responses(
        (status = 200, description = "Playback after scrubbing", body = PlaybackDto),
        (status = 409, description = "Nothing loaded")
    )
)]
/// Scrub inside the snippet.
pub async fn seek(
    State(state): State<SharedState>,
    Json(request): Json<SeekRequest>,
) -> Result<Json<PlaybackDto>, AppError> {
    Ok(Json(game_service::seek(&state, request).await?))
}

#[utoipa::path(
    post,
    path = "/game/playback/status",
    tag = "game",
    request_body = PlaybackStatusRequest,
    responses(
        (status = 200, description = "Playback after applying the status", body = PlaybackDto),
        (status = 409, description = "No game in progress")
    )
)]
/// Status callback from the device playing the preview.
pub async fn report_status(
    State(state): State<SharedState>,
    Json(request): Json<PlaybackStatusRequest>,
) -> Result<Json<PlaybackDto>, AppError> {
    Ok(Json(game_service::report_status(&state, request).await?))
}

#[utoipa::path(
    post,
    path = "/game/guess",
    tag = "game",
    request_body = GuessRequest,
    responses(
        (status = 200, description = "Guess recorded", body = GuessResponse),
        (status = 409, description = "No game in progress")
    )
)]
/// Submit a title/artist guess for the current track.
pub async fn submit_guess(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<GuessRequest>>,
) -> Result<Json<GuessResponse>, AppError> {
    Ok(Json(game_service::submit_guess(&state, request).await?))
}

#[utoipa::path(
    get,
    path = "/game/scores",
    tag = "game",
    responses(
        (status = 200, description = "Running tally", body = [ScoreDto]),
        (status = 409, description = "No game in progress")
    )
)]
/// Running tally.
pub async fn get_scores(State(state): State<SharedState>) -> Result<Json<Vec<ScoreDto>>, AppError> {
    Ok(Json(game_service::scores(&state).await?))
}

#[utoipa::path(
    get,
    path = "/results",
    tag = "game",
    responses(
        (status = 200, description = "Final tally", body = ResultsResponse),
        (status = 409, description = "Not on the results screen")
    )
)]
/// Final tally.
pub async fn get_results(
    State(state): State<SharedState>,
) -> Result<Json<ResultsResponse>, AppError> {
    Ok(Json(game_service::results(&state).await?))
}
