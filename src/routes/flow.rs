use axum::{Json, Router, extract::State, routing::{get, post}};
use axum_valid::Valid;

use crate::{
    dto::flow::{
        CatalogRequest, DifficultyRequest, FlowSnapshotResponse, ToggleTeamRequest,
        ToggleTeamResponse,
    },
    error::AppError,
    services::flow_service,
    state::SharedState,
};

/// Screen flow endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/flow", get(get_flow))
        .route("/flow/teams/toggle", post(toggle_team))
        .route("/flow/teams/confirm", post(confirm_teams))
        .route("/flow/difficulty", post(choose_difficulty))
        .route("/flow/catalog", post(choose_catalog))
        .route("/flow/back", post(go_back))
        .route("/flow/finish", post(finish_game))
        .route("/flow/restart", post(restart))
}

#[utoipa::path(
    get,
    path = "/flow",
    tag = "flow",
    responses((status = 200, description = "Current screen and params", body = FlowSnapshotResponse))
)]
/// Current screen, its params and the team selection.
pub async fn get_flow(State(state): State<SharedState>) -> Json<FlowSnapshotResponse> {
    Json(flow_service::flow_snapshot(&state).await)
}

#[utoipa::path(
    post,
    path = "/flow/teams/toggle",
    tag = "flow",
    request_body = ToggleTeamRequest,
    responses(
        (status = 200, description = "Selection after the toggle", body = ToggleTeamResponse),
        (status = 404, description = "Unknown team"),
        (status = 409, description = "Not on the team-select screen")
    )
)]
/// Select or deselect a team; at most two can be selected.
pub async fn toggle_team(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<ToggleTeamRequest>>,
) -> Result<Json<ToggleTeamResponse>, AppError> {
    Ok(Json(flow_service::toggle_team(&state, request.team_id).await?))
}

#[utoipa::path(
    post,
    path = "/flow/teams/confirm",
    tag = "flow",
    responses(
        (status = 200, description = "Moved to the difficulty screen", body = FlowSnapshotResponse),
        (status = 409, description = "Two teams are not selected")
    )
)]
/// Continue with the two selected teams.
pub async fn confirm_teams(
    State(state): State<SharedState>,
) -> Result<Json<FlowSnapshotResponse>, AppError> {
    Ok(Json(flow_service::confirm_teams(&state).await?))
}

#[utoipa::path(
    post,
    path = "/flow/difficulty",
    tag = "flow",
    request_body = DifficultyRequest,
    responses(
        (status = 200, description = "Moved to the genre screen", body = FlowSnapshotResponse),
        (status = 400, description = "Inverted range"),
        (status = 409, description = "Not on the difficulty screen")
    )
)]
/// Continue with a difficulty range.
pub async fn choose_difficulty(
    State(state): State<SharedState>,
    Json(request): Json<DifficultyRequest>,
) -> Result<Json<FlowSnapshotResponse>, AppError> {
    Ok(Json(flow_service::choose_difficulty(&state, request).await?))
}

#[utoipa::path(
    post,
    path = "/flow/catalog",
    tag = "flow",
    request_body = CatalogRequest,
    responses(
        (status = 200, description = "Tracks fetched; moved to the game screen", body = FlowSnapshotResponse),
        (status = 400, description = "Nothing selected or malformed decade"),
        (status = 404, description = "No tracks match"),
        (status = 502, description = "Catalog failure"),
        (status = 503, description = "Catalog did not answer in time")
    )
)]
/// Fetch tracks for the chosen genres and decades and start the game.
pub async fn choose_catalog(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<CatalogRequest>>,
) -> Result<Json<FlowSnapshotResponse>, AppError> {
    Ok(Json(flow_service::choose_catalog(&state, request).await?))
}

#[utoipa::path(
    post,
    path = "/flow/back",
    tag = "flow",
    responses(
        (status = 200, description = "Moved to the previous screen", body = FlowSnapshotResponse),
        (status = 409, description = "No previous screen")
    )
)]
/// Return to the previous screen.
pub async fn go_back(
    State(state): State<SharedState>,
) -> Result<Json<FlowSnapshotResponse>, AppError> {
    Ok(Json(flow_service::go_back(&state).await?))
}

#[utoipa::path(
    post,
    path = "/flow/finish",
    tag = "flow",
    responses(
        (status = 200, description = "Moved to the results screen", body = FlowSnapshotResponse),
        (status = 409, description = "No game in progress")
    )
)]
/// End the game and show the results.
pub async fn finish_game(
    State(state): State<SharedState>,
) -> Result<Json<FlowSnapshotResponse>, AppError> {
    Ok(Json(flow_service::finish_game(&state).await?))
}

#[utoipa::path(
    post,
    path = "/flow/restart",
    tag = "flow",
    responses(
        (status = 200, description = "Back on the team-select screen", body = FlowSnapshotResponse),
        (status = 409, description = "Not on the results screen")
    )
)]
/// Leave the results for a new game.
pub async fn restart(
    State(state): State<SharedState>,
) -> Result<Json<FlowSnapshotResponse>, AppError> {
    Ok(Json(flow_service::restart(&state).await?))
}
