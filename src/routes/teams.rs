use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use axum_valid::Valid;

use crate::{
    dto::team::{TeamInput, TeamSummary},
    error::AppError,
    services::team_service,
    state::SharedState,
};

/// Team management endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/teams", get(list_teams).post(create_team))
        .route("/teams/{id}", put(update_team).delete(delete_team))
}

#[utoipa::path(
    get,
    path = "/teams",
    tag = "teams",
    responses((status = 200, description = "Known teams in creation order", body = [TeamSummary]))
)]
/// List every team.
pub async fn list_teams(State(state): State<SharedState>) -> Json<Vec<TeamSummary>> {
    Json(team_service::list_teams(&state).await)
}

#[utoipa::path(
    post,
    path = "/teams",
    tag = "teams",
    request_body = TeamInput,
    responses(
        (status = 201, description = "Team created", body = TeamSummary),
        (status = 400, description = "Invalid team"),
        (status = 503, description = "Storage unavailable")
    )
)]
/// Create a team and persist the list.
pub async fn create_team(
    State(state): State<SharedState>,
    Valid(Json(input)): Valid<Json<TeamInput>>,
) -> Result<(StatusCode, Json<TeamSummary>), AppError> {
    let team = team_service::create_team(&state, input).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

#[utoipa::path(
    put,
    path = "/teams/{id}",
    tag = "teams",
    params(("id" = String, Path, description = "Team id")),
    request_body = TeamInput,
    responses(
        (status = 200, description = "Team updated", body = TeamSummary),
        (status = 404, description = "Unknown team"),
        (status = 503, description = "Storage unavailable")
    )
)]
/// Edit a team's name, avatar and color.
pub async fn update_team(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(input)): Valid<Json<TeamInput>>,
) -> Result<Json<TeamSummary>, AppError> {
    Ok(Json(team_service::update_team(&state, id, input).await?))
}

#[utoipa::path(
    delete,
    path = "/teams/{id}",
    tag = "teams",
    params(("id" = String, Path, description = "Team id")),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 404, description = "Unknown team"),
        (status = 503, description = "Storage unavailable")
    )
)]
/// Delete a team.
pub async fn delete_team(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    team_service::delete_team(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
