use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::catalog::CatalogOptionsResponse,
    state::{
        SharedState,
        route::{Difficulty, DifficultyRange},
    },
};

/// Catalog-related read endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route("/catalog/options", get(catalog_options))
}

#[utoipa::path(
    get,
    path = "/catalog/options",
    tag = "catalog",
    responses((status = 200, description = "Genres, decades and difficulty tiers", body = CatalogOptionsResponse))
)]
/// Choices offered on the difficulty and genre screens.
pub async fn catalog_options(State(state): State<SharedState>) -> Json<CatalogOptionsResponse> {
    let config = state.config();
    Json(CatalogOptionsResponse {
        genres: config.genres().to_vec(),
        decades: config.decades().to_vec(),
        difficulties: Difficulty::ALL.to_vec(),
        default_difficulty: DifficultyRange::default().into(),
        default_track_limit: config.default_track_limit(),
    })
}
