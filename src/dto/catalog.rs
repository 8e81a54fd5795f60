use serde::Serialize;
use utoipa::ToSchema;

use crate::{dto::flow::DifficultyRangeDto, state::route::Difficulty};

/// Choices offered on the difficulty and genre/decade screens.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogOptionsResponse {
    pub genres: Vec<String>,
    pub decades: Vec<String>,
    /// Difficulty tiers, easiest first.
    pub difficulties: Vec<Difficulty>,
    /// Range preselected on the difficulty slider.
    pub default_difficulty: DifficultyRangeDto,
    /// Number of tracks fetched when a request does not say.
    pub default_track_limit: u8,
}
