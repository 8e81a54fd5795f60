use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for SongSmash Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::teams::list_teams,
        crate::routes::teams::create_team,
        crate::routes::teams::update_team,
        crate::routes::teams::delete_team,
        crate::routes::catalog::catalog_options,
        crate::routes::flow::get_flow,
        crate::routes::flow::toggle_team,
        crate::routes::flow::confirm_teams,
        crate::routes::flow::choose_difficulty,
        crate::routes::flow::choose_catalog,
        crate::routes::flow::go_back,
        crate::routes::flow::finish_game,
        crate::routes::flow::restart,
        crate::routes::game::get_game,
        crate::routes::game::toggle_playback,
        crate::routes::game::seek,
        crate::routes::game::report_status,
        crate::routes::game::submit_guess,
        crate::routes::game::get_scores,
        crate::routes::game::get_results,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::InfoMessage,
            crate::dto::team::TeamSummary,
            crate::dto::team::TeamInput,
            crate::dto::team::TeamDeletedEvent,
            crate::dto::catalog::CatalogOptionsResponse,
            crate::dto::flow::DifficultyRangeDto,
            crate::dto::flow::ToggleTeamRequest,
            crate::dto::flow::ToggleTeamResponse,
            crate::dto::flow::ToggleOutcomeDto,
            crate::dto::flow::DifficultyRequest,
            crate::dto::flow::CatalogRequest,
            crate::dto::flow::RouteParamsDto,
            crate::dto::flow::RoundDto,
            crate::dto::flow::FlowSnapshotResponse,
            crate::dto::flow::ResultsResponse,
            crate::dto::game::ScoreDto,
            crate::dto::game::PlaybackStateDto,
            crate::dto::game::PlaybackDto,
            crate::dto::game::CurrentTrackDto,
            crate::dto::game::GameStateResponse,
            crate::dto::game::SeekRequest,
            crate::dto::game::PlaybackStatusRequest,
            crate::dto::game::GuessRequest,
            crate::dto::game::GuessResponse,
            crate::dto::game::ScoreChangedEvent,
            crate::dto::game::TrackChangedEvent,
            crate::state::Screen,
            crate::state::route::Difficulty,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "teams", description = "Team management"),
        (name = "catalog", description = "Genre, decade and difficulty options"),
        (name = "flow", description = "Screen flow from team selection to results"),
        (name = "game", description = "Playback, guesses and scores"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_flow_and_game_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/teams", "/flow/catalog", "/game/playback/status", "/results"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
