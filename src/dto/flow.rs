//! DTOs of the setup flow: requests that drive the screens and the flow snapshot.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{game::ScoreDto, team::TeamSummary, validation::validate_decades},
    state::{
        FlowView, Screen,
        game::RoundRecord,
        route::{Difficulty, DifficultyRange, ResultsParams, RouteParams},
        selection::ToggleOutcome,
    },
};

/// Inclusive pair of difficulty tiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct DifficultyRangeDto {
    pub min: Difficulty,
    pub max: Difficulty,
}

impl From<DifficultyRange> for DifficultyRangeDto {
    fn from(range: DifficultyRange) -> Self {
        Self {
            min: range.min(),
            max: range.max(),
        }
    }
}

/// Toggle one team on the team-select screen.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ToggleTeamRequest {
    #[validate(length(min = 1))]
    pub team_id: String,
}

/// Result of a toggle.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcomeDto {
    Selected,
    Deselected,
    /// Two teams are already selected; nothing changed.
    Full,
}

impl From<ToggleOutcome> for ToggleOutcomeDto {
    fn from(outcome: ToggleOutcome) -> Self {
        match outcome {
            ToggleOutcome::Selected => ToggleOutcomeDto::Selected,
            ToggleOutcome::Deselected => ToggleOutcomeDto::Deselected,
            ToggleOutcome::Full => ToggleOutcomeDto::Full,
        }
    }
}

/// Selection after a toggle.
#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleTeamResponse {
    pub outcome: ToggleOutcomeDto,
    /// Selected team ids in pick order.
    pub selected_team_ids: Vec<String>,
}

/// Difficulty chosen on the slider; defaults to the full range.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DifficultyRequest {
    #[serde(default = "default_min")]
    pub min: Difficulty,
    #[serde(default = "default_max")]
    pub max: Difficulty,
}

fn default_min() -> Difficulty {
    DifficultyRange::default().min()
}

fn default_max() -> Difficulty {
    DifficultyRange::default().max()
}

/// Genres and decades chosen on the genre screen.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CatalogRequest {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_decades"))]
    pub decades: Vec<String>,
    /// Number of tracks to fetch (1 to 50).
    #[serde(default)]
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<u8>,
}

/// Params of the current screen, tagged by screen.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum RouteParamsDto {
    TeamSelect,
    Difficulty {
        teams: Vec<TeamSummary>,
    },
    Genre {
        teams: Vec<TeamSummary>,
        difficulty_range: DifficultyRangeDto,
    },
    Game {
        teams: Vec<TeamSummary>,
        difficulty_range: DifficultyRangeDto,
        genres: Vec<String>,
        decades: Vec<String>,
        /// Tracks are not listed so titles stay hidden while guessing.
        track_count: usize,
    },
    Results(ResultsResponse),
}

impl From<&RouteParams> for RouteParamsDto {
    fn from(params: &RouteParams) -> Self {
        match params {
            RouteParams::TeamSelect => RouteParamsDto::TeamSelect,
            RouteParams::Difficulty(params) => RouteParamsDto::Difficulty {
                teams: params.teams().iter().map(TeamSummary::from).collect(),
            },
            RouteParams::Genre(params) => RouteParamsDto::Genre {
                teams: params.teams().iter().map(TeamSummary::from).collect(),
                difficulty_range: params.difficulty_range().into(),
            },
            RouteParams::Game(params) => RouteParamsDto::Game {
                teams: params.teams().iter().map(TeamSummary::from).collect(),
                difficulty_range: params.difficulty_range().into(),
                genres: params.genres().to_vec(),
                decades: params.decades().to_vec(),
                track_count: params.tracks().len(),
            },
            RouteParams::Results(params) => RouteParamsDto::Results(params.into()),
        }
    }
}

/// One played track with the guess submitted for it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundDto {
    pub track_name: String,
    pub track_artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artwork_url: Option<String>,
    pub guessed_title: String,
    pub guessed_artist: String,
    pub credited_team_id: String,
}

impl From<&RoundRecord> for RoundDto {
    fn from(round: &RoundRecord) -> Self {
        Self {
            track_name: round.track.name.clone(),
            track_artist: round.track.artist.clone(),
            artwork_url: round.track.artwork_url.clone(),
            guessed_title: round.guess.title.clone(),
            guessed_artist: round.guess.artist.clone(),
            credited_team_id: round.credited_team_id.clone(),
        }
    }
}

/// Current screen with its params; also the payload of `flow.changed` events.
#[derive(Debug, Serialize, ToSchema)]
pub struct FlowSnapshotResponse {
    pub screen: Screen,
    /// Incremented on every screen change.
    pub version: usize,
    /// Target of a transition in progress.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<Screen>,
    /// Teams toggled on the team-select screen, in pick order.
    pub selected_team_ids: Vec<String>,
    pub params: RouteParamsDto,
}

impl From<FlowView> for FlowSnapshotResponse {
    fn from(view: FlowView) -> Self {
        Self {
            screen: view.snapshot.screen,
            version: view.snapshot.version,
            pending: view.snapshot.pending,
            selected_team_ids: view.selection,
            params: RouteParamsDto::from(&view.params),
        }
    }
}

/// Final tally shown on the results screen.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultsResponse {
    /// Per-team scores in team-select order.
    pub scores: Vec<ScoreDto>,
    pub rounds: Vec<RoundDto>,
    /// RFC 3339 timestamp.
    pub finished_at: String,
}

impl From<&ResultsParams> for ResultsResponse {
    fn from(params: &ResultsParams) -> Self {
        Self {
            scores: params.scores().iter().map(ScoreDto::from).collect(),
            rounds: params.rounds().iter().map(RoundDto::from).collect(),
            finished_at: params.finished_at().to_string(),
        }
    }
}
