use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::team::TeamSummary,
    state::{
        game::{GameSession, GuessOutcome, ScoreEntry},
        playback::{PlaybackSnapshot, PlaybackState},
    },
};

/// Score of one team.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreDto {
    pub team: TeamSummary,
    pub score: u32,
}

impl From<&ScoreEntry> for ScoreDto {
    fn from(entry: &ScoreEntry) -> Self {
        Self {
            team: TeamSummary::from(&entry.team),
            score: entry.score,
        }
    }
}

/// Audio lifecycle of the current track.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStateDto {
    NotLoaded,
    Paused,
    Playing,
}

impl From<PlaybackState> for PlaybackStateDto {
    fn from(state: PlaybackState) -> Self {
        match state {
            PlaybackState::NotLoaded => PlaybackStateDto::NotLoaded,
            PlaybackState::Paused => PlaybackStateDto::Paused,
            PlaybackState::Playing => PlaybackStateDto::Playing,
        }
    }
}

/// Playback view; also the payload of `playback.changed` events.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlaybackDto {
    pub state: PlaybackStateDto,
    /// Absolute position inside the preview.
    pub position_ms: u64,
    /// Position relative to the snippet start.
    pub elapsed_ms: u64,
    pub snippet_offset_ms: u64,
    pub snippet_length_ms: u64,
    /// True once the snippet end stopped playback.
    pub clamped: bool,
}

impl From<PlaybackSnapshot> for PlaybackDto {
    fn from(snapshot: PlaybackSnapshot) -> Self {
        Self {
            state: snapshot.state.into(),
            position_ms: snapshot.position_ms,
            elapsed_ms: snapshot.elapsed_ms(),
            snippet_offset_ms: snapshot.snippet.map(|s| s.offset_ms).unwrap_or(0),
            snippet_length_ms: snapshot.snippet.map(|s| s.length_ms).unwrap_or(0),
            clamped: snapshot.clamped,
        }
    }
}

/// What the game screen shows of the current track. Title and artist stay hidden.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentTrackDto {
    /// Preview the playing device loads; the snippet window is in [`PlaybackDto`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artwork_url: Option<String>,
    /// False when the catalog had no preview; playback stays unloaded.
    pub has_preview: bool,
}

impl CurrentTrackDto {
    /// Current track of `session`, `None` once every track was played.
    pub fn of(session: &GameSession) -> Option<Self> {
        session.current_track().map(|current| Self {
            preview_url: current.track.preview_url.clone(),
            artwork_url: current.track.artwork_url.clone(),
            has_preview: current.track.preview_url.is_some(),
        })
    }
}

/// Game screen state.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameStateResponse {
    pub session_id: Uuid,
    pub current_index: usize,
    pub track_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentTrackDto>,
    pub playback: PlaybackDto,
    pub scores: Vec<ScoreDto>,
}

impl From<&GameSession> for GameStateResponse {
    fn from(session: &GameSession) -> Self {
        Self {
            session_id: session.id(),
            current_index: session.current_index(),
            track_count: session.track_count(),
            current: CurrentTrackDto::of(session),
            playback: session.playback().into(),
            scores: session.scores().iter().map(ScoreDto::from).collect(),
        }
    }
}

/// Scrub request, relative to the snippet start.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SeekRequest {
    pub position_ms: u64,
}

/// Status reported by the device playing the preview.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaybackStatusRequest {
    /// Absolute position inside the preview.
    pub position_ms: u64,
    pub is_playing: bool,
}

/// Free-text answer for the current track.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GuessRequest {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub artist: String,
}

/// Result of a guess.
#[derive(Debug, Serialize, ToSchema)]
pub struct GuessResponse {
    pub credited_team_id: String,
    /// False when the guess was for the last track.
    pub advanced: bool,
    pub current_index: usize,
    /// Track now on screen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentTrackDto>,
    pub scores: Vec<ScoreDto>,
}

impl GuessResponse {
    /// Combine the outcome with the updated tally and the track now on screen.
    pub fn new(
        outcome: GuessOutcome,
        current: Option<CurrentTrackDto>,
        scores: Vec<ScoreDto>,
    ) -> Self {
        Self {
            credited_team_id: outcome.credited_team_id,
            advanced: outcome.advanced,
            current_index: outcome.current_index,
            current,
            scores,
        }
    }
}

/// Payload of `track.changed` events, sent when a session starts and on every advance.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackChangedEvent {
    pub session_id: Uuid,
    pub current_index: usize,
    pub track_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentTrackDto>,
    pub playback: PlaybackDto,
}

impl From<&GameSession> for TrackChangedEvent {
    fn from(session: &GameSession) -> Self {
        Self {
            session_id: session.id(),
            current_index: session.current_index(),
            track_count: session.track_count(),
            current: CurrentTrackDto::of(session),
            playback: session.playback().into(),
        }
    }
}

/// Payload of `score.changed` events.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreChangedEvent {
    pub scores: Vec<ScoreDto>,
}
