use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        flow::FlowSnapshotResponse,
        game::{PlaybackDto, ScoreChangedEvent, ScoreDto, TrackChangedEvent},
        sse::ServerEvent,
        team::{TeamDeletedEvent, TeamSummary},
    },
    state::SharedState,
};

const EVENT_TEAM_CREATED: &str = "team.created";
const EVENT_TEAM_UPDATED: &str = "team.updated";
const EVENT_TEAM_DELETED: &str = "team.deleted";
const EVENT_FLOW_CHANGED: &str = "flow.changed";
const EVENT_PLAYBACK_CHANGED: &str = "playback.changed";
const EVENT_SCORE_CHANGED: &str = "score.changed";
const EVENT_TRACK_CHANGED: &str = "track.changed";

/// Broadcast a newly created team.
pub fn broadcast_team_created(state: &SharedState, team: &TeamSummary) {
    send_public_event(state, EVENT_TEAM_CREATED, team);
}

/// Broadcast an edited team.
pub fn broadcast_team_updated(state: &SharedState, team: &TeamSummary) {
    send_public_event(state, EVENT_TEAM_UPDATED, team);
}

/// Broadcast the id of a deleted team.
pub fn broadcast_team_deleted(state: &SharedState, team_id: &str) {
    let payload = TeamDeletedEvent {
        team_id: team_id.to_string(),
    };
    send_public_event(state, EVENT_TEAM_DELETED, &payload);
}

/// Broadcast the current screen, params and selection.
pub async fn broadcast_flow_changed(state: &SharedState) {
    let payload = FlowSnapshotResponse::from(state.flow_view().await);
    send_public_event(state, EVENT_FLOW_CHANGED, &payload);
}

/// Broadcast the playback view of the current track.
pub fn broadcast_playback_changed(state: &SharedState, playback: &PlaybackDto) {
    send_public_event(state, EVENT_PLAYBACK_CHANGED, playback);
}

/// Broadcast the track now on screen with its preview URL.
pub fn broadcast_track_changed(state: &SharedState, track: &TrackChangedEvent) {
    send_public_event(state, EVENT_TRACK_CHANGED, track);
}

/// Broadcast the running tally.
pub fn broadcast_score_changed(state: &SharedState, scores: Vec<ScoreDto>) {
    let payload = ScoreChangedEvent { scores };
    send_public_event(state, EVENT_SCORE_CHANGED, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
