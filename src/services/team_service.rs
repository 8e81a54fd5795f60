use tracing::info;

use crate::{
    dto::team::{TeamInput, TeamSummary},
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// All teams in creation order.
pub async fn list_teams(state: &SharedState) -> Vec<TeamSummary> {
    let store = state.teams().read().await;
    store.teams().iter().map(TeamSummary::from).collect()
}

/// Create a team with a timestamp id and persist the list.
pub async fn create_team(
    state: &SharedState,
    input: TeamInput,
) -> Result<TeamSummary, ServiceError> {
    let team = {
        let mut store = state.teams().write().await;
        let id = store.next_id();
        store.add(input.into_team(id)).await?
    };

    info!(team_id = %team.id, name = %team.name, "team created");
    let summary = TeamSummary::from(&team);
    sse_events::broadcast_team_created(state, &summary);
    Ok(summary)
}

/// Replace a team's name, avatar and color; the id is kept.
pub async fn update_team(
    state: &SharedState,
    id: String,
    input: TeamInput,
) -> Result<TeamSummary, ServiceError> {
    let team = {
        let mut store = state.teams().write().await;
        store.edit(input.into_team(id)).await?
    };

    info!(team_id = %team.id, "team updated");
    let summary = TeamSummary::from(&team);
    sse_events::broadcast_team_updated(state, &summary);
    Ok(summary)
}

/// Delete a team and drop it from the team-select toggles.
pub async fn delete_team(state: &SharedState, id: String) -> Result<(), ServiceError> {
    {
        let mut store = state.teams().write().await;
        store.remove(&id).await?;
    }
    info!(team_id = %id, "team deleted");
    sse_events::broadcast_team_deleted(state, &id);

    let forgotten = state.selection().write().await.forget(&id);
    if forgotten {
        sse_events::broadcast_flow_changed(state).await;
    }
    Ok(())
}
