use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the team storage answers.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let (persistence, teams) = {
        let store = state.teams().read().await;
        (store.persistence().clone(), store.teams().len())
    };

    match persistence.health_check().await {
        Ok(()) => HealthResponse::ok(teams),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::degraded(teams)
        }
    }
}
