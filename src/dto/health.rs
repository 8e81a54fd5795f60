use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the team storage does not answer.
    pub status: String,
    /// Number of teams held in memory.
    pub teams: usize,
}

impl HealthResponse {
    /// Storage answered.
    pub fn ok(teams: usize) -> Self {
        Self {
            status: "ok".to_string(),
            teams,
        }
    }

    /// Storage check failed.
    pub fn degraded(teams: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            teams,
        }
    }
}
