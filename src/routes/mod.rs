use axum::Router;

use crate::state::SharedState;

pub mod catalog;
pub mod docs;
pub mod flow;
pub mod game;
pub mod health;
pub mod sse;
pub mod teams;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(teams::router())
        .merge(catalog::router())
        .merge(flow::router())
        .merge(game::router());

    api_router.merge(docs::router()).with_state(state)
}
