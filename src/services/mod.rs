/// OpenAPI documentation generation.
pub mod documentation;
/// Setup flow: team selection and screen transitions.
pub mod flow_service;
/// Game screen: playback, guesses and scores.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Team management.
pub mod team_service;
