pub mod flow;
pub mod game;
pub mod playback;
pub mod route;
pub mod selection;
mod sse;
pub mod teams;

use std::{future::Future, sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    dao::catalog::CatalogClient,
    error::ServiceError,
    state::{
        game::GameSession, playback::AudioBackend, route::RouteParams, selection::TeamSelection,
        teams::TeamStore,
    },
};

pub use self::flow::{AbortError, ApplyError, Plan, PlanError, PlanId, Screen, Snapshot};
pub use self::sse::SseHub;
use self::flow::{FlowEvent, SetupFlow};

pub type SharedState = Arc<AppState>;

/// Builds the audio backend of a new game session.
pub type AudioFactory = Arc<dyn Fn() -> Box<dyn AudioBackend> + Send + Sync>;

/// What happens to the running game session when a transition commits.
pub enum GameUpdate {
    /// Leave the session as it is.
    Keep,
    /// Replace any running session with this one.
    Start(GameSession),
    /// Tear the running session down, releasing its audio.
    End,
}

/// State installed together with a committed transition.
pub struct RouteUpdate {
    /// Params of the screen being entered.
    pub params: RouteParams,
    /// Effect on the running game session.
    pub game: GameUpdate,
    /// Empty the team-select toggles.
    pub clear_selection: bool,
}

impl RouteUpdate {
    /// New params, session untouched.
    pub fn params(params: RouteParams) -> Self {
        Self {
            params,
            game: GameUpdate::Keep,
            clear_selection: false,
        }
    }
}

/// Consistent view of the flow for readers.
pub struct FlowView {
    /// State machine snapshot.
    pub snapshot: Snapshot,
    /// Params of the current screen.
    pub params: RouteParams,
    /// Selected team ids in selection order.
    pub selection: Vec<String>,
}

/// Central application state shared by every handler.
///
/// Lock order is flow, route, game, selection, teams.
pub struct AppState {
    config: AppConfig,
    teams: RwLock<TeamStore>,
    selection: RwLock<TeamSelection>,
    flow: RwLock<SetupFlow>,
    route: RwLock<RouteParams>,
    game: RwLock<Option<GameSession>>,
    catalog: CatalogClient,
    audio: AudioFactory,
    sse: SseHub,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        config: AppConfig,
        teams: TeamStore,
        catalog: CatalogClient,
        audio: AudioFactory,
    ) -> SharedState {
        let transition_timeout = config.transition_timeout();
        Arc::new(Self {
            config,
            teams: RwLock::new(teams),
            selection: RwLock::new(TeamSelection::new()),
            flow: RwLock::new(SetupFlow::new()),
            route: RwLock::new(RouteParams::TeamSelect),
            game: RwLock::new(None),
            catalog,
            audio,
            sse: SseHub::new(32),
            transition_gate: Mutex::new(()),
            transition_timeout,
        })
    }

    /// Loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Team store.
    pub fn teams(&self) -> &RwLock<TeamStore> {
        &self.teams
    }

    /// Team-select toggles.
    pub fn selection(&self) -> &RwLock<TeamSelection> {
        &self.selection
    }

    /// Running game session, present while the flow is on the game screen.
    pub fn game(&self) -> &RwLock<Option<GameSession>> {
        &self.game
    }

    /// Catalog client shared by every transition.
    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Fresh audio backend for a new session.
    pub fn audio_backend(&self) -> Box<dyn AudioBackend> {
        (self.audio)()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Params of the current screen.
    pub async fn route(&self) -> RwLockReadGuard<'_, RouteParams> {
        self.route.read().await
    }

    /// Snapshot the flow state machine.
    pub async fn snapshot(&self) -> Snapshot {
        self.flow.read().await.snapshot()
    }

    /// Screen, params and selection read together.
    pub async fn flow_view(&self) -> FlowView {
        let flow = self.flow.read().await;
        let route = self.route.read().await;
        let selection = self.selection.read().await;
        FlowView {
            snapshot: flow.snapshot(),
            params: route.clone(),
            selection: selection.ids().map(str::to_string).collect(),
        }
    }

    async fn plan_transition(&self, event: FlowEvent) -> Result<Plan, PlanError> {
        let mut flow = self.flow.write().await;
        flow.plan(event)
    }

    async fn abort_transition(&self, plan_id: PlanId) -> Result<(), AbortError> {
        let mut flow = self.flow.write().await;
        flow.abort(plan_id)
    }

    /// Apply the plan and install its state while readers are held off.
    async fn commit_transition(
        &self,
        plan_id: PlanId,
        update: RouteUpdate,
    ) -> Result<Screen, ApplyError> {
        let mut flow = self.flow.write().await;
        let screen = flow.apply(plan_id)?;

        let mut route = self.route.write().await;
        *route = update.params;

        let mut game = self.game.write().await;
        match update.game {
            GameUpdate::Keep => {}
            GameUpdate::Start(session) => {
                info!(session_id = %session.id(), tracks = session.track_count(), "game session started");
                *game = Some(session);
            }
            GameUpdate::End => {
                if let Some(session) = game.take() {
                    info!(session_id = %session.id(), "game session ended");
                }
            }
        }

        if update.clear_selection {
            self.selection.write().await.clear();
        }

        Ok(screen)
    }

    /// Plan `event`, run `work` and commit what it returns, or abort on failure or timeout.
    ///
    /// Transitions are serialized: a second caller waits for the first to finish.
    pub async fn run_transition<F, Fut>(
        &self,
        event: FlowEvent,
        work: F,
    ) -> Result<Screen, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RouteUpdate, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let Plan { id: plan_id, .. } = self.plan_transition(event).await?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = self.abort_transition(plan_id).await {
                        warn!(
                            event = ?event,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(update) => {
                let next = self.commit_transition(plan_id, update).await?;
                drop(gate);
                Ok(next)
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }
}
