use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Screens of the setup flow, in forward order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    /// Pick the two teams that play.
    TeamSelect,
    /// Pick the difficulty range.
    Difficulty,
    /// Pick genres and decades.
    Genre,
    /// Tracks are played and guessed.
    Game,
    /// Final tally.
    Results,
}

/// Events that move the flow between screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    /// Two teams were confirmed on the team-select screen.
    TeamsConfirmed,
    /// A difficulty range was chosen.
    DifficultyChosen,
    /// Genres/decades were chosen and tracks fetched.
    CatalogChosen,
    /// The game was ended and the tally frozen.
    Finish,
    /// Return to the previous screen.
    Back,
    /// Leave the results for a new game.
    Restart,
}

/// Error returned when an event does not apply to the current screen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while on {from:?}")]
pub struct InvalidTransition {
    /// Screen the flow was on.
    pub from: Screen,
    /// Rejected event.
    pub event: FlowEvent,
}

/// Errors that can occur when planning a transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    #[error("another transition is already in progress")]
    AlreadyPending,
    /// The event is not valid from the current screen.
    #[error(transparent)]
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// No transition is pending.
    #[error("no transition is pending")]
    NoPending,
    /// Plan ID does not match the pending plan.
    #[error("plan {got} does not match pending plan {expected}")]
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// The screen changed since the plan was created.
    #[error("screen changed from {expected:?} to {actual:?}")]
    ScreenMismatch {
        /// Screen when the plan was created.
        expected: Screen,
        /// Current screen.
        actual: Screen,
    },
    /// The version changed since the plan was created.
    #[error("flow version changed: expected {expected}, found {actual}")]
    VersionMismatch {
        /// Version the plan would produce.
        expected: usize,
        /// Version the flow would produce now.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortError {
    /// No transition is pending.
    #[error("no transition is pending")]
    NoPending,
    /// Plan ID does not match the pending plan.
    #[error("plan {got} does not match pending plan {expected}")]
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned transition.
pub type PlanId = Uuid;

/// A validated transition that has not been applied yet.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Screen the flow is on.
    pub from: Screen,
    /// Screen the flow moves to.
    pub to: Screen,
    /// Event that triggered this transition.
    pub event: FlowEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// When the plan was created.
    pub pending_since: Instant,
}

/// Point-in-time view of the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current screen.
    pub screen: Screen,
    /// Incremented on every applied transition.
    pub version: usize,
    /// Target screen of the pending transition, if any.
    pub pending: Option<Screen>,
}

/// Versioned state machine of the setup flow.
#[derive(Debug, Clone)]
pub struct SetupFlow {
    screen: Screen,
    version: usize,
    pending: Option<Plan>,
}

impl Default for SetupFlow {
    fn default() -> Self {
        Self {
            screen: Screen::TeamSelect,
            version: 0,
            pending: None,
        }
    }
}

impl SetupFlow {
    /// Flow on the team-select screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Create a snapshot of the flow.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            screen: self.screen,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Validate `event` against the current screen and reserve the transition.
    pub fn plan(&mut self, event: FlowEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.screen,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Commit the pending plan and return the new screen.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<Screen, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        if self.screen != plan.from {
            return Err(ApplyError::ScreenMismatch {
                expected: plan.from,
                actual: self.screen,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.screen = plan.to;
        self.version = plan.version_next;

        Ok(self.screen)
    }

    /// Drop the pending plan without moving.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    fn compute_transition(&self, event: FlowEvent) -> Result<Screen, InvalidTransition> {
        let next = match (self.screen, event) {
            (Screen::TeamSelect, FlowEvent::TeamsConfirmed) => Screen::Difficulty,
            (Screen::Difficulty, FlowEvent::DifficultyChosen) => Screen::Genre,
            (Screen::Genre, FlowEvent::CatalogChosen) => Screen::Game,
            (Screen::Game, FlowEvent::Finish) => Screen::Results,
            (Screen::Results, FlowEvent::Restart) => Screen::TeamSelect,
            (Screen::Difficulty, FlowEvent::Back) => Screen::TeamSelect,
            (Screen::Genre, FlowEvent::Back) => Screen::Difficulty,
            (Screen::Game, FlowEvent::Back) => Screen::Genre,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(flow: &mut SetupFlow, event: FlowEvent) -> Screen {
        let plan = flow.plan(event).unwrap();
        flow.apply(plan.id).unwrap()
    }

    #[test]
    fn initial_screen_is_team_select() {
        let flow = SetupFlow::new();
        assert_eq!(flow.screen(), Screen::TeamSelect);
        assert_eq!(flow.snapshot().version, 0);
    }

    #[test]
    fn full_happy_path_through_setup() {
        let mut flow = SetupFlow::new();

        assert_eq!(apply(&mut flow, FlowEvent::TeamsConfirmed), Screen::Difficulty);
        assert_eq!(apply(&mut flow, FlowEvent::DifficultyChosen), Screen::Genre);
        assert_eq!(apply(&mut flow, FlowEvent::CatalogChosen), Screen::Game);
        assert_eq!(apply(&mut flow, FlowEvent::Finish), Screen::Results);
        assert_eq!(apply(&mut flow, FlowEvent::Restart), Screen::TeamSelect);
        assert_eq!(flow.snapshot().version, 5);
    }

    #[test]
    fn back_walks_towards_team_select() {
        let mut flow = SetupFlow::new();
        apply(&mut flow, FlowEvent::TeamsConfirmed);
        apply(&mut flow, FlowEvent::DifficultyChosen);
        apply(&mut flow, FlowEvent::CatalogChosen);

        assert_eq!(apply(&mut flow, FlowEvent::Back), Screen::Genre);
        assert_eq!(apply(&mut flow, FlowEvent::Back), Screen::Difficulty);
        assert_eq!(apply(&mut flow, FlowEvent::Back), Screen::TeamSelect);

        let err = flow.plan(FlowEvent::Back).unwrap_err();
        assert_eq!(
            err,
            PlanError::InvalidTransition(InvalidTransition {
                from: Screen::TeamSelect,
                event: FlowEvent::Back,
            })
        );
    }

    #[test]
    fn events_for_other_screens_are_rejected() {
        let mut flow = SetupFlow::new();
        match flow.plan(FlowEvent::CatalogChosen).unwrap_err() {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, Screen::TeamSelect);
                assert_eq!(invalid.event, FlowEvent::CatalogChosen);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        apply(&mut flow, FlowEvent::TeamsConfirmed);
        apply(&mut flow, FlowEvent::DifficultyChosen);
        apply(&mut flow, FlowEvent::CatalogChosen);
        apply(&mut flow, FlowEvent::Finish);
        assert!(flow.plan(FlowEvent::Back).is_err());
    }

    #[test]
    fn second_plan_waits_for_the_first() {
        let mut flow = SetupFlow::new();
        let plan = flow.plan(FlowEvent::TeamsConfirmed).unwrap();
        assert_eq!(flow.snapshot().pending, Some(Screen::Difficulty));
        assert_eq!(
            flow.plan(FlowEvent::TeamsConfirmed).unwrap_err(),
            PlanError::AlreadyPending
        );

        let other = Uuid::new_v4();
        assert!(matches!(
            flow.apply(other),
            Err(ApplyError::IdMismatch { got, .. }) if got == other
        ));
        assert_eq!(flow.apply(plan.id).unwrap(), Screen::Difficulty);
    }

    #[test]
    fn abort_clears_pending_and_keeps_screen() {
        let mut flow = SetupFlow::new();
        let plan = flow.plan(FlowEvent::TeamsConfirmed).unwrap();
        flow.abort(plan.id).unwrap();

        assert!(flow.pending.is_none());
        assert_eq!(flow.screen(), Screen::TeamSelect);
        assert_eq!(flow.abort(plan.id), Err(AbortError::NoPending));
    }
}
