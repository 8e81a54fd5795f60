use indexmap::IndexSet;

use crate::state::route::TEAMS_PER_GAME;

/// Outcome of toggling a team on the team-select screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Selected,
    Deselected,
    /// The selection already holds the maximum number of teams; nothing changed.
    Full,
}

/// Teams picked on the team-select screen, in pick order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamSelection {
    selected: IndexSet<String>,
}

impl TeamSelection {
    /// Empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deselect a selected team, or select it while there is room.
    pub fn toggle(&mut self, team_id: &str) -> ToggleOutcome {
        if self.selected.shift_remove(team_id) {
            ToggleOutcome::Deselected
        } else if self.selected.len() < TEAMS_PER_GAME {
            self.selected.insert(team_id.to_string());
            ToggleOutcome::Selected
        } else {
            ToggleOutcome::Full
        }
    }

    /// Selected ids in pick order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// Number of selected teams.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// True when nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Whether the selection has exactly the number of teams a game needs.
    pub fn is_complete(&self) -> bool {
        self.selected.len() == TEAMS_PER_GAME
    }

    /// Drop a team that no longer exists.
    pub fn forget(&mut self, team_id: &str) -> bool {
        self.selected.shift_remove(team_id)
    }

    /// Clear the selection.
    pub fn clear(&mut self) {
        self.selected.clear();
    }
}
