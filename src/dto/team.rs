use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{
        non_blank,
        validation::{validate_avatar_url, validate_color_hex, validate_team_name},
    },
    state::teams::Team,
};

/// Team as exposed by the REST API and SSE stream.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}

impl From<&Team> for TeamSummary {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id.clone(),
            name: team.name.clone(),
            avatar_url: team.avatar_url.clone(),
            color_hex: team.color_hex.clone(),
        }
    }
}

/// Payload used to create or edit a team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TeamInput {
    #[validate(custom(function = "validate_team_name"))]
    pub name: String,
    /// Link to an avatar image; empty or omitted for none.
    #[serde(default)]
    #[validate(custom(function = "validate_avatar_url"))]
    pub avatar_url: Option<String>,
    /// `#RGB` or `#RRGGBB`; empty or omitted for none.
    #[serde(default)]
    #[validate(custom(function = "validate_color_hex"))]
    pub color_hex: Option<String>,
}

impl TeamInput {
    /// Build the domain team, trimming the name and dropping blank optionals.
    pub fn into_team(self, id: String) -> Team {
        Team {
            id,
            name: self.name.trim().to_string(),
            avatar_url: non_blank(self.avatar_url),
            color_hex: non_blank(self.color_hex),
        }
    }
}

/// Payload of `team.deleted` events.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamDeletedEvent {
    pub team_id: String,
}
