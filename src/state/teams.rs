use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::dao::{models::TeamEntity, storage::StorageError, team_persistence::TeamPersistence};

/// A named participant unit with optional display color/avatar; the unit of scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Identifier derived from the creation timestamp (milliseconds since the epoch).
    pub id: String,
    /// Display name shown on every screen.
    pub name: String,
    /// Optional picture URL.
    pub avatar_url: Option<String>,
    /// Optional display color, `#RGB` or `#RRGGBB`.
    pub color_hex: Option<String>,
}

/// Failures of team store mutations.
#[derive(Debug, Error)]
pub enum TeamStoreError {
    /// Writing or reading the persisted list failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// No team carries the given id.
    #[error("team `{0}` not found")]
    NotFound(String),
    /// A team with this id already exists.
    #[error("team `{0}` already exists")]
    DuplicateId(String),
}

/// The list of known teams, persisted as a whole on every change.
pub struct TeamStore {
    teams: Vec<Team>,
    persistence: Arc<dyn TeamPersistence>,
}

impl TeamStore {
    /// Read the persisted list.
    pub async fn load(persistence: Arc<dyn TeamPersistence>) -> Result<Self, StorageError> {
        let teams: Vec<Team> = persistence
            .load()
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        info!(count = teams.len(), "loaded teams");
        Ok(Self { teams, persistence })
    }

    /// All teams in creation order.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Look a team up by id.
    pub fn get(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.id == id)
    }

    /// Storage handle, for health checks.
    pub fn persistence(&self) -> &Arc<dyn TeamPersistence> {
        &self.persistence
    }

    /// Fresh id from the current timestamp, bumped past ids already in use.
    pub fn next_id(&self) -> String {
        let mut candidate = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        while self.get(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }

    /// Append a team.
    pub async fn add(&mut self, team: Team) -> Result<Team, TeamStoreError> {
        if self.get(&team.id).is_some() {
            return Err(TeamStoreError::DuplicateId(team.id));
        }
        let mut next = self.teams.clone();
        next.push(team.clone());
        self.persist(next).await?;
        Ok(team)
    }

    /// Replace the team carrying `team.id`, keeping its position.
    pub async fn edit(&mut self, team: Team) -> Result<Team, TeamStoreError> {
        if self.get(&team.id).is_none() {
            return Err(TeamStoreError::NotFound(team.id));
        }
        let next = self
            .teams
            .iter()
            .map(|existing| {
                if existing.id == team.id {
                    team.clone()
                } else {
                    existing.clone()
                }
            })
            .collect();
        self.persist(next).await?;
        Ok(team)
    }

    /// Delete a team by id, returning it.
    pub async fn remove(&mut self, id: &str) -> Result<Team, TeamStoreError> {
        let removed = self
            .get(id)
            .cloned()
            .ok_or_else(|| TeamStoreError::NotFound(id.to_string()))?;
        let next = self
            .teams
            .iter()
            .filter(|team| team.id != id)
            .cloned()
            .collect();
        self.persist(next).await?;
        Ok(removed)
    }

    /// Write the full list, then swap it in.
    async fn persist(&mut self, next: Vec<Team>) -> Result<(), StorageError> {
        let entities = next.iter().cloned().map(Into::into).collect();
        self.persistence.save(entities).await?;
        self.teams = next;
        Ok(())
    }
}

impl From<TeamEntity> for Team {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            avatar_url: value.avatar_url,
            color_hex: value.color_hex,
        }
    }
}

impl From<Team> for TeamEntity {
    fn from(value: Team) -> Self {
        Self {
            id: value.id,
            name: value.name,
            avatar_url: value.avatar_url,
            color_hex: value.color_hex,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::future::BoxFuture;

    use super::*;
    use crate::dao::{
        kv_store::memory::MemoryKvStore, storage::StorageResult,
        team_persistence::KeyValueTeamPersistence,
    };

    fn team(id: &str, name: &str) -> Team {
        Team {
            id: id.into(),
            name: name.into(),
            avatar_url: None,
            color_hex: None,
        }
    }

    fn persistence() -> Arc<dyn TeamPersistence> {
        Arc::new(KeyValueTeamPersistence::new(Arc::new(MemoryKvStore::new())))
    }

    struct FailingPersistence;

    impl TeamPersistence for FailingPersistence {
        fn load(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
            Box::pin(async { Ok(Vec::new()) })
        }
        fn save(&self, _teams: Vec<TeamEntity>) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async {
                Err(StorageError::unavailable(
                    "disk full".into(),
                    std::io::Error::other("disk full"),
                ))
            })
        }
        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn removing_one_of_n_teams_leaves_the_others() {
        let mut store = TeamStore::load(persistence()).await.unwrap();
        for i in 0..4 {
            store.add(team(&i.to_string(), &format!("Team {i}"))).await.unwrap();
        }

        store.remove("2").await.unwrap();

        assert_eq!(store.teams().len(), 3);
        assert!(store.get("2").is_none());
        assert_eq!(
            store.teams().iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            vec!["0", "1", "3"]
        );
    }

    #[tokio::test]
    async fn edit_keeps_id_and_replaces_other_fields() {
        let mut store = TeamStore::load(persistence()).await.unwrap();
        store.add(team("1", "Before")).await.unwrap();

        store
            .edit(Team {
                id: "1".into(),
                name: "After".into(),
                avatar_url: Some("https://a.example/1.png".into()),
                color_hex: Some("#ff0000".into()),
            })
            .await
            .unwrap();

        let edited = store.get("1").unwrap();
        assert_eq!(edited.name, "After");
        assert_eq!(edited.avatar_url.as_deref(), Some("https://a.example/1.png"));
        assert_eq!(edited.color_hex.as_deref(), Some("#ff0000"));
        assert_eq!(store.teams().len(), 1);
    }

    #[tokio::test]
    async fn saved_list_round_trips_through_load() {
        let shared = persistence();
        let mut store = TeamStore::load(Arc::clone(&shared)).await.unwrap();
        store.add(team("1", "A")).await.unwrap();
        store
            .add(Team {
                color_hex: Some("#00ff00".into()),
                ..team("2", "B")
            })
            .await
            .unwrap();

        let reloaded = TeamStore::load(shared).await.unwrap();
        assert_eq!(reloaded.teams(), store.teams());
    }

    #[tokio::test]
    async fn unknown_ids_are_reported() {
        let mut store = TeamStore::load(persistence()).await.unwrap();
        store.add(team("1", "A")).await.unwrap();

        assert!(matches!(
            store.remove("9").await,
            Err(TeamStoreError::NotFound(id)) if id == "9"
        ));
        assert!(matches!(
            store.edit(team("9", "X")).await,
            Err(TeamStoreError::NotFound(_))
        ));
        assert!(matches!(
            store.add(team("1", "Again")).await,
            Err(TeamStoreError::DuplicateId(_))
        ));
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_untouched() {
        let mut store = TeamStore::load(Arc::new(FailingPersistence)).await.unwrap();

        let err = store.add(team("1", "A")).await.unwrap_err();

        assert!(matches!(err, TeamStoreError::Storage(_)));
        assert!(store.teams().is_empty());
    }

    #[tokio::test]
    async fn next_id_skips_ids_in_use() {
        let mut store = TeamStore::load(persistence()).await.unwrap();
        let first = store.next_id();
        store.add(team(&first, "A")).await.unwrap();

        let second = store.next_id();
        assert_ne!(first, second);
        assert!(second.parse::<i64>().unwrap() >= first.parse::<i64>().unwrap());
    }
}
