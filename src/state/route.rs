use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use utoipa::ToSchema;

use crate::{
    dao::catalog::query::is_decade,
    state::{
        flow::Screen,
        game::{RoundRecord, ScoreEntry, Track},
        teams::Team,
    },
};

/// Number of teams that play a game.
pub const TEAMS_PER_GAME: usize = 2;

/// Difficulty tiers, ordered from easiest to hardest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// Every tier in ascending order.
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    /// Lowercase label shown on the slider.
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

/// Inclusive pair of difficulty tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyRange {
    min: Difficulty,
    max: Difficulty,
}

impl DifficultyRange {
    /// Build a range, rejecting `min > max`.
    pub fn new(min: Difficulty, max: Difficulty) -> Result<Self, RouteError> {
        if min > max {
            return Err(RouteError::InvertedDifficulty { min, max });
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    pub fn min(&self) -> Difficulty {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> Difficulty {
        self.max
    }
}

impl Default for DifficultyRange {
    fn default() -> Self {
        Self {
            min: Difficulty::Easy,
            max: Difficulty::Expert,
        }
    }
}

/// Genres and decades picked on the genre screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSelection {
    genres: Vec<String>,
    decades: Vec<String>,
}

impl CatalogSelection {
    /// Validate a choice: at least one entry overall, decades shaped like `1990s`.
    /// Duplicates are dropped keeping the first occurrence.
    pub fn new(genres: Vec<String>, decades: Vec<String>) -> Result<Self, RouteError> {
        let genres = dedupe(genres.into_iter().map(|genre| genre.trim().to_string()));
        if genres.iter().any(String::is_empty) {
            return Err(RouteError::BlankGenre);
        }
        let decades = dedupe(decades.into_iter().map(|decade| decade.trim().to_string()));
        if let Some(bad) = decades.iter().find(|decade| !is_decade(decade)) {
            return Err(RouteError::InvalidDecade(bad.clone()));
        }
        if genres.is_empty() && decades.is_empty() {
            return Err(RouteError::EmptyCatalogSelection);
        }
        Ok(Self { genres, decades })
    }

    /// Chosen genres in pick order.
    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    /// Chosen decades in pick order.
    pub fn decades(&self) -> &[String] {
        &self.decades
    }
}

fn dedupe(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Parameters of the difficulty screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyParams {
    teams: Vec<Team>,
}

impl DifficultyParams {
    /// Requires exactly two distinct teams.
    pub fn new(teams: Vec<Team>) -> Result<Self, RouteError> {
        if teams.len() != TEAMS_PER_GAME {
            return Err(RouteError::TeamCount {
                expected: TEAMS_PER_GAME,
                got: teams.len(),
            });
        }
        if teams[0].id == teams[1].id {
            return Err(RouteError::DuplicateTeam(teams[0].id.clone()));
        }
        Ok(Self { teams })
    }

    /// Selected teams in pick order.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Carry the teams forward with the chosen range.
    pub fn choose(self, difficulty_range: DifficultyRange) -> GenreParams {
        GenreParams {
            teams: self.teams,
            difficulty_range,
        }
    }
}

/// Parameters of the genre/decade screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreParams {
    teams: Vec<Team>,
    difficulty_range: DifficultyRange,
}

impl GenreParams {
    /// Selected teams in pick order.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Chosen difficulty range.
    pub fn difficulty_range(&self) -> DifficultyRange {
        self.difficulty_range
    }

    /// Carry everything forward together with the fetched tracks.
    pub fn choose(
        self,
        selection: CatalogSelection,
        tracks: Vec<Track>,
    ) -> Result<GameParams, RouteError> {
        if tracks.is_empty() {
            return Err(RouteError::NoTracks);
        }
        Ok(GameParams {
            teams: self.teams,
            difficulty_range: self.difficulty_range,
            genres: selection.genres,
            decades: selection.decades,
            tracks,
        })
    }

    /// Params of the difficulty screen this one came from.
    pub fn back(self) -> DifficultyParams {
        DifficultyParams { teams: self.teams }
    }
}

/// Parameters of the game screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameParams {
    teams: Vec<Team>,
    difficulty_range: DifficultyRange,
    genres: Vec<String>,
    decades: Vec<String>,
    tracks: Vec<Track>,
}

impl GameParams {
    /// The two playing teams, in selection order.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Range picked on the difficulty screen.
    pub fn difficulty_range(&self) -> DifficultyRange {
        self.difficulty_range
    }

    /// Genres picked on the genre screen.
    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    /// Decades picked on the genre screen.
    pub fn decades(&self) -> &[String] {
        &self.decades
    }

    /// Tracks fetched for the selection, in play order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Params of the genre screen; chosen genres, decades and tracks are dropped.
    pub fn back(self) -> GenreParams {
        GenreParams {
            teams: self.teams,
            difficulty_range: self.difficulty_range,
        }
    }
}

/// Parameters of the results screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsParams {
    scores: Vec<ScoreEntry>,
    rounds: Vec<RoundRecord>,
    finished_at: String,
}

impl ResultsParams {
    /// Freeze the final tally, stamped with the current time.
    pub fn new(scores: Vec<ScoreEntry>, rounds: Vec<RoundRecord>) -> Self {
        let finished_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| String::from("unknown"));
        Self {
            scores,
            rounds,
            finished_at,
        }
    }

    /// Final tally, one entry per team.
    pub fn scores(&self) -> &[ScoreEntry] {
        &self.scores
    }

    /// Every guess of the game, in play order.
    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    /// RFC 3339 timestamp of the finish.
    pub fn finished_at(&self) -> &str {
        &self.finished_at
    }
}

/// Parameters handed from one screen to the next.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RouteParams {
    #[default]
    TeamSelect,
    Difficulty(DifficultyParams),
    Genre(GenreParams),
    Game(GameParams),
    Results(ResultsParams),
}

impl RouteParams {
    /// Screen these params belong to.
    pub fn screen(&self) -> Screen {
        match self {
            RouteParams::TeamSelect => Screen::TeamSelect,
            RouteParams::Difficulty(_) => Screen::Difficulty,
            RouteParams::Genre(_) => Screen::Genre,
            RouteParams::Game(_) => Screen::Game,
            RouteParams::Results(_) => Screen::Results,
        }
    }

    /// Params of the previous screen, discarding what was accumulated after it.
    pub fn back(self) -> Result<RouteParams, RouteError> {
        match self {
            RouteParams::Difficulty(_) => Ok(RouteParams::TeamSelect),
            RouteParams::Genre(params) => Ok(RouteParams::Difficulty(params.back())),
            RouteParams::Game(params) => Ok(RouteParams::Genre(params.back())),
            other => Err(RouteError::NoPreviousScreen(other.screen())),
        }
    }
}

/// Validation failures at screen boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Not exactly two teams selected.
    #[error("exactly {expected} teams must be selected, got {got}")]
    TeamCount { expected: usize, got: usize },
    /// The same team appears twice.
    #[error("team `{0}` is selected twice")]
    DuplicateTeam(String),
    /// Lower bound above the upper bound.
    #[error("difficulty range is inverted: {min:?} > {max:?}")]
    InvertedDifficulty { min: Difficulty, max: Difficulty },
    /// Neither a genre nor a decade was picked.
    #[error("select at least one genre or decade")]
    EmptyCatalogSelection,
    /// A genre is empty once trimmed.
    #[error("genre must not be blank")]
    BlankGenre,
    /// A decade is not a label such as `1990s`.
    #[error("decade `{0}` must look like 1990s")]
    InvalidDecade(String),
    /// The catalog found nothing to play.
    #[error("catalog returned no tracks for this selection")]
    NoTracks,
    /// The screen has no predecessor to go back to.
    #[error("no previous screen from {0:?}")]
    NoPreviousScreen(Screen),
    /// The event does not belong to the current screen.
    #[error("current screen is {actual:?}, expected {expected:?}")]
    WrongScreen { expected: Screen, actual: Screen },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str) -> Team {
        Team {
            id: id.into(),
            name: format!("Team {id}"),
            avatar_url: None,
            color_hex: None,
        }
    }

    fn track(id: &str) -> Track {
        Track {
            id: id.into(),
            name: "Song".into(),
            artist: "Artist".into(),
            preview_url: None,
            artwork_url: None,
        }
    }

    #[test]
    fn difficulty_params_need_two_distinct_teams() {
        assert_eq!(
            DifficultyParams::new(vec![team("a")]),
            Err(RouteError::TeamCount {
                expected: 2,
                got: 1
            })
        );
        assert_eq!(
            DifficultyParams::new(vec![team("a"), team("a")]),
            Err(RouteError::DuplicateTeam("a".into()))
        );
        assert!(DifficultyParams::new(vec![team("a"), team("b")]).is_ok());
    }

    #[test]
    fn difficulty_range_must_be_ordered() {
        assert!(DifficultyRange::new(Difficulty::Hard, Difficulty::Easy).is_err());
        let range = DifficultyRange::new(Difficulty::Medium, Difficulty::Medium).unwrap();
        assert_eq!(range.min(), range.max());
        assert_eq!(DifficultyRange::default().max(), Difficulty::Expert);
    }

    #[test]
    fn catalog_selection_needs_one_entry_and_dedupes() {
        assert_eq!(
            CatalogSelection::new(vec![], vec![]),
            Err(RouteError::EmptyCatalogSelection)
        );
        assert_eq!(
            CatalogSelection::new(vec![], vec!["199x".into()]),
            Err(RouteError::InvalidDecade("199x".into()))
        );
        assert_eq!(
            CatalogSelection::new(vec![], vec!["1995s".into()]),
            Err(RouteError::InvalidDecade("1995s".into()))
        );
        assert_eq!(
            CatalogSelection::new(vec!["  ".into()], vec![]),
            Err(RouteError::BlankGenre)
        );

        let selection = CatalogSelection::new(
            vec!["Rock".into(), "Pop".into(), "Rock".into()],
            vec!["1990s".into(), "1990s".into()],
        )
        .unwrap();
        assert_eq!(selection.genres(), ["Rock", "Pop"]);
        assert_eq!(selection.decades(), ["1990s"]);

        assert!(CatalogSelection::new(vec![], vec!["2010s".into()]).is_ok());
    }

    #[test]
    fn game_params_carry_every_choice() {
        let range = DifficultyRange::new(Difficulty::Easy, Difficulty::Hard).unwrap();
        let game = DifficultyParams::new(vec![team("a"), team("b")])
            .unwrap()
            .choose(range)
            .choose(
                CatalogSelection::new(vec!["Pop".into()], vec!["2010s".into()]).unwrap(),
                vec![track("t1")],
            )
            .unwrap();

        assert_eq!(game.teams(), [team("a"), team("b")]);
        assert_eq!(game.difficulty_range(), range);
        assert_eq!(game.genres(), ["Pop"]);
        assert_eq!(game.decades(), ["2010s"]);
        assert_eq!(game.tracks().len(), 1);
    }

    #[test]
    fn empty_track_list_is_rejected() {
        let genre = DifficultyParams::new(vec![team("a"), team("b")])
            .unwrap()
            .choose(DifficultyRange::default());
        assert_eq!(
            genre.choose(
                CatalogSelection::new(vec!["Jazz".into()], vec![]).unwrap(),
                vec![]
            ),
            Err(RouteError::NoTracks)
        );
    }

    #[test]
    fn back_discards_downstream_choices() {
        let range = DifficultyRange::new(Difficulty::Medium, Difficulty::Expert).unwrap();
        let game = DifficultyParams::new(vec![team("a"), team("b")])
            .unwrap()
            .choose(range)
            .choose(
                CatalogSelection::new(vec!["Pop".into()], vec![]).unwrap(),
                vec![track("t1")],
            )
            .unwrap();

        let genre = RouteParams::Game(game).back().unwrap();
        match &genre {
            RouteParams::Genre(params) => assert_eq!(params.difficulty_range(), range),
            other => panic!("expected genre params, got {other:?}"),
        }

        let difficulty = genre.back().unwrap();
        assert_eq!(difficulty.screen(), Screen::Difficulty);
        assert_eq!(difficulty.back().unwrap(), RouteParams::TeamSelect);
        assert_eq!(
            RouteParams::TeamSelect.back(),
            Err(RouteError::NoPreviousScreen(Screen::TeamSelect))
        );
    }
}
