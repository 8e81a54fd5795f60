use std::time::Duration;

use rand::Rng;
use tracing::warn;
use uuid::Uuid;

use crate::state::{
    playback::{
        AudioBackend, BackendStatus, Playback, PlaybackError, PlaybackSnapshot, PlaybackState,
    },
    route::GameParams,
    teams::Team,
};

/// Track as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Catalog identifier.
    pub id: String,
    /// Song title.
    pub name: String,
    /// Artist names joined with `", "`.
    pub artist: String,
    /// URL of the audio preview, when the catalog offers one.
    pub preview_url: Option<String>,
    /// URL of the first album image.
    pub artwork_url: Option<String>,
}

/// Window of a preview that is played during a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snippet {
    /// Start of the window inside the preview, in milliseconds.
    pub offset_ms: u64,
    /// Length of the window in milliseconds.
    pub length_ms: u64,
}

impl Snippet {
    /// Absolute end of the window inside the preview.
    pub fn end_ms(&self) -> u64 {
        self.offset_ms + self.length_ms
    }
}

/// How snippet windows are cut out of previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetPolicy {
    length: Duration,
    preview_length: Duration,
}

impl SnippetPolicy {
    /// `length` is the played window; `preview_length` the duration of catalog previews.
    pub fn new(length: Duration, preview_length: Duration) -> Self {
        Self {
            length,
            preview_length,
        }
    }

    /// Pick a window of the configured length at a random offset inside the preview.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Snippet {
        let length_ms = self.length.as_millis() as u64;
        let max_offset = (self.preview_length.as_millis() as u64).saturating_sub(length_ms);
        let offset_ms = if max_offset == 0 {
            0
        } else {
            rng.random_range(0..=max_offset)
        };
        Snippet {
            offset_ms,
            length_ms,
        }
    }
}

/// A track scheduled for a round, with its snippet window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTrack {
    pub track: Track,
    pub snippet: Snippet,
}

/// Running score of one participating team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    pub team: Team,
    pub score: u32,
}

/// Free-text answer entered for the current track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guess {
    pub title: String,
    pub artist: String,
}

/// What happened to one track during the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundRecord {
    pub track: Track,
    pub guess: Guess,
    pub credited_team_id: String,
}

/// Result of a guess submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessOutcome {
    pub credited_team_id: String,
    /// False when the guess was for the last track.
    pub advanced: bool,
    pub current_index: usize,
}

/// In-memory state of the game screen: tracks, score tally and the audio player.
pub struct GameSession {
    id: Uuid,
    tracks: Vec<GameTrack>,
    current_index: usize,
    scores: Vec<ScoreEntry>,
    rounds: Vec<RoundRecord>,
    playback: Playback,
}

impl GameSession {
    /// Build a session from the game parameters and load the first track.
    pub fn start(
        params: &GameParams,
        policy: SnippetPolicy,
        backend: Box<dyn AudioBackend>,
    ) -> Self {
        let mut rng = rand::rng();
        let tracks = params
            .tracks()
            .iter()
            .cloned()
            .map(|track| GameTrack {
                track,
                snippet: policy.draw(&mut rng),
            })
            .collect();
        let scores = params
            .teams()
            .iter()
            .cloned()
            .map(|team| ScoreEntry { team, score: 0 })
            .collect();

        let mut session = Self {
            id: Uuid::new_v4(),
            tracks,
            current_index: 0,
            scores,
            rounds: Vec::new(),
            playback: Playback::new(backend),
        };
        session.load_current();
        session
    }

    /// Identifier of this session, used to detect a replaced session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Index of the track being played.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Number of tracks in the session.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Track being played.
    pub fn current_track(&self) -> Option<&GameTrack> {
        self.tracks.get(self.current_index)
    }

    /// Score tally, one entry per team in selection order.
    pub fn scores(&self) -> &[ScoreEntry] {
        &self.scores
    }

    /// Guesses recorded so far.
    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    /// Playback view of the current track.
    pub fn playback(&self) -> PlaybackSnapshot {
        self.playback.snapshot()
    }

    /// Play/pause the current track.
    pub fn toggle_playback(&mut self) -> Result<PlaybackState, PlaybackError> {
        self.playback.toggle()
    }

    /// Scrub the current track.
    pub fn seek(&mut self, position_ms: u64) -> Result<u64, PlaybackError> {
        self.playback.seek(position_ms)
    }

    /// Feed an externally reported player status.
    pub fn report_status(&mut self, status: BackendStatus) -> bool {
        self.playback.report(status)
    }

    /// Poll the audio backend; returns whether the playback view changed.
    pub fn poll_playback(&mut self) -> bool {
        self.playback.poll()
    }

    /// Record a guess, credit the first team and move to the next track if one remains.
    ///
    /// Answers are not compared with the track: crediting stays a placeholder until the
    /// matching rules are decided.
    pub fn submit_guess(&mut self, guess: Guess) -> GuessOutcome {
        let credited_team_id = match self.scores.first_mut() {
            Some(entry) => {
                entry.score += 1;
                entry.team.id.clone()
            }
            None => String::new(),
        };

        if let Some(current) = self.tracks.get(self.current_index) {
            self.rounds.push(RoundRecord {
                track: current.track.clone(),
                guess,
                credited_team_id: credited_team_id.clone(),
            });
        }

        let advanced = self.current_index + 1 < self.tracks.len();
        if advanced {
            self.current_index += 1;
            self.load_current();
        }

        GuessOutcome {
            credited_team_id,
            advanced,
            current_index: self.current_index,
        }
    }

    /// Release the audio resource and hand out the final tally.
    pub fn finish(mut self) -> (Vec<ScoreEntry>, Vec<RoundRecord>) {
        self.playback.unload();
        (
            std::mem::take(&mut self.scores),
            std::mem::take(&mut self.rounds),
        )
    }

    /// A preview that fails to load leaves the track unplayable; the round still counts.
    fn load_current(&mut self) {
        let Some(current) = self.tracks.get(self.current_index) else {
            self.playback.unload();
            return;
        };
        let snippet = current.snippet;
        let track_id = current.track.id.clone();
        let url = current.track.preview_url.clone();
        if let Err(err) = self.playback.load(url.as_deref(), snippet) {
            warn!(session_id = %self.id, %track_id, error = %err, "failed to load track preview");
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::state::{
        playback::ClockPlayer,
        route::{CatalogSelection, DifficultyParams, DifficultyRange},
    };

    fn team(id: &str, name: &str) -> Team {
        Team {
            id: id.into(),
            name: name.into(),
            avatar_url: None,
            color_hex: None,
        }
    }

    fn track(id: &str, preview: Option<&str>) -> Track {
        Track {
            id: id.into(),
            name: format!("Song {id}"),
            artist: "Artist".into(),
            preview_url: preview.map(Into::into),
            artwork_url: None,
        }
    }

    fn params(tracks: Vec<Track>) -> GameParams {
        DifficultyParams::new(vec![team("1", "A"), team("2", "B")])
            .unwrap()
            .choose(DifficultyRange::default())
            .choose(
                CatalogSelection::new(vec!["Pop".into()], vec![]).unwrap(),
                tracks,
            )
            .unwrap()
    }

    fn policy() -> SnippetPolicy {
        SnippetPolicy::new(Duration::from_secs(15), Duration::from_secs(30))
    }

    #[test]
    fn snippet_offsets_stay_inside_the_preview() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let snippet = policy().draw(&mut rng);
            assert_eq!(snippet.length_ms, 15_000);
            assert!(snippet.end_ms() <= 30_000);
        }
    }

    #[test]
    fn snippet_longer_than_preview_starts_at_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let policy = SnippetPolicy::new(Duration::from_secs(40), Duration::from_secs(30));
        assert_eq!(policy.draw(&mut rng).offset_ms, 0);
    }

    #[test]
    fn session_starts_with_one_zero_score_per_team_and_first_track_loaded() {
        let session = GameSession::start(
            &params(vec![
                track("t1", Some("https://p/1")),
                track("t2", Some("https://p/2")),
            ]),
            policy(),
            Box::new(ClockPlayer::new()),
        );

        assert_eq!(session.scores().len(), 2);
        assert!(session.scores().iter().all(|entry| entry.score == 0));
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.playback().state, PlaybackState::Paused);
    }

    #[test]
    fn guess_credits_first_team_and_advances_until_last_track() {
        let mut session = GameSession::start(
            &params(vec![track("t1", Some("https://p/1")), track("t2", None)]),
            policy(),
            Box::new(ClockPlayer::new()),
        );

        let first = session.submit_guess(Guess {
            title: "Song t1".into(),
            artist: "Artist".into(),
        });
        assert_eq!(first.credited_team_id, "1");
        assert!(first.advanced);
        assert_eq!(session.current_track().unwrap().track.id, "t2");
        assert_eq!(session.playback().state, PlaybackState::NotLoaded);

        let last = session.submit_guess(Guess::default());
        assert!(!last.advanced);
        assert_eq!(last.current_index, 1);

        assert_eq!(session.scores()[0].score, 2);
        assert_eq!(session.scores()[1].score, 0);
        assert_eq!(session.rounds().len(), 2);
        assert_eq!(session.rounds()[0].guess.title, "Song t1");
    }

    #[test]
    fn finish_returns_tally_in_team_order() {
        let mut session = GameSession::start(
            &params(vec![track("t1", Some("https://p/1"))]),
            policy(),
            Box::new(ClockPlayer::new()),
        );
        session.submit_guess(Guess::default());

        let (scores, rounds) = session.finish();
        assert_eq!(
            scores
                .iter()
                .map(|entry| (entry.team.name.as_str(), entry.score))
                .collect::<Vec<_>>(),
            vec![("A", 1), ("B", 0)]
        );
        assert_eq!(rounds.len(), 1);
    }

    #[test]
    fn unloadable_next_track_counts_the_guess_once() {
        let mut session = GameSession::start(
            &params(vec![
                track("t1", Some("https://p/1")),
                track("t2", Some("   ")),
                track("t3", Some("https://p/3")),
            ]),
            policy(),
            Box::new(ClockPlayer::new()),
        );

        let outcome = session.submit_guess(Guess::default());
        assert!(outcome.advanced);
        assert_eq!(outcome.current_index, 1);
        assert_eq!(session.scores()[0].score, 1);
        assert_eq!(session.rounds().len(), 1);
        assert_eq!(session.playback().state, PlaybackState::NotLoaded);

        let outcome = session.submit_guess(Guess::default());
        assert_eq!(outcome.current_index, 2);
        assert_eq!(session.scores()[0].score, 2);
        assert_eq!(session.playback().state, PlaybackState::Paused);
    }
}
