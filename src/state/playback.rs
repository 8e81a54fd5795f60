//! Playback of track snippets: the audio backend seam and the per-session controller that
//! mirrors backend status and enforces the snippet window.

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::state::game::Snippet;

/// Errors raised by an audio backend or the playback controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// An operation needs a loaded clip.
    #[error("no audio is loaded")]
    NotLoaded,
    /// The backend refused to load the resource.
    #[error("failed to load audio from `{url}`: {reason}")]
    Load { url: String, reason: String },
}

/// Status reported by the backend (or a remote device) about the loaded clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendStatus {
    /// Absolute position inside the preview, in milliseconds.
    pub position_ms: u64,
    /// Whether audio is currently running.
    pub is_playing: bool,
}

/// Platform audio API used by a game session.
pub trait AudioBackend: Send + Sync {
    /// Load a clip paused at `start_ms`.
    fn load(&mut self, url: &str, start_ms: u64) -> Result<(), PlaybackError>;
    /// Release the loaded clip, if any.
    fn unload(&mut self);
    /// Start or resume playback.
    fn play(&mut self) -> Result<(), PlaybackError>;
    /// Pause playback, keeping the position.
    fn pause(&mut self) -> Result<(), PlaybackError>;
    /// Move to an absolute position.
    fn seek(&mut self, position_ms: u64) -> Result<(), PlaybackError>;
    /// Current status, `None` while nothing is loaded.
    fn status(&self) -> Option<BackendStatus>;
}

#[derive(Debug, Clone)]
struct LoadedClip {
    url: String,
    base_ms: u64,
    started_at: Option<Instant>,
}

impl LoadedClip {
    fn position_ms(&self) -> u64 {
        let elapsed = self
            .started_at
            .map(|start| start.elapsed().as_millis() as u64)
            .unwrap_or(0);
        self.base_ms + elapsed
    }
}

/// Backend that models a player with the runtime clock instead of decoding audio.
///
/// The position advances in real time while playing, which is what the status ticker
/// observes. Front-ends that play the preview on a device report their own position
/// through the status callback instead.
#[derive(Debug, Default)]
pub struct ClockPlayer {
    clip: Option<LoadedClip>,
}

impl ClockPlayer {
    /// Create a player with nothing loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// URL of the loaded clip.
    pub fn loaded_url(&self) -> Option<&str> {
        self.clip.as_ref().map(|clip| clip.url.as_str())
    }

    fn clip_mut(&mut self) -> Result<&mut LoadedClip, PlaybackError> {
        self.clip.as_mut().ok_or(PlaybackError::NotLoaded)
    }
}

impl AudioBackend for ClockPlayer {
    fn load(&mut self, url: &str, start_ms: u64) -> Result<(), PlaybackError> {
        if url.trim().is_empty() {
            return Err(PlaybackError::Load {
                url: url.to_string(),
                reason: "empty url".into(),
            });
        }
        self.clip = Some(LoadedClip {
            url: url.to_string(),
            base_ms: start_ms,
            started_at: None,
        });
        Ok(())
    }

    fn unload(&mut self) {
        self.clip = None;
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        let clip = self.clip_mut()?;
        if clip.started_at.is_none() {
            clip.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        let clip = self.clip_mut()?;
        clip.base_ms = clip.position_ms();
        clip.started_at = None;
        Ok(())
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), PlaybackError> {
        let clip = self.clip_mut()?;
        clip.base_ms = position_ms;
        if clip.started_at.is_some() {
            clip.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn status(&self) -> Option<BackendStatus> {
        self.clip.as_ref().map(|clip| BackendStatus {
            position_ms: clip.position_ms(),
            is_playing: clip.started_at.is_some(),
        })
    }
}

/// Lifecycle of the current track's audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing playable is loaded (no track yet, or the track has no preview).
    NotLoaded,
    /// Loaded and paused, either by the players or by the snippet clamp.
    Paused,
    /// Audio is running.
    Playing,
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    /// Lifecycle of the loaded clip.
    pub state: PlaybackState,
    /// Absolute position inside the preview.
    pub position_ms: u64,
    /// Window being played, if a track is loaded.
    pub snippet: Option<Snippet>,
    /// True once the snippet end was reached and playback was stopped.
    pub clamped: bool,
}

impl PlaybackSnapshot {
    /// Position relative to the snippet start.
    pub fn elapsed_ms(&self) -> u64 {
        self.snippet
            .map(|snippet| self.position_ms.saturating_sub(snippet.offset_ms))
            .unwrap_or(0)
    }
}

/// Owns the session's audio backend and mirrors its status.
pub struct Playback {
    backend: Box<dyn AudioBackend>,
    state: PlaybackState,
    position_ms: u64,
    snippet: Option<Snippet>,
    clamped: bool,
}

impl Playback {
    /// Wrap a backend; nothing is loaded yet.
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            state: PlaybackState::NotLoaded,
            position_ms: 0,
            snippet: None,
            clamped: false,
        }
    }

    /// Load a track's snippet, releasing the previous clip first.
    ///
    /// Tracks without a preview leave the controller in [`PlaybackState::NotLoaded`].
    pub fn load(
        &mut self,
        preview_url: Option<&str>,
        snippet: Snippet,
    ) -> Result<(), PlaybackError> {
        self.unload();
        self.snippet = Some(snippet);
        self.position_ms = snippet.offset_ms;

        let Some(url) = preview_url else {
            debug!("track has no preview; nothing to load");
            return Ok(());
        };

        self.backend.load(url, snippet.offset_ms)?;
        self.state = PlaybackState::Paused;
        Ok(())
    }

    /// Release the loaded clip.
    pub fn unload(&mut self) {
        if self.state != PlaybackState::NotLoaded {
            self.backend.unload();
        }
        self.state = PlaybackState::NotLoaded;
        self.position_ms = 0;
        self.snippet = None;
        self.clamped = false;
    }

    /// Play when paused, pause when playing; a no-op without loaded audio.
    ///
    /// Playing a snippet that was stopped at its end starts it over.
    pub fn toggle(&mut self) -> Result<PlaybackState, PlaybackError> {
        match self.state {
            PlaybackState::NotLoaded => {}
            PlaybackState::Playing => {
                self.backend.pause()?;
                self.sync_position();
                self.state = PlaybackState::Paused;
            }
            PlaybackState::Paused => {
                if let (true, Some(snippet)) = (self.clamped, self.snippet) {
                    self.backend.seek(snippet.offset_ms)?;
                    self.position_ms = snippet.offset_ms;
                    self.clamped = false;
                }
                self.backend.play()?;
                self.state = PlaybackState::Playing;
            }
        }
        Ok(self.state)
    }

    /// Scrub inside the snippet window; returns the effective position.
    pub fn seek(&mut self, position_ms: u64) -> Result<u64, PlaybackError> {
        let (Some(snippet), false) = (self.snippet, self.state == PlaybackState::NotLoaded) else {
            return Err(PlaybackError::NotLoaded);
        };
        let target = position_ms.clamp(snippet.offset_ms, snippet.end_ms());
        self.backend.seek(target)?;
        self.position_ms = target;
        self.clamped = false;
        self.enforce_window();
        Ok(self.position_ms)
    }

    /// Apply a status reported by the device that plays the preview.
    ///
    /// The backend is moved to the reported position and play state first, so later polls
    /// agree with the report.
    pub fn report(&mut self, status: BackendStatus) -> bool {
        if self.state == PlaybackState::NotLoaded {
            return false;
        }
        if !self.clamped {
            if let Err(err) = self.align_backend(status) {
                warn!(error = %err, "failed to apply reported status to the audio backend");
            }
        }
        self.on_status(status)
    }

    /// Apply a status callback. Returns whether the visible state changed.
    pub fn on_status(&mut self, status: BackendStatus) -> bool {
        if self.state == PlaybackState::NotLoaded {
            return false;
        }
        let before = (self.state, self.position_ms, self.clamped);

        if self.clamped {
            // Stay stopped at the snippet end whatever the device reports.
            if status.is_playing {
                self.pause_backend();
            }
        } else {
            self.position_ms = status.position_ms;
            self.state = if status.is_playing {
                PlaybackState::Playing
            } else {
                PlaybackState::Paused
            };
            self.enforce_window();
        }

        before != (self.state, self.position_ms, self.clamped)
    }

    /// Poll the backend and feed its status through [`Playback::on_status`].
    pub fn poll(&mut self) -> bool {
        match self.backend.status() {
            Some(status) => self.on_status(status),
            None => false,
        }
    }

    /// Current view of the controller.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state,
            position_ms: self.position_ms,
            snippet: self.snippet,
            clamped: self.clamped,
        }
    }

    fn align_backend(&mut self, status: BackendStatus) -> Result<(), PlaybackError> {
        self.backend.seek(status.position_ms)?;
        if status.is_playing {
            self.backend.play()
        } else {
            self.backend.pause()
        }
    }

    fn pause_backend(&mut self) {
        if let Err(err) = self.backend.pause() {
            warn!(error = %err, "failed to pause audio at the snippet end");
        }
    }

    fn sync_position(&mut self) {
        if let Some(status) = self.backend.status() {
            self.position_ms = status.position_ms;
        }
    }

    /// Hard stop once the snippet end is reached.
    fn enforce_window(&mut self) {
        let Some(snippet) = self.snippet else {
            return;
        };
        if self.position_ms >= snippet.end_ms() {
            self.pause_backend();
            self.position_ms = snippet.end_ms();
            self.state = PlaybackState::Paused;
            self.clamped = true;
        }
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.unload();
    }
}
