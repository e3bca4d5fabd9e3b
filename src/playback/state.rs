use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Recording,
    Playing,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Recording => "recording",
            PlaybackState::Playing => "playing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{action} is not allowed while {state}")]
pub struct PlaybackError {
    pub action: &'static str,
    pub state: PlaybackState,
}

/// Gates which sequence mutations are legal. Recording and playing are
/// mutually exclusive; `paused` only matters while playing.
#[derive(Debug, Clone)]
pub struct PlaybackMachine {
    state: PlaybackState,
    paused: bool,
}

impl Default for PlaybackMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackMachine {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            paused: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == PlaybackState::Recording
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_recording(&mut self, on: bool) -> Result<(), PlaybackError> {
        if on {
            if self.is_playing() {
                return Err(PlaybackError {
                    action: "recording",
                    state: self.state,
                });
            }
            self.state = PlaybackState::Recording;
        } else if !self.is_playing() {
            self.state = PlaybackState::Idle;
        }
        Ok(())
    }

    /// Enter `Playing`; recording is switched off.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        if self.is_playing() {
            return Err(PlaybackError {
                action: "play",
                state: self.state,
            });
        }
        self.state = PlaybackState::Playing;
        self.paused = false;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Idle;
        self.paused = false;
    }

    /// Record the flag; returns it for forwarding.
    pub fn pause(&mut self, paused: bool) -> bool {
        self.paused = paused;
        paused
    }

    /// Fail with `NotAllowed` while playing.
    pub fn ensure_editable(&self, action: &'static str) -> Result<(), PlaybackError> {
        if self.is_playing() {
            Err(PlaybackError {
                action,
                state: self.state,
            })
        } else {
            Ok(())
        }
    }
}
