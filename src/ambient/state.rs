//! Playback state of the ambient soundscape

use std::fmt;

/// Whether the layer set is sounding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Stopped,
    Playing,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Stopped => write!(f, "Stopped"),
            Transport::Playing => write!(f, "Playing"),
        }
    }
}

/// User-controlled playback settings
///
/// Only the transport controls mutate this; the gain logic reads it before
/// every change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub transport: Transport,
    pub muted: bool,
    /// Volume in [0, 1], kept while muted
    pub volume: f32,
}

impl PlaybackState {
    pub fn new(volume: f32) -> Self {
        Self {
            transport: Transport::Stopped,
            muted: false,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.transport == Transport::Playing
    }

    /// Gain the master stage should have right now
    pub fn master_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(0.3)
    }
}
