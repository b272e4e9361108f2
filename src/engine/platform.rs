//! Platform audio capability
//!
//! Whether an audio context can be had at all is decided by the platform.
//! Components ask once, at mount, and keep the answer as an `Availability`.

use crate::engine::buffer::DEFAULT_SAMPLE_RATE;
use crate::engine::context::{AudioContext, ContextState};
use crate::error::{NebulaError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Whether new contexts may produce sound before a user gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoplayPolicy {
    /// Contexts open running
    Allowed,
    /// Contexts open suspended and must be resumed
    #[default]
    RequiresGesture,
}

/// Source of audio contexts
pub trait AudioPlatform {
    /// Acquire a fresh context, or explain why none is available
    fn open_context(&self) -> Result<AudioContext>;

    /// Human-readable platform name, used in logs
    fn name(&self) -> &str;
}

/// Software rendering platform; always available
#[derive(Debug, Clone)]
pub struct OfflinePlatform {
    sample_rate: u32,
    autoplay: AutoplayPolicy,
    open: Arc<AtomicUsize>,
}

impl OfflinePlatform {
    pub fn new(sample_rate: u32, autoplay: AutoplayPolicy) -> Self {
        Self {
            sample_rate,
            autoplay,
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Contexts handed out and not yet closed
    pub fn open_contexts(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

impl Default for OfflinePlatform {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE, AutoplayPolicy::default())
    }
}

impl AudioPlatform for OfflinePlatform {
    fn open_context(&self) -> Result<AudioContext> {
        if self.sample_rate == 0 {
            return Err(NebulaError::Unavailable {
                reason: "sample rate of 0 Hz".to_string(),
            });
        }
        let state = match self.autoplay {
            AutoplayPolicy::Allowed => ContextState::Running,
            AutoplayPolicy::RequiresGesture => ContextState::Suspended,
        };
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(AudioContext::with_state(
            self.sample_rate,
            state,
            Some(self.open.clone()),
        ))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

/// Platform with no audio support, or one that blocks it
#[derive(Debug, Clone)]
pub struct UnavailablePlatform {
    reason: String,
}

impl UnavailablePlatform {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl AudioPlatform for UnavailablePlatform {
    fn open_context(&self) -> Result<AudioContext> {
        Err(NebulaError::Unavailable {
            reason: self.reason.clone(),
        })
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Capability resolved once at mount
#[derive(Debug)]
pub enum Availability<T> {
    Available(T),
    Unavailable,
}

impl<T> Availability<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }

    pub fn available(&self) -> Option<&T> {
        match self {
            Availability::Available(value) => Some(value),
            Availability::Unavailable => None,
        }
    }

    pub fn available_mut(&mut self) -> Option<&mut T> {
        match self {
            Availability::Available(value) => Some(value),
            Availability::Unavailable => None,
        }
    }

    /// Take the value out, leaving `Unavailable` behind
    pub fn take(&mut self) -> Option<T> {
        match std::mem::replace(self, Availability::Unavailable) {
            Availability::Available(value) => Some(value),
            Availability::Unavailable => None,
        }
    }
}

impl<T> From<Option<T>> for Availability<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Availability::Available(value),
            None => Availability::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_platform_honours_autoplay_policy() {
        let gated = OfflinePlatform::new(48000, AutoplayPolicy::RequiresGesture);
        assert_eq!(gated.open_context().unwrap().state(), ContextState::Suspended);

        let open = OfflinePlatform::new(48000, AutoplayPolicy::Allowed);
        assert_eq!(open.open_context().unwrap().state(), ContextState::Running);
    }

    #[test]
    fn test_open_context_count_tracks_lifetimes() {
        let platform = OfflinePlatform::default();
        let a = platform.open_context().unwrap();
        let mut b = platform.open_context().unwrap();
        assert_eq!(platform.open_contexts(), 2);
        b.close();
        assert_eq!(platform.open_contexts(), 1);
        drop(a);
        assert_eq!(platform.open_contexts(), 0);
    }

    #[test]
    fn test_zero_sample_rate_is_unavailable() {
        let platform = OfflinePlatform::new(0, AutoplayPolicy::Allowed);
        assert!(matches!(
            platform.open_context(),
            Err(NebulaError::Unavailable { .. })
        ));
        assert_eq!(platform.open_contexts(), 0);
    }

    #[test]
    fn test_unavailable_platform() {
        let platform = UnavailablePlatform::new("blocked by policy");
        let err = platform.open_context().unwrap_err();
        assert!(err.to_string().contains("blocked by policy"));
        assert_eq!(platform.name(), "unavailable");
    }

    #[test]
    fn test_availability_take() {
        let mut slot: Availability<u8> = Some(3).into();
        assert!(slot.is_available());
        assert_eq!(slot.take(), Some(3));
        assert!(!slot.is_available());
        assert_eq!(slot.take(), None);
    }
}
