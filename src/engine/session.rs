//! AudioSession: exclusive ownership of one audio context

use crate::engine::context::AudioContext;
use crate::engine::platform::AudioPlatform;
use crate::error::Result;
use std::ops::{Deref, DerefMut};
use tracing::info;

/// One component's audio context
///
/// The context is closed exactly once: on `release`, or when the session is
/// dropped.
#[derive(Debug)]
pub struct AudioSession {
    context: AudioContext,
}

impl AudioSession {
    /// Acquire a context from `platform`
    pub fn open(platform: &dyn AudioPlatform) -> Result<Self> {
        let context = platform.open_context()?;
        info!(
            platform = platform.name(),
            context = %context.id(),
            state = %context.state(),
            "audio session opened"
        );
        Ok(Self { context })
    }

    pub fn context(&self) -> &AudioContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut AudioContext {
        &mut self.context
    }

    /// Close the context now
    pub fn release(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if !self.context.is_closed() {
            self.context.close();
            info!(context = %self.context.id(), "audio session released");
        }
    }
}

impl Deref for AudioSession {
    type Target = AudioContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl DerefMut for AudioSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.context
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::platform::{OfflinePlatform, UnavailablePlatform};

    #[test]
    fn test_release_closes_context() {
        let platform = OfflinePlatform::default();
        let session = AudioSession::open(&platform).unwrap();
        assert_eq!(platform.open_contexts(), 1);
        session.release();
        assert_eq!(platform.open_contexts(), 0);
    }

    #[test]
    fn test_drop_closes_context() {
        let platform = OfflinePlatform::default();
        {
            let _session = AudioSession::open(&platform).unwrap();
            assert_eq!(platform.open_contexts(), 1);
        }
        assert_eq!(platform.open_contexts(), 0);
    }

    #[test]
    fn test_open_fails_on_unavailable_platform() {
        let platform = UnavailablePlatform::new("no audio device");
        assert!(AudioSession::open(&platform).is_err());
    }

    #[test]
    fn test_deref_reaches_context() {
        let platform = OfflinePlatform::default();
        let mut session = AudioSession::open(&platform).unwrap();
        session.resume().unwrap();
        assert_eq!(session.sample_rate(), platform.sample_rate());
    }
}
