//! Capability handles for triggering sound effects
//!
//! UI code never holds the emitter. It holds a `HookSlot`, shared with the
//! emitter, and the emitter publishes a `SoundHooks` handle into it while it
//! is enabled. The handle is a weak back-reference: it keeps nothing alive,
//! and once the emitter is gone every call through it is a silent no-op.

use crate::sfx::emitter::EmitterCore;
use crate::sfx::tone::SfxKind;
use std::sync::{Arc, Mutex, RwLock, Weak};
use tracing::{trace, warn};
use uuid::Uuid;

/// Anything UI code can ask to play a feedback tone
pub trait EffectTrigger: Send + Sync {
    fn play(&self, kind: SfxKind);

    fn play_hover(&self) {
        self.play(SfxKind::Hover);
    }

    fn play_click(&self) {
        self.play(SfxKind::Click);
    }
}

/// Weak handle to a live emitter
#[derive(Debug, Clone)]
pub struct SoundHooks {
    owner: Uuid,
    core: Weak<Mutex<EmitterCore>>,
}

impl SoundHooks {
    pub(crate) fn new(owner: Uuid, core: &Arc<Mutex<EmitterCore>>) -> Self {
        Self {
            owner,
            core: Arc::downgrade(core),
        }
    }

    /// Id of the emitter that published this handle
    pub fn owner(&self) -> Uuid {
        self.owner
    }

    /// Whether the emitter behind this handle still exists
    pub fn is_live(&self) -> bool {
        self.core.strong_count() > 0
    }
}

impl EffectTrigger for SoundHooks {
    fn play(&self, kind: SfxKind) {
        let Some(core) = self.core.upgrade() else {
            trace!(?kind, "sound hook invoked after emitter teardown");
            return;
        };
        match core.lock() {
            Ok(mut core) => core.play(kind),
            Err(_) => warn!(?kind, "sound effect state poisoned; skipping"),
        };
    }
}

/// Shared publication point for `SoundHooks`
///
/// Cloning the slot shares it. Any holder may invoke; only the emitter that
/// published may clear.
#[derive(Debug, Clone, Default)]
pub struct HookSlot {
    inner: Arc<RwLock<Option<SoundHooks>>>,
}

impl HookSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn publish(&self, hooks: SoundHooks) {
        match self.inner.write() {
            Ok(mut slot) => *slot = Some(hooks),
            Err(_) => warn!("sound hook slot poisoned; hooks not published"),
        }
    }

    /// Clear the slot if `owner` published its current contents
    pub(crate) fn clear_if_owner(&self, owner: Uuid) -> bool {
        match self.inner.write() {
            Ok(mut slot) => {
                if slot.as_ref().is_some_and(|h| h.owner == owner) {
                    *slot = None;
                    return true;
                }
                false
            }
            Err(_) => false,
        }
    }

    /// Currently published hooks, if any
    pub fn hooks(&self) -> Option<SoundHooks> {
        self.inner.read().ok().and_then(|slot| slot.clone())
    }

    /// True when an emitter has published live hooks
    pub fn is_available(&self) -> bool {
        self.hooks().is_some_and(|h| h.is_live())
    }
}

impl EffectTrigger for HookSlot {
    fn play(&self, kind: SfxKind) {
        // Clone out first so the slot lock is not held while synthesizing
        if let Some(hooks) = self.hooks() {
            hooks.play(kind);
        }
    }
}
