//! Interaction sound effects
//!
//! Hover and click feedback tones, reachable from any UI element through a
//! shared `HookSlot` instead of a global.

mod emitter;
mod hooks;
mod tone;

pub use emitter::{EffectsConfig, SoundEffects};
pub use hooks::{EffectTrigger, HookSlot, SoundHooks};
pub use tone::{BurstEnvelope, SfxKind, ToneBurst};
