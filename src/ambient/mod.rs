//! Ambient soundscape
//!
//! A looping "space ambience": fixed tone layers with slow pitch drift and a
//! low-passed noise bed, under play/pause, mute and volume controls.

mod layer;
mod soundscape;
mod state;

pub use layer::{NoiseLayer, ToneLayer};
pub use soundscape::{AmbientConfig, AmbientControls, AmbientSoundscape};
pub use state::{PlaybackState, Transport};
