//! Nebula - Procedural Ambience and Interaction Sounds
//!
//! Nebula synthesizes two independent kinds of audio for an interface:
//! 1. An ambient soundscape - drifting tone layers over filtered noise,
//!    with play/pause, mute and volume controls
//! 2. Interaction effects - short hover and click tone bursts, reachable
//!    from any UI element through a shared hook slot
//!
//! # Architecture
//!
//! Both components sit on a small software audio graph in [`engine`]:
//! a context owns voices and gain buses, parameters carry automation, and
//! a platform decides whether a context can be opened at all. Rendering is
//! offline, so output goes to buffers and WAV files.

pub mod ambient;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod sfx;

pub use error::{NebulaError, Result};
