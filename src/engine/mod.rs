//! Audio Engine Module
//!
//! Software audio graph shared by both components:
//! - Automatable parameters and tone/noise voices
//! - The context that owns, schedules and renders them
//! - Platform capability checks and session ownership
//! - WAV export of rendered output

pub mod buffer;
pub mod context;
pub mod filter;
pub mod io;
pub mod noise;
pub mod oscillator;
pub mod param;
pub mod platform;
pub mod session;
pub mod voice;

pub use buffer::{AudioBuffer, ChannelLayout, DEFAULT_SAMPLE_RATE};
pub use context::{AudioContext, BusId, ContextState, Output, SourceId, SourceState};
pub use filter::{BiquadFilter, FilterKind};
pub use io::{export_wav, WavFormat};
pub use oscillator::{Oscillator, Waveform};
pub use param::{AudioParam, ParamEvent};
pub use platform::{AudioPlatform, AutoplayPolicy, Availability, OfflinePlatform, UnavailablePlatform};
pub use session::AudioSession;
pub use voice::{Modulation, NoiseVoice, ToneVoice, Voice};
