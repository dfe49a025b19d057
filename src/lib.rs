//! Generative stereo drone engine.
//!
//! A fixed-capacity pool of voices, each cross-fading a pair of randomized
//! sine oscillators under a slow LFO, with per-oscillator stereo placement,
//! smoothed fade envelopes, and loudness compensation as the active-voice
//! count changes at runtime.

pub mod audio_io;
pub mod command;
pub mod config;
pub mod dsp;
pub mod models;
pub mod pool;
pub mod tuning;
pub mod voice;

pub use command::Command;
pub use models::{DroneSettings, SessionData};
pub use pool::VoicePool;
pub use tuning::Tuning;
pub use voice::{DroneVoice, VoiceState};
