//! Audio capture and speech-activity gating.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod gate;
pub mod source;
pub mod wav;

#[cfg(feature = "cpal-audio")]
pub use capture::CpalAudioSource;
pub use gate::{ActivityGate, FrameClass, GateResult, calculate_rms};
pub use source::{AudioSource, MockAudioSource};
pub use wav::WavAudioSource;
