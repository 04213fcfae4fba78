//! Speech activity gate.
//!
//! Classifies audio frames as speech or silence using RMS-based
//! thresholding and tracks how long the current silence run has lasted.
//! Time is measured in audio time (accumulated sample counts), so the
//! gate behaves identically whether frames arrive live or from a file.

/// Classification of a single audio frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass {
    /// Frame energy is above the threshold.
    Speech,
    /// Frame energy is at or below the threshold.
    Silence,
}

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy)]
pub struct GateResult {
    pub class: FrameClass,
    /// Normalized RMS level of the frame (0.0 to 1.0).
    pub level: f32,
    /// Length of the current silence run in seconds, including this frame.
    /// Zero when the frame is speech.
    pub silence_secs: f32,
}

/// RMS threshold gate with an audio-time silence counter.
pub struct ActivityGate {
    threshold: f32,
    sample_rate: u32,
    silence_samples: u64,
}

impl ActivityGate {
    pub fn new(threshold: f32, sample_rate: u32) -> Self {
        Self {
            threshold,
            sample_rate,
            silence_samples: 0,
        }
    }

    /// Classifies a frame and updates the silence counter.
    pub fn classify(&mut self, samples: &[i16]) -> GateResult {
        let level = calculate_rms(samples);
        if level > self.threshold {
            self.silence_samples = 0;
            GateResult {
                class: FrameClass::Speech,
                level,
                silence_secs: 0.0,
            }
        } else {
            self.silence_samples += samples.len() as u64;
            GateResult {
                class: FrameClass::Silence,
                level,
                silence_secs: self.silence_secs(),
            }
        }
    }

    /// Current silence run length in seconds.
    pub fn silence_secs(&self) -> f32 {
        self.silence_samples as f32 / self.sample_rate as f32
    }

    /// Clears the silence counter, e.g. when a phrase is finalized.
    pub fn reset(&mut self) {
        self.silence_samples = 0;
    }
}

/// Calculates the Root Mean Square (RMS) of audio samples.
///
/// # Returns
/// Normalized RMS value (0.0 to 1.0), where:
/// - 0.0 represents silence
/// - ~0.707 represents a full-scale sine wave
/// - 1.0 represents maximum amplitude
pub fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = sample as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let mean_square = sum_squares / samples.len() as f64;
    mean_square.sqrt() as f32
}
