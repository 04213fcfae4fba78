use crate::error::{LivesubError, Result};

/// Trait for audio source devices.
///
/// This trait allows swapping implementations (real audio device, WAV
/// file, mock). Exactly one pipeline owns a source at a time; live
/// implementations hold the device exclusively between `start` and
/// `stop`.
pub trait AudioSource: Send {
    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio from the source.
    fn stop(&mut self) -> Result<()>;

    /// Read the next batch of 16-bit PCM samples.
    ///
    /// Returns an empty vector when a finite source is exhausted; live
    /// sources block briefly or return whatever the device buffered.
    fn read_samples(&mut self) -> Result<Vec<i16>>;

    /// True when the source ends on its own (file playback, scripted mock).
    fn is_finite(&self) -> bool {
        false
    }
}

/// One phase of a scripted mock: the same frame repeated `frames` times.
#[derive(Debug, Clone)]
pub struct FramePhase {
    pub samples: Vec<i16>,
    pub frames: usize,
}

impl FramePhase {
    pub fn new(samples: Vec<i16>, frames: usize) -> Self {
        Self { samples, frames }
    }
}

/// Mock audio source for testing.
///
/// Either repeats a single configured frame forever (live-like), or
/// plays a script of [`FramePhase`]s and then reports end-of-stream.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    default_frame: Vec<i16>,
    phases: Vec<FramePhase>,
    phase_idx: usize,
    frame_in_phase: usize,
    should_fail_start: bool,
    should_fail_stop: bool,
    should_fail_read: bool,
    error_message: String,
}

impl MockAudioSource {
    pub fn new() -> Self {
        Self {
            is_started: false,
            default_frame: vec![0i16; 160],
            phases: Vec::new(),
            phase_idx: 0,
            frame_in_phase: 0,
            should_fail_start: false,
            should_fail_stop: false,
            should_fail_read: false,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Configure the mock to repeat specific samples forever.
    pub fn with_samples(mut self, samples: Vec<i16>) -> Self {
        self.default_frame = samples;
        self
    }

    /// Append a scripted phase. A mock with phases is finite: once the
    /// script runs out, reads return empty.
    pub fn with_phase(mut self, samples: Vec<i16>, frames: usize) -> Self {
        self.phases.push(FramePhase::new(samples, frames));
        self
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on stop
    pub fn with_stop_failure(mut self) -> Self {
        self.should_fail_stop = true;
        self
    }

    /// Configure the mock to fail on read
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Configure the error message for failures
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Check if the audio source is started
    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            Err(LivesubError::AudioCapture {
                message: self.error_message.clone(),
            })
        } else {
            self.is_started = true;
            Ok(())
        }
    }

    fn stop(&mut self) -> Result<()> {
        if self.should_fail_stop {
            Err(LivesubError::AudioCapture {
                message: self.error_message.clone(),
            })
        } else {
            self.is_started = false;
            Ok(())
        }
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.should_fail_read {
            return Err(LivesubError::AudioCapture {
                message: self.error_message.clone(),
            });
        }

        if self.phases.is_empty() {
            return Ok(self.default_frame.clone());
        }

        while self.phase_idx < self.phases.len() {
            let phase = &self.phases[self.phase_idx];
            if self.frame_in_phase < phase.frames {
                self.frame_in_phase += 1;
                return Ok(phase.samples.clone());
            }
            self.phase_idx += 1;
            self.frame_in_phase = 0;
        }

        // Script exhausted
        Ok(Vec::new())
    }

    fn is_finite(&self) -> bool {
        !self.phases.is_empty()
    }
}
