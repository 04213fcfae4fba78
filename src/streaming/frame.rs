//! Frame types for the streaming pipeline.
//!
//! Defines the data structures that flow between pipeline stations.

use std::time::Instant;

/// Audio frame with metadata for tracking through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Sequence number for ordering frames.
    pub sequence: u64,
    /// Timestamp when the audio was captured.
    pub timestamp: Instant,
    /// Audio samples as 16-bit PCM.
    pub samples: Vec<i16>,
}

impl AudioFrame {
    /// Creates a new audio frame.
    pub fn new(sequence: u64, samples: Vec<i16>) -> Self {
        Self {
            sequence,
            timestamp: Instant::now(),
            samples,
        }
    }
}

/// Why a phrase was finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeReason {
    /// The configured silence duration elapsed after speech.
    Silence,
    /// The phrase hit the maximum duration cap while speech continued.
    MaxDuration,
    /// The input ended while a phrase was still accumulating.
    Shutdown,
}

/// A transcription window: audio from the start of a phrase up to now.
///
/// Successive windows of the same phrase are cumulative, each a superset
/// of the previous one. The terminal window carries the complete phrase.
#[derive(Debug, Clone)]
pub struct Window {
    /// Phrase this window belongs to. Monotonically increasing from 1.
    pub phrase_id: u64,
    /// Position within the phrase, starting at 0.
    pub seq: u32,
    /// All phrase audio accumulated so far, 16-bit PCM.
    pub samples: Vec<i16>,
    /// True for the last window of a phrase. Terminal windows are never
    /// dropped under backpressure.
    pub terminal: bool,
    /// Set on terminal windows.
    pub reason: Option<FinalizeReason>,
}

/// Transcription of one window.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    pub phrase_id: u64,
    /// Sequence of the window this text came from. Results for a phrase
    /// may arrive out of order; lower sequences are stale.
    pub seq: u32,
    pub text: String,
    /// True when this came from the terminal window: the text is the
    /// phrase's definitive transcription.
    pub terminal: bool,
}

/// A phrase whose transcription is final, ready for translation.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedPhrase {
    pub phrase_id: u64,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_frame_creation() {
        let samples = vec![100i16, 200, 300];
        let frame = AudioFrame::new(42, samples.clone());

        assert_eq!(frame.sequence, 42);
        assert_eq!(frame.samples, samples);
    }

    #[test]
    fn test_terminal_window_carries_reason() {
        let window = Window {
            phrase_id: 1,
            seq: 3,
            samples: vec![0i16; 100],
            terminal: true,
            reason: Some(FinalizeReason::Silence),
        };

        assert!(window.terminal);
        assert_eq!(window.reason, Some(FinalizeReason::Silence));
    }

    #[test]
    fn test_finalize_reason_equality() {
        assert_eq!(FinalizeReason::Silence, FinalizeReason::Silence);
        assert_ne!(FinalizeReason::Silence, FinalizeReason::MaxDuration);
        assert_ne!(FinalizeReason::MaxDuration, FinalizeReason::Shutdown);
    }

    #[test]
    fn test_hypothesis_ordering_fields() {
        let early = Hypothesis {
            phrase_id: 1,
            seq: 0,
            text: "hello".to_string(),
            terminal: false,
        };
        let late = Hypothesis {
            phrase_id: 1,
            seq: 2,
            text: "hello world again".to_string(),
            terminal: true,
        };

        assert!(early.seq < late.seq);
        assert!(late.terminal);
    }
}
