//! Audio feed for continuous capture.
//!
//! Wraps an audio source in a dedicated capture thread and provides:
//! - Continuous recording decoupled from downstream timing
//! - Frame sequence numbering
//! - End-of-stream detection for finite sources
//! - Tolerance for transient device read errors

use crate::audio::source::AudioSource;
use crate::error::Result;
use crate::events::{EventSender, PipelineEvent};
use crate::streaming::frame::AudioFrame;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

/// Read errors tolerated in a row before the device is declared failed.
const MAX_CONSECUTIVE_ERRORS: u32 = 10;

/// Configuration for the audio feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Channel buffer size (number of frames to buffer).
    pub channel_buffer_size: usize,
    /// Polling interval when no samples are available (ms).
    pub poll_interval_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: crate::defaults::FRAME_CHANNEL_CAPACITY,
            poll_interval_ms: 10,
        }
    }
}

/// Capture thread that continuously reads an audio source and emits frames.
pub struct AudioFeed<A: AudioSource> {
    audio_source: A,
    config: FeedConfig,
    sequence: AtomicU64,
    running: Arc<AtomicBool>,
}

impl<A: AudioSource + 'static> AudioFeed<A> {
    /// Creates a new feed wrapping the given audio source.
    pub fn new(audio_source: A) -> Self {
        Self::with_config(audio_source, FeedConfig::default())
    }

    /// Creates a new feed with custom configuration.
    pub fn with_config(audio_source: A, config: FeedConfig) -> Self {
        Self {
            audio_source,
            config,
            sequence: AtomicU64::new(0),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts continuous audio capture in a background thread.
    ///
    /// Returns a receiver for audio frames. Capture runs until `stop()`
    /// is called, the receiver is dropped, a finite source is exhausted,
    /// or the device fails repeatedly. The channel closing is the
    /// downstream signal to drain and finalize.
    pub fn start(
        mut self,
        events: Option<EventSender>,
    ) -> Result<(mpsc::Receiver<AudioFrame>, AudioFeedHandle)> {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let running = self.running.clone();

        self.audio_source.start()?;
        running.store(true, Ordering::SeqCst);

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        thread::spawn(move || {
            let mut consecutive_errors = 0u32;

            while running.load(Ordering::SeqCst) {
                match self.audio_source.read_samples() {
                    Ok(samples) if !samples.is_empty() => {
                        consecutive_errors = 0;
                        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
                        let frame = AudioFrame::new(seq, samples);

                        // Stop if receiver dropped
                        if tx.blocking_send(frame).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {
                        if self.audio_source.is_finite() {
                            tracing::debug!("audio source exhausted, closing feed");
                            break;
                        }
                        // No samples yet, wait briefly
                        thread::sleep(poll_interval);
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        tracing::warn!(
                            "audio read error ({}/{}): {}",
                            consecutive_errors,
                            MAX_CONSECUTIVE_ERRORS,
                            e
                        );
                        if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                            if let Some(events) = &events {
                                let _ = events.send(PipelineEvent::Error {
                                    phrase_id: None,
                                    message: format!("audio device failed: {}", e),
                                });
                            }
                            break;
                        }
                        thread::sleep(poll_interval);
                    }
                }
            }

            running.store(false, Ordering::SeqCst);
            let _ = self.audio_source.stop();
        });

        let handle = AudioFeedHandle {
            running: self.running.clone(),
        };

        Ok((rx, handle))
    }
}

/// Handle to control a running audio feed.
#[derive(Clone)]
pub struct AudioFeedHandle {
    running: Arc<AtomicBool>,
}

impl AudioFeedHandle {
    /// Stops the capture thread.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Returns true if the feed is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::MockAudioSource;

    #[tokio::test]
    async fn test_feed_config_default() {
        let config = FeedConfig::default();
        assert_eq!(config.channel_buffer_size, 1024);
        assert_eq!(config.poll_interval_ms, 10);
    }

    #[tokio::test]
    async fn test_feed_creation() {
        let source = MockAudioSource::new();
        let feed = AudioFeed::new(source);
        assert!(!feed.running.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_feed_handle_stop() {
        let source = MockAudioSource::new().with_samples(vec![100i16; 160]);
        let feed = AudioFeed::new(source);

        let (mut rx, handle) = feed.start(None).unwrap();
        assert!(handle.is_running());

        // Should receive at least one frame
        let frame = tokio::time::timeout(Duration::from_millis(100), rx.recv())
            .await
            .ok()
            .flatten();
        assert!(frame.is_some());

        handle.stop();
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_feed_sequence_numbers() {
        let source = MockAudioSource::new().with_samples(vec![100i16; 160]);
        let feed = AudioFeed::new(source);

        let (mut rx, handle) = feed.start(None).unwrap();

        let mut sequences = Vec::new();
        for _ in 0..3 {
            if let Ok(Some(frame)) =
                tokio::time::timeout(Duration::from_millis(100), rx.recv()).await
            {
                sequences.push(frame.sequence);
            }
        }

        handle.stop();

        // Verify sequences are monotonically increasing
        for i in 1..sequences.len() {
            assert!(
                sequences[i] > sequences[i - 1],
                "Sequences should increase: {:?}",
                sequences
            );
        }
    }

    #[tokio::test]
    async fn test_feed_start_failure() {
        let source = MockAudioSource::new().with_start_failure();
        let feed = AudioFeed::new(source);

        let result = feed.start(None);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_finite_source_closes_channel() {
        let source = MockAudioSource::new().with_phase(vec![100i16; 160], 3);
        let feed = AudioFeed::new(source);

        let (mut rx, _handle) = feed.start(None).unwrap();

        let mut frames = 0;
        while let Ok(Some(_)) = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
            frames += 1;
        }

        assert_eq!(frames, 3);
        // Channel closed after exhaustion
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_repeated_read_errors_emit_event_and_stop() {
        let source = MockAudioSource::new()
            .with_read_failure()
            .with_error_message("device unplugged");
        let feed = AudioFeed::with_config(
            source,
            FeedConfig {
                channel_buffer_size: 16,
                poll_interval_ms: 1,
            },
        );

        let (events_tx, events_rx) = crate::events::channel();
        let (mut rx, _handle) = feed.start(Some(events_tx)).unwrap();

        // Channel should close once the error limit is reached
        let closed = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert_eq!(closed.unwrap(), None);

        let event = events_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("expected device failure event");
        match event {
            PipelineEvent::Error { phrase_id, message } => {
                assert_eq!(phrase_id, None);
                assert!(message.contains("device unplugged"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
