//! Phrase segmenter station.
//!
//! Turns the raw frame stream into phrases and transcription windows:
//! - Idle until a frame classifies as speech, which opens a phrase
//! - While a phrase accumulates, every frame is appended (silence
//!   included, so natural pauses stay in the audio)
//! - A phrase finalizes when the configured silence duration elapses or
//!   when it hits the maximum phrase duration, whichever comes first
//! - Cumulative windows go out every step of fresh audio; finalization
//!   emits the terminal window covering the whole phrase
//!
//! A max-duration split starts the next phrase at the very next frame,
//! so continuous speech loses no audio at the boundary.

use crate::audio::gate::{ActivityGate, FrameClass};
use crate::defaults;
use crate::streaming::frame::{AudioFrame, FinalizeReason, Window};
use crate::streaming::windower::Windower;
use tokio::sync::mpsc;

/// Configuration for phrase segmentation.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    pub sample_rate: u32,
    /// RMS threshold separating speech from silence.
    pub silence_threshold: f32,
    /// Seconds of continuous silence that finalize a phrase.
    pub silence_duration: f32,
    /// Hard cap on phrase length in seconds.
    pub max_phrase_duration: f32,
    /// Seconds of new audio between cumulative windows.
    pub streaming_step_size: f32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            silence_threshold: defaults::SILENCE_THRESHOLD,
            silence_duration: defaults::SILENCE_DURATION_SECS,
            max_phrase_duration: defaults::MAX_PHRASE_DURATION_SECS,
            streaming_step_size: defaults::STREAMING_STEP_SECS,
        }
    }
}

impl SegmenterConfig {
    pub fn from_audio(audio: &crate::config::AudioConfig) -> Self {
        Self {
            sample_rate: audio.sample_rate,
            silence_threshold: audio.silence_threshold,
            silence_duration: audio.silence_duration,
            max_phrase_duration: audio.max_phrase_duration,
            streaming_step_size: audio.streaming_step_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhraseState {
    /// No phrase open; silence frames are discarded.
    Idle,
    /// A phrase is accumulating; every frame is appended.
    Accumulating,
}

/// Phrase accumulation state machine.
pub struct Segmenter {
    config: SegmenterConfig,
    gate: ActivityGate,
    windower: Windower,
    state: PhraseState,
    samples: Vec<i16>,
    phrase_id: u64,
    next_phrase_id: u64,
    max_phrase_samples: usize,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        let gate = ActivityGate::new(config.silence_threshold, config.sample_rate);
        let step_samples = (config.streaming_step_size * config.sample_rate as f32) as usize;
        let max_phrase_samples = (config.max_phrase_duration * config.sample_rate as f32) as usize;
        Self {
            config,
            gate,
            windower: Windower::new(step_samples.max(1)),
            state: PhraseState::Idle,
            samples: Vec::new(),
            phrase_id: 0,
            next_phrase_id: 1,
            max_phrase_samples: max_phrase_samples.max(1),
        }
    }

    /// Processes one frame, returning any windows to emit.
    pub fn process(&mut self, frame: &AudioFrame) -> Vec<Window> {
        let result = self.gate.classify(&frame.samples);

        match self.state {
            PhraseState::Idle => {
                if result.class != FrameClass::Speech {
                    return Vec::new();
                }
                // Speech opens a phrase starting at this frame
                self.phrase_id = self.next_phrase_id;
                self.next_phrase_id += 1;
                self.state = PhraseState::Accumulating;
                self.samples.clear();
                self.windower.reset();
                self.samples.extend_from_slice(&frame.samples);
                self.check_emit(result.class, result.silence_secs)
            }
            PhraseState::Accumulating => {
                self.samples.extend_from_slice(&frame.samples);
                self.check_emit(result.class, result.silence_secs)
            }
        }
    }

    /// After appending a frame, decide whether to finalize or emit a
    /// step window. The max-duration cap applies regardless of the
    /// frame's classification.
    fn check_emit(&mut self, class: FrameClass, silence_secs: f32) -> Vec<Window> {
        if class == FrameClass::Silence && silence_secs >= self.config.silence_duration {
            return vec![self.finalize(FinalizeReason::Silence)];
        }
        if self.samples.len() >= self.max_phrase_samples {
            return vec![self.finalize(FinalizeReason::MaxDuration)];
        }
        match self.windower.on_audio(self.phrase_id, &self.samples) {
            Some(window) => vec![window],
            None => Vec::new(),
        }
    }

    fn finalize(&mut self, reason: FinalizeReason) -> Window {
        let window = self.windower.terminal(self.phrase_id, &self.samples, reason);
        self.samples.clear();
        self.windower.reset();
        self.gate.reset();
        self.state = PhraseState::Idle;
        window
    }

    /// Force-finalizes any phrase in progress. Called when the input
    /// stream ends so in-flight speech is not lost.
    pub fn flush(&mut self) -> Option<Window> {
        if self.state == PhraseState::Accumulating && !self.samples.is_empty() {
            Some(self.finalize(FinalizeReason::Shutdown))
        } else {
            None
        }
    }

    /// Returns true if a phrase is currently accumulating.
    pub fn is_accumulating(&self) -> bool {
        self.state == PhraseState::Accumulating
    }

    /// Runs the segmenter as a station: frames in, windows out.
    ///
    /// When the input channel closes, any open phrase is flushed with
    /// [`FinalizeReason::Shutdown`] before the output closes.
    pub async fn run(mut self, mut input: mpsc::Receiver<AudioFrame>, output: mpsc::Sender<Window>) {
        while let Some(frame) = input.recv().await {
            for window in self.process(&frame) {
                if output.send(window).await.is_err() {
                    return;
                }
            }
        }

        if let Some(window) = self.flush() {
            let _ = output.send(window).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16000;

    fn test_config() -> SegmenterConfig {
        SegmenterConfig {
            sample_rate: RATE,
            silence_threshold: 0.01,
            silence_duration: 0.5,
            max_phrase_duration: 10.0,
            streaming_step_size: 1.0,
        }
    }

    /// 250ms of speech at 16kHz.
    fn speech_frame(seq: u64) -> AudioFrame {
        AudioFrame::new(seq, vec![3000i16; 4000])
    }

    /// 250ms of silence at 16kHz.
    fn silence_frame(seq: u64) -> AudioFrame {
        AudioFrame::new(seq, vec![0i16; 4000])
    }

    #[test]
    fn idle_silence_produces_nothing() {
        let mut segmenter = Segmenter::new(test_config());

        for i in 0..10 {
            assert!(segmenter.process(&silence_frame(i)).is_empty());
        }
        assert!(!segmenter.is_accumulating());
    }

    #[test]
    fn speech_opens_phrase() {
        let mut segmenter = Segmenter::new(test_config());

        segmenter.process(&silence_frame(0));
        segmenter.process(&speech_frame(1));
        assert!(segmenter.is_accumulating());
    }

    #[test]
    fn silence_finalizes_phrase_with_trailing_silence_included() {
        // 1.0s of speech in 250ms frames, then 0.5s of silence.
        // Expected: one step window at the 1.0s mark, then exactly one
        // terminal window containing 1.5s of audio.
        let mut segmenter = Segmenter::new(test_config());
        let mut windows = Vec::new();

        let mut seq = 0;
        for _ in 0..4 {
            windows.extend(segmenter.process(&speech_frame(seq)));
            seq += 1;
        }
        assert_eq!(windows.len(), 1, "one step window after 1.0s of speech");
        assert!(!windows[0].terminal);
        assert_eq!(windows[0].samples.len(), 16000);

        windows.extend(segmenter.process(&silence_frame(seq)));
        seq += 1;
        // 0.25s of silence: below the 0.5s trigger
        assert_eq!(windows.len(), 1);

        windows.extend(segmenter.process(&silence_frame(seq)));
        assert_eq!(windows.len(), 2);

        let terminal = &windows[1];
        assert!(terminal.terminal);
        assert_eq!(terminal.reason, Some(FinalizeReason::Silence));
        // 1.0s speech + 0.5s appended silence
        assert_eq!(terminal.samples.len(), 24000);
        assert!(!segmenter.is_accumulating());
    }

    #[test]
    fn brief_pause_does_not_finalize() {
        let mut segmenter = Segmenter::new(test_config());
        let mut windows = Vec::new();
        let mut seq = 0;

        for _ in 0..2 {
            windows.extend(segmenter.process(&speech_frame(seq)));
            seq += 1;
        }
        // One silence frame (0.25s) then speech resumes
        windows.extend(segmenter.process(&silence_frame(seq)));
        seq += 1;
        windows.extend(segmenter.process(&speech_frame(seq)));

        assert!(windows.iter().all(|w| !w.terminal));
        assert!(segmenter.is_accumulating());
    }

    #[test]
    fn max_duration_splits_continuous_speech_without_gap() {
        let mut config = test_config();
        config.max_phrase_duration = 2.0;
        let mut segmenter = Segmenter::new(config);

        let mut terminals = Vec::new();
        let mut total_in = 0usize;
        for seq in 0..16 {
            let frame = speech_frame(seq);
            total_in += frame.samples.len();
            for w in segmenter.process(&frame) {
                if w.terminal {
                    terminals.push(w);
                }
            }
        }

        // 4.0s of speech at a 2.0s cap: two forced splits
        assert_eq!(terminals.len(), 2);
        assert_eq!(terminals[0].phrase_id, 1);
        assert_eq!(terminals[1].phrase_id, 2);
        assert_eq!(terminals[0].reason, Some(FinalizeReason::MaxDuration));
        assert_eq!(terminals[1].reason, Some(FinalizeReason::MaxDuration));

        // No audio lost at the boundary
        let covered: usize = terminals.iter().map(|w| w.samples.len()).sum();
        assert_eq!(covered, total_in);
    }

    #[test]
    fn step_windows_are_cumulative() {
        let mut segmenter = Segmenter::new(test_config());
        let mut step_windows = Vec::new();

        for seq in 0..12 {
            for w in segmenter.process(&speech_frame(seq)) {
                if !w.terminal {
                    step_windows.push(w);
                }
            }
        }

        // 3.0s of speech at a 1.0s step: three step windows
        assert_eq!(step_windows.len(), 3);
        for (i, w) in step_windows.iter().enumerate() {
            assert_eq!(w.seq, i as u32);
            assert_eq!(w.samples.len(), (i + 1) * 16000);
        }
        // Each window is a prefix of the next
        for pair in step_windows.windows(2) {
            assert_eq!(
                &pair[1].samples[..pair[0].samples.len()],
                &pair[0].samples[..]
            );
        }
    }

    #[test]
    fn flush_emits_shutdown_terminal() {
        let mut segmenter = Segmenter::new(test_config());
        segmenter.process(&speech_frame(0));

        let window = segmenter.flush().expect("terminal on flush");
        assert!(window.terminal);
        assert_eq!(window.reason, Some(FinalizeReason::Shutdown));
        assert_eq!(window.samples.len(), 4000);
        assert!(!segmenter.is_accumulating());
    }

    #[test]
    fn flush_without_open_phrase_is_none() {
        let mut segmenter = Segmenter::new(test_config());
        assert!(segmenter.flush().is_none());

        segmenter.process(&silence_frame(0));
        assert!(segmenter.flush().is_none());
    }

    #[test]
    fn phrase_ids_increase_across_phrases() {
        let mut segmenter = Segmenter::new(test_config());
        let mut terminals = Vec::new();

        for round in 0..3 {
            let base = round * 10;
            for i in 0..2 {
                segmenter.process(&speech_frame(base + i));
            }
            for i in 2..4 {
                for w in segmenter.process(&silence_frame(base + i)) {
                    if w.terminal {
                        terminals.push(w);
                    }
                }
            }
        }

        assert_eq!(terminals.len(), 3);
        assert_eq!(terminals[0].phrase_id, 1);
        assert_eq!(terminals[1].phrase_id, 2);
        assert_eq!(terminals[2].phrase_id, 3);
    }

    #[tokio::test]
    async fn run_flushes_open_phrase_when_input_closes() {
        let (frame_tx, frame_rx) = mpsc::channel(16);
        let (window_tx, mut window_rx) = mpsc::channel(16);

        let segmenter = Segmenter::new(test_config());
        let task = tokio::spawn(segmenter.run(frame_rx, window_tx));

        frame_tx.send(speech_frame(0)).await.unwrap();
        frame_tx.send(speech_frame(1)).await.unwrap();
        drop(frame_tx);

        task.await.unwrap();

        let window = window_rx.recv().await.expect("terminal window");
        assert!(window.terminal);
        assert_eq!(window.reason, Some(FinalizeReason::Shutdown));
        assert_eq!(window.samples.len(), 8000);
        assert!(window_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn run_emits_step_and_terminal_windows() {
        let (frame_tx, frame_rx) = mpsc::channel(32);
        let (window_tx, mut window_rx) = mpsc::channel(32);

        let segmenter = Segmenter::new(test_config());
        tokio::spawn(segmenter.run(frame_rx, window_tx));

        for seq in 0..4 {
            frame_tx.send(speech_frame(seq)).await.unwrap();
        }
        for seq in 4..6 {
            frame_tx.send(silence_frame(seq)).await.unwrap();
        }
        drop(frame_tx);

        let first = window_rx.recv().await.expect("step window");
        assert!(!first.terminal);
        let second = window_rx.recv().await.expect("terminal window");
        assert!(second.terminal);
        assert!(window_rx.recv().await.is_none());
    }
}
