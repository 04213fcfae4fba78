//! Streaming windower.
//!
//! Emits cumulative transcription windows for the phrase currently
//! accumulating: every time a step's worth of new audio has arrived, a
//! window covering the entire phrase so far goes out. Re-transcribing
//! the growing window lets later hypotheses revise earlier words, which
//! the merger exploits to grow a stable prefix.

use crate::streaming::frame::{FinalizeReason, Window};

/// Per-phrase window emission state.
///
/// Call [`reset`](Self::reset) when a new phrase starts.
pub struct Windower {
    step_samples: usize,
    /// Phrase length (in samples) when the last window was emitted.
    emitted_len: usize,
    next_seq: u32,
}

impl Windower {
    /// `step_samples` is the amount of fresh audio required between
    /// successive windows.
    pub fn new(step_samples: usize) -> Self {
        Self {
            step_samples,
            emitted_len: 0,
            next_seq: 0,
        }
    }

    /// Called after new audio was appended to the phrase. Returns a
    /// cumulative window when a full step of new audio has accumulated.
    pub fn on_audio(&mut self, phrase_id: u64, phrase_samples: &[i16]) -> Option<Window> {
        if phrase_samples.len() - self.emitted_len < self.step_samples {
            return None;
        }

        self.emitted_len = phrase_samples.len();
        let seq = self.next_seq;
        self.next_seq += 1;

        Some(Window {
            phrase_id,
            seq,
            samples: phrase_samples.to_vec(),
            terminal: false,
            reason: None,
        })
    }

    /// Builds the terminal window covering the complete phrase.
    ///
    /// Always emitted regardless of how much audio arrived since the
    /// last window.
    pub fn terminal(
        &mut self,
        phrase_id: u64,
        phrase_samples: &[i16],
        reason: FinalizeReason,
    ) -> Window {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.emitted_len = phrase_samples.len();

        Window {
            phrase_id,
            seq,
            samples: phrase_samples.to_vec(),
            terminal: true,
            reason: Some(reason),
        }
    }

    /// Clears emission state for the next phrase.
    pub fn reset(&mut self) {
        self.emitted_len = 0;
        self.next_seq = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: usize = 16000; // 1 second at 16kHz

    #[test]
    fn no_window_before_first_step() {
        let mut windower = Windower::new(STEP);
        let phrase = vec![100i16; STEP - 1];
        assert!(windower.on_audio(1, &phrase).is_none());
    }

    #[test]
    fn window_emitted_at_step_boundary() {
        let mut windower = Windower::new(STEP);
        let phrase = vec![100i16; STEP];

        let window = windower.on_audio(1, &phrase).expect("window at step");
        assert_eq!(window.phrase_id, 1);
        assert_eq!(window.seq, 0);
        assert_eq!(window.samples.len(), STEP);
        assert!(!window.terminal);
    }

    #[test]
    fn windows_are_cumulative_supersets() {
        let mut windower = Windower::new(STEP);

        // Phrase audio distinguishable by position
        let mut phrase: Vec<i16> = (0..STEP as i32).map(|i| (i % 1000) as i16).collect();
        let first = windower.on_audio(7, &phrase).expect("first window");

        phrase.extend((0..STEP as i32).map(|i| ((i + 7) % 1000) as i16));
        let second = windower.on_audio(7, &phrase).expect("second window");

        assert_eq!(second.seq, 1);
        assert!(second.samples.len() > first.samples.len());
        // Superset property: second window starts with the first
        assert_eq!(&second.samples[..first.samples.len()], &first.samples[..]);
    }

    #[test]
    fn partial_step_does_not_emit_between_windows() {
        let mut windower = Windower::new(STEP);
        let mut phrase = vec![100i16; STEP];

        assert!(windower.on_audio(1, &phrase).is_some());

        phrase.extend(vec![100i16; STEP / 2]);
        assert!(windower.on_audio(1, &phrase).is_none());

        phrase.extend(vec![100i16; STEP / 2]);
        assert!(windower.on_audio(1, &phrase).is_some());
    }

    #[test]
    fn terminal_window_covers_full_phrase() {
        let mut windower = Windower::new(STEP);
        let mut phrase = vec![100i16; STEP];

        let first = windower.on_audio(1, &phrase).expect("window");

        // A bit of trailing audio below the step threshold
        phrase.extend(vec![200i16; 500]);
        let terminal = windower.terminal(1, &phrase, FinalizeReason::Silence);

        assert!(terminal.terminal);
        assert_eq!(terminal.reason, Some(FinalizeReason::Silence));
        assert_eq!(terminal.seq, first.seq + 1);
        assert_eq!(terminal.samples.len(), phrase.len());
        assert_eq!(&terminal.samples[..first.samples.len()], &first.samples[..]);
    }

    #[test]
    fn terminal_emitted_even_without_prior_windows() {
        let mut windower = Windower::new(STEP);
        // Short phrase that never reached a step boundary
        let phrase = vec![100i16; 2000];

        let terminal = windower.terminal(3, &phrase, FinalizeReason::Shutdown);
        assert!(terminal.terminal);
        assert_eq!(terminal.seq, 0);
        assert_eq!(terminal.samples.len(), 2000);
    }

    #[test]
    fn reset_starts_sequence_over() {
        let mut windower = Windower::new(STEP);
        let phrase = vec![100i16; STEP];

        let w = windower.on_audio(1, &phrase).expect("window");
        assert_eq!(w.seq, 0);
        let _ = windower.terminal(1, &phrase, FinalizeReason::Silence);

        windower.reset();

        let w = windower.on_audio(2, &phrase).expect("window after reset");
        assert_eq!(w.seq, 0);
        assert_eq!(w.phrase_id, 2);
    }
}
