//! Pipeline events delivered to consumers.
//!
//! The pipeline pushes events over a crossbeam channel so synchronous
//! consumers (an overlay thread, a console printer) can receive them
//! without touching the async runtime.

/// Sender half handed into the pipeline at startup.
pub type EventSender = crossbeam_channel::Sender<PipelineEvent>;

/// Receiver half kept by the consumer.
pub type EventReceiver = crossbeam_channel::Receiver<PipelineEvent>;

/// Creates an unbounded event channel.
pub fn channel() -> (EventSender, EventReceiver) {
    crossbeam_channel::unbounded()
}

/// Events emitted by the pipeline, in wall-clock order per phrase.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// The displayed text for a phrase changed.
    ///
    /// `stable` only ever grows for a given phrase; `partial` is the
    /// provisional tail and may be rewritten by later updates.
    DisplayUpdated {
        phrase_id: u64,
        stable: String,
        partial: String,
    },
    /// A phrase was finalized with its definitive transcription.
    PhraseFinalized { phrase_id: u64, text: String },
    /// A finalized phrase was translated.
    ///
    /// Released in phrase-finalization order, regardless of which
    /// translation finished first.
    TranslationReady { phrase_id: u64, text: String },
    /// Translation for a phrase failed permanently after retries.
    ///
    /// Released through the same ordering as `TranslationReady` so
    /// later phrases are not held up. Consumers typically render an
    /// "unavailable" marker in place of the translation.
    TranslationFailed { phrase_id: u64, message: String },
    /// A recoverable pipeline error, attributed to a phrase when known.
    Error {
        phrase_id: Option<u64>,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_delivers_events() {
        let (tx, rx) = channel();
        tx.send(PipelineEvent::PhraseFinalized {
            phrase_id: 1,
            text: "hello".to_string(),
        })
        .unwrap();

        match rx.recv().unwrap() {
            PipelineEvent::PhraseFinalized { phrase_id, text } => {
                assert_eq!(phrase_id, 1);
                assert_eq!(text, "hello");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_events_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<PipelineEvent>();
        assert_send::<EventSender>();
    }
}
