//! Merges per-window hypotheses into stable and partial display text.
//!
//! Cumulative windows re-transcribe a growing prefix of the phrase, so
//! successive hypotheses mostly agree on their early words and churn at
//! the tail. Words two consecutive hypotheses agree on are promoted to
//! the stable prefix, which never shrinks or changes for a phrase. The
//! remainder of the newest hypothesis is shown as the partial tail.
//!
//! Terminal hypotheses can complete out of phrase order when several
//! recognition workers run concurrently (a long phrase's terminal
//! window outlasting the next short phrase's). Finalizations are
//! therefore buffered and released strictly in phrase-id order, which
//! is speech order.

use crate::events::{EventSender, PipelineEvent};
use crate::streaming::frame::{FinalizedPhrase, Hypothesis};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

#[derive(Debug, Default)]
struct PhraseText {
    stable: Vec<String>,
    partial: String,
    prev_text: String,
    last_seq: Option<u32>,
}

/// Finalization computed when a phrase's terminal hypothesis arrived,
/// held back until every earlier phrase has closed. Both fields are
/// `Some` unless the phrase produced no text at all.
#[derive(Debug, Default)]
struct ClosedPhrase {
    display: Option<PipelineEvent>,
    finalized: Option<FinalizedPhrase>,
}

/// Tracks display text per phrase and finalizes phrases on terminal
/// hypotheses, releasing finalizations in phrase-id order.
#[derive(Debug)]
pub struct StableTextMerger {
    phrases: HashMap<u64, PhraseText>,
    /// Closed phrases waiting for an earlier phrase to close.
    pending_close: BTreeMap<u64, ClosedPhrase>,
    /// Lowest phrase id not yet released.
    next_release: u64,
    /// Highest phrase id whose terminal hypothesis has been seen, used
    /// to drop stragglers that arrive after their phrase closed.
    max_closed: Option<u64>,
}

impl Default for StableTextMerger {
    fn default() -> Self {
        Self::new()
    }
}

/// What processing one hypothesis produced.
///
/// `displays` and `finalized` are aligned: when `finalized` is
/// non-empty, `displays[i]` is the closing update for `finalized[i]`.
#[derive(Debug, Default, PartialEq)]
pub struct MergeOutcome {
    /// Display events ready to emit
    pub displays: Vec<PipelineEvent>,
    /// Phrases whose transcription closed, in phrase-id order
    pub finalized: Vec<FinalizedPhrase>,
}

impl StableTextMerger {
    pub fn new() -> Self {
        Self {
            phrases: HashMap::new(),
            pending_close: BTreeMap::new(),
            next_release: 1,
            max_closed: None,
        }
    }

    /// Fold one hypothesis into the phrase state.
    pub fn process(&mut self, hyp: Hypothesis) -> MergeOutcome {
        if hyp.terminal {
            return self.finalize(hyp.phrase_id, hyp.text);
        }

        // Hypotheses for an already-closed phrase can trail in from a
        // slow worker. Phrase ids are monotonic, so anything at or
        // below the close watermark without live state is late.
        if !self.phrases.contains_key(&hyp.phrase_id)
            && self.max_closed.is_some_and(|max| hyp.phrase_id <= max)
        {
            tracing::trace!(phrase_id = hyp.phrase_id, seq = hyp.seq, "dropping late hypothesis");
            return MergeOutcome::default();
        }

        let state = self.phrases.entry(hyp.phrase_id).or_default();
        if state.last_seq.is_some_and(|last| hyp.seq <= last) {
            // A newer window already superseded this one.
            return MergeOutcome::default();
        }
        state.last_seq = Some(hyp.seq);

        let words: Vec<String> = hyp.text.split_whitespace().map(str::to_string).collect();
        let agreed = common_prefix_len(
            &state
                .prev_text
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>(),
            &words,
        );

        // Promote agreed words, but only as an extension of what is
        // already stable. Agreement that contradicts the committed
        // prefix leaves it frozen.
        let mut stable_grew = false;
        if agreed > state.stable.len() && words[..state.stable.len().min(agreed)] == state.stable[..]
        {
            state.stable = words[..agreed].to_vec();
            stable_grew = true;
        }

        // Partial is everything beyond the stable prefix, even when the
        // hypothesis disagrees with a committed word.
        let shown = state.stable.len().min(words.len());
        let partial = words[shown..].join(" ");
        state.prev_text = hyp.text;

        if !stable_grew && partial == state.partial {
            return MergeOutcome::default();
        }
        state.partial = partial;

        MergeOutcome {
            displays: vec![PipelineEvent::DisplayUpdated {
                phrase_id: hyp.phrase_id,
                stable: state.stable.join(" "),
                partial: state.partial.clone(),
            }],
            finalized: Vec::new(),
        }
    }

    fn finalize(&mut self, phrase_id: u64, text: String) -> MergeOutcome {
        let state = self.phrases.remove(&phrase_id).unwrap_or_default();
        self.max_closed = Some(self.max_closed.map_or(phrase_id, |m| m.max(phrase_id)));

        // A failed or hallucinated terminal recognition falls back to
        // whatever was already stable.
        let final_text = if text.trim().is_empty() {
            state.stable.join(" ")
        } else {
            text
        };

        // A phrase with no recognized text still occupies its release
        // slot so it cannot block later phrases.
        let closed = if final_text.is_empty() {
            ClosedPhrase::default()
        } else {
            ClosedPhrase {
                display: Some(PipelineEvent::DisplayUpdated {
                    phrase_id,
                    stable: final_text.clone(),
                    partial: String::new(),
                }),
                finalized: Some(FinalizedPhrase {
                    phrase_id,
                    text: final_text,
                }),
            }
        };
        self.pending_close.insert(phrase_id, closed);
        self.release_ready()
    }

    /// Pop consecutively-closed phrases starting at `next_release`.
    /// Phrase n+1's finalization waits until phrase n has closed.
    fn release_ready(&mut self) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        while let Some(closed) = self.pending_close.remove(&self.next_release) {
            self.next_release += 1;
            if let Some(event) = closed.display {
                outcome.displays.push(event);
            }
            if let Some(phrase) = closed.finalized {
                outcome.finalized.push(phrase);
            }
        }
        outcome
    }

    /// Runs the merger as a pipeline station.
    ///
    /// Display updates go to `events` at most once per `update_interval`
    /// per phrase, latest state winning; the closing update on finalize
    /// goes out immediately. Finalized phrases go to `output` for
    /// translation. Returns when `input` closes.
    pub async fn run(
        mut self,
        mut input: mpsc::Receiver<Hypothesis>,
        output: mpsc::Sender<FinalizedPhrase>,
        events: Option<EventSender>,
        update_interval: Duration,
    ) {
        // Latest unsent display state per phrase, held until the
        // interval timer fires.
        let mut dirty: BTreeMap<u64, PipelineEvent> = BTreeMap::new();
        let mut next_emit = Instant::now();

        'station: loop {
            tokio::select! {
                maybe_hyp = input.recv() => {
                    let Some(hyp) = maybe_hyp else { break };
                    let outcome = self.process(hyp);

                    if outcome.finalized.is_empty() {
                        for event in outcome.displays {
                            let PipelineEvent::DisplayUpdated { phrase_id, .. } = &event else {
                                continue;
                            };
                            let id = *phrase_id;
                            if dirty.is_empty() && Instant::now() >= next_emit {
                                next_emit = Instant::now() + update_interval;
                                if let Some(events) = &events {
                                    let _ = events.send(event);
                                }
                            } else {
                                dirty.insert(id, event);
                            }
                        }
                    } else {
                        // Closing updates bypass the coalescing timer
                        // and supersede anything pending.
                        for (event, phrase) in
                            outcome.displays.into_iter().zip(outcome.finalized)
                        {
                            dirty.remove(&phrase.phrase_id);
                            if let Some(events) = &events {
                                let _ = events.send(event);
                                let _ = events.send(PipelineEvent::PhraseFinalized {
                                    phrase_id: phrase.phrase_id,
                                    text: phrase.text.clone(),
                                });
                            }
                            if output.send(phrase).await.is_err() {
                                break 'station;
                            }
                        }
                    }
                }
                _ = sleep_until(next_emit), if !dirty.is_empty() => {
                    next_emit = Instant::now() + update_interval;
                    if let Some(events) = &events {
                        for (_, event) in std::mem::take(&mut dirty) {
                            let _ = events.send(event);
                        }
                    } else {
                        dirty.clear();
                    }
                }
            }
        }

        // Input closed with a phrase that never saw its terminal; the
        // phrases after it that did close are still released in order.
        for (_, closed) in std::mem::take(&mut self.pending_close) {
            if let Some(phrase) = closed.finalized {
                dirty.remove(&phrase.phrase_id);
                if let Some(events) = &events {
                    if let Some(event) = closed.display {
                        let _ = events.send(event);
                    }
                    let _ = events.send(PipelineEvent::PhraseFinalized {
                        phrase_id: phrase.phrase_id,
                        text: phrase.text.clone(),
                    });
                }
                let _ = output.send(phrase).await;
            }
        }

        // Whatever is still dirty is the last word.
        if let Some(events) = &events {
            for (_, event) in dirty {
                let _ = events.send(event);
            }
        }
    }
}

/// Number of leading words the two slices agree on.
fn common_prefix_len(a: &[String], b: &[String]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}
