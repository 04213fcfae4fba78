//! Bounded transcription worker pool.
//!
//! Windows arrive faster than a model can process them when speech is
//! continuous, so the pool keeps at most `queue_depth` windows pending
//! and evicts the oldest non-terminal window on overflow. Dropping a
//! stale cumulative window loses nothing permanent because the next
//! window for the same phrase is a superset of it. Terminal windows
//! carry the definitive audio for a phrase and are never dropped.

use crate::audio::gate::calculate_rms;
use crate::defaults;
use crate::events::{EventSender, PipelineEvent};
use crate::stt::filter;
use crate::stt::recognizer::Recognizer;
use crate::streaming::frame::{Hypothesis, Window};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};

/// Configuration for the transcription pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of concurrent recognition workers
    pub workers: usize,
    /// Maximum pending windows before eviction kicks in
    pub queue_depth: usize,
    /// Non-terminal windows quieter than this are skipped outright
    pub min_energy: f32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: defaults::TRANSCRIPTION_WORKERS,
            queue_depth: defaults::WINDOW_QUEUE_DEPTH,
            min_energy: defaults::MIN_ENERGY_FOR_TRANSCRIPTION,
        }
    }
}

/// Runs recognition over windows with bounded concurrency and a bounded
/// pending queue.
pub struct TranscriptionPool<R: Recognizer + 'static> {
    recognizer: Arc<R>,
    config: PoolConfig,
}

impl<R: Recognizer + 'static> TranscriptionPool<R> {
    pub fn new(recognizer: Arc<R>, config: PoolConfig) -> Self {
        Self { recognizer, config }
    }

    /// Consume windows from `input` and emit one hypothesis per
    /// recognized window on `output`.
    ///
    /// Returns once `input` closes and all in-flight work has drained.
    /// Recognition failures are reported on `events` and never stop the
    /// pool; a failed terminal window still produces an empty terminal
    /// hypothesis so the phrase can close downstream.
    pub async fn run(
        self,
        mut input: mpsc::Receiver<Window>,
        output: mpsc::Sender<Hypothesis>,
        events: Option<EventSender>,
    ) {
        let workers = self.config.workers.max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut pending: VecDeque<Window> = VecDeque::new();
        let mut input_open = true;

        loop {
            if !input_open && pending.is_empty() {
                break;
            }

            tokio::select! {
                maybe_window = input.recv(), if input_open => {
                    match maybe_window {
                        Some(window) => {
                            if !window.terminal
                                && calculate_rms(&window.samples) < self.config.min_energy
                            {
                                tracing::trace!(
                                    phrase_id = window.phrase_id,
                                    seq = window.seq,
                                    "skipping near-silent window"
                                );
                                continue;
                            }
                            pending.push_back(window);
                            if let Some(dropped) =
                                evict_if_over(&mut pending, self.config.queue_depth)
                            {
                                tracing::debug!(
                                    phrase_id = dropped.phrase_id,
                                    seq = dropped.seq,
                                    "queue full, dropped oldest non-terminal window"
                                );
                            }
                        }
                        None => input_open = false,
                    }
                }
                permit = semaphore.clone().acquire_owned(), if !pending.is_empty() => {
                    let Ok(permit) = permit else { break };
                    let Some(window) = pending.pop_front() else { continue };
                    self.spawn_worker(window, permit, output.clone(), events.clone());
                }
            }
        }

        // Wait for all in-flight recognitions to finish.
        let _ = semaphore.acquire_many(workers as u32).await;
    }

    fn spawn_worker(
        &self,
        window: Window,
        permit: tokio::sync::OwnedSemaphorePermit,
        output: mpsc::Sender<Hypothesis>,
        events: Option<EventSender>,
    ) {
        let recognizer = Arc::clone(&self.recognizer);
        tokio::spawn(async move {
            let _permit = permit;
            let Window {
                phrase_id,
                seq,
                samples,
                terminal,
                ..
            } = window;

            let result =
                tokio::task::spawn_blocking(move || recognizer.recognize(&samples)).await;

            let text = match result {
                Ok(Ok(text)) => {
                    if filter::is_hallucination(&text) {
                        tracing::debug!(phrase_id, seq, %text, "discarding hallucinated output");
                        String::new()
                    } else {
                        text
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(phrase_id, seq, error = %e, "recognition failed");
                    if let Some(events) = &events {
                        let _ = events.send(PipelineEvent::Error {
                            phrase_id: Some(phrase_id),
                            message: format!("recognition failed: {}", e),
                        });
                    }
                    if !terminal {
                        return;
                    }
                    String::new()
                }
                Err(e) => {
                    tracing::error!(phrase_id, seq, error = %e, "recognition task panicked");
                    if let Some(events) = &events {
                        let _ = events.send(PipelineEvent::Error {
                            phrase_id: Some(phrase_id),
                            message: format!("recognition task panicked: {}", e),
                        });
                    }
                    if !terminal {
                        return;
                    }
                    String::new()
                }
            };

            let _ = output
                .send(Hypothesis {
                    phrase_id,
                    seq,
                    text,
                    terminal,
                })
                .await;
        });
    }
}

/// Drops the oldest non-terminal window if the queue exceeds `depth`.
///
/// The queue may exceed `depth` when every pending window is terminal;
/// terminal windows are never sacrificed.
fn evict_if_over(pending: &mut VecDeque<Window>, depth: usize) -> Option<Window> {
    if pending.len() <= depth {
        return None;
    }
    let position = pending.iter().position(|w| !w.terminal)?;
    pending.remove(position)
}
