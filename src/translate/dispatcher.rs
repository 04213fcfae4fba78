//! Concurrent translation with ordered release.
//!
//! Finalized phrases are translated by a small worker pool, so a slow
//! request does not stall the pipeline. Results are buffered and
//! released strictly in phrase-finalization order; a failed phrase is
//! released as a failure event in its slot rather than holding up the
//! phrases behind it.

use crate::defaults;
use crate::error::Result;
use crate::events::{EventSender, PipelineEvent};
use crate::streaming::frame::FinalizedPhrase;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::translator::Translator;

/// Configuration for the translation dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of concurrent translation requests
    pub workers: usize,
    /// Retries per phrase for retryable failures
    pub max_retries: u32,
    /// Initial retry backoff, doubled per attempt
    pub backoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: defaults::TRANSLATION_WORKERS,
            max_retries: defaults::TRANSLATION_MAX_RETRIES,
            backoff: Duration::from_millis(defaults::TRANSLATION_BACKOFF_MS),
        }
    }
}

pub struct TranslationDispatcher<T: Translator + 'static> {
    translator: Arc<T>,
    target_lang: String,
    config: DispatcherConfig,
}

type Completion = (u64, std::result::Result<String, String>);

impl<T: Translator + 'static> TranslationDispatcher<T> {
    pub fn new(translator: Arc<T>, target_lang: &str, config: DispatcherConfig) -> Self {
        Self {
            translator,
            target_lang: target_lang.to_string(),
            config,
        }
    }

    /// Translate phrases from `input`, emitting `TranslationReady` and
    /// `TranslationFailed` events in phrase order.
    ///
    /// Returns once `input` closes and every accepted phrase has been
    /// released.
    pub async fn run(self, mut input: mpsc::Receiver<FinalizedPhrase>, events: EventSender) {
        let (job_tx, job_rx) = mpsc::unbounded_channel::<FinalizedPhrase>();
        let job_rx = Arc::new(tokio::sync::Mutex::new(job_rx));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();

        for _ in 0..self.config.workers.max(1) {
            let translator = Arc::clone(&self.translator);
            let target_lang = self.target_lang.clone();
            let job_rx = Arc::clone(&job_rx);
            let done_tx = done_tx.clone();
            let max_retries = self.config.max_retries;
            let backoff = self.config.backoff;
            tokio::spawn(async move {
                loop {
                    let job = job_rx.lock().await.recv().await;
                    let Some(phrase) = job else { break };
                    let result = translate_with_retry(
                        &translator,
                        &phrase.text,
                        &target_lang,
                        max_retries,
                        backoff,
                    )
                    .await;
                    let outcome = result.map_err(|e| e.to_string());
                    if done_tx.send((phrase.phrase_id, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(done_tx);

        let mut job_tx = Some(job_tx);
        let mut order: VecDeque<u64> = VecDeque::new();
        let mut completed: HashMap<u64, std::result::Result<String, String>> = HashMap::new();

        loop {
            tokio::select! {
                maybe_phrase = input.recv(), if job_tx.is_some() => {
                    match maybe_phrase {
                        Some(phrase) => {
                            order.push_back(phrase.phrase_id);
                            if let Some(tx) = &job_tx {
                                let _ = tx.send(phrase);
                            }
                        }
                        // Dropping the job sender lets the workers
                        // drain and exit.
                        None => job_tx = None,
                    }
                }
                maybe_done = done_rx.recv() => {
                    match maybe_done {
                        Some((phrase_id, outcome)) => {
                            completed.insert(phrase_id, outcome);
                            release_ready(&mut order, &mut completed, &events);
                        }
                        None => break,
                    }
                }
            }
        }

        release_ready(&mut order, &mut completed, &events);
    }
}

/// Emit events for every leading phrase whose translation has arrived.
fn release_ready(
    order: &mut VecDeque<u64>,
    completed: &mut HashMap<u64, std::result::Result<String, String>>,
    events: &EventSender,
) {
    while let Some(&phrase_id) = order.front() {
        let Some(outcome) = completed.remove(&phrase_id) else {
            break;
        };
        order.pop_front();
        let event = match outcome {
            Ok(text) => PipelineEvent::TranslationReady { phrase_id, text },
            Err(message) => {
                tracing::warn!(phrase_id, %message, "translation failed permanently");
                PipelineEvent::TranslationFailed { phrase_id, message }
            }
        };
        let _ = events.send(event);
    }
}

async fn translate_with_retry<T: Translator>(
    translator: &T,
    text: &str,
    target_lang: &str,
    max_retries: u32,
    backoff: Duration,
) -> Result<String> {
    let mut attempt = 0u32;
    loop {
        match translator.translate(text, target_lang).await {
            Ok(translation) => return Ok(translation),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = backoff.saturating_mul(2u32.saturating_pow(attempt));
                tracing::debug!(error = %e, attempt, "translation attempt failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
