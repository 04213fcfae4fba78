//! Pipeline assembly and lifecycle.
//!
//! Wires the stations together over bounded channels:
//! ```text
//! ┌───────────┐    ┌───────────┐    ┌───────────────┐    ┌────────┐    ┌────────────┐
//! │ AudioFeed │───▶│ Segmenter │───▶│ Transcription │───▶│ Merger │───▶│ Translation│
//! │ (thread)  │    │           │    │     Pool      │    │        │    │ Dispatcher │
//! └───────────┘    └───────────┘    └───────────────┘    └────────┘    └────────────┘
//!    frames           windows          hypotheses          phrases        events
//! ```
//! Shutdown cascades through channel closure: stopping the feed closes
//! the frame channel, the segmenter flushes its open phrase and closes
//! the window channel, the pool drains in-flight work, the merger
//! finalizes, and the dispatcher releases its last translations.

use crate::audio::source::AudioSource;
use crate::config::Config;
use crate::defaults;
use crate::error::Result;
use crate::events::EventSender;
use crate::stt::recognizer::Recognizer;
use crate::translate::dispatcher::{DispatcherConfig, TranslationDispatcher};
use crate::translate::translator::Translator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::feed::{AudioFeed, AudioFeedHandle, FeedConfig};
use super::merger::StableTextMerger;
use super::pool::{PoolConfig, TranscriptionPool};
use super::segmenter::{Segmenter, SegmenterConfig};

/// Configuration for the full pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub segmenter: SegmenterConfig,
    pub pool: PoolConfig,
    pub dispatcher: DispatcherConfig,
    /// Minimum spacing between display updates for a phrase
    pub update_interval: Duration,
    /// Target language for translation
    pub target_lang: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            pool: PoolConfig::default(),
            dispatcher: DispatcherConfig::default(),
            update_interval: Duration::from_secs_f32(defaults::UPDATE_INTERVAL_SECS),
            target_lang: defaults::TARGET_LANG.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            segmenter: SegmenterConfig::from_audio(&config.audio),
            pool: PoolConfig {
                workers: config.stt.transcription_workers,
                ..PoolConfig::default()
            },
            dispatcher: DispatcherConfig {
                workers: config.translate.translation_workers,
                max_retries: config.translate.max_retries,
                backoff: Duration::from_millis(defaults::TRANSLATION_BACKOFF_MS),
            },
            update_interval: Duration::from_secs_f32(config.display.update_interval),
            target_lang: config.translate.target_lang.clone(),
        }
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    feed: AudioFeedHandle,
    tasks: Vec<JoinHandle<()>>,
}

impl PipelineHandle {
    /// Request shutdown. The stations drain and exit on their own;
    /// await [`wait`](Self::wait) for completion.
    pub fn stop(&self) {
        self.feed.stop();
    }

    /// True while the capture feed is still producing frames.
    pub fn is_running(&self) -> bool {
        self.feed.is_running()
    }

    /// Wait for every station to finish.
    pub async fn wait(self) {
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

/// Assembles and runs the capture-to-translation pipeline.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Start the pipeline over the given source, recognizer and
    /// optional translator.
    ///
    /// With `translator` set to `None`, phrases are finalized and
    /// displayed but not translated. All output is delivered as
    /// [`PipelineEvent`](crate::events::PipelineEvent)s on `events`.
    ///
    /// Must be called within a tokio runtime.
    pub fn start<A, R, T>(
        self,
        source: A,
        recognizer: Arc<R>,
        translator: Option<Arc<T>>,
        events: EventSender,
    ) -> Result<PipelineHandle>
    where
        A: AudioSource + 'static,
        R: Recognizer + 'static,
        T: Translator + 'static,
    {
        let feed = AudioFeed::with_config(
            source,
            FeedConfig {
                channel_buffer_size: defaults::FRAME_CHANNEL_CAPACITY,
                ..FeedConfig::default()
            },
        );
        let (frame_rx, feed_handle) = feed.start(Some(events.clone()))?;

        let (window_tx, window_rx) = mpsc::channel(defaults::STATION_CHANNEL_CAPACITY);
        let (hyp_tx, hyp_rx) = mpsc::channel(defaults::STATION_CHANNEL_CAPACITY);
        let (phrase_tx, mut phrase_rx) = mpsc::channel(defaults::STATION_CHANNEL_CAPACITY);

        let segmenter = Segmenter::new(self.config.segmenter);
        let pool = TranscriptionPool::new(recognizer, self.config.pool);
        let merger = StableTextMerger::new();

        let mut tasks = Vec::new();
        tasks.push(tokio::spawn(segmenter.run(frame_rx, window_tx)));
        tasks.push(tokio::spawn(pool.run(
            window_rx,
            hyp_tx,
            Some(events.clone()),
        )));
        tasks.push(tokio::spawn(merger.run(
            hyp_rx,
            phrase_tx,
            Some(events.clone()),
            self.config.update_interval,
        )));

        match translator {
            Some(translator) => {
                let dispatcher = TranslationDispatcher::new(
                    translator,
                    &self.config.target_lang,
                    self.config.dispatcher,
                );
                tasks.push(tokio::spawn(dispatcher.run(phrase_rx, events)));
            }
            None => {
                // Translation disabled: drain finalized phrases so the
                // merger never blocks on a full channel.
                tasks.push(tokio::spawn(async move {
                    while phrase_rx.recv().await.is_some() {}
                }));
            }
        }

        tracing::info!("pipeline started");
        Ok(PipelineHandle {
            feed: feed_handle,
            tasks,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
