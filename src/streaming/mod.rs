//! Streaming pipeline for live transcription and translation.
//!
//! Implements a multi-station pipeline architecture:
//! ```text
//! ┌───────────┐    ┌───────────┐    ┌───────────────┐    ┌────────┐    ┌────────────┐
//! │ AudioFeed │───▶│ Segmenter │───▶│ Transcription │───▶│ Merger │───▶│ Translation│
//! │           │    │           │    │     Pool      │    │        │    │ Dispatcher │
//! └───────────┘    └───────────┘    └───────────────┘    └────────┘    └────────────┘
//!     frames          windows          hypotheses         phrases        events
//! ```
//! The segmenter gates frames on speech activity and cuts phrases on
//! silence or length; each phrase is transcribed as a series of growing
//! cumulative windows so text appears while the speaker is still
//! talking.

pub mod feed;
pub mod frame;
pub mod merger;
pub mod pipeline;
pub mod pool;
pub mod segmenter;
pub mod windower;

pub use feed::{AudioFeed, AudioFeedHandle, FeedConfig};
pub use frame::{AudioFrame, FinalizeReason, FinalizedPhrase, Hypothesis, Window};
pub use merger::StableTextMerger;
pub use pipeline::{Pipeline, PipelineConfig, PipelineHandle};
pub use pool::{PoolConfig, TranscriptionPool};
pub use segmenter::{Segmenter, SegmenterConfig};
pub use windower::Windower;
