//! Resumption layer for the replicator's applier.
//!
//! After a restart the source stream is replayed from an earlier position
//! than the last event published downstream. This crate works out where to
//! resume and drops the replayed prefix:
//!
//! - **Recovery**: scan the tail record of every partition of the downstream
//!   topic and pick the latest checkpoint
//! - **Seeker**: a latch that drops events up to that checkpoint and forwards
//!   everything after it
//! - **Logs**: the [`PartitionedLog`] seam, with an in-memory implementation
//!   and a Kafka one behind the `kafka` feature
//!
//! # Example
//!
//! ```ignore
//! use replicator_applier::{seek_iter, CheckpointSeeker, KafkaConnector, SeekerConfig};
//!
//! let config = SeekerConfig::from_map(&settings)?;
//! let seeker = CheckpointSeeker::recover(&config, &KafkaConnector, None)?;
//! for event in seek_iter(replayed_events, seeker) {
//!     publish(event)?;
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod config;
pub mod error;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod log;
pub mod memory;
pub mod recovery;
pub mod seeker;
pub mod stream;

pub use config::SeekerConfig;
pub use error::{Error, Result};
#[cfg(feature = "kafka")]
pub use kafka::{KafkaConnector, KafkaLog};
pub use log::{LogConnector, LogRecord, PartitionedLog};
pub use memory::{FailPoint, InMemoryConnector, InMemoryLog};
pub use recovery::{
    RecoveryReport, decode_checkpoint, recover_checkpoint, recover_checkpoint_async,
    scan_latest_checkpoint,
};
pub use seeker::{CheckpointSeeker, EventSeeker, SeekerState};
pub use stream::{SeekIter, SeekStreamExt, seek_iter};

pub use replicator_model::{Checkpoint, Event, compare_checkpoints, latest_checkpoint};
