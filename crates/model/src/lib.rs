//! Binlog event model for the replicator.
//!
//! - **Checkpoints**: stream positions with a total order that prefers
//!   pseudo-GTIDs over binlog coordinates
//! - **Headers**: raw binlog headers and their augmented (decorated) form
//! - **Bodies**: row mutations as a sum type, plus the few control events
//!   the pipeline cares about

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod checkpoint;
pub mod data;
pub mod event;
pub mod header;

pub use checkpoint::{Checkpoint, compare_checkpoints, fold_latest, latest_checkpoint};
pub use data::{
    CellValue, DeleteRowsEventData, EventData, IncludedColumns, Row, UpdateRowsEventData,
    WriteRowsEventData,
};
pub use event::Event;
pub use header::{AugmentedEventHeader, EventHeader, EventType, HeaderOverrides};
