//! Downstream partitioned log client abstraction.
//!
//! Recovery only needs a handful of consumer capabilities: list partitions,
//! look up a partition's end offset, position a cursor and poll. Anything
//! that offers these can be scanned.

use std::time::Duration;

use crate::config::SeekerConfig;
use crate::error::Result;

/// A record read from the downstream log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub payload: Option<Vec<u8>>,
}

/// Blocking consumer operations over a partitioned log.
pub trait PartitionedLog {
    /// Partition ids of `topic`.
    ///
    /// # Errors
    /// Returns an error if the topic metadata cannot be fetched.
    fn partitions(&mut self, topic: &str) -> Result<Vec<i32>>;

    /// Offset one past the last record of a partition.
    ///
    /// # Errors
    /// Returns an error if the offset lookup fails.
    fn end_offset(&mut self, topic: &str, partition: i32) -> Result<i64>;

    /// Make `partition` the only assigned partition and position the cursor
    /// at `offset`.
    ///
    /// # Errors
    /// Returns an error if the assignment or seek fails.
    fn seek(&mut self, topic: &str, partition: i32, offset: i64) -> Result<()>;

    /// Read whatever is available from the cursor, waiting at most `timeout`.
    /// An empty result is not an error.
    ///
    /// # Errors
    /// Returns an error on broker or protocol failure.
    fn poll(&mut self, timeout: Duration) -> Result<Vec<LogRecord>>;
}

/// Opens short-lived log connections for recovery.
pub trait LogConnector {
    type Log: PartitionedLog;

    /// Open a new connection. The connection is closed when dropped.
    ///
    /// # Errors
    /// Returns an error if the client cannot be created.
    fn connect(&self, config: &SeekerConfig) -> Result<Self::Log>;
}
