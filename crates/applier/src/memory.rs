//! In-process partitioned log.
//!
//! Used for tests and dry runs. Behaves like a consumer over a fixed set of
//! partitions: one partition assigned at a time, an explicit cursor, and
//! polls that return everything from the cursor to the end of the partition.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use replicator_model::AugmentedEventHeader;

use crate::config::SeekerConfig;
use crate::error::{Error, Result};
use crate::log::{LogConnector, LogRecord, PartitionedLog};

const MAX_POLL_RECORDS: usize = 500;

/// Operation that should fail on the next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Partitions,
    EndOffset(i32),
    Seek(i32),
    Poll(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredRecord {
    key: Option<Vec<u8>>,
    payload: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cursor {
    topic: String,
    partition: i32,
    offset: i64,
}

/// Decrements the open-connection count when the last clone is dropped.
#[derive(Debug)]
struct ConnectionGuard(Arc<AtomicUsize>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory partitioned log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLog {
    topics: HashMap<String, BTreeMap<i32, Vec<StoredRecord>>>,
    cursor: Option<Cursor>,
    fail_point: Option<FailPoint>,
    guard: Option<Arc<ConnectionGuard>>,
}

impl InMemoryLog {
    /// Create an empty log with no topics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `topic` with `partitions` empty partitions. Existing partitions
    /// are kept.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>, partitions: i32) -> Self {
        let entry = self.topics.entry(topic.into()).or_default();
        for partition in 0..partitions {
            entry.entry(partition).or_default();
        }
        self
    }

    /// Make the given operation fail.
    #[must_use]
    pub fn with_fail_point(mut self, fail_point: FailPoint) -> Self {
        self.fail_point = Some(fail_point);
        self
    }

    /// Append a raw record and return its offset.
    ///
    /// # Errors
    /// Returns `Error::Log` if the topic or partition does not exist.
    pub fn append(
        &mut self,
        topic: &str,
        partition: i32,
        key: Option<Vec<u8>>,
        payload: Option<Vec<u8>>,
    ) -> Result<i64> {
        let records = self.partition_mut(topic, partition, "append")?;
        let offset = offset_of(records.len());
        records.push(StoredRecord { key, payload });
        Ok(offset)
    }

    /// Append a record keyed by a JSON-encoded header, the way the publisher
    /// writes events.
    ///
    /// # Errors
    /// Returns `Error::Log` if the topic or partition does not exist or the
    /// header cannot be encoded.
    pub fn append_header(
        &mut self,
        topic: &str,
        partition: i32,
        header: &AugmentedEventHeader,
    ) -> Result<i64> {
        let key = serde_json::to_vec(header).map_err(|e| Error::log("append", e.to_string()))?;
        self.append(topic, partition, Some(key), None)
    }

    fn partition_mut(
        &mut self,
        topic: &str,
        partition: i32,
        operation: &str,
    ) -> Result<&mut Vec<StoredRecord>> {
        self.topics
            .get_mut(topic)
            .and_then(|partitions| partitions.get_mut(&partition))
            .ok_or_else(|| Error::log(operation, format!("unknown partition {topic}/{partition}")))
    }

    fn partition(&self, topic: &str, partition: i32, operation: &str) -> Result<&[StoredRecord]> {
        self.topics
            .get(topic)
            .and_then(|partitions| partitions.get(&partition))
            .map(Vec::as_slice)
            .ok_or_else(|| Error::log(operation, format!("unknown partition {topic}/{partition}")))
    }

    fn check(&self, point: FailPoint) -> Result<()> {
        if self.fail_point == Some(point) {
            return Err(Error::log(
                format!("{point:?}"),
                "injected failure".to_string(),
            ));
        }
        Ok(())
    }
}

impl PartitionedLog for InMemoryLog {
    fn partitions(&mut self, topic: &str) -> Result<Vec<i32>> {
        self.check(FailPoint::Partitions)?;
        self.topics
            .get(topic)
            .map(|partitions| partitions.keys().copied().collect())
            .ok_or_else(|| Error::log("partitions", format!("unknown topic {topic}")))
    }

    fn end_offset(&mut self, topic: &str, partition: i32) -> Result<i64> {
        self.check(FailPoint::EndOffset(partition))?;
        self.partition(topic, partition, "end_offset")
            .map(|records| offset_of(records.len()))
    }

    fn seek(&mut self, topic: &str, partition: i32, offset: i64) -> Result<()> {
        self.check(FailPoint::Seek(partition))?;
        let end = offset_of(self.partition(topic, partition, "seek")?.len());
        if offset < 0 || offset > end {
            return Err(Error::log(
                "seek",
                format!("offset {offset} out of range for {topic}/{partition} (end {end})"),
            ));
        }
        self.cursor = Some(Cursor {
            topic: topic.to_string(),
            partition,
            offset,
        });
        Ok(())
    }

    fn poll(&mut self, _timeout: Duration) -> Result<Vec<LogRecord>> {
        let Some(cursor) = self.cursor.clone() else {
            return Err(Error::log("poll", "no partition assigned"));
        };
        self.check(FailPoint::Poll(cursor.partition))?;

        let records = self.partition(&cursor.topic, cursor.partition, "poll")?;
        let start = usize::try_from(cursor.offset).unwrap_or(usize::MAX);
        let batch: Vec<LogRecord> = records
            .iter()
            .enumerate()
            .skip(start)
            .take(MAX_POLL_RECORDS)
            .map(|(index, record)| LogRecord {
                topic: cursor.topic.clone(),
                partition: cursor.partition,
                offset: offset_of(index),
                key: record.key.clone(),
                payload: record.payload.clone(),
            })
            .collect();

        let next = cursor
            .offset
            .saturating_add(i64::try_from(batch.len()).unwrap_or(i64::MAX));
        self.cursor = Some(Cursor {
            offset: next,
            ..cursor
        });
        Ok(batch)
    }
}

fn offset_of(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

/// Hands out independent connections to a snapshot of an [`InMemoryLog`]
/// and tracks how many are still open.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnector {
    log: InMemoryLog,
    open: Arc<AtomicUsize>,
}

impl InMemoryConnector {
    #[must_use]
    pub fn new(log: InMemoryLog) -> Self {
        Self {
            log,
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Connections handed out and not yet dropped.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

impl LogConnector for InMemoryConnector {
    type Log = InMemoryLog;

    fn connect(&self, config: &SeekerConfig) -> Result<Self::Log> {
        tracing::debug!(
            bootstrap_servers = %config.bootstrap_servers,
            group_id = %config.group_id,
            "Opening in-memory log connection"
        );
        self.open.fetch_add(1, Ordering::SeqCst);
        let mut log = self.log.clone();
        log.cursor = None;
        log.guard = Some(Arc::new(ConnectionGuard(Arc::clone(&self.open))));
        Ok(log)
    }
}
