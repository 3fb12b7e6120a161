//! Checkpoint recovery from the downstream log.
//!
//! Every record key written downstream is the JSON header of the event it
//! carries, so the tail record of each partition tells how far that
//! partition got. The latest of those tails (or the caller's default, if
//! nothing later is found) is where replication resumes.
//!
//! Recovery is all-or-nothing. Any failure aborts the scan: resuming from an
//! under-approximated position republishes events and an over-approximated
//! one silently skips them.

use std::time::Duration;

use replicator_model::{AugmentedEventHeader, Checkpoint, fold_latest};

use crate::config::SeekerConfig;
use crate::error::{Error, Result};
use crate::log::{LogConnector, LogRecord, PartitionedLog};

/// Outcome of a recovery scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Latest checkpoint found, or the default if nothing was later.
    pub checkpoint: Option<Checkpoint>,
    /// Partitions inspected.
    pub partitions_scanned: usize,
    /// Partitions that contributed no record.
    pub partitions_empty: usize,
    /// Tail records decoded.
    pub records_read: usize,
}

/// Scan every partition of `topic` over an already open log.
///
/// Partitions are visited sequentially; the fold is order independent so
/// the result does not depend on the order the log lists them in.
///
/// # Errors
/// Returns the first log or decoding error encountered. No partial result
/// is returned.
pub fn scan_latest_checkpoint<L>(
    log: &mut L,
    topic: &str,
    poll_timeout: Duration,
    default: Option<Checkpoint>,
) -> Result<RecoveryReport>
where
    L: PartitionedLog + ?Sized,
{
    let partitions = log.partitions(topic)?;
    let mut report = RecoveryReport {
        checkpoint: default,
        partitions_scanned: 0,
        partitions_empty: 0,
        records_read: 0,
    };

    for partition in partitions {
        report.partitions_scanned = report.partitions_scanned.saturating_add(1);

        let end = log.end_offset(topic, partition)?;
        let Some(tail) = end.checked_sub(1).filter(|offset| *offset >= 0) else {
            tracing::debug!(topic, partition, "Partition is empty");
            report.partitions_empty = report.partitions_empty.saturating_add(1);
            continue;
        };

        log.seek(topic, partition, tail)?;
        let records = log.poll(poll_timeout)?;
        if records.is_empty() {
            tracing::warn!(topic, partition, tail, "No tail record returned before poll timeout");
            report.partitions_empty = report.partitions_empty.saturating_add(1);
            continue;
        }

        for record in &records {
            let candidate = decode_checkpoint(record)?;
            tracing::debug!(
                topic,
                partition,
                offset = record.offset,
                checkpoint = ?candidate,
                "Read tail checkpoint"
            );
            report.checkpoint = fold_latest(report.checkpoint.take(), candidate);
            report.records_read = report.records_read.saturating_add(1);
        }
    }

    Ok(report)
}

/// Open a dedicated connection, scan the configured topic and close the
/// connection again, whatever the outcome.
///
/// # Errors
/// Returns an error if the connection cannot be opened or the scan fails.
pub fn recover_checkpoint<C>(
    connector: &C,
    config: &SeekerConfig,
    default: Option<Checkpoint>,
) -> Result<RecoveryReport>
where
    C: LogConnector + ?Sized,
{
    let mut log = connector.connect(config)?;
    let result = scan_latest_checkpoint(&mut log, &config.topic, config.poll_timeout, default);
    drop(log);

    match &result {
        Ok(report) => tracing::info!(
            topic = %config.topic,
            checkpoint = %describe(report.checkpoint.as_ref()),
            partitions = report.partitions_scanned,
            empty = report.partitions_empty,
            records = report.records_read,
            "Recovered checkpoint"
        ),
        Err(err) => tracing::error!(topic = %config.topic, error = %err, "Checkpoint recovery failed"),
    }
    result
}

/// Run [`recover_checkpoint`] on tokio's blocking pool.
///
/// # Errors
/// Returns the recovery error, or `Error::Log` if the blocking task was
/// cancelled or panicked.
pub async fn recover_checkpoint_async<C>(
    connector: C,
    config: SeekerConfig,
    default: Option<Checkpoint>,
) -> Result<RecoveryReport>
where
    C: LogConnector + Send + 'static,
{
    tokio::task::spawn_blocking(move || recover_checkpoint(&connector, &config, default))
        .await
        .map_err(|e| Error::log("recover", e.to_string()))?
}

/// Decode the checkpoint carried by a record key.
///
/// # Errors
/// Returns `Error::MissingKey` for keyless records and
/// `Error::Deserialization` for keys that are not a JSON header.
pub fn decode_checkpoint(record: &LogRecord) -> Result<Option<Checkpoint>> {
    let key = record.key.as_deref().ok_or_else(|| Error::MissingKey {
        topic: record.topic.clone(),
        partition: record.partition,
        offset: record.offset,
    })?;

    serde_json::from_slice::<AugmentedEventHeader>(key)
        .map(|header| header.checkpoint().cloned())
        .map_err(|e| Error::Deserialization {
            topic: record.topic.clone(),
            partition: record.partition,
            offset: record.offset,
            reason: e.to_string(),
        })
}

fn describe(checkpoint: Option<&Checkpoint>) -> String {
    checkpoint.map_or_else(|| "<none>".to_string(), ToString::to_string)
}
