//! Kafka-backed partitioned log.
//!
//! Recovery uses a dedicated `BaseConsumer` with manual partition
//! assignment. It never calls `subscribe`, so the group id is only there to
//! satisfy librdkafka and no rebalancing or offset commits happen.
//!
//! The consumer reads with `isolation.level=read_uncommitted`. librdkafka
//! defaults to `read_committed`, which hides an open transaction's tail
//! record and would make its partition look empty.

use std::time::{Duration, Instant};

use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::error::KafkaError;
use rdkafka::{ClientConfig, Message, Offset, TopicPartitionList};

use crate::config::SeekerConfig;
use crate::error::{Error, Result};
use crate::log::{LogConnector, LogRecord, PartitionedLog};

/// Timeout for metadata and watermark requests.
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// A recovery connection to a Kafka cluster.
pub struct KafkaLog {
    consumer: BaseConsumer,
}

impl KafkaLog {
    /// Create a consumer for the configured cluster.
    ///
    /// # Errors
    /// Returns `Error::Connection` if librdkafka rejects the configuration.
    pub fn connect(config: &SeekerConfig) -> Result<Self> {
        tracing::debug!(
            bootstrap_servers = %config.bootstrap_servers,
            group_id = %config.group_id,
            "Creating Kafka recovery consumer"
        );
        let consumer: BaseConsumer = client_config(config)
            .create()
            .map_err(|e| Error::connection(e.to_string()))?;
        Ok(Self { consumer })
    }
}

fn client_config(config: &SeekerConfig) -> ClientConfig {
    let mut client = ClientConfig::new();
    client
        .set("bootstrap.servers", &config.bootstrap_servers)
        .set("group.id", &config.group_id)
        .set("enable.auto.commit", "false")
        .set("enable.partition.eof", "true")
        .set("isolation.level", "read_uncommitted");
    client
}

impl PartitionedLog for KafkaLog {
    fn partitions(&mut self, topic: &str) -> Result<Vec<i32>> {
        let metadata = self
            .consumer
            .fetch_metadata(Some(topic), METADATA_TIMEOUT)
            .map_err(|e| Error::log("partitions", e.to_string()))?;

        let topic_metadata = metadata
            .topics()
            .iter()
            .find(|t| t.name() == topic)
            .ok_or_else(|| Error::log("partitions", format!("topic {topic} not in metadata")))?;

        if let Some(err) = topic_metadata.error() {
            return Err(Error::log("partitions", format!("{topic}: {err:?}")));
        }

        Ok(topic_metadata.partitions().iter().map(|p| p.id()).collect())
    }

    fn end_offset(&mut self, topic: &str, partition: i32) -> Result<i64> {
        self.consumer
            .fetch_watermarks(topic, partition, METADATA_TIMEOUT)
            .map(|(_low, high)| high)
            .map_err(|e| Error::log("end_offset", e.to_string()))
    }

    fn seek(&mut self, topic: &str, partition: i32, offset: i64) -> Result<()> {
        let mut assignment = TopicPartitionList::new();
        assignment
            .add_partition_offset(topic, partition, Offset::Offset(offset))
            .map_err(|e| Error::log("seek", e.to_string()))?;
        self.consumer
            .assign(&assignment)
            .map_err(|e| Error::log("seek", e.to_string()))
    }

    fn poll(&mut self, timeout: Duration) -> Result<Vec<LogRecord>> {
        let started = Instant::now();
        let mut records = Vec::new();

        loop {
            let remaining = timeout.saturating_sub(started.elapsed());
            match self.consumer.poll(remaining) {
                Some(Ok(message)) => records.push(LogRecord {
                    topic: message.topic().to_string(),
                    partition: message.partition(),
                    offset: message.offset(),
                    key: message.key().map(<[u8]>::to_vec),
                    payload: message.payload().map(<[u8]>::to_vec),
                }),
                Some(Err(KafkaError::PartitionEOF(_))) | None => break,
                Some(Err(err)) => return Err(Error::log("poll", err.to_string())),
            }
            if remaining.is_zero() {
                break;
            }
        }

        Ok(records)
    }
}

/// Opens a fresh [`KafkaLog`] per recovery.
#[derive(Debug, Clone, Copy, Default)]
pub struct KafkaConnector;

impl LogConnector for KafkaConnector {
    type Log = KafkaLog;

    fn connect(&self, config: &SeekerConfig) -> Result<Self::Log> {
        KafkaLog::connect(config)
    }
}
