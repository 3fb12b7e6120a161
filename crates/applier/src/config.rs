//! Seeker configuration.
//!
//! The pipeline hands configuration around as a flat string map. Required
//! keys are checked here, before any connection is attempted.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};

/// Downstream cluster bootstrap address list.
pub const BOOTSTRAP_SERVERS: &str = "kafka.bootstrap.servers";
/// Consumer group used by the recovery connection.
pub const GROUP_ID: &str = "kafka.group.id";
/// Topic events are published to.
pub const TOPIC: &str = "kafka.topic";
/// Poll timeout for a partition's tail record, in milliseconds.
pub const POLL_TIMEOUT_MS: &str = "kafka.poll.timeout.ms";

const DEFAULT_POLL_TIMEOUT_MS: u64 = 100;

/// Validated configuration for checkpoint recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeekerConfig {
    pub bootstrap_servers: String,
    pub group_id: String,
    pub topic: String,
    pub poll_timeout: Duration,
}

impl SeekerConfig {
    /// Build from a flat key/value map.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingConfiguration` if a required key is absent or
    /// blank, and `Error::InvalidConfiguration` if the poll timeout is not a
    /// non-negative integer.
    pub fn from_map(configuration: &HashMap<String, String>) -> Result<Self> {
        let bootstrap_servers = required(configuration, BOOTSTRAP_SERVERS)?;
        let group_id = required(configuration, GROUP_ID)?;
        let topic = required(configuration, TOPIC)?;

        let poll_timeout = match configuration.get(POLL_TIMEOUT_MS) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| Error::invalid_configuration(POLL_TIMEOUT_MS, e.to_string()))?,
            None => Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS),
        };

        Ok(Self {
            bootstrap_servers,
            group_id,
            topic,
            poll_timeout,
        })
    }
}

fn required(configuration: &HashMap<String, String>, key: &str) -> Result<String> {
    configuration
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::missing_configuration(key))
}
