//! Event headers.
//!
//! [`EventHeader`] is the raw binlog header. [`AugmentedEventHeader`]
//! decorates one: it keeps the raw header as a delegate, lets individual
//! accessors be overridden through [`HeaderOverrides`], and adds the
//! replicator's own fields (checkpoint and table name).

use serde::{Deserialize, Serialize};

use crate::checkpoint::Checkpoint;

/// Binlog event kinds handled by the replicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    WriteRows,
    UpdateRows,
    DeleteRows,
    Query,
    Xid,
    Rotate,
    TableMap,
    #[default]
    #[serde(other)]
    Unknown,
}

impl EventType {
    /// Whether events of this kind carry row images.
    #[must_use]
    pub const fn is_row_mutation(self) -> bool {
        matches!(self, Self::WriteRows | Self::UpdateRows | Self::DeleteRows)
    }
}

/// Raw binlog event header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHeader {
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default)]
    pub server_id: u64,
    #[serde(default)]
    pub event_length: u64,
    #[serde(default)]
    pub next_position: u64,
    #[serde(default)]
    pub flags: u16,
}

impl EventHeader {
    #[must_use]
    pub fn new(event_type: EventType, timestamp: u64) -> Self {
        Self {
            timestamp,
            event_type,
            ..Self::default()
        }
    }
}

/// Accessor overrides applied on top of a delegate header.
///
/// `None` means "delegate".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderOverrides {
    pub timestamp: Option<u64>,
    pub event_type: Option<EventType>,
}

/// A raw header decorated with the replicator's position and table metadata.
///
/// Serialized as a single flat object (raw header fields plus `checkpoint`
/// and `tableName`), which is the shape of every downstream record key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HeaderRecord", into = "HeaderRecord")]
pub struct AugmentedEventHeader {
    delegate: EventHeader,
    overrides: HeaderOverrides,
    checkpoint: Option<Checkpoint>,
    table_name: Option<String>,
}

impl AugmentedEventHeader {
    /// Decorate a raw header with a checkpoint.
    #[must_use]
    pub fn new(delegate: EventHeader, checkpoint: impl Into<Option<Checkpoint>>) -> Self {
        Self {
            delegate,
            overrides: HeaderOverrides::default(),
            checkpoint: checkpoint.into(),
            table_name: None,
        }
    }

    #[must_use]
    pub fn with_table_name(self, table_name: impl Into<String>) -> Self {
        Self {
            table_name: Some(table_name.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_overrides(self, overrides: HeaderOverrides) -> Self {
        Self { overrides, ..self }
    }

    #[must_use]
    pub const fn delegate(&self) -> &EventHeader {
        &self.delegate
    }

    #[must_use]
    pub const fn overrides(&self) -> &HeaderOverrides {
        &self.overrides
    }

    #[must_use]
    pub fn timestamp(&self) -> u64 {
        self.overrides.timestamp.unwrap_or(self.delegate.timestamp)
    }

    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.overrides.event_type.unwrap_or(self.delegate.event_type)
    }

    #[must_use]
    pub const fn server_id(&self) -> u64 {
        self.delegate.server_id
    }

    #[must_use]
    pub const fn event_length(&self) -> u64 {
        self.delegate.event_length
    }

    #[must_use]
    pub const fn next_position(&self) -> u64 {
        self.delegate.next_position
    }

    #[must_use]
    pub const fn flags(&self) -> u16 {
        self.delegate.flags
    }

    #[must_use]
    pub const fn checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoint.as_ref()
    }

    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }
}

/// Flat wire shape of [`AugmentedEventHeader`].
///
/// Overrides are folded into the raw fields on the way out; a decoded header
/// has no overrides. The `checkpoint` key must be present, though it may be
/// `null`: a document without it is not a record key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeaderRecord {
    #[serde(flatten)]
    header: EventHeader,
    #[serde(deserialize_with = "Option::deserialize")]
    checkpoint: Option<Checkpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    table_name: Option<String>,
}

impl From<HeaderRecord> for AugmentedEventHeader {
    fn from(record: HeaderRecord) -> Self {
        Self {
            delegate: record.header,
            overrides: HeaderOverrides::default(),
            checkpoint: record.checkpoint,
            table_name: record.table_name,
        }
    }
}

impl From<AugmentedEventHeader> for HeaderRecord {
    fn from(header: AugmentedEventHeader) -> Self {
        let effective = EventHeader {
            timestamp: header.timestamp(),
            event_type: header.event_type(),
            ..header.delegate
        };
        Self {
            header: effective,
            checkpoint: header.checkpoint,
            table_name: header.table_name,
        }
    }
}
