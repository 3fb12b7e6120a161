//! Replicated events.

use serde::{Deserialize, Serialize};

use crate::checkpoint::Checkpoint;
use crate::data::EventData;
use crate::header::{AugmentedEventHeader, EventType};

/// A replicated binlog event: augmented header plus typed body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    header: AugmentedEventHeader,
    data: EventData,
}

impl Event {
    #[must_use]
    pub const fn new(header: AugmentedEventHeader, data: EventData) -> Self {
        Self { header, data }
    }

    #[must_use]
    pub const fn header(&self) -> &AugmentedEventHeader {
        &self.header
    }

    #[must_use]
    pub const fn data(&self) -> &EventData {
        &self.data
    }

    /// Stream position this event was read at.
    #[must_use]
    pub const fn checkpoint(&self) -> Option<&Checkpoint> {
        self.header.checkpoint()
    }

    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.header.event_type()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.row_count()
    }

    /// Split into header and body.
    #[must_use]
    pub fn into_parts(self) -> (AugmentedEventHeader, EventData) {
        (self.header, self.data)
    }
}
