//! Event seeker: gates the live replay stream at the resume point.
//!
//! The seeker holds the last checkpoint known to be durable downstream. While
//! seeking, every event at or before that checkpoint is dropped. The first
//! event strictly after it is forwarded and latches the seeker open; from
//! then on events pass through without any comparison. The upstream stream is
//! trusted to be non-decreasing in checkpoint order once past the boundary.

use replicator_model::{Checkpoint, Event};

use crate::config::SeekerConfig;
use crate::error::Result;
use crate::log::LogConnector;
use crate::recovery::recover_checkpoint;

/// Per-event gate applied to the replay stream.
pub trait EventSeeker {
    /// Forward `event` or drop it (`None`).
    fn apply(&mut self, event: Event) -> Option<Event>;
}

impl<S: EventSeeker + ?Sized> EventSeeker for &mut S {
    fn apply(&mut self, event: Event) -> Option<Event> {
        (**self).apply(event)
    }
}

/// Gate state. `Seeked` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeekerState {
    #[default]
    Seeking,
    Seeked,
}

/// Seeker anchored at a single resume checkpoint.
///
/// Not meant to be shared across threads: use one seeker per stream.
#[derive(Debug, Clone)]
pub struct CheckpointSeeker {
    checkpoint: Option<Checkpoint>,
    state: SeekerState,
    dropped: u64,
}

impl CheckpointSeeker {
    /// Seek past an explicitly given checkpoint.
    pub fn new(checkpoint: impl Into<Option<Checkpoint>>) -> Self {
        Self {
            checkpoint: checkpoint.into(),
            state: SeekerState::Seeking,
            dropped: 0,
        }
    }

    /// Seek past the latest checkpoint durable in the downstream log.
    ///
    /// `default` seeds the scan and is used as-is when the topic holds
    /// nothing later.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be opened or any partition
    /// cannot be scanned. The seeker is never built from a partial scan.
    pub fn recover<C>(
        config: &SeekerConfig,
        connector: &C,
        default: Option<Checkpoint>,
    ) -> Result<Self>
    where
        C: LogConnector + ?Sized,
    {
        let report = recover_checkpoint(connector, config, default)?;
        Ok(Self::new(report.checkpoint))
    }

    /// The resume checkpoint.
    #[must_use]
    pub const fn checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoint.as_ref()
    }

    #[must_use]
    pub const fn state(&self) -> SeekerState {
        self.state
    }

    /// Events suppressed while seeking.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl EventSeeker for CheckpointSeeker {
    fn apply(&mut self, event: Event) -> Option<Event> {
        match self.state {
            SeekerState::Seeked => Some(event),
            SeekerState::Seeking => {
                let past_boundary = event
                    .checkpoint()
                    .is_some_and(|position| position.is_after(self.checkpoint.as_ref()));

                if past_boundary {
                    self.state = SeekerState::Seeked;
                    tracing::info!(
                        resume_from = ?self.checkpoint,
                        first = ?event.checkpoint(),
                        dropped = self.dropped,
                        "Seeker passed resume checkpoint"
                    );
                    Some(event)
                } else {
                    self.dropped = self.dropped.saturating_add(1);
                    tracing::trace!(checkpoint = ?event.checkpoint(), "Dropping replayed event");
                    None
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use replicator_model::{AugmentedEventHeader, EventData, EventHeader, EventType};

    fn event(checkpoint: Option<Checkpoint>) -> Event {
        Event::new(
            AugmentedEventHeader::new(EventHeader::new(EventType::Xid, 0), checkpoint),
            EventData::Xid { xid: 1 },
        )
    }

    fn at(position: i64) -> Checkpoint {
        Checkpoint::at_binlog("mysql-bin.000001", position)
    }

    #[test]
    fn test_drops_events_at_resume_point() {
        let mut seeker = CheckpointSeeker::new(at(100));

        assert!(seeker.apply(event(Some(at(100)))).is_none());
        assert!(seeker.apply(event(Some(at(100)))).is_none());
        let forwarded = seeker.apply(event(Some(at(101))));

        assert_eq!(forwarded.and_then(|e| e.checkpoint().cloned()), Some(at(101)));
        assert_eq!(seeker.state(), SeekerState::Seeked);
        assert_eq!(seeker.dropped(), 2);
    }

    #[test]
    fn test_drops_events_before_resume_point() {
        let mut seeker = CheckpointSeeker::new(at(100));
        assert!(seeker.apply(event(Some(at(1)))).is_none());
        assert_eq!(seeker.state(), SeekerState::Seeking);
    }

    #[test]
    fn test_latch_never_reverts() {
        let mut seeker = CheckpointSeeker::new(at(100));
        assert!(seeker.apply(event(Some(at(200)))).is_some());

        assert!(seeker.apply(event(Some(at(50)))).is_some());
        assert!(seeker.apply(event(None)).is_some());
        assert_eq!(seeker.state(), SeekerState::Seeked);
        assert_eq!(seeker.dropped(), 0);
    }

    #[test]
    fn test_absent_resume_point_admits_first_positioned_event() {
        let mut seeker = CheckpointSeeker::new(None);
        assert!(seeker.apply(event(None)).is_none());
        assert!(seeker.apply(event(Some(Checkpoint::new()))).is_some());
    }

    #[test]
    fn test_event_without_checkpoint_is_dropped_while_seeking() {
        let mut seeker = CheckpointSeeker::new(at(0));
        assert!(seeker.apply(event(None)).is_none());
    }

    #[test]
    fn test_gtid_event_passes_binlog_resume_point() {
        let mut seeker = CheckpointSeeker::new(Checkpoint::at_binlog("mysql-bin.999999", 1));
        assert!(seeker
            .apply(event(Some(Checkpoint::at_pseudo_gtid("G", 0))))
            .is_some());
    }
}
