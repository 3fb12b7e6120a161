//! Adapters that run a seeker over an event source.
//!
//! Both adapters preserve the order of forwarded events and never reorder
//! around dropped ones. Pass `&mut seeker` to keep access to the seeker's
//! state afterwards.

use futures::future;
use futures::stream::{Stream, StreamExt};

use replicator_model::Event;

use crate::seeker::EventSeeker;

/// Iterator returned by [`seek_iter`].
#[derive(Debug, Clone)]
pub struct SeekIter<I, S> {
    events: I,
    seeker: S,
}

impl<I, S> Iterator for SeekIter<I, S>
where
    I: Iterator<Item = Event>,
    S: EventSeeker,
{
    type Item = Event;

    fn next(&mut self) -> Option<Self::Item> {
        let seeker = &mut self.seeker;
        self.events.by_ref().find_map(|event| seeker.apply(event))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.events.size_hint().1)
    }
}

/// Gate a blocking event source.
pub fn seek_iter<I, S>(events: I, seeker: S) -> SeekIter<I::IntoIter, S>
where
    I: IntoIterator<Item = Event>,
    S: EventSeeker,
{
    SeekIter {
        events: events.into_iter(),
        seeker,
    }
}

/// Gate an async event stream.
pub trait SeekStreamExt: Stream<Item = Event> {
    /// Drop events up to the seeker's resume point.
    fn seek<S>(self, mut seeker: S) -> impl Stream<Item = Event>
    where
        Self: Sized,
        S: EventSeeker,
    {
        self.filter_map(move |event| future::ready(seeker.apply(event)))
    }
}

impl<T: Stream<Item = Event>> SeekStreamExt for T {}
