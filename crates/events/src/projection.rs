use crate::Event;

/// A projection builds a read model from an append-only event stream.
///
/// Read models are disposable: they can be dropped and rebuilt from the events
/// at any time, since the events are the source of truth. Feeding the same
/// ordered stream into a fresh projection must always produce the same model.
///
/// Ordering is the caller's responsibility. A projection folds events in the
/// order it receives them and does not re-sort.
pub trait Projection {
    type Ev: Event;

    /// Apply a single event to the projection, updating the read model.
    ///
    /// Events that are not relevant to this projection should be ignored.
    fn apply(&mut self, event: &Self::Ev);
}

/// Rebuild a projection from scratch by folding `events` in order.
pub fn replay<'a, P, I>(mut projection: P, events: I) -> P
where
    P: Projection,
    P::Ev: 'a,
    I: IntoIterator<Item = &'a P::Ev>,
{
    for event in events {
        projection.apply(event);
    }
    projection
}
