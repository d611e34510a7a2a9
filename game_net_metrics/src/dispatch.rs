//! Fan-out of finished ticks to observers.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use crate::collection::MetricCollection;

/// A consumer of the per-tick [`MetricCollection`].
pub trait MetricObserver: Send + Sync {
    /// Called once per tick with the finished collection.
    ///
    /// The collection is only valid for the duration of the call.
    fn observe(&self, collection: &MetricCollection);
}

impl<F> MetricObserver for F
where
    F: Fn(&MetricCollection) + Send + Sync,
{
    #[inline]
    fn observe(&self, collection: &MetricCollection) {
        self(collection)
    }
}

/// A handle to a registered observer, used to unregister it again.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Notifies registered observers in registration order.
///
/// The dispatcher does not keep observers alive. Observers that have been
/// dropped are removed on the next dispatch.
#[derive(Default)]
pub struct MetricDispatcher {
    observers: Vec<(ObserverId, Weak<dyn MetricObserver>)>,
    next_id: u64,
}

impl MetricDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_observer<O>(&mut self, observer: &Arc<O>) -> ObserverId
    where
        O: MetricObserver + 'static,
    {
        let id = ObserverId(self.next_id);
        self.next_id += 1;

        let observer: Arc<dyn MetricObserver> = observer.clone();
        self.observers.push((id, Arc::downgrade(&observer)));
        id
    }

    /// Removes the observer with the given `id`. Returns `true` if the observer
    /// was registered.
    pub fn unregister_observer(&mut self, id: ObserverId) -> bool {
        let len = self.observers.len();
        self.observers.retain(|(other, _)| *other != id);
        self.observers.len() != len
    }

    /// Returns the number of registered observers, including ones that have
    /// been dropped since the last dispatch.
    #[inline]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns `true` if no observers are registered. Observers that have been
    /// dropped since the last dispatch still count as registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Calls every live observer with the same `collection`.
    ///
    /// A panicking observer does not prevent the remaining observers from
    /// being called.
    pub fn dispatch(&mut self, collection: &MetricCollection) {
        self.observers.retain(|(id, observer)| {
            let Some(observer) = observer.upgrade() else {
                tracing::trace!("removing dropped metric observer {:?}", id);
                return false;
            };

            if catch_unwind(AssertUnwindSafe(|| observer.observe(collection))).is_err() {
                tracing::error!("metric observer {:?} panicked", id);
            }

            true
        });
    }
}

impl std::fmt::Debug for MetricDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricDispatcher")
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
