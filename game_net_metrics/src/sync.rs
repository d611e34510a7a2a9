//! Sharing a single [`NetworkMetrics`] between threads.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::dispatch::{MetricObserver, ObserverId};
use crate::metrics::NetworkMetrics;
use crate::registry::{NoRegistry, ObjectRegistry};

/// A [`NetworkMetrics`] that can be recorded to from multiple threads.
///
/// All recording goes through a single lock. [`dispatch_frame`] holds the lock
/// for the entire dispatch, so a tick is published atomically: a recording
/// either lands in the tick being dispatched or in the next one.
///
/// Observers must not access the same `SharedNetworkMetrics` from within
/// [`MetricObserver::observe`], the lock is not reentrant.
///
/// [`dispatch_frame`]: Self::dispatch_frame
#[derive(Debug)]
pub struct SharedNetworkMetrics<R = NoRegistry> {
    inner: Arc<Mutex<NetworkMetrics<R>>>,
}

impl<R> SharedNetworkMetrics<R>
where
    R: ObjectRegistry,
{
    pub fn new(metrics: NetworkMetrics<R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(metrics)),
        }
    }

    /// Locks the metrics for recording.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, NetworkMetrics<R>> {
        self.inner.lock()
    }

    /// Runs `f` with exclusive access to the metrics.
    #[inline]
    pub fn record<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut NetworkMetrics<R>) -> T,
    {
        f(&mut *self.inner.lock())
    }

    pub fn register_observer<O>(&self, observer: &Arc<O>) -> ObserverId
    where
        O: MetricObserver + 'static,
    {
        self.inner.lock().register_observer(observer)
    }

    pub fn unregister_observer(&self, id: ObserverId) -> bool {
        self.inner.lock().unregister_observer(id)
    }

    pub fn dispatch_frame(&self) {
        self.inner.lock().dispatch_frame();
    }
}

impl<R> Clone for SharedNetworkMetrics<R> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Default for SharedNetworkMetrics<NoRegistry> {
    fn default() -> Self {
        Self::new(NetworkMetrics::new())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::SharedNetworkMetrics;
    use crate::collection::MetricCollection;
    use crate::id::ConnectionId;

    #[test]
    fn shared_metrics_limit_across_threads() {
        let metrics = SharedNetworkMetrics::default();

        let threads: Vec<_> = (0..4)
            .map(|thread| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..400 {
                        metrics.record(|m| {
                            m.track_named_message_sent(ConnectionId(thread), "Chat", 8)
                        });
                    }
                })
            })
            .collect();

        for thread in threads {
            thread.join().unwrap();
        }

        let metrics = metrics.lock();
        assert_eq!(metrics.metrics_this_tick(), 1000);
        assert_eq!(metrics.dropped_this_tick(), 600);
    }

    #[test]
    fn shared_metrics_dispatch() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let observer = {
            let seen = seen.clone();
            Arc::new(move |collection: &MetricCollection| {
                seen.lock().push(collection.events().len())
            })
        };

        let metrics = SharedNetworkMetrics::default();
        metrics.register_observer(&observer);

        metrics.record(|m| m.track_unnamed_message_sent(ConnectionId(1), 4));
        metrics.record(|m| m.track_unnamed_message_sent(ConnectionId(2), 4));
        metrics.dispatch_frame();
        metrics.record(|m| m.track_unnamed_message_sent(ConnectionId(3), 4));
        metrics.dispatch_frame();

        assert_eq!(*seen.lock(), [2, 1]);
    }

    #[test]
    fn shared_metrics_dispatch_while_recording() {
        let total = Arc::new(Mutex::new(0usize));
        let observer = {
            let total = total.clone();
            Arc::new(move |collection: &MetricCollection| {
                *total.lock() += collection.events().len();
            })
        };

        let metrics = SharedNetworkMetrics::default();
        metrics.register_observer(&observer);

        let recorders: Vec<_> = (0..4)
            .map(|thread| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        metrics.record(|m| m.track_unnamed_message_sent(ConnectionId(thread), 4));
                    }
                })
            })
            .collect();

        let dispatcher = {
            let metrics = metrics.clone();
            std::thread::spawn(move || {
                for _ in 0..50 {
                    metrics.dispatch_frame();
                    std::thread::yield_now();
                }
            })
        };

        for thread in recorders {
            thread.join().unwrap();
        }
        dispatcher.join().unwrap();

        // Flush whatever was recorded after the last concurrent dispatch.
        metrics.dispatch_frame();

        // Every event is delivered exactly once, none lost between ticks.
        assert_eq!(*total.lock(), 800);
        assert_eq!(metrics.lock().metrics_this_tick(), 0);
    }
}
