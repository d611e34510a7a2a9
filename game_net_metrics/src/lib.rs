//! Per-tick network metrics.
//!
//! Networking code records traffic through [`NetworkMetrics`] while a tick is
//! running. At the end of every tick [`NetworkMetrics::dispatch_frame`] hands
//! the finished [`MetricCollection`] to all registered [`MetricObserver`]s and
//! resets the per-tick state.
//!
//! The number of metric events accepted per tick is limited (1000 by
//! default). Events past the limit are dropped without notice.

pub mod collection;
pub mod config;
pub mod counter;
pub mod dispatch;
pub mod event;
pub mod fixed_string;
pub mod id;
pub mod metrics;
pub mod registry;
pub mod sync;

pub use collection::MetricCollection;
pub use config::Config;
pub use dispatch::{MetricDispatcher, MetricObserver, ObserverId};
pub use event::{BandwidthTypes, Direction, MetricEvent, MetricKind, NetworkDirection};
pub use fixed_string::{label, FixedString, Label};
pub use id::{ConnectionId, ObjectId};
pub use metrics::NetworkMetrics;
pub use registry::{NoRegistry, ObjectRegistry};
pub use sync::SharedNetworkMetrics;
