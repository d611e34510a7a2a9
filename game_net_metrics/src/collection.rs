//! The per-tick metric aggregate.

use ahash::HashMap;

use crate::counter::{Counter, Gauge};
use crate::event::{BandwidthTypes, Direction, MetricEvent, MetricKind, NetworkDirection};
use crate::id::{ConnectionId, ObjectId};

/// Counters that are zeroed after every dispatch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub transport_bytes_sent: Counter,
    pub transport_bytes_received: Counter,
    pub packets_sent: Counter,
    pub packets_received: Counter,
}

impl Counters {
    fn reset(&mut self) {
        self.transport_bytes_sent.reset();
        self.transport_bytes_received.reset();
        self.packets_sent.reset();
        self.packets_received.reset();
    }
}

/// Gauges that keep their value until they are set again.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Gauges {
    /// Round trip time to the server in seconds.
    pub rtt_to_server: Gauge<f64>,
    pub network_objects: Gauge<u64>,
    pub connections: Gauge<u64>,
    /// Packet loss in the range `0.0..=1.0`.
    pub packet_loss: Gauge<f32>,
}

/// Aggregates computed over all events of a tick right before dispatch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub events: usize,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    kinds: [usize; MetricKind::ALL.len()],
}

impl TickSummary {
    /// Returns the number of events of the given `kind`.
    #[inline]
    pub fn count(&self, kind: MetricKind) -> usize {
        self.kinds[kind.index()]
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct ObjectStats {
    // [OTHER, RPC, NET_VAR] x [Sent, Received]
    bytes: [[u64; 2]; 3],
    rpcs: u64,
}

impl ObjectStats {
    fn add(&mut self, group: BandwidthTypes, direction: Direction, bytes: u64) {
        let slot = &mut self.bytes[group_index(group)][direction_index(direction)];
        *slot = slot.saturating_add(bytes);
    }

    fn bandwidth(&self, types: BandwidthTypes, direction: NetworkDirection) -> u64 {
        let mut total: u64 = 0;
        for group in [
            BandwidthTypes::OTHER,
            BandwidthTypes::RPC,
            BandwidthTypes::NET_VAR,
        ] {
            if !types.contains(group) {
                continue;
            }

            let bytes = &self.bytes[group_index(group)];
            for dir in [Direction::Sent, Direction::Received] {
                if direction.contains(dir) {
                    total = total.saturating_add(bytes[direction_index(dir)]);
                }
            }
        }

        total
    }
}

#[inline]
fn group_index(group: BandwidthTypes) -> usize {
    if group == BandwidthTypes::RPC {
        1
    } else if group == BandwidthTypes::NET_VAR {
        2
    } else {
        0
    }
}

#[inline]
fn direction_index(direction: Direction) -> usize {
    match direction {
        Direction::Sent => 0,
        Direction::Received => 1,
    }
}

/// All metrics recorded since the last dispatch.
///
/// The collection is owned by [`NetworkMetrics`] and only mutated through it.
/// Observers receive it by shared reference during dispatch and may
/// [`clone`](Clone::clone) it to keep the snapshot around.
///
/// [`NetworkMetrics`]: crate::NetworkMetrics
#[derive(Clone, Debug, Default)]
pub struct MetricCollection {
    connection_id: ConnectionId,
    counters: Counters,
    gauges: Gauges,
    events: Vec<MetricEvent>,
    /// Per-object traffic of the current tick, kept up to date on every
    /// recorded event.
    objects: HashMap<ObjectId, ObjectStats>,
    summary: TickSummary,
}

impl MetricCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of the local connection.
    #[inline]
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    #[inline]
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    #[inline]
    pub fn gauges(&self) -> &Gauges {
        &self.gauges
    }

    /// Returns all events of the current tick in the order they were recorded.
    #[inline]
    pub fn events(&self) -> &[MetricEvent] {
        &self.events
    }

    pub fn events_of(&self, kind: MetricKind) -> impl Iterator<Item = &MetricEvent> + '_ {
        self.events.iter().filter(move |event| event.kind() == kind)
    }

    /// Returns the summary computed for the tick that is being dispatched.
    ///
    /// Outside of dispatch the summary is empty.
    #[inline]
    pub fn summary(&self) -> &TickSummary {
        &self.summary
    }

    /// Returns the number of bytes attributed to `object` in the current tick.
    pub fn bandwidth(
        &self,
        object: ObjectId,
        types: BandwidthTypes,
        direction: NetworkDirection,
    ) -> u64 {
        self.objects
            .get(&object)
            .map(|stats| stats.bandwidth(types, direction))
            .unwrap_or(0)
    }

    /// Returns the number of RPCs sent or received by `object` in the current
    /// tick.
    pub fn rpc_count(&self, object: ObjectId) -> u64 {
        self.objects
            .get(&object)
            .map(|stats| stats.rpcs)
            .unwrap_or(0)
    }

    /// Returns `true` if any per-object traffic was recorded in the current
    /// tick.
    #[inline]
    pub fn has_bandwidth_data(&self) -> bool {
        !self.objects.is_empty()
    }

    #[inline]
    pub fn has_no_bandwidth_data(&self) -> bool {
        !self.has_bandwidth_data()
    }

    pub(crate) fn set_connection_id(&mut self, id: ConnectionId) {
        self.connection_id = id;
    }

    pub(crate) fn record(&mut self, event: MetricEvent) {
        if let (Some(object), Some(group)) = (event.object(), event.kind().bandwidth_type()) {
            let stats = self.objects.entry(object).or_default();
            stats.add(group, event.direction(), event.bytes());
            if event.kind() == MetricKind::Rpc {
                stats.rpcs += 1;
            }
        }

        self.events.push(event);
    }

    pub(crate) fn counters_mut(&mut self) -> &mut Counters {
        &mut self.counters
    }

    pub(crate) fn gauges_mut(&mut self) -> &mut Gauges {
        &mut self.gauges
    }

    /// Computes the derived values of the tick before it is handed to
    /// observers.
    pub(crate) fn pre_dispatch(&mut self) {
        let mut summary = TickSummary {
            events: self.events.len(),
            ..Default::default()
        };

        for event in &self.events {
            summary.kinds[event.kind().index()] += 1;
            match event.direction() {
                Direction::Sent => {
                    summary.bytes_sent = summary.bytes_sent.saturating_add(event.bytes())
                }
                Direction::Received => {
                    summary.bytes_received = summary.bytes_received.saturating_add(event.bytes())
                }
            }
        }

        self.summary = summary;
    }

    /// Clears all state that only lives for a single tick.
    ///
    /// Gauges and the connection id are kept.
    pub(crate) fn post_dispatch(&mut self) {
        self.events.clear();
        self.objects.clear();
        self.counters.reset();
        self.summary = TickSummary::default();
    }
}

#[cfg(test)]
mod tests {
    use super::MetricCollection;
    use crate::event::{BandwidthTypes, Direction, MetricEvent, MetricKind, NetworkDirection};
    use crate::fixed_string::label;
    use crate::id::{ConnectionId, ObjectId};

    fn object_event(
        kind: MetricKind,
        direction: Direction,
        object: u64,
        bytes: u64,
    ) -> MetricEvent {
        MetricEvent::new(kind, direction, ConnectionId(1), bytes)
            .with_object(ObjectId(object), label("Player"))
    }

    #[test]
    fn bandwidth_empty() {
        let collection = MetricCollection::new();
        assert_eq!(
            collection.bandwidth(ObjectId(1), BandwidthTypes::all(), NetworkDirection::default()),
            0
        );
        assert!(collection.has_no_bandwidth_data());
        assert_eq!(collection.rpc_count(ObjectId(1)), 0);
    }

    #[test]
    fn bandwidth_filters() {
        let mut collection = MetricCollection::new();
        collection.record(object_event(MetricKind::ObjectSpawn, Direction::Sent, 1, 128));
        collection.record(object_event(MetricKind::Rpc, Direction::Received, 1, 16));
        collection.record(object_event(
            MetricKind::NetworkVariableDelta,
            Direction::Sent,
            1,
            8,
        ));
        collection.record(object_event(MetricKind::Rpc, Direction::Sent, 2, 1000));

        let id = ObjectId(1);
        assert_eq!(
            collection.bandwidth(id, BandwidthTypes::OTHER, NetworkDirection::Sent),
            128
        );
        assert_eq!(
            collection.bandwidth(id, BandwidthTypes::OTHER, NetworkDirection::Received),
            0
        );
        assert_eq!(
            collection.bandwidth(id, BandwidthTypes::RPC, NetworkDirection::SentAndReceived),
            16
        );
        assert_eq!(
            collection.bandwidth(
                id,
                BandwidthTypes::RPC | BandwidthTypes::NET_VAR,
                NetworkDirection::Sent
            ),
            8
        );
        assert_eq!(
            collection.bandwidth(id, BandwidthTypes::all(), NetworkDirection::SentAndReceived),
            152
        );
        assert_eq!(collection.rpc_count(id), 1);
        assert_eq!(collection.rpc_count(ObjectId(2)), 1);
    }

    #[test]
    fn events_without_object_are_not_bandwidth() {
        let mut collection = MetricCollection::new();
        collection.record(
            MetricEvent::new(MetricKind::NamedMessage, Direction::Sent, ConnectionId(1), 64)
                .with_name(label("Chat")),
        );

        assert_eq!(collection.events().len(), 1);
        assert!(collection.has_no_bandwidth_data());
    }

    #[test]
    fn pre_dispatch_summary() {
        let mut collection = MetricCollection::new();
        collection.record(object_event(MetricKind::ObjectSpawn, Direction::Sent, 1, 128));
        collection.record(object_event(MetricKind::Rpc, Direction::Received, 1, 16));
        collection.record(object_event(MetricKind::Rpc, Direction::Sent, 1, 4));

        assert_eq!(collection.summary().events, 0);

        collection.pre_dispatch();
        let summary = collection.summary();
        assert_eq!(summary.events, 3);
        assert_eq!(summary.bytes_sent, 132);
        assert_eq!(summary.bytes_received, 16);
        assert_eq!(summary.count(MetricKind::Rpc), 2);
        assert_eq!(summary.count(MetricKind::ObjectSpawn), 1);
        assert_eq!(summary.count(MetricKind::SceneEvent), 0);
    }

    #[test]
    fn post_dispatch_keeps_gauges() {
        let mut collection = MetricCollection::new();
        collection.set_connection_id(ConnectionId(7));
        collection.gauges_mut().connections.set(3);
        collection.counters_mut().packets_sent.add(5);
        collection.record(object_event(MetricKind::ObjectSpawn, Direction::Sent, 1, 128));
        collection.pre_dispatch();
        collection.post_dispatch();

        assert!(collection.events().is_empty());
        assert!(collection.has_no_bandwidth_data());
        assert_eq!(collection.counters().packets_sent.get(), 0);
        assert_eq!(collection.summary().events, 0);
        assert_eq!(collection.gauges().connections.get(), 3);
        assert_eq!(collection.connection_id(), ConnectionId(7));
    }
}
