//! The recording interface used by the networking code.

use std::borrow::Borrow;
use std::sync::Arc;

use indexmap::IndexSet;

use crate::collection::MetricCollection;
use crate::config::Config;
use crate::dispatch::{MetricDispatcher, MetricObserver, ObserverId};
use crate::event::{log_type_name, scene_event_type_name, Direction, MetricEvent, MetricKind};
use crate::fixed_string::{label, Label};
use crate::id::{ConnectionId, ObjectId};
use crate::registry::{NoRegistry, ObjectRegistry};

/// The label used for objects that the registry cannot resolve.
const UNKNOWN_OBJECT: &str = "Unknown";

/// Records network metrics and publishes them once per tick.
///
/// Every `track_*` call that creates a [`MetricEvent`] counts towards the
/// per-tick limit (see [`Config::max_metrics_per_tick`]). Once the limit is
/// reached all further events of the tick are silently dropped. Counters and
/// gauges are not limited.
///
/// [`dispatch_frame`] must be called exactly once at the end of every tick.
///
/// [`dispatch_frame`]: Self::dispatch_frame
#[derive(Debug)]
pub struct NetworkMetrics<R = NoRegistry> {
    config: Config,
    registry: R,
    collection: MetricCollection,
    dispatcher: MetricDispatcher,
    connected_clients: IndexSet<ConnectionId>,
    metrics_this_tick: u64,
    dropped_this_tick: u64,
}

impl NetworkMetrics<NoRegistry> {
    pub fn new() -> Self {
        Self::with_registry(NoRegistry)
    }
}

impl Default for NetworkMetrics<NoRegistry> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> NetworkMetrics<R>
where
    R: ObjectRegistry,
{
    pub fn with_registry(registry: R) -> Self {
        Self::with_config(Config::default(), registry)
    }

    pub fn with_config(config: Config, registry: R) -> Self {
        Self {
            config,
            registry,
            collection: MetricCollection::new(),
            dispatcher: MetricDispatcher::new(),
            connected_clients: IndexSet::new(),
            metrics_this_tick: 0,
            dropped_this_tick: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    #[inline]
    pub fn collection(&self) -> &MetricCollection {
        &self.collection
    }

    #[inline]
    pub fn dispatcher(&self) -> &MetricDispatcher {
        &self.dispatcher
    }

    #[inline]
    pub fn dispatcher_mut(&mut self) -> &mut MetricDispatcher {
        &mut self.dispatcher
    }

    pub fn register_observer<O>(&mut self, observer: &Arc<O>) -> ObserverId
    where
        O: MetricObserver + 'static,
    {
        self.dispatcher.register_observer(observer)
    }

    pub fn unregister_observer(&mut self, id: ObserverId) -> bool {
        self.dispatcher.unregister_observer(id)
    }

    /// Returns the number of events accepted in the current tick.
    #[inline]
    pub fn metrics_this_tick(&self) -> u64 {
        self.metrics_this_tick
    }

    /// Returns the number of events dropped in the current tick because the
    /// limit was reached.
    #[inline]
    pub fn dropped_this_tick(&self) -> u64 {
        self.dropped_this_tick
    }

    /// Returns `true` if another event would be accepted in the current tick.
    #[inline]
    pub fn can_record(&self) -> bool {
        self.metrics_this_tick < self.config.max_metrics_per_tick
    }

    /// Returns the owner of the object as reported by the registry.
    pub fn owner_of(&self, object: ObjectId) -> Option<ConnectionId> {
        self.registry.owner(object)
    }

    /// Returns all currently connected clients in the order they connected.
    pub fn connected_clients(&self) -> impl ExactSizeIterator<Item = ConnectionId> + '_ {
        self.connected_clients.iter().copied()
    }

    pub fn set_connection_id(&mut self, id: ConnectionId) {
        self.collection.set_connection_id(id);
    }

    pub fn on_connect(&mut self, id: ConnectionId) {
        if self.connected_clients.insert(id) {
            tracing::debug!("client {} connected", id);
        }
    }

    /// Registers a new connection together with the peers that were already
    /// connected before it.
    pub fn on_connect_with_peers<I>(&mut self, id: ConnectionId, peers: I)
    where
        I: IntoIterator,
        I::Item: Borrow<ConnectionId>,
    {
        self.on_connect(id);
        for peer in peers {
            self.on_connect(*peer.borrow());
        }
    }

    pub fn on_disconnect(&mut self, id: ConnectionId) {
        if self.connected_clients.shift_remove(&id) {
            tracing::debug!("client {} disconnected", id);
        }
    }

    /// Finishes the current tick. Same as [`dispatch_frame`].
    ///
    /// [`dispatch_frame`]: Self::dispatch_frame
    #[inline]
    pub fn on_tick_end(&mut self) {
        self.dispatch_frame();
    }

    /// Publishes the metrics of the current tick to all observers and starts a
    /// new tick.
    pub fn dispatch_frame(&mut self) {
        let _span = tracing::trace_span!("NetworkMetrics::dispatch_frame").entered();

        self.collection.pre_dispatch();
        self.dispatcher.dispatch(&self.collection);
        self.collection.post_dispatch();

        if self.dropped_this_tick != 0 {
            tracing::trace!(
                "dropped {} metrics in the last tick",
                self.dropped_this_tick
            );
        }

        self.metrics_this_tick = 0;
        self.dropped_this_tick = 0;
    }

    /// Replaces the object registry and discards all recorded state.
    ///
    /// Registered observers are kept.
    pub fn reset(&mut self, registry: R) {
        tracing::info!("resetting network metrics");

        self.registry = registry;
        self.collection = MetricCollection::new();
        self.connected_clients.clear();
        self.metrics_this_tick = 0;
        self.dropped_this_tick = 0;
    }

    pub fn track_transport_bytes_sent(&mut self, bytes: u64) {
        self.collection.counters_mut().transport_bytes_sent.add(bytes);
    }

    pub fn track_transport_bytes_received(&mut self, bytes: u64) {
        self.collection
            .counters_mut()
            .transport_bytes_received
            .add(bytes);
    }

    pub fn track_packet_sent(&mut self, count: u32) {
        self.collection.counters_mut().packets_sent.add(count.into());
    }

    pub fn track_packet_received(&mut self, count: u32) {
        self.collection
            .counters_mut()
            .packets_received
            .add(count.into());
    }

    pub fn track_network_message_sent(
        &mut self,
        receiver: ConnectionId,
        message_type: &str,
        bytes: u64,
    ) {
        self.track(|_| {
            MetricEvent::new(MetricKind::NetworkMessage, Direction::Sent, receiver, bytes)
                .with_name(label(message_type))
        });
    }

    pub fn track_network_message_sent_many<I>(
        &mut self,
        receivers: I,
        message_type: &str,
        bytes: u64,
    ) where
        I: IntoIterator,
        I::Item: Borrow<ConnectionId>,
    {
        for receiver in receivers {
            self.track_network_message_sent(*receiver.borrow(), message_type, bytes);
        }
    }

    pub fn track_network_message_received(
        &mut self,
        sender: ConnectionId,
        message_type: &str,
        bytes: u64,
    ) {
        self.track(|_| {
            MetricEvent::new(
                MetricKind::NetworkMessage,
                Direction::Received,
                sender,
                bytes,
            )
            .with_name(label(message_type))
        });
    }

    pub fn track_named_message_sent(
        &mut self,
        receiver: ConnectionId,
        message_name: &str,
        bytes: u64,
    ) {
        self.track(|_| {
            MetricEvent::new(MetricKind::NamedMessage, Direction::Sent, receiver, bytes)
                .with_name(label(message_name))
        });
    }

    pub fn track_named_message_sent_many<I>(
        &mut self,
        receivers: I,
        message_name: &str,
        bytes: u64,
    ) where
        I: IntoIterator,
        I::Item: Borrow<ConnectionId>,
    {
        for receiver in receivers {
            self.track_named_message_sent(*receiver.borrow(), message_name, bytes);
        }
    }

    pub fn track_named_message_received(
        &mut self,
        sender: ConnectionId,
        message_name: &str,
        bytes: u64,
    ) {
        self.track(|_| {
            MetricEvent::new(MetricKind::NamedMessage, Direction::Received, sender, bytes)
                .with_name(label(message_name))
        });
    }

    pub fn track_unnamed_message_sent(&mut self, receiver: ConnectionId, bytes: u64) {
        self.track(|_| {
            MetricEvent::new(MetricKind::UnnamedMessage, Direction::Sent, receiver, bytes)
        });
    }

    pub fn track_unnamed_message_sent_many<I>(&mut self, receivers: I, bytes: u64)
    where
        I: IntoIterator,
        I::Item: Borrow<ConnectionId>,
    {
        for receiver in receivers {
            self.track_unnamed_message_sent(*receiver.borrow(), bytes);
        }
    }

    pub fn track_unnamed_message_received(&mut self, sender: ConnectionId, bytes: u64) {
        self.track(|_| {
            MetricEvent::new(
                MetricKind::UnnamedMessage,
                Direction::Received,
                sender,
                bytes,
            )
        });
    }

    pub fn track_network_variable_delta_sent(
        &mut self,
        receiver: ConnectionId,
        object: ObjectId,
        variable_name: &str,
        behaviour_name: &str,
        bytes: u64,
    ) {
        self.track_network_variable_delta(
            Direction::Sent,
            receiver,
            object,
            variable_name,
            behaviour_name,
            bytes,
        );
    }

    pub fn track_network_variable_delta_received(
        &mut self,
        sender: ConnectionId,
        object: ObjectId,
        variable_name: &str,
        behaviour_name: &str,
        bytes: u64,
    ) {
        self.track_network_variable_delta(
            Direction::Received,
            sender,
            object,
            variable_name,
            behaviour_name,
            bytes,
        );
    }

    fn track_network_variable_delta(
        &mut self,
        direction: Direction,
        connection: ConnectionId,
        object: ObjectId,
        variable_name: &str,
        behaviour_name: &str,
        bytes: u64,
    ) {
        self.track(|registry| {
            MetricEvent::new(
                MetricKind::NetworkVariableDelta,
                direction,
                connection,
                bytes,
            )
            .with_object(object, object_name(registry, object))
            .with_name(label(variable_name))
            .with_detail(label(behaviour_name))
        });
    }

    pub fn track_ownership_change_sent(
        &mut self,
        receiver: ConnectionId,
        object: ObjectId,
        bytes: u64,
    ) {
        self.track_object(
            MetricKind::OwnershipChange,
            Direction::Sent,
            receiver,
            object,
            bytes,
        );
    }

    pub fn track_ownership_change_received(
        &mut self,
        sender: ConnectionId,
        object: ObjectId,
        bytes: u64,
    ) {
        self.track_object(
            MetricKind::OwnershipChange,
            Direction::Received,
            sender,
            object,
            bytes,
        );
    }

    pub fn track_object_spawn_sent(
        &mut self,
        receiver: ConnectionId,
        object: ObjectId,
        bytes: u64,
    ) {
        self.track_object(
            MetricKind::ObjectSpawn,
            Direction::Sent,
            receiver,
            object,
            bytes,
        );
    }

    pub fn track_object_spawn_received(
        &mut self,
        sender: ConnectionId,
        object: ObjectId,
        bytes: u64,
    ) {
        self.track_object(
            MetricKind::ObjectSpawn,
            Direction::Received,
            sender,
            object,
            bytes,
        );
    }

    pub fn track_object_destroy_sent(
        &mut self,
        receiver: ConnectionId,
        object: ObjectId,
        bytes: u64,
    ) {
        self.track_object(
            MetricKind::ObjectDestroy,
            Direction::Sent,
            receiver,
            object,
            bytes,
        );
    }

    pub fn track_object_destroy_received(
        &mut self,
        sender: ConnectionId,
        object: ObjectId,
        bytes: u64,
    ) {
        self.track_object(
            MetricKind::ObjectDestroy,
            Direction::Received,
            sender,
            object,
            bytes,
        );
    }

    fn track_object(
        &mut self,
        kind: MetricKind,
        direction: Direction,
        connection: ConnectionId,
        object: ObjectId,
        bytes: u64,
    ) {
        self.track(|registry| {
            MetricEvent::new(kind, direction, connection, bytes)
                .with_object(object, object_name(registry, object))
        });
    }

    pub fn track_rpc_sent(
        &mut self,
        receiver: ConnectionId,
        object: ObjectId,
        rpc_name: &str,
        behaviour_name: &str,
        bytes: u64,
    ) {
        self.track_rpc(
            Direction::Sent,
            receiver,
            object,
            rpc_name,
            behaviour_name,
            bytes,
        );
    }

    pub fn track_rpc_sent_many<I>(
        &mut self,
        receivers: I,
        object: ObjectId,
        rpc_name: &str,
        behaviour_name: &str,
        bytes: u64,
    ) where
        I: IntoIterator,
        I::Item: Borrow<ConnectionId>,
    {
        for receiver in receivers {
            self.track_rpc_sent(*receiver.borrow(), object, rpc_name, behaviour_name, bytes);
        }
    }

    pub fn track_rpc_received(
        &mut self,
        sender: ConnectionId,
        object: ObjectId,
        rpc_name: &str,
        behaviour_name: &str,
        bytes: u64,
    ) {
        self.track_rpc(
            Direction::Received,
            sender,
            object,
            rpc_name,
            behaviour_name,
            bytes,
        );
    }

    fn track_rpc(
        &mut self,
        direction: Direction,
        connection: ConnectionId,
        object: ObjectId,
        rpc_name: &str,
        behaviour_name: &str,
        bytes: u64,
    ) {
        self.track(|registry| {
            MetricEvent::new(MetricKind::Rpc, direction, connection, bytes)
                .with_object(object, object_name(registry, object))
                .with_name(label(rpc_name))
                .with_detail(label(behaviour_name))
        });
    }

    pub fn track_server_log_sent(&mut self, receiver: ConnectionId, log_type: u32, bytes: u64) {
        self.track(|_| {
            MetricEvent::new(MetricKind::ServerLog, Direction::Sent, receiver, bytes)
                .with_name(label(log_type_name(log_type)))
        });
    }

    pub fn track_server_log_received(&mut self, sender: ConnectionId, log_type: u32, bytes: u64) {
        self.track(|_| {
            MetricEvent::new(MetricKind::ServerLog, Direction::Received, sender, bytes)
                .with_name(label(log_type_name(log_type)))
        });
    }

    pub fn track_scene_event_sent(
        &mut self,
        receiver: ConnectionId,
        scene_event_type: u32,
        scene_name: &str,
        bytes: u64,
    ) {
        self.track_scene_event(
            Direction::Sent,
            receiver,
            scene_event_type,
            scene_name,
            bytes,
        );
    }

    pub fn track_scene_event_sent_many<I>(
        &mut self,
        receivers: I,
        scene_event_type: u32,
        scene_name: &str,
        bytes: u64,
    ) where
        I: IntoIterator,
        I::Item: Borrow<ConnectionId>,
    {
        for receiver in receivers {
            self.track_scene_event_sent(*receiver.borrow(), scene_event_type, scene_name, bytes);
        }
    }

    pub fn track_scene_event_received(
        &mut self,
        sender: ConnectionId,
        scene_event_type: u32,
        scene_name: &str,
        bytes: u64,
    ) {
        self.track_scene_event(
            Direction::Received,
            sender,
            scene_event_type,
            scene_name,
            bytes,
        );
    }

    fn track_scene_event(
        &mut self,
        direction: Direction,
        connection: ConnectionId,
        scene_event_type: u32,
        scene_name: &str,
        bytes: u64,
    ) {
        self.track(|_| {
            MetricEvent::new(MetricKind::SceneEvent, direction, connection, bytes)
                .with_name(label(scene_event_type_name(scene_event_type)))
                .with_detail(label(scene_name))
        });
    }

    /// Updates the round trip time to the server.
    ///
    /// The value is stored in seconds.
    pub fn update_rtt_to_server(&mut self, rtt_millis: u32) {
        if !self.can_update_gauge() {
            return;
        }

        let rtt = f64::from(rtt_millis) / 1000.0;
        self.collection.gauges_mut().rtt_to_server.set(rtt);
    }

    pub fn update_network_objects_count(&mut self, count: u64) {
        if !self.can_update_gauge() {
            return;
        }

        self.collection.gauges_mut().network_objects.set(count);
    }

    pub fn update_connections_count(&mut self, count: u64) {
        if !self.can_update_gauge() {
            return;
        }

        self.collection.gauges_mut().connections.set(count);
    }

    pub fn update_packet_loss(&mut self, packet_loss: f32) {
        if !self.can_update_gauge() {
            return;
        }

        self.collection.gauges_mut().packet_loss.set(packet_loss);
    }

    #[inline]
    fn can_update_gauge(&self) -> bool {
        !self.config.gauges_use_budget || self.can_record()
    }

    fn track<F>(&mut self, f: F)
    where
        F: FnOnce(&R) -> MetricEvent,
    {
        if !self.can_record() {
            if self.dropped_this_tick == 0 && self.config.log_dropped {
                tracing::debug!(
                    "reached limit of {} metrics in this tick, dropping metrics until the next tick",
                    self.config.max_metrics_per_tick
                );
            }

            self.dropped_this_tick += 1;
            return;
        }

        let event = f(&self.registry);
        self.collection.record(event);
        self.metrics_this_tick += 1;
    }
}

fn object_name<R>(registry: &R, object: ObjectId) -> Label
where
    R: ObjectRegistry,
{
    label(registry.name(object).unwrap_or(UNKNOWN_OBJECT))
}
