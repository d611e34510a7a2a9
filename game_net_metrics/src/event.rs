use bitflags::bitflags;

use crate::fixed_string::Label;
use crate::id::{ConnectionId, ObjectId};

/// The traffic category of a [`MetricEvent`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MetricKind {
    NetworkMessage,
    NamedMessage,
    UnnamedMessage,
    NetworkVariableDelta,
    OwnershipChange,
    ObjectSpawn,
    ObjectDestroy,
    Rpc,
    ServerLog,
    SceneEvent,
}

impl MetricKind {
    pub const ALL: [Self; 10] = [
        Self::NetworkMessage,
        Self::NamedMessage,
        Self::UnnamedMessage,
        Self::NetworkVariableDelta,
        Self::OwnershipChange,
        Self::ObjectSpawn,
        Self::ObjectDestroy,
        Self::Rpc,
        Self::ServerLog,
        Self::SceneEvent,
    ];

    /// Returns the bandwidth group that events of this kind are attributed to.
    ///
    /// Returns `None` for kinds that are not associated with a network object.
    pub const fn bandwidth_type(self) -> Option<BandwidthTypes> {
        match self {
            Self::Rpc => Some(BandwidthTypes::RPC),
            Self::NetworkVariableDelta => Some(BandwidthTypes::NET_VAR),
            Self::OwnershipChange | Self::ObjectSpawn | Self::ObjectDestroy => {
                Some(BandwidthTypes::OTHER)
            }
            Self::NetworkMessage
            | Self::NamedMessage
            | Self::UnnamedMessage
            | Self::ServerLog
            | Self::SceneEvent => None,
        }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Whether a message was sent or received by the local peer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Sent,
    Received,
}

/// A direction filter for bandwidth queries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NetworkDirection {
    Sent,
    Received,
    #[default]
    SentAndReceived,
}

impl NetworkDirection {
    #[inline]
    pub const fn contains(self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Self::SentAndReceived, _)
                | (Self::Sent, Direction::Sent)
                | (Self::Received, Direction::Received)
        )
    }
}

bitflags! {
    /// Groups of per-object traffic.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct BandwidthTypes: u8 {
        /// Spawn, destroy and ownership changes.
        const OTHER = 1 << 0;
        const RPC = 1 << 1;
        const NET_VAR = 1 << 2;
    }
}

impl BandwidthTypes {
    /// All groups the collection keeps track of.
    pub const SUPPORTED: Self = Self::all();
}

impl Default for BandwidthTypes {
    #[inline]
    fn default() -> Self {
        Self::all()
    }
}

/// A single recorded metric.
///
/// The meaning of the labels depends on the [`MetricKind`]:
///
/// | Kind                   | `name`             | `detail`       |
/// | ---------------------- | ------------------ | -------------- |
/// | `NetworkMessage`       | message type       |                |
/// | `NamedMessage`         | message name       |                |
/// | `NetworkVariableDelta` | variable name      | behaviour name |
/// | `Rpc`                  | rpc name           | behaviour name |
/// | `ServerLog`            | log level          |                |
/// | `SceneEvent`           | scene event type   | scene name     |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricEvent {
    kind: MetricKind,
    direction: Direction,
    connection: ConnectionId,
    object: Option<(ObjectId, Label)>,
    name: Label,
    detail: Label,
    bytes: u64,
}

impl MetricEvent {
    pub(crate) fn new(
        kind: MetricKind,
        direction: Direction,
        connection: ConnectionId,
        bytes: u64,
    ) -> Self {
        Self {
            kind,
            direction,
            connection,
            object: None,
            name: Label::new(),
            detail: Label::new(),
            bytes,
        }
    }

    #[inline]
    pub(crate) fn with_object(mut self, id: ObjectId, name: Label) -> Self {
        self.object = Some((id, name));
        self
    }

    #[inline]
    pub(crate) fn with_name(mut self, name: Label) -> Self {
        self.name = name;
        self
    }

    #[inline]
    pub(crate) fn with_detail(mut self, detail: Label) -> Self {
        self.detail = detail;
        self
    }

    #[inline]
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The remote end of the message: the receiver for sent messages, the
    /// sender for received messages.
    #[inline]
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    #[inline]
    pub fn object(&self) -> Option<ObjectId> {
        self.object.as_ref().map(|(id, _)| *id)
    }

    /// The display name of the object at the time the event was recorded.
    #[inline]
    pub fn object_name(&self) -> Option<&str> {
        self.object.as_ref().map(|(_, name)| name.as_str())
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    #[inline]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

const SCENE_EVENT_TYPES: &[&str] = &[
    "Load",
    "Unload",
    "Synchronize",
    "ReSynchronize",
    "LoadEventCompleted",
    "UnloadEventCompleted",
    "LoadComplete",
    "UnloadComplete",
    "SynchronizeComplete",
    "ActiveSceneChanged",
    "ObjectSceneChanged",
];

const LOG_TYPES: &[&str] = &["Info", "Warning", "Error"];

/// Returns the display name of a scene event type code.
pub fn scene_event_type_name(code: u32) -> &'static str {
    SCENE_EVENT_TYPES
        .get(code as usize)
        .copied()
        .unwrap_or("Unknown")
}

/// Returns the display name of a server log type code.
pub fn log_type_name(code: u32) -> &'static str {
    LOG_TYPES.get(code as usize).copied().unwrap_or("None")
}
