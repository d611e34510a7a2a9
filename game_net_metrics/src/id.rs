use std::fmt::{self, Display, Formatter};

/// Identifies a single peer connection.
///
/// The value is supplied by the connection layer and is treated as opaque. Two
/// connections using the same id are not detected.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    /// The connection id of the server.
    pub const SERVER: Self = Self(0);

    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

impl From<u64> for ConnectionId {
    #[inline]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for ConnectionId {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Identifies a replicated network object.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ObjectId(pub u64);

impl ObjectId {
    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

impl From<u64> for ObjectId {
    #[inline]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for ObjectId {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}
