use crate::id::{ConnectionId, ObjectId};

/// Resolves network objects at the time a metric is recorded.
///
/// The metrics never hold on to the returned values beyond the call that
/// recorded them.
pub trait ObjectRegistry {
    /// Returns the display name of the object.
    fn name(&self, id: ObjectId) -> Option<&str>;

    /// Returns the connection that owns the object.
    fn owner(&self, id: ObjectId) -> Option<ConnectionId>;
}

/// A registry that knows about no objects.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoRegistry;

impl ObjectRegistry for NoRegistry {
    #[inline]
    fn name(&self, _id: ObjectId) -> Option<&str> {
        None
    }

    #[inline]
    fn owner(&self, _id: ObjectId) -> Option<ConnectionId> {
        None
    }
}

impl<T> ObjectRegistry for &T
where
    T: ObjectRegistry + ?Sized,
{
    #[inline]
    fn name(&self, id: ObjectId) -> Option<&str> {
        T::name(self, id)
    }

    #[inline]
    fn owner(&self, id: ObjectId) -> Option<ConnectionId> {
        T::owner(self, id)
    }
}

impl<T> ObjectRegistry for std::sync::Arc<T>
where
    T: ObjectRegistry + ?Sized,
{
    #[inline]
    fn name(&self, id: ObjectId) -> Option<&str> {
        T::name(self, id)
    }

    #[inline]
    fn owner(&self, id: ObjectId) -> Option<ConnectionId> {
        T::owner(self, id)
    }
}
