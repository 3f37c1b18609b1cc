//! Exclusively owned parser handles.

use std::fmt;

use tracing::debug;

/// Sole owner of a parser-engine resource (an index or a translation unit).
///
/// The handle is not `Clone`: sharing happens one level up, through the
/// reference-counted document state. The resource is disposed when it is
/// replaced, explicitly disposed, or when the handle is dropped.
pub struct NativeHandle<T> {
    kind: &'static str,
    resource: Option<T>,
}

impl<T> NativeHandle<T> {
    /// Creates an empty handle for resources of the given kind.
    pub fn null(kind: &'static str) -> Self {
        Self {
            kind,
            resource: None,
        }
    }

    /// Returns whether no resource is held.
    pub fn is_null(&self) -> bool {
        self.resource.is_none()
    }

    /// Shared access to the resource.
    pub fn get(&self) -> Option<&T> {
        self.resource.as_ref()
    }

    /// Exclusive access to the resource.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.resource.as_mut()
    }

    /// Stores a resource, disposing the previous one.
    pub fn replace(&mut self, resource: T) {
        self.dispose();
        self.resource = Some(resource);
    }

    /// Returns the resource, creating it first if the handle is null.
    pub fn get_or_insert_with(&mut self, create: impl FnOnce() -> T) -> &mut T {
        self.resource.get_or_insert_with(create)
    }

    /// Disposes the held resource, if any.
    pub fn dispose(&mut self) {
        if self.resource.take().is_some() {
            debug!("Disposed {}", self.kind);
        }
    }
}

impl<T> Drop for NativeHandle<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T> fmt::Debug for NativeHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("kind", &self.kind)
            .field("null", &self.is_null())
            .finish()
    }
}
