use std::sync::{Arc, Weak};

use tracing::trace;

use crate::{activation::Epoch, singleton::Inner};

/// Handle given to a computation body for the duration of one activation.
///
/// Writes made through the scope (or any [`Setter`] obtained from it) are honored only
/// while that activation is running. Once the computation has been stopped they are
/// silently dropped.
pub struct Scope<T> {
    inner: Arc<Inner<T>>,
    epoch: Epoch,
}

impl<T> Scope<T> {
    pub(crate) fn new(inner: Arc<Inner<T>>, epoch: Epoch) -> Self { Self { inner, epoch } }

    /// Whether this activation is still running
    pub fn is_active(&self) -> bool { self.inner.lock().activation.is_current(self.epoch) }

    /// Register an action to run when this activation stops.
    ///
    /// Cleanups run in reverse registration order. If the activation has already
    /// stopped, the cleanup runs immediately.
    pub fn on_cleanup<F>(&self, cleanup: F)
    where F: FnOnce() + Send + 'static {
        let rejected = self.inner.lock().activation.register_cleanup(self.epoch, Box::new(cleanup));
        if let Err(cleanup) = rejected {
            cleanup();
        }
    }

    /// A detached write handle for producing values after the body has returned
    pub fn setter(&self) -> Setter<T> { Setter { inner: Arc::downgrade(&self.inner), epoch: self.epoch } }
}

impl<T: Clone> Scope<T> {
    /// Write a new value and deliver it to every attached consumer before returning
    pub fn set(&self, value: T) -> bool { self.inner.write(self.epoch, value) }

    /// Returns a clone of the current value
    pub fn get(&self) -> T { self.inner.lock().cell.read() }
}

/// Write handle tied to one activation of a computation.
///
/// Holds only a weak reference to the singleton, so it can be moved into threads or
/// tasks without keeping the singleton alive.
pub struct Setter<T> {
    inner: Weak<Inner<T>>,
    epoch: Epoch,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self { Self { inner: self.inner.clone(), epoch: self.epoch } }
}

impl<T> Setter<T> {
    /// Whether writes through this setter would still be delivered
    pub fn is_active(&self) -> bool { self.inner.upgrade().is_some_and(|inner| inner.lock().activation.is_current(self.epoch)) }
}

impl<T: Clone> Setter<T> {
    /// Write a new value. Returns false if the activation has stopped or the singleton is gone.
    pub fn set(&self, value: T) -> bool {
        match self.inner.upgrade() {
            Some(inner) => inner.write(self.epoch, value),
            None => {
                trace!(epoch = %self.epoch, "dropping write to released singleton");
                false
            }
        }
    }
}

impl<T> std::fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Setter").field("epoch", &self.epoch).field("active", &self.is_active()).finish()
    }
}
