use std::sync::Weak;

use crate::{Singleton, SubscriberId, singleton::Inner};

/// A consumer attached to a [`Singleton`]. Detaches when dropped.
///
/// The subscription does not keep the singleton alive.
pub struct Subscription<T: Clone + Send + Sync + 'static> {
    inner: Weak<Inner<T>>,
    id: SubscriberId,
    mounted: T,
}

impl<T: Clone + Send + Sync + 'static> Subscription<T> {
    pub(crate) fn new(inner: Weak<Inner<T>>, id: SubscriberId, mounted: T) -> Self { Self { inner, id, mounted } }

    pub fn id(&self) -> SubscriberId { self.id }

    /// The value delivered to this consumer when it attached
    pub fn mounted_value(&self) -> &T { &self.mounted }

    /// Current value of the singleton, if it still exists
    pub fn get(&self) -> Option<T> { self.singleton().map(|singleton| singleton.get()) }

    /// Detach now rather than on drop
    pub fn unsubscribe(self) {}

    fn singleton(&self) -> Option<Singleton<T>> { self.inner.upgrade().map(Singleton) }
}

impl<T: Clone + Send + Sync + 'static> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(singleton) = self.singleton() {
            singleton.detach(self.id);
        }
    }
}

impl<T: Clone + Send + Sync + std::fmt::Debug + 'static> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).field("mounted", &self.mounted).finish()
    }
}
