use std::collections::BTreeMap;
use std::sync::Arc;

/// Identifies one attached consumer. Ids are never reused within a singleton,
/// so ordering by id is attachment order.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// Callback invoked with every value delivered to a consumer
pub type Listener<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

/// Trait for types that can be converted into listeners.
pub trait IntoListener<T> {
    fn into_listener(self) -> Listener<T>;
}

impl<F, T> IntoListener<T> for F
where F: Fn(T) + Send + Sync + 'static
{
    fn into_listener(self) -> Listener<T> { Arc::new(self) }
}

impl<T> IntoListener<T> for Arc<dyn Fn(T) + Send + Sync + 'static> {
    fn into_listener(self) -> Listener<T> { self }
}

impl<T> IntoListener<T> for std::sync::mpsc::Sender<T>
where T: Send + 'static
{
    fn into_listener(self) -> Listener<T> {
        Arc::new(move |value| {
            let _ = self.send(value); // Ignore send errors
        })
    }
}

#[cfg(feature = "tokio")]
impl<T> IntoListener<T> for tokio::sync::mpsc::UnboundedSender<T>
where T: Send + Sync + 'static
{
    fn into_listener(self) -> Listener<T> {
        Arc::new(move |value| {
            let _ = self.send(value); // Ignore send errors
        })
    }
}

/// The set of attached consumers, iterated in attachment order.
pub(crate) struct SubscriberRegistry<T> {
    listeners: BTreeMap<SubscriberId, Listener<T>>,
    next_id: u64,
}

impl<T> Default for SubscriberRegistry<T> {
    fn default() -> Self { Self::new() }
}

impl<T> SubscriberRegistry<T> {
    pub fn new() -> Self { Self { listeners: BTreeMap::new(), next_id: 0 } }

    pub fn add(&mut self, listener: Listener<T>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, listener);
        id
    }

    /// Removes a subscriber, returning its listener. Unknown ids are ignored.
    pub fn remove(&mut self, id: SubscriberId) -> Option<Listener<T>> { self.listeners.remove(&id) }

    pub fn count(&self) -> usize { self.listeners.len() }

    pub fn is_empty(&self) -> bool { self.listeners.is_empty() }

    pub fn contains(&self, id: SubscriberId) -> bool { self.listeners.contains_key(&id) }

    /// Copy of the current listeners so that callbacks can run without borrowing the registry
    pub fn snapshot(&self) -> Vec<Listener<T>> { self.listeners.values().cloned().collect() }

    /// Removes every subscriber, handing the listeners back so the caller decides where they drop
    pub fn clear(&mut self) -> Vec<Listener<T>> { std::mem::take(&mut self.listeners).into_values().collect() }
}
