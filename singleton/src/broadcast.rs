use crate::registry::Listener;

/// Delivers `value` to each listener in order, synchronously.
///
/// Callers take the listener snapshot while holding the singleton lock and call this
/// after releasing it, so listeners are free to attach, detach or write re-entrantly.
pub(crate) fn publish<T: Clone>(listeners: &[Listener<T>], value: T) {
    // clone the value for each listener except the last one
    if let Some((last, rest)) = listeners.split_last() {
        for listener in rest {
            listener(value.clone());
        }
        last(value);
    }
}
