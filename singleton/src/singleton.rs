use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::{
    ActivationState, Scope, SingletonError, SingletonOptions, Subscription,
    activation::{ActivationController, Cleanup, Epoch, run_cleanups},
    broadcast::publish,
    cell::{Initial, StateCell},
    error::{BoxError, ComputationResult},
    registry::{IntoListener, Listener, SubscriberId, SubscriberRegistry},
};

type Computation<T> = Box<dyn Fn(&Scope<T>) -> Result<(), BoxError> + Send + Sync + 'static>;

pub(crate) struct State<T> {
    pub(crate) cell: StateCell<T>,
    pub(crate) registry: SubscriberRegistry<T>,
    pub(crate) activation: ActivationController,
    pub(crate) disposed: bool,
}

pub(crate) struct Inner<T> {
    computation: Computation<T>,
    pub(crate) options: SingletonOptions,
    state: Mutex<State<T>>,
}

/// One piece of shared state observed by any number of consumers.
///
/// The computation body runs when the first consumer attaches and feeds values into the
/// shared state through its [`Scope`]. Every write is delivered synchronously to all
/// attached consumers, in attachment order. Additional consumers share the running
/// computation rather than starting their own.
///
/// Cloning a `Singleton` shares the same underlying instance.
///
/// # Example
/// ```
/// use singleton_hook::*;
/// use std::sync::{Arc, Mutex};
///
/// let greeting = Singleton::new("hello".to_string(), |scope: &Scope<String>| {
///     scope.set("hello, world".to_string());
/// });
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let subscription = {
///     let seen = seen.clone();
///     greeting.subscribe(move |value: String| seen.lock().unwrap().push(value)).unwrap()
/// };
///
/// assert_eq!(*seen.lock().unwrap(), ["hello", "hello, world"]);
/// assert_eq!(subscription.mounted_value(), "hello");
/// ```
pub struct Singleton<T>(pub(crate) Arc<Inner<T>>);

impl<T> Clone for Singleton<T> {
    fn clone(&self) -> Self { Self(Arc::clone(&self.0)) }
}

impl<T> std::fmt::Debug for Singleton<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.0.lock();
        f.debug_struct("Singleton")
            .field("name", &self.0.options.label())
            .field("state", &state.activation.state())
            .field("subscribers", &state.registry.count())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Singleton<T> {
    /// Create a singleton from an initial value with default options
    pub fn new<F, R>(initial: T, computation: F) -> Self
    where
        F: Fn(&Scope<T>) -> R + Send + Sync + 'static,
        R: ComputationResult,
    {
        Self::create(Initial::Value(initial), computation, SingletonOptions::default())
    }

    /// Create a singleton whose initial value is produced by `init`, called once, right now
    pub fn new_with<I, F, R>(init: I, computation: F) -> Self
    where
        I: FnOnce() -> T + Send + 'static,
        F: Fn(&Scope<T>) -> R + Send + Sync + 'static,
        R: ComputationResult,
    {
        Self::create(Initial::producer(init), computation, SingletonOptions::default())
    }

    pub fn with_options<F, R>(initial: T, computation: F, options: SingletonOptions) -> Self
    where
        F: Fn(&Scope<T>) -> R + Send + Sync + 'static,
        R: ComputationResult,
    {
        Self::create(Initial::Value(initial), computation, options)
    }

    /// Create a singleton. The computation is not started until a consumer attaches.
    pub fn create<F, R>(initial: Initial<T>, computation: F, options: SingletonOptions) -> Self
    where
        F: Fn(&Scope<T>) -> R + Send + Sync + 'static,
        R: ComputationResult,
    {
        let state = State {
            cell: StateCell::new(initial),
            registry: SubscriberRegistry::new(),
            activation: ActivationController::new(),
            disposed: false,
        };
        Self(Arc::new(Inner {
            computation: Box::new(move |scope: &Scope<T>| computation(scope).into_result()),
            options,
            state: Mutex::new(state),
        }))
    }

    /// Attach a consumer and return a guard that detaches it when dropped.
    ///
    /// The listener receives the current value immediately, then every subsequent write.
    /// If this is the first consumer, the computation body is started before returning.
    pub fn subscribe<L>(&self, listener: L) -> Result<Subscription<T>, SingletonError>
    where L: IntoListener<T> {
        let (id, mounted) = self.attach_listener(listener.into_listener())?;
        Ok(Subscription::new(Arc::downgrade(&self.0), id, mounted))
    }

    /// Attach a consumer, returning a handle for [`Singleton::detach`].
    ///
    /// The listener receives the current value immediately. When the computation is
    /// inactive, it is started after that first delivery; values it writes synchronously
    /// reach this listener before `attach` returns. If the computation fails, nothing
    /// stays registered and the error is returned.
    pub fn attach<L>(&self, listener: L) -> Result<SubscriberId, SingletonError>
    where L: IntoListener<T> {
        let (id, _) = self.attach_listener(listener.into_listener())?;
        Ok(id)
    }

    /// Returns the new subscriber's id along with the value delivered to it on mount
    fn attach_listener(&self, listener: Listener<T>) -> Result<(SubscriberId, T), SingletonError> {
        let (id, current, epoch) = {
            let mut state = self.0.lock();
            if state.disposed {
                return Err(SingletonError::Disposed);
            }
            let id = state.registry.add(listener.clone());
            let epoch = state.activation.begin();
            trace!(singleton = self.0.options.label(), subscriber = %id, subscribers = state.registry.count(), "attached");
            (id, state.cell.read(), epoch)
        };

        // from here until the attach completes, an error or panic undoes it
        let attempt = AttachAttempt { inner: &self.0, id, epoch, committed: false };
        listener(current.clone());

        match epoch {
            Some(epoch) => self.activate(attempt, epoch)?,
            None => attempt.commit(),
        }
        Ok((id, current))
    }

    fn activate(&self, attempt: AttachAttempt<'_, T>, epoch: Epoch) -> Result<(), SingletonError> {
        // the mount delivery may have detached or disposed re-entrantly
        if !self.0.lock().activation.is_current(epoch) {
            attempt.commit();
            return Ok(());
        }
        debug!(singleton = self.0.options.label(), %epoch, "activating computation");

        let scope = Scope::new(Arc::clone(&self.0), epoch);
        match (self.0.computation)(&scope) {
            Ok(()) => {
                attempt.commit();
                Ok(())
            }
            Err(err) => {
                debug!(singleton = self.0.options.label(), %epoch, error = %err, "computation failed to activate");
                drop(attempt);
                Err(SingletonError::Activation(err))
            }
        }
    }

    /// Detach a consumer. Returns false if the handle was not attached.
    ///
    /// When the last consumer detaches and `unmount_if_no_consumers` is set, the
    /// computation is stopped and its cleanups run before this returns.
    pub fn detach(&self, id: SubscriberId) -> bool {
        // the removed listener may own subscriptions to this singleton, so it drops after the lock
        let (removed, cleanups) = {
            let mut state = self.0.lock();
            let Some(removed) = state.registry.remove(id) else {
                debug!(singleton = self.0.options.label(), subscriber = %id, "detach of unknown subscriber ignored");
                return false;
            };
            trace!(singleton = self.0.options.label(), subscriber = %id, subscribers = state.registry.count(), "detached");
            (removed, self.0.stop_if_unused(&mut state))
        };
        run_cleanups(cleanups);
        drop(removed);
        true
    }

    /// Stop the computation, detach every consumer and refuse further attaches
    pub fn dispose(&self) {
        let (detached, cleanups) = {
            let mut state = self.0.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            let detached = state.registry.clear();
            debug!(singleton = self.0.options.label(), detached = detached.len(), "disposed");
            (detached, state.activation.stop())
        };
        run_cleanups(cleanups);
        drop(detached);
    }

    /// Returns a clone of the current value without attaching
    pub fn get(&self) -> T { self.0.lock().cell.read() }

    /// Returns a clone of the value the singleton was created with
    pub fn initial(&self) -> T { self.0.lock().cell.initial() }

    pub fn subscriber_count(&self) -> usize { self.0.lock().registry.count() }

    pub fn is_attached(&self, id: SubscriberId) -> bool { self.0.lock().registry.contains(id) }

    pub fn activation_state(&self) -> ActivationState { self.0.lock().activation.state() }

    /// Number of times the computation body has been started
    pub fn activations(&self) -> u64 { self.0.lock().activation.activations() }

    pub fn is_disposed(&self) -> bool { self.0.lock().disposed }
}

impl<T> Inner<T> {
    pub(crate) fn lock(&self) -> MutexGuard<'_, State<T>> { self.state.lock().expect("singleton state lock poisoned") }

    /// Stops the computation when nobody is attached and the options ask for it
    fn stop_if_unused(&self, state: &mut State<T>) -> Vec<Cleanup> {
        if state.registry.is_empty() && self.options.unmount_if_no_consumers && state.activation.is_active() {
            debug!(singleton = self.options.label(), "no consumers left, stopping computation");
            state.activation.stop()
        } else {
            Vec::new()
        }
    }
}

impl<T: Clone> Inner<T> {
    /// Store `value` and broadcast it, if `epoch` is still the running activation.
    /// Returns whether the write was accepted.
    pub(crate) fn write(&self, epoch: Epoch, value: T) -> bool {
        // the replaced value drops after the lock is released
        let (listeners, _previous) = {
            let mut state = self.lock();
            if !state.activation.is_current(epoch) {
                trace!(singleton = self.options.label(), %epoch, "dropping write from stopped computation");
                return false;
            }
            let previous = state.cell.write(value.clone());
            trace!(
                singleton = self.options.label(),
                write = state.cell.writes(),
                subscribers = state.registry.count(),
                "broadcasting"
            );
            (state.registry.snapshot(), previous)
        };
        publish(&listeners, value);
        true
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        run_cleanups(state.activation.stop());
    }
}

/// Undoes an attach unless committed: the new subscriber is removed and, when the attach
/// started an activation, that epoch is stopped. Covers an `Err` from the computation body
/// as well as a panic in the body or in the mount delivery.
struct AttachAttempt<'a, T> {
    inner: &'a Arc<Inner<T>>,
    id: SubscriberId,
    epoch: Option<Epoch>,
    committed: bool,
}

impl<T> AttachAttempt<'_, T> {
    fn commit(mut self) { self.committed = true; }
}

impl<T> Drop for AttachAttempt<'_, T> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let (removed, cleanups) = {
            let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
            let removed = state.registry.remove(self.id);
            let cleanups = match self.epoch {
                Some(epoch) => state.activation.stop_epoch(epoch),
                None => self.inner.stop_if_unused(&mut state),
            };
            (removed, cleanups)
        };
        run_cleanups(cleanups);
        drop(removed);
    }
}
