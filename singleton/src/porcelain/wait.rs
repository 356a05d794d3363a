use crate::{Singleton, SingletonError};

/// Trait for waiting on singleton values asynchronously.
///
/// Waiting attaches as a consumer for as long as the future is pending, so it starts
/// the computation if nothing else is attached.
pub trait Wait<T: 'static> {
    /// Wait for the singleton to hold a specific value
    fn wait_value(&self, target_value: T) -> impl std::future::Future<Output = Result<(), SingletonError>> + Send
    where T: PartialEq;

    /// Wait for the singleton to reach a value matching the given predicate
    fn wait_for<F, R>(&self, predicate: F) -> impl std::future::Future<Output = Result<R::Output, SingletonError>> + Send
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: WaitResult;
}

/// What a [`Wait::wait_for`] predicate may return.
///
/// A predicate either accepts a delivered value, ending the wait with some output, or
/// declines it, in which case the waiter keeps listening.
pub trait WaitResult {
    type Output;
    /// `Some` ends the wait with that output
    fn result(self) -> Option<Self::Output>;
}

// `true` accepts the value
impl WaitResult for bool {
    type Output = ();
    fn result(self) -> Option<Self::Output> { self.then_some(()) }
}

// the predicate can map the accepted value to whatever it wants returned
impl<T> WaitResult for Option<T> {
    type Output = T;
    fn result(self) -> Option<Self::Output> { self }
}

impl<T> Wait<T> for Singleton<T>
where T: Clone + Send + Sync + 'static
{
    fn wait_value(&self, target_value: T) -> impl std::future::Future<Output = Result<(), SingletonError>> + Send
    where T: PartialEq {
        self.wait_for(move |value: &T| *value == target_value)
    }

    fn wait_for<F, R>(&self, predicate: F) -> impl std::future::Future<Output = Result<R::Output, SingletonError>> + Send
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: WaitResult,
    {
        async move {
            // Bridge the synchronous broadcast to async. The mount delivery lands in the
            // channel before subscribe returns, so the current value is checked first.
            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            let _subscription = self.subscribe(tx)?;

            while let Some(value) = rx.recv().await {
                if let Some(result) = predicate(&value).result() {
                    return Ok(result);
                }
            }

            // Every sender is gone, which only happens when the registry was cleared
            Err(SingletonError::Disposed)
        }
    }
}
