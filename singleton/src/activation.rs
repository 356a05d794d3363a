/// Whether the shared computation of a singleton is currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Inactive,
    Active,
}

/// Identifies one activation period. Setters and cleanups carry the epoch they were
/// created in, and anything from a finished epoch is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Epoch(u64);

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// Stop action registered by a computation body
pub(crate) type Cleanup = Box<dyn FnOnce() + Send + 'static>;

/// State machine deciding when the computation body runs and when it is stopped.
///
/// This type does no locking and never calls user code; it hands cleanups back to the
/// caller so they can be run after the singleton lock is released.
pub(crate) struct ActivationController {
    state: ActivationState,
    epoch: u64,
    cleanups: Vec<Cleanup>,
    activations: u64,
}

impl Default for ActivationController {
    fn default() -> Self { Self::new() }
}

impl ActivationController {
    pub fn new() -> Self { Self { state: ActivationState::Inactive, epoch: 0, cleanups: Vec::new(), activations: 0 } }

    pub fn state(&self) -> ActivationState { self.state }

    pub fn is_active(&self) -> bool { self.state == ActivationState::Active }

    /// Number of times an activation period has been started
    pub fn activations(&self) -> u64 { self.activations }

    /// Inactive -> Active. Returns the new epoch, or None if already active.
    pub fn begin(&mut self) -> Option<Epoch> {
        if self.is_active() {
            return None;
        }
        self.state = ActivationState::Active;
        self.epoch += 1;
        self.activations += 1;
        Some(Epoch(self.epoch))
    }

    pub fn is_current(&self, epoch: Epoch) -> bool { self.is_active() && self.epoch == epoch.0 }

    /// Registers a cleanup for `epoch`. A cleanup for a finished epoch is handed back
    /// so the caller can run it immediately.
    pub fn register_cleanup(&mut self, epoch: Epoch, cleanup: Cleanup) -> Result<(), Cleanup> {
        if !self.is_current(epoch) {
            return Err(cleanup);
        }
        self.cleanups.push(cleanup);
        Ok(())
    }

    /// Active -> Inactive, returning the cleanups to run in reverse registration order.
    /// Stopping while inactive is a no-op.
    pub fn stop(&mut self) -> Vec<Cleanup> {
        if !self.is_active() {
            return Vec::new();
        }
        self.state = ActivationState::Inactive;
        let mut cleanups = std::mem::take(&mut self.cleanups);
        cleanups.reverse();
        cleanups
    }

    /// Stops only if `epoch` is still the running one
    pub fn stop_epoch(&mut self, epoch: Epoch) -> Vec<Cleanup> {
        if self.is_current(epoch) { self.stop() } else { Vec::new() }
    }
}

pub(crate) fn run_cleanups(cleanups: Vec<Cleanup>) {
    for cleanup in cleanups {
        cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn cleanup(log: &Arc<Mutex<Vec<u32>>>, n: u32) -> Cleanup {
        let log = log.clone();
        Box::new(move || log.lock().unwrap().push(n))
    }

    #[test]
    fn test_begin_only_from_inactive() {
        let mut controller = ActivationController::new();
        assert_eq!(controller.state(), ActivationState::Inactive);

        let epoch = controller.begin().unwrap();
        assert!(controller.is_current(epoch));
        assert!(controller.begin().is_none());
        assert_eq!(controller.activations(), 1);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut controller = ActivationController::new();
        let epoch = controller.begin().unwrap();
        assert!(controller.register_cleanup(epoch, cleanup(&log, 1)).is_ok());
        assert!(controller.register_cleanup(epoch, cleanup(&log, 2)).is_ok());

        run_cleanups(controller.stop());
        assert_eq!(*log.lock().unwrap(), [2, 1]);
        assert_eq!(controller.state(), ActivationState::Inactive);

        assert!(controller.stop().is_empty());
        assert_eq!(*log.lock().unwrap(), [2, 1]);
    }

    #[test]
    fn test_stale_epoch_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut controller = ActivationController::new();
        let first = controller.begin().unwrap();
        controller.stop();
        let second = controller.begin().unwrap();

        assert!(!controller.is_current(first));
        assert!(controller.is_current(second));
        assert!(controller.stop_epoch(first).is_empty());
        assert!(controller.is_active());

        let rejected = controller.register_cleanup(first, cleanup(&log, 3)).unwrap_err();
        rejected();
        assert_eq!(*log.lock().unwrap(), [3]);
        assert_eq!(controller.activations(), 2);
    }
}
