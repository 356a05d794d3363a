/// Starting value of a singleton: either the value itself or a producer that is
/// invoked exactly once, when the singleton is created.
pub enum Initial<T> {
    Value(T),
    Producer(Box<dyn FnOnce() -> T + Send>),
}

impl<T> Initial<T> {
    pub fn value(value: T) -> Self { Initial::Value(value) }

    pub fn producer<F>(producer: F) -> Self
    where F: FnOnce() -> T + Send + 'static {
        Initial::Producer(Box::new(producer))
    }

    pub(crate) fn resolve(self) -> T {
        match self {
            Initial::Value(value) => value,
            Initial::Producer(producer) => producer(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Initial<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Initial::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Initial::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Holds the current and initial value of a singleton.
///
/// Writes never compare against the previous value; every write counts as a change.
/// The cell itself is not synchronized - it lives behind the singleton's state lock.
pub(crate) struct StateCell<T> {
    current: T,
    initial: T,
    writes: u64,
}

impl<T: Clone> StateCell<T> {
    pub fn new(initial: Initial<T>) -> Self {
        let initial = initial.resolve();
        Self { current: initial.clone(), initial, writes: 0 }
    }

    pub fn read(&self) -> T { self.current.clone() }

    pub fn initial(&self) -> T { self.initial.clone() }
}

impl<T> StateCell<T> {
    /// Replaces the current value, returning the previous one
    pub fn write(&mut self, value: T) -> T {
        self.writes += 1;
        std::mem::replace(&mut self.current, value)
    }

    /// Number of writes accepted since creation
    pub fn writes(&self) -> u64 { self.writes }
}
