/// Configuration for a [`Singleton`](crate::Singleton)
#[derive(Debug, Clone, Default)]
pub struct SingletonOptions {
    /// Stop the computation when the last consumer detaches.
    /// When false (the default) the computation runs at most once for the singleton's lifetime.
    pub unmount_if_no_consumers: bool,
    /// Label attached to tracing events
    pub name: Option<String>,
}

impl SingletonOptions {
    pub fn new() -> Self { Self::default() }

    pub fn unmount_if_no_consumers(mut self, unmount: bool) -> Self {
        self.unmount_if_no_consumers = unmount;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub(crate) fn label(&self) -> &str { self.name.as_deref().unwrap_or("singleton") }
}
