use std::str::FromStr;
use std::sync::{Arc, Mutex};

use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").ok().and_then(|level| Level::from_str(&level).ok()).unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt().with_max_level(level).with_test_writer().try_init();
}

/// Returns a listener that records every delivered value, and a function that drains the record
#[allow(unused)]
pub fn watcher<T: Send + Sync + 'static>() -> (impl Fn(T) + Send + Sync + Clone + 'static, impl Fn() -> Vec<T>) {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let accumulate = {
        let changes = changes.clone();
        move |value: T| changes.lock().unwrap().push(value)
    };

    let check = move || changes.lock().unwrap().drain(..).collect::<Vec<T>>();

    (accumulate, check)
}

/// Shared log that several listeners can write tagged entries into
#[allow(unused)]
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

#[allow(unused)]
impl Log {
    pub fn new() -> Self { Self::default() }

    pub fn push(&self, entry: impl Into<String>) { self.0.lock().unwrap().push(entry.into()) }

    /// Listener that records `"{tag}:{value:?}"`
    pub fn listener<T: std::fmt::Debug + 'static>(&self, tag: &'static str) -> impl Fn(T) + Send + Sync + 'static {
        let log = self.clone();
        move |value: T| log.push(format!("{tag}:{value:?}"))
    }

    pub fn take(&self) -> Vec<String> { self.0.lock().unwrap().drain(..).collect() }
}
