#[cfg(feature = "tokio")]
pub mod wait;

#[cfg(feature = "tokio")]
pub use wait::*;
