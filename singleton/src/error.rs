use thiserror::Error;

/// Boxed error type accepted from computation bodies
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SingletonError {
    /// The computation body failed while activating. No subscriber was registered.
    #[error("computation failed to activate: {0}")]
    Activation(#[source] BoxError),
    #[error("singleton has been disposed")]
    Disposed,
}

/// Return types accepted from a computation body.
///
/// ## Semantics
/// - `()` always activates successfully
/// - `Ok(())` activates successfully, `Err(e)` aborts the activation attempt
pub trait ComputationResult {
    fn into_result(self) -> Result<(), BoxError>;
}

impl ComputationResult for () {
    fn into_result(self) -> Result<(), BoxError> { Ok(()) }
}

impl<E> ComputationResult for Result<(), E>
where E: Into<BoxError>
{
    fn into_result(self) -> Result<(), BoxError> { self.map_err(Into::into) }
}
