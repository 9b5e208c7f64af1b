use thiserror::Error;

/// Errors raised at selector construction time.
///
/// Contract violations by the caller (such as an empty endpoint host) fail
/// fast here; everything that can go wrong during a selection step is
/// recovered locally and never surfaces as an error.
#[derive(Debug, Error)]
pub enum SelectorError {
    /// Raised when the supplied configuration is unusable.
    #[error("invalid selector configuration: {0}")]
    Config(String),
}

impl SelectorError {
    /// Helper for wrapping configuration failures.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
