//! Error types for the convergence engine

use sonic_sai::SaiError;
use thiserror::Error;

/// Convergence engine errors.
///
/// Everything except [`SyncdError::Fatal`] is recoverable: the caller can
/// reject the request and keep serving. `Fatal` means the control-plane
/// model and the hardware may have diverged.
#[derive(Error, Debug)]
pub enum SyncdError {
    /// Caller passed a bad argument
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Snapshot could not be loaded or is malformed
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// View comparison failed before anything was sent to the device.
    /// `fatal` is set when the cause was a consistency violation.
    #[error("Comparison failed: {message}")]
    Comparison { message: String, fatal: bool },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Device interface or SAI model error
    #[error("SAI error: {0}")]
    Sai(#[from] SaiError),

    /// Consistency violation; the run must be aborted
    #[error("Fatal: {0}")]
    Fatal(String),
}

impl SyncdError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncdError::Fatal(_))
    }

    /// A rejected comparison caused by a consistency violation rather than
    /// by the request. The device was not touched either way.
    pub fn is_fatal_comparison(&self) -> bool {
        matches!(self, SyncdError::Comparison { fatal: true, .. })
    }
}

/// Logs the message at error level and builds a [`SyncdError::Fatal`].
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)+) => {{
        let message = format!($($arg)+);
        log::error!("{}", message);
        $crate::error::SyncdError::Fatal(message)
    }};
}

/// Result type for convergence engine operations
pub type Result<T> = std::result::Result<T, SyncdError>;
