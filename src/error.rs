//! Error types for telemetry processing.
//!
//! All errors implement the `std::error::Error` trait and carry structured
//! context. There are two deliberate tiers:
//!
//! - **Contract violations** (`InvalidArgument`, `OutOfRange`) are surfaced
//!   synchronously to the caller that passed the bad value.
//! - **Provider failures** (`Provider`) are caught by the polling client and
//!   re-emitted as `error` events; they never terminate the poll schedule.
//!
//! Malformed session text is *not* an error channel: the session parser is
//! best-effort and drops lines it cannot shape, because the upstream format
//! is not contractually stable across simulator builds.

use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Value out of range: {reason}")]
    OutOfRange { reason: String },

    #[error("Provider call failed: {reason}")]
    Provider {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },
}

impl TelemetryError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// Provider failures are transient by nature (the sim may have exited or
    /// the shared memory gone stale); the next scheduled tick retries them.
    /// Contract violations are not retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::Provider { .. } => true,
            TelemetryError::InvalidArgument { .. } => false,
            TelemetryError::OutOfRange { .. } => false,
            TelemetryError::Parse { .. } => false,
        }
    }

    /// Helper constructor for invalid argument errors.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        TelemetryError::InvalidArgument { reason: reason.into() }
    }

    /// Helper constructor for out-of-range errors.
    pub fn out_of_range(reason: impl Into<String>) -> Self {
        TelemetryError::OutOfRange { reason: reason.into() }
    }

    /// Helper constructor for provider failures.
    pub fn provider(reason: impl Into<String>) -> Self {
        TelemetryError::Provider { reason: reason.into(), source: None }
    }

    /// Helper constructor for provider failures with an underlying cause.
    pub fn provider_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TelemetryError::Provider { reason: reason.into(), source: Some(source) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_constructors_validation() {
        let arg_error = TelemetryError::invalid_argument("car number must be numeric");
        assert!(matches!(arg_error, TelemetryError::InvalidArgument { .. }));

        let range_error = TelemetryError::out_of_range("entry index 3 >= count 3");
        assert!(matches!(range_error, TelemetryError::OutOfRange { .. }));

        let provider_error = TelemetryError::provider("shared memory unmapped");
        assert!(matches!(provider_error, TelemetryError::Provider { .. }));
    }

    #[test]
    fn error_traits_validation() {
        // Compile-time check: TelemetryError must be Send + Sync + 'static
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<TelemetryError>();

        let error = TelemetryError::provider("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retryability_classification() {
        assert!(TelemetryError::provider("gone").is_retryable());
        assert!(!TelemetryError::invalid_argument("bad").is_retryable());
        assert!(!TelemetryError::out_of_range("big").is_retryable());
    }

    #[test]
    fn provider_source_is_chained() {
        let io_err = std::io::Error::other("mapping lost");
        let error = TelemetryError::provider_with_source("read failed", Box::new(io_err));

        let source = std::error::Error::source(&error).expect("source should be attached");
        assert_eq!(source.to_string(), "mapping lost");
    }

    #[test]
    fn error_messages_contain_context() {
        let error = TelemetryError::out_of_range("car number overflows i32");
        assert!(error.to_string().contains("car number overflows i32"));

        let parse = TelemetryError::Parse {
            context: "session text".to_string(),
            details: "not utf-8".to_string(),
        };
        assert!(parse.to_string().contains("session text"));
        assert!(parse.to_string().contains("not utf-8"));
    }
}
