use thiserror::Error;

/// Errors surfaced by the reconciliation engine.
///
/// Expected absences (a function that does not exist during deploy
/// resolution, a function with no policy yet, a state record that was
/// never written) are not errors; backends encode them as `Option` and
/// the engine routes them to defined branches. Everything here is
/// either fatal for the run or a configuration problem reported before
/// any backend call.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A backend call failed outside the expected-absence set.
    #[error("backend call '{operation}' failed for {context}: {message}")]
    Backend {
        /// The logical operation that failed.
        operation: String,
        /// The identities the call operated on.
        context: String,
        /// The backend's own description of the failure.
        message: String,
    },

    /// The declared bindings are unusable as written.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A policy or filter document could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Creates a new `Backend` error.
    pub fn backend(
        operation: impl Into<String>,
        context: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Backend {
            operation: operation.into(),
            context: context.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns `true` if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns `true` if this is a backend call failure.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_display_names_operation_and_context() {
        let err = EngineError::backend("subscribe", "orders -> order-created", "access denied");
        assert_eq!(
            err.to_string(),
            "backend call 'subscribe' failed for orders -> order-created: access denied"
        );
        assert!(err.is_backend());
        assert!(!err.is_configuration());
    }

    #[test]
    fn configuration_error_predicate() {
        let err = EngineError::configuration("binding 'f1' declares no topic ARN");
        assert!(err.is_configuration());
    }
}
