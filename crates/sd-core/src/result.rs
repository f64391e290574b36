//! Result type aliases and the service result pattern

use crate::error::{SdError, ValidationErrors};

/// Standard Result type for ShopDesk operations
pub type SdResult<T> = Result<T, SdError>;

/// Outcome of a service call.
///
/// Failures carry `ValidationErrors`; the error code of a non-validation
/// failure is kept so callers can tell a stale write from a bad request.
#[derive(Debug)]
pub struct ServiceResult<T> {
    /// Whether the operation succeeded
    pub success: bool,
    /// The result value (if successful)
    pub result: Option<T>,
    /// Errors (if failed)
    pub errors: ValidationErrors,
    /// Machine-readable code of the underlying error, if any
    pub error_code: Option<&'static str>,
}

impl<T> ServiceResult<T> {
    /// Create a successful result
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            errors: ValidationErrors::new(),
            error_code: None,
        }
    }

    /// Create a failed result with errors
    pub fn failure(errors: ValidationErrors) -> Self {
        Self {
            success: false,
            result: None,
            errors,
            error_code: Some("validation_failed"),
        }
    }

    /// Create a failed result with a single base error message
    pub fn failure_with_message(message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add_base(message);
        Self::failure(errors)
    }

    /// Create a failed result from an error
    pub fn from_error(error: SdError) -> Self {
        let code = error.error_code();
        let mut result = match error {
            SdError::Validation(errors) => Self::failure(errors),
            other => Self::failure_with_message(other.to_string()),
        };
        result.error_code = Some(code);
        result
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_failure(&self) -> bool {
        !self.success
    }

    /// Get the result value, panicking if not successful
    pub fn unwrap(self) -> T {
        self.result.expect("Called unwrap on a failed ServiceResult")
    }

    /// Map the result value
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ServiceResult<U> {
        ServiceResult {
            success: self.success,
            result: self.result.map(f),
            errors: self.errors,
            error_code: self.error_code,
        }
    }

    /// Chain another service call
    pub fn and_then<U, F: FnOnce(T) -> ServiceResult<U>>(self, f: F) -> ServiceResult<U> {
        if self.success {
            if let Some(result) = self.result {
                return f(result);
            }
        }
        ServiceResult {
            success: false,
            result: None,
            errors: self.errors,
            error_code: self.error_code,
        }
    }

    /// Convert to standard Result
    pub fn into_result(self) -> SdResult<T> {
        if self.success {
            self.result.ok_or_else(|| {
                SdError::Internal("ServiceResult success but no result value".into())
            })
        } else if self.error_code == Some("conflict") {
            Err(SdError::conflict(self.errors.full_messages().join(", ")))
        } else {
            Err(SdError::Validation(self.errors))
        }
    }
}

impl<T> From<SdResult<T>> for ServiceResult<T> {
    fn from(result: SdResult<T>) -> Self {
        match result {
            Ok(value) => ServiceResult::success(value),
            Err(e) => ServiceResult::from_error(e),
        }
    }
}

impl<T> From<ServiceResult<T>> for SdResult<T> {
    fn from(result: ServiceResult<T>) -> Self {
        result.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_and_map() {
        let result = ServiceResult::success(2).map(|v| v * 10);
        assert!(result.is_success());
        assert_eq!(result.unwrap(), 20);
    }

    #[test]
    fn test_and_then_short_circuits() {
        let failed: ServiceResult<i32> = ServiceResult::failure_with_message("nope");
        let chained = failed.and_then(|v| ServiceResult::success(v + 1));
        assert!(chained.is_failure());
        assert_eq!(chained.errors.base_errors, vec!["nope".to_string()]);
    }

    #[test]
    fn test_from_error_keeps_code() {
        let result: ServiceResult<()> =
            ServiceResult::from_error(SdError::conflict("lock version 3 is stale"));
        assert!(result.is_failure());
        assert_eq!(result.error_code, Some("conflict"));
        assert!(matches!(result.into_result(), Err(SdError::Conflict { .. })));
    }

    #[test]
    fn test_validation_round_trip() {
        let mut errors = ValidationErrors::new();
        errors.add("total", "is not a number");
        let result: ServiceResult<()> = Err(SdError::Validation(errors)).into();
        match result.into_result() {
            Err(SdError::Validation(errors)) => assert!(errors.has_error("total")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
