//! Result type alias
//!
//! Convenience alias that uses [`EdiError`] as the error type.

use super::errors::EdiError;

/// Result type alias for engine operations
///
/// # Examples
///
/// ```
/// use sri_edi::domain::result::Result;
/// use sri_edi::domain::errors::EdiError;
///
/// fn failing_function() -> Result<()> {
///     Err(EdiError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, EdiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
