//! Result type alias for Prvotkar

use super::errors::PrvotkarError;

/// Result type alias for Prvotkar operations
///
/// # Examples
///
/// ```
/// use prvotkar::domain::result::Result;
/// use prvotkar::domain::errors::PrvotkarError;
///
/// fn parse_page_size(raw: &str) -> Result<usize> {
///     raw.parse()
///         .map_err(|_| PrvotkarError::Validation(format!("not a page size: {raw}")))
/// }
///
/// assert_eq!(parse_page_size("1000").unwrap(), 1000);
/// assert!(parse_page_size("many").is_err());
/// ```
pub type Result<T> = std::result::Result<T, PrvotkarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<u32> {
            Ok(582786)
        }

        let value = inner()?;
        assert_eq!(value, 582786);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(PrvotkarError::Validation("test error".to_string()));
        assert!(result.is_err());
    }
}
