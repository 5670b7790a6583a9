//! Result type alias for Courier
//!
//! This module provides a convenient Result type alias that uses CourierError
//! as the error type.

use super::errors::CourierError;

/// Result type alias for Courier operations
///
/// # Examples
///
/// ```
/// use courier::domain::result::Result;
/// use courier::domain::errors::CourierError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(CourierError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, CourierError>;
