/// Numeric conversion helpers.
///
/// This module provides safe functions for converting between integer and
/// floating-point doubles without risking silent data loss or rounding
/// errors. The range operator, bitwise coercion, and container indexing all
/// funnel through these helpers.
pub mod num;
