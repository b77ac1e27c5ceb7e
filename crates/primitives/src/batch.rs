//! Inclusive block-range validation.

use crate::ValidationError;

/// Validates an inclusive `[start, end]` block range.
pub const fn validate_range(start: u64, end: u64) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::InvalidRange { start, end });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_range() {
        assert!(validate_range(5, 4).is_err());
        assert!(validate_range(5, 5).is_ok());
    }
}
