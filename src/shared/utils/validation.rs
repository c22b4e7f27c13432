use crate::shared::errors::AppError;

/// Boundary-input checks shared by the compat API contract and the import
/// engine (§8 "Boundary behavior").
pub struct Validator;

impl Validator {
    /// §8: empty search keyword is a 422 at the (out-of-scope) HTTP boundary.
    pub fn validate_keyword(keyword: &str) -> Result<(), AppError> {
        if keyword.trim().is_empty() {
            return Err(AppError::ValidationError(
                "keyword cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_title(title: &str) -> Result<(), AppError> {
        if title.trim().is_empty() {
            return Err(AppError::ValidationError(
                "title cannot be empty".to_string(),
            ));
        }
        if title.chars().count() > 255 {
            return Err(AppError::ValidationError(
                "title too long (max 255 characters)".to_string(),
            ));
        }
        Ok(())
    }

    /// §8: a `/match/batch` request with more than 32 items is a 400.
    pub const MAX_BATCH_MATCH_SIZE: usize = 32;

    pub fn validate_batch_size(count: usize) -> Result<(), AppError> {
        if count == 0 {
            return Err(AppError::ValidationError(
                "batch request must contain at least one item".to_string(),
            ));
        }
        if count > Self::MAX_BATCH_MATCH_SIZE {
            return Err(AppError::ValidationError(format!(
                "batch request exceeds the maximum of {} items",
                Self::MAX_BATCH_MATCH_SIZE
            )));
        }
        Ok(())
    }

    pub fn validate_pagination(offset: i64, limit: i64) -> Result<(), AppError> {
        if offset < 0 {
            return Err(AppError::ValidationError(
                "offset cannot be negative".to_string(),
            ));
        }
        if limit <= 0 {
            return Err(AppError::ValidationError(
                "limit must be positive".to_string(),
            ));
        }
        if limit > 100 {
            return Err(AppError::ValidationError(
                "limit cannot exceed 100".to_string(),
            ));
        }
        Ok(())
    }

    /// §3: a media-id must not be empty or bare whitespace.
    pub fn validate_media_id(media_id: &str) -> Result<(), AppError> {
        if media_id.trim().is_empty() {
            return Err(AppError::ValidationError(
                "media_id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_keyword_is_rejected() {
        assert!(Validator::validate_keyword("").is_err());
        assert!(Validator::validate_keyword("   ").is_err());
    }

    #[test]
    fn batch_of_33_is_rejected() {
        assert!(Validator::validate_batch_size(32).is_ok());
        assert!(Validator::validate_batch_size(33).is_err());
        assert!(Validator::validate_batch_size(0).is_err());
    }
}
