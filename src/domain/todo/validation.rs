//! Todo field validation

use thiserror::Error;

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TodoValidationError {
    #[error("Title is required")]
    EmptyTitle,

    #[error("Title must not exceed {0} characters")]
    TitleTooLong(usize),

    #[error("Description must not exceed {0} characters")]
    DescriptionTooLong(usize),

    #[error("Search keyword cannot be empty")]
    EmptyKeyword,

    #[error("Start date must not be after end date")]
    InvertedRange,
}

pub fn validate_title(title: &str) -> Result<(), TodoValidationError> {
    if title.trim().is_empty() {
        return Err(TodoValidationError::EmptyTitle);
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(TodoValidationError::TitleTooLong(MAX_TITLE_LENGTH));
    }

    Ok(())
}

pub fn validate_description(description: Option<&str>) -> Result<(), TodoValidationError> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LENGTH => Err(
            TodoValidationError::DescriptionTooLong(MAX_DESCRIPTION_LENGTH),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title() {
        assert!(validate_title("Buy milk").is_ok());
        assert!(validate_title(&"t".repeat(100)).is_ok());
        assert_eq!(validate_title("   "), Err(TodoValidationError::EmptyTitle));
        assert_eq!(
            validate_title(&"t".repeat(101)),
            Err(TodoValidationError::TitleTooLong(100))
        );
    }

    #[test]
    fn test_description() {
        assert!(validate_description(None).is_ok());
        assert!(validate_description(Some("")).is_ok());
        assert_eq!(
            validate_description(Some(&"d".repeat(501))),
            Err(TodoValidationError::DescriptionTooLong(500))
        );
    }
}
