//! Email verification domain

mod entity;
mod repository;

use once_cell::sync::Lazy;
use regex::Regex;

pub use entity::{NewVerification, VerificationId, VerificationRecord};
pub use repository::{AccountActivator, VerificationRepository};

/// Number of digits in a verification code
pub const CODE_LENGTH: usize = 6;

static CODE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6}$").unwrap());

/// Check that a submitted code has the right shape before touching storage
pub fn is_well_formed_code(code: &str) -> bool {
    CODE_PATTERN.is_match(code)
}
