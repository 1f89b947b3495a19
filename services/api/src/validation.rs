//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ApiError;

fn six_digits() -> &'static Regex {
    static SIX_DIGITS: OnceLock<Regex> = OnceLock::new();
    SIX_DIGITS.get_or_init(|| Regex::new(r"^\d{6}$").expect("Failed to compile digits regex"))
}

/// Validate a student roll number
pub fn validate_roll_no(roll_no: &str) -> Result<(), ApiError> {
    let roll_no = roll_no.trim();
    if roll_no.is_empty() {
        return Err(ApiError::BadRequest("Roll number is required".to_string()));
    }

    if !six_digits().is_match(roll_no) {
        return Err(ApiError::BadRequest(
            "Roll number must be exactly 6 digits".to_string(),
        ));
    }

    Ok(())
}

/// Validate a session code
pub fn validate_session_code(code: &str) -> Result<(), ApiError> {
    if !six_digits().is_match(code.trim()) {
        return Err(ApiError::BadRequest(
            "Session code must be exactly 6 digits".to_string(),
        ));
    }

    Ok(())
}

/// Validate a device fingerprint
pub fn validate_device_fingerprint(fingerprint: &str) -> Result<(), ApiError> {
    if fingerprint.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Device fingerprint is required".to_string(),
        ));
    }

    if fingerprint.len() > 512 {
        return Err(ApiError::BadRequest(
            "Device fingerprint must be at most 512 characters long".to_string(),
        ));
    }

    Ok(())
}
