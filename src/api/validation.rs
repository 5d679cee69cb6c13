//! Input validation for API requests.
//!
//! Validation functions return a human-readable message on failure;
//! handlers wrap them into field-specific `ApiError`s.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Pragmatic email shape check: one @, no whitespace, a dot in the domain
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[^@\s]+@[^@\s]+\.[^@\s]+$"
    ).unwrap();
}

/// Validate a display name (signup)
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }

    if name.len() > 100 {
        return Err("Name is too long (max 100 characters)".to_string());
    }

    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a signup password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }

    Ok(())
}

/// Validate a workout title
pub fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title is required".to_string());
    }

    if title.len() > 200 {
        return Err("Title is too long (max 200 characters)".to_string());
    }

    Ok(())
}

/// Validate a workout duration in minutes (optional field)
pub fn validate_duration(duration: &Option<f64>) -> Result<(), String> {
    if let Some(d) = duration {
        if !d.is_finite() || *d < 0.0 {
            return Err("Duration must be a non-negative number".to_string());
        }
    }

    Ok(())
}

/// Validate an exercise name
pub fn validate_exercise_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Exercise name is required".to_string());
    }

    if name.len() > 200 {
        return Err("Exercise name is too long (max 200 characters)".to_string());
    }

    Ok(())
}

/// Validate a sets or reps count
pub fn validate_count(value: i64, field: &str) -> Result<(), String> {
    if value < 1 {
        return Err(format!("{} must be at least 1", field));
    }

    Ok(())
}

/// Validate an exercise weight (optional field)
pub fn validate_weight(weight: &Option<f64>) -> Result<(), String> {
    if let Some(w) = weight {
        if !w.is_finite() || *w < 0.0 {
            return Err("Weight must be a non-negative number".to_string());
        }
    }

    Ok(())
}
