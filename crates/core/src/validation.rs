//! Canonical input validation policy for user-facing payloads.
//!
//! Every endpoint that accepts user data deserializes one of the input types
//! below, calls its `normalized()` method, then [`validate_input`]. Failures
//! become [`CoreError::InvalidFields`] with one entry per violated rule.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::email::normalize_email;
use crate::error::{CoreError, FieldError};

/// Maximum password length accepted anywhere. Bounds the hashing cost of a
/// single request. Must agree with the `length` rule on
/// [`RegisterInput::password`].
pub const MAX_PASSWORD_LENGTH: u64 = 128;

/// International phone number, optional leading `+`, up to 15 digits.
pub const PHONE_PATTERN: &str = r"^\+?[1-9]\d{1,14}$";

/// Compiled [`PHONE_PATTERN`].
pub static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PHONE_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Registration payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be less than 255 characters")
    )]
    pub email: String,

    #[validate(
        length(
            min = 8,
            max = 128,
            message = "Password must be between 8 and 128 characters"
        ),
        custom(function = validate_password_complexity)
    )]
    pub password: String,

    #[validate(length(
        min = 2,
        max = 50,
        message = "First name must be between 2 and 50 characters"
    ))]
    pub first_name: String,

    #[validate(length(
        min = 2,
        max = 50,
        message = "Last name must be between 2 and 50 characters"
    ))]
    pub last_name: String,

    #[validate(regex(
        path = *PHONE_RE,
        message = "Phone number must be a valid international format"
    ))]
    pub phone: Option<String>,

    #[validate(length(max = 255, message = "Location must be less than 255 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 1000, message = "Bio must be less than 1000 characters"))]
    pub bio: Option<String>,
}

impl RegisterInput {
    /// Lower-case the email and trim every text field. The password is left
    /// untouched.
    pub fn normalized(self) -> Self {
        Self {
            email: normalize_email(&self.email),
            password: self.password,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: trim_optional(self.phone),
            location: trim_optional(self.location),
            bio: trim_optional(self.bio),
        }
    }
}

/// Login payload. The password policy is not enforced here so a login
/// attempt reveals nothing about it.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl LoginInput {
    pub fn normalized(self) -> Self {
        Self {
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

/// Profile update payload. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(
        min = 2,
        max = 50,
        message = "First name must be between 2 and 50 characters"
    ))]
    pub first_name: Option<String>,

    #[validate(length(
        min = 2,
        max = 50,
        message = "Last name must be between 2 and 50 characters"
    ))]
    pub last_name: Option<String>,

    #[validate(regex(
        path = *PHONE_RE,
        message = "Phone number must be a valid international format"
    ))]
    pub phone: Option<String>,

    #[validate(length(max = 255, message = "Location must be less than 255 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 1000, message = "Bio must be less than 1000 characters"))]
    pub bio: Option<String>,
}

impl UpdateProfileInput {
    pub fn normalized(self) -> Self {
        Self {
            first_name: trim_optional(self.first_name),
            last_name: trim_optional(self.last_name),
            phone: trim_optional(self.phone),
            location: trim_optional(self.location),
            bio: trim_optional(self.bio),
        }
    }

    /// `true` when no field is present.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.location.is_none()
            && self.bio.is_none()
    }
}

// ---------------------------------------------------------------------------
// Custom checks
// ---------------------------------------------------------------------------

/// Require at least one lowercase letter, one uppercase letter, one digit
/// and one non-alphanumeric character.
pub fn validate_password_complexity(password: &str) -> Result<(), ValidationError> {
    let rules: [(fn(char) -> bool, &'static str); 4] = [
        (
            char::is_lowercase,
            "Password must contain at least one lowercase letter",
        ),
        (
            char::is_uppercase,
            "Password must contain at least one uppercase letter",
        ),
        (
            |c: char| c.is_ascii_digit(),
            "Password must contain at least one number",
        ),
        (
            |c: char| !c.is_alphanumeric(),
            "Password must contain at least one special character",
        ),
    ];

    for (predicate, message) in rules {
        if !password.chars().any(predicate) {
            return Err(ValidationError::new("password_complexity")
                .with_message(Cow::Borrowed(message)));
        }
    }
    Ok(())
}

/// Trim an optional string, collapsing whitespace-only values to `None`.
pub fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run the derived validation rules of `input`.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|errors| CoreError::InvalidFields(collect_field_errors(&errors)))
}

/// Flatten [`ValidationErrors`] into a stable, sorted list of field errors.
pub fn collect_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", e.code)),
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    out
}
