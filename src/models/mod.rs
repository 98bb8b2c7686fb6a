//! Request payloads and validated domain types
//!
//! Each endpoint has a wire payload with every field optional, so that a
//! missing field surfaces as a validation error naming that field instead of
//! a deserialization failure. `validate()` turns a payload into the domain
//! type the email templates consume.

pub mod contact;
pub mod inquiry;
pub mod newsletter;

pub use contact::{ContactInquiry, ContactPayload, Subject};
pub use inquiry::{
    ContactDetails, Gender, MAX_ADULTS, MAX_CHILDREN, MIN_ADULTS, MIN_CHILDREN, Nationality,
    PackageInquiry, PackageInquiryPayload, PartySize, Traveler, TravelerPayload, TravelerRole,
};
pub use newsletter::{NewsletterPayload, NewsletterSignup};

use crate::{AppError, Result};

pub(crate) const MISSING_FIELDS: &str = "Missing required fields";

/// Trimmed, non-empty value of a required field
pub(crate) fn required(field: &str, value: Option<String>) -> Result<String> {
    optional(value).ok_or_else(|| AppError::validation(field, MISSING_FIELDS))
}

/// Trimmed value, with blank strings treated as absent
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn required_email(value: Option<String>, missing_message: &str) -> Result<String> {
    let email = optional(value).ok_or_else(|| AppError::validation("email", missing_message))?;
    if !email.contains('@') {
        return Err(AppError::validation("email", "Invalid email address"));
    }
    Ok(email)
}
