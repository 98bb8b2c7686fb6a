//! Wafud Al Haram inquiry service
//!
//! Turns the website's contact, newsletter and package booking forms into
//! HTML notification emails for the agency's operator inbox.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod inquiry_form;
pub mod mailer;
pub mod models;
pub mod packages;
pub mod telemetry;
pub mod templates;
pub mod web;

// Re-export core types for public API
pub use api::{ApiResponse, AppState};
pub use client::InquiryClient;
pub use config::AppConfig;
pub use error::AppError;
pub use inquiry_form::{FormError, FormStep, InquiryForm, SubmissionState};
pub use mailer::{MailTransport, OutboundEmail, RetryingTransport, SmtpMailer};
pub use packages::{Package, PackageRef};
pub use templates::{RenderContext, RenderedEmail};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
