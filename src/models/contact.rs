//! General contact form

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::{MISSING_FIELDS, optional, required, required_email};
use crate::Result;

/// Subject codes offered by the contact form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Umrah,
    Hajj,
    Booking,
    General,
    Feedback,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::Umrah,
        Subject::Hajj,
        Subject::Booking,
        Subject::General,
        Subject::Feedback,
    ];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Subject::Umrah => "umrah",
            Subject::Hajj => "hajj",
            Subject::Booking => "booking",
            Subject::General => "general",
            Subject::Feedback => "feedback",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Subject::Umrah => "Umrah Package Inquiry",
            Subject::Hajj => "Hajj Package Inquiry",
            Subject::Booking => "Booking Assistance",
            Subject::General => "General Question",
            Subject::Feedback => "Feedback",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Display label for a submitted code, or the code itself if unknown
    #[must_use]
    pub fn label_for(code: &str) -> Cow<'_, str> {
        match Self::from_code(code) {
            Some(subject) => Cow::Borrowed(subject.label()),
            None => Cow::Borrowed(code),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// A validated contact form submission
#[derive(Debug, Clone, PartialEq)]
pub struct ContactInquiry {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Raw subject code; unknown codes are kept and shown verbatim
    pub subject: String,
    pub message: String,
}

impl ContactInquiry {
    #[must_use]
    pub fn subject_label(&self) -> Cow<'_, str> {
        Subject::label_for(&self.subject)
    }
}

impl ContactPayload {
    pub fn validate(self) -> Result<ContactInquiry> {
        Ok(ContactInquiry {
            name: required("name", self.name)?,
            email: required_email(self.email, MISSING_FIELDS)?,
            phone: optional(self.phone),
            subject: required("subject", self.subject)?,
            message: required("message", self.message)?,
        })
    }
}
