use serde::{Deserialize, Serialize};

use super::required_email;
use crate::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsletterPayload {
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsletterSignup {
    pub email: String,
}

impl NewsletterPayload {
    pub fn validate(self) -> Result<NewsletterSignup> {
        Ok(NewsletterSignup {
            email: required_email(self.email, "Email is required")?,
        })
    }
}
