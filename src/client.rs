//! HTTP client for the site's form endpoints
//!
//! Drives [`InquiryForm`] through submission: the form is locked before the
//! request goes out, cleared on a confirmed success, and left intact on any
//! failure so the visitor can retry. Nothing is retried automatically.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    AppError, Result,
    api::ApiResponse,
    inquiry_form::InquiryForm,
    models::{ContactPayload, NewsletterPayload},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Deserialize)]
struct ErrorReply {
    error: Option<String>,
    field: Option<String>,
}

pub struct InquiryClient {
    http: reqwest::Client,
    base_url: String,
}

impl InquiryClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Submits a form sitting on its traveler step
    pub async fn submit_inquiry(&self, form: &mut InquiryForm) -> Result<ApiResponse> {
        let payload = form
            .begin_submission()
            .map_err(|e| AppError::validation("form", e.to_string()))?;

        match self.post("/api/package-inquiry", &payload, "Failed to send inquiry").await {
            Ok(reply) => {
                form.submission_succeeded(Utc::now());
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!("Inquiry submission failed: {e}");
                form.submission_failed(e.user_message());
                Err(e)
            }
        }
    }

    pub async fn send_contact(&self, payload: &ContactPayload) -> Result<ApiResponse> {
        self.post("/api/contact", payload, "Failed to send email").await
    }

    pub async fn subscribe(&self, email: &str) -> Result<ApiResponse> {
        let payload = NewsletterPayload {
            email: Some(email.to_string()),
        };
        self.post("/api/newsletter", &payload, "Failed to subscribe").await
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        fallback_error: &str,
    ) -> Result<ApiResponse> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<ApiResponse>()
                .await
                .map_err(|e| AppError::network(e.to_string()));
        }

        let reply = response.json::<ErrorReply>().await.unwrap_or_default();
        let message = reply.error.unwrap_or_else(|| fallback_error.to_string());
        if status.is_client_error() {
            Err(AppError::validation(
                reply.field.unwrap_or_else(|| "form".to_string()),
                message,
            ))
        } else {
            Err(AppError::delivery(message))
        }
    }
}
