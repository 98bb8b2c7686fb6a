use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequest, Request, State, rejection::JsonRejection},
    routing::{get, post},
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    AppError, Result,
    mailer::{MailTransport, OutboundEmail},
    models::{ContactPayload, NewsletterPayload, PackageInquiryPayload},
    packages::{self, Package},
    templates::{self, RenderContext, RenderedEmail},
};

/// Shared, read-only handler state
#[derive(Clone)]
pub struct AppState {
    pub mailer: Arc<dyn MailTransport>,
    pub operator_address: String,
    pub brand: String,
    pub timezone: Tz,
}

impl AppState {
    fn render_context(&self) -> RenderContext {
        RenderContext::now_in(self.timezone, self.brand.clone())
    }

    /// Sends a rendered email to the operator; any transport failure becomes
    /// a delivery error carrying `failure_message`.
    async fn notify_operator(
        &self,
        rendered: RenderedEmail,
        reply_to: Option<String>,
        failure_message: &str,
    ) -> Result<()> {
        let email = OutboundEmail {
            to: self.operator_address.clone(),
            subject: rendered.subject,
            html: rendered.html,
            reply_to,
        };
        self.mailer.send(email).await.map_err(|e| {
            tracing::error!("Email delivery failed: {e}");
            AppError::delivery(failure_message)
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl ApiResponse {
    fn ok(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
        })
    }
}

/// `Json` extractor whose rejections use the crate's error body
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    tracing::debug!("Rejected request body: {rejection}");
    AppError::validation("body", "Missing required fields")
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/contact", post(contact))
        .route("/newsletter", post(newsletter))
        .route("/package-inquiry", post(package_inquiry))
        .route("/packages", get(list_packages))
        .route("/health", get(health))
        .with_state(state)
}

#[tracing::instrument(name = "contact", skip_all)]
async fn contact(
    State(state): State<AppState>,
    Payload(payload): Payload<ContactPayload>,
) -> Result<Json<ApiResponse>> {
    let inquiry = payload.validate()?;
    let rendered = templates::render_contact(&inquiry, &state.render_context())?;

    state
        .notify_operator(rendered, Some(inquiry.email.clone()), "Failed to send email")
        .await?;

    tracing::info!(subject = %inquiry.subject, "Contact inquiry forwarded");
    Ok(ApiResponse::ok("Email sent successfully"))
}

#[tracing::instrument(name = "newsletter", skip_all)]
async fn newsletter(
    State(state): State<AppState>,
    Payload(payload): Payload<NewsletterPayload>,
) -> Result<Json<ApiResponse>> {
    let signup = payload.validate()?;
    let rendered = templates::render_newsletter(&signup, &state.render_context())?;

    state
        .notify_operator(rendered, Some(signup.email.clone()), "Failed to subscribe")
        .await?;

    tracing::info!("Newsletter signup forwarded");
    Ok(ApiResponse::ok("Subscribed successfully"))
}

#[tracing::instrument(name = "package_inquiry", skip_all)]
async fn package_inquiry(
    State(state): State<AppState>,
    Payload(payload): Payload<PackageInquiryPayload>,
) -> Result<Json<ApiResponse>> {
    let inquiry = payload.validate()?;
    let rendered = templates::render_package_inquiry(&inquiry, &state.render_context())?;

    state
        .notify_operator(
            rendered,
            Some(inquiry.contact.email.clone()),
            "Failed to send inquiry",
        )
        .await?;

    tracing::info!(
        package = %inquiry.package.name,
        travelers = inquiry.party.total(),
        "Package inquiry forwarded"
    );
    Ok(ApiResponse::ok("Inquiry sent successfully"))
}

async fn list_packages() -> Json<&'static [Package]> {
    Json(&packages::CATALOG)
}

async fn health() -> Json<ApiResponse> {
    ApiResponse::ok("ok")
}
