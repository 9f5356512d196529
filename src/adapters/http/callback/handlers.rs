//! HTTP handlers for the checkout callback endpoints.
//!
//! The handlers look the payment up, hand the request fields to the
//! checkout provider and translate its `CallbackResponse` into HTTP.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Form, Json, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::domain::foundation::DomainError;
use crate::domain::payment::Payment;
use crate::ports::{CallbackResponse, CheckoutProvider, PaymentRepository};

use super::dto::{CheckoutFormResponse, ErrorResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the callback endpoints.
#[derive(Clone)]
pub struct CallbackAppState {
    pub provider: Arc<dyn CheckoutProvider>,
    pub repository: Arc<dyn PaymentRepository>,
}

impl CallbackAppState {
    pub fn new(provider: Arc<dyn CheckoutProvider>, repository: Arc<dyn PaymentRepository>) -> Self {
        Self {
            provider,
            repository,
        }
    }

    async fn payment(&self, token: &str) -> Result<Payment, CallbackApiError> {
        self.repository
            .find_by_token(token)
            .await?
            .ok_or_else(|| CallbackApiError::PaymentNotFound(token.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET|POST /payments/process/:token/ - Browser return or gateway notification
///
/// POST bodies are form-encoded; GET requests carry the fields in the query
/// string.
pub async fn process_payment(
    State(state): State<CallbackAppState>,
    Path(token): Path<String>,
    Form(form): Form<BTreeMap<String, String>>,
) -> Result<CallbackResponse, CallbackApiError> {
    let payment = state.payment(&token).await?;
    Ok(state.provider.process_data(&payment, &form).await)
}

/// GET /payments/:token/form - Redirect form for the hosted payment page
pub async fn checkout_form(
    State(state): State<CallbackAppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, CallbackApiError> {
    let payment = state.payment(&token).await?;
    let fields = state.provider.hidden_fields(&payment);
    Ok(Json(CheckoutFormResponse::post(state.provider.action_url(), fields)))
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

impl IntoResponse for CallbackResponse {
    fn into_response(self) -> Response {
        match self {
            CallbackResponse::Text { status, body } => (
                status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                body,
            )
                .into_response(),
            CallbackResponse::Redirect { location } => {
                (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
            }
            CallbackResponse::Poll {
                location,
                retry_after,
            } => {
                let seconds = retry_after.as_secs().max(1);
                (
                    StatusCode::OK,
                    [
                        (header::REFRESH, format!("{}; url={}", seconds, location)),
                        (header::RETRY_AFTER, seconds.to_string()),
                        (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                    ],
                    "Payment is being processed",
                )
                    .into_response()
            }
        }
    }
}

/// Errors raised before the provider sees the request.
#[derive(Debug)]
pub enum CallbackApiError {
    PaymentNotFound(String),
    Storage(DomainError),
}

impl From<DomainError> for CallbackApiError {
    fn from(err: DomainError) -> Self {
        Self::Storage(err)
    }
}

impl IntoResponse for CallbackApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            CallbackApiError::PaymentNotFound(token) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("PAYMENT_NOT_FOUND", format!("Payment {} not found", token)),
            ),
            CallbackApiError::Storage(err) => {
                tracing::error!(error = %err, "Payment lookup failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new(err.code.to_string(), "Payment storage unavailable"),
                )
            }
        };
        (status, Json(error)).into_response()
    }
}
