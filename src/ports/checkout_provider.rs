//! Checkout provider port.
//!
//! A checkout provider knows how to send a customer to a hosted payment
//! page and how to interpret whatever the gateway posts back. The HTTP
//! adapter only translates `CallbackResponse` values into responses.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;

use crate::domain::payment::Payment;

/// Outcome of processing a callback request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResponse {
    /// Plain-text body with the given status. An empty body acknowledges a
    /// notification.
    Text { status: StatusCode, body: String },

    /// Send the browser elsewhere.
    Redirect { location: String },

    /// The payment is still pending; the client should come back to
    /// `location` after `retry_after`.
    Poll {
        location: String,
        retry_after: Duration,
    },
}

impl CallbackResponse {
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        CallbackResponse::Text {
            status,
            body: body.into(),
        }
    }

    /// Empty `200 OK`.
    pub fn acknowledged() -> Self {
        Self::text(StatusCode::OK, "")
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        CallbackResponse::Redirect {
            location: location.into(),
        }
    }
}

/// Port implemented by each payment gateway integration.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// URL the redirect form posts to.
    fn action_url(&self) -> &str;

    /// Hidden form fields for the redirect to the hosted payment page.
    fn hidden_fields(&self, payment: &Payment) -> BTreeMap<String, String>;

    /// Handle a browser return or a server-to-server notification for
    /// `payment`. `form` holds the request's decoded form or query fields.
    async fn process_data(
        &self,
        payment: &Payment,
        form: &BTreeMap<String, String>,
    ) -> CallbackResponse;
}
