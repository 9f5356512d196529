//! Axum router configuration for the callback endpoints.

use axum::{routing::get, Router};

use super::handlers::{checkout_form, health, process_payment, CallbackAppState};

/// Create the callback router.
///
/// # Routes
/// - `GET|POST /payments/process/:token/` - PayMaster return and notification URL
/// - `GET /payments/:token/form` - redirect form fields for a payment
/// - `GET /health` - liveness probe
///
/// # Example
///
/// ```ignore
/// let state = CallbackAppState::new(provider, repository);
/// let app = callback_router().with_state(state);
/// ```
pub fn callback_router() -> Router<CallbackAppState> {
    Router::new()
        .route(
            "/payments/process/:token/",
            get(process_payment).post(process_payment),
        )
        .route("/payments/:token/form", get(checkout_form))
        .route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::http::callback::CheckoutFormResponse;
    use crate::adapters::memory::InMemoryPaymentRepository;
    use crate::adapters::paymaster::{PaymasterProvider, PaymasterProviderConfig};
    use crate::domain::payment::{Payment, PaymentStatus};
    use crate::domain::signature::{notification_hash, HashMethod, DEFAULT_NOTIFICATION_FIELDS};
    use crate::ports::PaymentRepository;

    const SECRET: &str = "router-secret";

    async fn app_with(status: PaymentStatus) -> (Router, Arc<InMemoryPaymentRepository>) {
        let repo = Arc::new(InMemoryPaymentRepository::new());
        let payment = Payment::new(
            "tok-1",
            "99.00".parse().unwrap(),
            "RUB",
            "https://shop.example/ok",
            "https://shop.example/fail",
        )
        .unwrap()
        .with_status(status);
        repo.save(&payment).await.unwrap();

        let provider = PaymasterProvider::new(
            PaymasterProviderConfig::new("merchant-1", SECRET)
                .with_return_base_url("https://shop.example"),
            repo.clone(),
        );
        let state = CallbackAppState::new(Arc::new(provider), repo.clone());
        (callback_router().with_state(state), repo)
    }

    fn signed_body() -> String {
        let mut fields: BTreeMap<String, String> = [
            ("LMI_MERCHANT_ID", "merchant-1"),
            ("LMI_PAYMENT_NO", "tok-1"),
            ("LMI_SYS_PAYMENT_ID", "555"),
            ("LMI_PAYMENT_AMOUNT", "99.00"),
            ("LMI_CURRENCY", "RUB"),
            ("LMI_PAID_AMOUNT", "99.00"),
            ("LMI_PAID_CURRENCY", "RUB"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let hash = notification_hash(&fields, DEFAULT_NOTIFICATION_FIELDS, SECRET, HashMethod::Sha256);
        fields.insert("LMI_HASH".to_string(), hash);
        fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    // Base64 signatures are the only values with reserved characters.
    fn percent_encode(value: &str) -> String {
        value
            .replace('+', "%2B")
            .replace('/', "%2F")
            .replace('=', "%3D")
    }

    fn form_post(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let (app, _) = app_with(PaymentStatus::Input).await;
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn notification_post_confirms_payment() {
        let (app, repo) = app_with(PaymentStatus::Waiting).await;

        let response = app
            .oneshot(form_post("/payments/process/tok-1/", signed_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let stored = repo.find_by_token("tok-1").await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Confirmed);
        assert_eq!(stored.transaction_id.as_deref(), Some("555"));
    }

    #[tokio::test]
    async fn prerequest_answers_yes() {
        let (app, _) = app_with(PaymentStatus::Input).await;

        let response = app
            .oneshot(form_post("/payments/process/tok-1/", "LMI_PREREQUEST=1".to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"YES");
    }

    #[tokio::test]
    async fn browser_return_redirects_when_confirmed() {
        let (app, _) = app_with(PaymentStatus::Confirmed).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/payments/process/tok-1/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "https://shop.example/ok");
    }

    #[tokio::test]
    async fn unknown_token_is_404() {
        let (app, _) = app_with(PaymentStatus::Waiting).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/payments/process/nope/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn checkout_form_lists_hidden_fields() {
        let (app, _) = app_with(PaymentStatus::Input).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/payments/tok-1/form")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let form: CheckoutFormResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(form.action, "https://paymaster.ru/Payment/Init");
        assert_eq!(form.fields["LMI_PAYMENT_NO"], "tok-1");
        assert!(!form.fields.contains_key("LMI_HASH"));
    }
}
