//! PayMaster checkout provider.
//!
//! Builds the hidden form that sends a customer to the hosted payment page
//! and handles everything PayMaster sends back to the return URL: the
//! invoice confirmation pre-request, the signed payment notification and
//! the customer's own browser return.
//!
//! # Callback flow
//!
//! 1. `LMI_PREREQUEST` set: the invoice is confirmed, payment moves to
//!    `Waiting`, answer `YES`.
//! 2. `LMI_HASH` present but wrong: answer `HashError`, change nothing. A
//!    correctly signed notification must also name this payment's invoice,
//!    amount and currency.
//! 3. Valid notification for a waiting payment: capture amount and
//!    transaction id and settle it in one compare-and-set.
//! 4. Still waiting: tell the browser to come back shortly.
//! 5. Settled: redirect to the payment's success or failure URL.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use http::StatusCode;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};

use super::callback_error::CallbackError;
use crate::config::PaymasterConfig;
use crate::domain::payment::{CaptureDetails, Payment, PaymentChange, PaymentStatus};
use crate::domain::signature::{
    notification_hash, signatures_match, HashMethod, DEFAULT_NOTIFICATION_FIELDS,
};
use crate::ports::{CallbackResponse, CheckoutProvider, PaymentRepository, RemotePaymentLookup};

/// Hosted payment page.
pub const DEFAULT_ACTION_URL: &str = "https://paymaster.ru/Payment/Init";

/// Description used when the payment has none.
pub const DEFAULT_DESCRIPTION: &str = "Payment";

const EXPIRES_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const FORM_LIFETIME_HOURS: i64 = 24;

/// Merchant settings for the checkout flow.
#[derive(Clone)]
pub struct PaymasterProviderConfig {
    merchant_id: String,
    secret: SecretString,
    shop_id: Option<String>,
    sim_mode: Option<String>,
    payment_method: Option<String>,
    hash_fields: Vec<String>,
    hash_method: HashMethod,
    hash_fail_status: StatusCode,
    action_url: String,
    return_base_url: String,
    api_verify: bool,
    poll_delay: Duration,
}

impl PaymasterProviderConfig {
    pub fn new(merchant_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            secret: SecretString::new(secret.into()),
            shop_id: None,
            sim_mode: None,
            payment_method: None,
            hash_fields: DEFAULT_NOTIFICATION_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            hash_method: HashMethod::Sha256,
            hash_fail_status: StatusCode::BAD_REQUEST,
            action_url: DEFAULT_ACTION_URL.to_string(),
            return_base_url: String::new(),
            api_verify: false,
            poll_delay: Duration::from_secs(3),
        }
    }

    /// Builds the provider settings from application configuration.
    pub fn from_settings(settings: &PaymasterConfig) -> Self {
        let mut config = Self::new(
            settings.merchant_id.clone(),
            settings.secret.expose_secret().clone(),
        )
        .with_hash_fields(settings.hash_field_list())
        .with_hash_method(settings.hash_method)
        .with_hash_fail_status(
            StatusCode::from_u16(settings.hash_fail_http_code).unwrap_or(StatusCode::BAD_REQUEST),
        )
        .with_action_url(settings.action_url.clone())
        .with_return_base_url(settings.return_base_url.clone())
        .with_api_verify(settings.api_verify)
        .with_poll_delay(settings.poll_delay());

        config.shop_id = settings.shop_id.clone();
        config.sim_mode = settings.sim_mode.clone();
        config.payment_method = settings.payment_method.clone();
        config
    }

    pub fn with_shop_id(mut self, shop_id: impl Into<String>) -> Self {
        self.shop_id = Some(shop_id.into());
        self
    }

    /// Test-mode behaviour (`0`, `1` or `2`).
    pub fn with_sim_mode(mut self, sim_mode: impl Into<String>) -> Self {
        self.sim_mode = Some(sim_mode.into());
        self
    }

    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    /// Notification fields covered by `LMI_HASH`, in signing order.
    pub fn with_hash_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hash_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hash_method(mut self, method: HashMethod) -> Self {
        self.hash_method = method;
        self
    }

    /// Status returned with the `HashError` body.
    pub fn with_hash_fail_status(mut self, status: StatusCode) -> Self {
        self.hash_fail_status = status;
        self
    }

    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = url.into();
        self
    }

    /// Public origin of this service, used to build the return URL.
    pub fn with_return_base_url(mut self, url: impl Into<String>) -> Self {
        self.return_base_url = url.into();
        self
    }

    /// Confirm notifications against the REST API before settling.
    pub fn with_api_verify(mut self, enabled: bool) -> Self {
        self.api_verify = enabled;
        self
    }

    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub fn hash_fields(&self) -> &[String] {
        &self.hash_fields
    }
}

impl std::fmt::Debug for PaymasterProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymasterProviderConfig")
            .field("merchant_id", &self.merchant_id)
            .field("shop_id", &self.shop_id)
            .field("sim_mode", &self.sim_mode)
            .field("hash_method", &self.hash_method)
            .field("api_verify", &self.api_verify)
            .finish_non_exhaustive()
    }
}

/// Checkout provider for paymaster.ru.
pub struct PaymasterProvider {
    config: PaymasterProviderConfig,
    repository: Arc<dyn PaymentRepository>,
    remote: Option<Arc<dyn RemotePaymentLookup>>,
}

impl PaymasterProvider {
    pub fn new(config: PaymasterProviderConfig, repository: Arc<dyn PaymentRepository>) -> Self {
        Self {
            config,
            repository,
            remote: None,
        }
    }

    /// Lookup used when `api_verify` is on.
    pub fn with_remote_lookup(mut self, remote: Arc<dyn RemotePaymentLookup>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn config(&self) -> &PaymasterProviderConfig {
        &self.config
    }

    /// Where PayMaster sends the customer and its notifications.
    pub fn return_url(&self, token: &str) -> String {
        format!(
            "{}/payments/process/{}/",
            self.config.return_base_url.trim_end_matches('/'),
            token
        )
    }

    /// Hidden form fields as of `now`. `LMI_EXPIRES` is `now` plus one day.
    ///
    /// The form carries no `LMI_HASH`: the merchant secret only ever signs
    /// what PayMaster sends back.
    pub fn hidden_fields_at(&self, payment: &Payment, now: DateTime<Utc>) -> BTreeMap<String, String> {
        let return_url = self.return_url(&payment.token);
        let description = payment
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DESCRIPTION);
        let expires = now + chrono::Duration::hours(FORM_LIFETIME_HOURS);

        let candidates: [(&str, Option<String>); 17] = [
            ("LMI_MERCHANT_ID", Some(self.config.merchant_id.clone())),
            ("LMI_SHOP_ID", self.config.shop_id.clone()),
            ("LMI_CURRENCY", Some(payment.currency.clone())),
            ("LMI_SIM_MODE", self.config.sim_mode.clone()),
            ("LMI_PAYMENT_AMOUNT", Some(payment.total.to_string())),
            ("LMI_PAYMENT_NO", Some(payment.token.clone())),
            ("LMI_PAYMENT_DESC", Some(description.to_string())),
            ("LMI_PAYMENT_DESC_BASE64", Some(STANDARD.encode(description))),
            ("LMI_PAYER_PHONE_NUMBER", payment.billing_phone.clone()),
            ("LMI_PAYER_EMAIL", payment.billing_email.clone()),
            ("LMI_EXPIRES", Some(expires.format(EXPIRES_FORMAT).to_string())),
            ("LMI_PAYMENT_METHOD", self.config.payment_method.clone()),
            ("LMI_SUCCESS_URL", Some(return_url.clone())),
            ("LMI_FAILURE_URL", Some(return_url.clone())),
            ("LMI_INVOICE_CONFIRMATION_URL", Some(return_url.clone())),
            ("LMI_PAYMENT_NOTIFICATION_URL", Some(return_url)),
            ("PAYMENT_TOKEN", Some(payment.token.clone())),
        ];

        candidates
            .into_iter()
            .filter_map(|(name, value)| {
                value
                    .filter(|v| !v.is_empty())
                    .map(|v| (name.to_string(), v))
            })
            .collect()
    }

    fn sign(&self, fields: &BTreeMap<String, String>) -> String {
        notification_hash(
            fields,
            self.config.hash_fields.as_slice(),
            self.config.secret.expose_secret(),
            self.config.hash_method,
        )
    }

    fn verify_hash(&self, form: &BTreeMap<String, String>, received: &str) -> bool {
        signatures_match(&self.sign(form), received)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Callback steps
    // ════════════════════════════════════════════════════════════════════════

    async fn handle(
        &self,
        payment: &Payment,
        form: &BTreeMap<String, String>,
    ) -> Result<CallbackResponse, CallbackError> {
        if form.get("LMI_PREREQUEST").is_some_and(|v| is_truthy(v)) {
            return self.confirm_invoice(payment).await;
        }

        let mut status = payment.status;

        if let Some(received) = form.get("LMI_HASH") {
            if !self.verify_hash(form, received) {
                let invoice = form.get("LMI_PAYMENT_NO").map(String::as_str).unwrap_or("");
                tracing::debug!(
                    token = %payment.token,
                    hash_fields = ?self.config.hash_fields,
                    "Notification signature mismatch"
                );
                tracing::error!(invoice = %invoice, "Invoice payment failed by reason: HashError");
                return Ok(CallbackResponse::text(
                    self.config.hash_fail_status,
                    "HashError",
                ));
            }

            check_invoice(payment, form)?;

            if status == PaymentStatus::Waiting {
                return self.settle(payment, form).await;
            }
        }

        // A browser return may arrive after the notification settled the
        // payment, so the stored status wins over the caller's copy.
        if status == PaymentStatus::Waiting {
            if let Some(current) = self.repository.find_by_token(&payment.token).await? {
                status = current.status;
            }
        }

        Ok(match status {
            PaymentStatus::Waiting => CallbackResponse::Poll {
                location: self.return_url(&payment.token),
                retry_after: self.config.poll_delay,
            },
            PaymentStatus::Confirmed => CallbackResponse::redirect(payment.success_url.clone()),
            PaymentStatus::Input | PaymentStatus::Rejected => {
                CallbackResponse::redirect(payment.failure_url.clone())
            }
        })
    }

    async fn confirm_invoice(&self, payment: &Payment) -> Result<CallbackResponse, CallbackError> {
        match payment.status {
            PaymentStatus::Input | PaymentStatus::Waiting => {
                let applied = self
                    .repository
                    .compare_and_set(
                        &payment.token,
                        payment.status,
                        &PaymentChange::status(PaymentStatus::Waiting),
                    )
                    .await?;
                tracing::info!(token = %payment.token, applied, "Invoice confirmed");
            }
            PaymentStatus::Confirmed | PaymentStatus::Rejected => {
                tracing::warn!(
                    token = %payment.token,
                    status = %payment.status,
                    "Invoice confirmation for a settled payment ignored"
                );
            }
        }
        Ok(CallbackResponse::text(StatusCode::OK, "YES"))
    }

    async fn settle(
        &self,
        payment: &Payment,
        form: &BTreeMap<String, String>,
    ) -> Result<CallbackResponse, CallbackError> {
        let capture = capture_from(form)?;
        let status = self.decide_status(&capture.transaction_id).await?;
        let transaction_id = capture.transaction_id.clone();

        let applied = self
            .repository
            .compare_and_set(
                &payment.token,
                PaymentStatus::Waiting,
                &PaymentChange::captured(status, capture),
            )
            .await?;

        if applied {
            tracing::info!(
                token = %payment.token,
                transaction_id = %transaction_id,
                status = %status,
                "Payment notification applied"
            );
        } else {
            tracing::info!(
                token = %payment.token,
                transaction_id = %transaction_id,
                "Payment already settled by another notification"
            );
        }
        Ok(CallbackResponse::acknowledged())
    }

    /// Status a verified notification settles to. Without strict checking
    /// that is always `Confirmed`; with it, PayMaster's own record decides
    /// and a payment still in flight stays `Waiting`.
    async fn decide_status(&self, transaction_id: &str) -> Result<PaymentStatus, CallbackError> {
        if !self.config.api_verify {
            return Ok(PaymentStatus::Confirmed);
        }

        let remote = self.remote.as_ref().ok_or_else(|| {
            crate::ports::LookupError::Unavailable("no payment lookup configured".to_string())
        })?;
        let state = remote.payment_state(transaction_id).await?;

        tracing::debug!(transaction_id = %transaction_id, state = %state, "Remote payment state");
        Ok(state.local_status().unwrap_or(PaymentStatus::Waiting))
    }
}

fn capture_from(form: &BTreeMap<String, String>) -> Result<CaptureDetails, CallbackError> {
    let paid = required(form, "LMI_PAID_AMOUNT")?;
    let captured_amount = paid
        .trim()
        .parse::<Decimal>()
        .map_err(|e| CallbackError::InvalidField {
            field: "LMI_PAID_AMOUNT",
            reason: e.to_string(),
        })?;
    let transaction_id = required(form, "LMI_SYS_PAYMENT_ID")?.to_string();
    let extra_data = serde_json::to_string_pretty(form).map_err(|e| CallbackError::InvalidField {
        field: "form",
        reason: e.to_string(),
    })?;

    Ok(CaptureDetails {
        captured_amount,
        transaction_id,
        extra_data,
    })
}

/// Signed invoice fields must describe `payment`, otherwise a genuine
/// notification for one invoice could settle another.
fn check_invoice(payment: &Payment, form: &BTreeMap<String, String>) -> Result<(), CallbackError> {
    if required(form, "LMI_PAYMENT_NO")?.trim() != payment.token {
        return Err(CallbackError::InvoiceMismatch {
            field: "LMI_PAYMENT_NO",
        });
    }

    let amount = required(form, "LMI_PAYMENT_AMOUNT")?
        .trim()
        .parse::<Decimal>()
        .map_err(|e| CallbackError::InvalidField {
            field: "LMI_PAYMENT_AMOUNT",
            reason: e.to_string(),
        })?;
    if amount != payment.total {
        return Err(CallbackError::InvoiceMismatch {
            field: "LMI_PAYMENT_AMOUNT",
        });
    }

    if !required(form, "LMI_CURRENCY")?
        .trim()
        .eq_ignore_ascii_case(&payment.currency)
    {
        return Err(CallbackError::InvoiceMismatch {
            field: "LMI_CURRENCY",
        });
    }
    Ok(())
}

fn required<'a>(
    form: &'a BTreeMap<String, String>,
    field: &'static str,
) -> Result<&'a str, CallbackError> {
    form.get(field)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or(CallbackError::MissingField(field))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[async_trait]
impl CheckoutProvider for PaymasterProvider {
    fn action_url(&self) -> &str {
        &self.config.action_url
    }

    fn hidden_fields(&self, payment: &Payment) -> BTreeMap<String, String> {
        self.hidden_fields_at(payment, Utc::now())
    }

    async fn process_data(
        &self,
        payment: &Payment,
        form: &BTreeMap<String, String>,
    ) -> CallbackResponse {
        match self.handle(payment, form).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    token = %payment.token,
                    error = %err,
                    retryable = err.is_retryable(),
                    "Payment callback failed"
                );
                err.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPaymentRepository;
    use crate::domain::payment::RemotePaymentState;
    use crate::ports::LookupError;
    use chrono::TimeZone;

    const SECRET: &str = "YOUR_MOMMY_SECRET";

    struct StubLookup(Result<RemotePaymentState, LookupError>);

    #[async_trait]
    impl RemotePaymentLookup for StubLookup {
        async fn payment_state(&self, _: &str) -> Result<RemotePaymentState, LookupError> {
            self.0.clone()
        }
    }

    fn config() -> PaymasterProviderConfig {
        PaymasterProviderConfig::new("merchant-1", SECRET)
            .with_return_base_url("https://shop.example/")
    }

    fn payment(status: PaymentStatus) -> Payment {
        Payment::new(
            "tok-1",
            "10.50".parse().unwrap(),
            "RUB",
            "https://shop.example/ok",
            "https://shop.example/fail",
        )
        .unwrap()
        .with_status(status)
    }

    async fn provider_with(status: PaymentStatus) -> (PaymasterProvider, Arc<InMemoryPaymentRepository>) {
        let repo = Arc::new(InMemoryPaymentRepository::new());
        repo.save(&payment(status)).await.unwrap();
        (PaymasterProvider::new(config(), repo.clone()), repo)
    }

    fn notification(provider: &PaymasterProvider) -> BTreeMap<String, String> {
        notification_with(provider, &[])
    }

    fn notification_with(
        provider: &PaymasterProvider,
        overrides: &[(&str, &str)],
    ) -> BTreeMap<String, String> {
        let mut form: BTreeMap<String, String> = [
            ("LMI_MERCHANT_ID", "merchant-1"),
            ("LMI_PAYMENT_NO", "tok-1"),
            ("LMI_SYS_PAYMENT_ID", "40599192"),
            ("LMI_SYS_PAYMENT_DATE", "2015-12-17T10:00:00"),
            ("LMI_PAYMENT_AMOUNT", "10.50"),
            ("LMI_CURRENCY", "RUB"),
            ("LMI_PAID_AMOUNT", "10.50"),
            ("LMI_PAID_CURRENCY", "RUB"),
            ("LMI_PAYMENT_SYSTEM", "3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (name, value) in overrides {
            form.insert(name.to_string(), value.to_string());
        }
        let hash = provider.sign(&form);
        form.insert("LMI_HASH".to_string(), hash);
        form
    }

    // ══════════════════════════════════════════════════════════════
    // Outbound Form Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn hidden_fields_cover_order_and_urls() {
        let (provider, _) = provider_with(PaymentStatus::Input).await;
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let fields = provider.hidden_fields_at(&payment(PaymentStatus::Input), now);

        assert_eq!(fields["LMI_MERCHANT_ID"], "merchant-1");
        assert_eq!(fields["LMI_PAYMENT_AMOUNT"], "10.50");
        assert_eq!(fields["LMI_PAYMENT_NO"], "tok-1");
        assert_eq!(fields["LMI_PAYMENT_DESC"], "Payment");
        assert_eq!(fields["LMI_PAYMENT_DESC_BASE64"], "UGF5bWVudA==");
        assert_eq!(fields["LMI_EXPIRES"], "2024-03-02T12:00:00");
        assert_eq!(
            fields["LMI_PAYMENT_NOTIFICATION_URL"],
            "https://shop.example/payments/process/tok-1/"
        );
        assert_eq!(fields["PAYMENT_TOKEN"], "tok-1");
        assert!(!fields.contains_key("LMI_SHOP_ID"));
        assert!(!fields.contains_key("LMI_PAYER_EMAIL"));
        assert!(!fields.contains_key("LMI_HASH"));
    }

    #[tokio::test]
    async fn form_fields_never_settle_a_payment() {
        let repo = Arc::new(InMemoryPaymentRepository::new());
        repo.save(&payment(PaymentStatus::Waiting)).await.unwrap();
        let provider = PaymasterProvider::new(
            config().with_hash_fields([
                "LMI_MERCHANT_ID",
                "LMI_PAYMENT_NO",
                "LMI_PAYMENT_AMOUNT",
                "LMI_CURRENCY",
            ]),
            repo.clone(),
        );

        let mut form = provider.hidden_fields(&payment(PaymentStatus::Waiting));
        form.insert("LMI_PAID_AMOUNT".to_string(), "10.50".to_string());
        form.insert("LMI_SYS_PAYMENT_ID".to_string(), "fake".to_string());

        let response = provider
            .process_data(&payment(PaymentStatus::Waiting), &form)
            .await;

        assert!(matches!(response, CallbackResponse::Poll { .. }));
        let stored = repo.find_by_token("tok-1").await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Waiting);
        assert!(stored.transaction_id.is_none());
    }

    // ══════════════════════════════════════════════════════════════
    // Callback Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn truthy_values() {
        for value in ["1", "true", "YES", " on "] {
            assert!(is_truthy(value), "{value}");
        }
        for value in ["", "0", "false", "no"] {
            assert!(!is_truthy(value), "{value}");
        }
    }

    #[tokio::test]
    async fn prerequest_moves_to_waiting() {
        let (provider, repo) = provider_with(PaymentStatus::Input).await;
        let form = BTreeMap::from([("LMI_PREREQUEST".to_string(), "1".to_string())]);

        let response = provider
            .process_data(&payment(PaymentStatus::Input), &form)
            .await;

        assert_eq!(response, CallbackResponse::text(StatusCode::OK, "YES"));
        let stored = repo.find_by_token("tok-1").await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Waiting);
    }

    #[tokio::test]
    async fn bad_signature_changes_nothing() {
        let (provider, repo) = provider_with(PaymentStatus::Waiting).await;
        let mut form = notification(&provider);
        form.insert("LMI_PAID_AMOUNT".to_string(), "1.00".to_string());

        let response = provider
            .process_data(&payment(PaymentStatus::Waiting), &form)
            .await;

        assert_eq!(
            response,
            CallbackResponse::text(StatusCode::BAD_REQUEST, "HashError")
        );
        let stored = repo.find_by_token("tok-1").await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Waiting);
        assert!(stored.transaction_id.is_none());
    }

    #[tokio::test]
    async fn valid_notification_confirms_and_captures() {
        let (provider, repo) = provider_with(PaymentStatus::Waiting).await;
        let form = notification(&provider);

        let response = provider
            .process_data(&payment(PaymentStatus::Waiting), &form)
            .await;

        assert_eq!(response, CallbackResponse::acknowledged());
        let stored = repo.find_by_token("tok-1").await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Confirmed);
        assert_eq!(stored.captured_amount, Some("10.50".parse().unwrap()));
        assert_eq!(stored.transaction_id.as_deref(), Some("40599192"));
        assert!(stored.extra_data.unwrap().contains("\"LMI_SYS_PAYMENT_ID\""));
    }

    #[tokio::test]
    async fn notification_for_another_invoice_is_rejected() {
        let cases = [
            ("LMI_PAYMENT_NO", "tok-2"),
            ("LMI_PAYMENT_AMOUNT", "1.00"),
            ("LMI_CURRENCY", "USD"),
        ];
        for (field, value) in cases {
            let (provider, repo) = provider_with(PaymentStatus::Waiting).await;
            let form = notification_with(&provider, &[(field, value), ("LMI_PAID_AMOUNT", "1.00")]);

            let response = provider
                .process_data(&payment(PaymentStatus::Waiting), &form)
                .await;

            assert_eq!(
                response,
                CallbackResponse::text(StatusCode::BAD_REQUEST, "InvoiceMismatch"),
                "{field}"
            );
            let stored = repo.find_by_token("tok-1").await.unwrap().unwrap();
            assert_eq!(stored.status, PaymentStatus::Waiting, "{field}");
            assert!(stored.captured_amount.is_none(), "{field}");
        }
    }

    #[tokio::test]
    async fn equal_amount_in_other_notation_is_accepted() {
        let (provider, repo) = provider_with(PaymentStatus::Waiting).await;
        let form = notification_with(&provider, &[("LMI_PAYMENT_AMOUNT", "10.5"), ("LMI_CURRENCY", "rub")]);

        let response = provider
            .process_data(&payment(PaymentStatus::Waiting), &form)
            .await;

        assert_eq!(response, CallbackResponse::acknowledged());
        let stored = repo.find_by_token("tok-1").await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Confirmed);
    }

    #[tokio::test]
    async fn strict_mode_follows_remote_state() {
        let (_, repo) = provider_with(PaymentStatus::Waiting).await;
        let provider = PaymasterProvider::new(config().with_api_verify(true), repo.clone())
            .with_remote_lookup(Arc::new(StubLookup(Ok(RemotePaymentState::Cancelled))));
        let form = notification(&provider);

        provider
            .process_data(&payment(PaymentStatus::Waiting), &form)
            .await;

        let stored = repo.find_by_token("tok-1").await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Rejected);
    }

    #[tokio::test]
    async fn strict_mode_lookup_outage_asks_for_redelivery() {
        let (_, repo) = provider_with(PaymentStatus::Waiting).await;
        let provider = PaymasterProvider::new(config().with_api_verify(true), repo.clone())
            .with_remote_lookup(Arc::new(StubLookup(Err(LookupError::Unavailable(
                "timeout".into(),
            )))));
        let form = notification(&provider);

        let response = provider
            .process_data(&payment(PaymentStatus::Waiting), &form)
            .await;

        assert!(matches!(
            response,
            CallbackResponse::Text { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
        let stored = repo.find_by_token("tok-1").await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Waiting);
    }

    #[tokio::test]
    async fn missing_paid_amount_is_bad_request() {
        let (provider, _) = provider_with(PaymentStatus::Waiting).await;
        let mut form = notification(&provider);
        form.remove("LMI_PAID_AMOUNT");
        form.remove("LMI_HASH");
        let hash = provider.sign(&form);
        form.insert("LMI_HASH".to_string(), hash);

        let response = provider
            .process_data(&payment(PaymentStatus::Waiting), &form)
            .await;

        assert_eq!(
            response,
            CallbackResponse::text(StatusCode::BAD_REQUEST, "MissingField")
        );
    }

    #[tokio::test]
    async fn waiting_browser_return_polls() {
        let (provider, _) = provider_with(PaymentStatus::Waiting).await;

        let response = provider
            .process_data(&payment(PaymentStatus::Waiting), &BTreeMap::new())
            .await;

        assert_eq!(
            response,
            CallbackResponse::Poll {
                location: "https://shop.example/payments/process/tok-1/".to_string(),
                retry_after: Duration::from_secs(3),
            }
        );
    }

    #[tokio::test]
    async fn settled_payments_redirect() {
        let (provider, _) = provider_with(PaymentStatus::Confirmed).await;
        let response = provider
            .process_data(&payment(PaymentStatus::Confirmed), &BTreeMap::new())
            .await;
        assert_eq!(response, CallbackResponse::redirect("https://shop.example/ok"));

        let (provider, _) = provider_with(PaymentStatus::Rejected).await;
        let response = provider
            .process_data(&payment(PaymentStatus::Rejected), &BTreeMap::new())
            .await;
        assert_eq!(response, CallbackResponse::redirect("https://shop.example/fail"));
    }
}
