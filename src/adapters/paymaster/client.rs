//! PayMaster partner REST client.
//!
//! Every call is a GET to `<base>/<operation>` carrying `login`, a fresh
//! `nonce`, a `hash` and the operation's own parameters. The hash covers
//! `login;password;nonce` followed by the operation fields in their
//! documented order, with absent fields as empty segments. The password is
//! never sent.
//!
//! # Configuration
//!
//! ```ignore
//! let config = PaymasterApiConfig::new("api-login", "api-password")
//!     .with_timeout(Duration::from_secs(10));
//! let client = PaymasterApiClient::new(config)?;
//! let payment = client.get_payment("40599192").await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiClientError;
use super::error_codes;
use super::filters::{DocumentFilter, OperationParams, PaymentFilter, RefundFilter};
use super::nonce::UuidNonceGenerator;
use super::types::{DocumentRecord, PaymentList, PaymentRecord, RefundList, RefundRecord};
use crate::config::PaymasterConfig;
use crate::domain::payment::RemotePaymentState;
use crate::domain::signature::{request_hash, HashMethod};
use crate::ports::{LookupError, NonceGenerator, RemotePaymentLookup};

/// Default partner API root.
pub const DEFAULT_API_BASE_URL: &str = "https://paymaster.ru/partners/rest/";

/// Reason sent with `CancelPayment` when the caller gives none.
pub const DEFAULT_CANCEL_REASON: &str = "invoice rejected";

const AUTH_FIELDS: [&str; 3] = ["login", "password", "nonce"];

/// Byte stream of a downloaded document.
pub type DocumentStream = BoxStream<'static, Result<Bytes, ApiClientError>>;

/// Partner API credentials and transport settings.
#[derive(Clone)]
pub struct PaymasterApiConfig {
    login: String,
    password: SecretString,
    base_url: String,
    timeout: Duration,
    hash_method: HashMethod,
}

impl PaymasterApiConfig {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: SecretString::new(password.into()),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            hash_method: HashMethod::Sha1,
        }
    }

    /// Builds the client settings from application configuration.
    ///
    /// Returns `None` when no API credentials are configured.
    pub fn from_settings(settings: &PaymasterConfig) -> Option<Self> {
        let login = settings.api_login.as_ref()?;
        let password = settings.api_password.as_ref()?;
        Some(
            Self::new(login.clone(), password.expose_secret().clone())
                .with_base_url(settings.api_base_url.clone())
                .with_timeout(settings.api_timeout())
                .with_hash_method(settings.api_hash_method),
        )
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_hash_method(mut self, method: HashMethod) -> Self {
        self.hash_method = method;
        self
    }

    pub fn login(&self) -> &str {
        &self.login
    }
}

impl std::fmt::Debug for PaymasterApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymasterApiConfig")
            .field("login", &self.login)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("hash_method", &self.hash_method)
            .finish_non_exhaustive()
    }
}

/// Client for the PayMaster partner REST API.
pub struct PaymasterApiClient {
    config: PaymasterApiConfig,
    http_client: reqwest::Client,
    nonces: Arc<dyn NonceGenerator>,
}

impl PaymasterApiClient {
    /// Create a client with UUIDv4 nonces.
    pub fn new(config: PaymasterApiConfig) -> Result<Self, ApiClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiClientError::Transport(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
            nonces: Arc::new(UuidNonceGenerator),
        })
    }

    /// Replace the nonce source.
    pub fn with_nonce_generator(mut self, nonces: Arc<dyn NonceGenerator>) -> Self {
        self.nonces = nonces;
        self
    }

    // ════════════════════════════════════════════════════════════════════════
    // Operations
    // ════════════════════════════════════════════════════════════════════════

    /// Payment by PayMaster id (`LMI_SYS_PAYMENT_ID`).
    pub async fn get_payment(&self, payment_id: &str) -> Result<PaymentRecord, ApiClientError> {
        let body = self
            .call("getPayment", vec![("paymentID", payment_id.to_string())])
            .await?;
        extract(body, &["Payment"])
    }

    /// Payment by merchant invoice number (`LMI_PAYMENT_NO`) within a site.
    pub async fn get_payment_by_invoice(
        &self,
        invoice_id: &str,
        merchant_id: &str,
    ) -> Result<PaymentRecord, ApiClientError> {
        let body = self
            .call(
                "getPaymentByInvoiceID",
                vec![
                    ("invoiceID", invoice_id.to_string()),
                    ("siteAlias", merchant_id.to_string()),
                ],
            )
            .await?;
        extract(body, &["Payment"])
    }

    pub async fn list_payments(&self, filter: &PaymentFilter) -> Result<PaymentList, ApiClientError> {
        let body = self.call("listPaymentsFilter", filter.params()).await?;
        extract(body, &["Response"])
    }

    /// Refund `amount` of a payment.
    ///
    /// Not idempotent: repeat a failed call only with the same
    /// `external_id` so the refund can be reconciled.
    pub async fn refund_payment(
        &self,
        payment_id: &str,
        amount: Decimal,
        external_id: Option<&str>,
    ) -> Result<RefundRecord, ApiClientError> {
        let body = self
            .call(
                "refundPayment",
                vec![
                    ("paymentID", payment_id.to_string()),
                    ("amount", amount.to_string()),
                    ("externalID", external_id.unwrap_or_default().to_string()),
                ],
            )
            .await?;
        extract(body, &["Refund"])
    }

    pub async fn list_refunds(&self, filter: &RefundFilter) -> Result<RefundList, ApiClientError> {
        let body = self.call("listRefunds", filter.params()).await?;
        extract(body, &["Response"])
    }

    /// Complete a held payment, optionally for a smaller amount.
    pub async fn confirm_payment(
        &self,
        payment_id: &str,
        amount: Option<Decimal>,
    ) -> Result<PaymentRecord, ApiClientError> {
        let body = self
            .call(
                "ConfirmPayment",
                vec![
                    ("paymentID", payment_id.to_string()),
                    ("amount", amount.map(|a| a.to_string()).unwrap_or_default()),
                ],
            )
            .await?;
        extract(body, &["Payment"])
    }

    /// Release a held payment.
    pub async fn cancel_payment(
        &self,
        payment_id: &str,
        error: Option<&str>,
    ) -> Result<PaymentRecord, ApiClientError> {
        let body = self
            .call(
                "CancelPayment",
                vec![
                    ("paymentID", payment_id.to_string()),
                    ("error", error.unwrap_or(DEFAULT_CANCEL_REASON).to_string()),
                ],
            )
            .await?;
        extract(body, &["Payment"])
    }

    pub async fn list_documents(
        &self,
        filter: &DocumentFilter,
    ) -> Result<Vec<DocumentRecord>, ApiClientError> {
        let body = self.call("listDocuments", filter.params()).await?;
        extract(body, &["Response", "Documents"])
    }

    /// Download a document's content as a byte stream.
    ///
    /// A JSON body is checked for a negative `ErrorCode` first, since that is
    /// how the API reports an unknown or forbidden document.
    pub async fn fetch_document(&self, document_id: &str) -> Result<DocumentStream, ApiClientError> {
        let response = self
            .send(
                "getDocumentContent",
                vec![("documentID", document_id.to_string())],
            )
            .await?;

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ApiClientError::Transport(e.to_string()))?;
            // A JSON document without a negative `ErrorCode` is content.
            let code = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|body| error_code(&body));
            if let Some(code) = code.filter(|c| *c < 0) {
                return Err(error_codes::lookup(code).into());
            }
            return Ok(stream::once(async move { Ok::<_, ApiClientError>(bytes) }).boxed());
        }

        Ok(response
            .bytes_stream()
            .map_err(|e| ApiClientError::Transport(e.to_string()))
            .boxed())
    }

    // ════════════════════════════════════════════════════════════════════════
    // Request plumbing
    // ════════════════════════════════════════════════════════════════════════

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Query parameters for one call: `login`, `nonce`, `hash` and every
    /// non-empty operation parameter.
    fn signed_query(&self, operation: OperationParams) -> OperationParams {
        let nonce = self.nonces.next_nonce();

        let mut hashed: OperationParams = vec![
            ("login", self.config.login.clone()),
            ("password", self.config.password.expose_secret().clone()),
            ("nonce", nonce.clone()),
        ];
        hashed.extend(operation.iter().cloned());

        let order: Vec<&str> = AUTH_FIELDS
            .iter()
            .copied()
            .chain(operation.iter().map(|(name, _)| *name))
            .collect();
        let hash = request_hash(&hashed, &order, self.config.hash_method);

        let mut query: OperationParams = vec![
            ("login", self.config.login.clone()),
            ("nonce", nonce),
            ("hash", hash),
        ];
        query.extend(operation.into_iter().filter(|(_, value)| !value.is_empty()));
        query
    }

    async fn send(
        &self,
        path: &str,
        operation: OperationParams,
    ) -> Result<reqwest::Response, ApiClientError> {
        let url = self.url(path);
        let query = self.signed_query(operation);

        tracing::debug!(operation = path, "PayMaster API request");

        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(operation = path, error = %e, "PayMaster API unreachable");
                ApiClientError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                operation = path,
                status = status.as_u16(),
                body = %body,
                "PayMaster API request failed"
            );
            return Err(ApiClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn call(&self, path: &str, operation: OperationParams) -> Result<Value, ApiClientError> {
        let response = self.send(path, operation).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiClientError::malformed(format!("{}: {}", path, e)))?;

        if let Err(err) = check_error_code(&body) {
            tracing::warn!(operation = path, error = %err, "PayMaster API returned an error code");
            return Err(err);
        }
        Ok(body)
    }
}

fn error_code(body: &Value) -> Option<i64> {
    match body.get("ErrorCode") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn check_error_code(body: &Value) -> Result<(), ApiClientError> {
    let code = error_code(body)
        .ok_or_else(|| ApiClientError::malformed("missing or non-numeric 'ErrorCode'"))?;

    if code < 0 {
        return Err(error_codes::lookup(code).into());
    }
    Ok(())
}

/// Takes the value at `path` out of the response body.
fn extract<T: DeserializeOwned>(body: Value, path: &[&str]) -> Result<T, ApiClientError> {
    let mut current = body;
    for key in path {
        current = match current {
            Value::Object(mut map) => map
                .remove(*key)
                .ok_or_else(|| ApiClientError::malformed(format!("missing '{}'", key)))?,
            _ => return Err(ApiClientError::malformed(format!("expected object at '{}'", key))),
        };
    }
    serde_json::from_value(current).map_err(|e| ApiClientError::malformed(e.to_string()))
}

#[async_trait]
impl RemotePaymentLookup for PaymasterApiClient {
    async fn payment_state(&self, transaction_id: &str) -> Result<RemotePaymentState, LookupError> {
        self.get_payment(transaction_id)
            .await
            .map(|payment| payment.state)
            .map_err(|e| {
                if e.is_retryable() {
                    LookupError::Unavailable(e.to_string())
                } else {
                    LookupError::Rejected(e.to_string())
                }
            })
    }
}
