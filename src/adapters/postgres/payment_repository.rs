//! PostgreSQL implementation of PaymentRepository.
//!
//! `compare_and_set` is a single conditional `UPDATE`, so two notifications
//! racing for the same token cannot both settle it.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, StateMachine};
use crate::domain::payment::{Payment, PaymentChange, PaymentStatus};
use crate::ports::PaymentRepository;

/// PostgreSQL implementation of the PaymentRepository port.
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    token: String,
    status: String,
    total: Decimal,
    currency: String,
    description: Option<String>,
    billing_email: Option<String>,
    billing_phone: Option<String>,
    captured_amount: Option<Decimal>,
    transaction_id: Option<String>,
    extra_data: Option<String>,
    success_url: String,
    failure_url: String,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<PaymentStatus>().map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid status value: {}", e),
            )
        })?;

        Ok(Payment {
            token: row.token,
            status,
            total: row.total,
            currency: row.currency,
            description: row.description,
            billing_email: row.billing_email,
            billing_phone: row.billing_phone,
            captured_amount: row.captured_amount,
            transaction_id: row.transaction_id,
            extra_data: row.extra_data,
            success_url: row.success_url,
            failure_url: row.failure_url,
        })
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn save(&self, payment: &Payment) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                token, status, total, currency, description, billing_email, billing_phone,
                captured_amount, transaction_id, extra_data, success_url, failure_url
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&payment.token)
        .bind(payment.status.as_str())
        .bind(payment.total)
        .bind(&payment.currency)
        .bind(&payment.description)
        .bind(&payment.billing_email)
        .bind(&payment.billing_phone)
        .bind(payment.captured_amount)
        .bind(&payment.transaction_id)
        .bind(&payment.extra_data)
        .bind(&payment.success_url)
        .bind(&payment.failure_url)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("payments_pkey") {
                    return DomainError::new(
                        ErrorCode::PaymentExists,
                        format!("Payment {} already exists", payment.token),
                    );
                }
            }
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to save payment: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(
            r#"
            SELECT token, status, total, currency, description, billing_email, billing_phone,
                   captured_amount, transaction_id, extra_data, success_url, failure_url
            FROM payments
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find payment: {}", e))
        })?;

        row.map(Payment::try_from).transpose()
    }

    async fn compare_and_set(
        &self,
        token: &str,
        expected: PaymentStatus,
        change: &PaymentChange,
    ) -> Result<bool, DomainError> {
        if !expected.can_transition_to(&change.status) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot move payment from {} to {}", expected, change.status),
            )
            .with_detail("token", token));
        }

        let capture = change.capture.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = $3,
                captured_amount = COALESCE($4, captured_amount),
                transaction_id = COALESCE($5, transaction_id),
                extra_data = COALESCE($6, extra_data),
                updated_at = NOW()
            WHERE token = $1 AND status = $2
            "#,
        )
        .bind(token)
        .bind(expected.as_str())
        .bind(change.status.as_str())
        .bind(capture.map(|c| c.captured_amount))
        .bind(capture.map(|c| c.transaction_id.as_str()))
        .bind(capture.map(|c| c.extra_data.as_str()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to update payment: {}", e))
        })?;

        Ok(result.rows_affected() == 1)
    }
}
