//! Query filters for the list operations.
//!
//! Each filter renders its operation fields in the exact order they are
//! signed. Unset fields render as empty strings so they still occupy their
//! slot in the canonical line.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

use super::error::ApiClientError;
use crate::domain::payment::RemotePaymentState;

/// Anything that has a calendar date. Period bounds are sent as `yyyy-MM-dd`.
pub trait CalendarDate {
    fn calendar_date(&self) -> NaiveDate;
}

impl CalendarDate for NaiveDate {
    fn calendar_date(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDate for NaiveDateTime {
    fn calendar_date(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> CalendarDate for DateTime<Tz> {
    fn calendar_date(&self) -> NaiveDate {
        self.date_naive()
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub(crate) type OperationParams = Vec<(&'static str, String)>;

/// Filter for `listPaymentsFilter`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    pub account_id: Option<String>,
    pub site_alias: Option<String>,
    pub period_from: Option<NaiveDate>,
    pub period_to: Option<NaiveDate>,
    pub invoice_id: Option<String>,
    pub state: Option<RemotePaymentState>,
}

impl PaymentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Restrict to one site (`LMI_MERCHANT_ID`).
    pub fn site(mut self, site_alias: impl Into<String>) -> Self {
        self.site_alias = Some(site_alias.into());
        self
    }

    pub fn since(mut self, date: impl CalendarDate) -> Self {
        self.period_from = Some(date.calendar_date());
        self
    }

    pub fn until(mut self, date: impl CalendarDate) -> Self {
        self.period_to = Some(date.calendar_date());
        self
    }

    pub fn invoice(mut self, invoice_id: impl Into<String>) -> Self {
        self.invoice_id = Some(invoice_id.into());
        self
    }

    pub fn state(mut self, state: RemotePaymentState) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the state from its wire name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for anything other than `INITIATED`,
    /// `PROCESSING`, `COMPLETE` or `CANCELLED`.
    pub fn with_state_name(self, state: &str) -> Result<Self, ApiClientError> {
        let state = state
            .parse::<RemotePaymentState>()
            .map_err(|e| ApiClientError::InvalidArgument {
                field: "state",
                reason: e.to_string(),
            })?;
        Ok(self.state(state))
    }

    pub(crate) fn params(&self) -> OperationParams {
        vec![
            ("accountID", self.account_id.clone().unwrap_or_default()),
            ("siteAlias", self.site_alias.clone().unwrap_or_default()),
            ("periodFrom", format_date(self.period_from)),
            ("periodTo", format_date(self.period_to)),
            ("invoiceID", self.invoice_id.clone().unwrap_or_default()),
            (
                "state",
                self.state.map(|s| s.as_str().to_string()).unwrap_or_default(),
            ),
        ]
    }
}

/// Filter for `listRefunds`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefundFilter {
    pub account_id: Option<String>,
    pub payment_id: Option<String>,
    pub period_from: Option<NaiveDate>,
    pub period_to: Option<NaiveDate>,
    pub external_id: Option<String>,
}

impl RefundFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn payment(mut self, payment_id: impl Into<String>) -> Self {
        self.payment_id = Some(payment_id.into());
        self
    }

    pub fn since(mut self, date: impl CalendarDate) -> Self {
        self.period_from = Some(date.calendar_date());
        self
    }

    /// Inclusive upper bound.
    pub fn until(mut self, date: impl CalendarDate) -> Self {
        self.period_to = Some(date.calendar_date());
        self
    }

    pub fn external(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub(crate) fn params(&self) -> OperationParams {
        vec![
            ("accountID", self.account_id.clone().unwrap_or_default()),
            ("paymentID", self.payment_id.clone().unwrap_or_default()),
            ("periodFrom", format_date(self.period_from)),
            ("periodTo", format_date(self.period_to)),
            ("externalID", self.external_id.clone().unwrap_or_default()),
        ]
    }
}

/// Filter for `listDocuments`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub account_id: Option<String>,
    pub period_from: Option<NaiveDate>,
    pub period_to: Option<NaiveDate>,
}

impl DocumentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn since(mut self, date: impl CalendarDate) -> Self {
        self.period_from = Some(date.calendar_date());
        self
    }

    pub fn until(mut self, date: impl CalendarDate) -> Self {
        self.period_to = Some(date.calendar_date());
        self
    }

    pub(crate) fn params(&self) -> OperationParams {
        vec![
            ("accountID", self.account_id.clone().unwrap_or_default()),
            ("periodFrom", format_date(self.period_from)),
            ("periodTo", format_date(self.period_to)),
        ]
    }
}
