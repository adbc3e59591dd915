//! Billing service.
//!
//! Glues the cost calculator to persisted file metadata and invoices:
//! - Live estimate for the current month
//! - Invoice generation for closed periods
//! - Read-only reconciliation of stored invoices

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::calculator::{CostCalculator, CostReport};
use super::invoice::{Invoice, InvoiceRepository, NewInvoice};
use super::period::{BillingWindow, UsagePeriod};
use super::{DEFAULT_INVOICE_DUE_DAYS, DEFAULT_INVOICE_HISTORY_LIMIT};
use crate::file::FileRepository;
use crate::{BaketsuError, Result};

/// Month-to-date cost estimate.
#[derive(Debug, Clone, Serialize)]
pub struct UsageEstimate {
    /// Period the estimate belongs to.
    pub period: String,
    /// End of the estimate window.
    pub as_of: DateTime<Utc>,
    /// Cost report for `[period start, as_of)`.
    pub report: CostReport,
}

/// Comparison between a stored invoice and a fresh recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Invoice ID.
    pub invoice_id: i64,
    /// Billed period.
    pub period: String,
    /// Amount on the invoice.
    pub invoiced_cents: i64,
    /// Amount computed from current file metadata.
    pub recomputed_cents: i64,
    /// `recomputed_cents - invoiced_cents`.
    pub drift_cents: i64,
    /// GB-days on the invoice.
    pub invoiced_gb_days: Decimal,
    /// GB-days computed from current file metadata (two decimals, truncated).
    pub recomputed_gb_days: Decimal,
    /// Whether both amounts agree.
    pub matches: bool,
}

/// High-level billing operations for one account.
pub struct BillingService<'a> {
    pool: &'a SqlitePool,
    calculator: &'a CostCalculator,
    invoice_due_days: i64,
    history_limit: i64,
}

impl<'a> BillingService<'a> {
    /// Create a new BillingService.
    pub fn new(pool: &'a SqlitePool, calculator: &'a CostCalculator) -> Self {
        Self {
            pool,
            calculator,
            invoice_due_days: DEFAULT_INVOICE_DUE_DAYS,
            history_limit: DEFAULT_INVOICE_HISTORY_LIMIT,
        }
    }

    /// Set the number of days until an invoice is due.
    pub fn with_invoice_due_days(mut self, days: i64) -> Self {
        self.invoice_due_days = days;
        self
    }

    /// Set the number of invoices returned by `list_invoices`.
    pub fn with_history_limit(mut self, limit: i64) -> Self {
        self.history_limit = limit;
        self
    }

    /// Estimate the cost of the current month up to `now`.
    pub async fn current_usage(&self, user_id: i64, now: DateTime<Utc>) -> Result<UsageEstimate> {
        let period = UsagePeriod::containing(now)?;

        let report = if now <= period.start() {
            let window = period.window();
            CostReport::empty(window, self.calculator.days_per_month(&window)?)
        } else {
            let window = BillingWindow::new(period.start(), now)?;
            let records = FileRepository::new(self.pool)
                .list_storage_records(user_id)
                .await?;
            self.calculator.calculate(&records, &window)?
        };

        debug!(
            user_id,
            period = %period,
            total_cents = report.total_cents,
            "Computed usage estimate"
        );

        Ok(UsageEstimate {
            period: period.to_string(),
            as_of: now,
            report,
        })
    }

    /// Generate the invoice for a closed period.
    ///
    /// Fails with `Validation` while the period is still open and with
    /// `Conflict` if the period was already invoiced.
    pub async fn generate_invoice(
        &self,
        user_id: i64,
        period: UsagePeriod,
        now: DateTime<Utc>,
    ) -> Result<Invoice> {
        if !period.is_closed(now) {
            return Err(BaketsuError::Validation(format!(
                "billing period {period} has not ended yet"
            )));
        }

        let invoices = InvoiceRepository::new(self.pool);
        if invoices.find_by_period(user_id, &period).await?.is_some() {
            warn!(user_id, period = %period, "Invoice already generated");
            return Err(BaketsuError::Conflict(format!(
                "invoice already exists for {period}"
            )));
        }

        let report = self.compute_period(user_id, &period).await?;
        let new_invoice = NewInvoice::from_report(
            user_id,
            period,
            &report,
            self.calculator,
            now,
            self.invoice_due_days,
        )?;
        let invoice = invoices.create(&new_invoice).await?;

        info!(
            user_id,
            invoice_id = invoice.id,
            period = %period,
            cost_cents = invoice.cost_cents,
            "Generated invoice"
        );

        Ok(invoice)
    }

    /// Recompute an invoiced period and compare it with the stored amount.
    ///
    /// The stored invoice is never modified.
    pub async fn reconcile_invoice(&self, user_id: i64, invoice_id: i64) -> Result<Reconciliation> {
        let invoice = self.get_invoice(user_id, invoice_id).await?;
        let period = invoice.period()?;
        let report = self.compute_period(user_id, &period).await?;

        let recomputed_gb_days = (report.total_gb_days * Decimal::ONE_HUNDRED).trunc()
            / Decimal::ONE_HUNDRED;
        let drift_cents = report.total_cents - invoice.cost_cents;

        if drift_cents != 0 {
            warn!(
                user_id,
                invoice_id,
                drift_cents,
                "Invoice differs from recomputed usage"
            );
        }

        Ok(Reconciliation {
            invoice_id,
            period: period.to_string(),
            invoiced_cents: invoice.cost_cents,
            recomputed_cents: report.total_cents,
            drift_cents,
            invoiced_gb_days: invoice.total_gb_days(),
            recomputed_gb_days,
            matches: drift_cents == 0,
        })
    }

    /// List the account's latest invoices, newest first.
    pub async fn list_invoices(&self, user_id: i64) -> Result<Vec<Invoice>> {
        InvoiceRepository::new(self.pool)
            .list_by_user(user_id, self.history_limit)
            .await
    }

    /// Get one of the account's invoices.
    pub async fn get_invoice(&self, user_id: i64, invoice_id: i64) -> Result<Invoice> {
        InvoiceRepository::new(self.pool)
            .get_for_user(invoice_id, user_id)
            .await?
            .ok_or_else(|| BaketsuError::NotFound("invoice".to_string()))
    }

    /// Delete an unpaid invoice.
    pub async fn delete_invoice(&self, user_id: i64, invoice_id: i64) -> Result<()> {
        let invoice = self.get_invoice(user_id, invoice_id).await?;
        if invoice.status.is_settled() {
            return Err(BaketsuError::Conflict(format!(
                "invoice {invoice_id} is {} and cannot be deleted",
                invoice.status
            )));
        }

        InvoiceRepository::new(self.pool).delete(invoice_id).await?;
        info!(user_id, invoice_id, "Deleted invoice");
        Ok(())
    }

    async fn compute_period(&self, user_id: i64, period: &UsagePeriod) -> Result<CostReport> {
        let records = FileRepository::new(self.pool)
            .list_storage_records(user_id)
            .await?;
        Ok(self.calculator.calculate(&records, &period.window())?)
    }
}
