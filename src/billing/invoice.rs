//! Invoice types and repository.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;

use super::calculator::CostCalculator;
use super::{CostReport, UsagePeriod};
use crate::{BaketsuError, Result};

/// Payment state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Awaiting payment.
    Pending,
    /// Paid in full.
    Paid,
    /// Payment attempt failed.
    Failed,
    /// Payment was returned to the customer.
    Refunded,
}

impl InvoiceStatus {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Failed => "failed",
            InvoiceStatus::Refunded => "refunded",
        }
    }

    /// Whether the invoice has been settled and must be kept.
    pub fn is_settled(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Refunded)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            "failed" => Ok(InvoiceStatus::Failed),
            "refunded" => Ok(InvoiceStatus::Refunded),
            _ => Err(format!("unknown invoice status: {s}")),
        }
    }
}

impl TryFrom<String> for InvoiceStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// A stored monthly invoice.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Invoice {
    /// Invoice ID.
    pub id: i64,
    /// Account the invoice belongs to.
    pub user_id: i64,
    /// Billing year.
    pub billing_year: i64,
    /// Billing month (1-12).
    pub billing_month: i64,
    /// Total GB-days in hundredths (two decimal places).
    pub total_gb_days_centi: i64,
    /// Cost in cents.
    pub cost_cents: i64,
    /// Payment status.
    #[sqlx(try_from = "String")]
    pub status: InvoiceStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Payment due date.
    pub due_date: DateTime<Utc>,
    /// When the invoice was paid.
    pub paid_at: Option<DateTime<Utc>>,
    /// File-by-file breakdown and pricing snapshot (JSON).
    pub details: Option<String>,
}

impl Invoice {
    /// The billed period.
    pub fn period(&self) -> Result<UsagePeriod> {
        let year = i32::try_from(self.billing_year).map_err(|_| {
            BaketsuError::Database(format!("invalid billing year {}", self.billing_year))
        })?;
        let month = u32::try_from(self.billing_month).map_err(|_| {
            BaketsuError::Database(format!("invalid billing month {}", self.billing_month))
        })?;
        Ok(UsagePeriod::new(year, month)?)
    }

    /// Total GB-days with two decimal places.
    pub fn total_gb_days(&self) -> Decimal {
        Decimal::new(self.total_gb_days_centi, 2)
    }

    /// Parsed details payload.
    pub fn details_json(&self) -> Option<serde_json::Value> {
        self.details
            .as_deref()
            .and_then(|d| serde_json::from_str(d).ok())
    }
}

/// Data for creating a new invoice.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    /// Account the invoice belongs to.
    pub user_id: i64,
    /// Billed period.
    pub period: UsagePeriod,
    /// Total GB-days in hundredths.
    pub total_gb_days_centi: i64,
    /// Cost in cents.
    pub cost_cents: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Payment due date.
    pub due_date: DateTime<Utc>,
    /// Breakdown payload.
    pub details: serde_json::Value,
}

impl NewInvoice {
    /// Build an invoice from a cost report.
    pub fn from_report(
        user_id: i64,
        period: UsagePeriod,
        report: &CostReport,
        calculator: &CostCalculator,
        created_at: DateTime<Utc>,
        due_days: i64,
    ) -> Result<Self> {
        let total_gb_days_centi =
            i64::try_from((report.total_gb_days * Decimal::ONE_HUNDRED).trunc()).map_err(|e| {
                BaketsuError::Validation(format!("GB-days out of range: {e}"))
            })?;

        Ok(Self {
            user_id,
            period,
            total_gb_days_centi,
            cost_cents: report.total_cents,
            created_at,
            due_date: created_at + Duration::days(due_days),
            details: invoice_details(report, calculator),
        })
    }
}

/// Breakdown stored alongside an invoice.
fn invoice_details(report: &CostReport, calculator: &CostCalculator) -> serde_json::Value {
    let files: Vec<serde_json::Value> = report
        .files()
        .map(|f| {
            serde_json::json!({
                "file_id": f.record_id,
                "filename": f.filename,
                "size_bytes": f.size_bytes,
                "size_gb": f.size_gb.to_string(),
                "days_stored": f.days_stored,
                "gb_days": f.gb_days.to_string(),
                "cost_cents": f.cost_cents,
                "was_deleted": f.was_deleted(),
            })
        })
        .collect();

    serde_json::json!({
        "files": files,
        "bands": report.bands,
        "total_cost": report.total_cost.to_string(),
        "pricing": {
            "tiers": calculator.pricing().tiers(),
            "month_basis": calculator.month_basis().as_str(),
            "days_per_month": report.days_per_month,
        },
    })
}

const INVOICE_COLUMNS: &str = "id, user_id, billing_year, billing_month, total_gb_days_centi, cost_cents,
     status, created_at, due_date, paid_at, details";

/// Repository for invoice operations.
pub struct InvoiceRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> InvoiceRepository<'a> {
    /// Create a new InvoiceRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new invoice.
    ///
    /// Fails with `Conflict` if the account already has an invoice for the period.
    pub async fn create(&self, invoice: &NewInvoice) -> Result<Invoice> {
        let result = sqlx::query(
            "INSERT INTO invoices (user_id, billing_year, billing_month, total_gb_days_centi,
                                   cost_cents, status, created_at, due_date, details)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(invoice.user_id)
        .bind(invoice.period.year())
        .bind(invoice.period.month())
        .bind(invoice.total_gb_days_centi)
        .bind(invoice.cost_cents)
        .bind(InvoiceStatus::Pending.as_str())
        .bind(invoice.created_at)
        .bind(invoice.due_date)
        .bind(invoice.details.to_string())
        .execute(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => BaketsuError::Conflict(
                format!("invoice already exists for {}", invoice.period),
            ),
            e => BaketsuError::Database(e.to_string()),
        })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| BaketsuError::NotFound("invoice".to_string()))
    }

    /// Get an invoice by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(invoice)
    }

    /// Get an invoice by ID if it belongs to the account.
    pub async fn get_for_user(&self, id: i64, user_id: i64) -> Result<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(invoice)
    }

    /// Find the account's invoice for a period.
    pub async fn find_by_period(
        &self,
        user_id: i64,
        period: &UsagePeriod,
    ) -> Result<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices
             WHERE user_id = ? AND billing_year = ? AND billing_month = ?"
        ))
        .bind(user_id)
        .bind(period.year())
        .bind(period.month())
        .fetch_optional(self.pool)
        .await?;

        Ok(invoice)
    }

    /// List the account's most recent invoices, newest first.
    pub async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE user_id = ?
             ORDER BY created_at DESC, id DESC LIMIT ?"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(invoices)
    }

    /// Change the payment status.
    ///
    /// Marking an invoice paid records `paid_at`. Amounts are never changed.
    pub async fn update_status(
        &self,
        id: i64,
        status: InvoiceStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Invoice>> {
        let paid_at = (status == InvoiceStatus::Paid).then_some(at);

        let result = sqlx::query(
            "UPDATE invoices SET status = ?, paid_at = COALESCE(?, paid_at) WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(paid_at)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Delete an invoice by ID.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
