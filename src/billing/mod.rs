//! Storage billing for Baketsu.
//!
//! This module turns stored-object metadata into money:
//! - Tiered, progressive pricing tables
//! - Calendar-month usage periods and day-granular proration
//! - A pure cost calculator producing per-file breakdowns
//! - Immutable monthly invoices and the service that generates them

mod calculator;
mod invoice;
mod period;
mod pricing;
mod service;

pub use calculator::{CostCalculator, CostReport, FileCost, StorageRecord};
pub use invoice::{Invoice, InvoiceRepository, InvoiceStatus, NewInvoice};
pub use period::{BillingWindow, UsagePeriod};
pub use pricing::{BandCharge, MonthBasis, PricingTable, PricingTier, TieredCharge};
pub use service::{BillingService, Reconciliation, UsageEstimate};

use thiserror::Error;

/// Bytes in one gigabyte (binary, 1024^3).
pub const BYTES_PER_GB: i64 = 1024 * 1024 * 1024;

/// Gigabytes in one terabyte.
pub const GB_PER_TB: u64 = 1024;

/// Days used to turn a monthly rate into a daily rate under the average basis.
pub const AVERAGE_DAYS_PER_MONTH: u32 = 30;

/// Days between invoice creation and its due date.
pub const DEFAULT_INVOICE_DUE_DAYS: i64 = 7;

/// Number of invoices returned by the invoice history.
pub const DEFAULT_INVOICE_HISTORY_LIMIT: i64 = 12;

/// Errors raised by the cost model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// The pricing tier table is empty or malformed.
    #[error("pricing configuration error: {0}")]
    Configuration(String),

    /// A record, window or period is invalid.
    #[error("invalid billing input: {0}")]
    InvalidInput(String),
}
