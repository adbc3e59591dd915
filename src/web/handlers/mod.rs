//! API handlers for the Baketsu REST API.

pub mod billing;
pub mod file;
pub mod folder;
pub mod storage;

pub use billing::*;
pub use file::*;
pub use folder::*;
pub use storage::*;

use crate::billing::{
    BillingService, CostCalculator, DEFAULT_INVOICE_DUE_DAYS, DEFAULT_INVOICE_HISTORY_LIMIT,
};
use crate::config::BillingConfig;
use crate::{Database, Result};

/// Shared application state.
pub struct AppState {
    /// Database connection pool.
    pub db: Database,
    /// Cost calculator built from the billing configuration.
    pub calculator: CostCalculator,
    /// Days between invoice creation and its due date.
    pub invoice_due_days: i64,
    /// Number of invoices returned by the invoice history.
    pub invoice_history_limit: i64,
}

impl AppState {
    /// Create a new application state with default billing settings.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            calculator: CostCalculator::default(),
            invoice_due_days: DEFAULT_INVOICE_DUE_DAYS,
            invoice_history_limit: DEFAULT_INVOICE_HISTORY_LIMIT,
        }
    }

    /// Create a new application state from the billing configuration.
    pub fn from_config(db: Database, billing: &BillingConfig) -> Result<Self> {
        Ok(Self {
            db,
            calculator: billing.calculator()?,
            invoice_due_days: billing.invoice_due_days,
            invoice_history_limit: billing.invoice_history_limit,
        })
    }

    /// Billing service bound to this state.
    pub fn billing(&self) -> BillingService<'_> {
        BillingService::new(self.db.pool(), &self.calculator)
            .with_invoice_due_days(self.invoice_due_days)
            .with_history_limit(self.invoice_history_limit)
    }
}
