//! Usage and cost calculation.
//!
//! The calculator is a pure function of (records, window, pricing). It first
//! sums GB-days across all records, prices the account's cumulative usage
//! through the tier bands, then apportions the total back onto individual
//! files in proportion to their GB-days. Rounding to cents happens once, at
//! the end.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::period::{BillingWindow, UsagePeriod};
use super::pricing::{BandCharge, MonthBasis, PricingTable};
use super::{BillingError, BYTES_PER_GB};

/// A stored object as seen by the billing model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRecord {
    /// File ID.
    pub id: i64,
    /// Display filename.
    pub filename: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// When the object was stored.
    pub created_at: DateTime<Utc>,
    /// When the object was deleted (None while still stored).
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StorageRecord {
    /// Create a record for an object that is still stored.
    pub fn new(
        id: i64,
        filename: impl Into<String>,
        size_bytes: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            filename: filename.into(),
            size_bytes,
            created_at,
            deleted_at: None,
        }
    }

    /// Set the deletion time.
    pub fn with_deleted_at(mut self, deleted_at: DateTime<Utc>) -> Self {
        self.deleted_at = Some(deleted_at);
        self
    }

    fn validate(&self) -> Result<(), BillingError> {
        if self.size_bytes < 0 {
            return Err(BillingError::InvalidInput(format!(
                "file {} has a negative size ({} bytes)",
                self.id, self.size_bytes
            )));
        }
        if let Some(deleted_at) = self.deleted_at {
            if deleted_at < self.created_at {
                return Err(BillingError::InvalidInput(format!(
                    "file {} was deleted ({deleted_at}) before it was created ({})",
                    self.id, self.created_at
                )));
            }
        }
        Ok(())
    }
}

/// Cost attributed to one file for a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCost {
    /// File ID.
    pub record_id: i64,
    /// Display filename.
    pub filename: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// Size in GB.
    pub size_gb: Decimal,
    /// Days stored inside the window.
    pub days_stored: u32,
    /// GB-days accrued inside the window.
    pub gb_days: Decimal,
    /// Exact cost in dollars.
    pub cost: Decimal,
    /// Cost in cents, apportioned so the breakdown sums to the total.
    pub cost_cents: i64,
    /// Deletion time if the file was deleted by the end of the window.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl FileCost {
    /// Whether the file was deleted by the end of the window.
    pub fn was_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Result of a cost calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostReport {
    /// Window that was charged.
    pub window: BillingWindow,
    /// Divisor used to convert GB-days into GB-months.
    pub days_per_month: u32,
    /// GB-days across all files.
    pub total_gb_days: Decimal,
    /// Cumulative GB-months used for tier selection.
    pub total_gb_months: Decimal,
    /// Tier bands that received usage.
    pub bands: Vec<BandCharge>,
    /// Exact total cost in dollars.
    pub total_cost: Decimal,
    /// Total cost in cents (truncated).
    pub total_cents: i64,
    /// Files still stored at the end of the window.
    pub active_files: Vec<FileCost>,
    /// Files deleted by the end of the window.
    pub deleted_files: Vec<FileCost>,
}

impl CostReport {
    /// A report with no usage.
    pub fn empty(window: BillingWindow, days_per_month: u32) -> Self {
        Self {
            window,
            days_per_month,
            total_gb_days: Decimal::ZERO,
            total_gb_months: Decimal::ZERO,
            bands: Vec::new(),
            total_cost: Decimal::ZERO,
            total_cents: 0,
            active_files: Vec::new(),
            deleted_files: Vec::new(),
        }
    }

    /// All file entries, active first.
    pub fn files(&self) -> impl Iterator<Item = &FileCost> {
        self.active_files.iter().chain(self.deleted_files.iter())
    }

    /// Sum of the exact per-file costs.
    pub fn breakdown_cost(&self) -> Decimal {
        self.files().map(|f| f.cost).sum()
    }

    /// Sum of the per-file cents.
    pub fn breakdown_cents(&self) -> i64 {
        self.files().map(|f| f.cost_cents).sum()
    }
}

/// Converts storage records into cost under a pricing table.
#[derive(Debug, Clone, Default)]
pub struct CostCalculator {
    pricing: PricingTable,
    month_basis: MonthBasis,
}

impl CostCalculator {
    /// Create a calculator.
    pub fn new(pricing: PricingTable, month_basis: MonthBasis) -> Self {
        Self {
            pricing,
            month_basis,
        }
    }

    /// The pricing table in use.
    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// The month basis in use.
    pub fn month_basis(&self) -> MonthBasis {
        self.month_basis
    }

    /// Days per month applied to a window, based on the month it starts in.
    pub fn days_per_month(&self, window: &BillingWindow) -> Result<u32, BillingError> {
        let period = UsagePeriod::containing(window.start())?;
        Ok(self.month_basis.days_per_month(&period))
    }

    /// Compute the cost of `records` for `window`.
    ///
    /// Any invalid record rejects the whole call.
    pub fn calculate(
        &self,
        records: &[StorageRecord],
        window: &BillingWindow,
    ) -> Result<CostReport, BillingError> {
        let days_per_month = self.days_per_month(window)?;
        let bytes_per_gb = Decimal::from(BYTES_PER_GB);

        let mut usages = Vec::with_capacity(records.len());
        for record in records {
            record.validate()?;

            let days = window.overlap_days(record.created_at, record.deleted_at);
            if days == 0 {
                continue;
            }

            let size_gb = Decimal::from(record.size_bytes) / bytes_per_gb;
            let gb_days = size_gb * Decimal::from(days);
            usages.push((record, size_gb, days, gb_days));
        }

        let total_gb_days: Decimal = usages.iter().map(|u| u.3).sum();
        let total_gb_months = total_gb_days / Decimal::from(days_per_month);
        let charge = self.pricing.charge(total_gb_months);
        let total_cost = charge.total;
        let total_cents = to_cents(total_cost)?;

        let costs = apportion(total_cost, usages.iter().map(|u| u.3));
        let cents = apportion_cents(total_cents, &costs)?;

        let mut report = CostReport {
            window: *window,
            days_per_month,
            total_gb_days,
            total_gb_months,
            bands: charge.bands,
            total_cost,
            total_cents,
            active_files: Vec::new(),
            deleted_files: Vec::new(),
        };

        for (((record, size_gb, days, gb_days), cost), cost_cents) in
            usages.into_iter().zip(costs).zip(cents)
        {
            let deleted_at = record.deleted_at.filter(|d| *d <= window.end());
            let entry = FileCost {
                record_id: record.id,
                filename: record.filename.clone(),
                size_bytes: record.size_bytes,
                size_gb,
                days_stored: days,
                gb_days,
                cost,
                cost_cents,
                deleted_at,
            };
            if entry.was_deleted() {
                report.deleted_files.push(entry);
            } else {
                report.active_files.push(entry);
            }
        }

        Ok(report)
    }
}

/// Truncate a dollar amount to whole cents.
fn to_cents(amount: Decimal) -> Result<i64, BillingError> {
    i64::try_from((amount * Decimal::ONE_HUNDRED).trunc())
        .map_err(|e| BillingError::InvalidInput(format!("cost {amount} out of range: {e}")))
}

/// Split `total` across weights proportionally.
///
/// The last non-zero weight receives the remainder so the parts sum to
/// `total` exactly; zero weights always receive zero.
fn apportion(total: Decimal, weights: impl Iterator<Item = Decimal>) -> Vec<Decimal> {
    let weights: Vec<Decimal> = weights.collect();
    let weight_sum: Decimal = weights.iter().copied().sum();
    let mut parts = vec![Decimal::ZERO; weights.len()];

    if weight_sum.is_zero() {
        return parts;
    }

    let Some(last) = weights.iter().rposition(|w| !w.is_zero()) else {
        return parts;
    };

    let mut allocated = Decimal::ZERO;
    for (i, weight) in weights.iter().enumerate().take(last) {
        let part = total * *weight / weight_sum;
        parts[i] = part;
        allocated += part;
    }
    parts[last] = total - allocated;

    parts
}

/// Convert exact per-file costs to cents that sum to `total_cents`
/// (largest-remainder method).
fn apportion_cents(total_cents: i64, costs: &[Decimal]) -> Result<Vec<i64>, BillingError> {
    let mut cents = Vec::with_capacity(costs.len());
    let mut fractions = Vec::with_capacity(costs.len());

    for (i, cost) in costs.iter().enumerate() {
        let exact = *cost * Decimal::ONE_HUNDRED;
        let whole = to_cents(*cost)?;
        cents.push(whole);
        fractions.push((i, exact - Decimal::from(whole)));
    }

    let mut leftover = total_cents - cents.iter().sum::<i64>();

    if leftover > 0 {
        fractions.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        for (i, _) in fractions.iter().cycle().take(leftover as usize) {
            cents[*i] += 1;
        }
    } else if leftover < 0 {
        fractions.sort_by(|a, b| match a.1.cmp(&b.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });
        for (i, _) in &fractions {
            if leftover == 0 {
                break;
            }
            if cents[*i] > 0 {
                cents[*i] -= 1;
                leftover += 1;
            }
        }
    }

    Ok(cents)
}
