//! Response DTOs for Web API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::billing::{
    CostCalculator, FileCost, Invoice, PricingTier, Reconciliation, UsageEstimate,
};
use crate::file::{FileCategory, Folder, StoredFile};

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Billing
// ============================================================================

/// One file's share of a usage estimate.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileCostResponse {
    pub file_id: i64,
    pub filename: String,
    pub size_bytes: i64,
    /// Size in GB (decimal string).
    pub size_gb: String,
    pub days_stored: u32,
    /// GB-days (decimal string).
    pub gb_days: String,
    /// Cost in cents.
    pub cost_this_month: i64,
    /// Exact cost in dollars (decimal string).
    pub cost: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&FileCost> for FileCostResponse {
    fn from(f: &FileCost) -> Self {
        Self {
            file_id: f.record_id,
            filename: f.filename.clone(),
            size_bytes: f.size_bytes,
            size_gb: f.size_gb.round_dp(6).normalize().to_string(),
            days_stored: f.days_stored,
            gb_days: f.gb_days.round_dp(6).normalize().to_string(),
            cost_this_month: f.cost_cents,
            cost: f.cost.round_dp(6).normalize().to_string(),
            deleted_at: f.deleted_at,
        }
    }
}

/// Month-to-date usage.
#[derive(Debug, Serialize, ToSchema)]
pub struct UsageResponse {
    /// Period as YYYY-MM.
    pub period: String,
    pub as_of: DateTime<Utc>,
    /// Estimated cost so far, in cents.
    pub current_month_cost: i64,
    /// GB-days accrued so far (decimal string).
    pub current_month_gb_hours: String,
    /// GB-months used for tier selection (decimal string).
    pub total_gb_months: String,
    pub days_per_month: u32,
    pub active_files: Vec<FileCostResponse>,
    pub deleted_files: Vec<FileCostResponse>,
}

impl From<&UsageEstimate> for UsageResponse {
    fn from(estimate: &UsageEstimate) -> Self {
        let report = &estimate.report;
        Self {
            period: estimate.period.clone(),
            as_of: estimate.as_of,
            current_month_cost: report.total_cents,
            current_month_gb_hours: report.total_gb_days.round_dp(2).to_string(),
            total_gb_months: report.total_gb_months.round_dp(6).normalize().to_string(),
            days_per_month: report.days_per_month,
            active_files: report.active_files.iter().map(FileCostResponse::from).collect(),
            deleted_files: report.deleted_files.iter().map(FileCostResponse::from).collect(),
        }
    }
}

/// One pricing tier.
#[derive(Debug, Serialize, ToSchema)]
pub struct PricingTierResponse {
    /// Upper bound in GB-months (None for the final tier).
    pub up_to_gb: Option<u64>,
    /// Price per GB-month in dollars (decimal string).
    pub price_per_gb_month: String,
}

impl From<&PricingTier> for PricingTierResponse {
    fn from(tier: &PricingTier) -> Self {
        Self {
            up_to_gb: tier.up_to_gb,
            price_per_gb_month: tier.price_per_gb_month.to_string(),
        }
    }
}

/// Effective pricing.
#[derive(Debug, Serialize, ToSchema)]
pub struct PricingResponse {
    /// "average" (30-day months) or "calendar".
    pub month_basis: String,
    /// Price per GB-month of the first tier (decimal string).
    pub base_price_per_gb_month: String,
    pub tiers: Vec<PricingTierResponse>,
}

impl From<&CostCalculator> for PricingResponse {
    fn from(calculator: &CostCalculator) -> Self {
        Self {
            month_basis: calculator.month_basis().as_str().to_string(),
            base_price_per_gb_month: calculator.pricing().base_rate().to_string(),
            tiers: calculator
                .pricing()
                .tiers()
                .iter()
                .map(PricingTierResponse::from)
                .collect(),
        }
    }
}

/// Invoice summary or detail.
#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceResponse {
    pub id: i64,
    pub billing_year: i64,
    pub billing_month: i64,
    /// GB-days with two decimals (decimal string).
    pub total_gb_days: String,
    pub cost_cents: i64,
    pub status: String,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    /// Breakdown and pricing snapshot (detail only).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl InvoiceResponse {
    /// Summary without the breakdown.
    pub fn summary(invoice: &Invoice) -> Self {
        Self {
            id: invoice.id,
            billing_year: invoice.billing_year,
            billing_month: invoice.billing_month,
            total_gb_days: invoice.total_gb_days().to_string(),
            cost_cents: invoice.cost_cents,
            status: invoice.status.as_str().to_string(),
            due_date: invoice.due_date,
            created_at: invoice.created_at,
            paid_at: invoice.paid_at,
            details: None,
        }
    }

    /// Full invoice including the breakdown.
    pub fn detail(invoice: &Invoice) -> Self {
        Self {
            details: invoice.details_json(),
            ..Self::summary(invoice)
        }
    }
}

/// Stored invoice compared with a recomputation.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReconciliationResponse {
    pub invoice_id: i64,
    pub period: String,
    pub invoiced_cents: i64,
    pub recomputed_cents: i64,
    pub drift_cents: i64,
    pub invoiced_gb_days: String,
    pub recomputed_gb_days: String,
    pub matches: bool,
}

impl From<Reconciliation> for ReconciliationResponse {
    fn from(r: Reconciliation) -> Self {
        Self {
            invoice_id: r.invoice_id,
            period: r.period,
            invoiced_cents: r.invoiced_cents,
            recomputed_cents: r.recomputed_cents,
            drift_cents: r.drift_cents,
            invoiced_gb_days: two_places(r.invoiced_gb_days),
            recomputed_gb_days: two_places(r.recomputed_gb_days),
            matches: r.matches,
        }
    }
}

fn two_places(value: Decimal) -> String {
    let mut value = value;
    value.rescale(2);
    value.to_string()
}

/// Message response for deletions.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub id: i64,
    pub deleted: bool,
}

// ============================================================================
// Files and Folders
// ============================================================================

/// File metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileResponse {
    pub id: i64,
    pub filename: String,
    pub file_size: i64,
    pub folder_id: Option<i64>,
    pub file_key: String,
    pub category: FileCategory,
    pub uploaded_at: DateTime<Utc>,
}

impl From<StoredFile> for FileResponse {
    fn from(file: StoredFile) -> Self {
        let category = file.category();
        Self {
            id: file.id,
            filename: file.filename,
            file_size: file.file_size,
            folder_id: file.folder_id,
            file_key: file.file_key,
            category,
            uploaded_at: file.uploaded_at,
        }
    }
}

/// Folder summary.
#[derive(Debug, Serialize, ToSchema)]
pub struct FolderResponse {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub file_count: i64,
    pub created_at: DateTime<Utc>,
}

impl FolderResponse {
    /// Build from a folder and its active file count.
    pub fn new(folder: Folder, file_count: i64) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            parent_id: folder.parent_id,
            file_count,
            created_at: folder.created_at,
        }
    }
}

/// One breadcrumb entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct BreadcrumbItem {
    pub id: i64,
    pub name: String,
}

/// Folder with its location and children.
#[derive(Debug, Serialize, ToSchema)]
pub struct FolderDetailResponse {
    pub folder: FolderResponse,
    /// Path from the root folder to this folder, inclusive.
    pub path: Vec<BreadcrumbItem>,
    pub subfolders: Vec<FolderResponse>,
}
