//! Typed payloads returned by the REST API.
//!
//! Every payload is checked after decoding; a body that parses but breaks
//! an invariant is rejected the same way as one that does not parse.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::billing::{InvoiceStatus, MonthBasis, PricingTier};
use crate::file::FileCategory;

/// A decoded payload that can check its own invariants.
pub trait Schema: DeserializeOwned {
    /// Describe the first broken invariant, if any.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

impl<T: Schema> Schema for Vec<T> {
    fn check(&self) -> Result<(), String> {
        self.iter().try_for_each(Schema::check)
    }
}

/// `{ "data": ... }` envelope.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope<T> {
    pub data: T,
}

/// `{ "error": { ... } }` envelope.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

/// One file's share of the month-to-date cost.
#[derive(Debug, Clone, Deserialize)]
pub struct FileCostData {
    pub file_id: i64,
    pub filename: String,
    pub size_bytes: i64,
    pub size_gb: Decimal,
    pub days_stored: u32,
    pub gb_days: Decimal,
    /// Cents.
    pub cost_this_month: i64,
    pub cost: Decimal,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Month-to-date usage.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageData {
    pub period: String,
    pub as_of: DateTime<Utc>,
    /// Cents.
    pub current_month_cost: i64,
    /// GB-days.
    pub current_month_gb_hours: Decimal,
    pub total_gb_months: Decimal,
    pub days_per_month: u32,
    pub active_files: Vec<FileCostData>,
    pub deleted_files: Vec<FileCostData>,
}

impl UsageData {
    /// Every file in the estimate, active first.
    pub fn files(&self) -> impl Iterator<Item = &FileCostData> {
        self.active_files.iter().chain(self.deleted_files.iter())
    }
}

impl Schema for UsageData {
    fn check(&self) -> Result<(), String> {
        if self.current_month_cost < 0 {
            return Err("negative month-to-date cost".to_string());
        }
        if let Some(file) = self.files().find(|f| f.cost_this_month < 0 || f.size_bytes < 0) {
            return Err(format!("negative amount on file {}", file.file_id));
        }
        if let Some(file) = self.active_files.iter().find(|f| f.deleted_at.is_some()) {
            return Err(format!("active file {} has a deletion time", file.file_id));
        }
        if let Some(file) = self.deleted_files.iter().find(|f| f.deleted_at.is_none()) {
            return Err(format!("deleted file {} has no deletion time", file.file_id));
        }

        let cents: i64 = self.files().map(|f| f.cost_this_month).sum();
        if cents != self.current_month_cost {
            return Err(format!(
                "file costs add up to {cents} cents, total is {}",
                self.current_month_cost
            ));
        }
        Ok(())
    }
}

/// Effective pricing.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingData {
    pub month_basis: MonthBasis,
    pub base_price_per_gb_month: Decimal,
    pub tiers: Vec<PricingTier>,
}

impl Schema for PricingData {
    fn check(&self) -> Result<(), String> {
        if self.tiers.is_empty() {
            return Err("empty pricing table".to_string());
        }
        if self.tiers.iter().any(|t| t.price_per_gb_month.is_sign_negative()) {
            return Err("negative tier price".to_string());
        }
        Ok(())
    }
}

/// Invoice summary or detail.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceData {
    pub id: i64,
    pub billing_year: i64,
    pub billing_month: i64,
    pub total_gb_days: Decimal,
    pub cost_cents: i64,
    pub status: String,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl InvoiceData {
    /// Parsed payment status.
    pub fn status(&self) -> Option<InvoiceStatus> {
        InvoiceStatus::from_str(&self.status).ok()
    }
}

impl Schema for InvoiceData {
    fn check(&self) -> Result<(), String> {
        if !(1..=12).contains(&self.billing_month) {
            return Err(format!("invalid billing month {}", self.billing_month));
        }
        if self.cost_cents < 0 {
            return Err(format!("negative amount on invoice {}", self.id));
        }
        if self.status().is_none() {
            return Err(format!("unknown invoice status '{}'", self.status));
        }
        Ok(())
    }
}

/// Stored invoice compared with a recomputation.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationData {
    pub invoice_id: i64,
    pub period: String,
    pub invoiced_cents: i64,
    pub recomputed_cents: i64,
    pub drift_cents: i64,
    pub invoiced_gb_days: Decimal,
    pub recomputed_gb_days: Decimal,
    pub matches: bool,
}

impl Schema for ReconciliationData {
    fn check(&self) -> Result<(), String> {
        if self.recomputed_cents - self.invoiced_cents != self.drift_cents {
            return Err("drift does not match the amounts".to_string());
        }
        if self.matches != (self.drift_cents == 0) {
            return Err("match flag disagrees with drift".to_string());
        }
        Ok(())
    }
}

/// Deletion acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletedData {
    pub id: i64,
    pub deleted: bool,
}

impl Schema for DeletedData {}

/// File metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct FileData {
    pub id: i64,
    pub filename: String,
    pub file_size: i64,
    pub folder_id: Option<i64>,
    pub file_key: String,
    pub category: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Schema for FileData {
    fn check(&self) -> Result<(), String> {
        if self.file_size <= 0 {
            return Err(format!("file {} has no content", self.id));
        }
        if FileCategory::from_str(&self.category).is_err() {
            return Err(format!("unknown file category '{}'", self.category));
        }
        Ok(())
    }
}

/// Folder summary.
#[derive(Debug, Clone, Deserialize)]
pub struct FolderData {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub file_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Schema for FolderData {
    fn check(&self) -> Result<(), String> {
        if self.parent_id == Some(self.id) {
            return Err(format!("folder {} is its own parent", self.id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BreadcrumbData {
    pub id: i64,
    pub name: String,
}

/// Folder with its location and children.
#[derive(Debug, Clone, Deserialize)]
pub struct FolderDetailData {
    pub folder: FolderData,
    pub path: Vec<BreadcrumbData>,
    pub subfolders: Vec<FolderData>,
}

impl Schema for FolderDetailData {
    fn check(&self) -> Result<(), String> {
        self.folder.check()?;
        self.subfolders.check()?;
        match self.path.last() {
            Some(last) if last.id == self.folder.id => Ok(()),
            _ => Err("breadcrumb does not end at the folder".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryData {
    pub category: String,
    pub files: i64,
    pub bytes: i64,
}

/// Active storage totals.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageData {
    pub total_files: i64,
    pub total_bytes: i64,
    pub categories: Vec<CategoryData>,
}

impl Schema for StorageData {
    fn check(&self) -> Result<(), String> {
        let files: i64 = self.categories.iter().map(|c| c.files).sum();
        let bytes: i64 = self.categories.iter().map(|c| c.bytes).sum();
        if files != self.total_files || bytes != self.total_bytes {
            return Err("category totals do not add up".to_string());
        }
        Ok(())
    }
}

/// Body for registering a file.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterFile {
    pub filename: String,
    pub file_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_key: Option<String>,
}

/// Decode an enveloped payload and check it.
pub fn decode<T: Schema>(bytes: &[u8]) -> Result<T, String> {
    let envelope: Envelope<T> = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    envelope.data.check()?;
    Ok(envelope.data)
}
