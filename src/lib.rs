//! Baketsu - cloud file storage backend with usage-based billing
//!
//! Computes prorated, tiered storage charges from file metadata and serves
//! billing, file and folder operations over a REST API.

pub mod billing;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use billing::{
    BillingError, BillingService, BillingWindow, CostCalculator, CostReport, FileCost, Invoice,
    InvoiceStatus, MonthBasis, PricingTable, PricingTier, StorageRecord, UsagePeriod,
};
pub use client::{ApiClient, ClientError, Credentials};
pub use config::Config;
pub use db::Database;
pub use error::{BaketsuError, Result};
pub use web::{AppState, WebServer};
