//! Configuration module for Baketsu.

use serde::Deserialize;
use std::path::Path;

use crate::billing::{
    CostCalculator, MonthBasis, PricingTable, PricingTier, DEFAULT_INVOICE_DUE_DAYS,
    DEFAULT_INVOICE_HISTORY_LIMIT,
};
use crate::{BaketsuError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/baketsu.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/baketsu.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Shared HS256 secret used to verify bearer tokens.
    #[serde(default)]
    pub jwt_secret: String,
}

/// Billing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// How monthly rates are turned into daily rates.
    #[serde(default)]
    pub month_basis: MonthBasis,
    /// Progressive price tiers, lowest first.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<PricingTier>,
    /// Days between invoice creation and its due date.
    #[serde(default = "default_invoice_due_days")]
    pub invoice_due_days: i64,
    /// Number of invoices returned by the invoice history.
    #[serde(default = "default_invoice_history_limit")]
    pub invoice_history_limit: i64,
}

fn default_tiers() -> Vec<PricingTier> {
    PricingTable::standard().tiers().to_vec()
}

fn default_invoice_due_days() -> i64 {
    DEFAULT_INVOICE_DUE_DAYS
}

fn default_invoice_history_limit() -> i64 {
    DEFAULT_INVOICE_HISTORY_LIMIT
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            month_basis: MonthBasis::default(),
            tiers: default_tiers(),
            invoice_due_days: default_invoice_due_days(),
            invoice_history_limit: default_invoice_history_limit(),
        }
    }
}

impl BillingConfig {
    /// Build the cost calculator described by this section.
    ///
    /// A malformed tier table is an error, never replaced by defaults.
    pub fn calculator(&self) -> Result<CostCalculator> {
        let pricing = PricingTable::new(self.tiers.clone())?;
        Ok(CostCalculator::new(pricing, self.month_basis))
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Billing configuration.
    #[serde(default)]
    pub billing: BillingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(BaketsuError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| BaketsuError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `BAKETSU_JWT_SECRET`: Override the JWT secret key
    pub fn apply_env_overrides(&mut self) {
        if let Ok(jwt_secret) = std::env::var("BAKETSU_JWT_SECRET") {
            if !jwt_secret.is_empty() {
                self.web.jwt_secret = jwt_secret;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - JWT secret is not set
    /// - The pricing tier table is malformed
    /// - Invoice settings are not positive
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(BaketsuError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via BAKETSU_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }

        self.billing.calculator()?;

        if self.billing.invoice_due_days < 0 {
            return Err(BaketsuError::Config(
                "billing.invoice_due_days must not be negative".to_string(),
            ));
        }
        if self.billing.invoice_history_limit <= 0 {
            return Err(BaketsuError::Config(
                "billing.invoice_history_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
