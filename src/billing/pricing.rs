//! Tiered storage pricing.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::period::UsagePeriod;
use super::{BillingError, AVERAGE_DAYS_PER_MONTH, GB_PER_TB};

/// How a monthly per-GB rate is turned into a daily rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthBasis {
    /// Every month counts as 30 days.
    #[default]
    Average,
    /// The actual number of days in the billed calendar month.
    Calendar,
}

impl MonthBasis {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MonthBasis::Average => "average",
            MonthBasis::Calendar => "calendar",
        }
    }

    /// Days per month used as the divisor for the given period.
    pub fn days_per_month(&self, period: &UsagePeriod) -> u32 {
        match self {
            MonthBasis::Average => AVERAGE_DAYS_PER_MONTH,
            MonthBasis::Calendar => period.days(),
        }
    }
}

impl fmt::Display for MonthBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonthBasis {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "average" => Ok(MonthBasis::Average),
            "calendar" => Ok(MonthBasis::Calendar),
            _ => Err(BillingError::Configuration(format!(
                "unknown month basis: {s}"
            ))),
        }
    }
}

/// One band of a pricing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTier {
    /// Cumulative upper bound of this band in GB-months.
    ///
    /// Required on every tier but the last; the last tier is unbounded
    /// whatever value it carries.
    #[serde(default)]
    pub up_to_gb: Option<u64>,
    /// Price in dollars per GB-month inside this band.
    pub price_per_gb_month: Decimal,
}

impl PricingTier {
    /// Create a bounded tier.
    pub fn bounded(up_to_gb: u64, price_per_gb_month: Decimal) -> Self {
        Self {
            up_to_gb: Some(up_to_gb),
            price_per_gb_month,
        }
    }

    /// Create an unbounded (final) tier.
    pub fn unbounded(price_per_gb_month: Decimal) -> Self {
        Self {
            up_to_gb: None,
            price_per_gb_month,
        }
    }
}

/// Usage charged inside one band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandCharge {
    /// Lower bound of the band in GB-months.
    pub from_gb: Decimal,
    /// Upper bound of the band in GB-months (None for the final band).
    pub to_gb: Option<Decimal>,
    /// GB-months of usage falling inside the band.
    pub gb_months: Decimal,
    /// Price per GB-month applied to the band.
    pub price_per_gb_month: Decimal,
    /// Cost of the band in dollars.
    pub cost: Decimal,
}

/// Result of running cumulative usage through a pricing table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TieredCharge {
    /// Bands that received usage, lowest first.
    pub bands: Vec<BandCharge>,
    /// Sum of all band costs in dollars.
    pub total: Decimal,
}

/// A validated, progressive pricing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricingTable {
    tiers: Vec<PricingTier>,
}

impl PricingTable {
    /// Validate and build a pricing table.
    ///
    /// Bounds must be present on every tier but the last and strictly
    /// increasing; prices must not be negative.
    pub fn new(tiers: Vec<PricingTier>) -> Result<Self, BillingError> {
        if tiers.is_empty() {
            return Err(BillingError::Configuration(
                "pricing tier table is empty".to_string(),
            ));
        }

        let last = tiers.len() - 1;
        let mut previous: Option<u64> = None;

        for (i, tier) in tiers.iter().enumerate() {
            if tier.price_per_gb_month < Decimal::ZERO {
                return Err(BillingError::Configuration(format!(
                    "tier {} has a negative price ({})",
                    i + 1,
                    tier.price_per_gb_month
                )));
            }

            let bound = match tier.up_to_gb {
                Some(bound) => bound,
                None if i == last => continue,
                None => {
                    return Err(BillingError::Configuration(format!(
                        "tier {} has no upper bound but is not the last tier",
                        i + 1
                    )))
                }
            };

            if bound == 0 || previous.is_some_and(|p| bound <= p) {
                return Err(BillingError::Configuration(format!(
                    "tier bounds must be strictly increasing (tier {} bound {} GB)",
                    i + 1,
                    bound
                )));
            }
            previous = Some(bound);
        }

        Ok(Self { tiers })
    }

    /// Object-storage standard pricing.
    ///
    /// $0.023 for the first 50 TB, $0.022 for the next 450 TB and $0.021
    /// beyond 500 TB, per GB-month.
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                PricingTier::bounded(50 * GB_PER_TB, Decimal::new(23, 3)),
                PricingTier::bounded(500 * GB_PER_TB, Decimal::new(22, 3)),
                PricingTier::unbounded(Decimal::new(21, 3)),
            ],
        }
    }

    /// The tiers of this table, lowest band first.
    pub fn tiers(&self) -> &[PricingTier] {
        &self.tiers
    }

    /// Rate of the first band, used for display of the base price.
    pub fn base_rate(&self) -> Decimal {
        self.tiers[0].price_per_gb_month
    }

    /// Distribute cumulative usage across the bands and price each band.
    pub fn charge(&self, gb_months: Decimal) -> TieredCharge {
        let mut charge = TieredCharge::default();
        let mut remaining = gb_months;
        let mut lower = Decimal::ZERO;
        let last = self.tiers.len() - 1;

        for (i, tier) in self.tiers.iter().enumerate() {
            if remaining <= Decimal::ZERO {
                break;
            }

            let upper = match tier.up_to_gb {
                Some(bound) if i != last => Some(Decimal::from(bound)),
                _ => None,
            };
            let in_band = match upper {
                Some(upper) => remaining.min(upper - lower),
                None => remaining,
            };

            let cost = in_band * tier.price_per_gb_month;
            charge.bands.push(BandCharge {
                from_gb: lower,
                to_gb: upper,
                gb_months: in_band,
                price_per_gb_month: tier.price_per_gb_month,
                cost,
            });
            charge.total += cost;

            remaining -= in_band;
            if let Some(upper) = upper {
                lower = upper;
            }
        }

        charge
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_standard_table_is_valid() {
        let table = PricingTable::standard();
        assert!(PricingTable::new(table.tiers().to_vec()).is_ok());
        assert_eq!(table.base_rate(), dec("0.023"));
        assert_eq!(table.tiers()[0].up_to_gb, Some(51_200));
        assert_eq!(table.tiers()[1].up_to_gb, Some(512_000));
        assert_eq!(table.tiers()[2].up_to_gb, None);
    }

    #[test]
    fn test_empty_table_rejected() {
        let result = PricingTable::new(vec![]);
        assert!(matches!(result, Err(BillingError::Configuration(_))));
    }

    #[test]
    fn test_non_increasing_bounds_rejected() {
        let result = PricingTable::new(vec![
            PricingTier::bounded(100, dec("0.02")),
            PricingTier::bounded(100, dec("0.01")),
            PricingTier::unbounded(dec("0.005")),
        ]);
        assert!(matches!(result, Err(BillingError::Configuration(_))));

        let result = PricingTable::new(vec![
            PricingTier::bounded(200, dec("0.02")),
            PricingTier::bounded(100, dec("0.01")),
        ]);
        assert!(matches!(result, Err(BillingError::Configuration(_))));
    }

    #[test]
    fn test_missing_middle_bound_rejected() {
        let result = PricingTable::new(vec![
            PricingTier::unbounded(dec("0.02")),
            PricingTier::unbounded(dec("0.01")),
        ]);
        assert!(matches!(result, Err(BillingError::Configuration(_))));
    }

    #[test]
    fn test_negative_price_rejected() {
        let result = PricingTable::new(vec![PricingTier::unbounded(dec("-0.01"))]);
        assert!(matches!(result, Err(BillingError::Configuration(_))));
    }

    #[test]
    fn test_single_unbounded_tier() {
        let table = PricingTable::new(vec![PricingTier::unbounded(dec("0.05"))]).unwrap();
        let charge = table.charge(dec("10"));
        assert_eq!(charge.total, dec("0.5"));
        assert_eq!(charge.bands.len(), 1);
    }

    #[test]
    fn test_last_tier_bound_is_ignored() {
        let table = PricingTable::new(vec![
            PricingTier::bounded(10, dec("1")),
            PricingTier::bounded(20, dec("0.5")),
        ])
        .unwrap();

        // 30 GB-months: 10 at 1.0, remaining 20 at 0.5 (last tier unbounded)
        let charge = table.charge(dec("30"));
        assert_eq!(charge.total, dec("20"));
        assert_eq!(charge.bands[1].gb_months, dec("20"));
        assert_eq!(charge.bands[1].to_gb, None);
    }

    #[test]
    fn test_charge_within_first_tier() {
        let charge = PricingTable::standard().charge(dec("10"));
        assert_eq!(charge.total, dec("0.23"));
        assert_eq!(charge.bands.len(), 1);
    }

    #[test]
    fn test_charge_straddles_tier_boundary() {
        // 49 TB + 2 TB = 51 TB of monthly usage
        let usage = Decimal::from(51 * GB_PER_TB);
        let charge = PricingTable::standard().charge(usage);

        let first = Decimal::from(50 * GB_PER_TB) * dec("0.023");
        let second = Decimal::from(GB_PER_TB) * dec("0.022");
        assert_eq!(charge.total, first + second);
        assert_eq!(charge.bands.len(), 2);
        assert_eq!(charge.bands[0].gb_months, Decimal::from(50 * GB_PER_TB));
        assert_eq!(charge.bands[1].gb_months, Decimal::from(GB_PER_TB));
        assert_eq!(charge.bands[1].from_gb, Decimal::from(50 * GB_PER_TB));
    }

    #[test]
    fn test_charge_reaches_final_tier() {
        let usage = Decimal::from(600 * GB_PER_TB);
        let charge = PricingTable::standard().charge(usage);

        let expected = Decimal::from(50 * GB_PER_TB) * dec("0.023")
            + Decimal::from(450 * GB_PER_TB) * dec("0.022")
            + Decimal::from(100 * GB_PER_TB) * dec("0.021");
        assert_eq!(charge.total, expected);
        assert_eq!(charge.bands.len(), 3);
    }

    #[test]
    fn test_charge_zero_usage() {
        let charge = PricingTable::standard().charge(Decimal::ZERO);
        assert_eq!(charge.total, Decimal::ZERO);
        assert!(charge.bands.is_empty());
    }

    #[test]
    fn test_month_basis_parse() {
        assert_eq!("average".parse::<MonthBasis>().unwrap(), MonthBasis::Average);
        assert_eq!("Calendar".parse::<MonthBasis>().unwrap(), MonthBasis::Calendar);
        assert!("weekly".parse::<MonthBasis>().is_err());
    }

    #[test]
    fn test_month_basis_days() {
        let feb = UsagePeriod::new(2024, 2).unwrap();
        assert_eq!(MonthBasis::Average.days_per_month(&feb), 30);
        assert_eq!(MonthBasis::Calendar.days_per_month(&feb), 29);
    }

    #[test]
    fn test_tiers_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            tiers: Vec<PricingTier>,
        }

        let wrapper: Wrapper = toml::from_str(
            r#"
[[tiers]]
up_to_gb = 100
price_per_gb_month = "0.03"

[[tiers]]
price_per_gb_month = "0.02"
"#,
        )
        .unwrap();

        let table = PricingTable::new(wrapper.tiers).unwrap();
        assert_eq!(table.tiers()[0].price_per_gb_month, dec("0.03"));
        assert_eq!(table.tiers()[1].up_to_gb, None);
    }
}
