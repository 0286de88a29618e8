use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::ListingDetail;

/// Token that must directly follow the price digits in a display string.
pub const CURRENCY_MARKER: &str = " 円";

static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("([0-9,]+){}", regex::escape(CURRENCY_MARKER)))
        .expect("price pattern is a valid regex")
});

/// Fraction of the starting price used to estimate the procurement cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostRate(f64);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cost rate must be a finite, non-negative number (got {0})")]
pub struct InvalidCostRate(pub f64);

impl CostRate {
    pub const DEFAULT: CostRate = CostRate(0.2);

    pub fn new(rate: f64) -> Result<Self, InvalidCostRate> {
        if rate.is_finite() && rate >= 0.0 {
            Ok(Self(rate))
        } else {
            Err(InvalidCostRate(rate))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// `floor(price * rate)`; truncation, never rounding.
    pub fn cost_of(self, price: u64) -> u64 {
        (price as f64 * self.0).trunc() as u64
    }
}

impl Default for CostRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for CostRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CostRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rate: f64 = s
            .trim()
            .parse()
            .map_err(|err| format!("invalid cost rate {s:?}: {err}"))?;
        CostRate::new(rate).map_err(|err| err.to_string())
    }
}

/// Price and derived cost. They only ever exist together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pricing {
    pub price: u64,
    pub cost: u64,
}

/// One parsed report row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub title: String,
    pub stock: u32,
    pub pricing: Option<Pricing>,
}

impl Record {
    pub fn price(&self) -> Option<u64> {
        self.pricing.map(|p| p.price)
    }

    pub fn cost(&self) -> Option<u64> {
        self.pricing.map(|p| p.cost)
    }
}

/// Turn one listing detail into a report row.
///
/// A starting price that cannot be read (auction-only listings, odd
/// formatting) leaves both price and cost absent; it is never an error.
pub fn parse_listing(detail: &ListingDetail, cost_rate: CostRate) -> Record {
    let pricing = parse_price(&detail.start_price).map(|price| Pricing {
        price,
        cost: cost_rate.cost_of(price),
    });
    Record {
        title: detail.title.clone(),
        stock: detail.stock,
        pricing,
    }
}

fn parse_price(display: &str) -> Option<u64> {
    let digits = PRICE_PATTERN.captures(display)?.get(1)?.as_str();
    let stripped: String = digits.chars().filter(|c| *c != ',').collect();
    stripped.parse().ok()
}
