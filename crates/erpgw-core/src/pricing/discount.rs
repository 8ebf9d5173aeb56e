//! Discount aggregation
//!
//! When several discount-group rules apply to the same item, the customer's
//! aggregation mode decides how they combine into one percentage.

use std::fmt;

/// How simultaneously applicable discount percentages combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregationMode {
    #[default]
    Highest,
    Lowest,
    Average,
    /// Sum, capped at 100
    SumCapped,
    /// Successive (multiplicative) application
    Compounding,
}

impl AggregationMode {
    /// Parse the ERP's single-letter mode code. Blank or unknown codes
    /// fall back to `Highest`.
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim).unwrap_or("") {
            "L" | "l" => AggregationMode::Lowest,
            "A" | "a" => AggregationMode::Average,
            "S" | "s" => AggregationMode::SumCapped,
            "M" | "m" => AggregationMode::Compounding,
            _ => AggregationMode::Highest,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AggregationMode::Highest => "H",
            AggregationMode::Lowest => "L",
            AggregationMode::Average => "A",
            AggregationMode::SumCapped => "S",
            AggregationMode::Compounding => "M",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AggregationMode::Highest => "highest",
            AggregationMode::Lowest => "lowest",
            AggregationMode::Average => "average",
            AggregationMode::SumCapped => "sum",
            AggregationMode::Compounding => "mixed",
        }
    }

    /// True when the best single rule is the one with the smallest discount
    pub fn prefers_lowest(&self) -> bool {
        matches!(self, AggregationMode::Lowest)
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Combine discount percentages under `mode`.
///
/// Returns `None` when there is nothing to combine.
///
/// ```
/// use erpgw_core::pricing::discount::{combine, AggregationMode};
///
/// assert_eq!(combine(AggregationMode::SumCapped, &[60.0, 70.0]), Some(100.0));
/// ```
pub fn combine(mode: AggregationMode, percentages: &[f64]) -> Option<f64> {
    if percentages.is_empty() {
        return None;
    }
    let combined = match mode {
        AggregationMode::Highest => percentages.iter().copied().fold(f64::MIN, f64::max),
        AggregationMode::Lowest => percentages.iter().copied().fold(f64::MAX, f64::min),
        AggregationMode::Average => percentages.iter().sum::<f64>() / percentages.len() as f64,
        AggregationMode::SumCapped => percentages.iter().sum::<f64>().min(100.0),
        AggregationMode::Compounding => {
            if percentages.iter().any(|d| *d >= 100.0) {
                100.0
            } else {
                let log_remaining: f64 = percentages
                    .iter()
                    .map(|d| ((100.0 - d) / 100.0).ln())
                    .sum();
                100.0 * (1.0 - log_remaining.exp())
            }
        }
    };
    Some(combined)
}

/// Price after taking `pct` percent off
pub fn apply_discount(price: f64, pct: f64) -> f64 {
    price * (100.0 - pct) / 100.0
}
