//! Rule-engine pricing
//!
//! The final price comes from exactly one source, first match wins:
//! explicit special price, special-price discount, discount groups (per the
//! customer's aggregation mode), promotion, base price list.

use super::discount::{apply_discount, combine, AggregationMode};
use super::model::round4;

/// Account-scoped special price terms valid on the as-of date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecialTerms {
    pub price: Option<f64>,
    pub discount_pct: Option<f64>,
}

/// Discount-group rule that applies to an item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupRule {
    /// `S` customer, `C` customer group, blank/other for global rules
    pub rule_type: String,
    /// What the rule is keyed on: item, manufacturer or item group
    pub object_type: RuleObject,
    pub discount_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuleObject {
    #[default]
    Item,
    Manufacturer,
    ItemGroup,
}

impl RuleObject {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "4" => Some(RuleObject::Item),
            "43" => Some(RuleObject::Manufacturer),
            "52" => Some(RuleObject::ItemGroup),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RuleObject::Item => "Discount group (item)",
            RuleObject::Manufacturer => "Discount group (manufacturer)",
            RuleObject::ItemGroup => "Discount group (item group)",
        }
    }
}

/// Which branch produced the final price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    SpecialPrice,
    SpecialDiscount,
    DiscountGroups(AggregationMode),
    Promotion,
    BasePriceList,
}

impl PriceSource {
    pub fn label(&self) -> String {
        match self {
            PriceSource::SpecialPrice => "Special price (explicit)".to_string(),
            PriceSource::SpecialDiscount => "Special price (discount)".to_string(),
            PriceSource::DiscountGroups(mode) => format!("Discount groups ({})", mode.label()),
            PriceSource::Promotion => "Promotion".to_string(),
            PriceSource::BasePriceList => "Base price list".to_string(),
        }
    }
}

/// Inputs for one SKU
#[derive(Debug, Clone, Default)]
pub struct QuoteInputs<'a> {
    pub base_price: f64,
    pub special: Option<&'a SpecialTerms>,
    pub rules: &'a [GroupRule],
    pub promo_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub base_price: f64,
    pub final_price: f64,
    pub source: PriceSource,
    /// Combined discount-group percentage, whether or not it was used
    pub group_discount: Option<f64>,
    /// Rule type of the single best rule, set when discount groups or the
    /// promotion priced the item
    pub winning_rule_type: Option<String>,
    pub winning_rule_object: Option<RuleObject>,
}

/// Price one SKU
pub fn quote(inputs: &QuoteInputs<'_>, mode: AggregationMode) -> Quote {
    let base = inputs.base_price;
    let pcts: Vec<f64> = inputs.rules.iter().filter_map(|r| r.discount_pct).collect();
    let group_discount = combine(mode, &pcts).map(round4);

    let special_price = inputs.special.and_then(|s| s.price).filter(|p| *p > 0.0);
    let special_discount = inputs.special.and_then(|s| s.discount_pct);

    let mut winning_rule_type = None;
    let mut winning_rule_object = None;
    let (source, final_price) = if let Some(price) = special_price {
        (PriceSource::SpecialPrice, price)
    } else if let Some(pct) = special_discount {
        (PriceSource::SpecialDiscount, apply_discount(base, pct))
    } else if let Some(pct) = group_discount {
        if let Some(best) = best_rule(inputs.rules, mode) {
            winning_rule_type = Some(best.rule_type.clone());
            winning_rule_object = Some(best.object_type);
        }
        (PriceSource::DiscountGroups(mode), apply_discount(base, pct))
    } else if let Some(pct) = inputs.promo_pct {
        winning_rule_type = Some("A".to_string());
        (PriceSource::Promotion, apply_discount(base, pct))
    } else {
        (PriceSource::BasePriceList, base)
    };

    Quote {
        base_price: round4(base),
        final_price: round4(final_price),
        source,
        group_discount,
        winning_rule_type,
        winning_rule_object,
    }
}

/// The rule that best represents the combined discount: the largest
/// percentage (smallest in `Lowest` mode), ties broken by rule type.
/// Rules without a percentage rank last.
pub fn best_rule(rules: &[GroupRule], mode: AggregationMode) -> Option<&GroupRule> {
    rules.iter().min_by(|a, b| {
        let rank = |r: &GroupRule| {
            r.discount_pct
                .map(|p| if mode.prefers_lowest() { p } else { -p })
        };
        match (rank(a), rank(b)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.rule_type.cmp(&b.rule_type))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(rule_type: &str, pct: f64) -> GroupRule {
        GroupRule {
            rule_type: rule_type.into(),
            object_type: RuleObject::Item,
            discount_pct: Some(pct),
        }
    }

    #[test]
    fn test_explicit_special_price_wins() {
        let special = SpecialTerms {
            price: Some(42.0),
            discount_pct: Some(10.0),
        };
        let rules = vec![rule("S", 50.0)];
        let q = quote(
            &QuoteInputs {
                base_price: 100.0,
                special: Some(&special),
                rules: &rules,
                promo_pct: Some(5.0),
            },
            AggregationMode::Highest,
        );
        assert_eq!(q.source, PriceSource::SpecialPrice);
        assert_eq!(q.final_price, 42.0);
        assert_eq!(q.group_discount, Some(50.0));
        assert_eq!(q.winning_rule_type, None);
    }

    #[test]
    fn test_zero_special_price_uses_special_discount() {
        let special = SpecialTerms {
            price: Some(0.0),
            discount_pct: Some(20.0),
        };
        let q = quote(
            &QuoteInputs {
                base_price: 50.0,
                special: Some(&special),
                ..Default::default()
            },
            AggregationMode::Highest,
        );
        assert_eq!(q.source, PriceSource::SpecialDiscount);
        assert_eq!(q.final_price, 40.0);
    }

    #[test]
    fn test_group_discount_sum_capped() {
        let rules = vec![rule("S", 60.0), rule("C", 70.0)];
        let q = quote(
            &QuoteInputs {
                base_price: 80.0,
                rules: &rules,
                ..Default::default()
            },
            AggregationMode::SumCapped,
        );
        assert_eq!(q.group_discount, Some(100.0));
        assert_eq!(q.final_price, 0.0);
        assert_eq!(q.winning_rule_type.as_deref(), Some("C"));
    }

    #[test]
    fn test_group_discount_mixed_compounds() {
        let rules = vec![rule("S", 50.0), rule("C", 50.0)];
        let q = quote(
            &QuoteInputs {
                base_price: 100.0,
                rules: &rules,
                ..Default::default()
            },
            AggregationMode::Compounding,
        );
        assert_eq!(q.group_discount, Some(75.0));
        assert_eq!(q.final_price, 25.0);
        assert_eq!(q.source.label(), "Discount groups (mixed)");
        // equal percentages: rule type decides
        assert_eq!(q.winning_rule_type.as_deref(), Some("C"));
    }

    #[test]
    fn test_promotion_only_without_groups() {
        let q = quote(
            &QuoteInputs {
                base_price: 10.0,
                promo_pct: Some(10.0),
                ..Default::default()
            },
            AggregationMode::Highest,
        );
        assert_eq!(q.source, PriceSource::Promotion);
        assert_eq!(q.final_price, 9.0);
    }

    #[test]
    fn test_base_price_fallback() {
        let q = quote(
            &QuoteInputs {
                base_price: 12.34567,
                ..Default::default()
            },
            AggregationMode::Highest,
        );
        assert_eq!(q.source, PriceSource::BasePriceList);
        assert_eq!(q.final_price, 12.3457);
    }

    #[test]
    fn test_best_rule_lowest_mode() {
        let rules = vec![rule("S", 30.0), rule("C", 10.0)];
        assert_eq!(
            best_rule(&rules, AggregationMode::Lowest).unwrap().rule_type,
            "C"
        );
        assert_eq!(
            best_rule(&rules, AggregationMode::Highest).unwrap().rule_type,
            "S"
        );
    }
}
