//! Cascading-discount pricing stages
//!
//! Each stage takes rows already read from the ERP and mutates the per-SKU
//! accumulators. The engine runs them in order: discount rules (account,
//! then parent), special prices, last-price floor, sentinel price list,
//! clamp. The resulting precedence is special price > account discount >
//! parent discount > base price, with the last transacted price acting as
//! a floor on all of them.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use super::discount::apply_discount;
use super::model::{ItemPricingState, PriceStockItem, Provenance, StockByWarehouse};

/// Catalog row with the most recent price-list entry already joined in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogEntry {
    pub sku: String,
    pub item_price: Option<f64>,
    pub currency: Option<String>,
    pub vat_exempt: bool,
    pub discount_code: Option<String>,
    pub price_list: Option<i64>,
    pub list_price: Option<f64>,
    pub list_currency: Option<String>,
}

/// An account's discount for every item carrying `discount_code`
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountRule {
    pub discount_code: String,
    pub price_list: i64,
    pub discount_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecialPrice {
    pub sku: String,
    pub account_id: String,
    pub price: f64,
    pub discount_pct: f64,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionSource {
    Invoice,
    Order,
}

impl TransactionSource {
    fn rank(&self) -> u8 {
        match self {
            TransactionSource::Invoice => 0,
            TransactionSource::Order => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionSource::Invoice => "invoice",
            TransactionSource::Order => "order",
        }
    }
}

/// A price previously charged to the account
#[derive(Debug, Clone, PartialEq)]
pub struct TransactedPrice {
    pub sku: String,
    pub source: TransactionSource,
    pub price: f64,
    /// ISO-8601 value date, compared lexically
    pub date: Option<String>,
    pub tiebreak: i64,
}

/// On-hand and open-order quantities for one (sku, warehouse) row
#[derive(Debug, Clone, PartialEq)]
pub struct StockMovement {
    pub sku: String,
    pub warehouse: String,
    pub on_hand: f64,
    pub open_orders: f64,
}

/// Most recent price per (sku, price list)
pub type ListPrices = HashMap<(String, i64), f64>;

pub type PricingStates = BTreeMap<String, ItemPricingState>;

/// One accumulator per requested SKU, filled from the catalog where the
/// item exists. The list price wins over the item's own price.
pub fn seed_states(skus: &[String], catalog: &[CatalogEntry]) -> PricingStates {
    let by_sku: HashMap<&str, &CatalogEntry> =
        catalog.iter().map(|c| (c.sku.as_str(), c)).collect();

    skus.iter()
        .map(|sku| {
            let mut state = ItemPricingState::new(sku.clone());
            if let Some(entry) = by_sku.get(sku.as_str()) {
                state.known = true;
                state.base_price = entry.list_price.or(entry.item_price);
                state.currency = entry
                    .list_currency
                    .clone()
                    .filter(|_| entry.list_price.is_some())
                    .or_else(|| entry.currency.clone());
                state.vat_exempt = entry.vat_exempt;
                state.discount_code = entry.discount_code.clone();
                state.price_list = entry.price_list;
                let base = state.base_price;
                state.set_price(base, Provenance::BasePrice);
            }
            (sku.clone(), state)
        })
        .collect()
}

/// Apply the first matching rule to every SKU not yet discount-resolved.
///
/// A rule matches when its discount code equals the item's. The price is
/// taken from the rule's price list, falling back to the base price.
/// Returns how many SKUs were resolved by this call.
pub fn apply_discount_rules(
    states: &mut PricingStates,
    rules: &[DiscountRule],
    list_prices: &ListPrices,
    provenance: Provenance,
) -> usize {
    let mut resolved = 0;
    for state in states.values_mut() {
        if state.discount_resolved {
            continue;
        }
        let Some(code) = state.discount_code.as_deref().map(str::trim) else {
            continue;
        };
        let Some(rule) = rules.iter().find(|r| r.discount_code.trim() == code) else {
            continue;
        };

        let price = list_prices
            .get(&(state.sku.clone(), rule.price_list))
            .copied()
            .or(state.base_price);
        state.base_price = price;
        state.price_list = Some(rule.price_list);
        state.discount_pct = rule.discount_pct;
        state.discount_resolved = true;
        state.set_price(price.map(|p| apply_discount(p, rule.discount_pct)), provenance);
        resolved += 1;
    }
    resolved
}

/// Override with the account's special price, else the parent's.
///
/// Supersedes any discount-rule price. Both the displayed base and the
/// effective price become the special price minus its own discount; the
/// discount amount is kept in `special_discount_amount`.
pub fn apply_special_prices(
    states: &mut PricingStates,
    specials: &[SpecialPrice],
    account_id: &str,
    parent_id: Option<&str>,
) {
    for state in states.values_mut() {
        let for_sku = |owner: &str| {
            specials
                .iter()
                .find(|s| s.sku == state.sku && s.account_id.trim() == owner)
        };
        let special = for_sku(account_id).or_else(|| parent_id.and_then(for_sku));
        let Some(special) = special else {
            continue;
        };

        let discounted = apply_discount(special.price, special.discount_pct);
        state.base_price = Some(discounted);
        state.discount_pct = special.discount_pct;
        state.special_price = true;
        state.special_discount_amount = Some(special.price - discounted);
        if let Some(currency) = &special.currency {
            state.currency = Some(currency.clone());
        }
        state.set_price(Some(discounted), Provenance::SpecialPrice);
    }
}

/// Pick one last transacted price per SKU: invoices before orders, then
/// the latest date, then the highest tiebreak.
pub fn select_last_prices(rows: Vec<TransactedPrice>) -> HashMap<String, TransactedPrice> {
    let mut best: HashMap<String, TransactedPrice> = HashMap::new();
    for row in rows {
        match best.get(&row.sku) {
            Some(current) if compare_transactions(&row, current) != Ordering::Less => {}
            _ => {
                best.insert(row.sku.clone(), row);
            }
        }
    }
    best
}

/// `Less` means `a` is preferred over `b`
fn compare_transactions(a: &TransactedPrice, b: &TransactedPrice) -> Ordering {
    a.source
        .rank()
        .cmp(&b.source.rank())
        .then_with(|| b.date.cmp(&a.date))
        .then_with(|| b.tiebreak.cmp(&a.tiebreak))
}

/// Report the last transacted price when it undercuts the resolved price.
/// The pre-floor price stays available as the nominal price.
pub fn apply_price_floor(states: &mut PricingStates, last: &HashMap<String, TransactedPrice>) {
    for state in states.values_mut() {
        let Some(tx) = last.get(&state.sku) else {
            continue;
        };
        state.last_price = Some(tx.price);
        if let Some(current) = state.resolved_price {
            if tx.price < current {
                state.resolved_price = Some(tx.price);
                state.provenance = Provenance::LastPrice;
            }
        }
    }
}

/// Items on the sentinel price list always sell at their last price
pub fn apply_price_list_override(
    states: &mut PricingStates,
    last: &HashMap<String, TransactedPrice>,
    sentinel_price_list: i64,
) {
    for state in states.values_mut() {
        if state.price_list != Some(sentinel_price_list) {
            continue;
        }
        if let Some(tx) = last.get(&state.sku) {
            state.last_price = Some(tx.price);
            state.resolved_price = Some(tx.price);
            state.provenance = Provenance::LastPricePriceList;
        }
    }
}

/// Negative prices clamp to zero
pub fn clamp_prices(states: &mut PricingStates) {
    for state in states.values_mut() {
        state.resolved_price = state.resolved_price.map(|p| p.max(0.0));
        state.nominal_price = state.nominal_price.map(|p| p.max(0.0));
    }
}

/// Net stock per SKU and warehouse: on-hand minus open orders, summed
/// over all matching rows.
pub fn fold_stock(rows: &[StockMovement]) -> HashMap<String, StockByWarehouse> {
    let mut stock: HashMap<String, StockByWarehouse> = HashMap::new();
    for row in rows {
        *stock
            .entry(row.sku.clone())
            .or_default()
            .entry(row.warehouse.clone())
            .or_insert(0.0) += row.on_hand - row.open_orders;
    }
    stock
}

/// Render a finished accumulator as an answer entry
pub fn to_item(state: &ItemPricingState, stock: Option<&StockByWarehouse>) -> PriceStockItem {
    let mut item = PriceStockItem::empty(state.sku.clone());
    if let Some(stock) = stock {
        item.stock_by_warehouse = stock.clone();
    }
    if !state.known {
        return item;
    }

    item.put_price("price", state.base_price);
    item.put_price("priceAfterDiscount", state.nominal_price);
    item.put_price("finalPrice", state.resolved_price);
    item.put_price("lastPrice", state.last_price);

    item.put_detail("provenance", state.provenance.tag());
    if let Some(currency) = &state.currency {
        item.put_detail("currency", currency.as_str());
    }
    item.put_detail("discountPrc", state.discount_pct);
    if let Some(list) = state.price_list {
        item.put_detail("priceList", list);
    }
    item.put_detail("specialPrice", state.special_price);
    if let Some(amount) = state.special_discount_amount {
        item.put_detail("specialDiscountAmount", amount);
    }
    item.put_detail("vatExempt", state.vat_exempt);
    item
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(sku: &str, price: f64, code: &str) -> CatalogEntry {
        CatalogEntry {
            sku: sku.into(),
            item_price: Some(price),
            currency: Some("ILS".into()),
            discount_code: Some(code.into()),
            ..Default::default()
        }
    }

    fn tx(source: TransactionSource, date: &str, tiebreak: i64, price: f64) -> TransactedPrice {
        TransactedPrice {
            sku: "A".into(),
            source,
            price,
            date: Some(date.into()),
            tiebreak,
        }
    }

    #[test]
    fn test_seed_prefers_list_price() {
        let mut entry = catalog("A", 100.0, "D1");
        entry.list_price = Some(90.0);
        entry.price_list = Some(3);
        let states = seed_states(&["A".into(), "B".into()], &[entry]);

        assert_eq!(states["A"].resolved_price, Some(90.0));
        assert_eq!(states["A"].price_list, Some(3));
        assert!(!states["B"].known);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let mut states = seed_states(&["A".into()], &[catalog("A", 100.0, "D1")]);
        let rules = vec![
            DiscountRule {
                discount_code: "D1".into(),
                price_list: 2,
                discount_pct: 10.0,
            },
            DiscountRule {
                discount_code: "D1".into(),
                price_list: 3,
                discount_pct: 50.0,
            },
        ];
        let mut list_prices = ListPrices::new();
        list_prices.insert(("A".into(), 2), 80.0);

        let n = apply_discount_rules(&mut states, &rules, &list_prices, Provenance::AccountDiscount);

        assert_eq!(n, 1);
        let a = &states["A"];
        assert_eq!(a.base_price, Some(80.0));
        assert_eq!(a.resolved_price, Some(72.0));
        assert_eq!(a.provenance, Provenance::AccountDiscount);
        assert!(a.discount_resolved);
    }

    #[test]
    fn test_resolved_sku_is_not_rediscounted() {
        let mut states = seed_states(&["A".into()], &[catalog("A", 100.0, "D1")]);
        let rules = vec![DiscountRule {
            discount_code: "D1".into(),
            price_list: 1,
            discount_pct: 10.0,
        }];
        apply_discount_rules(&mut states, &rules, &ListPrices::new(), Provenance::AccountDiscount);
        let n = apply_discount_rules(&mut states, &rules, &ListPrices::new(), Provenance::ParentDiscount);
        assert_eq!(n, 0);
        assert_eq!(states["A"].provenance, Provenance::AccountDiscount);
    }

    #[test]
    fn test_special_price_falls_back_to_parent() {
        let mut states = seed_states(&["A".into()], &[catalog("A", 100.0, "D1")]);
        let specials = vec![SpecialPrice {
            sku: "A".into(),
            account_id: "P1".into(),
            price: 60.0,
            discount_pct: 50.0,
            currency: None,
        }];
        apply_special_prices(&mut states, &specials, "C1", Some("P1"));

        let a = &states["A"];
        assert_eq!(a.base_price, Some(30.0));
        assert_eq!(a.resolved_price, Some(30.0));
        assert_eq!(a.special_discount_amount, Some(30.0));
        assert_eq!(a.provenance, Provenance::SpecialPrice);
    }

    #[test]
    fn test_last_price_prefers_invoice_then_date_then_tiebreak() {
        let rows = vec![
            tx(TransactionSource::Order, "2024-06-01", 9, 1.0),
            tx(TransactionSource::Invoice, "2024-01-01", 1, 2.0),
            tx(TransactionSource::Invoice, "2024-03-01", 1, 3.0),
            tx(TransactionSource::Invoice, "2024-03-01", 5, 4.0),
        ];
        let best = select_last_prices(rows);
        assert_eq!(best["A"].price, 4.0);
    }

    #[test]
    fn test_floor_only_applies_when_lower() {
        let mut states = seed_states(&["A".into()], &[catalog("A", 100.0, "D1")]);
        let mut last = HashMap::new();
        last.insert("A".to_string(), tx(TransactionSource::Invoice, "2024-01-01", 1, 120.0));
        apply_price_floor(&mut states, &last);
        assert_eq!(states["A"].resolved_price, Some(100.0));
        assert_eq!(states["A"].provenance, Provenance::BasePrice);
        assert_eq!(states["A"].last_price, Some(120.0));
    }

    #[test]
    fn test_sentinel_price_list_forces_last_price() {
        let mut entry = catalog("A", 100.0, "D1");
        entry.price_list = Some(99);
        let mut states = seed_states(&["A".into()], &[entry]);
        let mut last = HashMap::new();
        last.insert("A".to_string(), tx(TransactionSource::Order, "2024-01-01", 1, 130.0));

        apply_price_list_override(&mut states, &last, 99);

        assert_eq!(states["A"].resolved_price, Some(130.0));
        assert_eq!(states["A"].provenance, Provenance::LastPricePriceList);
    }

    #[test]
    fn test_clamp_negative() {
        let mut states = seed_states(&["A".into()], &[catalog("A", -5.0, "D1")]);
        clamp_prices(&mut states);
        assert_eq!(states["A"].resolved_price, Some(0.0));
    }

    #[test]
    fn test_fold_stock_sums_per_warehouse() {
        let row = |wh: &str, on_hand: f64, open: f64| StockMovement {
            sku: "A".into(),
            warehouse: wh.into(),
            on_hand,
            open_orders: open,
        };
        let stock = fold_stock(&[row("10", 5.0, 2.0), row("10", 1.0, 0.0), row("20", 0.0, 3.0)]);
        assert_eq!(stock["A"]["10"], 4.0);
        assert_eq!(stock["A"]["20"], -3.0);
    }

    #[test]
    fn test_unknown_sku_renders_stock_only() {
        let states = seed_states(&["Z".into()], &[]);
        let mut stock = StockByWarehouse::new();
        stock.insert("10".into(), 2.0);
        let item = to_item(&states["Z"], Some(&stock));
        assert!(item.prices.is_empty());
        assert!(item.details.is_empty());
        assert_eq!(item.stock_by_warehouse["10"], 2.0);
    }
}
