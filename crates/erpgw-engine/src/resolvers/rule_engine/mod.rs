//! Discount-group rule-engine backend
//!
//! Everything is read in one batch; pricing and kit stock are then
//! resolved in memory per SKU.

mod sql;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use erpgw_core::pricing::kit::{roll_up_stock, StockCandidate, WarehouseStock};
use erpgw_core::pricing::model::round4;
use erpgw_core::pricing::rule_engine::{quote, GroupRule, QuoteInputs, RuleObject, SpecialTerms};
use erpgw_core::pricing::{AggregationMode, PriceStockItem, PriceStockRequest, PriceStockResult};
use erpgw_core::{GwError, GwErrorKind, ResultTable, Row, RowExt};
use erpgw_store::errors::Result;
use erpgw_store::{SqlExecutor, Statement};
use serde_json::{Map, Value};

use super::{take_set, Backend, PriceStockResolver, PricingSettings};

pub struct RuleEngineResolver {
    executor: Arc<dyn SqlExecutor>,
    settings: PricingSettings,
}

/// Customer-level settings read from the header set
#[derive(Debug, Clone, Default)]
struct Customer {
    found: bool,
    price_list: Option<i64>,
    mode: AggregationMode,
}

#[derive(Debug, Clone)]
struct BasePrice {
    price: Option<f64>,
    currency: Option<String>,
}

/// Rows of the batch, grouped per item
#[derive(Debug, Default)]
struct Snapshot {
    customer: Customer,
    base: HashMap<String, BasePrice>,
    specials: HashMap<String, SpecialTerms>,
    rules: HashMap<String, Vec<GroupRule>>,
    promos: HashMap<String, f64>,
    candidates: Vec<StockCandidate>,
}

impl RuleEngineResolver {
    pub fn new(executor: Arc<dyn SqlExecutor>, settings: PricingSettings) -> Self {
        Self { executor, settings }
    }

    fn statement(card_code: &str, as_of: &str, skus: &[String], warehouses: &[String]) -> Statement {
        Statement::new(sql::PRICE_STOCK_BATCH)
            .bind("cardCode", card_code)
            .bind("asOfDate", as_of)
            .bind_in_list("skus", "sku", skus)
            .bind_in_list("warehouses", "wh", warehouses)
    }
}

fn read_customer(rows: &ResultTable) -> Customer {
    let Some(row) = rows.first() else {
        return Customer::default();
    };
    Customer {
        found: row.int("Found").unwrap_or(0) > 0,
        price_list: row.int("ListNum"),
        mode: AggregationMode::from_code(row.text("DiscRel").as_deref()),
    }
}

fn read_rules(rows: &ResultTable) -> HashMap<String, Vec<GroupRule>> {
    let mut rules: HashMap<String, Vec<GroupRule>> = HashMap::new();
    for row in rows {
        let (Some(item), Some(object_type)) = (
            row.text("ItemCode"),
            row.text("ObjType").as_deref().and_then(RuleObject::from_code),
        ) else {
            continue;
        };
        rules.entry(item).or_default().push(GroupRule {
            rule_type: row.text("RuleType").unwrap_or_default(),
            object_type,
            discount_pct: row.float("DiscountPct"),
        });
    }
    rules
}

/// Stock candidates for every requested SKU: its own rows, or one set of
/// rows per kit component
fn stock_candidates(skus: &[String], bills: &ResultTable, stock: &ResultTable) -> Vec<StockCandidate> {
    let mut kits: HashMap<String, Vec<Option<String>>> = HashMap::new();
    for row in bills {
        if let Some(parent) = row.text("Parent") {
            kits.entry(parent).or_default().push(row.text("Component"));
        }
    }

    let mut by_item: HashMap<String, Vec<&Row>> = HashMap::new();
    for row in stock {
        if let Some(item) = row.text("ItemCode") {
            by_item.entry(item).or_default().push(row);
        }
    }

    let mut candidates = Vec::new();
    for sku in skus {
        let components: Vec<String> = match kits.get(sku) {
            Some(children) => children.iter().flatten().cloned().collect(),
            None => vec![sku.clone()],
        };
        if components.is_empty() {
            candidates.push(StockCandidate {
                parent: sku.clone(),
                ..Default::default()
            });
            continue;
        }
        for component in components {
            match by_item.get(&component) {
                Some(rows) => candidates.extend(rows.iter().map(|r| StockCandidate {
                    parent: sku.clone(),
                    item_code: Some(component.clone()),
                    warehouse: r.text("WhsCode"),
                    on_hand: r.float("OnHand"),
                    on_order: r.float("OnOrder"),
                    committed: r.float("IsCommited"),
                })),
                None => candidates.push(StockCandidate {
                    parent: sku.clone(),
                    item_code: Some(component),
                    ..Default::default()
                }),
            }
        }
    }
    candidates
}

fn read_snapshot(mut sets: Vec<ResultTable>, skus: &[String]) -> Snapshot {
    let customer = read_customer(&take_set(&mut sets, sql::SET_HEADER));

    let base = take_set(&mut sets, sql::SET_BASE_PRICES)
        .iter()
        .filter_map(|r| {
            Some((
                r.text("ItemCode")?,
                BasePrice {
                    price: r.float("PriceListPrice"),
                    currency: r.text("Currency"),
                },
            ))
        })
        .collect();

    let mut specials = HashMap::new();
    for row in take_set(&mut sets, sql::SET_SPECIALS) {
        if let Some(item) = row.text("ItemCode") {
            // list-specific rows are ordered first
            specials.entry(item).or_insert_with(|| SpecialTerms {
                price: row.float("Price"),
                discount_pct: row.float("Discount"),
            });
        }
    }

    let rules = read_rules(&take_set(&mut sets, sql::SET_RULES));

    let promos = take_set(&mut sets, sql::SET_PROMOS)
        .iter()
        .filter_map(|r| Some((r.text("ItemCode")?, r.float("PromoDiscount")?)))
        .collect();

    let bills = take_set(&mut sets, sql::SET_KIT_BILLS);
    let stock = take_set(&mut sets, sql::SET_WAREHOUSE_STOCK);
    let candidates = stock_candidates(skus, &bills, &stock);

    Snapshot {
        customer,
        base,
        specials,
        rules,
        promos,
        candidates,
    }
}

fn price_item(item: &mut PriceStockItem, snapshot: &Snapshot, card_code: &str) {
    let Some(base) = snapshot.base.get(&item.sku) else {
        return;
    };
    let Some(base_price) = base.price else {
        return;
    };
    let special = snapshot.specials.get(&item.sku);
    let rules = snapshot
        .rules
        .get(&item.sku)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let promo_pct = snapshot.promos.get(&item.sku).copied();
    let mode = snapshot.customer.mode;

    let q = quote(
        &QuoteInputs {
            base_price,
            special,
            rules,
            promo_pct,
        },
        mode,
    );

    item.put_price("priceListPrice", Some(q.base_price));
    item.put_price("specialPrice", special.and_then(|s| s.price).map(round4));
    item.put_price("specialDiscount", special.and_then(|s| s.discount_pct).map(round4));
    item.put_price("groupDiscount", q.group_discount);
    item.put_price("promoDiscount", promo_pct.map(round4));
    item.put_price("finalPrice", Some(q.final_price));

    item.put_detail("cardCode", card_code);
    item.put_detail("priceList", snapshot.customer.price_list);
    item.put_detail("currency", base.currency.clone());
    item.put_detail("priceSource", q.source.label());
    item.put_detail("discountMode", mode.label());
    item.put_detail("oedgType", q.winning_rule_type.clone());
    if let Some(object) = q.winning_rule_object {
        item.put_detail("ruleObject", object.label());
    }
}

fn stock_item(item: &mut PriceStockItem, per_warehouse: &BTreeMap<String, WarehouseStock>) {
    let mut on_order = Map::new();
    let mut committed = Map::new();
    let mut limiting = Map::new();
    for (warehouse, stock) in per_warehouse {
        if let Some(on_hand) = stock.on_hand {
            item.stock_by_warehouse.insert(warehouse.clone(), on_hand);
        }
        on_order.insert(warehouse.clone(), stock.on_order.into());
        committed.insert(warehouse.clone(), stock.committed.into());
        if stock.limiting_item != item.sku {
            limiting.insert(warehouse.clone(), Value::from(stock.limiting_item.as_str()));
        }
    }
    if !per_warehouse.is_empty() {
        item.put_detail("onOrder", on_order);
        item.put_detail("committed", committed);
    }
    if !limiting.is_empty() {
        item.put_detail("limitingComponent", limiting);
    }
}

#[async_trait]
impl PriceStockResolver for RuleEngineResolver {
    fn backend(&self) -> Backend {
        Backend::Sap
    }

    async fn resolve(&self, request: &PriceStockRequest) -> Result<PriceStockResult> {
        let skus = request.skus_sorted();
        if skus.is_empty() {
            return Ok(PriceStockResult::default());
        }
        let card_code = request.account();
        if card_code.is_empty() {
            return Err(GwError::new(GwErrorKind::InvalidInput)
                .with_op("price_stock")
                .with_message("userExtId is required"));
        }
        let warehouses = request.warehouses_or(&self.settings.default_warehouses);
        let as_of = request.as_of_or_today().format("%Y-%m-%d").to_string();

        let sets = self
            .executor
            .query(&Self::statement(card_code, &as_of, &skus, &warehouses))
            .await?;
        let snapshot = read_snapshot(sets, &skus);
        if !snapshot.customer.found {
            tracing::warn!(
                component = module_path!(),
                card_code,
                "Unknown customer; items carry stock only"
            );
        }

        let stock = roll_up_stock(&snapshot.candidates, &warehouses);
        let items = skus
            .iter()
            .map(|sku| {
                let mut item = PriceStockItem::empty(sku.clone());
                price_item(&mut item, &snapshot, card_code);
                if let Some(per_warehouse) = stock.get(sku) {
                    stock_item(&mut item, per_warehouse);
                }
                item
            })
            .collect();

        Ok(PriceStockResult { items })
    }
}
