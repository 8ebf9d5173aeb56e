//! Cascading-discount backend
//!
//! Reads are issued per batch of SKUs, one statement per stage, then the
//! pure stages in `erpgw_core::pricing::cascade` run over the rows.

mod sql;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use erpgw_core::pricing::cascade::{
    apply_discount_rules, apply_price_floor, apply_price_list_override, apply_special_prices,
    clamp_prices, fold_stock, seed_states, select_last_prices, to_item, CatalogEntry,
    DiscountRule, ListPrices, PricingStates, SpecialPrice, StockMovement, TransactedPrice,
    TransactionSource,
};
use erpgw_core::pricing::{
    PriceStockItem, PriceStockRequest, PriceStockResult, Provenance, StockByWarehouse,
};
use erpgw_core::{ResultTable, RowExt};
use erpgw_store::errors::Result;
use erpgw_store::{SqlExecutor, Statement};

use super::{take_set, Backend, PriceStockResolver, PricingSettings};

pub struct CascadeResolver {
    executor: Arc<dyn SqlExecutor>,
    settings: PricingSettings,
}

impl CascadeResolver {
    pub fn new(executor: Arc<dyn SqlExecutor>, settings: PricingSettings) -> Self {
        Self { executor, settings }
    }

    async fn fetch(&self, statement: Statement) -> Result<ResultTable> {
        let mut sets = self.executor.query(&statement).await?;
        Ok(take_set(&mut sets, 0))
    }

    async fn parent_account(&self, account: &str) -> Result<Option<String>> {
        let rows = self
            .fetch(Statement::new(sql::PARENT_ACCOUNT).bind("account", account))
            .await?;
        Ok(rows
            .first()
            .and_then(|r| r.text("ParentAccount"))
            .filter(|parent| parent != account))
    }

    async fn catalog(&self, skus: &[String], as_of: &str) -> Result<Vec<CatalogEntry>> {
        let rows = self
            .fetch(
                Statement::new(sql::CATALOG)
                    .bind("asOf", as_of)
                    .bind_in_list("skus", "sku", skus),
            )
            .await?;
        Ok(rows
            .iter()
            .filter_map(|r| {
                Some(CatalogEntry {
                    sku: r.text("ItemKey")?,
                    item_price: r.float("ItemPrice"),
                    currency: r.text("Coin"),
                    vat_exempt: r.flag("VatExampt"),
                    discount_code: r.text("DiscountCode"),
                    price_list: r.int("PriceListNumber"),
                    list_price: r.float("ListPrice"),
                    list_currency: r.text("ListCoin"),
                })
            })
            .collect())
    }

    /// Apply `owner`'s discount rules; returns how many SKUs they resolved
    async fn apply_rules(
        &self,
        states: &mut PricingStates,
        skus: &[String],
        owner: &str,
        provenance: Provenance,
        as_of: &str,
    ) -> Result<usize> {
        let rows = self
            .fetch(
                Statement::new(sql::DISCOUNT_RULES)
                    .bind("account", owner)
                    .bind_in_list("skus", "sku", skus),
            )
            .await?;
        let rules: Vec<DiscountRule> = rows
            .iter()
            .filter_map(|r| {
                Some(DiscountRule {
                    discount_code: r.text("DiscountCode")?,
                    price_list: r.int("PriceListNumber")?,
                    discount_pct: r.float("DiscountPrc").unwrap_or(0.0),
                })
            })
            .collect();
        if rules.is_empty() {
            return Ok(0);
        }

        let lists: Vec<i64> = rules
            .iter()
            .map(|r| r.price_list)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let list_prices = self.list_prices(skus, &lists, as_of).await?;
        let resolved = apply_discount_rules(states, &rules, &list_prices, provenance);
        tracing::debug!(
            component = module_path!(),
            rules = rules.len(),
            resolved,
            provenance = provenance.tag(),
            "Discount rules applied"
        );
        Ok(resolved)
    }

    async fn list_prices(&self, skus: &[String], lists: &[i64], as_of: &str) -> Result<ListPrices> {
        let rows = self
            .fetch(
                Statement::new(sql::LIST_PRICES)
                    .bind("asOf", as_of)
                    .bind_in_list("skus", "sku", skus)
                    .bind_in_list("lists", "pl", lists),
            )
            .await?;
        Ok(rows
            .iter()
            .filter_map(|r| {
                Some((
                    (r.text("ItemKey")?, r.int("PriceListNumber")?),
                    r.float("Price")?,
                ))
            })
            .collect())
    }

    async fn special_prices(
        &self,
        skus: &[String],
        account: &str,
        parent: Option<&str>,
    ) -> Result<Vec<SpecialPrice>> {
        let rows = self
            .fetch(
                Statement::new(sql::SPECIAL_PRICES)
                    .bind("account", account)
                    .bind("parent", parent)
                    .bind_in_list("skus", "sku", skus),
            )
            .await?;
        Ok(rows
            .iter()
            .filter_map(|r| {
                Some(SpecialPrice {
                    sku: r.text("ItemKey")?,
                    account_id: r.text("AccountKey")?,
                    price: r.float("Price")?,
                    discount_pct: r.float("DiscountPrc").unwrap_or(0.0),
                    currency: r.text("Coin"),
                })
            })
            .collect())
    }

    async fn last_prices(
        &self,
        skus: &[String],
        account: &str,
    ) -> Result<HashMap<String, TransactedPrice>> {
        let invoice_doc = self.settings.invoice_document_id;
        let order_doc = self.settings.order_document_id;
        let rows = self
            .fetch(
                Statement::new(sql::LAST_PRICES)
                    .bind("account", account)
                    .bind("invoiceDoc", invoice_doc)
                    .bind("orderDoc", order_doc)
                    .bind_in_list("skus", "sku", skus),
            )
            .await?;
        let transactions = rows
            .iter()
            .filter_map(|r| {
                let source = match r.int("DocumentID")? {
                    doc if doc == invoice_doc => TransactionSource::Invoice,
                    doc if doc == order_doc => TransactionSource::Order,
                    _ => return None,
                };
                Some(TransactedPrice {
                    sku: r.text("ItemKey")?,
                    source,
                    price: r.float("Price")?,
                    date: r.text("ValueDate"),
                    tiebreak: r.int("LineId").unwrap_or(0),
                })
            })
            .collect();
        Ok(select_last_prices(transactions))
    }

    async fn stock(
        &self,
        skus: &[String],
        warehouses: &[String],
    ) -> Result<HashMap<String, StockByWarehouse>> {
        let rows = self
            .fetch(
                Statement::new(sql::STOCK)
                    .bind("orderDoc", self.settings.order_document_id)
                    .bind(
                        "excludedOrders",
                        format!("{}%", self.settings.excluded_order_prefix),
                    )
                    .bind_in_list("skus", "sku", skus)
                    .bind_in_list("warehouses", "wh", warehouses),
            )
            .await?;
        let movements: Vec<StockMovement> = rows
            .iter()
            .filter_map(|r| {
                Some(StockMovement {
                    sku: r.text("ItemKey")?,
                    warehouse: r.text("Warehouse")?,
                    on_hand: r.float("OnHand").unwrap_or(0.0),
                    open_orders: r.float("OpenOrders").unwrap_or(0.0),
                })
            })
            .collect();
        Ok(fold_stock(&movements))
    }
}

#[async_trait]
impl PriceStockResolver for CascadeResolver {
    fn backend(&self) -> Backend {
        Backend::Hasavshevet
    }

    async fn resolve(&self, request: &PriceStockRequest) -> Result<PriceStockResult> {
        let skus = request.skus_first_seen();
        if skus.is_empty() {
            return Ok(PriceStockResult::default());
        }
        let account = request.account();
        let warehouses = request.warehouses_or(&self.settings.default_warehouses);
        let document_id = request.document_id();
        let as_of = request.as_of_or_today().format("%Y-%m-%d").to_string();

        let parent = if account.is_empty() {
            None
        } else {
            self.parent_account(account).await?
        };

        let catalog = self.catalog(&skus, &as_of).await?;
        let mut states = seed_states(&skus, &catalog);

        if !account.is_empty() {
            let resolved = self
                .apply_rules(&mut states, &skus, account, Provenance::AccountDiscount, &as_of)
                .await?;
            if resolved == 0 {
                if let Some(parent) = parent.as_deref() {
                    self.apply_rules(&mut states, &skus, parent, Provenance::ParentDiscount, &as_of)
                        .await?;
                }
            }

            let specials = self.special_prices(&skus, account, parent.as_deref()).await?;
            apply_special_prices(&mut states, &specials, account, parent.as_deref());

            let last = self.last_prices(&skus, account).await?;
            apply_price_floor(&mut states, &last);
            apply_price_list_override(&mut states, &last, self.settings.last_price_price_list);
        }
        clamp_prices(&mut states);

        let stock = self.stock(&skus, &warehouses).await?;

        let items = skus
            .iter()
            .map(|sku| match states.get(sku) {
                Some(state) => {
                    let mut item = to_item(state, stock.get(sku));
                    if state.known {
                        item.put_detail("documentId", document_id);
                        item.put_detail("accountId", account);
                        if let Some(parent) = &parent {
                            item.put_detail("parentAccountId", parent.as_str());
                        }
                    }
                    item
                }
                None => PriceStockItem::empty(sku.clone()),
            })
            .collect();

        Ok(PriceStockResult { items })
    }
}
