//! Kit (bill-of-materials) stock roll-up
//!
//! A kit has no stock of its own. Per warehouse it is as available as its
//! scarcest component.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Stock figures for one item in one warehouse
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentStock {
    pub item_code: String,
    pub on_hand: Option<f64>,
    pub on_order: Option<f64>,
    pub committed: Option<f64>,
}

/// One stock row as read back: the requested SKU, the item whose stock
/// counts for it (itself, or one kit component) and a warehouse row if any
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockCandidate {
    pub parent: String,
    pub item_code: Option<String>,
    pub warehouse: Option<String>,
    pub on_hand: Option<f64>,
    pub on_order: Option<f64>,
    pub committed: Option<f64>,
}

/// Resolved stock of a requested SKU in one warehouse
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarehouseStock {
    pub on_hand: Option<f64>,
    pub on_order: Option<f64>,
    pub committed: Option<f64>,
    /// Component that set the figure (the SKU itself for plain items)
    pub limiting_item: String,
}

/// The component with the lowest on-hand quantity. Unknown quantities sort
/// last; on a tie the earlier component wins.
pub fn scarcest_component(components: &[ComponentStock]) -> Option<&ComponentStock> {
    components.iter().min_by(|a, b| by_on_hand_nulls_last(a.on_hand, b.on_hand))
}

fn by_on_hand_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Per requested SKU and warehouse, the stock of its scarcest component.
///
/// SKUs with no components (a kit with an empty bill) get no entry.
pub fn roll_up_stock(
    candidates: &[StockCandidate],
    warehouses: &[String],
) -> HashMap<String, BTreeMap<String, WarehouseStock>> {
    let mut components: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for c in candidates {
        let entry = components.entry(c.parent.as_str()).or_default();
        if let Some(code) = c.item_code.as_deref() {
            if !entry.contains(&code) {
                entry.push(code);
            }
        }
    }

    let mut out = HashMap::new();
    for (parent, codes) in components {
        if codes.is_empty() {
            continue;
        }
        let mut per_warehouse = BTreeMap::new();
        for wh in warehouses {
            let stocks: Vec<ComponentStock> = codes
                .iter()
                .map(|code| component_in(candidates, parent, code, wh))
                .collect();
            if let Some(best) = scarcest_component(&stocks) {
                per_warehouse.insert(
                    wh.clone(),
                    WarehouseStock {
                        on_hand: best.on_hand,
                        on_order: best.on_order,
                        committed: best.committed,
                        limiting_item: best.item_code.clone(),
                    },
                );
            }
        }
        out.insert(parent.to_string(), per_warehouse);
    }
    out
}

fn component_in(
    candidates: &[StockCandidate],
    parent: &str,
    code: &str,
    warehouse: &str,
) -> ComponentStock {
    let row = candidates.iter().find(|c| {
        c.parent == parent
            && c.item_code.as_deref() == Some(code)
            && c.warehouse.as_deref().map(str::trim) == Some(warehouse)
    });
    ComponentStock {
        item_code: code.to_string(),
        on_hand: row.and_then(|r| r.on_hand),
        on_order: row.and_then(|r| r.on_order),
        committed: row.and_then(|r| r.committed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp(code: &str, on_hand: Option<f64>) -> ComponentStock {
        ComponentStock {
            item_code: code.into(),
            on_hand,
            ..Default::default()
        }
    }

    fn cand(parent: &str, code: &str, wh: &str, on_hand: f64) -> StockCandidate {
        StockCandidate {
            parent: parent.into(),
            item_code: Some(code.into()),
            warehouse: Some(wh.into()),
            on_hand: Some(on_hand),
            on_order: Some(1.0),
            committed: Some(0.0),
        }
    }

    #[test]
    fn test_scarcest_nulls_last() {
        let comps = vec![comp("a", None), comp("b", Some(7.0)), comp("c", Some(3.0))];
        assert_eq!(scarcest_component(&comps).unwrap().item_code, "c");
    }

    #[test]
    fn test_scarcest_tie_keeps_first() {
        let comps = vec![comp("a", Some(2.0)), comp("b", Some(2.0))];
        assert_eq!(scarcest_component(&comps).unwrap().item_code, "a");
    }

    #[test]
    fn test_scarcest_all_unknown() {
        let comps = vec![comp("a", None)];
        assert_eq!(scarcest_component(&comps).unwrap().on_hand, None);
        assert!(scarcest_component(&[]).is_none());
    }

    #[test]
    fn test_kit_limited_by_scarcest_component_per_warehouse() {
        let rows = vec![
            cand("KIT", "C1", "01", 10.0),
            cand("KIT", "C2", "01", 4.0),
            cand("KIT", "C1", "02", 1.0),
            cand("KIT", "C2", "02", 9.0),
            cand("PLAIN", "PLAIN", "01", 6.0),
        ];
        let wh = vec!["01".to_string(), "02".to_string()];
        let stock = roll_up_stock(&rows, &wh);

        assert_eq!(stock["KIT"]["01"].on_hand, Some(4.0));
        assert_eq!(stock["KIT"]["01"].limiting_item, "C2");
        assert_eq!(stock["KIT"]["02"].on_hand, Some(1.0));
        assert_eq!(stock["PLAIN"]["01"].on_hand, Some(6.0));
        assert_eq!(stock["PLAIN"]["02"].on_hand, None);
    }

    #[test]
    fn test_component_missing_in_warehouse_is_unknown() {
        let rows = vec![
            cand("KIT", "C1", "01", 5.0),
            StockCandidate {
                parent: "KIT".into(),
                item_code: Some("C2".into()),
                ..Default::default()
            },
        ];
        let stock = roll_up_stock(&rows, &["01".to_string()]);
        assert_eq!(stock["KIT"]["01"].on_hand, Some(5.0));
    }

    #[test]
    fn test_empty_bill_has_no_entry() {
        let rows = vec![StockCandidate {
            parent: "KIT".into(),
            ..Default::default()
        }];
        assert!(roll_up_stock(&rows, &["01".to_string()]).is_empty());
    }
}
