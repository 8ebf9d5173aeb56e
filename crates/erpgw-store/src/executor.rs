//! The data-access seam
//!
//! Everything above the store talks to the database through
//! [`SqlExecutor`], so the gate, the pricing strategies and the HTTP layer
//! can all be exercised against an in-memory fake.

use async_trait::async_trait;
use erpgw_core::{ResultTable, SqlValue};

use crate::errors::Result;

/// A statement plus its named parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub text: String,
    /// Names without the `@` sigil, in binding order
    pub params: Vec<(String, SqlValue)>,
    /// Hard cap on rows summed over all result sets
    pub max_rows: Option<usize>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn bind_all(mut self, params: Vec<(String, SqlValue)>) -> Self {
        self.params.extend(params);
        self
    }

    /// Replace every `{marker}` in the text with `@prefix_0, @prefix_1, ...`
    /// and bind one parameter per value.
    ///
    /// An empty list renders as `NULL` so `IN ({marker})` stays valid and
    /// matches nothing.
    pub fn bind_in_list<V>(mut self, marker: &str, prefix: &str, values: &[V]) -> Self
    where
        V: Clone + Into<SqlValue>,
    {
        let placeholders = if values.is_empty() {
            "NULL".to_string()
        } else {
            (0..values.len())
                .map(|i| format!("@{}_{}", prefix, i))
                .collect::<Vec<_>>()
                .join(", ")
        };
        self.text = self.text.replace(&format!("{{{}}}", marker), &placeholders);
        for (i, value) in values.iter().enumerate() {
            self.params
                .push((format!("{}_{}", prefix, i), value.clone().into()));
        }
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Look up a bound parameter by name
    pub fn param(&self, name: &str) -> Option<&SqlValue> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Executes statements against the ERP database
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run a statement and return every result set it produced, in order.
    ///
    /// # Errors
    ///
    /// `ResourceUnavailable` when no connection can be had, `Execution` for
    /// database-reported failures and `RowLimitExceeded` when
    /// `statement.max_rows` is exceeded.
    async fn query(&self, statement: &Statement) -> Result<Vec<ResultTable>>;

    /// Live connectivity probe
    ///
    /// # Errors
    ///
    /// `ResourceUnavailable` when the database cannot be reached.
    async fn ping(&self) -> Result<()>;

    /// Release pooled resources. Further queries fail.
    async fn close(&self) {}
}
