#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use erpgw_core::{GwError, ResultTable, SqlValue};
use erpgw_store::errors::Result;
use erpgw_store::{RowCollector, SqlExecutor, Statement};
use serde_json::Value;

/// Build a result set from a JSON array of objects
pub fn table(rows: Value) -> ResultTable {
    rows.as_array()
        .expect("table fixture must be an array")
        .iter()
        .map(|r| r.as_object().expect("row fixture must be an object").clone())
        .collect()
}

struct Route {
    needle: String,
    param: Option<(String, SqlValue)>,
    response: std::result::Result<Vec<ResultTable>, GwError>,
}

/// In-memory executor answering by statement text
///
/// The first route whose needle occurs in the statement text (and whose
/// parameter matches, if given) answers. Unrouted statements return no
/// result sets. Every statement is recorded.
#[derive(Default)]
pub struct ScriptedExecutor {
    routes: Vec<Route>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Statement>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, needle: &str, sets: Vec<ResultTable>) -> Self {
        self.routes.push(Route {
            needle: needle.to_string(),
            param: None,
            response: Ok(sets),
        });
        self
    }

    pub fn on_param(
        mut self,
        needle: &str,
        name: &str,
        value: impl Into<SqlValue>,
        sets: Vec<ResultTable>,
    ) -> Self {
        self.routes.push(Route {
            needle: needle.to_string(),
            param: Some((name.to_string(), value.into())),
            response: Ok(sets),
        });
        self
    }

    pub fn fail(mut self, needle: &str, err: GwError) -> Self {
        self.routes.push(Route {
            needle: needle.to_string(),
            param: None,
            response: Err(err),
        });
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Statement> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SqlExecutor for ScriptedExecutor {
    async fn query(&self, statement: &Statement) -> Result<Vec<ResultTable>> {
        self.calls.lock().unwrap().push(statement.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let route = self.routes.iter().find(|r| {
            statement.text.contains(&r.needle)
                && r.param
                    .as_ref()
                    .map_or(true, |(name, value)| statement.param(name) == Some(value))
        });
        let sets = match route {
            Some(route) => route.response.clone()?,
            None => Vec::new(),
        };

        // same cap semantics as the real executor
        let mut collector = RowCollector::new(statement.max_rows);
        for set in sets {
            collector.start_table();
            for row in set {
                collector.push_row(row)?;
            }
        }
        Ok(collector.finish())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
