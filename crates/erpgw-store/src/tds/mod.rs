//! SQL Server backend for [`SqlExecutor`](crate::SqlExecutor)

pub mod binding;
pub mod convert;
pub mod pool;

use std::time::Instant;

use async_trait::async_trait;
use erpgw_core::{log_op_end, log_op_error, log_op_start, GwErrorKind, ResultTable, SqlValue};
use futures::TryStreamExt;
use tiberius::{Query, QueryItem, QueryStream};

use crate::collect::RowCollector;
use crate::errors::{from_tiberius, unavailable, Result};
use crate::executor::{SqlExecutor, Statement};
use crate::params::ConnectionParams;
use erpgw_core_types::Sensitive;

pub use pool::{Lease, TdsClient, TdsPool};

const OP_QUERY: &str = "db_query";

pub struct TdsExecutor {
    pool: TdsPool,
    target: String,
}

impl std::fmt::Debug for TdsExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TdsExecutor")
            .field("target", &self.target)
            .field("status", &self.pool.status())
            .finish()
    }
}

/// Build the pool and verify connectivity with a single ping
///
/// # Errors
///
/// `Config` for unusable pool settings, `ResourceUnavailable` when the
/// first connection cannot be made.
pub async fn open(params: &ConnectionParams, password: &Sensitive<String>) -> Result<TdsExecutor> {
    let started = Instant::now();
    log_op_start!("db_open", target = %params.display_target());

    let pool = pool::build_pool(params, params.to_config(password))?;
    let executor = TdsExecutor {
        pool,
        target: params.display_target(),
    };
    if let Err(err) = executor.ping().await {
        log_op_error!("db_open", err.clone(), duration_ms = started.elapsed().as_millis() as u64);
        return Err(err);
    }

    log_op_end!(
        "db_open",
        duration_ms = started.elapsed().as_millis() as u64,
        max_open = params.max_open
    );
    Ok(executor)
}

impl TdsExecutor {
    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl SqlExecutor for TdsExecutor {
    async fn query(&self, statement: &Statement) -> Result<Vec<ResultTable>> {
        let started = Instant::now();
        let mut lease = Lease::acquire(&self.pool).await?;
        let tables = run(lease.client()?, statement).await?;
        lease.release();

        tracing::debug!(
            component = module_path!(),
            op = OP_QUERY,
            result_sets = tables.len(),
            duration_ms = started.elapsed().as_millis() as u64,
        );
        Ok(tables)
    }

    async fn ping(&self) -> Result<()> {
        let statement = Statement::new("SELECT 1 AS ok");
        match self.query(&statement).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == GwErrorKind::Execution => {
                Err(unavailable("ping", err.detail().unwrap_or_else(|| err.message())))
            }
            Err(err) => Err(err),
        }
    }

    async fn close(&self) {
        self.pool.close();
        tracing::info!(component = module_path!(), target = %self.target, "Database pool closed");
    }
}

async fn run(client: &mut TdsClient, statement: &Statement) -> Result<Vec<ResultTable>> {
    let rendered = binding::render(&statement.text, &statement.params);
    let stream = if rendered.values.is_empty() {
        client.simple_query(rendered.sql).await
    } else {
        let mut query = Query::new(rendered.sql);
        for value in rendered.values {
            bind(&mut query, value);
        }
        query.query(client).await
    }
    .map_err(|e| from_tiberius(OP_QUERY, e))?;

    collect(stream, statement.max_rows).await
}

fn bind(query: &mut Query<'_>, value: SqlValue) {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
    }
}

async fn collect(mut stream: QueryStream<'_>, max_rows: Option<usize>) -> Result<Vec<ResultTable>> {
    let mut collector = RowCollector::new(max_rows);
    while let Some(item) = stream
        .try_next()
        .await
        .map_err(|e| from_tiberius(OP_QUERY, e))?
    {
        match item {
            QueryItem::Metadata(_) => collector.start_table(),
            QueryItem::Row(row) => collector.push_row(convert::row_to_json(row))?,
        }
    }
    Ok(collector.finish())
}
