//! Ad-hoc read-only query execution
//!
//! gate -> bind -> execute under a deadline, with the row cap enforced by
//! the executor while rows stream in.

use std::time::{Duration, Instant};

use erpgw_core::{evaluate, log_op_end, log_op_error, log_op_start, QueryRequest, ResultTable, Row};
use erpgw_store::errors::Result;
use erpgw_store::{SqlExecutor, Statement};

use super::deadline_exceeded;

const OP: &str = "adhoc_query";

pub const DEFAULT_MAX_ROWS: usize = 10_000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Total rows across all result sets
    pub max_rows: usize,
    pub timeout: Duration,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Every result set the query produced, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    pub recordsets: Vec<ResultTable>,
}

impl QueryOutcome {
    /// Rows of the first result set (empty when there is none)
    pub fn rows(&self) -> &[Row] {
        self.recordsets.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }
}

/// Validate and run one caller-supplied query.
///
/// # Errors
///
/// Validation kinds when the gate rejects the query (nothing executes),
/// `ExecutionTimeout` past `limits.timeout`, and whatever the executor
/// reports otherwise.
pub async fn run_adhoc_query(
    executor: &dyn SqlExecutor,
    request: &QueryRequest,
    limits: &QueryLimits,
) -> Result<QueryOutcome> {
    let started = Instant::now();
    log_op_start!(OP, param_count = request.parameters.len());

    let result = execute(executor, request, limits).await;
    let duration_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(outcome) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            result_sets = outcome.recordsets.len(),
            row_count = outcome.row_count()
        ),
        Err(err) => log_op_error!(OP, err.clone(), duration_ms = duration_ms),
    }
    result
}

async fn execute(
    executor: &dyn SqlExecutor,
    request: &QueryRequest,
    limits: &QueryLimits,
) -> Result<QueryOutcome> {
    let (text, args) = evaluate(request).into_result()?;
    let statement = Statement::new(text)
        .bind_all(args)
        .with_max_rows(limits.max_rows);

    match tokio::time::timeout(limits.timeout, executor.query(&statement)).await {
        Ok(recordsets) => Ok(QueryOutcome {
            recordsets: recordsets?,
        }),
        Err(_) => Err(deadline_exceeded(OP, limits.timeout)),
    }
}
