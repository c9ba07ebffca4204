use crate::domain::model::{BatchReport, ExecutionResult, GeneratedStatement, UnitReport};
use crate::domain::ports::ConnectionPool;
use crate::utils::error::{IbmiError, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// 同一表格的語句，需依序執行
#[derive(Debug, Clone)]
pub struct StatementQueue {
    pub table_name: String,
    pub statements: Vec<GeneratedStatement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    FailFast,
    ContinueOnFailure,
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutorOptions {
    pub max_concurrent_tables: usize,
    pub policy: FailurePolicy,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            max_concurrent_tables: 1,
            policy: FailurePolicy::FailFast,
        }
    }
}

/// 各表格佇列平行執行，佇列內依序執行
pub async fn execute_query_queue<P>(
    pool: Arc<P>,
    queues: Vec<StatementQueue>,
    options: ExecutorOptions,
) -> Result<BatchReport>
where
    P: ConnectionPool + 'static,
{
    let permits = options.max_concurrent_tables.clamp(1, Semaphore::MAX_PERMITS);
    let semaphore = Arc::new(Semaphore::new(permits));
    let mut join_set = JoinSet::new();
    let unit_count = queues.len();

    for (slot, queue) in queues.into_iter().enumerate() {
        let pool = Arc::clone(&pool);
        let semaphore = Arc::clone(&semaphore);
        join_set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| IbmiError::execution(e.to_string()))?;
            run_queue(pool.as_ref(), queue, options.policy)
                .await
                .map(|report| (slot, report))
        });
    }

    let mut reports: Vec<Option<UnitReport>> = vec![None; unit_count];
    while let Some(joined) = join_set.join_next().await {
        let outcome = joined.map_err(|e| IbmiError::execution(format!("Statement task failed: {}", e)))?;
        match outcome {
            Ok((slot, report)) => reports[slot] = Some(report),
            Err(e) => {
                tracing::error!("Aborting remaining statements: {}", e);
                join_set.abort_all();
                return Err(e);
            }
        }
    }

    Ok(BatchReport {
        units: reports.into_iter().flatten().collect(),
    })
}

async fn run_queue<P>(pool: &P, queue: StatementQueue, policy: FailurePolicy) -> Result<UnitReport>
where
    P: ConnectionPool + ?Sized,
{
    let statements_total = queue.statements.len();
    let mut results = Vec::with_capacity(statements_total);

    for (position, statement) in queue.statements.iter().enumerate() {
        tracing::debug!(
            "Executing statement {}/{} for {}",
            position + 1,
            statements_total,
            queue.table_name
        );

        match pool.query(&statement.sql_text).await {
            Ok(rows) => results.push(ExecutionResult::Success { rows }),
            Err(e) if policy == FailurePolicy::ContinueOnFailure => {
                tracing::warn!(
                    "Statement {}/{} for {} failed, skipping the rest of this table: {}",
                    position + 1,
                    statements_total,
                    queue.table_name,
                    e
                );
                results.push(ExecutionResult::Failure {
                    message: e.to_string(),
                });
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(UnitReport {
        table_name: queue.table_name,
        statements_total,
        results,
    })
}
