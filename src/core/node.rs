use crate::core::executor::{execute_query_queue, ExecutorOptions, FailurePolicy, StatementQueue};
use crate::core::grouping::group_records;
use crate::core::statement::build_statements;
use crate::domain::model::{Operation, PoolConfig, Record};
use crate::domain::ports::{ConnectionPool, Driver, NodeParameters};
use crate::utils::error::{IbmiError, Result};
use std::future::Future;
use std::sync::Arc;

/// 建立連線池、執行 `f`，不論成功或失敗都只關閉一次
pub async fn with_pool<D, F, Fut, T>(driver: &D, config: &PoolConfig, f: F) -> Result<T>
where
    D: Driver,
    F: FnOnce(Arc<D::Pool>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let pool = Arc::new(driver.pool(config).await?);
    tracing::debug!("Connection pool opened for {}", config.credentials.host);

    let outcome = f(Arc::clone(&pool)).await;

    if let Err(e) = pool.close().await {
        tracing::warn!("Failed to close connection pool: {}", e);
    } else {
        tracing::debug!("Connection pool closed");
    }
    outcome
}

/// IBM i 節點：依操作執行查詢或批次新增
pub struct IbmiNode<D: Driver, P: NodeParameters> {
    driver: D,
    params: P,
}

impl<D: Driver, P: NodeParameters> IbmiNode<D, P> {
    pub fn new(driver: D, params: P) -> Self {
        Self { driver, params }
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    pub async fn execute(&self, items: Vec<Record>) -> Result<Vec<Record>> {
        let credentials = self.params.credentials().ok_or(IbmiError::MissingCredentials)?;
        let config = PoolConfig::from(credentials);
        let operation_name = self.params.operation().to_string();
        let input = &items;

        let outcome = with_pool(&self.driver, &config, |pool| async move {
            match operation_name.parse::<Operation>()? {
                Operation::ExecuteQuery => self.execute_query(pool.as_ref()).await,
                Operation::Insert => self.insert(pool, input).await.map(|_| input.to_vec()),
            }
        })
        .await;

        match outcome {
            Ok(records) => Ok(records),
            Err(e) if e.is_recoverable() && self.params.continue_on_fail() => {
                tracing::warn!("Continuing after failure, returning input items: {}", e);
                Ok(items)
            }
            Err(e) => Err(e),
        }
    }

    async fn execute_query(&self, pool: &D::Pool) -> Result<Vec<Record>> {
        let raw_query = self.params.query().ok_or_else(|| IbmiError::MissingConfigError {
            field: "query".to_string(),
        })?;

        tracing::info!("Executing query");
        tracing::debug!("SQL: {}", raw_query);
        let rows = pool.query(raw_query).await?;
        tracing::info!("Query returned {} row(s)", rows.len());
        Ok(rows)
    }

    async fn insert(&self, pool: Arc<D::Pool>, items: &[Record]) -> Result<()> {
        let units = group_records(&self.params, items)?;
        let chunk_size = self.params.chunk_size();

        let queues = units
            .into_iter()
            .map(|unit| {
                let table_name = unit.table_name.clone();
                build_statements(self.params.operation(), unit, chunk_size).map(|statements| {
                    StatementQueue {
                        table_name,
                        statements,
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let total: usize = queues.iter().map(|q| q.statements.len()).sum();
        tracing::info!(
            "Inserting {} item(s) with {} statement(s) across {} table(s)",
            items.len(),
            total,
            queues.len()
        );

        let options = ExecutorOptions {
            max_concurrent_tables: self.params.max_concurrent_tables(),
            policy: FailurePolicy::FailFast,
        };
        let report = execute_query_queue(pool, queues, options).await?;
        tracing::info!("Executed {} insert statement(s)", report.statements_executed());
        Ok(())
    }
}
