use crate::domain::model::{PoolConfig, Record};
use crate::domain::ports::{ConnectionPool, Driver};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// 不連線，只記錄並輸出收到的 SQL
#[derive(Debug, Clone, Default)]
pub struct DryRunDriver {
    statements: Arc<Mutex<Vec<String>>>,
}

impl DryRunDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Driver for DryRunDriver {
    type Pool = DryRunPool;

    async fn pool(&self, config: &PoolConfig) -> Result<DryRunPool> {
        tracing::info!(
            "Dry run: not connecting to {} as {}",
            config.credentials.host,
            config.credentials.user
        );
        Ok(DryRunPool {
            statements: Arc::clone(&self.statements),
        })
    }
}

pub struct DryRunPool {
    statements: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ConnectionPool for DryRunPool {
    async fn query(&self, sql: &str) -> Result<Vec<Record>> {
        tracing::info!("Dry run SQL: {}", sql);
        if let Ok(mut seen) = self.statements.lock() {
            seen.push(sql.to_string());
        }
        Ok(Vec::new())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
