use crate::domain::model::{Credentials, PoolConfig, Record};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 連線池；查詢與關閉都委派給外部驅動程式
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    async fn query(&self, sql: &str) -> Result<Vec<Record>>;
    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait Driver: Send + Sync {
    type Pool: ConnectionPool + 'static;

    async fn pool(&self, config: &PoolConfig) -> Result<Self::Pool>;
}

/// 節點參數；table / columns 依項目索引解析
pub trait NodeParameters: Send + Sync {
    fn credentials(&self) -> Option<Credentials>;
    fn operation(&self) -> &str;
    fn query(&self) -> Option<&str>;
    fn table(&self, item: &Record, index: usize) -> Result<String>;
    fn columns(&self, item: &Record, index: usize) -> Result<Vec<String>>;
    fn continue_on_fail(&self) -> bool;
    fn chunk_size(&self) -> usize;
    fn max_concurrent_tables(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// 執行一次節點所需的完整設定 (輸入 / 輸出位置)
pub trait ConfigProvider: NodeParameters {
    fn input_path(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn output_format(&self) -> Result<OutputFormat>;
    /// 可含 `{operation}`、`{timestamp}`
    fn output_filename(&self) -> &str;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<Vec<Record>>;
    async fn load(&self, result: Vec<Record>) -> Result<String>;
}
