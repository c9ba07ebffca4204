use crate::utils::error::{IbmiError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 管線中的一筆資料 (欄位順序保留)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    pub fn new(data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { data }
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.data.get(field)
    }
}

impl TryFrom<serde_json::Value> for Record {
    type Error = IbmiError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(data) => Ok(Record { data }),
            other => Err(IbmiError::ValidationError {
                message: format!("Expected a JSON object per item, got: {}", other),
            }),
        }
    }
}

/// 可寫入 SQL 的純量值
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Number(serde_json::Number),
    Boolean(bool),
    Null,
}

impl SqlValue {
    pub fn from_json(field: &str, value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Ok(SqlValue::Text(s.clone())),
            serde_json::Value::Number(n) => Ok(SqlValue::Number(n.clone())),
            serde_json::Value::Bool(b) => Ok(SqlValue::Boolean(*b)),
            serde_json::Value::Null => Ok(SqlValue::Null),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Err(IbmiError::ValidationError {
                    message: format!(
                        "Field '{}' holds a nested value, only strings, numbers, booleans and null can be written",
                        field
                    ),
                })
            }
        }
    }
}

/// 依宣告欄位從 Record 複製出的資料列
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(String, SqlValue)>,
}

impl Row {
    /// 只複製指定欄位，缺少的欄位視為 NULL
    pub fn project(record: &Record, columns: &[String]) -> Result<Self> {
        let fields = columns
            .iter()
            .map(|column| {
                let value = match record.get(column) {
                    Some(value) => SqlValue::from_json(column, value)?,
                    None => SqlValue::Null,
                };
                Ok((column.clone(), value))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }
}

impl<S: Into<String>> FromIterator<(S, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (S, SqlValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableUnit {
    pub table_name: String,
    pub column_names: Vec<String>,
    pub records: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStatement {
    pub sql_text: String,
    pub table_name: String,
}

/// 單一語句的執行結果
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Success { rows: Vec<Record> },
    Failure { message: String },
}

impl ExecutionResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionResult::Failure { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    pub table_name: String,
    pub statements_total: usize,
    pub results: Vec<ExecutionResult>,
}

impl UnitReport {
    pub fn failed(&self) -> bool {
        self.results.iter().any(ExecutionResult::is_failure)
    }

    /// 因前一句失敗而未執行的語句數
    pub fn skipped(&self) -> usize {
        self.statements_total - self.results.len()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    pub units: Vec<UnitReport>,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        self.units.iter().any(UnitReport::failed)
    }

    pub fn statements_executed(&self) -> usize {
        self.units.iter().map(|u| u.results.len()).sum()
    }

    pub fn first_failure(&self) -> Option<&str> {
        self.units
            .iter()
            .flat_map(|u| u.results.iter())
            .find_map(|r| match r {
                ExecutionResult::Failure { message } => Some(message.as_str()),
                ExecutionResult::Success { .. } => None,
            })
    }
}

/// 節點支援的操作；update / delete 只在解析時被辨識並拒絕
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "executeQuery")]
    ExecuteQuery,
    #[serde(rename = "insert")]
    Insert,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ExecuteQuery => "executeQuery",
            Operation::Insert => "insert",
        }
    }
}

impl FromStr for Operation {
    type Err = IbmiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "executeQuery" => Ok(Operation::ExecuteQuery),
            "insert" => Ok(Operation::Insert),
            other => Err(IbmiError::unsupported(other)),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub host: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"********")
            .finish()
    }
}

/// 交給驅動程式建立連線池的設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolConfig {
    #[serde(flatten)]
    pub credentials: Credentials,
    /// Daemon 模式，不彈出登入視窗
    pub prompt: String,
}

impl From<Credentials> for PoolConfig {
    fn from(credentials: Credentials) -> Self {
        Self {
            credentials,
            prompt: "false".to_string(),
        }
    }
}
