use crate::core::chunker::DEFAULT_CHUNK_SIZE;
use crate::core::grouping::{parse_column_list, render_table_name};
use crate::domain::model::{Credentials, Operation, Record};
use crate::domain::ports::{ConfigProvider, NodeParameters, OutputFormat};
use crate::utils::error::{IbmiError, Result};
use crate::utils::validation::{
    validate_host, validate_identifier, validate_non_empty_string, validate_one_of,
    validate_positive_number, validate_table_template, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    pub connection: Option<ConnectionConfig>,
    pub operation: OperationConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    pub input: Option<InputConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    pub bridge: Option<BridgeConfig>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"********")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationConfig {
    #[serde(default = "default_operation")]
    pub kind: String,
    pub query: Option<String>,
    /// 可含 `{{field}}`
    pub table: Option<String>,
    /// 逗號分隔，例如 "id,name,description"
    pub columns: Option<String>,
    pub update_key: Option<String>,
    pub delete_key: Option<String>,
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self {
            kind: default_operation(),
            query: None,
            table: None,
            columns: None,
            update_key: None,
            delete_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub continue_on_fail: bool,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_max_concurrent_tables")]
    pub max_concurrent_tables: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            continue_on_fail: false,
            chunk_size: default_chunk_size(),
            max_concurrent_tables: default_max_concurrent_tables(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_output_format")]
    pub format: String,
    #[serde(default = "default_output_filename")]
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: default_output_format(),
            filename: default_output_filename(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_operation() -> String {
    Operation::ExecuteQuery.as_str().to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_concurrent_tables() -> usize {
    1
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_output_format() -> String {
    "json".to_string()
}

fn default_output_filename() -> String {
    "ibmi_{operation}_{timestamp}".to_string()
}

impl NodeConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| IbmiError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${IBMI_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| IbmiError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn parsed_format(&self) -> Result<OutputFormat> {
        validate_one_of("output.format", &self.output.format, &["json", "csv"])?;
        Ok(match self.output.format.as_str() {
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Json,
        })
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if let Some(connection) = &self.connection {
            validate_host("connection.host", &connection.host)?;
            validate_non_empty_string("connection.user", &connection.user)?;
        }

        validate_positive_number("execution.chunk_size", self.execution.chunk_size, 1)?;
        validate_positive_number(
            "execution.max_concurrent_tables",
            self.execution.max_concurrent_tables,
            1,
        )?;
        self.parsed_format()?;
        validate_non_empty_string("output.filename", &self.output.filename)?;

        if let Some(key) = &self.operation.update_key {
            validate_identifier("operation.update_key", key)?;
        }
        if let Some(key) = &self.operation.delete_key {
            validate_identifier("operation.delete_key", key)?;
        }

        // 未支援的操作留給節點在執行時回報
        match self.operation.kind.parse::<Operation>() {
            Ok(Operation::ExecuteQuery) => {
                let query = crate::utils::validation::validate_required_field(
                    "operation.query",
                    &self.operation.query,
                )?;
                validate_non_empty_string("operation.query", query)?;
            }
            Ok(Operation::Insert) => {
                let table = crate::utils::validation::validate_required_field(
                    "operation.table",
                    &self.operation.table,
                )?;
                validate_table_template("operation.table", table)?;
                for column in parse_column_list(self.operation.columns.as_deref().unwrap_or("")) {
                    validate_identifier("operation.columns", &column)?;
                }
            }
            Err(_) => {}
        }

        Ok(())
    }
}

impl NodeParameters for NodeConfig {
    fn credentials(&self) -> Option<Credentials> {
        self.connection.as_ref().map(|c| Credentials {
            host: c.host.clone(),
            user: c.user.clone(),
            password: c.password.clone(),
        })
    }

    fn operation(&self) -> &str {
        &self.operation.kind
    }

    fn query(&self) -> Option<&str> {
        self.operation.query.as_deref()
    }

    fn table(&self, item: &Record, _index: usize) -> Result<String> {
        let template = self
            .operation
            .table
            .as_deref()
            .ok_or_else(|| IbmiError::MissingConfigError {
                field: "operation.table".to_string(),
            })?;
        render_table_name(template, item)
    }

    fn columns(&self, _item: &Record, _index: usize) -> Result<Vec<String>> {
        Ok(parse_column_list(self.operation.columns.as_deref().unwrap_or("")))
    }

    fn continue_on_fail(&self) -> bool {
        self.execution.continue_on_fail
    }

    fn chunk_size(&self) -> usize {
        self.execution.chunk_size
    }

    fn max_concurrent_tables(&self) -> usize {
        self.execution.max_concurrent_tables
    }
}

impl ConfigProvider for NodeConfig {
    fn input_path(&self) -> Option<&str> {
        self.input.as_ref().map(|i| i.path.as_str())
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_format(&self) -> Result<OutputFormat> {
        self.parsed_format()
    }

    fn output_filename(&self) -> &str {
        &self.output.filename
    }
}

impl Validate for NodeConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const INSERT_CONFIG: &str = r#"
[connection]
host = "pub400.com"
user = "LOWCODE"
password = "secret"

[operation]
kind = "insert"
table = "LOWCODE1.PTBL"
columns = "id, fname"

[execution]
continue_on_fail = true
chunk_size = 250

[output]
path = "./out"
format = "csv"
"#;

    #[test]
    fn test_parse_insert_config() {
        let config = NodeConfig::from_toml_str(INSERT_CONFIG).unwrap();

        assert_eq!(config.operation(), "insert");
        assert_eq!(config.chunk_size(), 250);
        assert_eq!(config.max_concurrent_tables(), 1);
        assert!(config.continue_on_fail());
        assert_eq!(config.output_format().unwrap(), OutputFormat::Csv);
        assert_eq!(config.output_filename(), "ibmi_{operation}_{timestamp}");

        let item = Record::try_from(serde_json::json!({"id": 1})).unwrap();
        assert_eq!(config.table(&item, 0).unwrap(), "LOWCODE1.PTBL");
        assert_eq!(config.columns(&item, 0).unwrap(), vec!["id", "fname"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_for_execute_query() {
        let config = NodeConfig::from_toml_str(
            r#"
[operation]
query = "SELECT FNAME FROM LOWCODE1.PTBL LIMIT 2"
"#,
        )
        .unwrap();

        assert_eq!(config.operation(), "executeQuery");
        assert_eq!(config.chunk_size(), DEFAULT_CHUNK_SIZE);
        assert!(config.credentials().is_none());
        assert_eq!(config.output_path(), "./output");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("IBMI_TEST_PASSWORD", "from-env");

        let config = NodeConfig::from_toml_str(
            r#"
[connection]
host = "pub400.com"
user = "LOWCODE"
password = "${IBMI_TEST_PASSWORD}"

[operation]
query = "SELECT 1 FROM SYSIBM.SYSDUMMY1"
"#,
        )
        .unwrap();
        assert_eq!(config.credentials().unwrap().password, "from-env");

        std::env::remove_var("IBMI_TEST_PASSWORD");
    }

    #[test]
    fn test_config_validation_failures() {
        let bad_chunk = INSERT_CONFIG.replace("chunk_size = 250", "chunk_size = 0");
        assert!(NodeConfig::from_toml_str(&bad_chunk).unwrap().validate().is_err());

        let bad_column = INSERT_CONFIG.replace("id, fname", "id, fname; DROP");
        assert!(NodeConfig::from_toml_str(&bad_column).unwrap().validate().is_err());

        let bad_format = INSERT_CONFIG.replace("format = \"csv\"", "format = \"xml\"");
        let bad_format = NodeConfig::from_toml_str(&bad_format).unwrap();
        assert!(bad_format.validate().is_err());
        assert!(matches!(
            bad_format.output_format(),
            Err(IbmiError::InvalidConfigValueError { .. })
        ));

        let no_query = NodeConfig::from_toml_str("[operation]\nkind = \"executeQuery\"\n").unwrap();
        assert!(matches!(
            no_query.validate(),
            Err(IbmiError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_unsupported_operation_passes_validation() {
        let config =
            NodeConfig::from_toml_str("[operation]\nkind = \"update\"\nupdate_key = \"id\"\n").unwrap();
        assert!(config.validate().is_ok());

        let bad_key =
            NodeConfig::from_toml_str("[operation]\nkind = \"delete\"\ndelete_key = \"id key\"\n").unwrap();
        assert!(bad_key.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(INSERT_CONFIG.as_bytes()).unwrap();

        let config = NodeConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.credentials().unwrap().host, "pub400.com");
    }
}
