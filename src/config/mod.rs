pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::toml_config::{BridgeConfig, ConnectionConfig, InputConfig, NodeConfig};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "ibmi-connector")]
#[command(about = "Run DB2 for IBM i queries and batch inserts over a JDBC bridge")]
pub struct CliConfig {
    /// Path to a TOML configuration file; flags below override it
    #[arg(short, long)]
    pub config: Option<String>,

    /// JSON file with the input items (array of objects)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    /// executeQuery or insert
    #[arg(long)]
    pub operation: Option<String>,

    #[arg(long)]
    pub query: Option<String>,

    #[arg(long)]
    pub table: Option<String>,

    /// Comma separated list of the properties used as columns
    #[arg(long)]
    pub columns: Option<String>,

    #[arg(long, env = "IBMI_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "IBMI_USER")]
    pub user: Option<String>,

    #[arg(long, env = "IBMI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Command line of the JDBC bridge process, e.g. "java -jar jt400-bridge.jar"
    #[arg(long)]
    pub bridge_command: Option<String>,

    #[arg(long)]
    pub chunk_size: Option<usize>,

    #[arg(long)]
    pub max_concurrent_tables: Option<usize>,

    #[arg(long, help = "Return the input items instead of failing")]
    pub continue_on_fail: bool,

    /// json or csv
    #[arg(long)]
    pub format: Option<String>,

    #[arg(long, help = "Log the generated SQL without connecting")]
    pub dry_run: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入 TOML (若有) 並套用命令列覆蓋設定
    pub fn resolve(&self) -> Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::from_file(path)?,
            None => NodeConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut NodeConfig) {
        if let Some(operation) = &self.operation {
            config.operation.kind = operation.clone();
        }
        if let Some(query) = &self.query {
            config.operation.query = Some(query.clone());
        }
        if let Some(table) = &self.table {
            config.operation.table = Some(table.clone());
        }
        if let Some(columns) = &self.columns {
            config.operation.columns = Some(columns.clone());
        }
        if let Some(input) = &self.input {
            config.input = Some(InputConfig {
                path: input.clone(),
            });
        }
        if let Some(output_path) = &self.output_path {
            config.output.path = output_path.clone();
        }
        if let Some(format) = &self.format {
            config.output.format = format.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            config.execution.chunk_size = chunk_size;
        }
        if let Some(max) = self.max_concurrent_tables {
            config.execution.max_concurrent_tables = max;
        }
        if self.continue_on_fail {
            config.execution.continue_on_fail = true;
        }
        if let Some(command) = &self.bridge_command {
            let mut parts = command.split_whitespace().map(str::to_string);
            if let Some(program) = parts.next() {
                config.bridge = Some(BridgeConfig {
                    command: program,
                    args: parts.collect(),
                });
            }
        }

        // 只有三項都齊全時才覆蓋連線設定
        if let (Some(host), Some(user), Some(password)) = (&self.host, &self.user, &self.password) {
            config.connection = Some(ConnectionConfig {
                host: host.clone(),
                user: user.clone(),
                password: password.clone(),
            });
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::domain::ports::NodeParameters;

    #[test]
    fn test_cli_flags_override_defaults() {
        let cli = CliConfig::parse_from([
            "ibmi-connector",
            "--operation",
            "insert",
            "--table",
            "T1",
            "--columns",
            "id,name",
            "--host",
            "pub400.com",
            "--user",
            "LOWCODE",
            "--password",
            "pw",
            "--chunk-size",
            "10",
            "--bridge-command",
            "java -jar jt400-bridge.jar",
            "--continue-on-fail",
        ]);

        let config = cli.resolve().unwrap();
        assert_eq!(config.operation(), "insert");
        assert_eq!(config.chunk_size(), 10);
        assert!(config.continue_on_fail());
        assert_eq!(config.credentials().unwrap().user, "LOWCODE");

        let bridge = config.bridge.unwrap();
        assert_eq!(bridge.command, "java");
        assert_eq!(bridge.args, vec!["-jar", "jt400-bridge.jar"]);
    }
}
