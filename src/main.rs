use clap::Parser;
use ibmi_connector::core::Driver;
use ibmi_connector::utils::error::ErrorSeverity;
use ibmi_connector::utils::validation::{validate_required_field, Validate};
use ibmi_connector::utils::logger;
use ibmi_connector::{
    BridgeDriver, CliConfig, ConnectorEngine, ConnectorPipeline, DryRunDriver, IbmiError,
    LocalStorage, NodeConfig,
};

async fn run_with<D: Driver>(driver: D, config: NodeConfig) -> ibmi_connector::Result<String> {
    let storage = LocalStorage::new(config.output.path.clone());
    let pipeline = ConnectorPipeline::new(storage, driver, config);
    ConnectorEngine::new(pipeline).run().await
}

async fn run(cli: &CliConfig) -> ibmi_connector::Result<String> {
    let mut config = cli.resolve()?;

    // 輸入檔以目前目錄為基準，避免被輸出目錄影響
    if let Some(input) = config.input.as_mut() {
        input.path = std::env::current_dir()?.join(&input.path).display().to_string();
    }

    config.validate()?;
    tracing::debug!("Resolved config: {:?}", config);

    if cli.dry_run {
        tracing::info!("🔍 Dry run enabled, statements are only logged");
        return run_with(DryRunDriver::new(), config).await;
    }

    let bridge = validate_required_field("bridge.command", &config.bridge)?;
    let driver = BridgeDriver::new(bridge);
    run_with(driver, config).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting ibmi-connector CLI");

    match run(&cli).await {
        Ok(output_path) => {
            tracing::info!("✅ Run completed successfully!");
            println!("✅ Run completed successfully!");
            println!("📁 Output saved to: {}", output_path);
            Ok(())
        }
        Err(e) => {
            report_failure(&e);

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}

fn report_failure(e: &IbmiError) {
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}
