use anyhow::Context;
use clap::Parser;
use data_sweeper::core::pipeline::describe_plan;
use data_sweeper::core::ConfigProvider;
use data_sweeper::utils::error::ErrorSeverity;
use data_sweeper::utils::{logger, validation::Validate};
use data_sweeper::{CliConfig, LocalStorage, SweepEngine, SweepPipeline};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🧹 Starting data-sweeper");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_settings() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = cli.validate().and_then(|_| config.validate()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        for path in &cli.files {
            match describe_plan(path, &config) {
                Ok(description) => println!("{}", description),
                Err(e) => eprintln!("❌ {}: {}", path, e.user_friendly_message()),
            }
        }
        return Ok(());
    }

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = SweepPipeline::new(storage, config);
    let engine = SweepEngine::new_with_monitoring(pipeline, monitor_enabled);

    let report = engine.run(&cli.files).await;

    if let Some(report_path) = &cli.report {
        let json = report.to_json().context("failed to serialize report")?;
        tokio::fs::write(report_path, json)
            .await
            .with_context(|| format!("failed to write report to {}", report_path))?;
        tracing::info!("📝 Report written to: {}", report_path);
    }

    println!(
        "✅ {} converted, ❌ {} failed",
        report.converted_count(),
        report.failed_count()
    );

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match report.worst_severity() {
        None | Some(ErrorSeverity::Low) => 0, // 僅有不支援的檔案被略過
        Some(ErrorSeverity::Medium) => 2,     // 資料錯誤
        Some(ErrorSeverity::High) => 1,       // 設定錯誤
        Some(ErrorSeverity::Critical) => 3,   // 系統錯誤
    };

    if exit_code > 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}
