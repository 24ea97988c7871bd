use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 終端機用的精簡格式
    Compact,
    /// 機器可讀的 JSON 日誌，供批次腳本收集
    Json,
}

/// `RUST_LOG` wins over the verbosity flag when it is set.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "data_sweeper=debug,info"
    } else {
        "data_sweeper=info"
    }
}

/// Installs the global subscriber. Logs go to stderr so stdout stays for the
/// per-file messages.
pub fn init_logger(format: LogFormat, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init(),
    }
}

pub fn init_cli_logger(verbose: bool) {
    init_logger(LogFormat::Compact, verbose);
}

pub fn init_json_logger(verbose: bool) {
    init_logger(LogFormat::Json, verbose);
}
