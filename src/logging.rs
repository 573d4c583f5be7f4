use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::ConfigError;

const CRATE_TARGET: &str = "sap_invoices";

/// 日志级别 (不区分大小写)，例如 `debug`、`WARNING`
pub fn parse_level(level: &str) -> Result<Level, ConfigError> {
    let normalized = match level.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        other => other.to_string(),
    };
    Level::from_str(&normalized).map_err(|_| ConfigError::InvalidValue {
        field: "log_level".to_string(),
        reason: format!("'{level}' is not a valid log level"),
    })
}

/// 初始化全局日志 - 本地时间格式；DEBUG/TRACE 时显示文件与行号，且只输出本 crate 的日志
pub fn init_tracing(level: &str) -> Result<String, ConfigError> {
    let level = parse_level(level)?;
    let builder = tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .with_max_level(level);

    let result = if level >= Level::DEBUG {
        builder
            .with_file(true)
            .with_line_number(true)
            .finish()
            .with(Targets::new().with_target(CRATE_TARGET, level))
            .try_init()
            .map_err(|e| e.to_string())
    } else {
        builder.try_init().map_err(|e| e.to_string())
    };

    result.map_err(|reason| ConfigError::InvalidValue {
        field: "log_level".to_string(),
        reason,
    })?;
    Ok(format!("Logger configured with level={level}"))
}
