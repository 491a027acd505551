pub mod decode_log;

use tracing::subscriber::SetGlobalDefaultError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

pub use decode_log::DecodeLog;

/// 初始化全局 tracing 日志（JSON 格式）。
///
/// 指定 `log_dir` 时按小时滚动写文件，返回的 guard 需要一直持有，
/// 否则缓冲中的日志会丢失；未指定时写到 stderr。
pub fn init(log_dir: Option<&str>) -> Result<Option<WorkerGuard>, SetGlobalDefaultError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let log_file = rolling::hourly(dir, "native_decode.json");
            let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
            let subscriber = Registry::default()
                .with(filter)
                .with(fmt::layer().json().with_writer(non_blocking));
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(Some(guard))
        }
        None => {
            let subscriber = Registry::default()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr));
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(None)
        }
    }
}
