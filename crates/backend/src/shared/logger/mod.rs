pub mod request_log;

pub use request_log::RequestLog;

use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Имя файла общего лога приложения
pub const LOG_FILE_NAME: &str = "stock_sync.log";

/// Инициализация tracing: вывод в консоль и в файл `<log_dir>/stock_sync.log`
///
/// Уровень задается через `RUST_LOG`, по умолчанию `info`.
pub fn init_tracing(log_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE_NAME))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            // Подробности reqwest/hyper нужны только при отладке
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .try_init()?;

    Ok(())
}
