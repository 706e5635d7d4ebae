use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Журнал сырых запросов к API маркетплейса
///
/// Пишет в отдельный файл на каждый маркетплейс, например
/// `ozon_api_requests.log`. Без каталога журнал отключен.
#[derive(Debug, Clone, Default)]
pub struct RequestLog {
    path: Option<PathBuf>,
}

impl RequestLog {
    pub fn new(dir: &Path, file_name: &str) -> Self {
        Self {
            path: Some(dir.join(file_name)),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Записать в лог-файл
    pub fn write(&self, message: &str) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] {}", timestamp, message);
        }
    }
}
