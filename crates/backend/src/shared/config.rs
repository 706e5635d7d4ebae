use crate::shared::marketplaces::ozon::OzonCredentials;
use crate::usecases::u510_sync_supplier_stock::batching::BatchLimits;
use crate::usecases::u510_sync_supplier_stock::supplier_feed::FeedFormat;
use contracts::enums::MarketplaceType;
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    pub supplier: SupplierConfig,
    pub ozon: MarketplaceConfig,
    pub yandex_market: MarketplaceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub log_dir: String,
    /// Каталог для журналов сырых запросов к API; без него журналы не пишутся
    #[serde(default)]
    pub api_log_dir: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SupplierConfig {
    pub url: String,
    pub delimiter: String,
    pub header_scan_rows: usize,
    pub code_column: String,
    pub quantity_column: String,
    pub price_column: String,
}

/// Лимиты API одного маркетплейса
#[derive(Debug, Deserialize, Clone)]
pub struct MarketplaceConfig {
    pub base_url: String,
    pub page_limit: u32,
    pub stock_batch_size: usize,
    pub price_batch_size: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {name} is required for {marketplace}")]
    MissingEnv {
        name: &'static str,
        marketplace: MarketplaceType,
    },

    #[error("Environment variable {name} must be a number, got {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Invalid config value {key}: {message}")]
    InvalidValue { key: String, message: String },
}

const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[http]
timeout_secs = 30

[logging]
log_dir = "target/logs"
api_log_dir = "target/logs/api"

[supplier]
url = "https://timeworld.ru/upload/files/ostatki.zip"
delimiter = ";"
header_scan_rows = 30
code_column = "Код"
quantity_column = "Количество"
price_column = "Цена"

[ozon]
base_url = "https://api-seller.ozon.ru"
page_limit = 1000
stock_batch_size = 100
price_batch_size = 1000

[yandex_market]
base_url = "https://api.partner.market.yandex.ru"
page_limit = 200
stock_batch_size = 2000
price_batch_size = 500
"#;

/// Откуда загружена конфигурация
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Embedded,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Embedded => f.write_str("embedded default"),
        }
    }
}

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Explicit path (`--config`), must exist
/// 2. `config.toml` in the working directory
/// 3. Next to the executable
/// 4. Falls back to embedded default config
///
/// Called before logging is set up, so the source is returned instead of logged.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<(Config, ConfigSource)> {
    if let Some(path) = explicit {
        let config = read_config_file(path)?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let candidates = config_candidates(std::env::current_dir().ok(), exe_dir);

    if let Some(path) = candidates.into_iter().find(|p| p.is_file()) {
        let config = read_config_file(&path)?;
        return Ok((config, ConfigSource::File(path)));
    }

    Ok((Config::embedded()?, ConfigSource::Embedded))
}

fn config_candidates(cwd: Option<PathBuf>, exe_dir: Option<PathBuf>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    for dir in [cwd, exe_dir].into_iter().flatten() {
        let path = dir.join(CONFIG_FILE_NAME);
        if !candidates.contains(&path) {
            candidates.push(path);
        }
    }
    candidates
}

fn read_config_file(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))?;
    Ok(config)
}

impl Config {
    /// Настройки по умолчанию, вшитые в бинарник
    pub fn embedded() -> Result<Self, toml::de::Error> {
        toml::from_str(DEFAULT_CONFIG)
    }

    /// Проверить значения, которые иначе всплыли бы только посреди выгрузки
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(invalid("http.timeout_secs", "must be greater than 0"));
        }
        self.supplier.feed_format()?;
        for (section, mp) in [("ozon", &self.ozon), ("yandex_market", &self.yandex_market)] {
            if mp.page_limit == 0 {
                return Err(invalid(
                    &format!("{}.page_limit", section),
                    "must be greater than 0",
                ));
            }
            mp.batch_limits(section)?;
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

impl SupplierConfig {
    pub fn feed_format(&self) -> Result<FeedFormat, ConfigError> {
        let delimiter = match self.delimiter.as_bytes() {
            [byte] => *byte,
            _ => {
                return Err(invalid(
                    "supplier.delimiter",
                    "must be a single ASCII character",
                ))
            }
        };
        if self.header_scan_rows == 0 {
            return Err(invalid("supplier.header_scan_rows", "must be greater than 0"));
        }
        Ok(FeedFormat {
            delimiter,
            header_scan_rows: self.header_scan_rows,
            code_column: self.code_column.clone(),
            quantity_column: self.quantity_column.clone(),
            price_column: self.price_column.clone(),
        })
    }
}

impl MarketplaceConfig {
    /// `section` используется только в тексте ошибки
    pub fn batch_limits(&self, section: &str) -> Result<BatchLimits, ConfigError> {
        let non_zero = |value: usize, key: &str| {
            NonZeroUsize::new(value)
                .ok_or_else(|| invalid(&format!("{}.{}", section, key), "must be greater than 0"))
        };
        Ok(BatchLimits {
            stocks: non_zero(self.stock_batch_size, "stock_batch_size")?,
            prices: non_zero(self.price_batch_size, "price_batch_size")?,
        })
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Переменные окружения с ключами и идентификаторами кабинетов
///
/// Все поля необязательны: проверяются только для выбранных маркетплейсов.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EnvConfig {
    /// Api-Key Ozon
    pub seller_token: Option<String>,
    /// Client-Id Ozon
    pub client_id: Option<String>,
    /// OAuth-токен Яндекс Маркета
    pub market_token: Option<String>,
    /// Кампания FBS
    pub fbs_id: Option<String>,
    /// Кампания DBS
    pub dbs_id: Option<String>,
    pub warehouse_fbs_id: Option<String>,
    pub warehouse_dbs_id: Option<String>,
}

/// Кампания Яндекс Маркета со своим складом
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YandexCampaign {
    pub account: &'static str,
    pub campaign_id: String,
    pub warehouse_id: i64,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn ozon_credentials(&self) -> Result<OzonCredentials, ConfigError> {
        Ok(OzonCredentials {
            client_id: required(&self.client_id, "CLIENT_ID", MarketplaceType::Ozon)?,
            api_key: required(&self.seller_token, "SELLER_TOKEN", MarketplaceType::Ozon)?,
        })
    }

    pub fn yandex_token(&self) -> Result<String, ConfigError> {
        required(&self.market_token, "MARKET_TOKEN", MarketplaceType::YandexMarket)
    }

    /// Кампании FBS и DBS, в этом порядке
    pub fn yandex_campaigns(&self) -> Result<Vec<YandexCampaign>, ConfigError> {
        Ok(vec![
            YandexCampaign {
                account: "yandex_fbs",
                campaign_id: required(&self.fbs_id, "FBS_ID", MarketplaceType::YandexMarket)?,
                warehouse_id: warehouse(&self.warehouse_fbs_id, "WAREHOUSE_FBS_ID")?,
            },
            YandexCampaign {
                account: "yandex_dbs",
                campaign_id: required(&self.dbs_id, "DBS_ID", MarketplaceType::YandexMarket)?,
                warehouse_id: warehouse(&self.warehouse_dbs_id, "WAREHOUSE_DBS_ID")?,
            },
        ])
    }
}

fn required(
    value: &Option<String>,
    name: &'static str,
    marketplace: MarketplaceType,
) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::MissingEnv { name, marketplace })
}

fn warehouse(value: &Option<String>, name: &'static str) -> Result<i64, ConfigError> {
    let raw = required(value, name, MarketplaceType::YandexMarket)?;
    raw.parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value: raw })
}
