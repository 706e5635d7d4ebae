use clap::Parser;
use contracts::enums::MarketplaceType;
use contracts::usecases::u510_sync_supplier_stock::{SyncReport, SyncRequest};
use std::path::{Path, PathBuf};
use stock_sync::shared::config::{load_config, EnvConfig};
use stock_sync::shared::logger::init_tracing;
use stock_sync::shared::marketplaces::{build_http_client, get_marketplace_type, FailureKind};
use stock_sync::usecases::u510_sync_supplier_stock::{
    build_accounts, download_stock, load_stock_file, FeedError, SyncError, SyncExecutor,
};

/// Выгрузка остатков и цен поставщика в Ozon и Яндекс Маркет
#[derive(Parser, Debug)]
#[command(name = "stock_sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Путь к config.toml (по умолчанию из рабочего каталога, рядом с исполняемым файлом или встроенный)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Маркетплейсы через запятую: ozon, yandex или all
    #[arg(short, long, value_delimiter = ',', default_value = "all")]
    marketplace: Vec<String>,

    /// Локальный файл остатков (.zip, .xls, .xlsx или .csv) вместо скачивания
    #[arg(long)]
    feed_file: Option<PathBuf>,

    /// Сформировать остатки и цены без отправки в маркетплейсы
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // До инициализации логов результат загрузки .env только запоминаем
    let dotenv = dotenvy::dotenv();

    let (config, source) = match load_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Ошибка конфигурации: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(Path::new(&config.logging.log_dir)) {
        eprintln!("Не удалось инициализировать логирование: {:#}", e);
        std::process::exit(1);
    }

    tracing::info!("Config loaded from {}", source);
    match dotenv {
        Ok(path) => tracing::info!("Environment loaded from {}", path.display()),
        Err(e) if e.not_found() => tracing::debug!("No .env file, using process environment"),
        Err(e) => tracing::warn!("Failed to load .env: {}", e),
    }

    match run(&cli, &config).await {
        Ok(report) => {
            for account in &report.accounts {
                println!("{}", account);
            }
            if report.dry_run {
                println!("Пробный запуск: данные в маркетплейсы не отправлялись");
            }
        }
        Err(e) => {
            let message = match failure_kind(&e) {
                FailureKind::Timeout => "Превышено время ожидания ответа от сервера",
                FailureKind::Connection => "Ошибка соединения",
                FailureKind::Status | FailureKind::Other => "Ошибка выгрузки",
            };
            tracing::error!("{}: {:#}", message, e);
            eprintln!("{}: {:#}", message, e);
            std::process::exit(1);
        }
    }
}

async fn run(
    cli: &Cli,
    config: &stock_sync::shared::config::Config,
) -> anyhow::Result<SyncReport> {
    config.validate()?;

    let request = SyncRequest {
        marketplaces: parse_marketplaces(&cli.marketplace)?,
        dry_run: cli.dry_run,
    };
    tracing::info!(
        "Selected marketplaces: {}",
        request
            .marketplaces
            .iter()
            .map(|m| m.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let env = EnvConfig::from_env()?;
    let http = build_http_client(config.http_timeout())?;
    let accounts = build_accounts(config, &env, &http, &request)?;

    let format = config.supplier.feed_format()?;
    let records = match &cli.feed_file {
        Some(path) => load_stock_file(path, &format)?,
        None => download_stock(&http, &config.supplier.url, &format).await?,
    };

    let executor = SyncExecutor::new(accounts, request.dry_run);
    Ok(executor.run(&records).await?)
}

/// "all" или пустой список означает все маркетплейсы
fn parse_marketplaces(values: &[String]) -> anyhow::Result<Vec<MarketplaceType>> {
    let mut selected = Vec::new();
    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        if value.eq_ignore_ascii_case("all") {
            return Ok(MarketplaceType::all());
        }
        let marketplace = get_marketplace_type(value)
            .ok_or_else(|| anyhow::anyhow!("Unknown marketplace: {}", value))?;
        if !selected.contains(&marketplace) {
            selected.push(marketplace);
        }
    }
    if selected.is_empty() {
        return Ok(MarketplaceType::all());
    }
    Ok(selected)
}

fn failure_kind(error: &anyhow::Error) -> FailureKind {
    if let Some(e) = error.downcast_ref::<SyncError>() {
        e.kind()
    } else if let Some(e) = error.downcast_ref::<FeedError>() {
        e.kind()
    } else if let Some(e) = error.downcast_ref::<reqwest::Error>() {
        if e.is_timeout() {
            FailureKind::Timeout
        } else if e.is_connect() {
            FailureKind::Connection
        } else {
            FailureKind::Other
        }
    } else {
        FailureKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_marketplaces() {
        assert_eq!(
            parse_marketplaces(&values(&["all"])).unwrap(),
            MarketplaceType::all()
        );
        assert_eq!(parse_marketplaces(&[]).unwrap(), MarketplaceType::all());
        assert_eq!(
            parse_marketplaces(&values(&["yandex", "ozon", "ym"])).unwrap(),
            vec![MarketplaceType::YandexMarket, MarketplaceType::Ozon]
        );
        assert!(parse_marketplaces(&values(&["wildberries"])).is_err());
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::parse_from(["stock_sync", "-m", "ozon,yandex", "--dry-run"]);
        assert_eq!(cli.marketplace, vec!["ozon", "yandex"]);
        assert!(cli.dry_run);
        assert!(cli.config.is_none());

        let cli = Cli::parse_from(["stock_sync"]);
        assert_eq!(cli.marketplace, vec!["all"]);
        assert!(!cli.dry_run);
    }
}
