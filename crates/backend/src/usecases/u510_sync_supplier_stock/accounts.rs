use super::executor::SyncAccount;
use crate::shared::config::{Config, ConfigError, EnvConfig};
use crate::shared::logger::RequestLog;
use crate::shared::marketplaces::ozon::OzonApiClient;
use crate::shared::marketplaces::yandex_market::YandexApiClient;
use contracts::enums::MarketplaceType;
use contracts::usecases::u510_sync_supplier_stock::SyncRequest;
use std::path::Path;

/// Собрать кабинеты для выгрузки: Ozon — один, Яндекс Маркет — FBS и DBS
pub fn build_accounts(
    config: &Config,
    env: &EnvConfig,
    http: &reqwest::Client,
    request: &SyncRequest,
) -> Result<Vec<SyncAccount>, ConfigError> {
    let api_log_dir = config.logging.api_log_dir.as_deref().map(Path::new);
    let request_log = |file_name: &str| {
        api_log_dir
            .map(|dir| RequestLog::new(dir, file_name))
            .unwrap_or_default()
    };

    let mut accounts = Vec::new();

    if request.includes(MarketplaceType::Ozon) {
        let client = OzonApiClient::new(
            http.clone(),
            config.ozon.base_url.as_str(),
            env.ozon_credentials()?,
            config.ozon.page_limit,
        )
        .with_request_log(request_log("ozon_api_requests.log"));

        accounts.push(SyncAccount {
            name: "ozon".to_string(),
            client: Box::new(client),
            warehouse_id: None,
            limits: config.ozon.batch_limits("ozon")?,
        });
    }

    if request.includes(MarketplaceType::YandexMarket) {
        let token = env.yandex_token()?;
        let limits = config.yandex_market.batch_limits("yandex_market")?;

        for campaign in env.yandex_campaigns()? {
            let client = YandexApiClient::new(
                http.clone(),
                config.yandex_market.base_url.as_str(),
                token.as_str(),
                campaign.campaign_id,
                config.yandex_market.page_limit,
            )
            .with_request_log(request_log("yandex_api_requests.log"));

            accounts.push(SyncAccount {
                name: campaign.account.to_string(),
                client: Box::new(client),
                warehouse_id: Some(campaign.warehouse_id),
                limits,
            });
        }
    }

    Ok(accounts)
}
