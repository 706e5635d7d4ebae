pub mod ozon;
pub mod yandex_market;

use async_trait::async_trait;
use contracts::enums::MarketplaceType;
use contracts::usecases::u510_sync_supplier_stock::{PriceUpdate, StockUpdate};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use crate::shared::logger::RequestLog;

/// Страница списка предложений кабинета
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferPage {
    /// Артикулы предложений в порядке выдачи API
    pub offer_ids: Vec<String>,
    /// Курсор следующей страницы (`last_id` у Ozon, `nextPageToken` у Яндекса)
    pub next_cursor: Option<String>,
    /// Общее количество предложений, если API его сообщает
    pub total: Option<u64>,
}

/// Класс ошибки для отчета пользователю
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connection,
    Status,
    Other,
}

/// Ошибки обращения к API маркетплейса
#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error("{marketplace} API request timed out: {source}")]
    Timeout {
        marketplace: MarketplaceType,
        #[source]
        source: reqwest::Error,
    },

    #[error("{marketplace} API connection failed: {source}")]
    Connection {
        marketplace: MarketplaceType,
        #[source]
        source: reqwest::Error,
    },

    #[error("{marketplace} API request failed with status {status}: {body}")]
    Status {
        marketplace: MarketplaceType,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{marketplace} API request error: {source}")]
    Request {
        marketplace: MarketplaceType,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse {marketplace} API JSON: {message}")]
    Json {
        marketplace: MarketplaceType,
        message: String,
    },
}

impl MarketplaceError {
    /// Разложить ошибку reqwest по классам: таймаут, соединение, прочее
    pub fn transport(marketplace: MarketplaceType, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            MarketplaceError::Timeout {
                marketplace,
                source,
            }
        } else if source.is_connect() {
            MarketplaceError::Connection {
                marketplace,
                source,
            }
        } else {
            MarketplaceError::Request {
                marketplace,
                source,
            }
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            MarketplaceError::Timeout { .. } => FailureKind::Timeout,
            MarketplaceError::Connection { .. } => FailureKind::Connection,
            MarketplaceError::Status { .. } => FailureKind::Status,
            MarketplaceError::Request { .. } | MarketplaceError::Json { .. } => FailureKind::Other,
        }
    }

    pub fn marketplace(&self) -> MarketplaceType {
        match self {
            MarketplaceError::Timeout { marketplace, .. }
            | MarketplaceError::Connection { marketplace, .. }
            | MarketplaceError::Status { marketplace, .. }
            | MarketplaceError::Request { marketplace, .. }
            | MarketplaceError::Json { marketplace, .. } => *marketplace,
        }
    }
}

/// Трейт для клиента кабинета маркетплейса
///
/// Каждый вызов выполняет ровно один HTTP-запрос, без повторов.
#[async_trait]
pub trait MarketplaceClient: Send + Sync {
    fn marketplace_type(&self) -> MarketplaceType;

    /// Получить одну страницу списка предложений; `None` означает первую страницу
    async fn fetch_offers_page(&self, cursor: Option<&str>) -> Result<OfferPage, MarketplaceError>;

    /// Отправить пачку цен
    async fn update_prices(
        &self,
        prices: &[PriceUpdate],
    ) -> Result<serde_json::Value, MarketplaceError>;

    /// Отправить пачку остатков
    async fn update_stocks(
        &self,
        stocks: &[StockUpdate],
    ) -> Result<serde_json::Value, MarketplaceError>;
}

/// Определение типа маркетплейса по коду или описанию
pub fn get_marketplace_type(marketplace_code: &str) -> Option<MarketplaceType> {
    // Сначала проверяем точные совпадения кодов
    if let Ok(mp_type) = marketplace_code.parse() {
        return Some(mp_type);
    }

    let code_lower = marketplace_code.trim().to_lowercase();
    if code_lower.contains("ozon") || code_lower.contains("озон") {
        return Some(MarketplaceType::Ozon);
    }
    if code_lower.contains("yandex")
        || code_lower.contains("яндекс")
        || code_lower.contains("market")
    {
        return Some(MarketplaceType::YandexMarket);
    }

    None
}

/// HTTP-клиент, общий для поставщика и обоих маркетплейсов
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Проверить статус ответа и разобрать JSON-тело
pub(crate) async fn read_json_response<T: DeserializeOwned>(
    marketplace: MarketplaceType,
    response: reqwest::Response,
    request_log: &RequestLog,
) -> Result<T, MarketplaceError> {
    let status = response.status();
    request_log.write(&format!("Response status: {}", status));

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        request_log.write(&format!("ERROR Response body:\n{}", body));
        tracing::error!("{} API request failed: {}", marketplace, body);
        return Err(MarketplaceError::Status {
            marketplace,
            status,
            body,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| MarketplaceError::transport(marketplace, e))?;
    request_log.write(&format!("=== RESPONSE BODY ===\n{}\n", body));

    let preview: String = body.chars().take(500).collect::<String>();
    let preview = if preview.len() < body.len() {
        format!("{}...", preview)
    } else {
        preview
    };
    tracing::debug!("{} API response preview: {}", marketplace, preview);

    serde_json::from_str::<T>(&body).map_err(|e| {
        request_log.write(&format!("Failed to parse JSON: {}", e));
        tracing::error!("Failed to parse {} API response. Error: {}", marketplace, e);
        MarketplaceError::Json {
            marketplace,
            message: format!("{}. Response: {}", e, preview),
        }
    })
}

/// Сериализовать тело запроса
pub(crate) fn encode_body<B: serde::Serialize>(
    marketplace: MarketplaceType,
    body: &B,
) -> Result<String, MarketplaceError> {
    serde_json::to_string(body).map_err(|e| MarketplaceError::Json {
        marketplace,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_marketplace_type() {
        assert_eq!(get_marketplace_type("ozon"), Some(MarketplaceType::Ozon));
        assert_eq!(
            get_marketplace_type("yandex_market"),
            Some(MarketplaceType::YandexMarket)
        );
        assert_eq!(get_marketplace_type("OZON"), Some(MarketplaceType::Ozon));
        assert_eq!(get_marketplace_type("Озон"), Some(MarketplaceType::Ozon));
        assert_eq!(get_marketplace_type("ym"), Some(MarketplaceType::YandexMarket));
        assert_eq!(
            get_marketplace_type("Яндекс Маркет"),
            Some(MarketplaceType::YandexMarket)
        );
        assert_eq!(get_marketplace_type("wildberries"), None);
    }

    #[test]
    fn test_status_error_kind() {
        let err = MarketplaceError::Status {
            marketplace: MarketplaceType::Ozon,
            status: reqwest::StatusCode::BAD_REQUEST,
            body: "{\"message\":\"bad\"}".to_string(),
        };
        assert_eq!(err.kind(), FailureKind::Status);
        assert_eq!(err.marketplace(), MarketplaceType::Ozon);
        assert!(err.to_string().contains("400"));
    }
}
