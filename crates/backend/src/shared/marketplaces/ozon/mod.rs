use super::{encode_body, read_json_response, MarketplaceClient, MarketplaceError, OfferPage};
use crate::shared::logger::RequestLog;
use async_trait::async_trait;
use contracts::enums::MarketplaceType;
use contracts::usecases::u510_sync_supplier_stock::{Currency, PriceUpdate, StockUpdate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api-seller.ozon.ru";

/// Ключи доступа к Ozon Seller API
#[derive(Debug, Clone)]
pub struct OzonCredentials {
    pub client_id: String,
    pub api_key: String,
}

/// HTTP-клиент для работы с OZON Seller API
pub struct OzonApiClient {
    client: reqwest::Client,
    base_url: String,
    credentials: OzonCredentials,
    page_limit: u32,
    request_log: RequestLog,
}

impl OzonApiClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        credentials: OzonCredentials,
        page_limit: u32,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            page_limit,
            request_log: RequestLog::disabled(),
        }
    }

    pub fn with_request_log(mut self, request_log: RequestLog) -> Self {
        self.request_log = request_log;
        self
    }

    /// Все методы Ozon используют POST с JSON-телом
    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        request_body: &B,
    ) -> Result<T, MarketplaceError> {
        let url = format!("{}{}", self.base_url, path);
        let body = encode_body(MarketplaceType::Ozon, request_body)?;
        self.request_log.write(&format!(
            "=== REQUEST ===\nPOST {}\nClient-Id: {}\nApi-Key: ****\nBody: {}",
            url, self.credentials.client_id, body
        ));

        let response = self
            .client
            .post(&url)
            .header("Client-Id", &self.credentials.client_id)
            .header("Api-Key", &self.credentials.api_key)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| MarketplaceError::transport(MarketplaceType::Ozon, e))?;

        read_json_response(MarketplaceType::Ozon, response, &self.request_log).await
    }
}

#[async_trait]
impl MarketplaceClient for OzonApiClient {
    fn marketplace_type(&self) -> MarketplaceType {
        MarketplaceType::Ozon
    }

    /// Получить список товаров через POST /v2/product/list
    async fn fetch_offers_page(&self, cursor: Option<&str>) -> Result<OfferPage, MarketplaceError> {
        let request_body = OzonProductListRequest {
            filter: OzonProductListFilter {
                visibility: "ALL".to_string(),
            },
            last_id: cursor.unwrap_or_default().to_string(),
            limit: self.page_limit,
        };

        let data: OzonProductListResponse = self.post("/v2/product/list", &request_body).await?;
        tracing::debug!(
            "OZON product list: {} items, total: {}, last_id: {:?}",
            data.result.items.len(),
            data.result.total,
            data.result.last_id
        );

        Ok(OfferPage {
            offer_ids: data
                .result
                .items
                .into_iter()
                .map(|item| item.offer_id)
                .collect(),
            next_cursor: Some(data.result.last_id).filter(|id| !id.is_empty()),
            total: Some(data.result.total),
        })
    }

    /// Обновить цены через POST /v1/product/import/prices
    async fn update_prices(
        &self,
        prices: &[PriceUpdate],
    ) -> Result<serde_json::Value, MarketplaceError> {
        let request_body = OzonPricesRequest {
            prices: prices.iter().map(OzonPriceItem::from).collect(),
        };
        self.post("/v1/product/import/prices", &request_body).await
    }

    /// Обновить остатки через POST /v1/product/import/stocks
    async fn update_stocks(
        &self,
        stocks: &[StockUpdate],
    ) -> Result<serde_json::Value, MarketplaceError> {
        let request_body = OzonStocksRequest {
            stocks: stocks
                .iter()
                .map(|s| OzonStockItem {
                    offer_id: s.offer_id.clone(),
                    stock: s.stock,
                })
                .collect(),
        };
        self.post("/v1/product/import/stocks", &request_body).await
    }
}

fn currency_code(currency: Currency) -> &'static str {
    match currency {
        Currency::Rub => "RUB",
    }
}

// ============================================================================
// Request/Response structures для OZON Seller API
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OzonProductListRequest {
    pub filter: OzonProductListFilter,
    pub last_id: String,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OzonProductListFilter {
    pub visibility: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OzonProductListResponse {
    pub result: OzonProductListResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OzonProductListResult {
    #[serde(default)]
    pub items: Vec<OzonProductListItem>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub last_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OzonProductListItem {
    #[serde(default)]
    pub product_id: i64,
    pub offer_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OzonPricesRequest {
    pub prices: Vec<OzonPriceItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OzonPriceItem {
    pub auto_action_enabled: String,
    pub currency_code: String,
    pub offer_id: String,
    pub old_price: String,
    pub price: String,
}

impl From<&PriceUpdate> for OzonPriceItem {
    fn from(p: &PriceUpdate) -> Self {
        Self {
            auto_action_enabled: "UNKNOWN".to_string(),
            currency_code: currency_code(p.currency).to_string(),
            offer_id: p.offer_id.clone(),
            old_price: "0".to_string(),
            price: p.price.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OzonStocksRequest {
    pub stocks: Vec<OzonStockItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OzonStockItem {
    pub offer_id: String,
    pub stock: u32,
}
