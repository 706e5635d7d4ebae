use super::{encode_body, read_json_response, MarketplaceClient, MarketplaceError, OfferPage};
use crate::shared::logger::RequestLog;
use async_trait::async_trait;
use contracts::enums::MarketplaceType;
use contracts::usecases::u510_sync_supplier_stock::{Currency, PriceUpdate, StockUpdate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.partner.market.yandex.ru";

/// HTTP-клиент для работы с одной кампанией Yandex Market Partner API
///
/// FBS и DBS — разные кампании со своими идентификаторами, поэтому на
/// каждую заводится свой клиент.
pub struct YandexApiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    campaign_id: String,
    page_limit: u32,
    request_log: RequestLog,
}

impl YandexApiClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
        campaign_id: impl Into<String>,
        page_limit: u32,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            campaign_id: campaign_id.into(),
            page_limit,
            request_log: RequestLog::disabled(),
        }
    }

    pub fn with_request_log(mut self, request_log: RequestLog) -> Self {
        self.request_log = request_log;
        self
    }

    fn campaign_url(&self, suffix: &str) -> String {
        format!("{}/campaigns/{}/{}", self.base_url, self.campaign_id, suffix)
    }

    async fn send_json<B: Serialize>(
        &self,
        method: reqwest::Method,
        url: &str,
        request_body: &B,
    ) -> Result<serde_json::Value, MarketplaceError> {
        let body = encode_body(MarketplaceType::YandexMarket, request_body)?;
        self.request_log.write(&format!(
            "=== REQUEST ===\n{} {}\nAuthorization: Bearer ****\nBody: {}",
            method, url, body
        ));

        let response = self
            .client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", &self.token))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| MarketplaceError::transport(MarketplaceType::YandexMarket, e))?;

        read_json_response(MarketplaceType::YandexMarket, response, &self.request_log).await
    }
}

#[async_trait]
impl MarketplaceClient for YandexApiClient {
    fn marketplace_type(&self) -> MarketplaceType {
        MarketplaceType::YandexMarket
    }

    /// Получить список товаров кампании
    /// Endpoint: GET /campaigns/{campaignId}/offer-mapping-entries
    async fn fetch_offers_page(&self, cursor: Option<&str>) -> Result<OfferPage, MarketplaceError> {
        #[derive(Serialize)]
        struct YandexListQueryParams<'a> {
            limit: u32,
            #[serde(skip_serializing_if = "Option::is_none")]
            page_token: Option<&'a str>,
        }

        let url = self.campaign_url("offer-mapping-entries");
        let query = YandexListQueryParams {
            limit: self.page_limit,
            page_token: cursor,
        };

        let token_preview = cursor.map(|t| t.chars().take(50).collect::<String>());
        self.request_log.write(&format!(
            "=== REQUEST ===\nGET {}\nAuthorization: Bearer ****\nQuery: limit={}, page_token={:?}",
            url, query.limit, token_preview
        ));

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", &self.token))
            .header("Accept", "application/json")
            .query(&query)
            .send()
            .await
            .map_err(|e| MarketplaceError::transport(MarketplaceType::YandexMarket, e))?;

        let data: YandexOfferMappingResponse =
            read_json_response(MarketplaceType::YandexMarket, response, &self.request_log).await?;

        let entries = data.result.offer_mapping_entries;
        tracing::debug!(
            "Yandex Market offer mappings: {} entries, nextPageToken: {:?}",
            entries.len(),
            data.result.paging.next_page_token
        );

        let mut offer_ids = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry.offer.shop_sku {
                Some(sku) => offer_ids.push(sku),
                None => tracing::warn!("Yandex Market offer mapping entry without shopSku skipped"),
            }
        }

        Ok(OfferPage {
            offer_ids,
            next_cursor: data
                .result
                .paging
                .next_page_token
                .filter(|token| !token.is_empty()),
            total: None,
        })
    }

    /// Обновить цены
    /// Endpoint: POST /campaigns/{campaignId}/offer-prices/updates
    async fn update_prices(
        &self,
        prices: &[PriceUpdate],
    ) -> Result<serde_json::Value, MarketplaceError> {
        let request_body = YandexPricesRequest {
            offers: prices
                .iter()
                .map(|p| YandexOfferPrice {
                    id: p.offer_id.clone(),
                    price: YandexPrice {
                        value: p.price,
                        currency_id: currency_code(p.currency).to_string(),
                    },
                })
                .collect(),
        };
        let url = self.campaign_url("offer-prices/updates");
        self.send_json(reqwest::Method::POST, &url, &request_body)
            .await
    }

    /// Обновить остатки
    /// Endpoint: PUT /campaigns/{campaignId}/offers/stocks
    async fn update_stocks(
        &self,
        stocks: &[StockUpdate],
    ) -> Result<serde_json::Value, MarketplaceError> {
        let updated_at = stock_timestamp(chrono::Utc::now());
        let request_body = YandexStocksRequest {
            skus: stocks
                .iter()
                .map(|s| YandexSkuStock {
                    sku: s.offer_id.clone(),
                    warehouse_id: s.warehouse_id,
                    items: vec![YandexStockItem {
                        count: s.stock,
                        stock_type: "FIT".to_string(),
                        updated_at: updated_at.clone(),
                    }],
                })
                .collect(),
        };
        let url = self.campaign_url("offers/stocks");
        self.send_json(reqwest::Method::PUT, &url, &request_body)
            .await
    }
}

fn currency_code(currency: Currency) -> &'static str {
    match currency {
        Currency::Rub => "RUR",
    }
}

/// Время обновления остатка в формате `2024-01-31T10:00:00Z`
fn stock_timestamp(now: chrono::DateTime<chrono::Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ============================================================================
// Request/Response structures для Yandex Market Partner API
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexOfferMappingResponse {
    pub result: YandexOfferMappingResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexOfferMappingResult {
    #[serde(rename = "offerMappingEntries", default)]
    pub offer_mapping_entries: Vec<YandexOfferMappingEntry>,
    #[serde(default)]
    pub paging: YandexPaging,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YandexPaging {
    #[serde(rename = "nextPageToken", default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexOfferMappingEntry {
    pub offer: YandexMappedOffer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexMappedOffer {
    #[serde(rename = "shopSku", default)]
    pub shop_sku: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexPricesRequest {
    pub offers: Vec<YandexOfferPrice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexOfferPrice {
    pub id: String,
    pub price: YandexPrice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexPrice {
    pub value: u64,
    #[serde(rename = "currencyId")]
    pub currency_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexStocksRequest {
    pub skus: Vec<YandexSkuStock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexSkuStock {
    pub sku: String,
    #[serde(rename = "warehouseId", skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<i64>,
    pub items: Vec<YandexStockItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexStockItem {
    pub count: u32,
    #[serde(rename = "type")]
    pub stock_type: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}
