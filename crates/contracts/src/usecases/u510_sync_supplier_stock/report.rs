use crate::enums::MarketplaceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Итог выгрузки по всем кабинетам
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub accounts: Vec<AccountReport>,
}

/// Итог выгрузки по одному кабинету маркетплейса
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountReport {
    /// Имя кабинета, например "yandex_fbs"
    pub account: String,
    pub marketplace: MarketplaceType,
    /// Сколько предложений найдено в кабинете
    pub offers: usize,
    pub stocks: usize,
    /// Остатки с ненулевым количеством
    pub stocks_in_stock: usize,
    pub prices: usize,
    /// Сколько запросов на обновление реально отправлено
    pub batches_sent: usize,
}

impl SyncReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            completed_at: None,
            dry_run,
            accounts: Vec::new(),
        }
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn total_batches(&self) -> usize {
        self.accounts.iter().map(|a| a.batches_sent).sum()
    }
}

impl AccountReport {
    pub fn new(account: impl Into<String>, marketplace: MarketplaceType) -> Self {
        Self {
            account: account.into(),
            marketplace,
            offers: 0,
            stocks: 0,
            stocks_in_stock: 0,
            prices: 0,
            batches_sent: 0,
        }
    }
}

impl std::fmt::Display for AccountReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): предложений {}, остатков {} (в наличии {}), цен {}, запросов {}",
            self.account,
            self.marketplace,
            self.offers,
            self.stocks,
            self.stocks_in_stock,
            self.prices,
            self.batches_sent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lifecycle() {
        let mut report = SyncReport::new(false);
        assert!(report.completed_at.is_none());
        assert!(Uuid::parse_str(&report.run_id).is_ok());

        let mut ozon = AccountReport::new("ozon", MarketplaceType::Ozon);
        ozon.batches_sent = 3;
        let mut fbs = AccountReport::new("yandex_fbs", MarketplaceType::YandexMarket);
        fbs.batches_sent = 2;
        report.accounts.push(ozon);
        report.accounts.push(fbs);
        report.complete();

        assert_eq!(report.total_batches(), 5);
        assert!(report.completed_at.unwrap() >= report.started_at);
    }

    #[test]
    fn test_account_report_serializes_marketplace_snake_case() {
        let report = AccountReport::new("yandex_dbs", MarketplaceType::YandexMarket);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["marketplace"], "yandex_market");
        assert_eq!(json["account"], "yandex_dbs");
    }
}
