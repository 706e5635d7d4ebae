use crate::enums::MarketplaceType;
use serde::{Deserialize, Serialize};

/// Параметры запуска выгрузки
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Маркетплейсы, по которым выполняется выгрузка
    pub marketplaces: Vec<MarketplaceType>,

    /// Только сформировать остатки и цены, ничего не отправляя
    #[serde(default)]
    pub dry_run: bool,
}

impl SyncRequest {
    pub fn includes(&self, marketplace: MarketplaceType) -> bool {
        self.marketplaces.contains(&marketplace)
    }
}

impl Default for SyncRequest {
    fn default() -> Self {
        Self {
            marketplaces: MarketplaceType::all(),
            dry_run: false,
        }
    }
}
