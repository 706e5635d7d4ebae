use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Маркетплейс, в который выгружаются остатки и цены
///
/// Код совпадает с serde-представлением и с именем секции в config.toml.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketplaceType {
    Ozon,
    YandexMarket,
}

impl MarketplaceType {
    pub const ALL: [MarketplaceType; 2] = [MarketplaceType::Ozon, MarketplaceType::YandexMarket];

    pub fn code(&self) -> &'static str {
        match self {
            MarketplaceType::Ozon => "ozon",
            MarketplaceType::YandexMarket => "yandex_market",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MarketplaceType::Ozon => "Ozon",
            MarketplaceType::YandexMarket => "Яндекс Маркет",
        }
    }

    pub fn all() -> Vec<MarketplaceType> {
        Self::ALL.to_vec()
    }
}

impl std::fmt::Display for MarketplaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Строка не похожа ни на один известный маркетплейс
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMarketplace(pub String);

impl std::fmt::Display for UnknownMarketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown marketplace {:?}", self.0)
    }
}

impl std::error::Error for UnknownMarketplace {}

impl FromStr for MarketplaceType {
    type Err = UnknownMarketplace;

    /// Код или короткое имя, регистр не важен: `ozon`, `yandex`, `ym`, `озон`...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "ozon" | "озон" => Ok(MarketplaceType::Ozon),
            "yandex_market" | "yandex" | "ym" | "яндекс" | "яндекс_маркет" => {
                Ok(MarketplaceType::YandexMarket)
            }
            _ => Err(UnknownMarketplace(s.to_string())),
        }
    }
}
