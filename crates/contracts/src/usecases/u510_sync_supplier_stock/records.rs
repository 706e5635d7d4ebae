use serde::{Deserialize, Serialize};

/// Строка складского файла поставщика
///
/// Значения хранятся как есть, без нормализации: количество бывает
/// `">10"`, `"1"` или числом, цена в виде `"5'990.00 руб."`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRecord {
    /// Код товара поставщика (совпадает с артикулом на маркетплейсе)
    pub code: String,
    pub quantity: String,
    pub price: String,
}

impl SupplierRecord {
    pub fn new(
        code: impl Into<String>,
        quantity: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            quantity: quantity.into(),
            price: price.into(),
        }
    }
}

/// Обновление остатка одного предложения
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUpdate {
    pub offer_id: String,
    pub stock: u32,
    /// Склад продавца; заполняется только для Яндекс Маркета
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    Rub,
}

/// Обновление цены одного предложения (целые рубли, без копеек)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub offer_id: String,
    pub price: u64,
    pub currency: Currency,
}
