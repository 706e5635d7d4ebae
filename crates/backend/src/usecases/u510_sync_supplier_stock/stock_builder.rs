use super::price_conversion::price_conversion;
use contracts::usecases::u510_sync_supplier_stock::{
    Currency, PriceUpdate, StockUpdate, SupplierRecord,
};
use std::collections::HashSet;
use thiserror::Error;

/// Остаток, который показываем при количестве ">10"
pub const ABUNDANT_STOCK: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Invalid quantity {quantity:?} for product {code}")]
    InvalidQuantity { code: String, quantity: String },

    #[error("Invalid price {price:?} for product {code}")]
    InvalidPrice { code: String, price: String },
}

/// Количество из файла поставщика в остаток для маркетплейса
///
/// ">10" выставляется как 100, единичный остаток скрывается (0),
/// остальное берется как есть. Отрицательное количество не принимается.
pub fn stock_count(quantity: &str) -> Option<u32> {
    match quantity.trim() {
        ">10" => Some(ABUNDANT_STOCK),
        "1" => Some(0),
        other => other.parse().ok(),
    }
}

/// Сформировать остатки
///
/// Сначала товары поставщика, найденные среди предложений кабинета, затем
/// все остальные предложения кабинета с нулевым остатком. Каждый артикул
/// встречается ровно один раз.
pub fn create_stocks(
    records: &[SupplierRecord],
    offer_ids: &[String],
    warehouse_id: Option<i64>,
) -> Result<Vec<StockUpdate>, BuildError> {
    let known: HashSet<&str> = offer_ids.iter().map(String::as_str).collect();
    let mut emitted: HashSet<&str> = HashSet::with_capacity(known.len());
    let mut stocks = Vec::with_capacity(known.len());

    for record in records {
        let code = record.code.as_str();
        if !known.contains(code) || !emitted.insert(code) {
            continue;
        }
        let stock = stock_count(&record.quantity).ok_or_else(|| BuildError::InvalidQuantity {
            code: record.code.clone(),
            quantity: record.quantity.clone(),
        })?;
        stocks.push(StockUpdate {
            offer_id: record.code.clone(),
            stock,
            warehouse_id,
        });
    }

    // Снятые у поставщика товары обнуляем
    for offer_id in offer_ids {
        if emitted.insert(offer_id.as_str()) {
            stocks.push(StockUpdate {
                offer_id: offer_id.clone(),
                stock: 0,
                warehouse_id,
            });
        }
    }

    Ok(stocks)
}

/// Создать список с ценами продажи
///
/// Цена продажи — розничная цена поставщика. Товары, которых нет в кабинете,
/// пропускаются.
pub fn create_prices(
    records: &[SupplierRecord],
    offer_ids: &[String],
) -> Result<Vec<PriceUpdate>, BuildError> {
    let known: HashSet<&str> = offer_ids.iter().map(String::as_str).collect();

    records
        .iter()
        .filter(|record| known.contains(record.code.as_str()))
        .map(|record| {
            let price = price_conversion(&record.price)
                .parse::<u64>()
                .map_err(|_| BuildError::InvalidPrice {
                    code: record.code.clone(),
                    price: record.price.clone(),
                })?;
            Ok(PriceUpdate {
                offer_id: record.code.clone(),
                price,
                currency: Currency::Rub,
            })
        })
        .collect()
}
