/// Преобразовать цену поставщика в целые рубли
///
/// Берется часть строки до первой точки, из нее удаляются все нецифровые
/// символы. Если цифр нет, возвращается пустая строка.
///
/// # Примеры
/// ```
/// use stock_sync::usecases::u510_sync_supplier_stock::price_conversion::price_conversion;
/// assert_eq!(price_conversion("5'990.00 руб."), "5990");
/// ```
pub fn price_conversion(price: &str) -> String {
    let integer_part = price.split('.').next().unwrap_or_default();
    integer_part.chars().filter(|c| c.is_ascii_digit()).collect()
}
