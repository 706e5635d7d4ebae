/// Метаданные UseCase для идентификации в логах и отчетах
pub trait UseCaseMetadata {
    /// Индекс UseCase (например, "u510")
    fn usecase_index() -> &'static str;

    /// Техническое имя (например, "sync_supplier_stock")
    fn usecase_name() -> &'static str;

    /// Отображаемое имя (например, "Выгрузка остатков поставщика")
    fn display_name() -> &'static str;

    /// Полное имя вида "u510_sync_supplier_stock"
    fn full_name() -> String {
        format!("{}_{}", Self::usecase_index(), Self::usecase_name())
    }
}
