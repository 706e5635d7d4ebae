pub mod records;
pub mod report;
pub mod request;

pub use records::{Currency, PriceUpdate, StockUpdate, SupplierRecord};
pub use report::{AccountReport, SyncReport};
pub use request::SyncRequest;

use crate::usecases::common::UseCaseMetadata;

pub struct SyncSupplierStock;

impl UseCaseMetadata for SyncSupplierStock {
    fn usecase_index() -> &'static str {
        "u510"
    }

    fn usecase_name() -> &'static str {
        "sync_supplier_stock"
    }

    fn display_name() -> &'static str {
        "Выгрузка остатков и цен поставщика"
    }
}
