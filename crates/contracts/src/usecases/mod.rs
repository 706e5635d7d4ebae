pub mod common;
pub mod u510_sync_supplier_stock;
