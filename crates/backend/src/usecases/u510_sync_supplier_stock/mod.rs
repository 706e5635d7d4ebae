pub mod accounts;
pub mod batching;
pub mod executor;
pub mod offer_resolver;
pub mod price_conversion;
pub mod stock_builder;
pub mod supplier_feed;

pub use accounts::build_accounts;
pub use batching::BatchLimits;
pub use executor::{SyncAccount, SyncError, SyncExecutor};
pub use supplier_feed::{download_stock, load_stock_file, FeedError, FeedFormat};
