use super::batching::{divide, BatchLimits};
use super::offer_resolver::get_offer_ids;
use super::stock_builder::{create_prices, create_stocks, BuildError};
use crate::shared::marketplaces::{FailureKind, MarketplaceClient, MarketplaceError};
use contracts::usecases::common::UseCaseMetadata;
use contracts::usecases::u510_sync_supplier_stock::{
    AccountReport, SupplierRecord, SyncReport, SyncSupplierStock,
};
use thiserror::Error;

/// Кабинет маркетплейса, в который выгружаются остатки и цены
pub struct SyncAccount {
    /// Имя для логов и отчета, например "yandex_fbs"
    pub name: String,
    pub client: Box<dyn MarketplaceClient>,
    /// Склад, который проставляется в каждый остаток (только Яндекс Маркет)
    pub warehouse_id: Option<i64>,
    pub limits: BatchLimits,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{account}: {source}")]
    Marketplace {
        account: String,
        #[source]
        source: MarketplaceError,
    },

    #[error("{account}: {source}")]
    Build {
        account: String,
        #[source]
        source: BuildError,
    },
}

impl SyncError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SyncError::Marketplace { source, .. } => source.kind(),
            SyncError::Build { .. } => FailureKind::Other,
        }
    }
}

impl SyncAccount {
    fn marketplace_error(&self, source: MarketplaceError) -> SyncError {
        SyncError::Marketplace {
            account: self.name.clone(),
            source,
        }
    }

    fn build_error(&self, source: BuildError) -> SyncError {
        SyncError::Build {
            account: self.name.clone(),
            source,
        }
    }
}

/// Executor выгрузки остатков и цен поставщика
///
/// Кабинеты обрабатываются по очереди, пачки отправляются строго
/// последовательно. Первая же ошибка прерывает выгрузку; уже отправленные
/// пачки не откатываются.
pub struct SyncExecutor {
    accounts: Vec<SyncAccount>,
    dry_run: bool,
}

impl SyncExecutor {
    pub fn new(accounts: Vec<SyncAccount>, dry_run: bool) -> Self {
        Self { accounts, dry_run }
    }

    /// Выполнить выгрузку по всем кабинетам
    pub async fn run(&self, records: &[SupplierRecord]) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::new(self.dry_run);
        tracing::info!(
            "Starting {} ({}), run {}: {} accounts, {} supplier records, dry_run: {}",
            SyncSupplierStock::full_name(),
            SyncSupplierStock::display_name(),
            report.run_id,
            self.accounts.len(),
            records.len(),
            self.dry_run
        );

        for account in &self.accounts {
            let account_report = self.sync_account(account, records).await?;
            tracing::info!("{}", account_report);
            report.accounts.push(account_report);
        }

        report.complete();
        tracing::info!(
            "Run {} completed, {} update requests sent",
            report.run_id,
            report.total_batches()
        );
        Ok(report)
    }

    async fn sync_account(
        &self,
        account: &SyncAccount,
        records: &[SupplierRecord],
    ) -> Result<AccountReport, SyncError> {
        let client = account.client.as_ref();
        let mut report = AccountReport::new(account.name.as_str(), client.marketplace_type());
        tracing::info!("Syncing account {} ({})", account.name, report.marketplace);

        let offer_ids = get_offer_ids(client)
            .await
            .map_err(|e| account.marketplace_error(e))?;
        report.offers = offer_ids.len();

        // Обе выгрузки собираются до первой отправки
        let stocks = create_stocks(records, &offer_ids, account.warehouse_id)
            .map_err(|e| account.build_error(e))?;
        report.stocks = stocks.len();
        report.stocks_in_stock = stocks.iter().filter(|s| s.stock != 0).count();

        let prices = create_prices(records, &offer_ids).map_err(|e| account.build_error(e))?;
        report.prices = prices.len();

        // Обновить остатки
        if !self.dry_run {
            for (index, batch) in divide(&stocks, account.limits.stocks).enumerate() {
                client
                    .update_stocks(batch)
                    .await
                    .map_err(|e| account.marketplace_error(e))?;
                report.batches_sent += 1;
                tracing::info!(
                    "{}: stocks batch {} sent ({} items)",
                    account.name,
                    index + 1,
                    batch.len()
                );
            }
        }

        // Поменять цены
        if !self.dry_run {
            for (index, batch) in divide(&prices, account.limits.prices).enumerate() {
                client
                    .update_prices(batch)
                    .await
                    .map_err(|e| account.marketplace_error(e))?;
                report.batches_sent += 1;
                tracing::info!(
                    "{}: prices batch {} sent ({} items)",
                    account.name,
                    index + 1,
                    batch.len()
                );
            }
        }

        Ok(report)
    }
}
