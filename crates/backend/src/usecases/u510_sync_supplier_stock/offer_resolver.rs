use crate::shared::marketplaces::{MarketplaceClient, MarketplaceError};

/// Получить все артикулы кабинета, пролистав список предложений
///
/// Листает, пока API не перестанет отдавать курсор, пока не набрано
/// объявленное `total`, или пока страница не придет пустой.
pub async fn get_offer_ids(client: &dyn MarketplaceClient) -> Result<Vec<String>, MarketplaceError> {
    let marketplace = client.marketplace_type();
    let mut offer_ids: Vec<String> = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page_number = 0usize;

    loop {
        page_number += 1;
        let page = client.fetch_offers_page(cursor.as_deref()).await?;
        let received = page.offer_ids.len();
        offer_ids.extend(page.offer_ids);

        tracing::debug!(
            "{} offers page {}: {} items, {} so far, total: {:?}",
            marketplace,
            page_number,
            received,
            offer_ids.len(),
            page.total
        );

        if received == 0 {
            break;
        }
        if let Some(total) = page.total {
            if offer_ids.len() as u64 >= total {
                break;
            }
        }
        match page.next_cursor {
            Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
            Some(next) => {
                tracing::warn!(
                    "{} returned the same page cursor {:?} twice, stopping pagination",
                    marketplace,
                    next
                );
                break;
            }
            None => break,
        }
    }

    tracing::info!(
        "{}: {} offers in {} pages",
        marketplace,
        offer_ids.len(),
        page_number
    );
    Ok(offer_ids)
}
