use std::sync::Arc;

use stock_core::{parse_listing, CostRate, ListingId, ReportBuilder, ReportTable};
use stock_logging::{stock_debug, stock_error, stock_info};

use crate::{
    fetch_all, EngineEvent, FetchError, FetchResults, FetchSettings, MarketplaceError,
    MarketplaceSession, ProgressSink,
};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to list active listings: {0}")]
    ListListings(#[source] MarketplaceError),
    #[error("failed to fetch listing detail: {0}")]
    Fetch(#[source] FetchError),
    #[error("fetch workers stopped early: expected {expected} listings, received {received}")]
    Incomplete { expected: usize, received: usize },
}

/// Enumerate the active listings, fetch them all and fold them into a table.
///
/// The first failed fetch aborts the whole report.
pub async fn build_report<S>(
    session: Arc<S>,
    settings: &FetchSettings,
    cost_rate: CostRate,
    sink: Arc<dyn ProgressSink>,
) -> Result<ReportTable, ReportError>
where
    S: MarketplaceSession + ?Sized + 'static,
{
    let ids = session
        .list_active_listing_ids()
        .await
        .map_err(ReportError::ListListings)?;
    stock_info!("Found {} active listings", ids.len());
    sink.emit(EngineEvent::FetchStarted { total: ids.len() });
    collect_report(fetch_all(session, ids, settings, sink), cost_rate).await
}

/// Drain fetch results as they complete, parsing each into a report row.
pub async fn collect_report(
    mut results: FetchResults,
    cost_rate: CostRate,
) -> Result<ReportTable, ReportError> {
    let expected = results.total();
    let mut builder = ReportBuilder::with_capacity(expected);
    while let Some(outcome) = results.next().await {
        let fetched = outcome.map_err(|err| {
            stock_error!("Aborting report: {}", err);
            ReportError::Fetch(err)
        })?;
        log_row(&fetched.listing_id, builder.len() + 1, expected);
        builder.push(parse_listing(&fetched.detail, cost_rate));
    }

    if builder.len() != expected {
        return Err(ReportError::Incomplete {
            expected,
            received: builder.len(),
        });
    }
    let table = builder.finish();
    stock_info!(
        "Report ready: {} rows, total price {}, total cost {}",
        table.len(),
        table.total_price(),
        table.total_cost()
    );
    Ok(table)
}

fn log_row(id: &ListingId, row: usize, expected: usize) {
    stock_debug!("Parsed listing {} ({}/{})", id, row, expected);
}
