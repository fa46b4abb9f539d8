///! Refresh pipeline: fetch both upstreams, reconcile every record into
///! the store, then regenerate the summary image.
///!
///! Concurrent refreshes are not coordinated; two in-flight calls both
///! fetch and both upsert, and the last writer wins per row under the
///! unique-name constraint.

use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::module::renderer::SummaryRenderer;

use super::fetcher::CountryFetcher;
use super::reconciler::{MultiplierSource, reconcile};
use super::store::CountryStore;
use super::types::RawCountry;

#[derive(Debug, Clone, Copy)]
pub struct RefreshOutcome {
    pub processed: usize,
    pub skipped: usize,
}

/// Owns everything a refresh needs: the upstream clients, the store,
/// the renderer, and the GDP multiplier source.
pub struct RefreshService {
    fetcher: CountryFetcher,
    store: CountryStore,
    renderer: SummaryRenderer,
    multiplier: Mutex<Box<dyn MultiplierSource>>,
}

impl RefreshService {
    pub fn new(
        fetcher: CountryFetcher,
        store: CountryStore,
        renderer: SummaryRenderer,
        multiplier: Box<dyn MultiplierSource>,
    ) -> Self {
        Self {
            fetcher,
            store,
            renderer,
            multiplier: Mutex::new(multiplier),
        }
    }

    /// Run one full refresh cycle.
    ///
    /// A failed fetch aborts before any write. A failed upsert aborts
    /// the cycle but leaves earlier rows committed — the loop is not
    /// one transaction.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ApiError> {
        let countries = self.fetcher.fetch_countries().await.map_err(|e| {
            warn!("Countries fetch failed: {e:#}");
            ApiError::UpstreamUnavailable {
                source_name: "Countries API",
            }
        })?;

        let rates = self.fetcher.fetch_rates().await.map_err(|e| {
            warn!("Exchange rates fetch failed: {e:#}");
            ApiError::UpstreamUnavailable {
                source_name: "Exchange Rates API",
            }
        })?;

        self.apply(&countries, &rates).await
    }

    /// Reconcile fetched records into the store and regenerate the
    /// summary image. Split from [`refresh`] so the pipeline can be
    /// driven without the network.
    pub async fn apply(
        &self,
        countries: &[RawCountry],
        rates: &HashMap<String, f64>,
    ) -> Result<RefreshOutcome, ApiError> {
        let mut records = Vec::with_capacity(countries.len());
        let mut skipped = 0usize;
        {
            let mut multiplier = self.multiplier.lock().await;
            for raw in countries {
                match reconcile(raw, rates, multiplier.as_mut()) {
                    Some(record) => records.push(record),
                    None => {
                        skipped += 1;
                        debug!("Skipping country record without a name");
                    }
                }
            }
        }

        let processed = records.len();
        for record in &records {
            match self.store.get_by_name(&record.name).await? {
                Some(existing) => self.store.update(existing.id, record).await?,
                None => self.store.save(record).await?,
            }
        }

        let snapshot = self.store.image_data().await?;
        if let Err(e) = self.renderer.render(&snapshot).await {
            // Rows written above stay committed even though the request
            // will be reported as failed.
            warn!("Summary image rendering failed after {processed} upserts: {e:#}");
            return Err(ApiError::Render(e));
        }

        info!("Refresh complete: {processed} processed, {skipped} skipped");
        Ok(RefreshOutcome { processed, skipped })
    }
}
