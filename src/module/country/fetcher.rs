///! External REST clients for the countries directory and the
///! USD exchange-rate table.
///!
///! A fetch either yields the decoded payload or an error the caller
///! treats as "no data this cycle" — no retries, no backoff.

use anyhow::{Context, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

use super::types::{RatesResponse, RawCountry};

const REQUEST_TIMEOUT_SECONDS: u64 = 10;

/// Owns the HTTP client and the two upstream URLs.
pub struct CountryFetcher {
    client: Client,
    countries_url: String,
    rates_url: String,
}

impl CountryFetcher {
    pub fn new(countries_url: &str, rates_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
                .build()
                .expect("Failed to build reqwest client"),
            countries_url: countries_url.to_string(),
            rates_url: rates_url.to_string(),
        }
    }

    /// Fetch the full country list from the countries directory API.
    pub async fn fetch_countries(&self) -> Result<Vec<RawCountry>> {
        let response = self
            .client
            .get(&self.countries_url)
            .send()
            .await
            .context("Failed to GET countries data")?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "HTTP error {} from countries API",
                response.status()
            ));
        }

        let countries: Vec<RawCountry> = response
            .json()
            .await
            .context("Failed to parse countries JSON")?;

        tracing::debug!("Fetched {} country records", countries.len());
        Ok(countries)
    }

    /// Fetch the USD exchange-rate table, keyed by currency code.
    pub async fn fetch_rates(&self) -> Result<HashMap<String, f64>> {
        let response = self
            .client
            .get(&self.rates_url)
            .send()
            .await
            .context("Failed to GET exchange rates")?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "HTTP error {} from exchange rates API",
                response.status()
            ));
        }

        let body: RatesResponse = response
            .json()
            .await
            .context("Failed to parse exchange rates JSON")?;

        tracing::debug!("Fetched {} exchange rates", body.rates.len());
        Ok(body.rates)
    }
}
