///! Normalizes one raw country payload against the exchange-rate table.
///!
///! The estimated GDP is synthetic: population scaled by a multiplier
///! drawn uniformly from [1000, 2000) on every computation, divided by
///! the exchange rate. Values are not reproducible between refreshes
///! and are not meant to be.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use super::types::{NewCountry, RawCountry};

/// Source of the synthetic GDP multiplier. Injectable so tests can pin
/// the draw and assert exact bounds.
pub trait MultiplierSource: Send {
    fn draw(&mut self) -> f64;
}

/// Production source: uniform over [1000, 2000).
pub struct UniformMultiplier {
    rng: StdRng,
}

impl UniformMultiplier {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for UniformMultiplier {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiplierSource for UniformMultiplier {
    fn draw(&mut self) -> f64 {
        self.rng.gen_range(1000.0..2000.0)
    }
}

fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Normalize one raw record into a write payload.
///
/// Returns `None` when the record carries no name — the record is
/// skipped and the refresh continues, it is not an error.
///
/// `exchange_rate` and `estimated_gdp` are set together when the first
/// currency code resolves against `rates`, and are both null otherwise.
/// The rate keeps 2 decimal places and the GDP 1, matching the stored
/// column scales.
pub fn reconcile(
    raw: &RawCountry,
    rates: &HashMap<String, f64>,
    multiplier: &mut dyn MultiplierSource,
) -> Option<NewCountry> {
    let name = raw.name.as_deref().filter(|n| !n.is_empty())?;

    let currency_code = raw.currencies.first().and_then(|c| c.code.clone());
    let population = raw.population.unwrap_or(0);

    let (exchange_rate, estimated_gdp) =
        match currency_code.as_deref().and_then(|code| rates.get(code)) {
            Some(&rate) => {
                let gdp = population as f64 * multiplier.draw() / rate;
                (Some(round_to(rate, 2)), Some(round_to(gdp, 1)))
            }
            None => (None, None),
        };

    Some(NewCountry {
        name: name.to_string(),
        capital: raw.capital.clone(),
        region: raw.region.clone(),
        population,
        currency_code,
        exchange_rate,
        estimated_gdp,
        flag_url: raw.flag.clone(),
    })
}
