///! Country data types
///!
///! Persisted rows, raw external API payloads, and the aggregate
///! snapshots consumed by the status endpoint and the summary renderer.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// One persisted country row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    /// USD exchange rate, rounded to 2 decimal places
    pub exchange_rate: Option<f64>,
    /// Synthetic GDP estimate, rounded to 1 decimal place.
    /// Recomputed with a fresh random multiplier on every refresh,
    /// so two refreshes of identical input produce different values.
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    #[serde(serialize_with = "serialize_utc_seconds")]
    pub last_refreshed_at: DateTime<Utc>,
}

/// Normalized write payload produced by the reconciler.
/// Every field overwrites the stored row on update (full replace).
#[derive(Debug, Clone, PartialEq)]
pub struct NewCountry {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
}

/// One country record as returned by the countries directory API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCountry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub population: Option<i64>,
    #[serde(default)]
    pub currencies: Vec<RawCurrency>,
    #[serde(default)]
    pub flag: Option<String>,
}

/// One currency descriptor inside a [`RawCountry`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawCurrency {
    #[serde(default)]
    pub code: Option<String>,
}

/// Body of the exchange-rate API response. Only the rates table is used;
/// a missing table decodes to an empty map and every GDP comes out null.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesResponse {
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

/// Aggregate store status for `GET /status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub total_countries: i64,
    #[serde(serialize_with = "serialize_opt_utc_seconds")]
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

/// Snapshot consumed by the summary image renderer.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub total_countries: i64,
    /// Top 5 by estimated GDP, highest first, null GDP last
    pub top_countries_by_gdp: Vec<GdpEntry>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct GdpEntry {
    pub name: String,
    pub estimated_gdp: Option<f64>,
}

/// ISO-8601 UTC, second precision, "Z" suffix — the wire format for
/// every timestamp the service emits.
pub fn format_utc_seconds(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn serialize_utc_seconds<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_utc_seconds(dt))
}

fn serialize_opt_utc_seconds<S>(
    dt: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => serializer.serialize_str(&format_utc_seconds(dt)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_utc_seconds() {
        let dt = Utc.with_ymd_and_hms(2026, 8, 5, 14, 30, 7).unwrap();
        assert_eq!(format_utc_seconds(&dt), "2026-08-05T14:30:07Z");
    }

    #[test]
    fn test_raw_country_tolerates_missing_fields() {
        let raw: RawCountry = serde_json::from_str(r#"{"population": 42}"#).unwrap();
        assert!(raw.name.is_none());
        assert_eq!(raw.population, Some(42));
        assert!(raw.currencies.is_empty());
    }

    #[test]
    fn test_rates_response_defaults_to_empty() {
        let body: RatesResponse = serde_json::from_str(r#"{"result": "success"}"#).unwrap();
        assert!(body.rates.is_empty());

        let body: RatesResponse =
            serde_json::from_str(r#"{"rates": {"GBP": 0.8, "JPY": 147}}"#).unwrap();
        assert_eq!(body.rates.get("GBP"), Some(&0.8));
        assert_eq!(body.rates.get("JPY"), Some(&147.0));
    }

    #[test]
    fn test_country_json_shape() {
        let country = Country {
            id: 1,
            name: "Wales".to_string(),
            capital: Some("Cardiff".to_string()),
            region: None,
            population: 100,
            currency_code: Some("GBP".to_string()),
            exchange_rate: Some(0.8),
            estimated_gdp: Some(187_500.0),
            flag_url: None,
            last_refreshed_at: Utc.with_ymd_and_hms(2026, 8, 5, 14, 30, 7).unwrap(),
        };
        let value = serde_json::to_value(&country).unwrap();
        assert_eq!(value["name"], "Wales");
        assert_eq!(value["region"], serde_json::Value::Null);
        assert_eq!(value["exchange_rate"], 0.8);
        assert_eq!(value["last_refreshed_at"], "2026-08-05T14:30:07Z");
    }
}
