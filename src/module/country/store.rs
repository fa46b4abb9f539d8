///! Storage gateway for the `countries` table.
///!
///! The store is the only component that touches the database. It is
///! constructed once at startup and cloned into request handlers; the
///! pool handles its own concurrency control and every mutation is its
///! own implicit transaction — a failed statement rolls back that row
///! and the error propagates to the caller.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use thiserror::Error;

use super::types::{Country, GdpEntry, ImageData, NewCountry, StatusSummary};

/// `name` carries NOCASE collation: lookups, the unique constraint, and
/// deletes all match case-insensitively.
const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS countries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    capital TEXT,
    region TEXT,
    population INTEGER NOT NULL,
    currency_code TEXT,
    exchange_rate REAL,
    estimated_gdp REAL,
    flag_url TEXT,
    last_refreshed_at TEXT NOT NULL
)";

/// Nulls sort after ranked values in both directions, so countries
/// without a computable GDP always trail the list.
const ORDER_GDP_DESC: &str = "ORDER BY (estimated_gdp IS NULL), estimated_gdp DESC";
const ORDER_GDP_ASC: &str = "ORDER BY (estimated_gdp IS NULL), estimated_gdp ASC";

/// Listing failures: bad filter input is distinguished from database
/// errors so the HTTP layer can answer 400 instead of 500.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown filter key '{0}'")]
    UnknownFilter(String),
    #[error("unsupported sort '{0}'")]
    UnsupportedSort(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct CountryStore {
    pool: SqlitePool,
}

impl CountryStore {
    /// Connect and create the schema if missing.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        // A plain `sqlite::memory:` database exists per connection; a
        // single-connection pool keeps tests on one schema.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn exists(&self, name: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM countries WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Country>, sqlx::Error> {
        sqlx::query_as::<_, Country>("SELECT * FROM countries WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    /// List countries with optional filtering and sorting.
    ///
    /// Filter keys are allow-listed: `name`, `capital`, `region`,
    /// `currency` (matches `currency_code`), `population`, and `sort`
    /// (`gdp_desc` | `gdp_asc`). String filters match case-insensitive
    /// exact. Anything else is rejected, not guessed at.
    pub async fn get_all(
        &self,
        filters: &HashMap<String, String>,
    ) -> Result<Vec<Country>, QueryError> {
        let mut clauses: Vec<String> = Vec::new();
        let mut binds: Vec<String> = Vec::new();
        let mut order_by = "ORDER BY id";

        for (key, value) in filters {
            match key.as_str() {
                "currency" => {
                    clauses.push("currency_code = ? COLLATE NOCASE".to_string());
                    binds.push(value.clone());
                }
                "name" | "capital" | "region" => {
                    clauses.push(format!("{key} = ? COLLATE NOCASE"));
                    binds.push(value.clone());
                }
                "population" => {
                    clauses.push("CAST(population AS TEXT) = ?".to_string());
                    binds.push(value.clone());
                }
                "sort" => {
                    order_by = match value.as_str() {
                        "gdp_desc" => ORDER_GDP_DESC,
                        "gdp_asc" => ORDER_GDP_ASC,
                        other => return Err(QueryError::UnsupportedSort(other.to_string())),
                    };
                }
                other => return Err(QueryError::UnknownFilter(other.to_string())),
            }
        }

        let mut sql = String::from("SELECT * FROM countries");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push(' ');
        sql.push_str(order_by);

        let mut query = sqlx::query_as::<_, Country>(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Insert a new row; `last_refreshed_at` is set to now.
    pub async fn save(&self, new: &NewCountry) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO countries \
             (name, capital, region, population, currency_code, exchange_rate, \
              estimated_gdp, flag_url, last_refreshed_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.capital)
        .bind(&new.region)
        .bind(new.population)
        .bind(&new.currency_code)
        .bind(new.exchange_rate)
        .bind(new.estimated_gdp)
        .bind(&new.flag_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Overwrite every field of an existing row (full replace, not
    /// patch) and bump `last_refreshed_at` to now.
    pub async fn update(&self, id: i64, new: &NewCountry) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE countries SET \
             name = ?, capital = ?, region = ?, population = ?, currency_code = ?, \
             exchange_rate = ?, estimated_gdp = ?, flag_url = ?, last_refreshed_at = ? \
             WHERE id = ?",
        )
        .bind(&new.name)
        .bind(&new.capital)
        .bind(&new.region)
        .bind(new.population)
        .bind(&new.currency_code)
        .bind(new.exchange_rate)
        .bind(new.estimated_gdp)
        .bind(&new.flag_url)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove a row by name. Returns false when nothing matched.
    pub async fn delete(&self, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM countries WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Row count and newest refresh timestamp (None when empty).
    pub async fn status(&self) -> Result<StatusSummary, sqlx::Error> {
        use sqlx::Row;

        let row = sqlx::query(
            "SELECT COUNT(*) AS total, MAX(last_refreshed_at) AS last FROM countries",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StatusSummary {
            total_countries: row.try_get("total")?,
            last_refreshed_at: row.try_get::<Option<DateTime<Utc>>, _>("last")?,
        })
    }

    /// Snapshot for the summary image: total count, top 5 by estimated
    /// GDP (nulls last), and the newest refresh timestamp.
    pub async fn image_data(&self) -> Result<ImageData, sqlx::Error> {
        let StatusSummary {
            total_countries,
            last_refreshed_at,
        } = self.status().await?;

        let top = sqlx::query_as::<_, Country>(&format!(
            "SELECT * FROM countries {ORDER_GDP_DESC} LIMIT 5"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(ImageData {
            total_countries,
            top_countries_by_gdp: top
                .into_iter()
                .map(|c| GdpEntry {
                    name: c.name,
                    estimated_gdp: c.estimated_gdp,
                })
                .collect(),
            last_refreshed_at,
        })
    }
}
