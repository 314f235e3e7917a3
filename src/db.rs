use std::ops::RangeInclusive;

use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio_stream::StreamExt as _;
use tracing::info;

use crate::climate::SensorReading;

/// Accepted range for setpoint and target temperatures.
pub const CONTROL_RANGE_CELSIUS: RangeInclusive<f64> = 0.0..=100.0;

pub async fn new_pool(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to database")
}

pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .context("failed to run database migrations")
}

/// Read side: the sensor history written by the ingest process.
#[derive(Debug, Clone)]
pub struct ReadingStore {
    pool: PgPool,
}

impl ReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Full scan of the readings table, oldest first.
    pub async fn fetch_all(&self) -> Result<Vec<SensorReading>> {
        let mut rows = sqlx::query_as::<_, SensorReading>(
            r#"
            SELECT timestamp, temperature, humidity, fan
            FROM sensor_readings
            ORDER BY timestamp
            "#,
        )
        .fetch(&self.pool);

        let mut readings = Vec::new();
        while let Some(row) = rows.next().await {
            readings.push(row.context("failed to fetch sensor reading")?);
        }

        Ok(readings)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, sqlx::FromRow)]
pub struct ControlSettings {
    pub setpoint_celsius: Option<f64>,

    pub target_celsius: Option<f64>,

    pub updated_at: Option<DateTime<Utc>>,
}

/// Write side: operator-chosen temperatures, kept apart from sensor history.
#[derive(Debug, Clone)]
pub struct ControlStore {
    pool: PgPool,
}

impl ControlStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self) -> Result<ControlSettings> {
        let settings = sqlx::query_as::<_, ControlSettings>(
            r#"
            SELECT setpoint_celsius, target_celsius, updated_at
            FROM control_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch control settings")?;

        Ok(settings.unwrap_or_default())
    }

    pub async fn set_setpoint(&self, celsius: f64) -> Result<()> {
        validate_celsius(celsius)?;

        sqlx::query(
            r#"
            INSERT INTO control_settings (id, setpoint_celsius, updated_at)
            VALUES (1, $1, now())
            ON CONFLICT (id) DO UPDATE SET setpoint_celsius = EXCLUDED.setpoint_celsius, updated_at = now()
            "#,
        )
        .bind(celsius)
        .execute(&self.pool)
        .await
        .context("failed to update temperature setpoint")?;

        info!(celsius, "updated temperature setpoint");
        Ok(())
    }

    pub async fn set_target(&self, celsius: f64) -> Result<()> {
        validate_celsius(celsius)?;

        sqlx::query(
            r#"
            INSERT INTO control_settings (id, target_celsius, updated_at)
            VALUES (1, $1, now())
            ON CONFLICT (id) DO UPDATE SET target_celsius = EXCLUDED.target_celsius, updated_at = now()
            "#,
        )
        .bind(celsius)
        .execute(&self.pool)
        .await
        .context("failed to update target temperature")?;

        info!(celsius, "updated target temperature");
        Ok(())
    }
}

pub fn validate_celsius(celsius: f64) -> Result<()> {
    if !CONTROL_RANGE_CELSIUS.contains(&celsius) {
        bail!(
            "temperature out of range: expected {}-{}, got {celsius}",
            CONTROL_RANGE_CELSIUS.start(),
            CONTROL_RANGE_CELSIUS.end()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_control_range() {
        assert!(validate_celsius(0.0).is_ok());
        assert!(validate_celsius(24.5).is_ok());
        assert!(validate_celsius(100.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_and_nan() {
        assert!(validate_celsius(-0.1).is_err());
        assert!(validate_celsius(100.1).is_err());
        assert!(validate_celsius(f64::NAN).is_err());
    }
}
