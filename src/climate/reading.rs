use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SensorReading {
    pub timestamp: DateTime<Utc>,

    pub temperature: f64,

    pub humidity: f64,

    /// `1` while the fan is running, `0` otherwise.
    pub fan: i16,
}
