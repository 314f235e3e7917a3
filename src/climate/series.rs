use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// Spacing of the resampled and forecast series.
pub const INTERVAL_MINUTES: i64 = 15;

pub const STEPS_PER_HOUR: usize = 4;

pub fn interval() -> TimeDelta {
    TimeDelta::minutes(INTERVAL_MINUTES)
}

/// All readings that rounded to the same 15-minute mark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub timestamp: DateTime<Utc>,

    pub temperature: f64,

    pub humidity: f64,

    pub fan: i16,

    pub samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,

    pub temperature: f64,

    pub humidity: f64,

    /// Interpolated rows may carry a fractional fan value.
    pub fan: f64,
}

impl SeriesPoint {
    pub fn fan_active(&self) -> bool {
        self.fan >= 1.0
    }
}

/// A gap-free series spaced [`INTERVAL_MINUTES`] apart. Built by
/// [`crate::resample::resample`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledSeries {
    points: Vec<SeriesPoint>,
}

impl ResampledSeries {
    pub(crate) fn from_points(points: Vec<SeriesPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.latest().map(|p| p.timestamp)
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.temperature).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,

    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    pub hours_ahead: u32,

    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.temperature).collect()
    }
}
