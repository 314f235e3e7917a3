use anyhow::{Context as _, Result};
use tracing::warn;

use crate::climate::{Bucket, ForecastSeries, ResampledSeries, SensorReading};
use crate::forecast::{ForecastError, Forecaster};
use crate::resample::{ResampleError, aggregate, resample};

/// Everything a page render needs from the data path, computed fresh for
/// every request.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Every 15-minute bucket, oldest first.
    pub history: Vec<Bucket>,

    pub live: Option<Live>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Live {
    pub series: ResampledSeries,

    /// `None` while the series is shorter than the model's lags.
    pub forecasts: Option<Forecasts>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecasts {
    pub one_hour: ForecastSeries,

    pub two_hours: ForecastSeries,
}

impl Forecasts {
    pub fn hours_ahead(&self, hours: u32) -> &ForecastSeries {
        if hours == 1 { &self.one_hour } else { &self.two_hours }
    }
}

impl Snapshot {
    /// Resamples and forecasts both horizons. No readings at all gives a
    /// snapshot without live data, too little history gives live data
    /// without forecasts. Any other forecasting failure is an error.
    pub fn build(readings: &[SensorReading], forecaster: &Forecaster) -> Result<Self> {
        let history = aggregate(readings);

        let live = match resample(readings) {
            Ok(series) => {
                let forecasts = forecast_both(&series, forecaster)?;
                Some(Live { series, forecasts })
            }
            Err(ResampleError::Empty) => None,
        };

        Ok(Self { history, live })
    }
}

fn forecast_both(series: &ResampledSeries, forecaster: &Forecaster) -> Result<Option<Forecasts>> {
    let one_hour = match forecaster.forecast(series, 1) {
        Ok(forecast) => forecast,
        Err(e @ ForecastError::InsufficientHistory { .. }) => {
            warn!("skipping forecasts: {e}");
            return Ok(None);
        }
        Err(e) => return Err(e).context("failed to forecast 1 hour ahead"),
    };
    let two_hours = forecaster
        .forecast(series, 2)
        .context("failed to forecast 2 hours ahead")?;

    Ok(Some(Forecasts { one_hour, two_hours }))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::climate::interval;
    use crate::forecast::{GradientBoostedModel, Node, Tree};

    fn forecaster(lags: usize) -> Forecaster {
        let model = GradientBoostedModel::new(lags, 23.0, vec![Tree::new(vec![Node::Leaf(0.0)])]).unwrap();
        Forecaster::from_model(model)
    }

    fn readings(n: i32) -> Vec<SensorReading> {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| SensorReading {
                timestamp: start + interval() * i,
                temperature: 24.0,
                humidity: 50.0,
                fan: 0,
            })
            .collect()
    }

    #[test]
    fn builds_both_horizons() {
        let snapshot = Snapshot::build(&readings(30), &forecaster(4)).unwrap();
        let live = snapshot.live.unwrap();

        assert_eq!(snapshot.history.len(), 30);
        assert_eq!(live.series.len(), 20);
        let forecasts = live.forecasts.unwrap();
        assert_eq!(forecasts.one_hour.points.len(), 4);
        assert_eq!(forecasts.two_hours.points.len(), 8);
    }

    #[test]
    fn no_readings_means_no_live_data() {
        let snapshot = Snapshot::build(&[], &forecaster(4)).unwrap();

        assert!(snapshot.history.is_empty());
        assert!(snapshot.live.is_none());
    }

    #[test]
    fn short_history_keeps_live_data_without_forecasts() {
        let snapshot = Snapshot::build(&readings(2), &forecaster(4)).unwrap();
        let live = snapshot.live.unwrap();

        assert_eq!(live.series.len(), 2);
        assert!(live.forecasts.is_none());
    }
}
