use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::climate::{Bucket, INTERVAL_MINUTES, ResampledSeries, SensorReading, SeriesPoint, interval};

/// Number of most recent buckets kept in a resampled series.
pub const WINDOW: usize = 20;

const INTERVAL_MICROS: i64 = INTERVAL_MINUTES * 60 * 1_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResampleError {
    #[error("no sensor readings available")]
    Empty,
}

/// Rounds to the nearest 15-minute mark. Exact half-way points go to the even
/// multiple.
pub fn round_to_interval(ts: DateTime<Utc>) -> DateTime<Utc> {
    let micros = ts.timestamp_micros();
    let quotient = micros.div_euclid(INTERVAL_MICROS);
    let remainder = micros.rem_euclid(INTERVAL_MICROS);

    let rounded = match (2 * remainder).cmp(&INTERVAL_MICROS) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => quotient + quotient.rem_euclid(2),
    };

    ts + TimeDelta::microseconds(rounded * INTERVAL_MICROS - micros)
}

#[derive(Debug, Default)]
struct Accumulator {
    temperature_sum: f64,
    humidity_sum: f64,
    fan_max: Option<i16>,
    samples: usize,
}

/// Groups readings by rounded timestamp: mean temperature and humidity, max
/// fan state. The result is sorted ascending.
pub fn aggregate(readings: &[SensorReading]) -> Vec<Bucket> {
    let mut groups: BTreeMap<DateTime<Utc>, Accumulator> = BTreeMap::new();

    for reading in readings {
        let acc = groups.entry(round_to_interval(reading.timestamp)).or_default();
        acc.temperature_sum += reading.temperature;
        acc.humidity_sum += reading.humidity;
        acc.fan_max = Some(acc.fan_max.map_or(reading.fan, |m| m.max(reading.fan)));
        acc.samples += 1;
    }

    groups
        .into_iter()
        .map(|(timestamp, acc)| {
            let n = acc.samples as f64;
            Bucket {
                timestamp,
                temperature: acc.temperature_sum / n,
                humidity: acc.humidity_sum / n,
                fan: acc.fan_max.unwrap_or_default(),
                samples: acc.samples,
            }
        })
        .collect()
}

/// Aggregates, keeps the last [`WINDOW`] buckets and fills the missing
/// 15-minute rows between them by linear interpolation.
pub fn resample(readings: &[SensorReading]) -> Result<ResampledSeries, ResampleError> {
    let buckets = aggregate(readings);
    let start = buckets.len().saturating_sub(WINDOW);
    fill_gaps(&buckets[start..])
}

fn fill_gaps(buckets: &[Bucket]) -> Result<ResampledSeries, ResampleError> {
    let Some(first) = buckets.first() else {
        return Err(ResampleError::Empty);
    };

    let mut points = vec![to_point(first)];

    for pair in buckets.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        let steps = (to.timestamp - from.timestamp).num_microseconds().unwrap_or(0) / INTERVAL_MICROS;

        for k in 1..steps {
            let t = k as f64 / steps as f64;
            points.push(SeriesPoint {
                timestamp: from.timestamp + interval() * k as i32,
                temperature: lerp(from.temperature, to.temperature, t),
                humidity: lerp(from.humidity, to.humidity, t),
                fan: lerp(from.fan as f64, to.fan as f64, t),
            });
        }

        points.push(to_point(to));
    }

    Ok(ResampledSeries::from_points(points))
}

fn to_point(bucket: &Bucket) -> SeriesPoint {
    SeriesPoint {
        timestamp: bucket.timestamp,
        temperature: bucket.temperature,
        humidity: bucket.humidity,
        fan: bucket.fan as f64,
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
