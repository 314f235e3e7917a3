use anyhow::{Context as _, Result};
use chrono_tz::Tz;
use serde::Serialize;

use crate::climate::Bucket;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Range {
    fn of(values: impl Iterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        (count > 0).then(|| Self {
            min,
            max,
            mean: sum / count as f64,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub buckets: usize,
    pub readings: usize,
    pub temperature: Range,
    pub humidity: Range,
    /// Share of buckets during which the fan ran at least once.
    pub fan_on_ratio: f64,
}

pub fn summarize(history: &[Bucket]) -> Option<Summary> {
    let temperature = Range::of(history.iter().map(|b| b.temperature))?;
    let humidity = Range::of(history.iter().map(|b| b.humidity))?;
    let fan_on = history.iter().filter(|b| b.fan >= 1).count();

    Some(Summary {
        buckets: history.len(),
        readings: history.iter().map(|b| b.samples).sum(),
        temperature,
        humidity,
        fan_on_ratio: fan_on as f64 / history.len() as f64,
    })
}

#[derive(Debug, Serialize)]
struct CsvRow {
    timestamp: String,
    temperature: f64,
    humidity: f64,
    fan: i16,
    samples: usize,
}

/// History table as CSV, timestamps in `timezone`.
pub fn history_csv(history: &[Bucket], timezone: Tz) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for bucket in history {
        writer
            .serialize(CsvRow {
                timestamp: bucket.timestamp.with_timezone(&timezone).to_rfc3339(),
                temperature: bucket.temperature,
                humidity: bucket.humidity,
                fan: bucket.fan,
                samples: bucket.samples,
            })
            .context("failed to write CSV row")?;
    }

    writer.into_inner().context("failed to flush CSV writer")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::climate::interval;

    fn history() -> Vec<Bucket> {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        [(22.0, 40.0, 0), (26.0, 60.0, 1), (30.0, 50.0, 1), (26.0, 50.0, 0)]
            .into_iter()
            .zip(0..)
            .map(|((temperature, humidity, fan), i)| Bucket {
                timestamp: start + interval() * i,
                temperature,
                humidity,
                fan,
                samples: 2,
            })
            .collect()
    }

    #[test]
    fn summarizes_history() {
        let summary = summarize(&history()).unwrap();

        assert_eq!(summary.buckets, 4);
        assert_eq!(summary.readings, 8);
        assert_eq!(summary.temperature.min, 22.0);
        assert_eq!(summary.temperature.max, 30.0);
        assert_eq!(summary.temperature.mean, 26.0);
        assert_eq!(summary.humidity.mean, 50.0);
        assert_eq!(summary.fan_on_ratio, 0.5);
    }

    #[test]
    fn empty_history_has_no_summary() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn csv_uses_display_timezone() {
        let csv = history_csv(&history()[..1], chrono_tz::Asia::Jakarta).unwrap();
        let text = String::from_utf8(csv).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("timestamp,temperature,humidity,fan,samples"));
        assert_eq!(lines.next(), Some("2024-06-01T07:00:00+07:00,22.0,40.0,0,2"));
        assert_eq!(lines.next(), None);
    }
}
