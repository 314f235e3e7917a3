//! Plotly figure specifications. The browser side only calls
//! `Plotly.newPlot(id, figure.data, figure.layout)`.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::climate::{Bucket, ForecastSeries, ResampledSeries};

const TRANSPARENT: &str = "rgba(0,0,0,0)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub color: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub mode: &'static str,
    pub name: String,
    pub line: Line,
}

impl Trace {
    fn lines(name: &str, x: Vec<String>, y: Vec<f64>, line: Line) -> Self {
        Self {
            x,
            y,
            mode: "lines",
            name: name.to_owned(),
            line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub paper_bgcolor: &'static str,
    pub plot_bgcolor: &'static str,
}

impl Layout {
    fn temperature(title: &str) -> Self {
        Self {
            title: title.to_owned(),
            xaxis: Axis {
                title: "Waktu".to_owned(),
            },
            yaxis: Axis {
                title: "Temperature".to_owned(),
            },
            paper_bgcolor: TRANSPARENT,
            plot_bgcolor: TRANSPARENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    /// JSON safe to inline in a `<script>` element.
    pub fn to_script_json(&self) -> serde_json::Result<String> {
        Ok(serde_json::to_string(self)?.replace("</", "<\\/"))
    }
}

fn labels(timestamps: impl IntoIterator<Item = DateTime<Utc>>, timezone: Tz) -> Vec<String> {
    timestamps
        .into_iter()
        .map(|ts| ts.with_timezone(&timezone).format("%Y-%m-%d %H:%M").to_string())
        .collect()
}

/// Observed temperature (solid) followed by the forecast (dashed).
pub fn forecast_figure(series: &ResampledSeries, forecast: &ForecastSeries, timezone: Tz, title: &str) -> Figure {
    Figure {
        data: vec![
            Trace::lines(
                "Temperature",
                labels(series.timestamps(), timezone),
                series.temperatures(),
                Line {
                    color: "blue",
                    dash: None,
                },
            ),
            Trace::lines(
                "Predicted Temperature",
                labels(forecast.timestamps(), timezone),
                forecast.temperatures(),
                Line {
                    color: "red",
                    dash: Some("dash"),
                },
            ),
        ],
        layout: Layout::temperature(title),
    }
}

pub fn history_figure(history: &[Bucket], timezone: Tz, title: &str) -> Figure {
    Figure {
        data: vec![Trace::lines(
            "Temperature",
            labels(history.iter().map(|b| b.timestamp), timezone),
            history.iter().map(|b| b.temperature).collect(),
            Line {
                color: "blue",
                dash: None,
            },
        )],
        layout: Layout::temperature(title),
    }
}
