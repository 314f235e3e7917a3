use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use tokio::task;
use tracing::{info, warn};

use super::{ForecastError, ForecastResult, GradientBoostedModel};
use crate::climate::{ForecastPoint, ForecastSeries, ResampledSeries, STEPS_PER_HOUR, interval};

#[derive(Debug)]
struct Loaded {
    model: Arc<GradientBoostedModel>,
    modified: Option<SystemTime>,
    /// Modification time of an artifact that failed to load; not retried
    /// until the file changes again.
    failed_modified: Option<SystemTime>,
}

/// Owns the model loaded from an artifact file. Construct it once and share
/// it; [`Forecaster::reload_if_changed`] picks up a replaced artifact.
#[derive(Debug)]
pub struct Forecaster {
    path: Option<PathBuf>,
    loaded: RwLock<Loaded>,
}

impl Forecaster {
    pub fn load(path: impl Into<PathBuf>) -> ForecastResult<Self> {
        let path = path.into();
        let modified = modified_at(&path);
        let model = GradientBoostedModel::load(&path)?;

        info!(path = %path.display(), lags = model.lags(), "loaded forecasting model");

        Ok(Self {
            path: Some(path),
            loaded: RwLock::new(Loaded {
                model: Arc::new(model),
                modified,
                failed_modified: None,
            }),
        })
    }

    /// A forecaster that is not backed by a file and never reloads.
    pub fn from_model(model: GradientBoostedModel) -> Self {
        Self {
            path: None,
            loaded: RwLock::new(Loaded {
                model: Arc::new(model),
                modified: None,
                failed_modified: None,
            }),
        }
    }

    pub fn model(&self) -> Arc<GradientBoostedModel> {
        let loaded = self.loaded.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&loaded.model)
    }

    /// Reloads the artifact if its modification time moved. Returns whether
    /// a new model was installed. On failure the current model stays and the
    /// same artifact is not parsed again.
    pub async fn reload_if_changed(&self) -> ForecastResult<bool> {
        let Some(path) = &self.path else {
            return Ok(false);
        };

        let modified = tokio::fs::metadata(path).await.and_then(|m| m.modified()).ok();
        if !self.is_stale(modified) {
            return Ok(false);
        }

        let artifact = path.clone();
        match task::spawn_blocking(move || GradientBoostedModel::load(artifact)).await? {
            Ok(model) => {
                let mut loaded = self.loaded.write().unwrap_or_else(PoisonError::into_inner);
                loaded.model = Arc::new(model);
                loaded.modified = modified;
                loaded.failed_modified = None;

                info!(path = %path.display(), "reloaded forecasting model");
                Ok(true)
            }
            Err(e) => {
                self.loaded.write().unwrap_or_else(PoisonError::into_inner).failed_modified = modified;

                warn!(path = %path.display(), error = %e, "keeping previous forecasting model");
                Err(e)
            }
        }
    }

    fn is_stale(&self, modified: Option<SystemTime>) -> bool {
        let loaded = self.loaded.read().unwrap_or_else(PoisonError::into_inner);
        modified.is_some() && modified != loaded.modified && modified != loaded.failed_modified
    }

    /// Forecasts `hours_ahead * 4` temperatures continuing `series`.
    pub fn forecast(&self, series: &ResampledSeries, hours_ahead: u32) -> ForecastResult<ForecastSeries> {
        let last = series.last_timestamp().ok_or(ForecastError::EmptySeries)?;
        let steps = hours_ahead as usize * STEPS_PER_HOUR;

        let values = self.model().predict(steps, &series.temperatures())?;

        let points = values
            .into_iter()
            .zip(1..)
            .map(|(temperature, step)| ForecastPoint {
                timestamp: last + interval() * step,
                temperature,
            })
            .collect();

        Ok(ForecastSeries { hours_ahead, points })
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
