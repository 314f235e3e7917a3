//! Gradient-boosted regression trees over lagged temperatures.
//!
//! Artifact layout (JSON):
//!
//! ```json
//! {
//!   "lags": 4,
//!   "base_score": 25.0,
//!   "trees": [
//!     [
//!       { "split": { "feature": 3, "threshold": 26.5, "left": 1, "right": 2 } },
//!       { "leaf": -0.2 },
//!       { "leaf": 0.3 }
//!     ]
//!   ]
//! }
//! ```
//!
//! Feature `i` is the temperature `lags - i` steps before the predicted one,
//! so feature `lags - 1` is the most recent observation.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use super::{ForecastError, ForecastResult};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Samples with `features[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Children always come after their parent, which keeps traversal finite.
    fn validate(&self, lags: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = *node
            {
                if feature >= lags {
                    return Err(format!("node {index} splits on feature {feature}, model has {lags} lags"));
                }
                for child in [left, right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(format!("node {index} has invalid child {child}"));
                    }
                }
            }
        }

        Ok(())
    }

    fn evaluate(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GradientBoostedModel {
    lags: usize,

    #[serde(default)]
    base_score: f64,

    trees: Vec<Tree>,
}

impl GradientBoostedModel {
    pub fn new(lags: usize, base_score: f64, trees: Vec<Tree>) -> ForecastResult<Self> {
        let model = Self {
            lags,
            base_score,
            trees,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: impl AsRef<Path>) -> ForecastResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader(reader: impl Read) -> ForecastResult<Self> {
        let model: Self = serde_json::from_reader(reader)?;
        model.validate()?;
        Ok(model)
    }

    pub fn lags(&self) -> usize {
        self.lags
    }

    fn validate(&self) -> ForecastResult<()> {
        if self.lags == 0 {
            return Err(ForecastError::InvalidModel("lags must be positive".into()));
        }
        if self.trees.is_empty() {
            return Err(ForecastError::InvalidModel("model has no trees".into()));
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(self.lags)
                .map_err(|e| ForecastError::InvalidModel(format!("tree {index}: {e}")))?;
        }
        Ok(())
    }

    fn predict_one(&self, features: &[f64]) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.evaluate(features)).sum::<f64>()
    }

    /// Predicts `steps` values following `history`. Each prediction is fed
    /// back as the most recent lag of the next step.
    pub fn predict(&self, steps: usize, history: &[f64]) -> ForecastResult<Vec<f64>> {
        if history.len() < self.lags {
            return Err(ForecastError::InsufficientHistory {
                required: self.lags,
                available: history.len(),
            });
        }

        let mut window: VecDeque<f64> = history[history.len() - self.lags..].iter().copied().collect();
        let mut predictions = Vec::with_capacity(steps);

        for _ in 0..steps {
            let value = self.predict_one(window.make_contiguous());
            predictions.push(value);
            window.pop_front();
            window.push_back(value);
        }

        Ok(predictions)
    }
}
