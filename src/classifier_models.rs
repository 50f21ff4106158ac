use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::preprocessor::preprocess;

/// Multinomial linear bag-of-words classifier exported by the offline
/// training job as JSON:
///
/// ```json
/// { "labels": ["negative", "neutral", "positive"],
///   "bias": [0.1, 0.3, -0.2],
///   "weights": { "refund": [1.2, -0.1, -0.8] } }
/// ```
///
/// Each known token adds its weight vector to the bias; a softmax over the
/// result gives the class probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearTextModel {
    pub labels: Vec<String>,
    pub bias: Vec<f64>,
    pub weights: HashMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed model: {0}")]
    Shape(String),
}

impl LinearTextModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let model: LinearTextModel = serde_json::from_str(raw)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.labels.is_empty() {
            return Err(ModelError::Shape("model has no labels".to_string()));
        }
        if self.bias.len() != self.labels.len() {
            return Err(ModelError::Shape(format!(
                "bias has {} entries for {} labels",
                self.bias.len(),
                self.labels.len()
            )));
        }
        if let Some((token, weights)) = self
            .weights
            .iter()
            .find(|(_, weights)| weights.len() != self.labels.len())
        {
            return Err(ModelError::Shape(format!(
                "weights for '{}' have {} entries for {} labels",
                token,
                weights.len(),
                self.labels.len()
            )));
        }
        Ok(())
    }

    /// `None` when no token of `text` is in the vocabulary; callers fall back
    /// to the heuristics in that case.
    pub fn predict(&self, text: &str) -> Option<Prediction> {
        let mut logits = self.bias.clone();
        let mut known_tokens = 0;

        for token in preprocess(text) {
            if let Some(weights) = self.weights.get(&token) {
                known_tokens += 1;
                for (logit, weight) in logits.iter_mut().zip(weights) {
                    *logit += weight;
                }
            }
        }

        if known_tokens == 0 {
            return None;
        }

        let max_logit = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max_logit).exp()).collect();
        let total: f64 = exps.iter().sum();

        let mut best = 0;
        for (index, value) in exps.iter().enumerate() {
            if *value > exps[best] {
                best = index;
            }
        }

        Some(Prediction {
            label: self.labels[best].clone(),
            confidence: exps[best] / total,
        })
    }
}
