//! Score postprocessing: softmax, argmax and label mapping.

use super::labels::ClassLabels;
use crate::error::{LesionError, Result};
use serde::{Deserialize, Serialize};

/// Numerically stable softmax.
///
/// Returns an empty vector for empty input.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and value of the largest element. Ties resolve to the lowest index.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
}

/// A single classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted label.
    #[serde(rename = "class")]
    pub label: String,
    /// Probability of the predicted label, in [0, 1].
    pub confidence: f32,
    /// Full distribution, in label order.
    #[serde(skip)]
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// Pick the most probable class from a probability vector.
    pub fn from_probabilities(probabilities: Vec<f32>, labels: &ClassLabels) -> Result<Self> {
        if probabilities.len() != labels.len() {
            return Err(LesionError::Inference(format!(
                "model returned {} scores for {} classes",
                probabilities.len(),
                labels.len()
            )));
        }
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(LesionError::Inference(
                "model produced non-finite scores".to_string(),
            ));
        }

        let (index, confidence) = argmax(&probabilities)
            .ok_or_else(|| LesionError::Inference("empty probability vector".to_string()))?;
        let label = labels
            .get(index)
            .ok_or_else(|| LesionError::Inference(format!("no label for index {}", index)))?
            .to_string();

        Ok(Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
            probabilities,
        })
    }
}
