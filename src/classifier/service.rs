//! Inference service: bytes in, labelled prediction out.

use super::labels::ClassLabels;
use super::model::Classifier;
use super::postprocess::Prediction;
use super::preprocess::Preprocessor;
use crate::error::{LesionError, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Runs one uploaded image through preprocessing, the model, and label
/// mapping. One call is one synchronous forward pass; there is no batching.
#[derive(Clone)]
pub struct InferenceService {
    preprocessor: Arc<Preprocessor>,
    model: Arc<dyn Classifier>,
    labels: Arc<ClassLabels>,
}

impl InferenceService {
    /// Create a service. The model's output width must match the labels.
    pub fn new(
        model: Arc<dyn Classifier>,
        labels: ClassLabels,
        preprocessor: Preprocessor,
    ) -> Result<Self> {
        if model.num_classes() != labels.len() {
            return Err(LesionError::ModelLoad(format!(
                "model has {} outputs but {} class labels are configured",
                model.num_classes(),
                labels.len()
            )));
        }

        Ok(Self {
            preprocessor: Arc::new(preprocessor),
            model,
            labels: Arc::new(labels),
        })
    }

    /// Classify an encoded image on the blocking thread pool.
    pub async fn predict(&self, image: Vec<u8>) -> Result<Prediction> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.predict_blocking(&image))
            .await
            .map_err(|e| LesionError::Internal(format!("inference task failed: {}", e)))?
    }

    /// Classify an encoded image on the calling thread.
    pub fn predict_blocking(&self, image: &[u8]) -> Result<Prediction> {
        let started = Instant::now();
        let input = self.preprocessor.preprocess(image)?;
        let probabilities = self.model.infer(input)?;
        let prediction = Prediction::from_probabilities(probabilities, &self.labels)?;

        debug!(
            class = %prediction.label,
            confidence = prediction.confidence,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Prediction complete"
        );
        Ok(prediction)
    }

    /// The label set.
    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    /// The loaded model.
    pub fn model(&self) -> &dyn Classifier {
        self.model.as_ref()
    }
}
