//! Model wrapper around a frozen ONNX classification network.

use super::labels::ClassLabels;
use super::postprocess::softmax;
use super::preprocess::CHANNELS;
use crate::config::{Device, ModelConfig};
use crate::error::{LesionError, Result};
use std::path::Path;
use tract_onnx::prelude::*;
use tract_onnx::prelude::tract_ndarray::Array4;
use tracing::info;

/// A loaded, inference-only image classifier.
///
/// Implementations must be safe to call from several threads at once.
pub trait Classifier: Send + Sync {
    /// Run a forward pass and return the raw scores of batch item 0.
    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>>;

    /// Width of the output layer.
    fn num_classes(&self) -> usize;

    /// Device the forward pass runs on.
    fn device(&self) -> Device {
        Device::Cpu
    }

    /// Forward pass followed by softmax.
    fn infer(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        let scores = self.forward(input)?;
        Ok(softmax(&scores))
    }
}

type Plan = TypedRunnableModel<TypedModel>;

/// Classifier backed by an optimized tract plan.
///
/// The plan is immutable after load; `run` allocates per-call state, so
/// concurrent forward passes need no lock.
pub struct OnnxClassifier {
    plan: Plan,
    num_classes: usize,
    device: Device,
    input_size: usize,
}

impl OnnxClassifier {
    /// Load the model and check its output layer against `labels`.
    ///
    /// Any failure here is fatal at startup.
    pub fn load(config: &ModelConfig, labels: &ClassLabels) -> Result<Self> {
        let input_size = config.preprocess.image_size as usize;
        let device = config.device.resolve();
        let plan = build_plan(&config.path, input_size)?;

        let mut classifier = Self {
            plan,
            num_classes: 0,
            device,
            input_size,
        };

        // Warm-up pass doubles as an output shape check.
        let scores = classifier.forward(Array4::zeros((1, CHANNELS, input_size, input_size)))?;
        if scores.len() != labels.len() {
            return Err(LesionError::ModelLoad(format!(
                "model has {} outputs but {} class labels are configured",
                scores.len(),
                labels.len()
            )));
        }
        classifier.num_classes = scores.len();

        info!(
            path = %config.path.display(),
            classes = classifier.num_classes,
            device = %device,
            requested_device = %config.device,
            "Model loaded"
        );
        Ok(classifier)
    }
}

fn build_plan(path: &Path, input_size: usize) -> Result<Plan> {
    if !path.is_file() {
        return Err(LesionError::ModelLoad(format!(
            "model file not found: {}",
            path.display()
        )));
    }

    let load = || -> TractResult<Plan> {
        tract_onnx::onnx()
            .model_for_path(path)?
            .with_input_fact(
                0,
                f32::fact([1, CHANNELS, input_size, input_size]).into(),
            )?
            .into_optimized()?
            .into_runnable()
    };

    load().map_err(|e| LesionError::ModelLoad(format!("{}: {:#}", path.display(), e)))
}

impl Classifier for OnnxClassifier {
    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        let expected = [1, CHANNELS, self.input_size, self.input_size];
        if input.shape() != expected {
            return Err(LesionError::Inference(format!(
                "expected input shape {:?}, got {:?}",
                expected,
                input.shape()
            )));
        }

        let outputs = self
            .plan
            .run(tvec!(input.into_tensor().into()))
            .map_err(|e| LesionError::Inference(format!("{:#}", e)))?;

        let output = outputs
            .first()
            .ok_or_else(|| LesionError::Inference("model produced no outputs".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| LesionError::Inference(format!("{:#}", e)))?;

        Ok(view.iter().copied().collect())
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn device(&self) -> Device {
        self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<f32>);

    impl Classifier for Fixed {
        fn forward(&self, _input: Array4<f32>) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        fn num_classes(&self) -> usize {
            self.0.len()
        }
    }

    #[test]
    fn test_infer_applies_softmax() {
        let model = Fixed(vec![2.0, -1.0]);
        let probs = model.infer(Array4::zeros((1, 3, 224, 224))).unwrap();
        assert_eq!(probs.len(), 2);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(probs[0] > probs[1]);
        assert_eq!(model.device(), Device::Cpu);
    }

    #[test]
    fn test_load_missing_file() {
        let config = ModelConfig {
            path: "/nonexistent/model.onnx".into(),
            ..ModelConfig::default()
        };
        let result = OnnxClassifier::load(&config, &ClassLabels::default());
        assert!(matches!(result, Err(LesionError::ModelLoad(_))));
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.onnx");
        std::fs::write(&path, b"definitely not protobuf").unwrap();

        let config = ModelConfig {
            path,
            ..ModelConfig::default()
        };
        let result = OnnxClassifier::load(&config, &ClassLabels::default());
        match result {
            Err(e) => assert!(e.is_startup_fatal()),
            Ok(_) => panic!("corrupt model loaded"),
        }
    }
}
