//! Skin lesion image classification.
//!
//! - Preprocessing of uploaded images into network input tensors
//! - A frozen ONNX network behind the [`Classifier`] trait
//! - Softmax/argmax postprocessing and label mapping
//! - An [`InferenceService`] tying the steps together for request handlers

pub mod labels;
pub mod model;
pub mod postprocess;
pub mod preprocess;
pub mod service;

pub use labels::ClassLabels;
pub use model::{Classifier, OnnxClassifier};
pub use postprocess::{argmax, softmax, Prediction};
pub use preprocess::Preprocessor;
pub use service::InferenceService;

/// Re-exported so callers can implement [`Classifier`] without naming tract.
pub use tract_onnx::prelude::tract_ndarray::Array4;
