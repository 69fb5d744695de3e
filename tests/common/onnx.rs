//! Tiny ONNX classifiers built in memory.
//!
//! `GlobalAveragePool -> Flatten -> Gemm(transB)`: the per-channel means of
//! the input are mapped to `classes` scores through weights `0.0, 0.1, 0.2,
//! ...` (row-major, `[classes, 3]`) and biases `0, 1, 2, ...`.

use prost::Message;
use std::path::{Path, PathBuf};
use tract_onnx::pb::{
    type_proto, AttributeProto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto,
    TensorProto, TypeProto, ValueInfoProto,
};

const FLOAT: i32 = 1;
const ATTRIBUTE_INT: i32 = 2;

fn node(op: &str, inputs: &[&str], output: &str) -> NodeProto {
    NodeProto {
        op_type: op.to_string(),
        input: inputs.iter().map(|s| s.to_string()).collect(),
        output: vec![output.to_string()],
        ..Default::default()
    }
}

fn initializer(name: &str, dims: Vec<i64>, float_data: Vec<f32>) -> TensorProto {
    TensorProto {
        name: name.to_string(),
        dims,
        data_type: FLOAT,
        float_data,
        ..Default::default()
    }
}

/// Serialized model with `classes` outputs.
pub fn pooled_linear_model(classes: i64) -> Vec<u8> {
    let mut gemm = node("Gemm", &["pooled_flat", "weight", "bias"], "scores");
    gemm.attribute.push(AttributeProto {
        name: "transB".to_string(),
        r#type: ATTRIBUTE_INT,
        i: 1,
        ..Default::default()
    });

    let input_type = TypeProto {
        value: Some(type_proto::Value::TensorType(type_proto::Tensor {
            elem_type: FLOAT,
            shape: None,
        })),
        ..Default::default()
    };

    let graph = GraphProto {
        name: "pooled_linear".to_string(),
        node: vec![
            node("GlobalAveragePool", &["image"], "pooled"),
            node("Flatten", &["pooled"], "pooled_flat"),
            gemm,
        ],
        initializer: vec![
            initializer(
                "weight",
                vec![classes, 3],
                (0..3 * classes).map(|i| i as f32 * 0.1).collect(),
            ),
            initializer("bias", vec![classes], (0..classes).map(|i| i as f32).collect()),
        ],
        input: vec![ValueInfoProto {
            name: "image".to_string(),
            r#type: Some(input_type),
            ..Default::default()
        }],
        output: vec![ValueInfoProto {
            name: "scores".to_string(),
            ..Default::default()
        }],
        ..Default::default()
    };

    ModelProto {
        ir_version: 7,
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: 13,
        }],
        graph: Some(graph),
        ..Default::default()
    }
    .encode_to_vec()
}

/// Write a model with `classes` outputs to `dir/name`.
pub fn write_model(dir: &Path, name: &str, classes: i64) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, pooled_linear_model(classes)).expect("Failed to write model");
    path
}
