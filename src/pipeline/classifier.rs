//! The loaded digit classifier.
//!
//! The artifact is a JSON `Network` (see `Network::save_json`). It is
//! validated once at load time so that every later `infer` call can rely on
//! the architecture: 784 inputs, 10 softmax outputs, consistent layer
//! shapes, finite parameters.

use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::activation::activation::ActivationFunction;
use crate::error::{InferenceError, ModelLoadError};
use crate::network::Network;
use crate::pipeline::canonical::{CanonicalTensor, CANONICAL_LEN, CANONICAL_SHAPE, CANONICAL_SIDE};

/// Number of digit classes.
pub const NUM_CLASSES: usize = 10;

/// Maximum distance of a probability vector's sum from 1.0.
pub const PROBABILITY_TOLERANCE: f64 = 1e-3;

/// Ten class probabilities; index `i` is the confidence for digit `i`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProbabilityVector([f64; NUM_CLASSES]);

impl ProbabilityVector {
    /// Validates that `values` is a distribution: finite, non-negative, and
    /// summing to within `PROBABILITY_TOLERANCE` of 1.0.
    pub fn new(values: [f64; NUM_CLASSES]) -> Result<Self, InferenceError> {
        if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite() || **v < 0.0) {
            return Err(InferenceError::InvalidOutput(format!("component {} is {}", i, v)));
        }
        let sum: f64 = values.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(InferenceError::InvalidOutput(format!("components sum to {}", sum)));
        }
        Ok(ProbabilityVector(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, class: usize) -> f64 {
        self.0[class]
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Index of the largest probability; the lowest index wins ties.
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (i, &p) in self.0.iter().enumerate().skip(1) {
            if p > self.0[best] {
                best = i;
            }
        }
        best
    }
}

impl TryFrom<Vec<f64>> for ProbabilityVector {
    type Error = InferenceError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        let len = values.len();
        let arr: [f64; NUM_CLASSES] = values.try_into().map_err(|_| {
            InferenceError::InvalidOutput(format!("expected {} classes, got {}", NUM_CLASSES, len))
        })?;
        ProbabilityVector::new(arr)
    }
}

/// Anything that maps a canonical tensor to a digit distribution.
///
/// Implementations must be callable concurrently through `&self`.
pub trait Classifier: Send + Sync {
    fn infer(&self, tensor: &CanonicalTensor) -> Result<ProbabilityVector, InferenceError>;
}

/// Owns the loaded artifact. Weights are never mutated after `load`, so a
/// single handle is shared by every request thread without locking.
#[derive(Debug)]
pub struct ClassifierHandle {
    network: Network,
    path: PathBuf,
}

impl ClassifierHandle {
    /// Reads and validates the artifact at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref().to_path_buf();
        let network = Network::load_json(&path)
            .map_err(|source| ModelLoadError::Read { path: path.clone(), source })?;
        Self::with_path(network, path)
    }

    /// Validates an in-memory network.
    pub fn from_network(network: Network) -> Result<Self, ModelLoadError> {
        Self::with_path(network, PathBuf::from("<memory>"))
    }

    fn with_path(network: Network, path: PathBuf) -> Result<Self, ModelLoadError> {
        if let Err(reason) = check_architecture(&network) {
            return Err(ModelLoadError::Incompatible { path, reason });
        }
        let handle = ClassifierHandle { network, path };
        info!("loaded classifier from {}: {}", handle.path.display(), handle.summary());
        Ok(handle)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Architecture as `784 → 128 (ReLU) → 10 (Softmax)`.
    pub fn summary(&self) -> String {
        let mut parts = vec![self.network.input_size().unwrap_or(0).to_string()];
        parts.extend(
            self.network.layers.iter()
                .map(|l| format!("{} ({:?})", l.size, l.activator)),
        );
        parts.join(" → ")
    }
}

impl Classifier for ClassifierHandle {
    fn infer(&self, tensor: &CanonicalTensor) -> Result<ProbabilityVector, InferenceError> {
        if !tensor.is_canonical() {
            return Err(InferenceError::ShapeMismatch {
                expected: CANONICAL_SHAPE,
                actual: tensor.shape(),
                len: tensor.as_slice().len(),
            });
        }
        let output = self.network.forward(tensor.as_slice());
        ProbabilityVector::try_from(output)
    }
}

/// Checks that `network` maps a canonical tensor to a 10-class softmax.
fn check_architecture(network: &Network) -> Result<(), String> {
    if network.layers.is_empty() {
        return Err("network has no layers".into());
    }

    let mut fan_in = CANONICAL_LEN;
    for (i, layer) in network.layers.iter().enumerate() {
        let (w, b) = (&layer.weights, &layer.biases);
        if !w.is_well_formed() || !b.is_well_formed() {
            return Err(format!("layer {}: parameter matrix dimensions disagree with its data", i));
        }
        if w.rows != fan_in {
            return Err(format!("layer {}: expects {} inputs, previous stage provides {}", i, w.rows, fan_in));
        }
        if layer.size == 0 || w.cols != layer.size {
            return Err(format!("layer {}: declares {} neurons but weights have {} columns", i, layer.size, w.cols));
        }
        if b.rows != 1 || b.cols != layer.size {
            return Err(format!("layer {}: biases are {}x{}, expected 1x{}", i, b.rows, b.cols, layer.size));
        }
        if !w.all_finite() || !b.all_finite() {
            return Err(format!("layer {}: contains non-finite parameters", i));
        }
        fan_in = layer.size;
    }

    if fan_in != NUM_CLASSES {
        return Err(format!("output layer has {} neurons, expected {}", fan_in, NUM_CLASSES));
    }
    if let Some(last) = network.layers.last() {
        if last.activator != ActivationFunction::Softmax {
            return Err(format!("output activation is {:?}, expected Softmax", last.activator));
        }
    }

    if let Some(meta) = &network.metadata {
        if let Some(input) = &meta.input_type {
            if !input.is_grayscale_square(CANONICAL_SIDE) {
                return Err(format!("declared input type {:?} is not a 28x28 grayscale image", input));
            }
        }
        if let Some(labels) = &meta.output_labels {
            if labels.len() != NUM_CLASSES {
                return Err(format!("declares {} output labels, expected {}", labels.len(), NUM_CLASSES));
            }
        }
    }
    Ok(())
}
