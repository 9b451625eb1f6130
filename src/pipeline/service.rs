//! Payload → prediction orchestration.
//!
//! `PredictionService` runs decode → canonicalize → infer, derives the digit
//! and confidence, and turns every stage failure into a `ServiceError`.
//! Nothing is retried. Every call emits exactly one `PredictionRecord`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use serde::Serialize;

use crate::error::{ServiceError, Stage};
use crate::pipeline::canonical::{CanonicalTensor, Canonicalizer};
use crate::pipeline::classifier::{Classifier, ProbabilityVector};
use crate::pipeline::codec;
use crate::pipeline::record::PredictionRecord;
use crate::pipeline::request::PredictRequest;

/// Successful response body.
///
/// `digit` is the argmax of `probabilities` (lowest index on ties) and
/// `confidence == probabilities[digit]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub digit: u8,
    pub confidence: f64,
    pub probabilities: ProbabilityVector,
}

impl PredictionResult {
    pub fn from_probabilities(probabilities: ProbabilityVector) -> Self {
        let digit = probabilities.argmax();
        PredictionResult {
            digit: digit as u8,
            confidence: probabilities.get(digit),
            probabilities,
        }
    }
}

/// Error response body: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorBody { error: message.into() }
    }
}

impl From<&ServiceError> for ErrorBody {
    fn from(err: &ServiceError) -> Self {
        ErrorBody::new(err.to_string())
    }
}

pub struct PredictionService<C> {
    classifier: C,
    canonicalizer: Canonicalizer,
}

impl<C: Classifier> PredictionService<C> {
    pub fn new(classifier: C) -> Self {
        Self::with_canonicalizer(classifier, Canonicalizer::default())
    }

    pub fn with_canonicalizer(classifier: C, canonicalizer: Canonicalizer) -> Self {
        PredictionService { classifier, canonicalizer }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    /// Validates a raw `POST /predict` body, then runs the pipeline on its
    /// `image` field. Schema errors stop before any stage runs.
    pub fn predict_json(&self, body: &[u8]) -> Result<PredictionResult, ServiceError> {
        self.observed(|| {
            let request = guarded(Stage::Request, || Ok(PredictRequest::from_slice(body)?))?;
            self.run(&request.image)
        })
    }

    /// Runs the pipeline on a `<header>,<base64>` payload.
    pub fn predict(&self, payload: &str) -> Result<PredictionResult, ServiceError> {
        self.observed(|| self.run(payload))
    }

    fn observed<F>(&self, f: F) -> Result<PredictionResult, ServiceError>
    where
        F: FnOnce() -> Result<PredictionResult, ServiceError>,
    {
        let started = Instant::now();
        let result = f();
        PredictionRecord::new(&result, started.elapsed()).emit();
        result
    }

    fn run(&self, payload: &str) -> Result<PredictionResult, ServiceError> {
        let image = guarded(Stage::Decode, || Ok(codec::decode(payload)?))?;
        let tensor = guarded(Stage::Canonicalize, || Ok(self.canonicalizer.canonicalize(&image)?))?;
        debug_assert!(tensor.is_canonical());
        let probabilities = self.infer(&tensor)?;
        Ok(PredictionResult::from_probabilities(probabilities))
    }

    fn infer(&self, tensor: &CanonicalTensor) -> Result<ProbabilityVector, ServiceError> {
        guarded(Stage::Infer, || Ok(self.classifier.infer(tensor)?))
    }
}

/// Runs one pipeline stage. A panic inside it becomes an internal error
/// tagged with `stage`, so the caller still gets a response and a record.
fn guarded<T, F>(stage: Stage, f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError>,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(ServiceError::internal(stage, format!("{} stage panicked: {}", stage, panic_message(&*payload))))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload.downcast_ref::<&str>().map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_owned())
}
