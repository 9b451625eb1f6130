//! Image-to-prediction pipeline: codec → canonicalizer → classifier,
//! orchestrated by `PredictionService`.

pub mod canonical;
pub mod classifier;
pub mod codec;
pub mod record;
pub mod request;
pub mod service;

pub use canonical::{CanonicalTensor, Canonicalizer, ResizeFilter, CANONICAL_LEN, CANONICAL_SHAPE, CANONICAL_SIDE};
pub use classifier::{Classifier, ClassifierHandle, ProbabilityVector, NUM_CLASSES, PROBABILITY_TOLERANCE};
pub use codec::{decode, DecodedImage};
pub use record::{Outcome, PredictionRecord, RECORD_TARGET};
pub use request::PredictRequest;
pub use service::{ErrorBody, PredictionResult, PredictionService};
