pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod pipeline;
pub mod error;
pub mod config;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{InputType, ModelMetadata, Network};
pub use pipeline::{
    Canonicalizer, CanonicalTensor, Classifier, ClassifierHandle, DecodedImage, ErrorBody,
    PredictionResult, PredictionService, ProbabilityVector, ResizeFilter,
};
pub use error::{
    CanonicalizationError, DecodeError, ErrorKind, InferenceError, ModelLoadError, RequestError,
    ServiceError, Stage,
};
pub use config::{ConfigError, ServeConfig};
