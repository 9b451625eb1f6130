use std::time::Duration;

use log::{log, Level};
use serde::Serialize;

use crate::error::{ErrorKind, ServiceError, Stage};
use crate::pipeline::service::PredictionResult;

/// Log target for per-request prediction records.
pub const RECORD_TARGET: &str = "ferrite_digits::prediction";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    InvalidRequest,
    InternalError,
}

/// One structured line per `predict` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digit: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub elapsed_us: u64,
    /// Full error text including the hidden cause of internal errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionRecord {
    pub fn new(result: &Result<PredictionResult, ServiceError>, elapsed: Duration) -> Self {
        let elapsed_us = elapsed.as_micros().min(u64::MAX as u128) as u64;
        match result {
            Ok(prediction) => PredictionRecord {
                outcome: Outcome::Ok,
                stage: None,
                digit: Some(prediction.digit),
                confidence: Some(prediction.confidence),
                elapsed_us,
                error: None,
            },
            Err(err) => PredictionRecord {
                outcome: match err.kind() {
                    ErrorKind::InvalidRequest => Outcome::InvalidRequest,
                    ErrorKind::InternalError => Outcome::InternalError,
                },
                stage: Some(err.stage()),
                digit: None,
                confidence: None,
                elapsed_us,
                error: Some(error_chain(err)),
            },
        }
    }

    pub fn level(&self) -> Level {
        match self.outcome {
            Outcome::Ok => Level::Info,
            Outcome::InvalidRequest => Level::Warn,
            Outcome::InternalError => Level::Error,
        }
    }

    /// Writes the record through the `log` facade. Never fails.
    pub fn emit(&self) {
        let line = serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"record_error":"{}"}}"#, e));
        log!(target: RECORD_TARGET, self.level(), "{}", line);
    }
}

/// `err: cause: cause...`
fn error_chain(err: &ServiceError) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
