use serde::Deserialize;
use serde_json::Value;

use crate::error::RequestError;

/// Body of `POST /predict`: `{"image": "<header>,<base64>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictRequest {
    pub image: String,
}

/// Wire schema. `image` stays loosely typed so a wrong type can be told
/// apart from a missing field. Extra fields are ignored.
#[derive(Deserialize)]
struct RawRequest {
    #[serde(default)]
    image: Option<Value>,
}

impl PredictRequest {
    /// Validates the raw body against the schema before any pipeline stage
    /// runs. A non-object body or a `null` image counts as missing.
    pub fn from_slice(body: &[u8]) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_slice(body).map_err(RequestError::MalformedJson)?;
        if !value.is_object() {
            return Err(RequestError::MissingImage);
        }
        let raw = RawRequest::deserialize(value).map_err(RequestError::MalformedJson)?;
        match raw.image {
            None | Some(Value::Null) => Err(RequestError::MissingImage),
            Some(Value::String(image)) => Ok(PredictRequest { image }),
            Some(_) => Err(RequestError::ImageNotString),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_image_string_and_ignores_extras() {
        let req = PredictRequest::from_slice(br#"{"image":"data:,AAAA","client":"web"}"#).unwrap();
        assert_eq!(req.image, "data:,AAAA");
    }

    #[test]
    fn schema_violations() {
        assert!(matches!(PredictRequest::from_slice(b"{}"), Err(RequestError::MissingImage)));
        assert!(matches!(PredictRequest::from_slice(br#"{"image":null}"#), Err(RequestError::MissingImage)));
        assert!(matches!(PredictRequest::from_slice(b"[1,2]"), Err(RequestError::MissingImage)));
        assert!(matches!(PredictRequest::from_slice(b"\"data:,AAAA\""), Err(RequestError::MissingImage)));
        assert!(matches!(PredictRequest::from_slice(br#"{"image":["a"]}"#), Err(RequestError::ImageNotString)));
        assert!(matches!(PredictRequest::from_slice(br#"{"image":42}"#), Err(RequestError::ImageNotString)));
        assert!(matches!(PredictRequest::from_slice(b""), Err(RequestError::MalformedJson(_))));
        assert!(matches!(PredictRequest::from_slice(b"{image:"), Err(RequestError::MalformedJson(_))));
    }
}
