use serde::{Deserialize, Serialize};

/// Input encoding a saved model was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputType {
    Numeric,
    ImageGrayscale { width: u32, height: u32 },
    ImageRgb { width: u32, height: u32 },
}

impl InputType {
    /// True for a `side × side` single-channel image input.
    pub fn is_grayscale_square(&self, side: u32) -> bool {
        matches!(self, InputType::ImageGrayscale { width, height } if *width == side && *height == side)
    }
}

/// Optional annotations stored next to the weights. Every field may be
/// absent; artifacts exported without metadata load unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    pub input_type: Option<InputType>,
    pub output_labels: Option<Vec<String>>,
}

impl ModelMetadata {
    /// Metadata for a 28×28 grayscale digit classifier labelled "0".."9".
    pub fn digit_classifier(description: impl Into<String>) -> Self {
        ModelMetadata {
            description: Some(description.into()),
            input_type: Some(InputType::ImageGrayscale { width: 28, height: 28 }),
            output_labels: Some((0..10).map(|d| d.to_string()).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_type_uses_tagged_json() {
        let json = serde_json::to_string(&InputType::ImageGrayscale { width: 28, height: 28 }).unwrap();
        assert_eq!(json, r#"{"type":"ImageGrayscale","width":28,"height":28}"#);
        let back: InputType = serde_json::from_str(&json).unwrap();
        assert!(back.is_grayscale_square(28));
        assert!(!InputType::ImageRgb { width: 28, height: 28 }.is_grayscale_square(28));
    }

    #[test]
    fn digit_classifier_metadata_has_ten_labels() {
        let meta = ModelMetadata::digit_classifier("mnist mlp");
        assert_eq!(meta.output_labels.as_deref().map(|l| l.len()), Some(10));
        assert_eq!(meta.output_labels.unwrap()[7], "7");
    }
}
