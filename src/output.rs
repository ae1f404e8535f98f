//! The reportable result of one invocation.

use crate::error::PipelineError;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Result of a document that passed the content-type check.
///
/// Exactly one of the two shapes exists; a wrong content type produces no
/// `Outcome` at all.
#[derive(Debug)]
pub enum Outcome {
    /// Every page was uploaded. One locator per page, in page order.
    Published { image_urls: Vec<String> },
    /// The document failed in one stage.
    Failed(PipelineError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Published { .. })
    }

    pub fn image_urls(&self) -> Option<&[String]> {
        match self {
            Outcome::Published { image_urls } => Some(image_urls),
            Outcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            Outcome::Published { .. } => None,
            Outcome::Failed(e) => Some(e),
        }
    }

    /// Convert into a `Result`, for callers that prefer `?`.
    pub fn into_result(self) -> Result<Vec<String>, PipelineError> {
        match self {
            Outcome::Published { image_urls } => Ok(image_urls),
            Outcome::Failed(e) => Err(e),
        }
    }
}

/// Serialises as `{"imageUrls": [...]}` or `{"error": "..."}`.
impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Outcome::Published { image_urls } => map.serialize_entry("imageUrls", image_urls)?,
            Outcome::Failed(e) => map.serialize_entry("error", &e.to_string())?,
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_serialises_single_key() {
        let o = Outcome::Published {
            image_urls: vec!["https://a/c/image-page0-1.png".into()],
        };
        let v = serde_json::to_value(&o).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(v["imageUrls"][0], "https://a/c/image-page0-1.png");
    }

    #[test]
    fn empty_publication_is_well_formed() {
        let o = Outcome::Published { image_urls: vec![] };
        assert_eq!(serde_json::to_string(&o).unwrap(), r#"{"imageUrls":[]}"#);
        assert!(o.is_success());
    }

    #[test]
    fn failure_serialises_message_only() {
        let o = Outcome::Failed(PipelineError::conversion("not a PDF"));
        let v = serde_json::to_value(&o).unwrap();
        assert_eq!(v.as_object().unwrap().len(), 1);
        assert_eq!(v["error"], "Error converting PDF to images: not a PDF");
        assert!(o.image_urls().is_none());
        assert!(o.into_result().is_err());
    }
}
