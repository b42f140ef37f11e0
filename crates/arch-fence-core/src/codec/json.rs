//! JSON cache payloads, for entries that should be readable by hand.

use super::{CodecError, PayloadCodec};
use crate::types::Violation;

/// Serializes violations as a JSON array.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Creates the codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PayloadCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, violations: &[Violation]) -> Vec<u8> {
        // Serializing plain strings and bools into memory cannot fail.
        serde_json::to_vec(violations).unwrap_or_else(|_| b"[]".to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<Violation>, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Json(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ViolationKind;

    #[test]
    fn round_trip() {
        let codec = JsonCodec::new();
        let v = vec![Violation::new(
            "src/a.rs",
            "crate::b",
            "src",
            ViolationKind::Prohibited,
            "because «reasons»",
        )];
        assert_eq!(codec.decode(&codec.encode(&v)).unwrap(), v);
    }

    #[test]
    fn garbage_is_an_error() {
        let codec = JsonCodec::new();
        assert!(matches!(codec.decode(b"{not json"), Err(CodecError::Json(_))));
    }
}
