//! Extracts a structured JSON payload from an advisory-model text reply.
//!
//! Generative models wrap JSON in markdown code fences often enough that
//! the fences are stripped before parsing; anything still unparsable is an
//! explicit [`AdvisoryError::MalformedResponse`], never a best-effort
//! value.

use serde::de::DeserializeOwned;

use super::AdvisoryError;

pub(crate) fn decode_payload<T: DeserializeOwned>(raw: &str) -> Result<T, AdvisoryError> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(AdvisoryError::MalformedResponse(
            "empty advisory reply".to_string(),
        ));
    }
    serde_json::from_str(cleaned).map_err(|err| AdvisoryError::MalformedResponse(err.to_string()))
}
