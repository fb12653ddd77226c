use serde_json::Value;

use super::gateway::GatewayError;
use super::validation::ValidationError;

/// Isolate the JSON object in a free-text model answer
///
/// Models sometimes wrap JSON in markdown fences or add a sentence before or
/// after it. Strips fences, then takes the outermost `{ ... }`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let mut text = text.trim();

    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    let text = text.trim();

    let first = text.find('{')?;
    let last = text.rfind('}')?;
    (last > first).then(|| &text[first..=last])
}

/// Decode a free-text answer as the JSON object `schema` expects
pub fn decode_text_response(schema: &'static str, text: &str) -> Result<Value, GatewayError> {
    if text.trim().is_empty() {
        return Err(GatewayError::EmptyResponse);
    }

    let json = extract_json_object(text).ok_or_else(|| ValidationError::Shape {
        schema,
        message: "no JSON object in response".to_string(),
    })?;

    serde_json::from_str(json).map_err(|e| {
        GatewayError::Validation(ValidationError::Shape {
            schema,
            message: e.to_string(),
        })
    })
}
