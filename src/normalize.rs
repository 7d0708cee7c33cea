//! Result normalization.
//!
//! This module turns a raw gateway response into a `NormalizedResult` the
//! presentation layer can render directly.
//!
//! The normalizer is responsible for:
//! - Defensive parsing of the semi-structured response at the boundary
//!   (absent fields default, never error)
//! - Decoding the visualization payload (data URI, bare base64, or URL)
//! - Saving the decoded visualization to a well-known file
//! - Aggregating detections into an insertion-ordered class histogram
//!
//! Every failure inside normalization is contained: a payload that cannot be
//! decoded or fetched yields no image (logged at warn), never an error
//! escaping `normalize`.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::DynamicImage;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use url::Url;

/// Well-known filename the latest visualization is saved under.
pub const VISUALIZATION_FILE: &str = "visualization_output.png";

/// Verdict used when the gateway returned no result entry.
pub const NO_RESULT_VERDICT: &str = "No inspection result available";

const DATA_URI_PREFIX: &str = "data:image";
// base64 renderings of the JPEG (FF D8) and PNG (89 50 4E 47) magic bytes
const JPEG_B64_PREFIX: &str = "/9j/";
const PNG_B64_PREFIX: &str = "iVBOR";

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// First result entry of a gateway response, or empty when the gateway
/// returned none. Opaque except for the three fields the normalizer reads.
#[derive(Clone, Debug, Default)]
pub struct RawInspectionResponse(Map<String, Value>);

impl RawInspectionResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap a result entry. Anything other than a JSON object is treated as
    /// an absent result.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// One bounding-box prediction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionRecord {
    /// Defect class label.
    pub class: String,
    /// Confidence fraction in [0, 1].
    pub confidence: f64,
    /// Box center x, pixels.
    pub x: f64,
    /// Box center y, pixels.
    pub y: f64,
    /// Box width, pixels.
    pub width: f64,
    /// Box height, pixels.
    pub height: f64,
}

impl DetectionRecord {
    /// Extract a record from one prediction entry. Absent or malformed
    /// fields default (`"Unknown"` for the class, 0 for numerics); no
    /// further numeric validation is performed.
    fn from_value(value: &Value) -> Self {
        Self {
            class: value
                .get("class")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
            confidence: num_field(value, "confidence"),
            x: num_field(value, "x"),
            y: num_field(value, "y"),
            width: num_field(value, "width"),
            height: num_field(value, "height"),
        }
    }
}

fn num_field(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Majority defect class of one inspection.
///
/// `None` is the legitimate no-defects outcome; `Error` is the sentinel for
/// a failed gateway call. The two are deliberately distinguishable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MajorityClass {
    None,
    Error,
    Class(String),
}

impl fmt::Display for MajorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Error => f.write_str("Error"),
            Self::Class(label) => f.write_str(label),
        }
    }
}

impl Serialize for MajorityClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Class-occurrence histogram preserving first-seen insertion order.
///
/// Order is part of the contract: the majority tie-break resolves to the
/// class seen first, and the report lists classes in encounter order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassCounts(Vec<(String, usize)>);

impl ClassCounts {
    pub fn increment(&mut self, label: &str) {
        match self.0.iter_mut().find(|(name, _)| name == label) {
            Some((_, count)) => *count += 1,
            None => self.0.push((label.to_string(), 1)),
        }
    }

    /// Label with the highest count; ties resolve to the first-seen label.
    pub fn majority(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for (name, count) in self.iter() {
            // strictly greater, so the earlier label wins ties
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((name, count));
            }
        }
        best.map(|(name, _)| name)
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.0
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts; equals the number of detections aggregated.
    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, count)| count).sum()
    }
}

impl Serialize for ClassCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

/// Display-ready summary of one inspection.
#[derive(Debug, Serialize)]
pub struct NormalizedResult {
    /// Decoded visualization image, when the response carried one.
    #[serde(skip)]
    pub visualization: Option<DynamicImage>,
    /// Free-text inspection verdict.
    pub verdict: String,
    /// Detection records in response order.
    pub detections: Vec<DetectionRecord>,
    /// Per-class occurrence counts, first-seen order.
    pub class_counts: ClassCounts,
    /// Most frequent detection class.
    pub majority_class: MajorityClass,
}

impl NormalizedResult {
    /// Degraded result for a failed gateway call. The presentation layer
    /// receives this instead of an error.
    pub fn degraded(error: &anyhow::Error) -> Self {
        Self {
            visualization: None,
            verdict: format!("Error: {:#}", error),
            detections: Vec::new(),
            class_counts: ClassCounts::default(),
            majority_class: MajorityClass::Error,
        }
    }
}

/// Single-pass transform from raw response to `NormalizedResult`.
///
/// Stateless between invocations; the only side effect is overwriting the
/// visualization file after a successful decode.
pub struct Normalizer {
    output_path: PathBuf,
    fetch_timeout: Duration,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(VISUALIZATION_FILE),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override where the decoded visualization is saved.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn normalize(&self, response: &RawInspectionResponse) -> NormalizedResult {
        let verdict = match response.field("inspection_result_json_output") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => NO_RESULT_VERDICT.to_string(),
            // a structured verdict is shown as its JSON rendering
            Some(other) => other.to_string(),
        };

        let detections: Vec<DetectionRecord> = response
            .field("model_predictions")
            .and_then(|preds| preds.get("predictions"))
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(DetectionRecord::from_value).collect())
            .unwrap_or_default();

        let visualization = match response.field("label_visualization").and_then(Value::as_str) {
            Some(payload) => match self.decode_visualization(payload) {
                Ok(image) => image,
                Err(e) => {
                    log::warn!("visualization decode failed: {:#}", e);
                    None
                }
            },
            None => None,
        };

        if let Some(image) = &visualization {
            if let Err(e) = image.save(&self.output_path) {
                log::warn!(
                    "failed to save visualization to {}: {}",
                    self.output_path.display(),
                    e
                );
            }
        }

        let mut class_counts = ClassCounts::default();
        for detection in &detections {
            class_counts.increment(&detection.class);
        }
        let majority_class = match class_counts.majority() {
            Some(label) => MajorityClass::Class(label.to_string()),
            None => MajorityClass::None,
        };

        NormalizedResult {
            visualization,
            verdict,
            detections,
            class_counts,
            majority_class,
        }
    }

    /// Decode a visualization payload. Ordered checks, first match wins:
    /// data URI, bare base64 with a known image signature, fetchable URL.
    /// Anything else is "no image available", not an error.
    fn decode_visualization(&self, payload: &str) -> Result<Option<DynamicImage>> {
        let bytes = if payload.starts_with(DATA_URI_PREFIX) {
            let encoded = payload
                .split_once(',')
                .map(|(_, body)| body)
                .unwrap_or(payload);
            BASE64
                .decode(encoded.trim())
                .context("decode data-uri visualization")?
        } else if payload.starts_with(JPEG_B64_PREFIX) || payload.starts_with(PNG_B64_PREFIX) {
            BASE64
                .decode(payload.trim())
                .context("decode inline base64 visualization")?
        } else if payload.starts_with("http") {
            self.fetch_visualization(payload)?
        } else {
            return Ok(None);
        };

        let image = image::load_from_memory(&bytes).context("decode visualization image")?;
        Ok(Some(image))
    }

    fn fetch_visualization(&self, raw_url: &str) -> Result<Vec<u8>> {
        let url = Url::parse(raw_url).context("parse visualization url")?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "unsupported visualization scheme '{}'",
                url.scheme()
            ));
        }
        // non-2xx statuses surface as errors from call()
        let response = ureq::get(url.as_str())
            .timeout(self.fetch_timeout)
            .call()
            .with_context(|| format!("fetch visualization from {}", raw_url))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .context("read visualization body")?;
        if bytes.is_empty() {
            return Err(anyhow!("empty visualization body"));
        }
        Ok(bytes)
    }
}
