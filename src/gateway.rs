//! Inference gateway client.
//!
//! One synchronous HTTP call per inspection, no retries, caching explicitly
//! disabled so repeated calls always reflect the latest remote workflow
//! definition.
//!
//! `inspect` is the uniform-degradation boundary: every gateway-level
//! failure (unreadable image, transport error, rejected credentials,
//! malformed response) becomes a degraded `NormalizedResult` with an
//! `"Error: ..."` verdict. The presentation layer never sees an unhandled
//! failure from this call.

use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use crate::config::GatewayConfig;
use crate::normalize::{NormalizedResult, Normalizer, RawInspectionResponse};

pub struct GatewayClient {
    config: GatewayConfig,
    normalizer: Normalizer,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> Self {
        let normalizer = Normalizer::new().with_output_path(&config.visualization_path);
        Self {
            config: config.clone(),
            normalizer,
        }
    }

    /// Inspect one image: run the workflow, normalize the response. Never
    /// fails; gateway errors degrade into the result itself.
    pub fn inspect(&self, image_path: &Path) -> NormalizedResult {
        match self.run_workflow(image_path) {
            Ok(response) => {
                if response.is_empty() {
                    log::info!("gateway returned no result entry");
                }
                self.normalizer.normalize(&response)
            }
            Err(e) => {
                log::warn!("inspection failed for {}: {:#}", image_path.display(), e);
                NormalizedResult::degraded(&e)
            }
        }
    }

    /// Perform the workflow call and return the first result entry, or an
    /// empty response when the gateway returned none.
    pub fn run_workflow(&self, image_path: &Path) -> Result<RawInspectionResponse> {
        let image_bytes = std::fs::read(image_path)
            .with_context(|| format!("read image {}", image_path.display()))?;
        let body = json!({
            "api_key": self.config.api_key,
            "inputs": {
                "image": { "type": "base64", "value": BASE64.encode(&image_bytes) },
            },
            "use_cache": false,
        });

        let response = ureq::post(&self.workflow_url())
            .send_json(body)
            .context("call workflow endpoint")?;
        let payload: Value = response.into_json().context("parse workflow response")?;
        Ok(first_result_entry(payload))
    }

    fn workflow_url(&self) -> String {
        format!(
            "{}/infer/workflows/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.workspace,
            self.config.workflow
        )
    }
}

/// The gateway responds with `{"outputs": [entry, ...]}`; older deployments
/// return the bare array. Only the first entry is consumed.
fn first_result_entry(payload: Value) -> RawInspectionResponse {
    let entries = match payload {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("outputs") {
            Some(Value::Array(entries)) => entries,
            _ => return RawInspectionResponse::empty(),
        },
        _ => return RawInspectionResponse::empty(),
    };
    entries
        .into_iter()
        .next()
        .map(RawInspectionResponse::from_value)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_url_joins_without_double_slash() {
        let config = GatewayConfig {
            api_url: "https://gateway.example.com/".to_string(),
            workspace: "acme".to_string(),
            workflow: "pcb-defects".to_string(),
            ..GatewayConfig::default()
        };
        let client = GatewayClient::new(&config);
        assert_eq!(
            client.workflow_url(),
            "https://gateway.example.com/infer/workflows/acme/pcb-defects"
        );
    }

    #[test]
    fn first_entry_taken_from_outputs_array() {
        let response = first_result_entry(json!({
            "outputs": [
                { "inspection_result_json_output": "PASS" },
                { "inspection_result_json_output": "ignored" },
            ],
        }));
        assert!(!response.is_empty());
    }

    #[test]
    fn bare_array_response_is_accepted() {
        let response = first_result_entry(json!([
            { "inspection_result_json_output": "PASS" },
        ]));
        assert!(!response.is_empty());
    }

    #[test]
    fn missing_or_empty_outputs_yield_empty_response() {
        assert!(first_result_entry(json!({})).is_empty());
        assert!(first_result_entry(json!({ "outputs": [] })).is_empty());
        assert!(first_result_entry(json!("unexpected")).is_empty());
        assert!(first_result_entry(json!([42])).is_empty());
    }
}
