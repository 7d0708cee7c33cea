//! Plain-text inspection report.
//!
//! Renders a `NormalizedResult` into the sectioned report the operator
//! reads: verdict, defect analysis with per-class distribution, a note on
//! the saved visualization, and the detailed per-detection listing.

use std::fmt::Write;
use std::path::Path;

use crate::normalize::NormalizedResult;

const DETECTION_RULE: &str = "----------------------------------------";

/// One-line summary for a status display.
pub fn summary_line(result: &NormalizedResult) -> String {
    if result.detections.is_empty() {
        "No defects detected".to_string()
    } else {
        format!(
            "Total: {} defects | Primary Type: {}",
            result.detections.len(),
            result.majority_class
        )
    }
}

/// Full report. `visualization_path` names the file the image was saved
/// under (only mentioned when an image was actually decoded).
pub fn render_report(result: &NormalizedResult, visualization_path: &Path) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== INSPECTION RESULT ===");
    let _ = writeln!(out, "Status: {}", result.verdict);
    let _ = writeln!(out);

    let _ = writeln!(out, "=== DEFECT ANALYSIS ===");
    if result.detections.is_empty() {
        let _ = writeln!(out, "No defects detected");
        let _ = writeln!(out);
    } else {
        let total = result.detections.len();
        let _ = writeln!(out, "Total Detections: {}", total);
        let _ = writeln!(out, "Primary Defect Type: {}", result.majority_class);
        let _ = writeln!(out);
        let _ = writeln!(out, "Class Distribution:");
        for (class, count) in result.class_counts.iter() {
            let percentage = (count as f64 / total as f64) * 100.0;
            let _ = writeln!(out, "  • {}: {} ({:.1}%)", class, count, percentage);
        }
        let _ = writeln!(out);
    }

    if result.visualization.is_some() {
        let _ = writeln!(out, "✓ Visualization image loaded");
        let _ = writeln!(out, "✓ Saved as '{}'", visualization_path.display());
    } else {
        let _ = writeln!(out, "✗ No visualization image available");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "=== DETAILED DETECTIONS ===");
    if result.detections.is_empty() {
        let _ = writeln!(out, "No detections found");
    } else {
        for (index, detection) in result.detections.iter().enumerate() {
            let _ = writeln!(out, "Detection {}:", index + 1);
            let _ = writeln!(out, "  Type: {}", detection.class);
            let _ = writeln!(out, "  Confidence: {:.1}%", detection.confidence * 100.0);
            let _ = writeln!(
                out,
                "  Position: ({:.0}, {:.0})",
                detection.x, detection.y
            );
            let _ = writeln!(
                out,
                "  Size: {:.0} × {:.0} px",
                detection.width, detection.height
            );
            let _ = writeln!(out, "{}", DETECTION_RULE);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{Normalizer, RawInspectionResponse};
    use serde_json::json;
    use tempfile::tempdir;

    fn normalized(value: serde_json::Value) -> NormalizedResult {
        let dir = tempdir().expect("tempdir");
        Normalizer::new()
            .with_output_path(dir.path().join("vis.png"))
            .normalize(&RawInspectionResponse::from_value(value))
    }

    #[test]
    fn report_lists_distribution_and_detail() {
        let result = normalized(json!({
            "inspection_result_json_output": "FAIL",
            "model_predictions": { "predictions": [
                { "class": "scratch", "confidence": 0.92, "x": 120.0, "y": 45.0,
                  "width": 30.0, "height": 18.0 },
                { "class": "scratch", "confidence": 0.81 },
                { "class": "short", "confidence": 0.70 },
            ]},
        }));

        let report = render_report(&result, Path::new("visualization_output.png"));

        assert!(report.contains("=== INSPECTION RESULT ==="));
        assert!(report.contains("Status: FAIL"));
        assert!(report.contains("Total Detections: 3"));
        assert!(report.contains("Primary Defect Type: scratch"));
        assert!(report.contains("  • scratch: 2 (66.7%)"));
        assert!(report.contains("  • short: 1 (33.3%)"));
        assert!(report.contains("Detection 1:"));
        assert!(report.contains("  Confidence: 92.0%"));
        assert!(report.contains("  Position: (120, 45)"));
        assert!(report.contains("  Size: 30 × 18 px"));
        assert!(report.contains("✗ No visualization image available"));
    }

    #[test]
    fn empty_result_uses_no_defects_branch() {
        let result = normalized(json!({}));
        let report = render_report(&result, Path::new("visualization_output.png"));

        assert!(report.contains("Status: No inspection result available"));
        assert!(report.contains("No defects detected"));
        assert!(report.contains("No detections found"));
        assert_eq!(summary_line(&result), "No defects detected");
    }

    #[test]
    fn summary_line_names_primary_type() {
        let result = normalized(json!({
            "model_predictions": { "predictions": [
                { "class": "spur", "confidence": 0.5 },
                { "class": "spur", "confidence": 0.4 },
            ]},
        }));
        assert_eq!(summary_line(&result), "Total: 2 defects | Primary Type: spur");
    }
}
