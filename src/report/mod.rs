use serde::Serialize;

use crate::{
    TamperReport,
    detection::{ForensicAssessment, QualityAssessment},
};

/// Flat, serializable view of a full analysis, for callers that export
/// results rather than inspect them programmatically.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub image_width: u32,
    pub image_height: u32,
    pub quality_assessment: QualityAssessment,
    pub forensic_assessment: ForensicAssessment,
    pub summary: String,
}

impl From<&TamperReport> for JsonReport {
    fn from(report: &TamperReport) -> Self {
        let summary = format!(
            "Quality model: {} (probability {:.1}%). Forensic model: {} severity ({:.1}% confidence).",
            report.quality.verdict,
            report.quality.tampering_probability * 100.0,
            report.forensics.severity,
            report.forensics.overall_confidence * 100.0,
        );

        Self {
            image_width: report.image_width,
            image_height: report.image_height,
            quality_assessment: report.quality.clone(),
            forensic_assessment: report.forensics.clone(),
            summary,
        }
    }
}

impl JsonReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
