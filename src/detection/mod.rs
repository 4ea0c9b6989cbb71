pub mod forensics;
pub mod quality;

use std::fmt;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::analysis::quality::{QualityMetrics, ResolutionCategory};

/// A tamper-estimation strategy: one image in, one assessment out. The two
/// implementations (quality-heuristic and forensic fusion) are deliberately
/// separate models and are never merged into a composite score.
pub trait Strategy {
    type Assessment;

    fn assess(&self, image: &RgbImage) -> Self::Assessment;

    fn name(&self) -> &str;

    fn description(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Not Tampered (High Quality)")]
    NotTampered,
    #[serde(rename = "Likely Not Tampered (Good Quality)")]
    LikelyNotTampered,
    #[serde(rename = "Uncertain (Medium Quality)")]
    Uncertain,
    #[serde(rename = "Possibly Tampered (Poor Quality)")]
    PossiblyTampered,
    #[serde(rename = "Likely Tampered (Very Poor Quality)")]
    LikelyTampered,
    #[serde(rename = "Likely Tampered (Excessive Blur)")]
    ExcessiveBlur,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::NotTampered => "Not Tampered (High Quality)",
            Verdict::LikelyNotTampered => "Likely Not Tampered (Good Quality)",
            Verdict::Uncertain => "Uncertain (Medium Quality)",
            Verdict::PossiblyTampered => "Possibly Tampered (Poor Quality)",
            Verdict::LikelyTampered => "Likely Tampered (Very Poor Quality)",
            Verdict::ExcessiveBlur => "Likely Tampered (Excessive Blur)",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::VeryLow => "Very Low",
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.7 {
            Severity::High
        } else if confidence > 0.3 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        };
        f.write_str(label)
    }
}

/// Threshold flags over the quality metrics, as surfaced to callers that
/// want issue checklists rather than raw scores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualityFlags {
    pub is_blurry: bool,
    pub is_noisy: bool,
    pub is_low_resolution: bool,
    pub has_compression_artifacts: bool,
}

impl QualityFlags {
    pub fn from_metrics(metrics: &QualityMetrics) -> Self {
        Self {
            is_blurry: metrics.blur_score < 0.3,
            is_noisy: metrics.noise_score > 0.6,
            is_low_resolution: metrics.resolution_category == ResolutionCategory::Low,
            has_compression_artifacts: metrics.compression_score < 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub metrics: QualityMetrics,
    pub flags: QualityFlags,
    pub overall_score: f64,
    pub tampering_probability: f64,
    pub verdict: Verdict,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub summary: String,
}

/// Count-and-confidence summary of a single forensic detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForensicFinding {
    pub finding_count: usize,
    pub confidence: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForensicBreakdown {
    pub copy_move: ForensicFinding,
    pub noise_analysis: ForensicFinding,
    pub jpeg_artifacts: ForensicFinding,
    pub lighting: ForensicFinding,
    pub edge_artifacts: ForensicFinding,
}

impl ForensicBreakdown {
    pub fn confidences(&self) -> [f64; 5] {
        [
            self.copy_move.confidence,
            self.noise_analysis.confidence,
            self.jpeg_artifacts.confidence,
            self.lighting.confidence,
            self.edge_artifacts.confidence,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForensicAssessment {
    pub breakdown: ForensicBreakdown,
    pub overall_confidence: f64,
    pub likely_tampered: bool,
    pub severity: Severity,
    pub summary: String,
}
