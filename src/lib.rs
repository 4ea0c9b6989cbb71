use std::path::Path;

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

pub mod analysis;
pub mod detection;
pub mod error;
pub mod image_utils;
pub mod report;

pub use analysis::copy_move::{BlockMatch, CopyMoveFindings};
pub use analysis::edge_artifacts::EdgeFindings;
pub use analysis::jpeg_artifacts::JpegFindings;
pub use analysis::lighting::LightingFindings;
pub use analysis::noise::NoiseFindings;
pub use analysis::quality::{QualityMetrics, ResolutionCategory};
pub use detection::forensics::ForensicStrategy;
pub use detection::quality::QualityStrategy;
pub use detection::{
    ForensicAssessment, ForensicBreakdown, ForensicFinding, QualityAssessment, QualityFlags,
    RiskLevel, Severity, Strategy, Verdict,
};
pub use error::{AnalysisError, Result};
pub use report::JsonReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Fusion weights for the quality model. Must sum to 1.0; the defaults are
/// the reference constant set.
#[derive(Debug, Clone)]
pub struct QualityWeights {
    pub blur: f64,
    pub sharpness: f64,
    pub noise: f64,
    pub compression: f64,
    pub resolution: f64,
    pub color: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            blur: 0.25,
            sharpness: 0.25,
            noise: 0.15,
            compression: 0.15,
            resolution: 0.10,
            color: 0.10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QualityPolicy {
    pub blur_reference: f64,
    pub sharpness_reference: f64,
    pub noise_reference: f64,
    pub compression_reference: f64,
    pub color_reference: f64,
    pub blur_override_threshold: f64,
    pub weights: QualityWeights,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            blur_reference: 500.0,
            sharpness_reference: 50.0,
            noise_reference: 30.0,
            compression_reference: 100.0,
            color_reference: 2000.0,
            blur_override_threshold: 0.2,
            weights: QualityWeights::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForensicPolicy {
    pub block_size: u32,
    pub stride: u32,
    pub correlation_threshold: f64,
    pub noise_block_size: u32,
    pub lighting_region_size: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub tampered_threshold: f64,
}

impl Default for ForensicPolicy {
    fn default() -> Self {
        Self {
            block_size: 16,
            stride: 4,
            correlation_threshold: 0.95,
            noise_block_size: 32,
            lighting_region_size: 50,
            canny_low: 50.0,
            canny_high: 150.0,
            tampered_threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TamperReport {
    pub image_width: u32,
    pub image_height: u32,
    pub quality: QualityAssessment,
    pub forensics: ForensicAssessment,
}

/// Owns one decoded image and the policies applied to it. Analysis methods
/// are pure with respect to the image; an analyzer can be reused or shared
/// across threads freely.
pub struct TamperAnalyzer {
    image: RgbImage,
    quality_policy: QualityPolicy,
    forensic_policy: ForensicPolicy,
}

impl TamperAnalyzer {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let image = image_utils::load_rgb(path)?;
        Ok(Self::from_rgb(image))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let image = image_utils::load_rgb_from_bytes(bytes)?;
        Ok(Self::from_rgb(image))
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self::from_rgb(image.to_rgb8())
    }

    pub fn from_rgb(image: RgbImage) -> Self {
        Self {
            image,
            quality_policy: QualityPolicy::default(),
            forensic_policy: ForensicPolicy::default(),
        }
    }

    pub fn with_quality_policy(mut self, policy: QualityPolicy) -> Self {
        self.quality_policy = policy;
        self
    }

    pub fn with_forensic_policy(mut self, policy: ForensicPolicy) -> Self {
        self.forensic_policy = policy;
        self
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn assess_quality(&self) -> QualityAssessment {
        QualityStrategy::new(self.quality_policy.clone()).assess(&self.image)
    }

    pub fn assess_forensics(&self) -> Result<ForensicAssessment> {
        Ok(ForensicStrategy::new(self.forensic_policy.clone())?.assess(&self.image))
    }

    pub fn full_analysis(&self) -> Result<TamperReport> {
        Ok(TamperReport {
            image_width: self.image.width(),
            image_height: self.image.height(),
            quality: self.assess_quality(),
            forensics: self.assess_forensics()?,
        })
    }

    pub fn quality_metrics(&self) -> QualityMetrics {
        analysis::quality::QualityAnalyzer::new(self.quality_policy.clone()).analyze(&self.image)
    }

    pub fn copy_move(&self) -> Result<CopyMoveFindings> {
        let detector = analysis::copy_move::CopyMoveDetector::new(
            self.forensic_policy.block_size,
            self.forensic_policy.stride,
            self.forensic_policy.correlation_threshold,
        )?;
        Ok(detector.detect(&self.image))
    }

    pub fn noise_outliers(&self) -> NoiseFindings {
        analysis::noise::NoiseOutlierDetector::new(self.forensic_policy.noise_block_size)
            .detect(&self.image)
    }

    pub fn jpeg_artifacts(&self) -> JpegFindings {
        analysis::jpeg_artifacts::JpegArtifactDetector::new().detect(&self.image)
    }

    pub fn lighting(&self) -> LightingFindings {
        analysis::lighting::LightingDetector::new(self.forensic_policy.lighting_region_size)
            .detect(&self.image)
    }

    pub fn edge_artifacts(&self) -> EdgeFindings {
        analysis::edge_artifacts::EdgeArtifactDetector::new(
            self.forensic_policy.canny_low,
            self.forensic_policy.canny_high,
        )
        .detect(&self.image)
    }
}

pub fn assess_quality<P: AsRef<Path>>(path: P) -> Result<QualityAssessment> {
    Ok(TamperAnalyzer::open(path)?.assess_quality())
}

pub fn assess_forensics<P: AsRef<Path>>(path: P) -> Result<ForensicAssessment> {
    TamperAnalyzer::open(path)?.assess_forensics()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb};

    use super::*;

    #[test]
    fn mid_gray_sd_image_end_to_end() {
        let image = RgbImage::from_pixel(640, 480, Rgb([128, 128, 128]));
        let assessment = TamperAnalyzer::from_rgb(image).assess_quality();

        assert_eq!(
            assessment.metrics.resolution_category,
            ResolutionCategory::Standard
        );
        assert_eq!(assessment.metrics.resolution_score, 0.6);

        // blur 0, sharpness 0, noise 0, compression 1, resolution 0.6,
        // color 0: overall = 0.15 + 0.15 + 0.06 = 0.36, then the blur
        // override lifts the probability to 0.8.
        assert!((assessment.overall_score - 0.36).abs() < 1e-12);
        assert_eq!(assessment.tampering_probability, 0.8);
        assert_eq!(assessment.verdict, Verdict::ExcessiveBlur);
    }

    #[test]
    fn full_analysis_is_idempotent() {
        let mut state = 0xDECAFu64;
        let image = RgbImage::from_fn(128, 96, |_, _| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            Rgb([(state >> 56) as u8, (state >> 48) as u8, (state >> 40) as u8])
        });

        let analyzer = TamperAnalyzer::from_rgb(image);
        let first = analyzer.full_analysis().unwrap();
        let second = analyzer.full_analysis().unwrap();

        assert_eq!(first.quality.overall_score, second.quality.overall_score);
        assert_eq!(
            first.quality.tampering_probability,
            second.quality.tampering_probability
        );
        assert_eq!(
            first.forensics.overall_confidence,
            second.forensics.overall_confidence
        );
    }

    #[test]
    fn entry_points_load_from_disk() {
        let image = RgbImage::from_pixel(64, 64, Rgb([90, 120, 150]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.png");
        std::fs::write(&path, &bytes).unwrap();

        let quality = assess_quality(&path).unwrap();
        assert!(quality.tampering_probability > 0.0);

        let forensics = assess_forensics(&path).unwrap();
        assert!(forensics.overall_confidence >= 0.0);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let result = assess_quality("definitely/not/a/real/file.png");
        assert!(result.is_err());
    }

    #[test]
    fn assessments_round_trip_through_serde() {
        let image = RgbImage::from_pixel(64, 64, Rgb([128, 128, 128]));
        let analyzer = TamperAnalyzer::from_rgb(image);

        let quality = analyzer.assess_quality();
        let json = serde_json::to_string(&quality).unwrap();
        let decoded: QualityAssessment = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.verdict, quality.verdict);
        assert_eq!(decoded.tampering_probability, quality.tampering_probability);

        let forensics = analyzer.assess_forensics().unwrap();
        let json = serde_json::to_string(&forensics).unwrap();
        let decoded: ForensicAssessment = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.severity, forensics.severity);
        assert_eq!(decoded.overall_confidence, forensics.overall_confidence);
    }
}
