use image::RgbImage;

use crate::{
    ForensicPolicy,
    analysis::{
        copy_move::CopyMoveDetector, edge_artifacts::EdgeArtifactDetector,
        jpeg_artifacts::JpegArtifactDetector, lighting::LightingDetector,
        noise::NoiseOutlierDetector,
    },
    detection::{ForensicAssessment, ForensicBreakdown, ForensicFinding, Severity, Strategy},
    error::Result,
};

/// Forensic fusion model: five independent detectors, averaged without
/// weighting. A single strong signal is diluted by four quiet ones; that is
/// a property of the model, not an accident.
pub struct ForensicStrategy {
    policy: ForensicPolicy,
    copy_move: CopyMoveDetector,
    noise: NoiseOutlierDetector,
    jpeg: JpegArtifactDetector,
    lighting: LightingDetector,
    edges: EdgeArtifactDetector,
}

impl ForensicStrategy {
    pub fn new(policy: ForensicPolicy) -> Result<Self> {
        let copy_move = CopyMoveDetector::new(
            policy.block_size,
            policy.stride,
            policy.correlation_threshold,
        )?;
        let noise = NoiseOutlierDetector::new(policy.noise_block_size);
        let jpeg = JpegArtifactDetector::new();
        let lighting = LightingDetector::new(policy.lighting_region_size);
        let edges = EdgeArtifactDetector::new(policy.canny_low, policy.canny_high);

        Ok(Self {
            policy,
            copy_move,
            noise,
            jpeg,
            lighting,
            edges,
        })
    }

    fn summary_for(overall_confidence: f64) -> String {
        if overall_confidence > 0.7 {
            "HIGH likelihood of tampering detected. Multiple detection methods show strong evidence of manipulation.".into()
        } else if overall_confidence > 0.3 {
            "MEDIUM likelihood of tampering detected. Some suspicious patterns found and closer inspection is recommended.".into()
        } else {
            "LOW likelihood of tampering. Image appears authentic or contains minimal suspicious patterns.".into()
        }
    }
}

impl Strategy for ForensicStrategy {
    type Assessment = ForensicAssessment;

    fn assess(&self, image: &RgbImage) -> ForensicAssessment {
        let copy_move = self.copy_move.detect(image);
        let noise = self.noise.detect(image);
        let jpeg = self.jpeg.detect(image);
        let lighting = self.lighting.detect(image);
        let edges = self.edges.detect(image);

        log::debug!(
            "forensic findings: copy_move={} noise={} jpeg={} lighting={} edges={}",
            copy_move.matches.len(),
            noise.outliers.len(),
            jpeg.suspicious_blocks.len(),
            lighting.inconsistent_regions.len(),
            edges.suspicious_contours.len(),
        );

        let breakdown = ForensicBreakdown {
            copy_move: ForensicFinding {
                finding_count: copy_move.matches.len(),
                confidence: copy_move.confidence,
                description: "Detects duplicated regions within the image".into(),
            },
            noise_analysis: ForensicFinding {
                finding_count: noise.outliers.len(),
                confidence: noise.confidence,
                description: "Identifies inconsistent noise distributions".into(),
            },
            jpeg_artifacts: ForensicFinding {
                finding_count: jpeg.suspicious_blocks.len(),
                confidence: jpeg.confidence,
                description: "Analyzes compression inconsistencies".into(),
            },
            lighting: ForensicFinding {
                finding_count: lighting.inconsistent_regions.len(),
                confidence: lighting.confidence,
                description: "Detects unnatural lighting variations".into(),
            },
            edge_artifacts: ForensicFinding {
                finding_count: edges.suspicious_contours.len(),
                confidence: edges.confidence,
                description: "Identifies suspicious edge patterns from splicing".into(),
            },
        };

        let confidences = breakdown.confidences();
        let overall_confidence = confidences.iter().sum::<f64>() / confidences.len() as f64;

        ForensicAssessment {
            breakdown,
            overall_confidence,
            likely_tampered: overall_confidence > self.policy.tampered_threshold,
            severity: Severity::from_confidence(overall_confidence),
            summary: Self::summary_for(overall_confidence),
        }
    }

    fn name(&self) -> &str {
        "Forensic Fusion"
    }

    fn description(&self) -> &str {
        "Averages the confidences of five independent pixel-statistic detectors"
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    fn strategy() -> ForensicStrategy {
        ForensicStrategy::new(ForensicPolicy::default()).unwrap()
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let policy = ForensicPolicy {
            block_size: 2,
            ..ForensicPolicy::default()
        };
        assert!(ForensicStrategy::new(policy).is_err());
    }

    #[test]
    fn tiny_image_yields_neutral_assessment() {
        let image = RgbImage::from_pixel(8, 8, Rgb([128, 128, 128]));
        let assessment = strategy().assess(&image);

        for finding in [
            &assessment.breakdown.copy_move,
            &assessment.breakdown.noise_analysis,
            &assessment.breakdown.jpeg_artifacts,
            &assessment.breakdown.lighting,
            &assessment.breakdown.edge_artifacts,
        ] {
            assert_eq!(finding.finding_count, 0);
            assert_eq!(finding.confidence, 0.0);
        }

        assert_eq!(assessment.overall_confidence, 0.0);
        assert!(!assessment.likely_tampered);
        assert_eq!(assessment.severity, Severity::Low);
    }

    #[test]
    fn uniform_image_is_not_tampered() {
        let image = RgbImage::from_pixel(128, 128, Rgb([100, 100, 100]));
        let assessment = strategy().assess(&image);

        assert_eq!(assessment.overall_confidence, 0.0);
        assert!(!assessment.likely_tampered);
    }

    #[test]
    fn overall_confidence_is_the_plain_mean() {
        let image = RgbImage::from_pixel(128, 128, Rgb([100, 100, 100]));
        let assessment = strategy().assess(&image);
        let confidences = assessment.breakdown.confidences();

        let mean = confidences.iter().sum::<f64>() / 5.0;
        assert_eq!(assessment.overall_confidence, mean);
    }

    #[test]
    fn assessment_is_idempotent() {
        let mut state = 0xC0FFEEu64;
        let image = RgbImage::from_fn(96, 96, |_, _| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let v = (state >> 56) as u8;
            Rgb([v, v, v])
        });

        let first = strategy().assess(&image);
        let second = strategy().assess(&image);

        assert_eq!(first.overall_confidence, second.overall_confidence);
        assert_eq!(first.likely_tampered, second.likely_tampered);
        assert_eq!(
            first.breakdown.confidences(),
            second.breakdown.confidences()
        );
    }
}
