use image::RgbImage;

use crate::{
    QualityPolicy,
    analysis::quality::{QualityAnalyzer, QualityMetrics},
    detection::{QualityAssessment, QualityFlags, RiskLevel, Strategy, Verdict},
};

/// Quality-heuristic tampering model: degraded images are treated as more
/// likely to have been manipulated. Weighted fusion of six sub-scores,
/// mapped through a fixed verdict table.
pub struct QualityStrategy {
    policy: QualityPolicy,
}

impl QualityStrategy {
    pub fn new(policy: QualityPolicy) -> Self {
        Self { policy }
    }

    pub fn fuse(&self, metrics: &QualityMetrics) -> f64 {
        let w = &self.policy.weights;

        w.blur * metrics.blur_score
            + w.sharpness * metrics.sharpness_score
            + w.noise * (1.0 - metrics.noise_score)
            + w.compression * metrics.compression_score
            + w.resolution * metrics.resolution_score
            + w.color * metrics.color_score
    }

    fn verdict_for(&self, overall: f64) -> (f64, Verdict, RiskLevel, f64) {
        if overall >= 0.8 {
            (
                (0.3 - overall).max(0.05),
                Verdict::NotTampered,
                RiskLevel::VeryLow,
                0.95,
            )
        } else if overall >= 0.6 {
            (0.3, Verdict::LikelyNotTampered, RiskLevel::Low, 0.80)
        } else if overall >= 0.4 {
            (0.5, Verdict::Uncertain, RiskLevel::Medium, 0.60)
        } else if overall >= 0.2 {
            (0.7, Verdict::PossiblyTampered, RiskLevel::High, 0.75)
        } else {
            (0.9, Verdict::LikelyTampered, RiskLevel::VeryHigh, 0.85)
        }
    }

    fn summary_for(tampering_probability: f64) -> String {
        if tampering_probability > 0.7 {
            "High risk image - use with extreme caution".into()
        } else if tampering_probability > 0.4 {
            "Medium risk image - use with caution".into()
        } else {
            "Low risk image - appears authentic".into()
        }
    }
}

impl Strategy for QualityStrategy {
    type Assessment = QualityAssessment;

    fn assess(&self, image: &RgbImage) -> QualityAssessment {
        let metrics = QualityAnalyzer::new(self.policy.clone()).analyze(image);
        let flags = QualityFlags::from_metrics(&metrics);

        let overall_score = self.fuse(&metrics);
        let (mut tampering_probability, mut verdict, mut risk_level, confidence) =
            self.verdict_for(overall_score);

        // Extreme blur outranks everything else in the table.
        if metrics.blur_score < self.policy.blur_override_threshold {
            tampering_probability = tampering_probability.max(0.8);
            verdict = Verdict::ExcessiveBlur;
            risk_level = RiskLevel::VeryHigh;
        }

        log::debug!(
            "quality assessment: overall={overall_score:.3} probability={tampering_probability:.3} verdict={verdict}"
        );

        QualityAssessment {
            summary: Self::summary_for(tampering_probability),
            metrics,
            flags,
            overall_score,
            tampering_probability,
            verdict,
            risk_level,
            confidence,
        }
    }

    fn name(&self) -> &str {
        "Quality Heuristic"
    }

    fn description(&self) -> &str {
        "Infers tampering likelihood from blur, sharpness, noise, compression, resolution and color quality"
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;
    use crate::analysis::quality::ResolutionCategory;

    fn strategy() -> QualityStrategy {
        QualityStrategy::new(QualityPolicy::default())
    }

    fn metrics_with(blur: f64, sharpness: f64) -> QualityMetrics {
        QualityMetrics {
            blur_score: blur,
            blur_value: blur * 500.0,
            sharpness_score: sharpness,
            sharpness_value: sharpness * 50.0,
            noise_score: 0.0,
            noise_value: 0.0,
            compression_score: 1.0,
            compression_artifacts: 0.0,
            resolution_score: 1.0,
            resolution_category: ResolutionCategory::High,
            color_score: 1.0,
            color_variance: 2000.0,
            color_consistency: 1.0,
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let w = QualityPolicy::default().weights;
        let total = w.blur + w.sharpness + w.noise + w.compression + w.resolution + w.color;
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn perfect_metrics_fuse_to_one() {
        let overall = strategy().fuse(&metrics_with(1.0, 1.0));
        assert!((overall - 1.0).abs() < 1e-12);
    }

    #[test]
    fn verdict_table_boundaries() {
        let s = strategy();

        let (p, v, r, c) = s.verdict_for(0.9);
        assert!((p - 0.05).abs() < 1e-12);
        assert_eq!(v, Verdict::NotTampered);
        assert_eq!(r, RiskLevel::VeryLow);
        assert_eq!(c, 0.95);

        let (p, v, _, _) = s.verdict_for(0.82);
        assert!((p - 0.05).abs() < 1e-12);
        assert_eq!(v, Verdict::NotTampered);

        let (p, v, r, c) = s.verdict_for(0.6);
        assert_eq!(p, 0.3);
        assert_eq!(v, Verdict::LikelyNotTampered);
        assert_eq!(r, RiskLevel::Low);
        assert_eq!(c, 0.80);

        let (p, v, _, _) = s.verdict_for(0.4);
        assert_eq!(p, 0.5);
        assert_eq!(v, Verdict::Uncertain);

        let (p, v, r, c) = s.verdict_for(0.2);
        assert_eq!(p, 0.7);
        assert_eq!(v, Verdict::PossiblyTampered);
        assert_eq!(r, RiskLevel::High);
        assert_eq!(c, 0.75);

        let (p, v, r, c) = s.verdict_for(0.1);
        assert_eq!(p, 0.9);
        assert_eq!(v, Verdict::LikelyTampered);
        assert_eq!(r, RiskLevel::VeryHigh);
        assert_eq!(c, 0.85);
    }

    #[test]
    fn probability_is_monotonic_in_overall_score() {
        let s = strategy();
        let scores = [0.95, 0.85, 0.7, 0.5, 0.3, 0.1];
        let probabilities = scores.map(|v| s.verdict_for(v).0);

        for pair in probabilities.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn blur_override_forces_very_high_risk() {
        // Uniform image: zero Laplacian variance trips the override no
        // matter what the table row says.
        let image = RgbImage::from_pixel(64, 64, Rgb([128, 128, 128]));
        let assessment = strategy().assess(&image);

        assert!(assessment.metrics.blur_score < 0.2);
        assert_eq!(assessment.verdict, Verdict::ExcessiveBlur);
        assert_eq!(assessment.risk_level, RiskLevel::VeryHigh);
        assert!(assessment.tampering_probability >= 0.8);
    }

    #[test]
    fn flat_image_routes_to_poor_tiers() {
        let image = RgbImage::from_pixel(64, 64, Rgb([0, 0, 0]));
        let assessment = strategy().assess(&image);

        // blur 0, sharpness 0, noise 0, compression 1, resolution 0.3, color 0:
        // overall = 0.15 + 0.15 + 0.03 = 0.33.
        assert!(assessment.overall_score < 0.4);
        assert!(assessment.tampering_probability >= 0.7);
    }

    #[test]
    fn assessment_is_idempotent() {
        let image = RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 3) as u8, (y * 5) as u8, ((x + y) * 2) as u8])
        });

        let first = strategy().assess(&image);
        let second = strategy().assess(&image);

        assert_eq!(first.overall_score, second.overall_score);
        assert_eq!(first.tampering_probability, second.tampering_probability);
        assert_eq!(first.verdict, second.verdict);
    }
}
