use std::fmt;

use image::{GrayImage, RgbImage};
use ndarray::{Array2, s};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{
    QualityPolicy,
    analysis::dct::{Dct8, extract_f64_block},
    image_utils::{gray_to_array, high_pass_residual, rgb_to_gray},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionCategory {
    #[serde(rename = "High Resolution")]
    High,
    #[serde(rename = "HD Resolution")]
    Hd,
    #[serde(rename = "Standard Resolution")]
    Standard,
    #[serde(rename = "Low Resolution")]
    Low,
}

impl ResolutionCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionCategory::High => "High Resolution",
            ResolutionCategory::Hd => "HD Resolution",
            ResolutionCategory::Standard => "Standard Resolution",
            ResolutionCategory::Low => "Low Resolution",
        }
    }
}

impl fmt::Display for ResolutionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Six quality sub-scores, each in [0,1], with their raw measurements.
/// `noise_score` is a badness score: higher means noisier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub blur_score: f64,
    pub blur_value: f64,
    pub sharpness_score: f64,
    pub sharpness_value: f64,
    pub noise_score: f64,
    pub noise_value: f64,
    pub compression_score: f64,
    pub compression_artifacts: f64,
    pub resolution_score: f64,
    pub resolution_category: ResolutionCategory,
    pub color_score: f64,
    pub color_variance: f64,
    pub color_consistency: f64,
}

pub struct QualityAnalyzer {
    policy: QualityPolicy,
    dct: Dct8,
}

impl QualityAnalyzer {
    pub fn new(policy: QualityPolicy) -> Self {
        Self {
            policy,
            dct: Dct8::new(),
        }
    }

    pub fn analyze(&self, image: &RgbImage) -> QualityMetrics {
        let gray = rgb_to_gray(image);
        let plane = gray_to_array(&gray);

        let (blur_score, blur_value) = self.measure_blur(&plane);
        let (sharpness_score, sharpness_value) = self.measure_sharpness(&plane);
        let (noise_score, noise_value) = self.measure_noise(&plane);
        let (compression_score, compression_artifacts) = self.measure_compression(&gray);
        let (resolution_score, resolution_category) =
            self.classify_resolution(image.dimensions());
        let (color_score, color_variance, color_consistency) = self.measure_color(image);

        QualityMetrics {
            blur_score,
            blur_value,
            sharpness_score,
            sharpness_value,
            noise_score,
            noise_value,
            compression_score,
            compression_artifacts,
            resolution_score,
            resolution_category,
            color_score,
            color_variance,
            color_consistency,
        }
    }

    /// Variance of the 4-neighbor Laplacian; flat images score near zero.
    fn measure_blur(&self, plane: &Array2<f64>) -> (f64, f64) {
        let (height, width) = plane.dim();
        if height < 3 || width < 3 {
            return (0.0, 0.0);
        }

        let mut responses = Vec::with_capacity((height - 2) * (width - 2));
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let response = -4.0 * plane[[y, x]]
                    + plane[[y - 1, x]]
                    + plane[[y + 1, x]]
                    + plane[[y, x - 1]]
                    + plane[[y, x + 1]];
                responses.push(response);
            }
        }

        let variance = responses.iter().population_variance();
        ((variance / self.policy.blur_reference).min(1.0), variance)
    }

    fn measure_sharpness(&self, plane: &Array2<f64>) -> (f64, f64) {
        let (height, width) = plane.dim();
        if height < 3 || width < 3 {
            return (0.0, 0.0);
        }

        let mut magnitudes = Vec::with_capacity((height - 2) * (width - 2));
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let gx = -plane[[y - 1, x - 1]] - 2.0 * plane[[y, x - 1]] - plane[[y + 1, x - 1]]
                    + plane[[y - 1, x + 1]]
                    + 2.0 * plane[[y, x + 1]]
                    + plane[[y + 1, x + 1]];
                let gy = -plane[[y - 1, x - 1]] - 2.0 * plane[[y - 1, x]] - plane[[y - 1, x + 1]]
                    + plane[[y + 1, x - 1]]
                    + 2.0 * plane[[y + 1, x]]
                    + plane[[y + 1, x + 1]];
                magnitudes.push((gx * gx + gy * gy).sqrt());
            }
        }

        let mean_magnitude = magnitudes.iter().mean();
        (
            (mean_magnitude / self.policy.sharpness_reference).min(1.0),
            mean_magnitude,
        )
    }

    fn measure_noise(&self, plane: &Array2<f64>) -> (f64, f64) {
        let (height, width) = plane.dim();
        if height < 3 || width < 3 {
            return (0.0, 0.0);
        }

        let residual = high_pass_residual(plane);
        let std_dev = residual
            .slice(s![1..height - 1, 1..width - 1])
            .iter()
            .population_std_dev();

        ((std_dev / self.policy.noise_reference).min(1.0), std_dev)
    }

    fn measure_compression(&self, gray: &GrayImage) -> (f64, f64) {
        let (width, height) = gray.dimensions();
        let blocks_x = width / 8;
        let blocks_y = height / 8;

        let mut energies = Vec::with_capacity((blocks_x * blocks_y) as usize);
        for by in 0..blocks_y {
            for bx in 0..blocks_x {
                let block = extract_f64_block(gray, bx * 8, by * 8);
                let coeffs = self.dct.transform(&block);
                energies.push(self.dct.high_frequency_energy(&coeffs));
            }
        }

        if energies.is_empty() {
            return (1.0, 0.0);
        }

        let artifact = energies.iter().population_std_dev();
        (
            (1.0 - artifact / self.policy.compression_reference).max(0.0),
            artifact,
        )
    }

    fn classify_resolution(&self, (width, height): (u32, u32)) -> (f64, ResolutionCategory) {
        let pixels = width as u64 * height as u64;

        if pixels >= 1920 * 1080 {
            (1.0, ResolutionCategory::High)
        } else if pixels >= 1280 * 720 {
            (0.8, ResolutionCategory::Hd)
        } else if pixels >= 640 * 480 {
            (0.6, ResolutionCategory::Standard)
        } else {
            (0.3, ResolutionCategory::Low)
        }
    }

    fn measure_color(&self, image: &RgbImage) -> (f64, f64, f64) {
        let mut channels: [Vec<f64>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for pixel in image.pixels() {
            for c in 0..3 {
                channels[c].push(pixel[c] as f64);
            }
        }

        if channels[0].is_empty() {
            return (0.0, 0.0, 1.0);
        }

        let variances = channels
            .iter()
            .map(|values| values.iter().population_variance())
            .collect::<Vec<_>>();

        let mean_variance = variances.iter().mean();
        let score = (mean_variance / self.policy.color_reference).min(1.0);

        let consistency = if mean_variance > 1e-10 {
            (1.0 - variances.iter().population_std_dev() / mean_variance).clamp(0.0, 1.0)
        } else {
            1.0
        };

        (score, mean_variance, consistency)
    }
}
