use image::RgbImage;
use ndarray::s;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{
    Region,
    analysis::OUTLIER_SIGMA,
    image_utils::{gray_to_array, high_pass_residual, rgb_to_gray},
};

const CONFIDENCE_PER_OUTLIER: f64 = 0.05;

/// Flags blocks whose high-pass noise variance deviates from the image-wide
/// mean by more than the shared outlier rule.
pub struct NoiseOutlierDetector {
    block_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseOutlier {
    pub region: Region,
    pub variance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseFindings {
    pub outliers: Vec<NoiseOutlier>,
    pub confidence: f64,
}

impl NoiseOutlierDetector {
    pub fn new(block_size: u32) -> Self {
        Self { block_size }
    }

    pub fn detect(&self, image: &RgbImage) -> NoiseFindings {
        let gray = rgb_to_gray(image);
        let (width, height) = gray.dimensions();
        let block = self.block_size;

        if width <= block || height <= block {
            return NoiseFindings {
                outliers: Vec::new(),
                confidence: 0.0,
            };
        }

        let residual = high_pass_residual(&gray_to_array(&gray));

        let mut variances = Vec::new();
        let mut positions = Vec::new();
        for y in (0..height - block).step_by(block as usize) {
            for x in (0..width - block).step_by(block as usize) {
                let window = residual.slice(s![
                    y as usize..(y + block) as usize,
                    x as usize..(x + block) as usize
                ]);
                variances.push(window.iter().population_variance());
                positions.push((x, y));
            }
        }

        if variances.is_empty() {
            return NoiseFindings {
                outliers: Vec::new(),
                confidence: 0.0,
            };
        }

        let mean = variances.iter().mean();
        let std_dev = variances.iter().population_std_dev();

        let outliers = positions
            .iter()
            .zip(variances.iter())
            .filter(|&(_, &variance)| (variance - mean).abs() > OUTLIER_SIGMA * std_dev)
            .map(|(&(x, y), &variance)| NoiseOutlier {
                region: Region {
                    x,
                    y,
                    width: block,
                    height: block,
                },
                variance,
            })
            .collect::<Vec<_>>();

        let confidence = (outliers.len() as f64 * CONFIDENCE_PER_OUTLIER).min(1.0);

        NoiseFindings {
            outliers,
            confidence,
        }
    }
}

impl Default for NoiseOutlierDetector {
    fn default() -> Self {
        Self::new(32)
    }
}
