use image::RgbImage;
use ndarray::s;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{Region, analysis::OUTLIER_SIGMA, image_utils::rgb_to_lightness};

const CONFIDENCE_PER_REGION: f64 = 0.04;

/// Partitions the lightness channel into square regions and flags those
/// whose mean brightness is inconsistent with the rest of the scene.
pub struct LightingDetector {
    region_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionBrightness {
    pub region: Region,
    pub brightness: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightingFindings {
    pub inconsistent_regions: Vec<RegionBrightness>,
    pub confidence: f64,
}

impl LightingDetector {
    pub fn new(region_size: u32) -> Self {
        Self { region_size }
    }

    pub fn detect(&self, image: &RgbImage) -> LightingFindings {
        let (width, height) = image.dimensions();
        let size = self.region_size;

        if width <= size || height <= size {
            return LightingFindings {
                inconsistent_regions: Vec::new(),
                confidence: 0.0,
            };
        }

        let lightness = rgb_to_lightness(image);

        let mut brightnesses = Vec::new();
        let mut positions = Vec::new();
        for y in (0..height - size).step_by(size as usize) {
            for x in (0..width - size).step_by(size as usize) {
                let window = lightness.slice(s![
                    y as usize..(y + size) as usize,
                    x as usize..(x + size) as usize
                ]);
                brightnesses.push(window.iter().mean());
                positions.push((x, y));
            }
        }

        if brightnesses.is_empty() {
            return LightingFindings {
                inconsistent_regions: Vec::new(),
                confidence: 0.0,
            };
        }

        let mean = brightnesses.iter().mean();
        let std_dev = brightnesses.iter().population_std_dev();

        let inconsistent_regions = positions
            .iter()
            .zip(brightnesses.iter())
            .filter(|&(_, &brightness)| (brightness - mean).abs() > OUTLIER_SIGMA * std_dev)
            .map(|(&(x, y), &brightness)| RegionBrightness {
                region: Region {
                    x,
                    y,
                    width: size,
                    height: size,
                },
                brightness,
            })
            .collect::<Vec<_>>();

        let confidence = (inconsistent_regions.len() as f64 * CONFIDENCE_PER_REGION).min(1.0);

        LightingFindings {
            inconsistent_regions,
            confidence,
        }
    }
}

impl Default for LightingDetector {
    fn default() -> Self {
        Self::new(50)
    }
}
