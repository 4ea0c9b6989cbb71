use image::RgbImage;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{
    Region,
    analysis::{
        OUTLIER_SIGMA,
        dct::{Dct8, extract_f64_block},
    },
    image_utils::rgb_to_gray,
};

const BLOCK_SIZE: u32 = 8;
const CONFIDENCE_PER_BLOCK: f64 = 0.03;

/// Compares per-block JPEG high-frequency energy against the image-wide
/// distribution; locally re-compressed areas stand out.
pub struct JpegArtifactDetector {
    dct: Dct8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DctOutlier {
    pub region: Region,
    pub energy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JpegFindings {
    pub suspicious_blocks: Vec<DctOutlier>,
    pub confidence: f64,
}

impl JpegArtifactDetector {
    pub fn new() -> Self {
        Self { dct: Dct8::new() }
    }

    pub fn detect(&self, image: &RgbImage) -> JpegFindings {
        let gray = rgb_to_gray(image);
        let (width, height) = gray.dimensions();

        if width <= BLOCK_SIZE || height <= BLOCK_SIZE {
            return JpegFindings {
                suspicious_blocks: Vec::new(),
                confidence: 0.0,
            };
        }

        let mut energies = Vec::new();
        let mut positions = Vec::new();
        for y in (0..height - BLOCK_SIZE).step_by(BLOCK_SIZE as usize) {
            for x in (0..width - BLOCK_SIZE).step_by(BLOCK_SIZE as usize) {
                let block = extract_f64_block(&gray, x, y);
                let coeffs = self.dct.transform(&block);
                energies.push(self.dct.high_frequency_energy(&coeffs));
                positions.push((x, y));
            }
        }

        if energies.is_empty() {
            return JpegFindings {
                suspicious_blocks: Vec::new(),
                confidence: 0.0,
            };
        }

        let mean = energies.iter().mean();
        let std_dev = energies.iter().population_std_dev();

        let suspicious_blocks = positions
            .iter()
            .zip(energies.iter())
            .filter(|&(_, &energy)| (energy - mean).abs() > OUTLIER_SIGMA * std_dev)
            .map(|(&(x, y), &energy)| DctOutlier {
                region: Region {
                    x,
                    y,
                    width: BLOCK_SIZE,
                    height: BLOCK_SIZE,
                },
                energy,
            })
            .collect::<Vec<_>>();

        let confidence = (suspicious_blocks.len() as f64 * CONFIDENCE_PER_BLOCK).min(1.0);

        JpegFindings {
            suspicious_blocks,
            confidence,
        }
    }
}

impl Default for JpegArtifactDetector {
    fn default() -> Self {
        Self::new()
    }
}
