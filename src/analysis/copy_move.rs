use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use image::{GrayImage, RgbImage};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{
    Region,
    error::{AnalysisError, Result},
    image_utils::{extract_block, rgb_to_gray},
};

const CONFIDENCE_PER_MATCH: f64 = 0.1;

pub struct CopyMoveDetector {
    block_size: u32,
    stride: u32,
    correlation_threshold: f64,
}

struct BlockFeature {
    x: u32,
    y: u32,
    bytes: Vec<u8>,
    hash: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockMatch {
    pub source: Region,
    pub target: Region,
    pub correlation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyMoveFindings {
    pub matches: Vec<BlockMatch>,
    pub confidence: f64,
}

impl CopyMoveFindings {
    fn empty() -> Self {
        Self {
            matches: Vec::new(),
            confidence: 0.0,
        }
    }
}

impl CopyMoveDetector {
    pub fn new(block_size: u32, stride: u32, correlation_threshold: f64) -> Result<Self> {
        if !(4..=64).contains(&block_size) {
            return Err(AnalysisError::InvalidParameter(
                "Block size must be between 4 and 64".into(),
            ));
        }
        if stride == 0 {
            return Err(AnalysisError::InvalidParameter(
                "Stride must be non-zero".into(),
            ));
        }

        Ok(Self {
            block_size,
            stride,
            correlation_threshold,
        })
    }

    pub fn detect(&self, image: &RgbImage) -> CopyMoveFindings {
        let gray = rgb_to_gray(image);
        let (width, height) = gray.dimensions();

        if width <= self.block_size || height <= self.block_size {
            return CopyMoveFindings::empty();
        }

        let features = self.extract_features(&gray);
        let matches = self.find_matches(&features);

        let confidence = (matches.len() as f64 * CONFIDENCE_PER_MATCH).min(1.0);

        CopyMoveFindings {
            matches,
            confidence,
        }
    }

    fn extract_features(&self, gray: &GrayImage) -> Vec<BlockFeature> {
        let (width, height) = gray.dimensions();

        let mut positions = Vec::new();
        for y in (0..height - self.block_size).step_by(self.stride as usize) {
            for x in (0..width - self.block_size).step_by(self.stride as usize) {
                positions.push((x, y));
            }
        }

        positions
            .par_iter()
            .map(|&(x, y)| {
                let bytes = extract_block(gray, x, y, self.block_size);
                let mut hasher = DefaultHasher::new();
                bytes.hash(&mut hasher);
                BlockFeature {
                    x,
                    y,
                    hash: hasher.finish(),
                    bytes,
                }
            })
            .collect()
    }

    /// Scan-order matching: each block is correlated against the first block
    /// seen with the same content hash. Matches closer than one block width
    /// in either axis are self-overlap, not duplication.
    fn find_matches(&self, features: &[BlockFeature]) -> Vec<BlockMatch> {
        let mut matches = Vec::new();
        let mut first_seen: HashMap<u64, usize> = HashMap::new();

        for (i, feature) in features.iter().enumerate() {
            match first_seen.get(&feature.hash).copied() {
                None => {
                    first_seen.insert(feature.hash, i);
                }
                Some(j) => {
                    let existing = &features[j];

                    let dx = feature.x.abs_diff(existing.x);
                    let dy = feature.y.abs_diff(existing.y);
                    if dx <= self.block_size || dy <= self.block_size {
                        continue;
                    }

                    let correlation = normalized_correlation(&feature.bytes, &existing.bytes);
                    if correlation > self.correlation_threshold {
                        matches.push(BlockMatch {
                            source: self.block_region(existing.x, existing.y),
                            target: self.block_region(feature.x, feature.y),
                            correlation,
                        });
                    }
                }
            }
        }

        matches
    }

    fn block_region(&self, x: u32, y: u32) -> Region {
        Region {
            x,
            y,
            width: self.block_size,
            height: self.block_size,
        }
    }
}

/// Mean-subtracted normalized cross-correlation. Zero-variance blocks
/// correlate to 0.0, so uniform areas never count as duplicates.
fn normalized_correlation(a: &[u8], b: &[u8]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mean_a = a.iter().map(|&v| v as f64).sum::<f64>() / a.len() as f64;
    let mean_b = b.iter().map(|&v| v as f64).sum::<f64>() / b.len() as f64;

    let mut numerator = 0.0;
    let mut denom_a = 0.0;
    let mut denom_b = 0.0;

    for (&va, &vb) in a.iter().zip(b.iter()) {
        let da = va as f64 - mean_a;
        let db = vb as f64 - mean_b;
        numerator += da * db;
        denom_a += da * da;
        denom_b += db * db;
    }

    let denom = (denom_a * denom_b).sqrt();
    if denom < 1e-10 {
        0.0
    } else {
        (numerator / denom).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    fn detector() -> CopyMoveDetector {
        CopyMoveDetector::new(16, 4, 0.95).unwrap()
    }

    /// Textured image in which every block is unique.
    fn textured_image(width: u32, height: u32) -> RgbImage {
        let mut state = 0x9E3779B9u64;
        RgbImage::from_fn(width, height, |_, _| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let v = (state >> 56) as u8;
            Rgb([v, v, v])
        })
    }

    fn paste_block(image: &mut RgbImage, src: (u32, u32), dst: (u32, u32), size: u32) {
        for dy in 0..size {
            for dx in 0..size {
                let pixel = *image.get_pixel(src.0 + dx, src.1 + dy);
                image.put_pixel(dst.0 + dx, dst.1 + dy, pixel);
            }
        }
    }

    #[test]
    fn rejects_out_of_range_block_size() {
        assert!(CopyMoveDetector::new(2, 4, 0.95).is_err());
        assert!(CopyMoveDetector::new(128, 4, 0.95).is_err());
    }

    #[test]
    fn copied_block_raises_confidence() {
        let clean = textured_image(96, 96);
        let mut forged = clean.clone();
        paste_block(&mut forged, (8, 8), (60, 60), 16);

        let clean_findings = detector().detect(&clean);
        let forged_findings = detector().detect(&forged);

        assert!(forged_findings.confidence > 0.0);
        assert!(forged_findings.confidence > clean_findings.confidence);
        assert!(!forged_findings.matches.is_empty());
    }

    #[test]
    fn nearby_duplicate_is_treated_as_self_overlap() {
        let mut image = textured_image(96, 48);
        // Same row: dy = 0, inside the one-block-width rejection band.
        paste_block(&mut image, (8, 8), (60, 8), 16);

        let findings = detector().detect(&image);
        assert!(findings.matches.is_empty());
        assert_eq!(findings.confidence, 0.0);
    }

    #[test]
    fn uniform_image_produces_no_matches() {
        let image = RgbImage::from_pixel(96, 96, Rgb([128, 128, 128]));
        let findings = detector().detect(&image);

        assert!(findings.matches.is_empty());
        assert_eq!(findings.confidence, 0.0);
    }

    #[test]
    fn image_smaller_than_block_is_neutral() {
        let image = textured_image(8, 8);
        let findings = detector().detect(&image);

        assert!(findings.matches.is_empty());
        assert_eq!(findings.confidence, 0.0);
    }

    #[test]
    fn constant_blocks_do_not_correlate() {
        let a = vec![100u8; 256];
        let b = vec![100u8; 256];
        assert_eq!(normalized_correlation(&a, &b), 0.0);
    }

    #[test]
    fn identical_textured_blocks_correlate_fully() {
        let a = (0..=255u8).collect::<Vec<_>>();
        let correlation = normalized_correlation(&a, &a);
        assert!((correlation - 1.0).abs() < 1e-12);
    }
}
