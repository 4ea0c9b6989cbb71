use image::RgbImage;
use imageproc::contours::{BorderType, Contour, find_contours};
use imageproc::edges::canny;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

use crate::image_utils::rgb_to_gray;

const CONFIDENCE_PER_CONTOUR: f64 = 0.1;
const MIN_AREA: f64 = 100.0;
const MIN_PERIMETER: f64 = 50.0;
const CIRCULARITY_THRESHOLD: f64 = 0.8;
const LARGE_AREA_THRESHOLD: f64 = 5000.0;
const MIN_DIMENSION: u32 = 16;

/// Traces external contours in the edge map and flags near-perfect or
/// unusually large shapes, both typical of pasted object boundaries.
pub struct EdgeArtifactDetector {
    canny_low: f32,
    canny_high: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContourStats {
    pub centroid_x: u32,
    pub centroid_y: u32,
    pub area: f64,
    pub perimeter: f64,
    pub circularity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeFindings {
    pub suspicious_contours: Vec<ContourStats>,
    pub confidence: f64,
}

impl EdgeArtifactDetector {
    pub fn new(canny_low: f32, canny_high: f32) -> Self {
        Self {
            canny_low,
            canny_high,
        }
    }

    pub fn detect(&self, image: &RgbImage) -> EdgeFindings {
        let (width, height) = image.dimensions();
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return EdgeFindings {
                suspicious_contours: Vec::new(),
                confidence: 0.0,
            };
        }

        let gray = rgb_to_gray(image);
        let edges = canny(&gray, self.canny_low, self.canny_high);
        let contours = find_contours::<i32>(&edges);

        let suspicious_contours = contours
            .iter()
            .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
            .filter_map(|c| self.evaluate_contour(c))
            .collect::<Vec<_>>();

        let confidence = (suspicious_contours.len() as f64 * CONFIDENCE_PER_CONTOUR).min(1.0);

        EdgeFindings {
            suspicious_contours,
            confidence,
        }
    }

    fn evaluate_contour(&self, contour: &Contour<i32>) -> Option<ContourStats> {
        let area = polygon_area(&contour.points);
        let perimeter = polygon_perimeter(&contour.points);

        if area <= MIN_AREA || perimeter <= MIN_PERIMETER {
            return None;
        }

        let circularity = 4.0 * std::f64::consts::PI * area / (perimeter * perimeter);
        if circularity <= CIRCULARITY_THRESHOLD && area <= LARGE_AREA_THRESHOLD {
            return None;
        }

        let n = contour.points.len() as f64;
        let centroid_x = contour.points.iter().map(|p| p.x as f64).sum::<f64>() / n;
        let centroid_y = contour.points.iter().map(|p| p.y as f64).sum::<f64>() / n;

        Some(ContourStats {
            centroid_x: centroid_x.round() as u32,
            centroid_y: centroid_y.round() as u32,
            area,
            perimeter,
            circularity,
        })
    }
}

impl Default for EdgeArtifactDetector {
    fn default() -> Self {
        Self::new(50.0, 150.0)
    }
}

fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut twice_area = 0i64;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }

    (twice_area.abs() as f64) / 2.0
}

fn polygon_perimeter(points: &[Point<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let mut perimeter = 0.0;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        let dx = (p.x - q.x) as f64;
        let dy = (p.y - q.y) as f64;
        perimeter += (dx * dx + dy * dy).sqrt();
    }

    perimeter
}
