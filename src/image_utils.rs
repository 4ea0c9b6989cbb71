use std::path::Path;

use image::{GrayImage, ImageFormat, Luma, RgbImage};
use ndarray::Array2;

use crate::error::Result;

/// Decode formats tried by the fallback strategy, most common first.
const FALLBACK_FORMATS: [ImageFormat; 6] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
    ImageFormat::WebP,
    ImageFormat::Gif,
];

pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let bytes = std::fs::read(path.as_ref())?;
    load_rgb_from_bytes(&bytes)
}

/// Decodes with the format sniffed from magic bytes first, then brute-forces
/// the major formats. Returns the primary decoder's error if nothing accepts
/// the input.
pub fn load_rgb_from_bytes(bytes: &[u8]) -> Result<RgbImage> {
    match image::load_from_memory(bytes) {
        Ok(img) => Ok(img.to_rgb8()),
        Err(primary) => {
            for format in FALLBACK_FORMATS {
                if let Ok(img) = image::load_from_memory_with_format(bytes, format) {
                    log::debug!("primary decode failed ({primary}), recovered as {format:?}");
                    return Ok(img.to_rgb8());
                }
            }
            Err(primary.into())
        }
    }
}

pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let lum =
            (0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64) as u8;
        gray.put_pixel(x, y, Luma([lum]));
    }

    gray
}

pub fn gray_to_array(image: &GrayImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let mut arr = Array2::zeros((height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        arr[[y as usize, x as usize]] = pixel[0] as f64;
    }

    arr
}

/// CIE L* channel in the 8-bit convention (L scaled by 255/100), computed
/// from the XYZ luminance of the raw channel values.
pub fn rgb_to_lightness(image: &RgbImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let mut arr = Array2::zeros((height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        let r = pixel[0] as f64 / 255.0;
        let g = pixel[1] as f64 / 255.0;
        let b = pixel[2] as f64 / 255.0;

        let luminance = 0.212671 * r + 0.715160 * g + 0.072169 * b;
        let lightness = if luminance > 0.008856 {
            116.0 * luminance.cbrt() - 16.0
        } else {
            903.3 * luminance
        };

        arr[[y as usize, x as usize]] = (lightness * 255.0 / 100.0).clamp(0.0, 255.0);
    }

    arr
}

/// 3x3 high-pass response (center 8, neighbors -1). Border pixels are left
/// at zero.
pub fn high_pass_residual(plane: &Array2<f64>) -> Array2<f64> {
    let (height, width) = plane.dim();
    let mut residual = Array2::zeros((height, width));

    if height < 3 || width < 3 {
        return residual;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sum = 8.0 * plane[[y, x]];
            for dy in 0..3usize {
                for dx in 0..3usize {
                    if dy == 1 && dx == 1 {
                        continue;
                    }
                    sum -= plane[[y + dy - 1, x + dx - 1]];
                }
            }
            residual[[y, x]] = sum;
        }
    }

    residual
}

pub fn extract_block(image: &GrayImage, x: u32, y: u32, size: u32) -> Vec<u8> {
    let mut block = Vec::with_capacity((size * size) as usize);

    for dy in 0..size {
        for dx in 0..size {
            if x + dx < image.width() && y + dy < image.height() {
                block.push(image.get_pixel(x + dx, y + dy)[0]);
            }
        }
    }

    block
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::Rgb;

    use super::*;

    fn sample_image() -> RgbImage {
        RgbImage::from_fn(32, 24, |x, y| Rgb([(x * 7) as u8, (y * 9) as u8, 128]))
    }

    #[test]
    fn loads_despite_misleading_extension() {
        let mut bytes = Vec::new();
        sample_image()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actually_a_png.jpg");
        std::fs::write(&path, &bytes).unwrap();

        let loaded = load_rgb(&path).unwrap();
        assert_eq!(loaded.dimensions(), (32, 24));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let garbage = vec![0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01, 0x02];
        assert!(load_rgb_from_bytes(&garbage).is_err());
    }

    #[test]
    fn gray_conversion_weights() {
        let mut rgb = RgbImage::new(1, 1);
        rgb.put_pixel(0, 0, Rgb([255, 0, 0]));
        let gray = rgb_to_gray(&rgb);
        assert_eq!(gray.get_pixel(0, 0)[0], 76);
    }

    #[test]
    fn residual_is_zero_on_flat_plane() {
        let plane = Array2::from_elem((16, 16), 127.0);
        let residual = high_pass_residual(&plane);
        assert!(residual.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn residual_handles_tiny_plane() {
        let plane = Array2::from_elem((2, 2), 10.0);
        let residual = high_pass_residual(&plane);
        assert_eq!(residual.dim(), (2, 2));
    }
}
