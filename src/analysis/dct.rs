use image::GrayImage;

const N: usize = 8;

/// Orthonormal 8x8 DCT-II as a pair of separable matrix products.
pub struct Dct8 {
    matrix: [[f64; N]; N],
    matrix_t: [[f64; N]; N],
}

impl Dct8 {
    pub fn new() -> Self {
        let matrix = Self::basis_matrix();
        let matrix_t = Self::transpose(&matrix);

        Self { matrix, matrix_t }
    }

    fn basis_matrix() -> [[f64; N]; N] {
        let mut matrix = [[0.0f64; N]; N];

        for i in 0..N {
            for j in 0..N {
                if i == 0 {
                    matrix[i][j] = 1.0 / (N as f64).sqrt();
                } else {
                    matrix[i][j] = (2.0 / N as f64).sqrt()
                        * (std::f64::consts::PI * (2.0 * j as f64 + 1.0) * i as f64
                            / (2.0 * N as f64))
                            .cos();
                }
            }
        }

        matrix
    }

    fn transpose(matrix: &[[f64; N]; N]) -> [[f64; N]; N] {
        let mut result = [[0.0f64; N]; N];
        for i in 0..N {
            for j in 0..N {
                result[i][j] = matrix[j][i];
            }
        }

        result
    }

    pub fn transform(&self, block: &[[f64; N]; N]) -> [[f64; N]; N] {
        let mut temp = [[0.0f64; N]; N];
        let mut result = [[0.0f64; N]; N];

        for i in 0..N {
            for j in 0..N {
                let mut sum = 0.0;
                for k in 0..N {
                    sum += self.matrix[i][k] * block[k][j];
                }
                temp[i][j] = sum;
            }
        }

        for i in 0..N {
            for j in 0..N {
                let mut sum = 0.0;
                for k in 0..N {
                    sum += temp[i][k] * self.matrix_t[k][j];
                }
                result[i][j] = sum;
            }
        }

        result
    }

    /// Sum of absolute coefficients in the high-frequency quadrant
    /// (rows 4-7, cols 4-7), the JPEG-sensitive band.
    pub fn high_frequency_energy(&self, coeffs: &[[f64; N]; N]) -> f64 {
        let mut energy = 0.0;
        for row in coeffs.iter().skip(4) {
            for &c in row.iter().skip(4) {
                energy += c.abs();
            }
        }

        energy
    }
}

impl Default for Dct8 {
    fn default() -> Self {
        Self::new()
    }
}

pub fn extract_f64_block(gray: &GrayImage, bx: u32, by: u32) -> [[f64; N]; N] {
    let mut block = [[0.0f64; N]; N];

    for y in 0..N {
        for x in 0..N {
            let px = bx + x as u32;
            let py = by + y as u32;
            if px < gray.width() && py < gray.height() {
                block[y][x] = gray.get_pixel(px, py)[0] as f64;
            }
        }
    }

    block
}
