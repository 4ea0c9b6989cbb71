pub mod copy_move;
pub mod dct;
pub mod edge_artifacts;
pub mod jpeg_artifacts;
pub mod lighting;
pub mod noise;
pub mod quality;

/// Shared outlier rule: a block is anomalous when it deviates from the
/// image-wide mean by more than this many population standard deviations.
/// All region detectors use the same factor.
pub const OUTLIER_SIGMA: f64 = 2.0;
