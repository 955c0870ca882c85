pub mod fft;
pub mod matrix;
pub mod random;
pub mod tensor;

pub use fft::{convolve2d, fft, fft2, Direction};
pub use matrix::Matrix;
pub use random::default_random;
pub use tensor::{three_d_to_vec, vec_to_3d};

use crate::error::{NnetError, Result};

/// Affinely maps `value` from `[src_min, src_max]` onto `[dst_min, dst_max]`.
///
/// Fails with a domain error when either range is degenerate.
pub fn scale(value: f64, src_min: f64, src_max: f64, dst_min: f64, dst_max: f64) -> Result<f64> {
    if src_min == src_max || dst_min == dst_max {
        return Err(NnetError::Domain(
            "scale: minimum and maximum of a range must differ".into(),
        ));
    }
    Ok((value - src_min) * (dst_max - dst_min) / (src_max - src_min) + dst_min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_maps_byte_range_onto_unit_interval() {
        assert_eq!(scale(0.0, 0.0, 255.0, 0.0, 1.0).unwrap(), 0.0);
        assert_eq!(scale(255.0, 0.0, 255.0, 0.0, 1.0).unwrap(), 1.0);
        assert_eq!(scale(5.0, 0.0, 10.0, -1.0, 1.0).unwrap(), 0.0);
    }

    #[test]
    fn scale_rejects_degenerate_ranges() {
        assert!(matches!(scale(1.0, 2.0, 2.0, 0.0, 1.0), Err(NnetError::Domain(_))));
        assert!(matches!(scale(1.0, 0.0, 2.0, 3.0, 3.0), Err(NnetError::Domain(_))));
    }
}
