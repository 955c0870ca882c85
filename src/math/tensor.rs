//! Conversions between the flat vectors layers exchange and the stack of
//! 2-D planes convolution and pooling work on. Layout is depth-major, then
//! row-major inside each plane.

use crate::error::{NnetError, Result};
use crate::math::matrix::Matrix;

pub fn vec_to_3d(v: &[f64], depth: usize, height: usize, width: usize) -> Result<Vec<Matrix>> {
    let plane = height * width;
    if v.len() != depth * plane {
        return Err(NnetError::size_mismatch("vec_to_3d", depth * plane, v.len()));
    }

    Ok((0..depth)
        .map(|d| {
            let base = d * plane;
            Matrix::from_fn(height, width, |i, j| v[base + i * width + j])
        })
        .collect())
}

pub fn three_d_to_vec(slices: &[Matrix]) -> Vec<f64> {
    slices.iter().flat_map(|m| m.iter()).collect()
}
