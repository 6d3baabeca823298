//! # sdpanel library
//!
//! Image operations exposed as sdpanel plugins.
//!
//! ## Available Operations
//!
//! - **psf**: 2D and 3D Gaussian point spread functions
//! - **filters**: Gaussian blur, smooth/detail split
//! - **normalize**: Percentile intensity normalization (reports progress)
//!
//! [`plugins::provide_plugins`] is the registration hook a host calls to
//! discover them. [`sample::make_sample_data`] supplies a test image.

pub mod filters;
mod maybe_rayon;
pub mod normalize;
pub mod plugins;
pub mod psf;
pub mod sample;

use sdpanel_core::{Error, Result};

pub use plugins::provide_plugins;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::filters::{gaussian_blur, gaussian_kernel, smooth_split};
    pub use crate::normalize::{normalize_intensity, NormalizeParams};
    pub use crate::plugins::provide_plugins;
    pub use crate::psf::{gaussian_psf_2d, gaussian_psf_3d, GaussianPsfParams};
    pub use crate::sample::{make_sample_data, SampleImage};
    pub use sdpanel_core::prelude::*;
}

/// Largest extent accepted for one axis of a generated array.
pub const MAX_EXTENT: usize = 4096;

/// Largest number of elements a generated array may hold.
pub const MAX_ELEMENTS: usize = 1 << 26;

/// Convert an integer parameter to an array extent.
pub(crate) fn positive_size(value: i64, what: &str) -> Result<usize> {
    if value <= 0 {
        return Err(Error::Algorithm(format!("{what} must be positive, got {value}")));
    }
    match usize::try_from(value) {
        Ok(n) if n <= MAX_EXTENT => Ok(n),
        _ => Err(Error::Algorithm(format!(
            "{what} is too large: {value} (at most {MAX_EXTENT})"
        ))),
    }
}

/// Reject shapes whose element count exceeds [`MAX_ELEMENTS`].
pub(crate) fn checked_len(shape: &[usize]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1_usize, |acc, &n| acc.checked_mul(n))
        .filter(|&len| len <= MAX_ELEMENTS)
        .ok_or_else(|| {
            Error::Algorithm(format!("Shape {shape:?} holds more than {MAX_ELEMENTS} elements"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_size_bounds() {
        assert_eq!(positive_size(15, "Size").unwrap(), 15);
        assert!(matches!(positive_size(0, "Size"), Err(Error::Algorithm(_))));
        assert!(matches!(positive_size(i64::MAX, "Size"), Err(Error::Algorithm(_))));
        assert!(positive_size(MAX_EXTENT as i64 + 1, "Size").is_err());
    }

    #[test]
    fn test_checked_len() {
        assert_eq!(checked_len(&[4, 8, 8]).unwrap(), 256);
        assert!(checked_len(&[MAX_EXTENT, MAX_EXTENT, MAX_EXTENT]).is_err());
        assert!(checked_len(&[usize::MAX, 2]).is_err());
    }
}
