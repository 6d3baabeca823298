//! Synthetic test image
//!
//! A deterministic field of Gaussian blobs on a dim background, large enough
//! to try every plugin without loading a file.

use ndarray::Array2;
use sdpanel_core::state::ImageArray;

/// An image ready to be added to a viewer.
#[derive(Debug, Clone)]
pub struct SampleImage {
    pub name: String,
    pub data: ImageArray,
    pub scale: Vec<f64>,
}

const SIZE: usize = 128;

/// Blob centers `(row, col)` and radii in pixels.
const BLOBS: [(f64, f64, f64); 7] = [
    (24.0, 30.0, 5.0),
    (40.0, 92.0, 7.0),
    (64.0, 60.0, 4.0),
    (80.0, 20.0, 6.0),
    (96.0, 100.0, 5.0),
    (110.0, 54.0, 3.0),
    (18.0, 110.0, 4.0),
];

/// Sample images offered by the library.
pub fn make_sample_data() -> Vec<SampleImage> {
    vec![SampleImage {
        name: "Synthetic cells".to_string(),
        data: cells(SIZE).into_dyn(),
        scale: vec![1.0, 1.0],
    }]
}

fn cells(size: usize) -> Array2<f32> {
    Array2::from_shape_fn((size, size), |(r, c)| {
        let (r, c) = (r as f64, c as f64);
        // Faint horizontal gradient so the background is not flat.
        let background = 0.05 + 0.05 * c / size as f64;
        let signal: f64 = BLOBS
            .iter()
            .map(|&(br, bc, radius)| {
                let d2 = (r - br).powi(2) + (c - bc).powi(2);
                (-0.5 * d2 / (radius * radius)).exp()
            })
            .sum();
        (background + signal) as f32
    })
}
