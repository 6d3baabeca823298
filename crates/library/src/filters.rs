//! Separable Gaussian smoothing
//!
//! Works on arrays of any rank. Each axis longer than one sample is filtered
//! with the same 1D kernel; borders are mirrored.

use ndarray::IxDyn;
use sdpanel_core::prelude::*;

use crate::maybe_rayon::*;
use crate::MAX_EXTENT;

/// Declarative part of the blur plugin.
const BLUR_SCHEMA: &str = r#"{
    "name": "gaussian_blur",
    "inputs": {
        "image": { "type": "Image", "label": "Image", "help": "Image to smooth" },
        "sigma": { "type": "float", "label": "Sigma", "default": 1.5,
                   "help": "Gaussian standard deviation in pixels" }
    },
    "outputs": {
        "blurred": { "type": "Image", "label": "Blurred" }
    }
}"#;

/// Build a normalized 1D Gaussian kernel with radius `ceil(3 * sigma)`.
/// The radius may not exceed [`MAX_EXTENT`].
pub fn gaussian_kernel(sigma: f64) -> Result<Vec<f32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(Error::Algorithm(format!("Sigma must be > 0, got {sigma}")));
    }
    if 3.0 * sigma > MAX_EXTENT as f64 {
        return Err(Error::Algorithm(format!(
            "Sigma {sigma} is too large (at most {})",
            MAX_EXTENT / 3
        )));
    }
    let radius = (3.0 * sigma).ceil() as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|i| {
            let d = i as f64 / sigma;
            (-0.5 * d * d).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    Ok(weights.into_iter().map(|w| (w / sum) as f32).collect())
}

/// Smooth an image with an isotropic Gaussian
///
/// # Arguments
/// * `image` - Input image of any rank
/// * `sigma` - Standard deviation in pixels; 0 returns a copy
pub fn gaussian_blur(image: &ImageArray, sigma: f64) -> Result<ImageArray> {
    if sigma == 0.0 {
        return Ok(image.clone());
    }
    let kernel = gaussian_kernel(sigma)?;
    let shape = image.shape().to_vec();

    let mut data: Vec<f32> = image.iter().copied().collect();
    for axis in 0..shape.len() {
        if shape[axis] > 1 {
            data = convolve_axis(&data, &shape, axis, &kernel);
        }
    }

    Ok(ImageArray::from_shape_vec(IxDyn(&shape), data)?)
}

/// Split an image into its smoothed part and the remaining detail.
///
/// The two parts add up to the input.
pub fn smooth_split(image: &ImageArray, sigma: f64) -> Result<(ImageArray, ImageArray)> {
    let smooth = gaussian_blur(image, sigma)?;
    let detail = image - &smooth;
    Ok((smooth, detail))
}

fn convolve_axis(data: &[f32], shape: &[usize], axis: usize, kernel: &[f32]) -> Vec<f32> {
    let stride: usize = shape[axis + 1..].iter().product();
    let len = shape[axis];
    let radius = (kernel.len() / 2) as isize;

    (0..data.len())
        .into_par_iter()
        .map(|i| {
            let pos = (i / stride) % len;
            let base = i - pos * stride;
            kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let p = mirror(pos as isize + k as isize - radius, len);
                    w * data[base + p * stride]
                })
                .sum::<f32>()
        })
        .collect()
}

/// Mirror an index into `0..len` (edge sample repeated).
fn mirror(mut i: isize, len: usize) -> usize {
    let n = len as isize;
    if n == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - i - 1;
        } else {
            return i as usize;
        }
    }
}

/// Schema of the blur plugin, loaded from its JSON description.
pub fn blur_schema() -> Result<ParameterSchema> {
    ParameterSchema::from_json(BLUR_SCHEMA, |args| {
        let image = args.image("image")?;
        let sigma = args.float("sigma")?;
        Ok(AlgorithmOutput::Single(gaussian_blur(image, sigma)?))
    })
}

/// Schema of the smooth/detail split plugin.
pub fn split_schema() -> Result<ParameterSchema> {
    ParameterSchema::builder("smooth_split")
        .input(
            "image",
            InputDef::new(ParamType::Image, "Image").with_help("Image to split"),
        )
        .input(
            "sigma",
            InputDef::new(ParamType::Float, "Sigma")
                .with_default(2.0)
                .with_help("Scale separating smooth and detail parts"),
        )
        .output("smooth", OutputDef::image("Smooth"))
        .output("detail", OutputDef::image("Detail"))
        .function(|args| {
            let (smooth, detail) = smooth_split(args.image("image")?, args.float("sigma")?)?;
            Ok(AlgorithmOutput::Sequence(vec![smooth, detail]))
        })
        .build()
}
