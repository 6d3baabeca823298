//! Gaussian point spread functions
//!
//! Generates normalized 2D and 3D Gaussian PSFs centered in the array.
//! Axes follow the `(z, y, x)` convention used by the coordinate controls.

use ndarray::{Array2, Array3};
use sdpanel_core::prelude::*;

use crate::maybe_rayon::*;
use crate::{checked_len, positive_size};

/// Parameters for a 3D Gaussian PSF
#[derive(Debug, Clone)]
pub struct GaussianPsfParams {
    /// Array shape as `[z, y, x]`
    pub shape: [usize; 3],
    /// Standard deviation per axis in pixels, `[z, y, x]`
    pub sigma: [f64; 3],
}

impl Default for GaussianPsfParams {
    fn default() -> Self {
        Self {
            shape: [11, 15, 15],
            sigma: [1.5, 1.5, 1.5],
        }
    }
}

/// Compute a 2D Gaussian PSF
///
/// # Arguments
/// * `shape` - Output shape `(rows, cols)`
/// * `sigma` - Isotropic standard deviation in pixels
///
/// # Returns
/// Array whose values sum to 1
pub fn gaussian_psf_2d(shape: (usize, usize), sigma: f64) -> Result<Array2<f32>> {
    let data = gaussian(&[shape.0, shape.1], &[sigma, sigma])?;
    Ok(Array2::from_shape_vec(shape, data)?)
}

/// Compute a 3D Gaussian PSF
pub fn gaussian_psf_3d(params: &GaussianPsfParams) -> Result<Array3<f32>> {
    let [nz, ny, nx] = params.shape;
    let data = gaussian(&params.shape, &params.sigma)?;
    Ok(Array3::from_shape_vec((nz, ny, nx), data)?)
}

fn gaussian(shape: &[usize], sigma: &[f64]) -> Result<Vec<f32>> {
    if shape.contains(&0) {
        return Err(Error::Algorithm(format!("PSF shape must be positive, got {shape:?}")));
    }
    if sigma.iter().any(|s| !s.is_finite() || *s <= 0.0) {
        return Err(Error::Algorithm(format!("PSF sigma must be > 0, got {sigma:?}")));
    }

    let center: Vec<f64> = shape.iter().map(|&n| (n as f64 - 1.0) / 2.0).collect();
    let total: usize = shape.iter().product();

    let values: Vec<f64> = (0..total)
        .into_par_iter()
        .map(|flat| {
            let mut rem = flat;
            let mut exponent = 0.0;
            for axis in (0..shape.len()).rev() {
                let coord = (rem % shape[axis]) as f64;
                rem /= shape[axis];
                let d = (coord - center[axis]) / sigma[axis];
                exponent += d * d;
            }
            (-0.5 * exponent).exp()
        })
        .collect();

    let sum: f64 = values.iter().sum();
    Ok(values.into_iter().map(|v| (v / sum) as f32).collect())
}

/// Schema of the 2D Gaussian PSF plugin.
pub fn schema_2d() -> Result<ParameterSchema> {
    ParameterSchema::builder("gaussian_psf_2d")
        .input(
            "sigma",
            InputDef::new(ParamType::Float, "Sigma")
                .with_default(1.5)
                .with_help("Gaussian standard deviation in pixels"),
        )
        .input(
            "size",
            InputDef::new(ParamType::Int, "Size")
                .with_default(15)
                .with_help("Width and height of the PSF image")
                .advanced(),
        )
        .output("psf", OutputDef::image("PSF"))
        .function(|args| {
            let sigma = args.float("sigma")?;
            let size = positive_size(args.int("size")?, "Size")?;
            Ok(AlgorithmOutput::single(gaussian_psf_2d((size, size), sigma)?))
        })
        .build()
}

/// Schema of the 3D Gaussian PSF plugin.
pub fn schema_3d() -> Result<ParameterSchema> {
    let defaults = GaussianPsfParams::default();
    ParameterSchema::builder("gaussian_psf_3d")
        .input(
            "sigma",
            InputDef::new(ParamType::ZyxFloat, "Sigma")
                .with_default(defaults.sigma)
                .with_help("Gaussian standard deviation per axis in pixels"),
        )
        .input(
            "shape",
            InputDef::new(ParamType::ZyxInt, "Shape")
                .with_default(defaults.shape.map(|n| n as i64))
                .with_help("PSF image shape")
                .advanced(),
        )
        .output("psf", OutputDef::image("PSF"))
        .function(|args| {
            let [z, y, x] = args.zyx_int("shape")?;
            let params = GaussianPsfParams {
                shape: [
                    positive_size(z, "Shape z")?,
                    positive_size(y, "Shape y")?,
                    positive_size(x, "Shape x")?,
                ],
                sigma: args.zyx_float("sigma")?,
            };
            checked_len(&params.shape)?;
            Ok(AlgorithmOutput::single(gaussian_psf_3d(&params)?))
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_psf_2d_normalized_and_centered() {
        let psf = gaussian_psf_2d((15, 15), 1.5).unwrap();
        let sum: f32 = psf.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "sum = {sum}");

        let peak = psf[[7, 7]];
        assert!(psf.iter().all(|&v| v <= peak));
        assert!((psf[[7, 6]] - psf[[7, 8]]).abs() < 1e-9);
        assert!((psf[[6, 7]] - psf[[8, 7]]).abs() < 1e-9);
    }

    #[test]
    fn test_psf_3d_anisotropic() {
        let params = GaussianPsfParams {
            shape: [9, 11, 11],
            sigma: [3.0, 1.0, 1.0],
        };
        let psf = gaussian_psf_3d(&params).unwrap();
        assert_eq!(psf.shape(), &[9, 11, 11]);
        // Wider along z: the falloff one step away is smaller.
        let center = psf[[4, 5, 5]];
        assert!(psf[[5, 5, 5]] / center > psf[[4, 5, 6]] / center);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(gaussian_psf_2d((0, 5), 1.0).is_err());
        assert!(gaussian_psf_2d((5, 5), 0.0).is_err());
        assert!(gaussian_psf_2d((5, 5), f64::NAN).is_err());
    }

    #[test]
    fn test_schema_defaults_run() {
        let schema = schema_3d().unwrap();
        let state = StateWidget::new(&schema, &[]).state().unwrap();
        assert_eq!(state.input("shape"), Some(&ParamValue::ZyxInt([11, 15, 15])));

        let args = Arguments::new()
            .with("sigma", ParamValue::ZyxFloat([1.0, 1.0, 1.0]))
            .with("shape", ParamValue::ZyxInt([3, 5, 5]));
        match schema.call(&args).unwrap() {
            AlgorithmOutput::Single(psf) => assert_eq!(psf.shape(), &[3, 5, 5]),
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn test_schema_rejects_non_positive_size() {
        let schema = schema_2d().unwrap();
        let args = Arguments::new()
            .with("sigma", ParamValue::Float(1.0))
            .with("size", ParamValue::Int(-3));
        assert!(matches!(schema.call(&args), Err(Error::Algorithm(_))));
    }

    #[test]
    fn test_schema_rejects_oversized_shape() {
        let schema = schema_3d().unwrap();
        let args = Arguments::new()
            .with("sigma", ParamValue::ZyxFloat([1.0, 1.0, 1.0]))
            .with("shape", ParamValue::ZyxInt([4096, 4096, 4096]));
        assert!(matches!(schema.call(&args), Err(Error::Algorithm(_))));

        let schema = schema_2d().unwrap();
        let args = Arguments::new()
            .with("sigma", ParamValue::Float(1.0))
            .with("size", ParamValue::Int(1 << 40));
        assert!(matches!(schema.call(&args), Err(Error::Algorithm(_))));
    }
}
