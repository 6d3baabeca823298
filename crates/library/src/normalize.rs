//! Percentile intensity normalization
//!
//! Maps the `low` percentile of the image to 0 and the `high` percentile to 1.
//! Reports progress through the observer list when one is given.

use ndarray::IxDyn;
use sdpanel_core::observer::Observers;
use sdpanel_core::prelude::*;
use tracing::debug;

use crate::maybe_rayon::*;

/// Parameters for intensity normalization
#[derive(Debug, Clone)]
pub struct NormalizeParams {
    /// Lower percentile (0-100)
    pub low: f64,
    /// Upper percentile (0-100)
    pub high: f64,
    /// Clip the result to [0, 1]
    pub clip: bool,
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            low: 1.0,
            high: 99.8,
            clip: true,
        }
    }
}

/// Normalize image intensities between two percentiles
///
/// NaN samples are ignored when computing percentiles and stay NaN.
pub fn normalize_intensity(
    image: &ImageArray,
    params: &NormalizeParams,
    observers: Option<&Observers>,
) -> Result<ImageArray> {
    let report = |p: i32| {
        if let Some(o) = observers {
            o.progress(p);
        }
    };

    if !(0.0..=100.0).contains(&params.low)
        || !(0.0..=100.0).contains(&params.high)
        || params.low >= params.high
    {
        return Err(Error::Algorithm(format!(
            "Percentiles must satisfy 0 <= low < high <= 100, got {} and {}",
            params.low, params.high
        )));
    }

    report(5);
    let mut sorted: Vec<f32> = image.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Err(Error::Algorithm("Image has no valid samples".into()));
    }
    sorted.sort_by(f32::total_cmp);
    report(40);

    let lo = percentile(&sorted, params.low);
    let hi = percentile(&sorted, params.high);
    if hi <= lo {
        return Err(Error::Algorithm(format!(
            "Image intensity range is empty between percentiles ({lo} to {hi})"
        )));
    }
    if let Some(o) = observers {
        o.notify(&format!("Intensity range {lo:.4} to {hi:.4}"));
    }
    debug!(lo, hi, "normalization range");

    let scale = 1.0 / (hi - lo);
    let mut values: Vec<f32> = image.iter().copied().collect();
    values.par_iter_mut().for_each(|v| {
        let n = (*v - lo) * scale;
        *v = if params.clip { n.clamp(0.0, 1.0) } else { n };
    });
    report(100);

    Ok(ImageArray::from_shape_vec(IxDyn(image.shape()), values)?)
}

fn percentile(sorted: &[f32], p: f64) -> f32 {
    let idx = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Schema of the normalization plugin. Receives observers.
pub fn schema() -> Result<ParameterSchema> {
    let defaults = NormalizeParams::default();
    ParameterSchema::builder("normalize_intensity")
        .input("image", InputDef::new(ParamType::Image, "Image"))
        .input(
            "low",
            InputDef::new(ParamType::Float, "Low percentile").with_default(defaults.low),
        )
        .input(
            "high",
            InputDef::new(ParamType::Float, "High percentile").with_default(defaults.high),
        )
        .input(
            "clip",
            InputDef::new(ParamType::Bool, "Clip")
                .with_default(defaults.clip)
                .with_help("Clip values outside [0, 1]")
                .advanced(),
        )
        .output("normalized", OutputDef::image("Normalized"))
        .accepts_observers(true)
        .function(|args| {
            let params = NormalizeParams {
                low: args.float("low")?,
                high: args.float("high")?,
                clip: args.flag("clip")?,
            };
            let out = normalize_intensity(args.image("image")?, &params, args.observers())?;
            Ok(AlgorithmOutput::Single(out))
        })
        .build()
}
