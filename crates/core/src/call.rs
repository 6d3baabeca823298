//! Arguments passed to an algorithm and the values it returns.

use std::sync::Arc;

use ndarray::{Array, Dimension};

use crate::error::{Error, Result};
use crate::observer::Observers;
use crate::state::{ImageArray, State};
use crate::value::ParamValue;
use crate::viewer::LayerSource;

/// A single resolved argument.
#[derive(Debug, Clone)]
pub enum Argument {
    Value(ParamValue),
    Image(Arc<ImageArray>),
}

impl From<ParamValue> for Argument {
    fn from(v: ParamValue) -> Self {
        Self::Value(v)
    }
}

impl From<ImageArray> for Argument {
    fn from(a: ImageArray) -> Self {
        Self::Image(Arc::new(a))
    }
}

impl From<Arc<ImageArray>> for Argument {
    fn from(a: Arc<ImageArray>) -> Self {
        Self::Image(a)
    }
}

/// Named arguments for one algorithm call.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<(String, Argument)>,
    observers: Option<Observers>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, arg: impl Into<Argument>) -> Self {
        self.insert(key, arg);
        self
    }

    pub fn with_observers(mut self, observers: Observers) -> Self {
        self.observers = Some(observers);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, arg: impl Into<Argument>) {
        let key = key.into();
        let arg = arg.into();
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = arg,
            None => self.values.push((key, arg)),
        }
    }

    /// Build the arguments for `state`, looking up every referenced layer
    /// by name in `layers`.
    pub fn resolve(
        state: &State,
        layers: &dyn LayerSource,
        observers: Option<Observers>,
    ) -> Result<Self> {
        let mut values = Vec::with_capacity(state.inputs.len());
        for (key, value) in &state.inputs {
            let arg = match value {
                ParamValue::Layer(name) => {
                    let data = layers
                        .image(name)
                        .ok_or_else(|| Error::LayerNotFound(name.clone()))?;
                    Argument::Image(data)
                }
                other => Argument::Value(other.clone()),
            };
            values.push((key.clone(), arg));
        }
        Ok(Self { values, observers })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &str) -> Result<&Argument> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, a)| a)
            .ok_or_else(|| Error::UnknownParameter(key.to_string()))
    }

    fn value(&self, key: &str) -> Result<&ParamValue> {
        match self.get(key)? {
            Argument::Value(v) => Ok(v),
            Argument::Image(_) => Err(mismatch(key, "a value")),
        }
    }

    pub fn image(&self, key: &str) -> Result<&ImageArray> {
        match self.get(key)? {
            Argument::Image(a) => Ok(a),
            Argument::Value(_) => Err(mismatch(key, "an image")),
        }
    }

    pub fn float(&self, key: &str) -> Result<f64> {
        self.value(key)?
            .as_f64()
            .ok_or_else(|| mismatch(key, "a number"))
    }

    pub fn int(&self, key: &str) -> Result<i64> {
        self.value(key)?
            .as_i64()
            .ok_or_else(|| mismatch(key, "an integer"))
    }

    pub fn flag(&self, key: &str) -> Result<bool> {
        self.value(key)?
            .as_bool()
            .ok_or_else(|| mismatch(key, "a boolean"))
    }

    pub fn text(&self, key: &str) -> Result<&str> {
        self.value(key)?
            .as_str()
            .ok_or_else(|| mismatch(key, "text"))
    }

    pub fn zyx_int(&self, key: &str) -> Result<[i64; 3]> {
        self.value(key)?
            .as_zyx_int()
            .ok_or_else(|| mismatch(key, "an integer triple"))
    }

    pub fn zyx_float(&self, key: &str) -> Result<[f64; 3]> {
        self.value(key)?
            .as_zyx_float()
            .ok_or_else(|| mismatch(key, "a number triple"))
    }

    /// Present only when the schema accepts observers.
    pub fn observers(&self) -> Option<&Observers> {
        self.observers.as_ref()
    }

    pub fn progress(&self, percent: i32) {
        if let Some(observers) = &self.observers {
            observers.progress(percent);
        }
    }

    pub fn notify(&self, message: &str) {
        if let Some(observers) = &self.observers {
            observers.notify(message);
        }
    }
}

fn mismatch(key: &str, expected: &'static str) -> Error {
    Error::TypeMismatch {
        key: key.to_string(),
        expected,
    }
}

/// What an algorithm returns.
#[derive(Debug, Clone)]
pub enum AlgorithmOutput {
    /// A bare value, only valid for schemas with exactly one output.
    Single(ImageArray),
    /// One value per declared output, in declared order.
    Sequence(Vec<ImageArray>),
}

impl AlgorithmOutput {
    pub fn single<D: Dimension>(array: Array<f32, D>) -> Self {
        Self::Single(array.into_dyn())
    }

    pub fn sequence<D, I>(arrays: I) -> Self
    where
        D: Dimension,
        I: IntoIterator<Item = Array<f32, D>>,
    {
        Self::Sequence(arrays.into_iter().map(|a| a.into_dyn()).collect())
    }

    /// Match the returned values against `expected` declared outputs.
    /// A single value is wrapped when exactly one output is declared.
    pub fn into_results(self, expected: usize) -> Result<Vec<ImageArray>> {
        let results = match self {
            Self::Single(a) if expected == 1 => vec![a],
            Self::Single(_) => {
                return Err(Error::OutputCountMismatch { expected, actual: 1 });
            }
            Self::Sequence(v) if v.len() == expected => v,
            Self::Sequence(v) => {
                return Err(Error::OutputCountMismatch {
                    expected,
                    actual: v.len(),
                });
            }
        };
        Ok(results.into_iter().map(materialize).collect())
    }
}

fn materialize(a: ImageArray) -> ImageArray {
    if a.is_standard_layout() {
        a
    } else {
        a.as_standard_layout().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn test_typed_access() {
        let args = Arguments::new()
            .with("sigma", ParamValue::Float(1.5))
            .with("iter", ParamValue::Int(10))
            .with("image", Array2::<f32>::zeros((4, 4)).into_dyn());

        assert_eq!(args.float("sigma").unwrap(), 1.5);
        assert_eq!(args.float("iter").unwrap(), 10.0);
        assert_eq!(args.int("iter").unwrap(), 10);
        assert_eq!(args.image("image").unwrap().shape(), &[4, 4]);
        assert!(matches!(args.int("sigma"), Err(Error::TypeMismatch { .. })));
        assert!(matches!(args.float("image"), Err(Error::TypeMismatch { .. })));
        assert!(matches!(args.float("nope"), Err(Error::UnknownParameter(_))));
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut args = Arguments::new().with("a", ParamValue::Int(1));
        args.insert("a", ParamValue::Int(2));
        assert_eq!(args.len(), 1);
        assert_eq!(args.int("a").unwrap(), 2);
    }

    #[test]
    fn test_single_output_wrapped() {
        let out = AlgorithmOutput::single(Array2::<f32>::ones((3, 3)));
        let results = out.into_results(1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ndim(), 2);
    }

    #[test]
    fn test_single_output_with_two_declared() {
        let out = AlgorithmOutput::single(Array2::<f32>::ones((3, 3)));
        let err = out.into_results(2).unwrap_err();
        assert!(matches!(err, Error::OutputCountMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_sequence_length_checked() {
        let out = AlgorithmOutput::sequence(vec![Array3::<f32>::zeros((2, 2, 2))]);
        assert!(matches!(
            out.into_results(3),
            Err(Error::OutputCountMismatch { expected: 3, actual: 1 })
        ));
    }

    #[test]
    fn test_transposed_result_materialized() {
        let a = Array2::from_shape_fn((2, 3), |(r, c)| (r * 3 + c) as f32);
        let out = AlgorithmOutput::single(a.reversed_axes());
        let results = out.into_results(1).unwrap();
        assert!(results[0].is_standard_layout());
        assert_eq!(results[0].shape(), &[3, 2]);
        assert_eq!(results[0][[2, 1]], 5.0);
    }
}
