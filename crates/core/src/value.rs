//! Typed parameter values carried in a [`State`](crate::state::State).

use std::fmt;

/// A parsed parameter value.
///
/// Coordinate triples are stored in `[z, y, x]` order. Image inputs hold the
/// layer *name*; the layer itself is looked up when the algorithm runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Choice(String),
    ZyxInt([i64; 3]),
    ZyxFloat([f64; 3]),
    Layer(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Free text or the selected choice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Choice(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_zyx_int(&self) -> Option<[i64; 3]> {
        match self {
            Self::ZyxInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer triples widen to floats.
    pub fn as_zyx_float(&self) -> Option<[f64; 3]> {
        match self {
            Self::ZyxFloat(v) => Some(*v),
            Self::ZyxInt([z, y, x]) => Some([*z as f64, *y as f64, *x as f64]),
            _ => None,
        }
    }

    pub fn as_layer_name(&self) -> Option<&str> {
        match self {
            Self::Layer(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Text(s) | Self::Choice(s) | Self::Layer(s) => write!(f, "{s}"),
            Self::ZyxInt([z, y, x]) => write!(f, "(z={z}, y={y}, x={x})"),
            Self::ZyxFloat([z, y, x]) => write!(f, "(z={z}, y={y}, x={x})"),
        }
    }
}
