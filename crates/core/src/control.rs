//! Input controls, one per schema input.
//!
//! [`Control::from_input`] is the control factory: the declared
//! [`ParamType`] selects a [`ControlKind`]. A control keeps the raw text or
//! selection the user edits and parses it on demand.

use std::fmt;

use crate::error::{Error, Result};
use crate::schema::{InputDef, ParamType};
use crate::value::ParamValue;

/// Labels of a boolean toggle, in display order.
pub const TOGGLE_LABELS: [&str; 2] = ["True", "False"];

/// A user-visible validation failure naming the offending parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub key: String,
    pub label: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(key: impl Into<String>, label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Axis of a coordinate control. Fields are stored in z, y, x order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Z,
    Y,
    X,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Z, Axis::Y, Axis::X];

    pub fn index(&self) -> usize {
        match self {
            Self::Z => 0,
            Self::Y => 1,
            Self::X => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Z => "z",
            Self::Y => "y",
            Self::X => "x",
        }
    }
}

/// The editable content of a control.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    /// Selector over the viewer's image layers.
    LayerSelect {
        choices: Vec<String>,
        selected: Option<String>,
    },
    /// Three text fields in z, y, x order.
    Coordinates { integer: bool, fields: [String; 3] },
    /// One numeric text field.
    Number { integer: bool, text: String },
    /// Two-state choice shown as "True"/"False".
    Toggle { value: bool },
    /// Choice restricted to `values`.
    Select { values: Vec<String>, selected: usize },
    /// Free text.
    Text { text: String },
}

/// One interactive input bound to a single schema parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    key: String,
    label: String,
    help: String,
    advanced: bool,
    kind: ControlKind,
}

impl Control {
    /// Build the control for one schema input. `layers` are the image layer
    /// names currently in the viewer.
    pub fn from_input(key: &str, def: &InputDef, layers: &[String]) -> Self {
        let default = def.default.as_ref();
        let kind = match def.kind {
            ParamType::Image => {
                let wanted = default.map(|d| d.to_text());
                let selected = wanted
                    .filter(|w| layers.contains(w))
                    .or_else(|| layers.first().cloned());
                ControlKind::LayerSelect {
                    choices: layers.to_vec(),
                    selected,
                }
            }
            ParamType::ZyxInt | ParamType::ZyxFloat => ControlKind::Coordinates {
                integer: def.kind == ParamType::ZyxInt,
                fields: default.map(|d| d.triple_texts()).unwrap_or_default(),
            },
            ParamType::Float | ParamType::Int => ControlKind::Number {
                integer: def.kind == ParamType::Int,
                text: default.map(|d| d.to_text()).unwrap_or_default(),
            },
            ParamType::Bool => ControlKind::Toggle {
                value: !default.is_some_and(|d| d.is_false()),
            },
            ParamType::Select => {
                let values: Vec<String> = def.values.iter().map(|v| v.to_text()).collect();
                let selected = default
                    .and_then(|d| {
                        let text = d.to_text();
                        values.iter().position(|v| *v == text)
                    })
                    .unwrap_or(0);
                ControlKind::Select { values, selected }
            }
            ParamType::String => ControlKind::Text {
                text: default.map(|d| d.to_text()).unwrap_or_default(),
            },
        };

        Self {
            key: key.to_string(),
            label: def.label.clone(),
            help: def.help.clone(),
            advanced: def.advanced,
            kind,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn is_advanced(&self) -> bool {
        self.advanced
    }

    /// Whether the control (and its label) is shown in the given mode.
    pub fn is_visible(&self, advanced_mode: bool) -> bool {
        !self.advanced || advanced_mode
    }

    pub fn kind(&self) -> &ControlKind {
        &self.kind
    }

    /// Direct access for UI toolkits binding the raw fields.
    pub fn kind_mut(&mut self) -> &mut ControlKind {
        &mut self.kind
    }

    fn invalid(&self, message: String) -> ValidationError {
        ValidationError::new(&self.key, &self.label, message)
    }

    /// Parse the current content into a typed value.
    pub fn value(&self) -> std::result::Result<ParamValue, ValidationError> {
        match &self.kind {
            ControlKind::LayerSelect { choices, selected } => match selected {
                Some(name) => Ok(ParamValue::Layer(name.clone())),
                None if choices.is_empty() => {
                    Err(self.invalid(format!("The input {} is empty", self.label)))
                }
                None => Err(self.invalid(format!("No layer selected for {}", self.label))),
            },
            ControlKind::Coordinates { integer: true, fields } => {
                let mut out = [0_i64; 3];
                for axis in Axis::ALL {
                    out[axis.index()] = parse_int(&fields[axis.index()]).ok_or_else(|| {
                        self.invalid(format!(
                            "Coordinate {} for {} must be an integer",
                            axis.name(),
                            self.label
                        ))
                    })?;
                }
                Ok(ParamValue::ZyxInt(out))
            }
            ControlKind::Coordinates { integer: false, fields } => {
                let mut out = [0_f64; 3];
                for axis in Axis::ALL {
                    out[axis.index()] = parse_float(&fields[axis.index()]).ok_or_else(|| {
                        self.invalid(format!(
                            "Coordinate {} for {} must be a number",
                            axis.name(),
                            self.label
                        ))
                    })?;
                }
                Ok(ParamValue::ZyxFloat(out))
            }
            ControlKind::Number { integer: true, text } => parse_int(text)
                .map(ParamValue::Int)
                .ok_or_else(|| self.invalid(format!("Value for {} must be an integer", self.label))),
            ControlKind::Number { integer: false, text } => parse_float(text)
                .map(ParamValue::Float)
                .ok_or_else(|| self.invalid(format!("Value for {} must be a number", self.label))),
            ControlKind::Toggle { value } => Ok(ParamValue::Bool(*value)),
            ControlKind::Select { values, selected } => values
                .get(*selected)
                .map(|v| ParamValue::Choice(v.clone()))
                .ok_or_else(|| self.invalid(format!("No value selected for {}", self.label))),
            ControlKind::Text { text } => Ok(ParamValue::Text(text.clone())),
        }
    }

    /// Same parse as [`value`](Self::value), reported as a flag.
    pub fn check(&self) -> bool {
        self.value().is_ok()
    }

    /// Replace the text of a number or free-text control.
    pub fn set_text(&mut self, value: impl Into<String>) -> Result<()> {
        match &mut self.kind {
            ControlKind::Number { text, .. } | ControlKind::Text { text } => {
                *text = value.into();
                Ok(())
            }
            _ => Err(self.mismatch("a text field")),
        }
    }

    pub fn set_coordinate(&mut self, axis: Axis, value: impl Into<String>) -> Result<()> {
        match &mut self.kind {
            ControlKind::Coordinates { fields, .. } => {
                fields[axis.index()] = value.into();
                Ok(())
            }
            _ => Err(self.mismatch("a coordinate field")),
        }
    }

    /// Select a layer or a choice by its text.
    pub fn select(&mut self, choice: &str) -> Result<()> {
        let key = self.key.clone();
        match &mut self.kind {
            ControlKind::LayerSelect { choices, selected } => {
                if !choices.iter().any(|c| c == choice) {
                    return Err(Error::LayerNotFound(choice.to_string()));
                }
                *selected = Some(choice.to_string());
                Ok(())
            }
            ControlKind::Select { values, selected } => {
                let pos = values.iter().position(|v| v == choice).ok_or_else(|| {
                    Error::InvalidSchema(format!("{choice} is not a value of {key}"))
                })?;
                *selected = pos;
                Ok(())
            }
            _ => Err(self.mismatch("a selector")),
        }
    }

    pub fn set_flag(&mut self, flag: bool) -> Result<()> {
        match &mut self.kind {
            ControlKind::Toggle { value } => {
                *value = flag;
                Ok(())
            }
            _ => Err(self.mismatch("a toggle")),
        }
    }

    /// Replace the candidates of a layer selector.
    ///
    /// The current selection is kept while it still exists and cleared when
    /// it vanished. An empty selector picks the first layer once candidates
    /// appear.
    pub fn refresh_layers(&mut self, names: &[String]) {
        if let ControlKind::LayerSelect { choices, selected } = &mut self.kind {
            let had_candidates = !choices.is_empty();
            *selected = match selected.take() {
                Some(current) if names.contains(&current) => Some(current),
                Some(_) => None,
                None if !had_candidates => names.first().cloned(),
                None => None,
            };
            *choices = names.to_vec();
        }
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::TypeMismatch {
            key: self.key.clone(),
            expected,
        }
    }
}

fn parse_int(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}

fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}
