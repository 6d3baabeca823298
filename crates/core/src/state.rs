//! Per-run state snapshot handed from the state widget to the worker.

use ndarray::ArrayD;

use crate::schema::{OutputDef, ParamType};
use crate::value::ParamValue;

/// Image data as stored in layers and output slots.
pub type ImageArray = ArrayD<f32>;

/// One declared output. `data` stays `None` until a run succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSlot {
    pub kind: ParamType,
    pub label: String,
    pub data: Option<ImageArray>,
}

impl From<&OutputDef> for OutputSlot {
    fn from(def: &OutputDef) -> Self {
        Self {
            kind: def.kind,
            label: def.label.clone(),
            data: None,
        }
    }
}

/// A typed snapshot of every input plus one slot per declared output.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub name: String,
    pub inputs: Vec<(String, ParamValue)>,
    pub outputs: Vec<(String, OutputSlot)>,
}

impl State {
    pub fn input(&self, key: &str) -> Option<&ParamValue> {
        self.inputs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn output(&self, key: &str) -> Option<&OutputSlot> {
        self.outputs.iter().find(|(k, _)| k == key).map(|(_, s)| s)
    }

    pub fn input_keys(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|(k, _)| k.as_str())
    }

    pub fn output_keys(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|(k, _)| k.as_str())
    }

    /// Names of the layers referenced by image inputs, in declared order.
    pub fn layer_refs(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().filter_map(|(_, v)| v.as_layer_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> State {
        State {
            name: "blur".into(),
            inputs: vec![
                ("image".into(), ParamValue::Layer("cells".into())),
                ("sigma".into(), ParamValue::Float(1.5)),
            ],
            outputs: vec![("blurred".into(), OutputSlot::from(&OutputDef::image("Blurred")))],
        }
    }

    #[test]
    fn test_lookup_by_key() {
        let state = sample_state();
        assert_eq!(state.input("sigma"), Some(&ParamValue::Float(1.5)));
        assert_eq!(state.output("blurred").map(|s| s.label.as_str()), Some("Blurred"));
        assert!(state.input("missing").is_none());
    }

    #[test]
    fn test_layer_refs() {
        let state = sample_state();
        assert_eq!(state.layer_refs().collect::<Vec<_>>(), vec!["cells"]);
    }
}
