//! State widget: the form built from a schema.

use crate::control::{Axis, Control, ValidationError};
use crate::error::{Error, Result};
use crate::schema::{OutputDef, ParameterSchema};
use crate::state::{OutputSlot, State};

/// Produces validated state snapshots for a run.
pub trait StateProvider {
    /// Every validation failure, in declared order.
    fn validate(&self) -> Vec<ValidationError>;

    /// Snapshot of the current inputs plus empty output slots.
    fn snapshot(&self) -> Result<State>;

    fn check_inputs(&self) -> bool {
        self.validate().is_empty()
    }
}

/// Controls for every input of one schema, in declared order.
#[derive(Debug, Clone)]
pub struct StateWidget {
    name: String,
    controls: Vec<Control>,
    outputs: Vec<(String, OutputDef)>,
    advanced: bool,
}

impl StateWidget {
    /// `layers` are the image layer names currently in the viewer.
    pub fn new(schema: &ParameterSchema, layers: &[String]) -> Self {
        let controls = schema
            .inputs()
            .iter()
            .map(|(key, def)| Control::from_input(key, def, layers))
            .collect();

        Self {
            name: schema.name().to_string(),
            controls,
            outputs: schema.outputs().to_vec(),
            advanced: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn advanced_mode(&self) -> bool {
        self.advanced
    }

    /// Show or hide every advanced control.
    pub fn toggle_advanced(&mut self, enabled: bool) {
        self.advanced = enabled;
    }

    pub fn has_advanced(&self) -> bool {
        self.controls.iter().any(Control::is_advanced)
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut [Control] {
        &mut self.controls
    }

    /// Controls shown in the current mode.
    pub fn visible_controls(&self) -> impl Iterator<Item = &Control> {
        let advanced = self.advanced;
        self.controls.iter().filter(move |c| c.is_visible(advanced))
    }

    pub fn control(&self, key: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.key() == key)
    }

    pub fn control_mut(&mut self, key: &str) -> Result<&mut Control> {
        self.controls
            .iter_mut()
            .find(|c| c.key() == key)
            .ok_or_else(|| Error::UnknownParameter(key.to_string()))
    }

    pub fn set_text(&mut self, key: &str, text: impl Into<String>) -> Result<()> {
        self.control_mut(key)?.set_text(text)
    }

    pub fn set_coordinate(&mut self, key: &str, axis: Axis, text: impl Into<String>) -> Result<()> {
        self.control_mut(key)?.set_coordinate(axis, text)
    }

    pub fn select(&mut self, key: &str, choice: &str) -> Result<()> {
        self.control_mut(key)?.select(choice)
    }

    pub fn set_flag(&mut self, key: &str, flag: bool) -> Result<()> {
        self.control_mut(key)?.set_flag(flag)
    }

    /// Refresh every layer selector with the viewer's current image layers.
    pub fn on_layer_change(&mut self, layers: &[String]) {
        for control in &mut self.controls {
            control.refresh_layers(layers);
        }
    }

    /// Parse every control into a [`State`].
    pub fn state(&self) -> Result<State> {
        let mut inputs = Vec::with_capacity(self.controls.len());
        let mut errors = Vec::new();
        for control in &self.controls {
            match control.value() {
                Ok(value) => inputs.push((control.key().to_string(), value)),
                Err(e) => errors.push(e),
            }
        }
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        Ok(State {
            name: self.name.clone(),
            inputs,
            outputs: self
                .outputs
                .iter()
                .map(|(key, def)| (key.clone(), OutputSlot::from(def)))
                .collect(),
        })
    }
}

impl StateProvider for StateWidget {
    fn validate(&self) -> Vec<ValidationError> {
        self.controls
            .iter()
            .filter_map(|c| c.value().err())
            .collect()
    }

    fn snapshot(&self) -> Result<State> {
        self.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::AlgorithmOutput;
    use crate::schema::{InputDef, ParamType};
    use crate::value::ParamValue;

    fn schema() -> ParameterSchema {
        ParameterSchema::builder("deconv")
            .input("image", InputDef::new(ParamType::Image, "Image"))
            .input("psf", InputDef::new(ParamType::Image, "PSF"))
            .input("iter", InputDef::new(ParamType::Int, "Iterations").with_default(30))
            .input("pad", InputDef::new(ParamType::Bool, "Pad").with_default(true).advanced())
            .input("weight", InputDef::new(ParamType::Float, "Weight").with_default(0.6).advanced())
            .output("image", OutputDef::image("Deconvolved"))
            .function(|_| Ok(AlgorithmOutput::Sequence(Vec::new())))
            .build()
            .unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn visible_keys(w: &StateWidget) -> Vec<String> {
        w.visible_controls().map(|c| c.key().to_string()).collect()
    }

    #[test]
    fn test_controls_follow_declared_order() {
        let w = StateWidget::new(&schema(), &names(&["cells"]));
        let keys: Vec<&str> = w.controls().iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["image", "psf", "iter", "pad", "weight"]);
        assert!(w.has_advanced());
        assert!(!w.advanced_mode());
    }

    #[test]
    fn test_toggle_advanced_idempotent() {
        let mut w = StateWidget::new(&schema(), &names(&["cells"]));
        let basic = vec!["image", "psf", "iter"];
        assert_eq!(visible_keys(&w), basic);

        w.toggle_advanced(false);
        w.toggle_advanced(false);
        assert_eq!(visible_keys(&w), basic);

        w.toggle_advanced(true);
        let once = visible_keys(&w);
        w.toggle_advanced(true);
        assert_eq!(visible_keys(&w), once);
        assert_eq!(once.len(), 5);
    }

    #[test]
    fn test_check_inputs_reports_every_failure() {
        let mut w = StateWidget::new(&schema(), &[]);
        w.set_text("weight", "heavy").unwrap();
        let errors = w.validate();
        let keys: Vec<&str> = errors.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["image", "psf", "weight"]);
        assert!(!w.check_inputs());
        assert!(matches!(w.state(), Err(Error::Validation(e)) if e.len() == 3));
    }

    #[test]
    fn test_state_has_every_key() {
        let w = StateWidget::new(&schema(), &names(&["cells", "psf"]));
        assert!(w.check_inputs());
        let state = w.state().unwrap();
        assert_eq!(state.name, "deconv");
        assert_eq!(
            state.input_keys().collect::<Vec<_>>(),
            vec!["image", "psf", "iter", "pad", "weight"]
        );
        assert_eq!(state.output_keys().collect::<Vec<_>>(), vec!["image"]);
        assert!(state.outputs.iter().all(|(_, slot)| slot.data.is_none()));
    }

    #[test]
    fn test_defaults_survive_snapshot() {
        let w = StateWidget::new(&schema(), &names(&["cells"]));
        let state = w.state().unwrap();
        assert_eq!(state.input("iter"), Some(&ParamValue::Int(30)));
        assert_eq!(state.input("pad"), Some(&ParamValue::Bool(true)));
        assert_eq!(state.input("weight"), Some(&ParamValue::Float(0.6)));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut w = StateWidget::new(&schema(), &names(&["cells"]));
        let before = w.snapshot().unwrap();
        w.set_text("iter", "5").unwrap();
        assert_eq!(before.input("iter"), Some(&ParamValue::Int(30)));
        assert_eq!(w.snapshot().unwrap().input("iter"), Some(&ParamValue::Int(5)));
    }

    #[test]
    fn test_unknown_key() {
        let mut w = StateWidget::new(&schema(), &[]);
        assert!(matches!(w.set_text("nope", "1"), Err(Error::UnknownParameter(_))));
    }

    #[test]
    fn test_layer_change_refreshes_all_selectors() {
        let mut w = StateWidget::new(&schema(), &[]);
        w.on_layer_change(&names(&["cells"]));
        let state = w.state().unwrap();
        assert_eq!(state.input("image"), Some(&ParamValue::Layer("cells".into())));
        assert_eq!(state.input("psf"), Some(&ParamValue::Layer("cells".into())));
    }
}
