//! Plugin registry.
//!
//! An algorithm library exposes its plugins as a list of [`PluginEntry`]
//! values; the host turns any entry into a live panel with nothing more than
//! a viewer handle.

use std::sync::Arc;

use crate::controller::{PanelConfig, PluginController};
use crate::error::Result;
use crate::schema::ParameterSchema;
use crate::viewer::HostViewer;

/// Builds the schema of one plugin.
pub type SchemaFactory = fn() -> Result<ParameterSchema>;

/// A plugin offered by an algorithm library.
#[derive(Debug, Clone)]
pub struct PluginEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    factory: SchemaFactory,
}

impl PluginEntry {
    pub const fn new(
        id: &'static str,
        name: &'static str,
        category: &'static str,
        description: &'static str,
        factory: SchemaFactory,
    ) -> Self {
        Self {
            id,
            name,
            category,
            description,
            factory,
        }
    }

    pub fn schema(&self) -> Result<ParameterSchema> {
        (self.factory)()
    }

    /// Build a panel for this plugin bound to `viewer`.
    pub fn instantiate(&self, viewer: Arc<dyn HostViewer>) -> Result<PluginController> {
        self.instantiate_with(viewer, PanelConfig::default())
    }

    pub fn instantiate_with(
        &self,
        viewer: Arc<dyn HostViewer>,
        config: PanelConfig,
    ) -> Result<PluginController> {
        PluginController::with_config(self.schema()?, viewer, config)
    }
}

/// Look up an entry by id.
pub fn find<'a>(entries: &'a [PluginEntry], id: &str) -> Option<&'a PluginEntry> {
    entries.iter().find(|e| e.id == id)
}

/// Categories in first-seen order.
pub fn categories(entries: &[PluginEntry]) -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for e in entries {
        if !out.contains(&e.category) {
            out.push(e.category);
        }
    }
    out
}

pub fn entries_by_category<'a>(entries: &'a [PluginEntry], category: &str) -> Vec<&'a PluginEntry> {
    entries.iter().filter(|e| e.category == category).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::AlgorithmOutput;
    use crate::error::Error;
    use crate::schema::{InputDef, OutputDef, ParamType};
    use crate::viewer::Viewer;
    use crate::widget::StateProvider;

    fn zeros_schema() -> Result<ParameterSchema> {
        ParameterSchema::builder("zeros")
            .input("size", InputDef::new(ParamType::Int, "Size").with_default(4))
            .output("zeros", OutputDef::image("Zeros"))
            .function(|args| {
                let n = args.int("size")?.max(1) as usize;
                Ok(AlgorithmOutput::single(ndarray::Array2::<f32>::zeros((n, n))))
            })
            .build()
    }

    fn broken_schema() -> Result<ParameterSchema> {
        ParameterSchema::builder("broken").build()
    }

    fn entries() -> Vec<PluginEntry> {
        vec![
            PluginEntry::new("zeros", "Zeros", "Generate", "Blank image", zeros_schema),
            PluginEntry::new("broken", "Broken", "Debug", "Never builds", broken_schema),
            PluginEntry::new("zeros2", "Zeros again", "Generate", "Blank image", zeros_schema),
        ]
    }

    #[test]
    fn test_instantiate_from_viewer_only() {
        let viewer = Viewer::new();
        let list = entries();
        let panel = find(&list, "zeros").unwrap().instantiate(Arc::new(viewer)).unwrap();
        assert_eq!(panel.name(), "zeros");
        assert!(panel.widget().check_inputs());
    }

    #[test]
    fn test_broken_schema_surfaces_error() {
        let list = entries();
        let err = find(&list, "broken")
            .unwrap()
            .instantiate(Arc::new(Viewer::new()))
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidSchema(_)));
    }

    #[test]
    fn test_grouping() {
        let list = entries();
        assert_eq!(categories(&list), vec!["Generate", "Debug"]);
        assert_eq!(entries_by_category(&list, "Generate").len(), 2);
        assert!(find(&list, "missing").is_none());
    }
}
