//! Dock layout using egui_dock.
//!
//! Layout: Canvas (center, ~70%) | Right panel (Plugins/Layers, ~30%)
//!         ─────────────────────┼─────────────────────────────────
//!         Console (bottom, ~22% of total height)
//!
//! Plugin panels open as extra tabs next to the plugin list.

use egui_dock::{DockState, NodeIndex};

/// Stable key of an open plugin panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelKey(pub u64);

/// Tab identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Canvas,
    Plugins,
    Layers,
    Console,
    Plugin(PanelKey),
}

impl Tab {
    /// Fixed tabs cannot be closed; plugin panels can.
    pub fn is_closeable(&self) -> bool {
        matches!(self, Tab::Plugin(_))
    }
}

/// Create the initial dock layout.
///
/// ```text
/// ┌──────────────────────────┬─────────────────┐
/// │                          │  Plugins         │
/// │        Canvas            │  (+ panels)      │
/// │                          ├─────────────────┤
/// │                          │  Layers          │
/// ├──────────────────────────┴─────────────────┤
/// │               Console                       │
/// └─────────────────────────────────────────────┘
/// ```
pub fn create_dock_state() -> DockState<Tab> {
    let mut dock_state = DockState::new(vec![Tab::Canvas]);

    let [top, _bottom] =
        dock_state
            .main_surface_mut()
            .split_below(NodeIndex::root(), 0.78, vec![Tab::Console]);

    let [_canvas, right] = dock_state
        .main_surface_mut()
        .split_right(top, 0.70, vec![Tab::Plugins]);

    let [_plugins, _layers] = dock_state
        .main_surface_mut()
        .split_below(right, 0.6, vec![Tab::Layers]);

    dock_state
}

/// Add a plugin panel tab beside the plugin list, or focus it if already open.
pub fn open_panel_tab(dock_state: &mut DockState<Tab>, key: PanelKey) {
    let tab = Tab::Plugin(key);
    if let Some(location) = dock_state.find_tab(&tab) {
        dock_state.set_active_tab(location);
        return;
    }
    match dock_state.find_tab(&Tab::Plugins) {
        Some((surface, node, _)) => {
            dock_state.set_focused_node_and_surface((surface, node));
            dock_state.push_to_focused_leaf(tab);
        }
        None => dock_state.push_to_first_leaf(tab),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_has_fixed_tabs() {
        let dock = create_dock_state();
        for tab in [Tab::Canvas, Tab::Plugins, Tab::Layers, Tab::Console] {
            assert!(dock.find_tab(&tab).is_some(), "{tab:?} missing");
        }
    }

    #[test]
    fn test_open_panel_tab_once() {
        let mut dock = create_dock_state();
        open_panel_tab(&mut dock, PanelKey(1));
        open_panel_tab(&mut dock, PanelKey(1));
        let count = dock.iter_all_tabs().filter(|(_, t)| **t == Tab::Plugin(PanelKey(1))).count();
        assert_eq!(count, 1);
        assert!(!Tab::Console.is_closeable());
        assert!(Tab::Plugin(PanelKey(1)).is_closeable());
    }
}
