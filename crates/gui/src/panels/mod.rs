pub mod console;
pub mod layers;
pub mod plugin_list;
pub mod plugin_panel;
