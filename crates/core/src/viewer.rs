//! Host viewer: the layer registry plugins read inputs from and write results to.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crossbeam_channel::{Receiver, Sender};
use tracing::debug;

use crate::error::{Error, Result};
use crate::state::ImageArray;

/// Read access to image layers by name.
pub trait LayerSource: Send + Sync {
    fn image(&self, name: &str) -> Option<Arc<ImageArray>>;

    /// Image layer names in display order.
    fn image_names(&self) -> Vec<String>;
}

/// What a plugin panel needs from the host application.
pub trait HostViewer: LayerSource {
    /// Add an image layer, returning the name it was stored under.
    fn add_image(&self, data: ImageArray, scale: Vec<f64>, name: &str) -> String;

    /// Add a layer produced by a run of `plugin`.
    fn add_output(&self, data: ImageArray, scale: Vec<f64>, name: &str, plugin: &str) -> String {
        let _ = plugin;
        self.add_image(data, scale, name)
    }

    /// Per-axis scale of a layer.
    fn scale(&self, name: &str) -> Option<Vec<f64>>;

    /// Receive an event whenever the layer set changes.
    fn subscribe(&self) -> Receiver<LayerEvent>;
}

/// Unique identifier for a layer in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// An image layer.
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub data: Arc<ImageArray>,
    /// Per-axis scale, one entry per array dimension.
    pub scale: Vec<f64>,
    pub visible: bool,
    /// Which plugin produced this (None if loaded or added by hand).
    pub provenance: Option<String>,
}

/// Change to the layer set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerEvent {
    Added(String),
    Removed(String),
    Renamed { from: String, to: String },
}

#[derive(Default)]
struct Registry {
    layers: HashMap<LayerId, Layer>,
    /// Display order (bottom to top).
    layer_order: Vec<LayerId>,
    active: Option<LayerId>,
    next_id: u64,
}

impl Registry {
    fn find(&self, name: &str) -> Option<LayerId> {
        self.layer_order
            .iter()
            .copied()
            .find(|id| self.layers.get(id).is_some_and(|l| l.name == name))
    }

    fn unique_name(&self, base: &str) -> String {
        if self.find(base).is_none() {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base} [{n}]"))
            .find(|candidate| self.find(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }
}

/// In-memory viewer. Cloning yields another handle to the same layers.
#[derive(Clone, Default)]
pub struct Viewer {
    registry: Arc<RwLock<Registry>>,
    subscribers: Arc<Mutex<Vec<Sender<LayerEvent>>>>,
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: LayerEvent) {
        debug!(?event, "layer set changed");
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Add a layer. A taken name gets a ` [n]` suffix. The new layer
    /// becomes the active one.
    pub fn add_layer(
        &self,
        data: ImageArray,
        scale: Vec<f64>,
        name: &str,
        provenance: Option<String>,
    ) -> String {
        let scale = if scale.len() == data.ndim() {
            scale
        } else {
            vec![1.0; data.ndim()]
        };

        let stored = {
            let mut reg = self.write();
            let id = LayerId(reg.next_id);
            reg.next_id += 1;
            let name = reg.unique_name(name);
            reg.layers.insert(
                id,
                Layer {
                    id,
                    name: name.clone(),
                    data: Arc::new(data),
                    scale,
                    visible: true,
                    provenance,
                },
            );
            reg.layer_order.push(id);
            reg.active = Some(id);
            name
        };

        self.emit(LayerEvent::Added(stored.clone()));
        stored
    }

    /// Get a layer by name.
    pub fn get(&self, name: &str) -> Option<Layer> {
        let reg = self.read();
        reg.find(name).and_then(|id| reg.layers.get(&id).cloned())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().find(name).is_some()
    }

    /// Remove a layer by name.
    pub fn remove(&self, name: &str) -> Result<Layer> {
        let layer = {
            let mut reg = self.write();
            let id = reg
                .find(name)
                .ok_or_else(|| Error::LayerNotFound(name.to_string()))?;
            reg.layer_order.retain(|&i| i != id);
            if reg.active == Some(id) {
                reg.active = reg.layer_order.last().copied();
            }
            reg.layers
                .remove(&id)
                .ok_or_else(|| Error::LayerNotFound(name.to_string()))?
        };
        self.emit(LayerEvent::Removed(layer.name.clone()));
        Ok(layer)
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        {
            let mut reg = self.write();
            if reg.find(to).is_some() {
                return Err(Error::LayerExists(to.to_string()));
            }
            let id = reg
                .find(from)
                .ok_or_else(|| Error::LayerNotFound(from.to_string()))?;
            if let Some(layer) = reg.layers.get_mut(&id) {
                layer.name = to.to_string();
            }
        }
        self.emit(LayerEvent::Renamed {
            from: from.to_string(),
            to: to.to_string(),
        });
        Ok(())
    }

    pub fn set_visible(&self, name: &str, visible: bool) -> Result<()> {
        let mut reg = self.write();
        let id = reg
            .find(name)
            .ok_or_else(|| Error::LayerNotFound(name.to_string()))?;
        if let Some(layer) = reg.layers.get_mut(&id) {
            layer.visible = visible;
        }
        Ok(())
    }

    pub fn set_active(&self, name: &str) -> Result<()> {
        let mut reg = self.write();
        let id = reg
            .find(name)
            .ok_or_else(|| Error::LayerNotFound(name.to_string()))?;
        reg.active = Some(id);
        Ok(())
    }

    /// Name of the active layer.
    pub fn active(&self) -> Option<String> {
        let reg = self.read();
        reg.active
            .and_then(|id| reg.layers.get(&id))
            .map(|l| l.name.clone())
    }

    /// Snapshot of all layers in display order.
    pub fn layers_ordered(&self) -> Vec<Layer> {
        let reg = self.read();
        reg.layer_order
            .iter()
            .filter_map(|id| reg.layers.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().layers.is_empty()
    }
}

impl LayerSource for Viewer {
    fn image(&self, name: &str) -> Option<Arc<ImageArray>> {
        self.get(name).map(|l| l.data)
    }

    fn image_names(&self) -> Vec<String> {
        let reg = self.read();
        reg.layer_order
            .iter()
            .filter_map(|id| reg.layers.get(id).map(|l| l.name.clone()))
            .collect()
    }
}

impl HostViewer for Viewer {
    fn add_image(&self, data: ImageArray, scale: Vec<f64>, name: &str) -> String {
        self.add_layer(data, scale, name, None)
    }

    fn add_output(&self, data: ImageArray, scale: Vec<f64>, name: &str, plugin: &str) -> String {
        self.add_layer(data, scale, name, Some(plugin.to_string()))
    }

    fn scale(&self, name: &str) -> Option<Vec<f64>> {
        self.get(name).map(|l| l.scale)
    }

    fn subscribe(&self) -> Receiver<LayerEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }
}
