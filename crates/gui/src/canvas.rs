//! Image canvas: shows the active layer in grayscale with zoom and pan.
//!
//! Arrays with more than two axes are shown through their central plane.

use egui::{Color32, ColorImage, Pos2, Rect, Sense, TextureHandle, TextureOptions, Vec2};
use ndarray::{ArrayView2, Axis, Ix2};
use sdpanel_core::state::ImageArray;
use sdpanel_core::viewer::{Layer, LayerId};

/// Zoom/pan state plus the cached texture of the shown layer.
pub struct CanvasState {
    pub zoom: f32,
    pub offset: Vec2,
    texture: Option<(LayerId, TextureHandle)>,
    cursor_value: Option<(usize, usize, f32)>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset: Vec2::ZERO,
            texture: None,
            cursor_value: None,
        }
    }
}

impl CanvasState {
    pub fn reset_view(&mut self) {
        self.zoom = 1.0;
        self.offset = Vec2::ZERO;
    }
}

/// Central 2D plane of an array of rank two or more.
fn display_plane(data: &ImageArray) -> Option<ArrayView2<'_, f32>> {
    if data.ndim() < 2 {
        return None;
    }
    let mut view = data.view();
    while view.ndim() > 2 {
        let mid = view.len_of(Axis(0)) / 2;
        view = view.index_axis_move(Axis(0), mid);
    }
    view.into_dimensionality::<Ix2>().ok()
}

/// Linear min/max stretch of finite values to 8-bit gray.
fn to_gray(plane: &ArrayView2<'_, f32>) -> ColorImage {
    let (rows, cols) = plane.dim();
    let (lo, hi) = plane
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = if hi > lo { hi - lo } else { 1.0 };

    let pixels: Vec<u8> = plane
        .iter()
        .map(|&v| {
            if v.is_finite() {
                (((v - lo) / range).clamp(0.0, 1.0) * 255.0).round() as u8
            } else {
                0
            }
        })
        .collect();
    ColorImage::from_gray([cols, rows], &pixels)
}

/// Render the canvas for `layer`.
pub fn show_canvas(ui: &mut egui::Ui, layer: Option<&Layer>, state: &mut CanvasState) {
    let Some(layer) = layer else {
        state.texture = None;
        ui.centered_and_justified(|ui| {
            ui.label("No layers. Use File > Load Sample or open a plugin.");
        });
        return;
    };

    let Some(plane) = display_plane(&layer.data) else {
        ui.centered_and_justified(|ui| {
            ui.label(format!("{}: one-dimensional data cannot be displayed", layer.name));
        });
        return;
    };
    let (rows, cols) = plane.dim();
    if rows == 0 || cols == 0 {
        ui.label("Empty image");
        return;
    }

    let stale = state.texture.as_ref().is_none_or(|(id, _)| *id != layer.id);
    if stale {
        let image = to_gray(&plane);
        let handle = ui
            .ctx()
            .load_texture(format!("layer-{}", layer.id.0), image, TextureOptions::NEAREST);
        state.texture = Some((layer.id, handle));
    }
    let Some((_, tex)) = state.texture.as_ref() else {
        return;
    };

    let available = ui.available_size();
    let fit_h = (available.y - 22.0).max(1.0);
    let base_scale = (available.x / cols as f32).min(fit_h / rows as f32);
    let scale = base_scale * state.zoom;
    let img_size = Vec2::new(cols as f32 * scale, rows as f32 * scale);

    let (response, painter) = ui.allocate_painter(Vec2::new(available.x, fit_h), Sense::click_and_drag());
    let center = response.rect.center();
    let img_origin = Pos2::new(
        center.x - img_size.x / 2.0 + state.offset.x,
        center.y - img_size.y / 2.0 + state.offset.y,
    );
    let img_rect = Rect::from_min_size(img_origin, img_size);

    painter.rect_filled(response.rect, 0.0, Color32::from_gray(30));
    painter.image(
        tex.id(),
        img_rect,
        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
        Color32::WHITE,
    );

    let scroll = ui.input(|i| i.raw_scroll_delta.y);
    if scroll != 0.0 && response.hovered() {
        let factor = if scroll > 0.0 { 1.1 } else { 1.0 / 1.1 };
        let new_zoom = (state.zoom * factor).clamp(0.1, 50.0);
        state.offset *= new_zoom / state.zoom;
        state.zoom = new_zoom;
    }
    if response.dragged() {
        state.offset += response.drag_delta();
    }

    state.cursor_value = response.hover_pos().and_then(|pos| {
        let rel = pos - img_origin;
        let (x, y) = (rel.x / scale, rel.y / scale);
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let (col, row) = (x as usize, y as usize);
        plane.get((row, col)).map(|&v| (row, col, v))
    });

    let status = match state.cursor_value {
        Some((row, col, v)) => format!(
            "{}  |  row {row}  col {col}  |  value {v:.4}  |  zoom {:.0}%",
            layer.name,
            state.zoom * 100.0
        ),
        None => format!(
            "{}  |  shape {:?}  |  scale {:?}  |  zoom {:.0}%",
            layer.name,
            layer.data.shape(),
            layer.scale,
            state.zoom * 100.0
        ),
    };
    ui.label(egui::RichText::new(status).monospace().size(11.0));
}
