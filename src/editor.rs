//! The session record: one text layer, at most one image pair, the drag
//! controller and the surface they share.
//!
//! Every mutation goes through a method here so the clamping invariant
//! and the redraw flag stay in step. Nothing is rendered until
//! [`Editor::refresh`], which redraws at most once per batch of changes.

use crate::compose::{self, RenderOutcome};
use crate::error::Result;
use crate::export;
use crate::font::FontDescriptor;
use crate::layer::TextLayer;
use crate::placement::{Bounds, EventResponse, PlacementController, PointerEvent, Viewport};
use crate::surface::{RasterSurface, Surface, TextMetrics};
use crate::types::{ImagePair, Point};
use std::path::Path;

/// Measures on the surface but reports the installed images' size, which
/// is what the surface will be once the pending render lands.
struct LayerMetrics<'a, S> {
    surface: &'a S,
    dimensions: (u32, u32),
}

impl<S: TextMetrics> TextMetrics for LayerMetrics<'_, S> {
    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn measure_text(&self, font: &FontDescriptor, text: &str) -> f32 {
        self.surface.measure_text(font, text)
    }
}

pub struct Editor<S: Surface> {
    surface: S,
    images: Option<ImagePair>,
    layer: TextLayer,
    controller: PlacementController,
    dirty: bool,
}

impl<S: Surface> Editor<S> {
    pub fn new(surface: S, layer: TextLayer) -> Self {
        Self {
            surface,
            images: None,
            layer,
            controller: PlacementController::new(),
            dirty: true,
        }
    }

    pub fn layer(&self) -> &TextLayer {
        &self.layer
    }

    pub fn images(&self) -> Option<&ImagePair> {
        self.images.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn is_dragging(&self) -> bool {
        self.controller.is_dragging()
    }

    pub fn needs_render(&self) -> bool {
        self.dirty
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.controller.set_viewport(viewport);
    }

    /// Replace the image pair wholesale. Any drag in progress ends.
    pub fn install_images(&mut self, images: ImagePair) {
        tracing::info!("installing {}x{} image pair", images.dimensions().0, images.dimensions().1);
        self.images = Some(images);
        self.controller.end();
        self.reproject();
        self.dirty = true;
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.layer.set_content(content);
        self.changed();
    }

    pub fn push_char(&mut self, ch: char) {
        self.layer.content.push(ch);
        self.changed();
    }

    pub fn pop_char(&mut self) {
        if self.layer.content.pop().is_some() {
            self.changed();
        }
    }

    pub fn set_font_family(&mut self, family: impl Into<String>) {
        self.layer.set_font_family(family);
        self.changed();
    }

    pub fn set_font_size(&mut self, size_px: f32) {
        self.layer.set_font_size(size_px);
        self.changed();
    }

    pub fn set_font_weight(&mut self, weight: u16) {
        self.layer.set_font_weight(weight);
        self.changed();
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.layer.set_color(color);
        self.dirty = true;
    }

    /// Clamped into the valid rectangle once images are installed; stored
    /// as given before that.
    pub fn set_position(&mut self, position: Point) {
        self.layer.position = position;
        self.reproject();
        self.dirty = true;
    }

    /// Feed one pointer/touch event to the controller. Without images
    /// there is nothing to drag and the event is ignored.
    pub fn handle_input(&mut self, event: PointerEvent) -> EventResponse {
        let Some(images) = &self.images else {
            return EventResponse::default();
        };
        let metrics = LayerMetrics { surface: &self.surface, dimensions: images.dimensions() };
        let response = self.controller.handle(event, &mut self.layer, &metrics);
        if response.position_changed {
            self.dirty = true;
        }
        response
    }

    /// Render unconditionally.
    pub fn render(&mut self) -> Result<RenderOutcome> {
        self.dirty = false;
        compose::render(&mut self.surface, self.images.as_ref(), &self.layer)
    }

    /// Render if anything changed since the last render. A failed render
    /// is not retried until the next change.
    pub fn refresh(&mut self) -> Result<Option<RenderOutcome>> {
        if !self.dirty {
            return Ok(None);
        }
        self.render().map(Some)
    }

    fn changed(&mut self) {
        self.reproject();
        self.dirty = true;
    }

    fn reproject(&mut self) {
        let Some(images) = &self.images else {
            return;
        };
        let metrics = LayerMetrics { surface: &self.surface, dimensions: images.dimensions() };
        let bounds = Bounds::measure(&metrics, &self.layer);
        self.layer.position = bounds.clamp(self.layer.position);
    }
}

impl Editor<RasterSurface> {
    /// Bring the surface up to date, then write it out as PNG.
    pub fn save_png(&mut self, path: &Path) -> Result<()> {
        self.refresh()?;
        export::save_png(&self.surface, path)
    }
}
