//! Interactive placement: pointer and touch input to clamped positions.
//!
//! [`DragSession`] is a two-state machine whose transitions are pure
//! functions. [`PlacementController`] feeds it from either input modality
//! through the same `begin` / `move` / `end` primitives and commits the
//! clamped result into a [`TextLayer`].

use crate::layer::TextLayer;
use crate::surface::TextMetrics;
use crate::types::Point;

/* ---------- Bounds ---------- */

/// The closed rectangle the text anchor may occupy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// `x ∈ [0, w − text_w]`, `y ∈ [size/2, h − size/2]`.
    pub fn for_text(surface: (u32, u32), text_width: f32, font_size_px: f32) -> Self {
        let (w, h) = (surface.0 as f32, surface.1 as f32);
        let half = font_size_px / 2.0;
        Self {
            min: Point::new(0.0, half),
            max: Point::new(w - text_width, h - half),
        }
    }

    /// Re-measure `layer` against `metrics` with its current parameters.
    pub fn measure<M: TextMetrics + ?Sized>(metrics: &M, layer: &TextLayer) -> Self {
        let width = metrics.measure_text(&layer.font_descriptor(), &layer.content);
        Self::for_text(metrics.dimensions(), width, layer.font_size_px)
    }

    /// When the range is empty (text wider than the surface) the lower
    /// bound wins.
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(
            p.x.min(self.max.x).max(self.min.x),
            p.y.min(self.max.y).max(self.min.y),
        )
    }
}

/* ---------- Drag session ---------- */

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragSession {
    #[default]
    Idle,
    Dragging { last_pointer: Point },
}

impl DragSession {
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragSession::Dragging { .. })
    }

    /// Idle → Dragging. A second begin restarts from the new pointer.
    pub fn begin(self, pointer: Point) -> Self {
        DragSession::Dragging { last_pointer: pointer }
    }

    /// Dragging → Dragging, proposing `position + delta` clamped to `bounds`.
    ///
    /// `last_pointer` tracks the raw pointer, not the clamped commit, so a
    /// drag past an edge stays pinned there. Idle ignores moves.
    pub fn drag(self, pointer: Point, position: Point, bounds: &Bounds) -> (Self, Option<Point>) {
        match self {
            DragSession::Idle => (self, None),
            DragSession::Dragging { last_pointer } => {
                let proposed = Point::new(
                    position.x + (pointer.x - last_pointer.x),
                    position.y + (pointer.y - last_pointer.y),
                );
                (DragSession::Dragging { last_pointer: pointer }, Some(bounds.clamp(proposed)))
            }
        }
    }

    /// Any state → Idle.
    pub fn end(self) -> Self {
        DragSession::Idle
    }
}

/* ---------- Input ---------- */

/// Raw input in client coordinates, before viewport mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    MouseDown(Point),
    MouseMove(Point),
    MouseUp,
    MouseLeave,
    TouchStart(Point),
    TouchMove(Point),
    TouchEnd,
    TouchCancel,
}

impl PointerEvent {
    fn is_touch(&self) -> bool {
        matches!(
            self,
            PointerEvent::TouchStart(_)
                | PointerEvent::TouchMove(_)
                | PointerEvent::TouchEnd
                | PointerEvent::TouchCancel
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventResponse {
    /// The layer position was committed; the composite needs a redraw.
    pub position_changed: bool,
    /// The host should suppress its default scroll/gesture handling.
    pub prevent_default: bool,
}

/// Where the surface is displayed inside the client area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Client coordinates of the surface's top-left corner.
    pub origin: Point,
    /// Displayed (width, height) of the surface in client units.
    pub display_size: (f32, f32),
}

impl Default for Viewport {
    fn default() -> Self {
        Self { origin: Point::default(), display_size: (0.0, 0.0) }
    }
}

impl Viewport {
    /// The largest aspect-preserving fit of `surface` centred in `client`.
    pub fn fit(client: (f32, f32), surface: (u32, u32)) -> Self {
        let (sw, sh) = (surface.0 as f32, surface.1 as f32);
        if sw <= 0.0 || sh <= 0.0 || client.0 <= 0.0 || client.1 <= 0.0 {
            return Self::default();
        }
        let scale = (client.0 / sw).min(client.1 / sh);
        let (dw, dh) = (sw * scale, sh * scale);
        Self {
            origin: Point::new((client.0 - dw) / 2.0, (client.1 - dh) / 2.0),
            display_size: (dw, dh),
        }
    }

    /// Client point to surface pixels. An unset display size means 1:1.
    pub fn to_surface(&self, client: Point, surface: (u32, u32)) -> Point {
        let rel = Point::new(client.x - self.origin.x, client.y - self.origin.y);
        let (dw, dh) = self.display_size;
        if dw <= 0.0 || dh <= 0.0 {
            return rel;
        }
        Point::new(rel.x * surface.0 as f32 / dw, rel.y * surface.1 as f32 / dh)
    }

    /// True if `client` lands on the displayed surface rather than the
    /// letterbox bars around it. Edges count as inside.
    pub fn contains(&self, client: Point, surface: (u32, u32)) -> bool {
        let p = self.to_surface(client, surface);
        (0.0..=surface.0 as f32).contains(&p.x) && (0.0..=surface.1 as f32).contains(&p.y)
    }
}

/* ---------- Controller ---------- */

#[derive(Debug, Default)]
pub struct PlacementController {
    session: DragSession,
    viewport: Viewport,
}

impl PlacementController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> DragSession {
        self.session
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_dragging()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Pointer-down / touch-start at a surface-relative point.
    pub fn begin(&mut self, pointer: Point) {
        self.session = self.session.begin(pointer);
    }

    /// Move to a surface-relative point; returns true if `layer.position`
    /// was committed. The text is re-measured on every call.
    pub fn move_to<M: TextMetrics + ?Sized>(
        &mut self,
        pointer: Point,
        layer: &mut TextLayer,
        metrics: &M,
    ) -> bool {
        if !self.session.is_dragging() {
            return false;
        }
        let bounds = Bounds::measure(metrics, layer);
        let (next, commit) = self.session.drag(pointer, layer.position, &bounds);
        self.session = next;
        match commit {
            Some(p) => {
                layer.position = p;
                true
            }
            None => false,
        }
    }

    pub fn end(&mut self) {
        self.session = self.session.end();
    }

    /// Dispatch one raw event. Never fails; nonsense input is a no-op.
    ///
    /// Only a press on the displayed surface starts a drag. A mouse that
    /// wanders off the surface mid-drag counts as leaving it; a touch keeps
    /// tracking until it lifts.
    pub fn handle<M: TextMetrics + ?Sized>(
        &mut self,
        event: PointerEvent,
        layer: &mut TextLayer,
        metrics: &M,
    ) -> EventResponse {
        let dims = metrics.dimensions();
        let viewport = self.viewport;
        let map = |p: Point| viewport.to_surface(p, dims);
        let on_surface = |p: Point| viewport.contains(p, dims);

        let mut position_changed = false;
        match event {
            PointerEvent::MouseDown(p) | PointerEvent::TouchStart(p) => {
                if on_surface(p) {
                    self.begin(map(p));
                }
            }
            PointerEvent::MouseMove(p) if !on_surface(p) => self.end(),
            PointerEvent::MouseMove(p) | PointerEvent::TouchMove(p) => {
                position_changed = self.move_to(map(p), layer, metrics);
            }
            PointerEvent::MouseUp
            | PointerEvent::MouseLeave
            | PointerEvent::TouchEnd
            | PointerEvent::TouchCancel => self.end(),
        }

        EventResponse {
            position_changed,
            prevent_default: event.is_touch() && self.is_dragging(),
        }
    }
}
