// Turns polled mouse state (position + button, once per frame) into the
// discrete events the placement controller expects.

use crate::placement::PointerEvent;
use crate::types::Point;

#[derive(Debug, Default)]
pub struct MouseTracker {
    was_down: bool,
    last: Option<Point>,
}

impl MouseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `pos` is `None` while the cursor is outside the window.
    pub fn update(&mut self, pos: Option<Point>, down: bool) -> Option<PointerEvent> {
        let event = match pos {
            None => self.last.map(|_| PointerEvent::MouseLeave),
            Some(p) if down && !self.was_down => Some(PointerEvent::MouseDown(p)),
            Some(_) if !down && self.was_down => Some(PointerEvent::MouseUp),
            Some(p) if down && self.last != Some(p) => Some(PointerEvent::MouseMove(p)),
            Some(_) => None,
        };
        self.was_down = down;
        self.last = pos;
        event
    }
}
