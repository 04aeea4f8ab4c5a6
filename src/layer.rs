// The text layer: the only persistent entity of a session.

use crate::font::FontDescriptor;
use crate::types::Point;
use image::Rgba;
use serde::{Deserialize, Serialize};

pub const MIN_FONT_SIZE_PX: f32 = 12.0;
pub const MAX_FONT_SIZE_PX: f32 = 200.0;
pub const MIN_FONT_WEIGHT: u16 = 100;
pub const MAX_FONT_WEIGHT: u16 = 900;

/// Text drawn between the background and the cutout.
///
/// Fields are read freely; writes go through the setters so the size and
/// weight ranges always hold. Position is committed by the placement
/// controller, which owns its clamping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLayer {
    pub content: String,
    pub font_family: String,
    pub font_weight: u16,
    pub font_size_px: f32,
    /// CSS colour string, usually `#rrggbb`.
    pub color: String,
    /// Left edge / vertical middle of the text box, in surface pixels.
    pub position: Point,
}

impl Default for TextLayer {
    fn default() -> Self {
        Self {
            content: "Your Text Here".into(),
            font_family: "Arial".into(),
            font_weight: 400,
            font_size_px: 24.0,
            color: "#000000".into(),
            position: Point::new(100.0, 100.0),
        }
    }
}

impl TextLayer {
    /// `"{weight} {size}px {family}"`, the descriptor both rendering and
    /// measurement use.
    pub fn font_descriptor(&self) -> FontDescriptor {
        FontDescriptor::new(self.font_weight, self.font_size_px, self.font_family.clone())
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_font_family(&mut self, family: impl Into<String>) {
        self.font_family = family.into();
    }

    /// Snaps to the nearest hundred in [100, 900].
    pub fn set_font_weight(&mut self, weight: u16) {
        let snapped = (weight.saturating_add(50) / 100) * 100;
        self.font_weight = snapped.clamp(MIN_FONT_WEIGHT, MAX_FONT_WEIGHT);
    }

    /// Clamps to [12, 200]; non-finite sizes are ignored.
    pub fn set_font_size(&mut self, size_px: f32) {
        if size_px.is_finite() {
            self.font_size_px = size_px.clamp(MIN_FONT_SIZE_PX, MAX_FONT_SIZE_PX);
        }
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    /// Re-apply the setter ranges, e.g. after deserializing.
    pub fn normalized(mut self) -> Self {
        let (w, s) = (self.font_weight, self.font_size_px);
        self.font_weight = MIN_FONT_WEIGHT;
        self.font_size_px = MIN_FONT_SIZE_PX;
        self.set_font_weight(w);
        self.set_font_size(s);
        self
    }

    /// Colour as RGBA; anything unparsable becomes opaque black.
    pub fn fill_color(&self) -> Rgba<u8> {
        parse_color(&self.color).unwrap_or_else(|| {
            tracing::warn!("invalid text colour '{}', using black", self.color);
            Rgba([0, 0, 0, 255])
        })
    }
}

/// Parse any CSS colour (`#rgb`, `#rrggbb`, `rgb()`, names...).
pub fn parse_color(s: &str) -> Option<Rgba<u8>> {
    csscolorparser::parse(s.trim()).ok().map(|c| Rgba(c.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_editor_start_state() {
        let layer = TextLayer::default();
        assert_eq!(layer.content, "Your Text Here");
        assert_eq!(layer.font_descriptor().to_string(), "400 24px Arial");
        assert_eq!(layer.position, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_weight_snaps_and_clamps() {
        let mut layer = TextLayer::default();
        layer.set_font_weight(649);
        assert_eq!(layer.font_weight, 600);
        layer.set_font_weight(650);
        assert_eq!(layer.font_weight, 700);
        layer.set_font_weight(0);
        assert_eq!(layer.font_weight, 100);
        layer.set_font_weight(u16::MAX);
        assert_eq!(layer.font_weight, 900);
    }

    #[test]
    fn test_size_clamps_and_ignores_nan() {
        let mut layer = TextLayer::default();
        layer.set_font_size(4.0);
        assert_eq!(layer.font_size_px, 12.0);
        layer.set_font_size(500.0);
        assert_eq!(layer.font_size_px, 200.0);
        layer.set_font_size(f32::NAN);
        assert_eq!(layer.font_size_px, 200.0);
    }

    #[test]
    fn test_normalized_fixes_out_of_range_fields() {
        let layer = TextLayer { font_weight: 1234, font_size_px: 1.0, ..TextLayer::default() };
        let layer = layer.normalized();
        assert_eq!(layer.font_weight, 900);
        assert_eq!(layer.font_size_px, 12.0);
    }

    #[test]
    fn test_parse_color_forms() {
        assert_eq!(parse_color("#ff0000"), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(parse_color("#0f0"), Some(Rgba([0, 255, 0, 255])));
        assert_eq!(parse_color("white"), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(parse_color("not-a-colour"), None);
    }

    #[test]
    fn test_bad_colour_falls_back_to_black() {
        let mut layer = TextLayer::default();
        layer.set_color("???");
        assert_eq!(layer.fill_color(), Rgba([0, 0, 0, 255]));
    }
}
