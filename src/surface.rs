// Drawing surface primitives and the software raster implementation.
// The engine only ever talks to `Surface`; the controller only ever talks
// to `TextMetrics`, so it can measure but never draw.

use crate::error::{Error, Result};
use crate::font::{em_scale, Face, FontBook, FontDescriptor};
use crate::types::Point;
use ab_glyph::{point, Font, GlyphId, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};

/// Canvases refuse sizes past this; so do we.
pub const DEFAULT_MAX_SURFACE_DIMENSION: u32 = 16_384;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextBaseline {
    Top,
    #[default]
    Middle,
    Alphabetic,
}

/// Everything `fill_text` needs besides the string and anchor.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub font: FontDescriptor,
    pub color: Rgba<u8>,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: FontDescriptor::new(400, 10.0, "sans-serif"),
            color: Rgba([0, 0, 0, 255]),
            align: TextAlign::Left,
            baseline: TextBaseline::Middle,
        }
    }
}

/// Read-only queries the placement controller may issue.
pub trait TextMetrics {
    /// Current (width, height) in pixels.
    fn dimensions(&self) -> (u32, u32);
    /// Advance width of `text` rendered with `font`.
    fn measure_text(&self, font: &FontDescriptor, text: &str) -> f32;
}

pub trait Surface: TextMetrics {
    /// Fails with `SurfaceUnavailable` and leaves the surface as it was.
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;
    /// Every pixel to transparent.
    fn clear(&mut self);
    /// Draw at (0,0) filling the surface, source-over. Scales if sizes differ.
    fn draw_image(&mut self, image: &RgbaImage);
    fn set_text_style(&mut self, style: TextStyle);
    /// Fill `text` at `at` with the current style. Empty text draws nothing.
    fn fill_text(&mut self, text: &str, at: Point);
}

/// Software surface over an `RgbaImage`.
pub struct RasterSurface {
    pixels: RgbaImage,
    fonts: FontBook,
    style: TextStyle,
    max_dimension: u32,
}

impl RasterSurface {
    pub fn new(fonts: FontBook) -> Self {
        Self {
            pixels: RgbaImage::new(0, 0),
            fonts,
            style: TextStyle::default(),
            max_dimension: DEFAULT_MAX_SURFACE_DIMENSION,
        }
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// The composited pixels as of the last completed render.
    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn has_frame(&self) -> bool {
        self.pixels.width() > 0 && self.pixels.height() > 0
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    fn fill_outline(&mut self, font: &ab_glyph::FontArc, text: &str, left: f32, anchor_y: f32) {
        let size = self.style.font.size_px;
        let color = self.style.color;
        let scaled = font.as_scaled(em_scale(font, size));
        let baseline = match self.style.baseline {
            TextBaseline::Top => anchor_y + scaled.ascent(),
            // descent is negative
            TextBaseline::Middle => anchor_y + (scaled.ascent() + scaled.descent()) / 2.0,
            TextBaseline::Alphabetic => anchor_y,
        };

        let mut caret = point(left, baseline);
        let mut prev: Option<GlyphId> = None;
        for ch in text.chars() {
            let mut glyph = scaled.scaled_glyph(ch);
            if let Some(p) = prev {
                caret.x += scaled.kern(p, glyph.id);
            }
            glyph.position = caret;
            caret.x += scaled.h_advance(glyph.id);
            prev = Some(glyph.id);

            if let Some(outlined) = scaled.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                let img = &mut self.pixels;
                outlined.draw(|x, y, coverage| {
                    let px = x as i64 + bounds.min.x as i64;
                    let py = y as i64 + bounds.min.y as i64;
                    blend_pixel(img, px, py, color, coverage);
                });
            }
        }
    }

    fn fill_bitmap(&mut self, text: &str, left: f32, anchor_y: f32) {
        let size = self.style.font.size_px;
        let cell = size / 8.0;
        let bold = self.style.font.weight >= 600;
        let top = match self.style.baseline {
            TextBaseline::Top => anchor_y,
            TextBaseline::Middle => anchor_y - size / 2.0,
            TextBaseline::Alphabetic => anchor_y - cell * 7.0,
        };

        for (i, ch) in text.chars().enumerate() {
            let Some(rows) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
                continue;
            };
            let gx = left + i as f32 * size;
            draw_bitmap_glyph(&mut self.pixels, &rows, gx, top, cell, bold, self.style.color);
        }
    }
}

impl TextMetrics for RasterSurface {
    fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn measure_text(&self, font: &FontDescriptor, text: &str) -> f32 {
        self.fonts.resolve(font).measure(font.size_px, text)
    }
}

impl Surface for RasterSurface {
    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::SurfaceUnavailable(format!(
                "cannot size surface to {width}x{height}"
            )));
        }
        if width > self.max_dimension || height > self.max_dimension {
            return Err(Error::SurfaceUnavailable(format!(
                "{width}x{height} exceeds the {} px surface limit",
                self.max_dimension
            )));
        }
        if self.pixels.dimensions() != (width, height) {
            tracing::debug!("surface resized to {width}x{height}");
            self.pixels = RgbaImage::new(width, height);
        }
        Ok(())
    }

    fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    fn draw_image(&mut self, image: &RgbaImage) {
        let (w, h) = self.pixels.dimensions();
        if w == 0 || h == 0 {
            return;
        }
        if image.dimensions() == (w, h) {
            imageops::overlay(&mut self.pixels, image, 0, 0);
        } else {
            let scaled = imageops::resize(image, w, h, FilterType::Triangle);
            imageops::overlay(&mut self.pixels, &scaled, 0, 0);
        }
    }

    fn set_text_style(&mut self, style: TextStyle) {
        self.style = style;
    }

    fn fill_text(&mut self, text: &str, at: Point) {
        if text.is_empty() {
            return;
        }
        let face = self.fonts.resolve(&self.style.font);
        let width = face.measure(self.style.font.size_px, text);
        let left = match self.style.align {
            TextAlign::Left => at.x,
            TextAlign::Center => at.x - width / 2.0,
            TextAlign::Right => at.x - width,
        };
        match face {
            Face::Outline(font) => self.fill_outline(&font, text, left, at.y),
            Face::Bitmap => self.fill_bitmap(text, left, at.y),
        }
    }
}

/// Source-over one pixel if (x,y) is inside bounds.
#[inline]
fn blend_pixel(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x >= img.width() || y >= img.height() {
        return;
    }
    let [r, g, b, a] = color.0;
    let a = (a as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
    if a == 0 {
        return;
    }
    img.get_pixel_mut(x, y).blend(&Rgba([r, g, b, a]));
}

/// Nearest-neighbour scale of one 8x8 glyph to `cell` pixels per bit.
/// Bit 0 of each row is the leftmost column.
fn draw_bitmap_glyph(
    img: &mut RgbaImage,
    rows: &[u8; 8],
    gx: f32,
    top: f32,
    cell: f32,
    bold: bool,
    color: Rgba<u8>,
) {
    if cell <= 0.0 {
        return;
    }
    let x0 = gx.floor() as i64;
    let x1 = (gx + cell * 8.0).ceil() as i64;
    let y0 = top.floor() as i64;
    let y1 = (top + cell * 8.0).ceil() as i64;

    for py in y0..y1 {
        let row = ((py as f32 + 0.5 - top) / cell).floor();
        if !(0.0..8.0).contains(&row) {
            continue;
        }
        let mut bits = rows[row as usize];
        if bold {
            bits |= bits << 1;
        }
        for px in x0..x1 {
            let col = ((px as f32 + 0.5 - gx) / cell).floor();
            if !(0.0..8.0).contains(&col) {
                continue;
            }
            if bits & (1 << col as u8) != 0 {
                blend_pixel(img, px, py, color, 1.0);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A surface double with fixed per-character advances that records
    //! every primitive call.

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Op {
        Resize(u32, u32),
        Clear,
        DrawImage(u32, u32),
        SetTextStyle(String, Rgba<u8>),
        FillText(String, Point),
    }

    pub struct RecordingSurface {
        pub width: u32,
        pub height: u32,
        /// Width of every character, regardless of font.
        pub advance: f32,
        pub ops: Vec<Op>,
        pub fail_resize: bool,
        pub measure_calls: std::cell::Cell<usize>,
    }

    impl RecordingSurface {
        pub fn new(width: u32, height: u32, advance: f32) -> Self {
            Self {
                width,
                height,
                advance,
                ops: Vec::new(),
                fail_resize: false,
                measure_calls: std::cell::Cell::new(0),
            }
        }
    }

    impl TextMetrics for RecordingSurface {
        fn dimensions(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn measure_text(&self, _font: &FontDescriptor, text: &str) -> f32 {
            self.measure_calls.set(self.measure_calls.get() + 1);
            text.chars().count() as f32 * self.advance
        }
    }

    impl Surface for RecordingSurface {
        fn resize(&mut self, width: u32, height: u32) -> Result<()> {
            if self.fail_resize {
                return Err(Error::SurfaceUnavailable("test".into()));
            }
            self.width = width;
            self.height = height;
            self.ops.push(Op::Resize(width, height));
            Ok(())
        }

        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }

        fn draw_image(&mut self, image: &RgbaImage) {
            self.ops.push(Op::DrawImage(image.width(), image.height()));
        }

        fn set_text_style(&mut self, style: TextStyle) {
            self.ops.push(Op::SetTextStyle(style.font.to_string(), style.color));
        }

        fn fill_text(&mut self, text: &str, at: Point) {
            self.ops.push(Op::FillText(text.to_string(), at));
        }
    }
}
