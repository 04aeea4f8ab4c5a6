// Core value types shared by the engine, the controller and the window.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// A point in surface pixel coordinates (or client coordinates before
/// a `Viewport` maps it).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Screen buffer in minifb's layout: each entry is 0x00RRGGBB.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    pub fn fill(&mut self, color: u32) {
        for p in &mut self.pixels {
            *p = color;
        }
    }

    /// Flatten an RGBA composite onto `backdrop`, resizing this buffer to match.
    /// Transparent regions of the composite show the backdrop colour.
    pub fn present_rgba(&mut self, image: &RgbaImage, backdrop: u32) {
        self.width = image.width() as usize;
        self.height = image.height() as usize;
        self.pixels.resize(self.width * self.height, 0);

        let br = (backdrop >> 16) & 0xFF;
        let bg = (backdrop >> 8) & 0xFF;
        let bb = backdrop & 0xFF;

        for (dst, px) in self.pixels.iter_mut().zip(image.pixels()) {
            let [r, g, b, a] = px.0;
            let a = a as u32;
            let inv = 255 - a;
            let r = (r as u32 * a + br * inv + 127) / 255;
            let g = (g as u32 * a + bg * inv + 127) / 255;
            let b = (b as u32 * a + bb * inv + 127) / 255;
            *dst = (r << 16) | (g << 8) | b;
        }
    }
}

/// The two decoded layers of one upload. Replaced wholesale, never mutated.
#[derive(Clone, Debug)]
pub struct ImagePair {
    background: RgbaImage,
    foreground_cutout: RgbaImage,
}

impl ImagePair {
    /// A cutout whose size differs from the background is accepted; the
    /// engine draws it scaled to the surface.
    pub fn new(background: RgbaImage, foreground_cutout: RgbaImage) -> Self {
        if background.dimensions() != foreground_cutout.dimensions() {
            tracing::debug!(
                "cutout is {:?} but background is {:?}; cutout will be scaled",
                foreground_cutout.dimensions(),
                background.dimensions()
            );
        }
        Self { background, foreground_cutout }
    }

    pub fn background(&self) -> &RgbaImage {
        &self.background
    }

    pub fn foreground_cutout(&self) -> &RgbaImage {
        &self.foreground_cutout
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.background.dimensions()
    }
}
