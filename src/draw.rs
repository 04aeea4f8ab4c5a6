// Window + HUD drawing for the preview.
// The HUD goes onto the presented FrameBuffer only, never onto the
// composite surface, so exports stay clean.

use crate::types::FrameBuffer;
use font8x8::{UnicodeFonts, BASIC_FONTS};

#[cfg(feature = "window")]
pub use window::Drawer;

#[cfg(feature = "window")]
mod window {
    use crate::error::Error;
    use crate::types::{FrameBuffer, Point};
    use minifb::{
        InputCallback, Key, KeyRepeat, MouseButton, MouseMode, ScaleMode, Window, WindowOptions,
    };
    use std::sync::mpsc::{self, Receiver, Sender};

    /// Forwards typed characters out of minifb's callback.
    struct CharSink(Sender<char>);

    impl InputCallback for CharSink {
        fn add_char(&mut self, uni_char: u32) {
            if let Some(ch) = char::from_u32(uni_char).filter(|c| !c.is_control()) {
                let _ = self.0.send(ch);
            }
        }
    }

    pub struct Drawer {
        window: Window,
        typed: Receiver<char>,
    }

    impl Drawer {
        /// Resizable window; the buffer is letterboxed to keep its aspect.
        pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
            let options = WindowOptions {
                resize: true,
                scale_mode: ScaleMode::AspectRatioStretch,
                ..WindowOptions::default()
            };
            let mut window = Window::new(title, width, height, options)
                .map_err(|e| Error::Window(e.to_string()))?;
            window.set_target_fps(60);

            let (tx, typed) = mpsc::channel();
            window.set_input_callback(Box::new(CharSink(tx)));
            Ok(Self { window, typed })
        }

        pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
            self.window
                .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
                .map_err(|e| Error::Window(e.to_string()))
        }

        pub fn is_open(&self) -> bool {
            self.window.is_open()
        }

        pub fn key_down(&self, key: Key) -> bool {
            self.window.is_key_down(key)
        }

        pub fn key_pressed(&self, key: Key) -> bool {
            self.window.is_key_pressed(key, KeyRepeat::No)
        }

        /// Pressed this frame, including auto-repeat while held.
        pub fn key_repeated(&self, key: Key) -> bool {
            self.window.is_key_pressed(key, KeyRepeat::Yes)
        }

        /// Characters typed since the last call.
        pub fn typed_chars(&self) -> Vec<char> {
            self.typed.try_iter().collect()
        }

        pub fn left_mouse_down(&self) -> bool {
            self.window.get_mouse_down(MouseButton::Left)
        }

        /// Cursor in window pixels, `None` while outside the window.
        pub fn mouse_pos(&self) -> Option<Point> {
            self.window
                .get_unscaled_mouse_pos(MouseMode::Discard)
                .map(|(x, y)| Point::new(x, y))
        }

        pub fn client_size(&self) -> (f32, f32) {
            let (w, h) = self.window.get_size();
            (w as f32, h as f32)
        }
    }
}

/* ---------- HUD text: 8x8 bitmap glyphs with a drop shadow ---------- */

#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

fn draw_char_8x8(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32, scale: i32) {
    let Some(rows) = BASIC_FONTS.get(ch) else {
        return;
    };
    // Shadow first, offset by one glyph pixel, then the glyph itself.
    for (off, c) in [(scale, 0x00_00_00_00), (0, color)] {
        for (ry, bits) in rows.iter().enumerate() {
            for rx in 0..8 {
                if bits & (1 << rx) == 0 {
                    continue;
                }
                let px = x + rx * scale + off;
                let py = y + ry as i32 * scale + off;
                for sy in 0..scale {
                    for sx in 0..scale {
                        put_pixel(fb, px + sx, py + sy, c);
                    }
                }
            }
        }
    }
}

/// Draw `text` with its top-left at (x,y); each glyph is `8 * scale` px.
pub fn draw_hud_text(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32, scale: i32) {
    let scale = scale.max(1);
    for ch in text.chars() {
        draw_char_8x8(fb, x, y, ch, color, scale);
        x += 8 * scale;
    }
}

/// Darken a strip across the top so HUD text stays readable on any photo.
pub fn draw_hud_bar(fb: &mut FrameBuffer, height: usize) {
    let rows = height.min(fb.height);
    for px in &mut fb.pixels[..rows * fb.width] {
        let r = ((*px >> 16) & 0xFF) / 3;
        let g = ((*px >> 8) & 0xFF) / 3;
        let b = (*px & 0xFF) / 3;
        *px = (r << 16) | (g << 8) | b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hud_text_is_clipped_to_buffer() {
        let mut fb = FrameBuffer::new(10, 10);
        draw_hud_text(&mut fb, 6, 6, "WW", 0x00_FF_FF_FF, 1);
        draw_hud_text(&mut fb, -50, -50, "W", 0x00_FF_FF_FF, 1);
        assert!(fb.pixels.iter().any(|&p| p == 0x00_FF_FF_FF));
    }

    #[test]
    fn test_hud_text_scales_glyph_pixels() {
        let lit = |scale| {
            let mut fb = FrameBuffer::new(64, 64);
            draw_hud_text(&mut fb, 0, 0, "I", 0x00_FF_FF_FF, scale);
            fb.pixels.iter().filter(|&&p| p == 0x00_FF_FF_FF).count()
        };
        assert!(lit(2) > lit(1) * 2);
    }

    #[test]
    fn test_hud_bar_darkens_top_rows_only() {
        let mut fb = FrameBuffer::new(2, 3);
        fb.fill(0x00_99_99_99);
        draw_hud_bar(&mut fb, 1);
        assert_eq!(fb.pixels[0], 0x00_33_33_33);
        assert_eq!(fb.pixels[2], 0x00_99_99_99);
        draw_hud_bar(&mut fb, 100);
        assert_eq!(fb.pixels[5], 0x00_33_33_33);
    }
}
