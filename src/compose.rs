// Composition engine: background, then text, then cutout, every time.
// Stateless; callers re-invoke it whenever a layer parameter changes.

use crate::error::Result;
use crate::layer::TextLayer;
use crate::surface::{Surface, TextAlign, TextBaseline, TextStyle};
use crate::types::ImagePair;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// No images yet; the surface was not touched.
    Idle,
    Rendered { width: u32, height: u32 },
}

/// Redraw the whole composite onto `surface`.
///
/// With `images == None` nothing is drawn. The only fallible step is
/// sizing the surface, which happens before any pixel is written, so a
/// `SurfaceUnavailable` error never leaves a partial frame behind.
pub fn render<S: Surface + ?Sized>(
    surface: &mut S,
    images: Option<&ImagePair>,
    layer: &TextLayer,
) -> Result<RenderOutcome> {
    let Some(images) = images else {
        return Ok(RenderOutcome::Idle);
    };
    let (width, height) = images.dimensions();

    surface.resize(width, height)?;
    surface.clear();
    surface.draw_image(images.background());

    surface.set_text_style(TextStyle {
        font: layer.font_descriptor(),
        color: layer.fill_color(),
        align: TextAlign::Left,
        baseline: TextBaseline::Middle,
    });
    surface.fill_text(&layer.content, layer.position);

    // Source-over: the text stays visible wherever the cutout is transparent.
    surface.draw_image(images.foreground_cutout());

    Ok(RenderOutcome::Rendered { width, height })
}
