// One-shot PNG serialization of the composited surface.

use crate::error::{Error, Result};
use crate::surface::RasterSurface;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;

pub const DEFAULT_EXPORT_FILE: &str = "text-behind-image.png";

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| Error::Export(e.to_string()))?;
    Ok(out.into_inner())
}

/// PNG bytes of the last completed render.
pub fn export_png(surface: &RasterSurface) -> Result<Vec<u8>> {
    if !surface.has_frame() {
        return Err(Error::SurfaceUnavailable("nothing has been rendered yet".into()));
    }
    encode_png(surface.image())
}

pub fn save_png(surface: &RasterSurface, path: &Path) -> Result<()> {
    let bytes = export_png(surface)?;
    std::fs::write(path, bytes)?;
    let (width, height) = surface.image().dimensions();
    tracing::info!("exported {width}x{height} composite to {}", path.display());
    Ok(())
}
