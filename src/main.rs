// What you SEE:
// • Your photo, with the text tucked behind the subject.
// • Hold Left Mouse on the preview and drag: the text follows, clamped to the image.
// • Type to edit the text, Backspace deletes. Tab: next font. Up/Down: size.
//   PgUp/PgDn: weight. F3: next colour. Home: reset position.
// • F2 exports a PNG. F5 retries a failed upload. ESC quits.

use anyhow::{bail, Context, Result};
use clap::Parser;
use minifb::Key;
use std::path::PathBuf;
use std::sync::Arc;
use text_behind::config::Settings;
use text_behind::draw::{draw_hud_bar, draw_hud_text, Drawer};
use text_behind::font::FontDescriptor;
use text_behind::input::MouseTracker;
use text_behind::loader::{CutoutSource, UploadJob, UploadWorker};
use text_behind::placement::Viewport;
use text_behind::segment::Segmenter;
use text_behind::types::FrameBuffer;
use text_behind::{logging, Editor, RasterSurface, TextLayer};

const WINDOW_W: usize = 960;
const WINDOW_H: usize = 640;
const BACKDROP: u32 = 0x00_20_20_24;

#[derive(Parser, Debug)]
#[command(name = "text-behind", version, about = "Place text behind the subject of a photo")]
struct Cli {
    /// Photo to work on
    image: PathBuf,
    /// Precomputed cutout (subject on transparency); remove.bg is used without it
    #[arg(long)]
    cutout: Option<PathBuf>,
    /// Settings file
    #[arg(long, default_value = "settings.json")]
    config: PathBuf,
    /// Export path, overriding the settings file
    #[arg(long)]
    out: Option<PathBuf>,
    /// Initial text
    #[arg(long)]
    text: Option<String>,
    /// Composite font descriptor, e.g. "700 48px Impact"
    #[arg(long)]
    font: Option<String>,
    /// Text colour, e.g. "#ffcc00"
    #[arg(long)]
    color: Option<String>,
    /// Render once, export and exit without opening a window
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    logging::init(settings.debug_logging);
    if let Some(out) = &cli.out {
        settings.export_path = out.clone();
    }

    let layer = initial_layer(&cli, &settings)?;
    let surface = RasterSurface::new(settings.font_book())
        .with_max_dimension(settings.max_surface_dimension);
    let mut editor = Editor::new(surface, layer);

    let job = UploadJob::new(&cli.image, cutout_source(&cli, &settings)?);
    let mut uploads = UploadWorker::new();
    uploads.submit(job.clone())?;

    if cli.headless {
        let upload = uploads.wait().context("upload finished without a result")?;
        editor.install_images(upload.result?);
        editor.save_png(&settings.export_path)?;
        return Ok(());
    }
    run_window(&settings, editor, uploads, job)
}

fn initial_layer(cli: &Cli, settings: &Settings) -> Result<TextLayer> {
    let mut layer = settings.text.clone();
    if let Some(text) = &cli.text {
        layer.set_content(text.clone());
    }
    if let Some(font) = &cli.font {
        let font: FontDescriptor = font.parse()?;
        layer.set_font_family(font.family);
        layer.set_font_weight(font.weight);
        layer.set_font_size(font.size_px);
    }
    if let Some(color) = &cli.color {
        layer.set_color(color.clone());
    }
    Ok(layer)
}

fn cutout_source(cli: &Cli, settings: &Settings) -> Result<CutoutSource> {
    if let Some(path) = &cli.cutout {
        return Ok(CutoutSource::File(path.clone()));
    }
    match remote_segmenter(settings)? {
        Some(segmenter) => Ok(CutoutSource::Segment(segmenter)),
        None => bail!(
            "no --cutout given and no remove.bg API key found (set {} or remove_bg.api_key)",
            settings.remove_bg.api_key_env
        ),
    }
}

#[cfg(feature = "remove-bg")]
fn remote_segmenter(settings: &Settings) -> Result<Option<Arc<dyn Segmenter>>> {
    let segmenter = text_behind::segment::RemoveBg::from_settings(&settings.remove_bg)?;
    Ok(segmenter.map(|s| Arc::new(s) as Arc<dyn Segmenter>))
}

#[cfg(not(feature = "remove-bg"))]
fn remote_segmenter(_settings: &Settings) -> Result<Option<Arc<dyn Segmenter>>> {
    Ok(None)
}

fn run_window(
    settings: &Settings,
    mut editor: Editor<RasterSurface>,
    mut uploads: UploadWorker,
    job: UploadJob,
) -> Result<()> {
    let mut drawer = Drawer::new("Text Behind Image", WINDOW_W, WINDOW_H)?;
    let mut screen = FrameBuffer::new(WINDOW_W, WINDOW_H);
    let mut mouse = MouseTracker::new();
    let mut status = String::from("Processing image...");

    let families = &settings.font_families;
    let palette = &settings.palette;
    let mut family_idx =
        families.iter().position(|f| *f == editor.layer().font_family).unwrap_or(0);
    let mut color_idx = palette.iter().position(|c| *c == editor.layer().color).unwrap_or(0);
    let home = editor.layer().position;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.key_down(Key::Escape) {
        /* 1) Finished uploads replace the image pair; failures leave it alone. */
        if let Some(upload) = uploads.poll() {
            match upload.result {
                Ok(pair) => {
                    editor.install_images(pair);
                    status = "Image processed successfully".into();
                }
                Err(e) => {
                    tracing::error!("failed to process image: {e}");
                    status = if e.is_retryable() {
                        format!("Failed to process image: {e} (F5 to retry)")
                    } else {
                        format!("Failed to process image: {e}")
                    };
                }
            }
        }

        /* 2) Keyboard edits the text layer. */
        for ch in drawer.typed_chars() {
            editor.push_char(ch);
        }
        if drawer.key_repeated(Key::Backspace) {
            editor.pop_char();
        }
        if drawer.key_pressed(Key::Tab) && !families.is_empty() {
            family_idx = (family_idx + 1) % families.len();
            editor.set_font_family(families[family_idx].clone());
        }
        if drawer.key_repeated(Key::Up) {
            editor.set_font_size(editor.layer().font_size_px + 2.0);
        }
        if drawer.key_repeated(Key::Down) {
            editor.set_font_size(editor.layer().font_size_px - 2.0);
        }
        if drawer.key_pressed(Key::PageUp) {
            editor.set_font_weight(editor.layer().font_weight.saturating_add(100));
        }
        if drawer.key_pressed(Key::PageDown) {
            editor.set_font_weight(editor.layer().font_weight.saturating_sub(100));
        }
        if drawer.key_pressed(Key::F3) && !palette.is_empty() {
            color_idx = (color_idx + 1) % palette.len();
            editor.set_color(palette[color_idx].clone());
        }
        if drawer.key_pressed(Key::Home) {
            editor.set_position(home);
        }
        if drawer.key_pressed(Key::F5) {
            uploads.submit(job.clone())?;
            status = "Processing image...".into();
        }
        if drawer.key_pressed(Key::F2) {
            let path = &settings.export_path;
            status = match editor.save_png(path) {
                Ok(()) => format!("Exported {}", path.display()),
                Err(e) => {
                    tracing::error!("failed to export image: {e}");
                    format!("Failed to export image: {e}")
                }
            };
        }

        /* 3) Mouse drags the text; the viewport undoes the window's letterboxing. */
        if let Some(images) = editor.images() {
            let viewport = Viewport::fit(drawer.client_size(), images.dimensions());
            editor.set_viewport(viewport);
        }
        if let Some(event) = mouse.update(drawer.mouse_pos(), drawer.left_mouse_down()) {
            editor.handle_input(event);
        }

        /* 4) Re-composite if anything changed. */
        if let Err(e) = editor.refresh() {
            tracing::warn!("render failed: {e}");
            status = format!("Render failed: {e}");
        }

        /* 5) Present: composite, then HUD on top (screen only, never exported). */
        if editor.surface().has_frame() {
            screen.present_rgba(editor.surface().image(), BACKDROP);
        } else {
            screen = FrameBuffer::new(WINDOW_W, WINDOW_H);
            screen.fill(BACKDROP);
        }
        let scale = (screen.width / WINDOW_W).max(1) as i32;
        let layer = editor.layer();
        let hud = format!(
            "{} | {} | {}  (F2 export, ESC quit)",
            status,
            layer.font_descriptor(),
            layer.color
        );
        draw_hud_bar(&mut screen, 12 * scale as usize);
        draw_hud_text(&mut screen, 2 * scale, 2 * scale, &hud, 0x00_FF_FF_FF, scale);

        drawer.present(&screen)?;
    }

    Ok(())
}
