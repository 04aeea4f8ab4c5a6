use image::{imageops, Rgba, RgbaImage};
use text_behind::font::FontBook;
use text_behind::{render, Editor, ImagePair, Point, RasterSurface, RenderOutcome, TextLayer};

const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn surface() -> RasterSurface {
    // No registered fonts: every family resolves to the bitmap face.
    RasterSurface::new(FontBook::new())
}

/// 200x100 blue photo whose "subject" is the opaque red right half.
fn images() -> ImagePair {
    let background = RgbaImage::from_pixel(200, 100, BLUE);
    let cutout =
        RgbaImage::from_fn(200, 100, |x, _| if x >= 100 { RED } else { Rgba([0, 0, 0, 0]) });
    ImagePair::new(background, cutout)
}

fn layer(content: &str) -> TextLayer {
    TextLayer {
        content: content.into(),
        color: "#ffffff".into(),
        position: Point::new(10.0, 50.0),
        ..TextLayer::default()
    }
}

#[test]
fn test_text_shows_only_where_cutout_is_transparent() {
    let mut s = surface();
    let pair = images();
    // 4 bitmap glyphs at 24px span x 10..106, crossing into the subject.
    let outcome = render(&mut s, Some(&pair), &layer("HHHH")).unwrap();
    assert_eq!(outcome, RenderOutcome::Rendered { width: 200, height: 100 });

    let img = s.image();
    let white_left = img
        .enumerate_pixels()
        .any(|(x, _, p)| x < 100 && *p == WHITE);
    assert!(white_left, "text should be visible over the background");
    for (x, y, p) in img.enumerate_pixels() {
        if x >= 100 {
            assert_eq!(*p, RED, "subject must cover text at ({x},{y})");
        }
    }
    assert_eq!(*img.get_pixel(5, 5), BLUE);
}

#[test]
fn test_render_is_idempotent() {
    let mut s = surface();
    let pair = images();
    let l = layer("Hello");
    render(&mut s, Some(&pair), &l).unwrap();
    let first = s.image().clone();
    render(&mut s, Some(&pair), &l).unwrap();
    assert_eq!(first.as_raw(), s.image().as_raw());
}

#[test]
fn test_empty_text_is_plain_composite() {
    let mut s = surface();
    let pair = images();
    render(&mut s, Some(&pair), &layer("")).unwrap();

    let mut expected = pair.background().clone();
    imageops::overlay(&mut expected, pair.foreground_cutout(), 0, 0);
    assert_eq!(expected.as_raw(), s.image().as_raw());
}

#[test]
fn test_no_images_leaves_previous_frame() {
    let mut s = surface();
    let pair = images();
    render(&mut s, Some(&pair), &layer("Hi")).unwrap();
    let before = s.image().clone();

    let outcome = render(&mut s, None, &layer("Something else")).unwrap();
    assert_eq!(outcome, RenderOutcome::Idle);
    assert_eq!(before.as_raw(), s.image().as_raw());
}

#[test]
fn test_mismatched_cutout_is_scaled_to_background() {
    let mut s = surface();
    let half = RgbaImage::from_pixel(50, 25, RED);
    let pair = ImagePair::new(RgbaImage::from_pixel(200, 100, BLUE), half);
    render(&mut s, Some(&pair), &layer("")).unwrap();
    assert_eq!(s.image().dimensions(), (200, 100));
    let corner = s.image().get_pixel(199, 99);
    assert!(corner[0] > 200 && corner[2] < 50, "cutout should cover the corner, got {corner:?}");
}

#[test]
fn test_editor_exports_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");

    let mut editor = Editor::new(surface(), layer("HHHH"));
    editor.install_images(images());
    editor.save_png(&path).unwrap();

    let written = image::open(&path).unwrap().to_rgba8();
    assert_eq!(written.dimensions(), (200, 100));
    assert_eq!(written.as_raw(), editor.surface().image().as_raw());
}

#[test]
fn test_editor_export_without_images_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = Editor::new(surface(), TextLayer::default());
    assert!(editor.save_png(&dir.path().join("out.png")).is_err());
}
