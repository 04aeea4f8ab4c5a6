use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgba, RgbaImage};
use text_behind::font::FontBook;
use text_behind::placement::PointerEvent;
use text_behind::{render, Editor, ImagePair, Point, RasterSurface, TextLayer};

fn pair(w: u32, h: u32) -> ImagePair {
    let background =
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255]));
    let cutout = RgbaImage::from_fn(w, h, |x, _| {
        if x > w / 2 { Rgba([200, 40, 40, 255]) } else { Rgba([0, 0, 0, 0]) }
    });
    ImagePair::new(background, cutout)
}

fn bench_render(c: &mut Criterion) {
    let images = pair(1920, 1080);
    let layer = TextLayer {
        content: "Behind the subject".into(),
        font_size_px: 96.0,
        position: Point::new(200.0, 540.0),
        ..TextLayer::default()
    };
    let mut surface = RasterSurface::new(FontBook::new());
    c.bench_function("render_1080p", |b| {
        b.iter(|| render(&mut surface, black_box(Some(&images)), black_box(&layer)))
    });
}

fn bench_drag(c: &mut Criterion) {
    let mut editor = Editor::new(RasterSurface::new(FontBook::new()), TextLayer::default());
    editor.install_images(pair(1920, 1080));
    editor.handle_input(PointerEvent::MouseDown(Point::new(0.0, 0.0)));
    let mut x = 0.0f32;
    c.bench_function("drag_move_and_refresh", |b| {
        b.iter(|| {
            x = (x + 7.0) % 1500.0;
            editor.handle_input(PointerEvent::MouseMove(Point::new(x, 300.0)));
            editor.refresh()
        })
    });
}

criterion_group!(benches, bench_render, bench_drag);
criterion_main!(benches);
