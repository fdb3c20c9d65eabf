use super::*;
use crate::assets::color::Color;
use crate::assets::text::TextStyle;
use crate::scene::model::MediaSource;

fn px(s: &Surface, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * s.width() + x) * 4) as usize;
    [s.data()[i], s.data()[i + 1], s.data()[i + 2], s.data()[i + 3]]
}

fn ctx(text: &TextRasterizer, sx: f64, sy: f64) -> RasterCtx<'_> {
    RasterCtx {
        text,
        sx,
        sy,
        media_time: 0.0,
    }
}

fn solid_image(w: u32, h: u32, c: [u8; 4]) -> PreparedImage {
    PreparedImage::from_premul(w, h, c.repeat((w * h) as usize)).unwrap()
}

#[test]
fn background_color_is_scaled_to_target() {
    let text = TextRasterizer::without_fonts();
    let c = SlideComponent::new(
        Rect::new(0.0, 0.0, 50.0, 50.0),
        ComponentKind::Background(Fill::Color(Color::rgba(0.0, 1.0, 0.0, 1.0))),
    );
    let mut s = Surface::new(8, 8).unwrap();
    draw_component(&mut s, &c, &ctx(&text, 0.08, 0.08)).unwrap();
    assert_eq!(px(&s, 3, 3), [0, 255, 0, 255]);
    assert_eq!(px(&s, 4, 4), [0, 0, 0, 0]);
}

#[test]
fn border_leaves_interior_untouched() {
    let text = TextRasterizer::without_fonts();
    let c = SlideComponent::new(
        Rect::new(0.0, 0.0, 10.0, 10.0),
        ComponentKind::Border {
            color: Color::rgba(1.0, 1.0, 1.0, 1.0),
            thickness: 1.0,
        },
    );
    let mut s = Surface::new(10, 10).unwrap();
    draw_component(&mut s, &c, &ctx(&text, 1.0, 1.0)).unwrap();
    for (x, y) in [(0, 0), (9, 0), (0, 9), (9, 9), (5, 0), (0, 5), (9, 5), (5, 9)] {
        assert_eq!(px(&s, x, y), [255, 255, 255, 255], "({x},{y})");
    }
    assert_eq!(px(&s, 5, 5), [0, 0, 0, 0]);
    assert_eq!(px(&s, 1, 1), [0, 0, 0, 0]);
}

#[test]
fn contain_letterboxes_and_cover_crops() {
    let img = solid_image(2, 1, [255, 0, 0, 255]);
    let bounds = PixelRect {
        x: 0,
        y: 0,
        w: 10,
        h: 10,
    };
    assert_eq!(
        fit_rect(2, 1, ImageFit::Contain, bounds),
        PixelRect {
            x: 0,
            y: 3,
            w: 10,
            h: 5
        }
    );
    assert_eq!(
        fit_rect(2, 1, ImageFit::Cover, bounds),
        PixelRect {
            x: -5,
            y: 0,
            w: 20,
            h: 10
        }
    );
    assert_eq!(fit_rect(2, 1, ImageFit::Stretch, bounds), bounds);

    let text = TextRasterizer::without_fonts();
    let mut s = Surface::new(12, 10).unwrap();
    let cover = SlideComponent::new(
        Rect::new(1.0, 0.0, 11.0, 10.0),
        ComponentKind::Image {
            image: img,
            fit: ImageFit::Cover,
        },
    );
    draw_component(&mut s, &cover, &ctx(&text, 1.0, 1.0)).unwrap();
    assert_eq!(px(&s, 0, 5), [0, 0, 0, 0]);
    assert_eq!(px(&s, 1, 5), [255, 0, 0, 255]);
    assert_eq!(px(&s, 10, 5), [255, 0, 0, 255]);
    assert_eq!(px(&s, 11, 5), [0, 0, 0, 0]);
}

#[test]
fn media_uses_frame_for_media_time() {
    let frames = vec![
        solid_image(1, 1, [255, 0, 0, 255]),
        solid_image(1, 1, [0, 0, 255, 255]),
    ];
    let c = SlideComponent::new(
        Rect::new(0.0, 0.0, 2.0, 2.0),
        ComponentKind::Media {
            source: MediaSource::new(frames, 1.0, true).unwrap(),
            fit: ImageFit::Stretch,
        },
    );
    let text = TextRasterizer::without_fonts();
    let mut s = Surface::new(2, 2).unwrap();
    let mut c1 = ctx(&text, 1.0, 1.0);
    c1.media_time = 1.5;
    draw_component(&mut s, &c, &c1).unwrap();
    assert_eq!(px(&s, 1, 1), [0, 0, 255, 255]);
}

#[test]
fn empty_bounds_draw_nothing() {
    let text = TextRasterizer::without_fonts();
    let c = SlideComponent::new(
        Rect::new(5.0, 5.0, 5.0, 9.0),
        ComponentKind::Text {
            text: "x".to_owned(),
            style: TextStyle::default(),
        },
    );
    let mut s = Surface::new(8, 8).unwrap();
    draw_component(&mut s, &c, &ctx(&text, 1.0, 1.0)).unwrap();
    assert!(s.data().iter().all(|&b| b == 0));
}

#[test]
fn bad_text_size_is_an_error() {
    let text = TextRasterizer::without_fonts();
    let c = SlideComponent::new(
        Rect::new(0.0, 0.0, 8.0, 8.0),
        ComponentKind::Text {
            text: "x".to_owned(),
            style: TextStyle {
                size: -1.0,
                ..TextStyle::default()
            },
        },
    );
    let mut s = Surface::new(8, 8).unwrap();
    assert!(draw_component(&mut s, &c, &ctx(&text, 1.0, 1.0)).is_err());
}

#[test]
fn cover_strip_resamples_only_the_visible_rows() {
    let text = TextRasterizer::without_fonts();
    let strip = SlideComponent::new(
        Rect::new(0.0, 0.0, 200.0, 100.0),
        ComponentKind::Image {
            image: solid_image(1, 400, [0, 0, 255, 255]),
            fit: ImageFit::Cover,
        },
    );
    let bounds = ctx(&text, 1.0, 1.0).to_pixels(strip.bounds());
    assert!(fit_rect(1, 400, ImageFit::Cover, bounds).h > MAX_SURFACE_DIM);

    let mut s = Surface::new(200, 100).unwrap();
    draw_component(&mut s, &strip, &ctx(&text, 1.0, 1.0)).unwrap();
    assert!(s.data().chunks_exact(4).all(|p| p == [0, 0, 255, 255]));
}

#[test]
fn image_partly_off_target_is_clipped() {
    let text = TextRasterizer::without_fonts();
    let c = SlideComponent::new(
        Rect::new(-4.0, 2.0, 6.0, 12.0),
        ComponentKind::Image {
            image: solid_image(2, 2, [0, 255, 0, 255]),
            fit: ImageFit::Stretch,
        },
    );
    let mut s = Surface::new(8, 8).unwrap();
    draw_component(&mut s, &c, &ctx(&text, 1.0, 1.0)).unwrap();
    assert_eq!(px(&s, 0, 2), [0, 255, 0, 255]);
    assert_eq!(px(&s, 5, 7), [0, 255, 0, 255]);
    assert_eq!(px(&s, 6, 2), [0, 0, 0, 0]);
    assert_eq!(px(&s, 0, 1), [0, 0, 0, 0]);
}

#[test]
fn oversized_resample_is_a_render_error() {
    let text = TextRasterizer::without_fonts();
    let c = SlideComponent::new(
        Rect::new(0.0, 0.0, 20_000.0, 20_000.0),
        ComponentKind::Image {
            image: solid_image(1, 1, [255, 255, 255, 255]),
            fit: ImageFit::Stretch,
        },
    );
    let mut s = Surface::new(10, 10).unwrap();
    let err = draw_component(&mut s, &c, &ctx(&text, 1.0, 1.0)).unwrap_err();
    assert!(matches!(err, SlidecastError::Render(_)), "{err:?}");
    assert!(s.data().iter().all(|&b| b == 0));
}

#[test]
fn text_pixmap_is_clipped_to_the_target() {
    let text = TextRasterizer::without_fonts();
    let style = TextStyle::default();
    let big = SlideComponent::new(
        Rect::new(-8_000.0, -8_000.0, 8_000.0, 8_000.0),
        ComponentKind::Text {
            text: "Amen".to_owned(),
            style: style.clone(),
        },
    );
    let mut s = Surface::new(8, 8).unwrap();
    draw_component(&mut s, &big, &ctx(&text, 1.0, 1.0)).unwrap();

    let huge = SlideComponent::new(
        Rect::new(0.0, 0.0, 20_000.0, 8.0),
        ComponentKind::Text {
            text: "Amen".to_owned(),
            style,
        },
    );
    let err = draw_component(&mut s, &huge, &ctx(&text, 1.0, 1.0)).unwrap_err();
    assert!(matches!(err, SlidecastError::Render(_)), "{err:?}");
}
