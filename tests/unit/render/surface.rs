use super::*;

fn px(s: &Surface, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * s.width() + x) * 4) as usize;
    [s.data()[i], s.data()[i + 1], s.data()[i + 2], s.data()[i + 3]]
}

#[test]
fn new_surface_is_transparent_and_validated() {
    let s = Surface::new(4, 3).unwrap();
    assert_eq!(s.data().len(), 4 * 3 * 4);
    assert!(s.data().iter().all(|&b| b == 0));
    assert!(Surface::new(0, 3).is_err());
    assert!(Surface::new(MAX_SURFACE_DIM + 1, 3).is_err());
}

#[test]
fn fill_rect_is_clipped() {
    let mut s = Surface::new(4, 4).unwrap();
    let red = Rgba8Premul::from_straight_rgba(255, 0, 0, 255);
    s.fill_rect(
        PixelRect {
            x: -2,
            y: 2,
            w: 4,
            h: 10,
        },
        red,
    );
    assert_eq!(px(&s, 0, 2), [255, 0, 0, 255]);
    assert_eq!(px(&s, 1, 3), [255, 0, 0, 255]);
    assert_eq!(px(&s, 2, 2), [0, 0, 0, 0]);
    assert_eq!(px(&s, 0, 1), [0, 0, 0, 0]);
}

#[test]
fn draw_premul_blends_and_checks_length() {
    let mut s = Surface::new(3, 1).unwrap();
    s.clear(Rgba8Premul::black());
    let src = [0, 0, 255, 255, 0, 0, 0, 0];
    s.draw_premul(
        PixelRect {
            x: 1,
            y: 0,
            w: 2,
            h: 1,
        },
        &src,
    )
    .unwrap();
    assert_eq!(px(&s, 0, 0), [0, 0, 0, 255]);
    assert_eq!(px(&s, 1, 0), [0, 0, 255, 255]);
    assert_eq!(px(&s, 2, 0), [0, 0, 0, 255]);

    let bad = s.draw_premul(
        PixelRect {
            x: 0,
            y: 0,
            w: 2,
            h: 2,
        },
        &src,
    );
    assert!(bad.is_err());
}

#[test]
fn copy_from_requires_same_size() {
    let mut a = Surface::new(2, 2).unwrap();
    let mut b = Surface::new(2, 2).unwrap();
    b.clear(Rgba8Premul::black());
    a.copy_from(&b).unwrap();
    assert_eq!(a, b);
    assert!(a.copy_from(&Surface::new(3, 2).unwrap()).is_err());
}

#[test]
fn fingerprint_tracks_content() {
    let mut s = Surface::new(2, 2).unwrap();
    let a = s.to_frame().fingerprint();
    assert_eq!(a, s.to_frame().fingerprint());
    s.clear(Rgba8Premul::black());
    assert_ne!(a, s.to_frame().fingerprint());
    assert!(s.to_frame().premultiplied);
}
