use super::*;

fn frame(w: u32, h: u32, px: [u8; 4]) -> FrameRGBA {
    FrameRGBA {
        width: w,
        height: h,
        data: px.repeat((w * h) as usize),
        premultiplied: true,
    }
}

#[test]
fn in_memory_display_shares_frames_between_clones() {
    let observer = InMemoryDisplay::new();
    let mut d = observer.clone();
    d.begin(Canvas::new(2, 2).unwrap()).unwrap();
    d.present(&frame(2, 2, [1, 2, 3, 255])).unwrap();
    d.present(&frame(2, 2, [4, 5, 6, 255])).unwrap();
    d.end().unwrap();

    assert_eq!(observer.len(), 2);
    assert!(observer.is_ended());
    assert_eq!(observer.canvas(), Some(Canvas::new(2, 2).unwrap()));
    assert_eq!(observer.frames()[1].data[0], 4);
}

#[test]
fn unpremultiply_restores_straight_color() {
    assert_eq!(unpremultiply(&[64, 0, 128, 128]), vec![128, 0, 255, 128]);
    assert_eq!(unpremultiply(&[0, 0, 0, 0]), vec![0, 0, 0, 0]);
    assert_eq!(unpremultiply(&[10, 20, 30, 255]), vec![10, 20, 30, 255]);
}

#[test]
fn png_sequence_writes_numbered_files() {
    let dir = std::env::temp_dir().join(format!("slidecast_png_seq_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let mut d = PngSequenceDisplay::new(&dir);
    d.begin(Canvas::new(3, 2).unwrap()).unwrap();
    d.present(&frame(3, 2, [255, 0, 0, 255])).unwrap();
    d.present(&frame(3, 2, [0, 0, 0, 0])).unwrap();
    d.end().unwrap();
    assert_eq!(d.written(), 2);

    let img = image::open(dir.join("frame_000000.png")).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (3, 2));
    assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert!(dir.join("frame_000001.png").exists());
    assert!(!dir.join("frame_000002.png").exists());

    let _ = std::fs::remove_dir_all(&dir);
}
