use super::*;
use crate::assets::color::Color;
use crate::foundation::core::Rect;
use crate::presentation::listener::{EventLog, LifecycleEvent};
use crate::render::compositor::LayerParams;
use crate::scene::model::{ComponentKind, Fill, SlideComponent};

fn config(w: u32, h: u32) -> PresentationConfig {
    PresentationConfig {
        canvas: Canvas::new(w, h).unwrap(),
        system_fonts: false,
        ..PresentationConfig::default()
    }
}

fn presenter(w: u32, h: u32) -> Presenter {
    Presenter::with_text(
        config(w, h),
        EasingRegistry::builtin(),
        TextRasterizer::without_fonts(),
    )
    .unwrap()
}

fn solid_slide(c: Color) -> Arc<Slide> {
    let mut s = Slide::new(800.0, 600.0).unwrap();
    s.push(SlideComponent::new(
        Rect::new(0.0, 0.0, 800.0, 600.0),
        ComponentKind::Background(Fill::Color(c)),
    ));
    Arc::new(s)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn first_px(s: &Surface) -> [u8; 4] {
    [s.data()[0], s.data()[1], s.data()[2], s.data()[3]]
}

const LINEAR: EaseId = EaseId(10);

#[test]
fn idle_frame_is_the_clear_color() {
    let mut p = presenter(8, 6);
    let f = p.render(Instant::now()).unwrap();
    assert!(f.data().chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
}

#[test]
fn fade_in_blends_over_clear_color_and_settles() {
    let mut p = presenter(8, 6);
    let t0 = Instant::now();
    let red = solid_slide(Color::rgba(1.0, 0.0, 0.0, 1.0));
    p.send(red.clone(), ms(100), LINEAR, t0);

    let mid = first_px(p.render(t0 + ms(50)).unwrap());
    assert_eq!(mid[3], 255);
    assert!((120..=135).contains(&mid[0]), "{mid:?}");

    let done = p.render(t0 + ms(100)).unwrap().clone();
    assert_eq!(p.phase(), Phase::Shown);
    assert_eq!(first_px(&done), [255, 0, 0, 255]);

    let mut c = Compositor::new(
        crate::render::cache::CacheOpts::default(),
        TextRasterizer::without_fonts(),
    );
    let expect = c
        .composite(&red, LayerParams::full(), 8, 6, Rgba8Premul::black())
        .unwrap();
    assert_eq!(done, expect);
}

#[test]
fn unknown_easing_falls_back_to_default() {
    let p = presenter(8, 6);
    let ev = p.send_event_for(solid_slide(Color::default()), ms(10), EaseId(9999));
    assert_eq!(ev.ease(), Ease::Cubic);
    assert_eq!(p.resolve_ease(EaseId(30)), Ease::Cubic);
    assert_eq!(p.resolve_ease(LINEAR), Ease::Linear);
}

#[test]
fn superseding_send_starts_from_the_last_frame() {
    let mut p = presenter(8, 6);
    let log = EventLog::new();
    p.add_listener(Box::new(log.clone()));
    let t0 = Instant::now();

    let a_id = p.send(solid_slide(Color::rgba(1.0, 0.0, 0.0, 1.0)), ms(100), LINEAR, t0);
    let half = p.render(t0 + ms(50)).unwrap().clone();

    let b_id = p.send(solid_slide(Color::rgba(0.0, 0.0, 1.0, 1.0)), ms(100), LINEAR, t0 + ms(50));
    let restart = p.render(t0 + ms(50)).unwrap().clone();
    assert_eq!(restart, half, "no visual jump when interrupted");

    p.render(t0 + ms(150)).unwrap();
    assert_eq!(first_px(p.frame()), [0, 0, 255, 255]);
    assert_eq!(
        log.snapshot(),
        vec![
            LifecycleEvent::InBegin(a_id),
            LifecycleEvent::Dropped(a_id, crate::presentation::event::DropReason::Superseded),
            LifecycleEvent::InBegin(b_id),
            LifecycleEvent::InComplete(b_id),
        ]
    );
}

#[test]
fn clear_fades_back_to_clear_color() {
    let mut p = presenter(4, 4);
    let t0 = Instant::now();
    p.send(solid_slide(Color::rgba(0.0, 1.0, 0.0, 1.0)), Duration::ZERO, LINEAR, t0);
    p.render(t0).unwrap();
    p.clear(ms(100), LINEAR, t0 + ms(10));

    let mid = first_px(p.render(t0 + ms(60)).unwrap());
    assert!(mid[1] > 0 && mid[1] < 255, "{mid:?}");

    p.render(t0 + ms(200)).unwrap();
    assert_eq!(p.phase(), Phase::Idle);
    assert_eq!(first_px(p.frame()), [0, 0, 0, 255]);
}

#[test]
fn resize_rebuilds_caches_at_the_new_size() {
    let mut p = presenter(800, 600);
    let t0 = Instant::now();
    p.send(solid_slide(Color::rgba(1.0, 1.0, 1.0, 1.0)), Duration::ZERO, LINEAR, t0);
    p.render(t0).unwrap();
    p.render(t0 + ms(1)).unwrap();
    let before = p.stats();
    assert_eq!(before.cache_builds, 1);
    assert_eq!(before.cache_hits, 1);

    p.resize(1024, 768).unwrap();
    let f = p.render(t0 + ms(2)).unwrap();
    assert_eq!((f.width(), f.height()), (1024, 768));
    let after = p.stats();
    assert_eq!(after.cache_invalidations - before.cache_invalidations, 1);
    assert_eq!(after.cache_builds, 2);
    assert_eq!(p.current_frame().width, 1024);
}

#[test]
fn unregistered_default_easing_is_rejected() {
    let err = Presenter::with_text(
        config(8, 6),
        EasingRegistry::empty(),
        TextRasterizer::without_fonts(),
    );
    assert!(err.is_err());
}
