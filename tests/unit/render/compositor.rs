use super::*;
use crate::assets::color::Color;
use crate::assets::decode::PreparedImage;
use crate::assets::text::TextStyle;
use crate::foundation::core::Rect;
use crate::scene::model::{
    ComponentId, ComponentKind, Fill, ImageFit, MediaSource, SlideComponent,
};

fn bg(c: Color) -> SlideComponent {
    SlideComponent::new(
        Rect::new(0.0, 0.0, 800.0, 600.0),
        ComponentKind::Background(Fill::Color(c)),
    )
}

fn border(thickness: f64) -> SlideComponent {
    SlideComponent::new(
        Rect::new(100.0, 100.0, 700.0, 500.0),
        ComponentKind::Border {
            color: Color::rgba(1.0, 1.0, 0.0, 1.0),
            thickness,
        },
    )
}

fn media() -> SlideComponent {
    let frames = [[255u8, 0, 0, 255], [0, 0, 255, 255]]
        .into_iter()
        .map(|c| PreparedImage::from_premul(2, 2, c.repeat(4)).unwrap())
        .collect();
    SlideComponent::new(
        Rect::new(200.0, 150.0, 600.0, 450.0),
        ComponentKind::Media {
            source: MediaSource::new(frames, 1.0, true).unwrap(),
            fit: ImageFit::Stretch,
        },
    )
}

/// background + border | media | border: two static groups around one live group.
fn mixed_slide() -> (Slide, ComponentId) {
    let mut s = Slide::new(800.0, 600.0).unwrap();
    s.push(bg(Color::rgba(0.0, 0.0, 0.5, 1.0)));
    s.push(border(4.0));
    s.push(media());
    let top = s.push(border(10.0));
    (s, top)
}

fn compositor(opts: CacheOpts) -> Compositor {
    Compositor::new(opts, TextRasterizer::without_fonts())
}

#[test]
fn groups_split_around_dynamic_components() {
    let (s, _) = mixed_slide();
    let groups = crate::render::cache::plan_groups(&s);
    let kinds: Vec<_> = groups.iter().map(|g| g.kind).collect();
    assert_eq!(
        kinds,
        vec![GroupKind::Static, GroupKind::Live, GroupKind::Static]
    );
    assert_eq!(groups[0].range, 0..2);
    assert_eq!(groups[2].range, 3..4);
}

#[test]
fn repeated_composites_are_byte_identical_and_hit_the_cache() {
    let (s, _) = mixed_slide();
    let mut c = compositor(CacheOpts::default());
    let a = c
        .composite(&s, LayerParams::full(), 800, 600, Rgba8Premul::black())
        .unwrap();
    let b = c
        .composite(&s, LayerParams::full(), 800, 600, Rgba8Premul::black())
        .unwrap();
    assert_eq!(a, b);

    let st = c.stats();
    assert_eq!(st.cache_builds, 2);
    assert_eq!(st.cache_hits, 2);
    assert_eq!(st.live_renders, 2);
    assert_eq!(st.cache_invalidations, 0);
}

#[test]
fn disabled_cache_renders_the_same_pixels() {
    let (s, _) = mixed_slide();
    let params = LayerParams {
        progress: 0.4,
        effect: TransitionKind::Fade,
        media_time: 1.2,
    };
    let mut cached = compositor(CacheOpts::default());
    let mut live = compositor(CacheOpts {
        enabled: false,
        ..CacheOpts::default()
    });
    let a = cached
        .composite(&s, params, 400, 300, Rgba8Premul::black())
        .unwrap();
    let b = live
        .composite(&s, params, 400, 300, Rgba8Premul::black())
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(live.stats().cache_builds, 0);
    assert_eq!(live.stats().live_renders, 3);
}

#[test]
fn resize_rebuilds_every_group() {
    let (s, _) = mixed_slide();
    let mut c = compositor(CacheOpts::default());
    c.composite(&s, LayerParams::full(), 800, 600, Rgba8Premul::black())
        .unwrap();
    let first = c.stats();

    let big = c
        .composite(&s, LayerParams::full(), 1024, 768, Rgba8Premul::black())
        .unwrap();
    let st = c.stats();
    assert_eq!(st.cache_invalidations - first.cache_invalidations, 2);
    assert_eq!(st.cache_builds - first.cache_builds, 2);
    assert_eq!(st.cache_hits, first.cache_hits);

    let mut fresh = compositor(CacheOpts::default());
    let expect = fresh
        .composite(&s, LayerParams::full(), 1024, 768, Rgba8Premul::black())
        .unwrap();
    assert_eq!(big, expect);
}

#[test]
fn editing_a_component_rebuilds_only_its_group() {
    let (mut s, top) = mixed_slide();
    let mut c = compositor(CacheOpts::default());
    c.composite(&s, LayerParams::full(), 200, 150, Rgba8Premul::black())
        .unwrap();

    s.edit_component(top, |comp| {
        comp.set_kind(ComponentKind::Border {
            color: Color::rgba(0.0, 1.0, 0.0, 1.0),
            thickness: 2.0,
        })
    })
    .unwrap();
    c.composite(&s, LayerParams::full(), 200, 150, Rgba8Premul::black())
        .unwrap();

    let st = c.stats();
    assert_eq!(st.cache_builds, 3);
    assert_eq!(st.cache_hits, 1);
    assert_eq!(st.cache_invalidations, 1);
}

#[test]
fn removed_groups_release_their_entries() {
    let (mut s, top) = mixed_slide();
    let mut c = compositor(CacheOpts::default());
    c.composite(&s, LayerParams::full(), 80, 60, Rgba8Premul::black())
        .unwrap();
    s.remove(top);
    c.composite(&s, LayerParams::full(), 80, 60, Rgba8Premul::black())
        .unwrap();
    assert_eq!(c.stats().cache_invalidations, 1);
    // The previous revision still holds the removed group until it is released.
    assert_eq!(c.cached_bytes(), 2 * 80 * 60 * 4);

    c.retain([s.key()]);
    assert_eq!(c.cached_slides(), 1);
    assert_eq!(c.cached_bytes(), 80 * 60 * 4);
}

#[test]
fn alternating_revisions_keep_their_caches() {
    let (old, top) = mixed_slide();
    let mut edited = old.clone();
    edited
        .edit_component(top, |comp| {
            comp.set_bounds(Rect::new(50.0, 50.0, 750.0, 550.0))
        })
        .unwrap();
    let mut c = compositor(CacheOpts::default());

    let mut frame = Surface::new(200, 150).unwrap();
    c.composite_onto(&old, LayerParams::full(), &mut frame).unwrap();
    c.composite_onto(&edited, LayerParams::full(), &mut frame).unwrap();
    let warm = c.stats();
    assert_eq!(warm.cache_builds, 3);
    assert_eq!(c.cached_slides(), 2);

    for _ in 0..10 {
        c.composite_onto(&old, LayerParams::full(), &mut frame).unwrap();
        c.composite_onto(&edited, LayerParams::full(), &mut frame).unwrap();
    }
    let st = c.stats();
    assert_eq!(st.cache_builds, warm.cache_builds);
    assert_eq!(st.cache_invalidations, warm.cache_invalidations);
    assert_eq!(st.cache_hits - warm.cache_hits, 40);
    assert_eq!(c.cached_bytes(), 3 * 200 * 150 * 4);
}

#[test]
fn only_the_latest_revisions_stay_cached() {
    let (mut s, top) = mixed_slide();
    let mut c = compositor(CacheOpts::default());
    for thickness in [2.0, 3.0, 5.0] {
        c.composite(&s, LayerParams::full(), 40, 30, Rgba8Premul::black())
            .unwrap();
        s.edit_component(top, |comp| {
            comp.set_kind(ComponentKind::Border {
                color: Color::rgba(1.0, 1.0, 1.0, 1.0),
                thickness,
            })
        })
        .unwrap();
    }
    c.composite(&s, LayerParams::full(), 40, 30, Rgba8Premul::black())
        .unwrap();
    assert_eq!(c.cached_slides(), 2);

    c.invalidate(s.id());
    assert_eq!(c.cached_slides(), 0);
    assert_eq!(c.cached_bytes(), 0);
}

#[test]
fn shared_entries_count_once_against_the_budget() {
    let (mut s, top) = mixed_slide();
    let entry = 200 * 150 * 4;
    let mut c = compositor(CacheOpts {
        max_cache_bytes: 3 * entry,
        ..CacheOpts::default()
    });
    c.composite(&s, LayerParams::full(), 200, 150, Rgba8Premul::black())
        .unwrap();
    s.edit_component(top, |comp| comp.set_bounds(Rect::new(0.0, 0.0, 400.0, 300.0)))
        .unwrap();
    c.composite(&s, LayerParams::full(), 200, 150, Rgba8Premul::black())
        .unwrap();

    let st = c.stats();
    assert_eq!(st.cache_builds, 3);
    assert_eq!(st.cache_fallbacks, 0);
    assert_eq!(c.cached_bytes(), 3 * entry);
}

#[test]
fn build_failure_falls_back_to_live_for_good() {
    let (s, _) = mixed_slide();
    let mut starved = compositor(CacheOpts {
        max_cache_bytes: 0,
        ..CacheOpts::default()
    });
    let a = starved
        .composite(&s, LayerParams::full(), 160, 120, Rgba8Premul::black())
        .unwrap();
    let b = starved
        .composite(&s, LayerParams::full(), 160, 120, Rgba8Premul::black())
        .unwrap();
    assert_eq!(a, b);

    let st = starved.stats();
    assert_eq!(st.cache_fallbacks, 2);
    assert_eq!(st.cache_builds, 0);
    assert_eq!(st.live_renders, 6);

    let mut normal = compositor(CacheOpts::default());
    let expect = normal
        .composite(&s, LayerParams::full(), 160, 120, Rgba8Premul::black())
        .unwrap();
    assert_eq!(a, expect);
}

#[test]
fn failing_components_are_skipped_and_counted() {
    let mut s = Slide::new(100.0, 100.0).unwrap();
    s.push(SlideComponent::new(
        Rect::new(0.0, 0.0, 100.0, 100.0),
        ComponentKind::Background(Fill::Color(Color::rgba(1.0, 0.0, 0.0, 1.0))),
    ));
    s.push(SlideComponent::new(
        Rect::new(0.0, 0.0, 50.0, 50.0),
        ComponentKind::Text {
            text: "broken".to_owned(),
            style: TextStyle {
                size: -3.0,
                ..TextStyle::default()
            },
        },
    ));
    let mut c = compositor(CacheOpts::default());
    let out = c
        .composite(&s, LayerParams::full(), 10, 10, Rgba8Premul::transparent())
        .unwrap();
    assert_eq!(c.stats().component_failures, 1);
    assert!(out.data().chunks_exact(4).all(|p| p == [255, 0, 0, 255]));
}

#[test]
fn invisible_layers_leave_the_target_alone() {
    let (s, _) = mixed_slide();
    let mut c = compositor(CacheOpts::default());
    let params = LayerParams {
        progress: 0.0,
        effect: TransitionKind::Fade,
        media_time: 0.0,
    };
    let out = c
        .composite(&s, params, 40, 30, Rgba8Premul::black())
        .unwrap();
    assert!(out.data().chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
}

#[test]
fn retain_and_invalidate_release_caches() {
    let (a, _) = mixed_slide();
    let (b, _) = mixed_slide();
    let mut c = compositor(CacheOpts::default());
    c.composite(&a, LayerParams::full(), 40, 30, Rgba8Premul::black())
        .unwrap();
    c.composite(&b, LayerParams::full(), 40, 30, Rgba8Premul::black())
        .unwrap();
    assert_eq!(c.cached_slides(), 2);

    c.retain([b.key()]);
    assert_eq!(c.cached_slides(), 1);
    assert_eq!(c.stats().cache_invalidations, 2);

    c.invalidate(b.id());
    assert_eq!(c.cached_slides(), 0);
    assert_eq!(c.cached_bytes(), 0);
    assert!(c.pool_stats().retained_surfaces > 0);
}

#[test]
fn debug_output_includes_the_pool() {
    let (s, _) = mixed_slide();
    let mut c = compositor(CacheOpts::default());
    c.composite(&s, LayerParams::full(), 40, 30, Rgba8Premul::black())
        .unwrap();
    let dump = format!("{c:?}");
    assert!(dump.contains("SurfacePool"));
    assert!(dump.contains("Bucket"));
}
