use super::*;
use crate::assets::color::Color;
use crate::assets::decode::PreparedImage;
use crate::assets::text::TextRasterizer;
use crate::foundation::core::Rect;
use crate::scene::model::{ComponentKind, Fill, ImageFit, MediaSource};

fn bg(c: Color) -> SlideComponent {
    SlideComponent::new(
        Rect::new(0.0, 0.0, 10.0, 10.0),
        ComponentKind::Background(Fill::Color(c)),
    )
}

fn media() -> SlideComponent {
    let frame = PreparedImage::from_premul(1, 1, vec![255, 255, 255, 255]).unwrap();
    SlideComponent::new(
        Rect::new(0.0, 0.0, 5.0, 5.0),
        ComponentKind::Media {
            source: MediaSource::new(vec![frame], 1.0, false).unwrap(),
            fit: ImageFit::Stretch,
        },
    )
}

fn desc(w: u32, h: u32) -> SurfaceDesc {
    Surface::new(w, h).unwrap().desc()
}

fn ctx(text: &TextRasterizer) -> RasterCtx<'_> {
    RasterCtx {
        text,
        sx: 1.0,
        sy: 1.0,
        media_time: 0.0,
    }
}

#[test]
fn static_runs_are_split_by_media() {
    let mut s = Slide::new(10.0, 10.0).unwrap();
    let a = s.push(bg(Color::default()));
    s.push(bg(Color::default()));
    let m = s.push(media());
    let b = s.push(bg(Color::default()));

    let groups = plan_groups(&s);
    let kinds: Vec<_> = groups.iter().map(|g| g.kind).collect();
    assert_eq!(
        kinds,
        vec![GroupKind::Static, GroupKind::Live, GroupKind::Static]
    );
    assert_eq!(groups[0].range, 0..2);
    assert_eq!(groups[0].anchor(), Some(a));
    assert_eq!(groups[1].anchor(), Some(m));
    assert_eq!(groups[2].anchor(), Some(b));
}

#[test]
fn empty_slide_has_no_groups() {
    let s = Slide::new(10.0, 10.0).unwrap();
    assert!(plan_groups(&s).is_empty());
}

#[test]
fn edit_changes_only_its_group_key() {
    let mut s = Slide::new(10.0, 10.0).unwrap();
    s.push(bg(Color::default()));
    s.push(media());
    let last = s.push(bg(Color::default()));
    let before = plan_groups(&s);

    s.edit_component(last, |c| c.set_bounds(Rect::new(1.0, 1.0, 2.0, 2.0)))
        .unwrap();
    let after = plan_groups(&s);
    assert_eq!(before[0].key, after[0].key);
    assert_ne!(before[2].key, after[2].key);
    assert_eq!(before[2].anchor(), after[2].anchor());
}

#[test]
fn stale_entry_is_released_and_counted() {
    let text = TextRasterizer::without_fonts();
    let mut pool = SurfacePool::new(SurfacePoolOpts::default());
    let d = desc(10, 10);
    let mut cache = SlideCache::new(d);

    let mut s = Slide::new(10.0, 10.0).unwrap();
    let id = s.push(bg(Color::rgba(1.0, 0.0, 0.0, 1.0)));
    let group = plan_groups(&s).remove(0);

    let mut failures = 0;
    let entry = RenderCacheEntry::build(
        group.key.clone(),
        &s.components()[group.range.clone()],
        d,
        &ctx(&text),
        &mut pool,
        &mut failures,
    )
    .unwrap();
    assert_eq!(failures, 0);
    assert_eq!(entry.byte_len(), 400);
    cache.put(entry).unwrap();
    assert_eq!(cache.bytes(), 400);

    let mut invalidations = 0;
    let hit = cache.take_valid(&group, &mut pool, &mut invalidations).unwrap();
    cache.put(hit).unwrap();
    assert_eq!(invalidations, 0);

    s.edit_component(id, |c| c.set_kind(ComponentKind::Background(Fill::Color(Color::default()))))
        .unwrap();
    let edited = plan_groups(&s).remove(0);
    assert!(cache.take_valid(&edited, &mut pool, &mut invalidations).is_none());
    assert_eq!(invalidations, 1);
    assert_eq!(cache.bytes(), 0);
    assert_eq!(pool.stats().retained_surfaces, 1);
}

#[test]
fn resize_and_sweep_discard_entries() {
    let text = TextRasterizer::without_fonts();
    let mut pool = SurfacePool::new(SurfacePoolOpts::default());
    let d = desc(10, 10);
    let mut cache = SlideCache::new(d);

    let mut s = Slide::new(10.0, 10.0).unwrap();
    s.push(bg(Color::default()));
    s.push(media());
    s.push(bg(Color::default()));
    let groups = plan_groups(&s);
    let mut failures = 0;
    for g in groups.iter().filter(|g| g.kind == GroupKind::Static) {
        let e = RenderCacheEntry::build(
            g.key.clone(),
            &s.components()[g.range.clone()],
            d,
            &ctx(&text),
            &mut pool,
            &mut failures,
        )
        .unwrap();
        cache.put(e).unwrap();
    }

    let keep: HashSet<ComponentId> = groups[..1]
        .iter()
        .filter_map(ComponentGroup::anchor)
        .collect();
    assert_eq!(cache.sweep(&keep, &mut pool), 1);
    assert_eq!(cache.sweep(&keep, &mut pool), 0);

    assert_eq!(cache.resize(desc(20, 20), &mut pool), 1);
    assert_eq!(cache.desc(), desc(20, 20));
    assert_eq!(cache.bytes(), 0);
}

#[test]
fn forked_cache_shares_buffers_until_the_last_owner_drops() {
    let text = TextRasterizer::without_fonts();
    let mut pool = SurfacePool::new(SurfacePoolOpts::default());
    let d = desc(10, 10);
    let mut cache = SlideCache::new(d);

    let mut s = Slide::new(10.0, 10.0).unwrap();
    s.push(bg(Color::default()));
    let g = plan_groups(&s).remove(0);
    let mut failures = 0;
    let e = RenderCacheEntry::build(
        g.key.clone(),
        &s.components()[g.range.clone()],
        d,
        &ctx(&text),
        &mut pool,
        &mut failures,
    )
    .unwrap();
    cache.put(e).unwrap();
    cache.touch(7);

    let mut fork = cache.fork();
    assert_eq!(fork.last_used(), 0);
    assert_eq!(fork.bytes(), 400);
    let shared: Vec<_> = cache.surfaces().zip(fork.surfaces()).collect();
    assert!(shared.iter().all(|(a, b)| Arc::ptr_eq(a, b)));

    assert_eq!(fork.clear(&mut pool), 1);
    assert_eq!(pool.stats().retained_surfaces, 0);
    assert_eq!(cache.clear(&mut pool), 1);
    assert_eq!(pool.stats().retained_surfaces, 1);
}

#[test]
fn failure_marks_every_member() {
    let mut s = Slide::new(10.0, 10.0).unwrap();
    s.push(bg(Color::default()));
    s.push(bg(Color::default()));
    let g = plan_groups(&s).remove(0);

    let mut cache = SlideCache::new(desc(4, 4));
    assert!(!cache.has_failed(&g));
    cache.mark_failed(&g);
    assert!(cache.has_failed(&g));

    let mut other = Slide::new(10.0, 10.0).unwrap();
    other.push(bg(Color::default()));
    assert!(!cache.has_failed(&plan_groups(&other)[0]));
}

#[test]
fn cache_opts_defaults_and_flattened_pool() {
    let o: CacheOpts = serde_json::from_str(r#"{"max_pool_bytes": 0}"#).unwrap();
    assert!(o.enabled);
    assert_eq!(o.max_cache_bytes, CacheOpts::default().max_cache_bytes);
    assert_eq!(o.pool.max_pool_bytes, 0);
}
