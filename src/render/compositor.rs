use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::assets::text::TextRasterizer;
use crate::effects::transitions::TransitionKind;
use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::render::cache::{
    CacheOpts, ComponentGroup, GroupKind, RenderCacheEntry, SlideCache, draw_components,
    plan_groups,
};
use crate::render::raster::RasterCtx;
use crate::render::surface::{Surface, SurfaceDesc};
use crate::render::surface_pool::{SurfacePool, SurfacePoolStats};
use crate::scene::model::{Slide, SlideId, SlideKey};

/// Revisions of one slide kept cached at once (an edit crossfading over its predecessor).
const MAX_CACHED_REVISIONS: usize = 2;

/// How one slide layer is blended into the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerParams {
    /// Transition completion fraction for this layer, `0` (invisible) to `1` (fully placed).
    pub progress: f32,
    /// Effect used to blend the layer.
    pub effect: TransitionKind,
    /// Seconds since the slide started showing.
    pub media_time: f64,
}

impl LayerParams {
    /// Fully placed, no effect, media at its first frame.
    pub fn full() -> Self {
        Self {
            progress: 1.0,
            effect: TransitionKind::Cut,
            media_time: 0.0,
        }
    }
}

impl Default for LayerParams {
    fn default() -> Self {
        Self::full()
    }
}

/// Cumulative compositor counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositeStats {
    /// Static groups served from a valid cache entry.
    pub cache_hits: u64,
    /// Cache entries (re)built.
    pub cache_builds: u64,
    /// Cache entries discarded (stale key, resize, explicit invalidation, retain).
    pub cache_invalidations: u64,
    /// Groups rendered without a cache entry.
    pub live_renders: u64,
    /// Components skipped because they failed to render.
    pub component_failures: u64,
    /// Groups whose cache build failed and that now render live.
    pub cache_fallbacks: u64,
}

/// Composes slides into surfaces through per-rendition group caches.
///
/// Each `(slide, revision)` gets its own cache; a new revision starts from its predecessor's
/// entries, so unchanged groups are shared and both can be composed in the same frame.
/// Owned by a single thread; nothing here is shared.
#[derive(Debug)]
pub struct Compositor {
    opts: CacheOpts,
    text: TextRasterizer,
    pool: SurfacePool,
    caches: HashMap<SlideKey, SlideCache>,
    stats: CompositeStats,
    clock: u64,
}

impl Compositor {
    /// Compositor with the given cache options and text rasterizer.
    pub fn new(opts: CacheOpts, text: TextRasterizer) -> Self {
        Self {
            opts,
            text,
            pool: SurfacePool::new(opts.pool),
            caches: HashMap::new(),
            stats: CompositeStats::default(),
            clock: 0,
        }
    }

    /// Cache options in effect.
    pub fn opts(&self) -> CacheOpts {
        self.opts
    }

    /// Counters since construction.
    pub fn stats(&self) -> CompositeStats {
        self.stats
    }

    /// Surface pool counters.
    pub fn pool_stats(&self) -> SurfacePoolStats {
        self.pool.stats()
    }

    /// Number of slide renditions holding cache state.
    pub fn cached_slides(&self) -> usize {
        self.caches.len()
    }

    /// Bytes held by cache entries; buffers shared between revisions count once.
    pub fn cached_bytes(&self) -> usize {
        unique_bytes(self.caches.values())
    }

    /// Compose `slide` into a fresh `width x height` surface cleared to `clear`.
    pub fn composite(
        &mut self,
        slide: &Slide,
        params: LayerParams,
        width: u32,
        height: u32,
        clear: Rgba8Premul,
    ) -> SlidecastResult<Surface> {
        let mut out = Surface::new(width, height)?;
        out.clear(clear);
        self.composite_onto(slide, params, &mut out)?;
        Ok(out)
    }

    /// Blend `slide` over `target` with `params`.
    ///
    /// Output is a pure function of `(slide, params, target size)` and the prior target contents.
    #[tracing::instrument(
        level = "trace",
        skip_all,
        fields(slide = slide.id().get(), w = target.width(), h = target.height())
    )]
    pub fn composite_onto(
        &mut self,
        slide: &Slide,
        params: LayerParams,
        target: &mut Surface,
    ) -> SlidecastResult<()> {
        let desc = target.desc();
        let key = slide.key();
        let mut cache = match self.caches.remove(&key) {
            Some(cache) => cache,
            None => self.revision_cache(key, desc),
        };
        self.clock += 1;
        cache.touch(self.clock);
        if cache.desc() != desc {
            let n = cache.resize(desc, &mut self.pool);
            self.stats.cache_invalidations += n;
            tracing::debug!(
                slide = slide.id().get(),
                discarded = n,
                "target size changed; render caches invalidated"
            );
        }

        let res = self.compose(slide, params, target, &mut cache);
        self.caches.insert(key, cache);
        res
    }

    /// Cache for a rendition seen for the first time, forked from the latest cached revision
    /// of the same slide. Older revisions beyond the limit are dropped.
    fn revision_cache(&mut self, key: SlideKey, desc: SurfaceDesc) -> SlideCache {
        let mut siblings: Vec<(u64, SlideKey)> = self
            .caches
            .iter()
            .filter(|(k, _)| k.id == key.id)
            .map(|(k, c)| (c.last_used(), *k))
            .collect();
        siblings.sort_unstable();
        while siblings.len() >= MAX_CACHED_REVISIONS {
            let (_, old) = siblings.remove(0);
            if let Some(mut cache) = self.caches.remove(&old) {
                self.stats.cache_invalidations += cache.clear(&mut self.pool);
            }
        }
        match siblings.last().and_then(|(_, k)| self.caches.get(k)) {
            Some(prev) if prev.desc() == desc => prev.fork(),
            _ => SlideCache::new(desc),
        }
    }

    fn compose(
        &mut self,
        slide: &Slide,
        params: LayerParams,
        target: &mut Surface,
        cache: &mut SlideCache,
    ) -> SlidecastResult<()> {
        let groups = plan_groups(slide);
        let anchors: HashSet<_> = groups.iter().filter_map(ComponentGroup::anchor).collect();
        self.stats.cache_invalidations += cache.sweep(&anchors, &mut self.pool);

        if groups.is_empty() || params.effect.is_invisible_at(params.progress) {
            return Ok(());
        }

        let desc = target.desc();
        let ctx = RasterCtx {
            text: &self.text,
            sx: f64::from(desc.width) / slide.width(),
            sy: f64::from(desc.height) / slide.height(),
            media_time: params.media_time,
        };

        if let [group] = groups.as_slice() {
            match cached_entry(
                self.opts,
                &mut self.pool,
                &mut self.stats,
                cache,
                group,
                slide,
                &self.caches,
                &ctx,
            ) {
                Some(entry) => {
                    let res = entry.render(target, params.effect, params.progress);
                    cache.put(entry)?;
                    return res;
                }
                None => {
                    let mut scratch = self.pool.borrow(desc)?;
                    draw_components(
                        &mut scratch,
                        &slide.components()[group.range.clone()],
                        &ctx,
                        &mut self.stats.component_failures,
                    );
                    self.stats.live_renders += 1;
                    let res = params.effect.apply(target, &scratch, params.progress);
                    self.pool.release(scratch);
                    return res;
                }
            }
        }

        let mut layer = self.pool.borrow(desc)?;
        for group in &groups {
            match cached_entry(
                self.opts,
                &mut self.pool,
                &mut self.stats,
                cache,
                group,
                slide,
                &self.caches,
                &ctx,
            ) {
                Some(entry) => {
                    let res = entry.render(&mut layer, TransitionKind::Cut, 1.0);
                    cache.put(entry)?;
                    res?;
                }
                None => {
                    draw_components(
                        &mut layer,
                        &slide.components()[group.range.clone()],
                        &ctx,
                        &mut self.stats.component_failures,
                    );
                    self.stats.live_renders += 1;
                }
            }
        }
        let res = params.effect.apply(target, &layer, params.progress);
        self.pool.release(layer);
        res
    }

    /// Drop every cache entry held for any revision of `slide`.
    pub fn invalidate(&mut self, slide: SlideId) {
        let keys: Vec<SlideKey> = self.caches.keys().filter(|k| k.id == slide).copied().collect();
        self.drop_caches(keys);
    }

    /// Drop caches for renditions not in `keep`, returning their buffers to the pool.
    pub fn retain(&mut self, keep: impl IntoIterator<Item = SlideKey>) {
        let keep: HashSet<SlideKey> = keep.into_iter().collect();
        let gone: Vec<SlideKey> = self
            .caches
            .keys()
            .filter(|k| !keep.contains(k))
            .copied()
            .collect();
        self.drop_caches(gone);
    }

    fn drop_caches(&mut self, keys: Vec<SlideKey>) {
        for key in keys {
            if let Some(mut cache) = self.caches.remove(&key) {
                self.stats.cache_invalidations += cache.clear(&mut self.pool);
            }
        }
    }
}

/// Bytes held by `caches`; buffers shared between revisions count once.
fn unique_bytes<'a>(caches: impl Iterator<Item = &'a SlideCache>) -> usize {
    let mut seen = HashSet::new();
    caches
        .flat_map(SlideCache::surfaces)
        .filter(|s| seen.insert(Arc::as_ptr(s)))
        .map(|s| s.desc().byte_len())
        .sum()
}

/// The valid cache entry for `group`, building it if needed; `None` means render live.
#[allow(clippy::too_many_arguments)]
fn cached_entry(
    opts: CacheOpts,
    pool: &mut SurfacePool,
    stats: &mut CompositeStats,
    cache: &mut SlideCache,
    group: &ComponentGroup,
    slide: &Slide,
    others: &HashMap<SlideKey, SlideCache>,
    ctx: &RasterCtx<'_>,
) -> Option<RenderCacheEntry> {
    if !opts.enabled || group.kind == GroupKind::Live || cache.has_failed(group) {
        return None;
    }
    if let Some(entry) = cache.take_valid(group, pool, &mut stats.cache_invalidations) {
        stats.cache_hits += 1;
        return Some(entry);
    }

    let desc = cache.desc();
    let held = unique_bytes(others.values().chain(std::iter::once(&*cache)));
    let built = if held + desc.byte_len() > opts.max_cache_bytes {
        Err(SlidecastError::cache(format!(
            "cache budget of {} bytes exhausted",
            opts.max_cache_bytes
        )))
    } else {
        RenderCacheEntry::build(
            group.key.clone(),
            &slide.components()[group.range.clone()],
            desc,
            ctx,
            pool,
            &mut stats.component_failures,
        )
    };

    match built {
        Ok(entry) => {
            stats.cache_builds += 1;
            tracing::debug!(
                slide = slide.id().get(),
                components = group.key.len(),
                "render cache entry built"
            );
            Some(entry)
        }
        Err(e) => {
            stats.cache_fallbacks += 1;
            cache.mark_failed(group);
            tracing::warn!(
                slide = slide.id().get(),
                error = %e,
                "render cache build failed; group falls back to live rendering"
            );
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
