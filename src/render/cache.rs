use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::effects::transitions::TransitionKind;
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::render::raster::{RasterCtx, draw_component};
use crate::render::surface::{Surface, SurfaceDesc};
use crate::render::surface_pool::{SurfacePool, SurfacePoolOpts};
use crate::scene::model::{ComponentId, Slide, SlideComponent};

/// Render cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CacheOpts {
    /// When `false` every group is rendered live on every frame.
    pub enabled: bool,
    /// Upper bound on bytes held by cache entries across all slides. A group whose entry would
    /// exceed it falls back to live rendering.
    pub max_cache_bytes: usize,
    /// Pool for cache buffers and per-frame scratch surfaces.
    #[serde(flatten)]
    pub pool: SurfacePoolOpts,
}

impl Default for CacheOpts {
    fn default() -> Self {
        Self {
            enabled: true,
            max_cache_bytes: 512 * 1024 * 1024,
            pool: SurfacePoolOpts::default(),
        }
    }
}

/// `(component, revision)` for every member of a group, in paint order.
pub(crate) type GroupKey = SmallVec<[(ComponentId, u64); 8]>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum GroupKind {
    /// Contiguous run of static components, rendered once into a cache entry.
    Static,
    /// One dynamic component, rendered every frame.
    Live,
}

/// A contiguous slice of a slide's components that is cached (or not) as a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ComponentGroup {
    pub(crate) kind: GroupKind,
    pub(crate) range: Range<usize>,
    pub(crate) key: GroupKey,
}

impl ComponentGroup {
    /// Stable handle for the group across edits elsewhere in the slide.
    pub(crate) fn anchor(&self) -> Option<ComponentId> {
        self.key.first().map(|(id, _)| *id)
    }
}

/// Split a slide into paint-ordered groups.
pub(crate) fn plan_groups(slide: &Slide) -> Vec<ComponentGroup> {
    let mut out = Vec::new();
    let mut run: Option<ComponentGroup> = None;

    for (i, c) in slide.components().iter().enumerate() {
        let member = (c.id(), c.revision());
        if c.is_dynamic() {
            if let Some(g) = run.take() {
                out.push(g);
            }
            out.push(ComponentGroup {
                kind: GroupKind::Live,
                range: i..i + 1,
                key: smallvec::smallvec![member],
            });
            continue;
        }
        match run.as_mut() {
            Some(g) => {
                g.range.end = i + 1;
                g.key.push(member);
            }
            None => {
                run = Some(ComponentGroup {
                    kind: GroupKind::Static,
                    range: i..i + 1,
                    key: smallvec::smallvec![member],
                });
            }
        }
    }
    if let Some(g) = run {
        out.push(g);
    }
    out
}

/// Paint `components` over `target`, skipping (and counting) the ones that fail.
pub(crate) fn draw_components(
    target: &mut Surface,
    components: &[SlideComponent],
    ctx: &RasterCtx<'_>,
    failures: &mut u64,
) {
    for c in components {
        if let Err(e) = draw_component(target, c, ctx) {
            *failures += 1;
            tracing::warn!(
                component = c.id().get(),
                kind = c.kind().name(),
                error = %e,
                "skipping component that failed to render"
            );
        }
    }
}

/// A static group rendered once into an offscreen buffer.
///
/// The buffer is only ever blended from, so revisions of one slide share it while the group is
/// unchanged. It returns to the pool when the last holder discards it.
#[derive(Clone, Debug)]
pub(crate) struct RenderCacheEntry {
    key: GroupKey,
    surface: Arc<Surface>,
}

impl RenderCacheEntry {
    pub(crate) fn build(
        key: GroupKey,
        components: &[SlideComponent],
        desc: SurfaceDesc,
        ctx: &RasterCtx<'_>,
        pool: &mut SurfacePool,
        failures: &mut u64,
    ) -> SlidecastResult<Self> {
        let mut surface = pool.borrow(desc)?;
        draw_components(&mut surface, components, ctx, failures);
        Ok(Self {
            key,
            surface: Arc::new(surface),
        })
    }

    pub(crate) fn is_valid_for(&self, key: &GroupKey, desc: SurfaceDesc) -> bool {
        self.key == *key && self.surface.desc() == desc
    }

    pub(crate) fn byte_len(&self) -> usize {
        self.surface.desc().byte_len()
    }

    /// Blend the cached pixels onto `target` at the origin.
    pub(crate) fn render(
        &self,
        target: &mut Surface,
        effect: TransitionKind,
        progress: f32,
    ) -> SlidecastResult<()> {
        effect.apply(target, &self.surface, progress)
    }

    pub(crate) fn invalidate(self, pool: &mut SurfacePool) {
        if let Ok(surface) = Arc::try_unwrap(self.surface) {
            pool.release(surface);
        }
    }
}

/// Cache state for one revision of a slide.
#[derive(Debug)]
pub(crate) struct SlideCache {
    desc: SurfaceDesc,
    entries: HashMap<ComponentId, RenderCacheEntry>,
    /// Components whose group failed to build; their groups stay live for the session.
    failed: HashSet<ComponentId>,
    last_used: u64,
}

impl SlideCache {
    pub(crate) fn new(desc: SurfaceDesc) -> Self {
        Self {
            desc,
            entries: HashMap::new(),
            failed: HashSet::new(),
            last_used: 0,
        }
    }

    /// Cache for a new revision of the same slide, sharing every entry and failure mark.
    pub(crate) fn fork(&self) -> Self {
        Self {
            desc: self.desc,
            entries: self.entries.clone(),
            failed: self.failed.clone(),
            last_used: 0,
        }
    }

    pub(crate) fn last_used(&self) -> u64 {
        self.last_used
    }

    pub(crate) fn touch(&mut self, stamp: u64) {
        self.last_used = stamp;
    }

    /// Entry buffers, possibly shared with other revisions.
    pub(crate) fn surfaces(&self) -> impl Iterator<Item = &Arc<Surface>> + '_ {
        self.entries.values().map(|e| &e.surface)
    }

    pub(crate) fn desc(&self) -> SurfaceDesc {
        self.desc
    }

    pub(crate) fn bytes(&self) -> usize {
        self.entries.values().map(RenderCacheEntry::byte_len).sum()
    }

    /// Switch to `desc`, discarding every entry. Returns how many were discarded.
    pub(crate) fn resize(&mut self, desc: SurfaceDesc, pool: &mut SurfacePool) -> u64 {
        self.desc = desc;
        self.clear(pool)
    }

    /// Discard every entry. Returns how many were discarded.
    pub(crate) fn clear(&mut self, pool: &mut SurfacePool) -> u64 {
        let n = self.entries.len() as u64;
        for (_, e) in self.entries.drain() {
            e.invalidate(pool);
        }
        n
    }

    pub(crate) fn has_failed(&self, group: &ComponentGroup) -> bool {
        group.key.iter().any(|(id, _)| self.failed.contains(id))
    }

    pub(crate) fn mark_failed(&mut self, group: &ComponentGroup) {
        self.failed.extend(group.key.iter().map(|(id, _)| *id));
    }

    /// Take the entry for `group` if it is still valid; a stale one is released and counted.
    pub(crate) fn take_valid(
        &mut self,
        group: &ComponentGroup,
        pool: &mut SurfacePool,
        invalidations: &mut u64,
    ) -> Option<RenderCacheEntry> {
        let anchor = group.anchor()?;
        let entry = self.entries.remove(&anchor)?;
        if entry.is_valid_for(&group.key, self.desc) {
            return Some(entry);
        }
        *invalidations += 1;
        tracing::debug!(anchor = anchor.get(), "render cache entry is stale");
        entry.invalidate(pool);
        None
    }

    pub(crate) fn put(&mut self, entry: RenderCacheEntry) -> SlidecastResult<()> {
        let anchor = entry
            .key
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| SlidecastError::cache("cache entry has an empty key"))?;
        self.entries.insert(anchor, entry);
        Ok(())
    }

    /// Release entries whose group no longer exists. Returns how many were released.
    pub(crate) fn sweep(&mut self, live: &HashSet<ComponentId>, pool: &mut SurfacePool) -> u64 {
        let stale: Vec<ComponentId> = self
            .entries
            .keys()
            .filter(|id| !live.contains(id))
            .copied()
            .collect();
        for id in &stale {
            if let Some(e) = self.entries.remove(id) {
                e.invalidate(pool);
            }
        }
        stale.len() as u64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cache.rs"]
mod tests;
