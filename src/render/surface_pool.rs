use std::collections::HashMap;

use crate::render::surface::{Surface, SurfaceDesc};

/// Pool configuration for cached surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SurfacePoolOpts {
    /// Maximum bytes retained across all buckets.
    pub max_pool_bytes: usize,
    /// Maximum number of retained surfaces per (w,h,format) bucket.
    pub max_surfaces_per_bucket: usize,
}

impl Default for SurfacePoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 256 * 1024 * 1024,
            max_surfaces_per_bucket: 8,
        }
    }
}

/// Allocation counters for a [`SurfacePool`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SurfacePoolStats {
    /// Surfaces currently parked in the pool.
    pub retained_surfaces: usize,
    /// Bytes currently parked in the pool.
    pub retained_bytes: usize,
    /// Fresh allocations made by `borrow`.
    pub alloc_surfaces: u64,
    /// Bytes allocated by `borrow`.
    pub alloc_bytes: u64,
    /// `borrow` calls satisfied from the pool.
    pub reused_surfaces: u64,
    /// Surfaces freed on release because a cap was hit.
    pub dropped_on_release: u64,
}

#[derive(Debug)]
struct Bucket {
    buffers: Vec<Vec<u8>>,
}

/// Bounded pool of offscreen buffers keyed by [`SurfaceDesc`].
///
/// Cache entries and per-frame scratch surfaces are borrowed here and handed back when they are
/// discarded, so steady-state presentation does not allocate. Borrowed surfaces are always
/// cleared to transparent.
#[derive(Debug)]
pub(crate) struct SurfacePool {
    opts: SurfacePoolOpts,
    stats: SurfacePoolStats,
    buckets: HashMap<SurfaceDesc, Bucket>,
}

impl SurfacePool {
    pub(crate) fn new(opts: SurfacePoolOpts) -> Self {
        Self {
            opts,
            stats: SurfacePoolStats::default(),
            buckets: HashMap::new(),
        }
    }

    pub(crate) fn stats(&self) -> SurfacePoolStats {
        self.stats
    }

    pub(crate) fn borrow(
        &mut self,
        desc: SurfaceDesc,
    ) -> crate::foundation::error::SlidecastResult<Surface> {
        desc.validate()?;
        if let Some(mut buf) = self.buckets.get_mut(&desc).and_then(|b| b.buffers.pop()) {
            self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_sub(1);
            self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(desc.byte_len());
            self.stats.reused_surfaces = self.stats.reused_surfaces.saturating_add(1);
            buf.fill(0);
            return Ok(Surface::from_pooled(desc, buf));
        }

        self.stats.alloc_surfaces = self.stats.alloc_surfaces.saturating_add(1);
        self.stats.alloc_bytes = self
            .stats
            .alloc_bytes
            .saturating_add(desc.byte_len() as u64);
        Surface::with_desc(desc)
    }

    pub(crate) fn release(&mut self, surface: Surface) {
        if self.opts.max_pool_bytes == 0 || self.opts.max_surfaces_per_bucket == 0 {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let desc = surface.desc();
        let bytes = desc.byte_len();
        if self.stats.retained_bytes.saturating_add(bytes) > self.opts.max_pool_bytes {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bucket = self.buckets.entry(desc).or_insert_with(|| Bucket {
            buffers: Vec::new(),
        });
        if bucket.buffers.len() >= self.opts.max_surfaces_per_bucket {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        bucket.buffers.push(surface.into_data());
        self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_add(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(bytes);
    }
}
