//! CPU rendering: surfaces, the surface pool, component rasterization and the cached compositor.

pub(crate) mod cache;
/// Slide compositor and its statistics.
pub mod compositor;
pub(crate) mod raster;
/// Offscreen surfaces and detached frames.
pub mod surface;
pub(crate) mod surface_pool;
