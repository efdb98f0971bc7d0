// Pagination core: capacity estimation, column allocation, overflow detection and the
// continuation planner. Everything here is synchronous and CPU-bound; async callers go
// through `crate::pool`, which runs it inside tokio::task::spawn_blocking.

pub mod allocator;
pub mod capacity;
pub mod continuation;
pub mod engine;
pub mod font_metrics;
pub mod page_fill;
pub mod template_cache;
pub mod tuning;

// Re-export the public API consumed by the document planner and the worker pool.
pub use capacity::CapacityEstimate;
pub use continuation::{PageBlock, PaginationResult, TextSegment};
pub use engine::{paginate, PaginationEngine};
pub use font_metrics::{ContentMode, FontStyle, LayoutRegion, ScriptProfile};
pub use page_fill::PageFillAnalysis;
pub use template_cache::LayoutTemplateCache;
pub use tuning::LayoutTuning;
