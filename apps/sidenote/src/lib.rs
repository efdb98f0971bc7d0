//! sidenote — adaptive column pagination for explanation side panels.
//!
//! Given an explanation and the panel it must fit into, the engine estimates per-column
//! character capacity, fills the columns of a page, and spills the rest onto continuation
//! pages until all text is placed or the depth bound is reached. See
//! [`layout::PaginationEngine`] for the entry point and [`pool::PaginationPool`] for
//! running many paginations concurrently.

pub mod config;
pub mod document;
pub mod errors;
pub mod layout;
pub mod pool;
pub mod state;

pub use document::{plan_document, DocumentPlan, PanelSettings, SourcePage};
pub use errors::AppError;
pub use layout::{paginate, PaginationEngine, PaginationResult};
