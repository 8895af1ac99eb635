//! Traversal drivers
//!
//! Two drivers decompose N-dimensional work into 1-D lines:
//!
//! - [`scan`]: pure-reduction traversal with per-worker accumulator slots
//!   merged deterministically after a join barrier
//! - [`separable`]: repeated in-place passes, one per processed dimension
//!
//! Both guarantee that every line is visited exactly once by exactly one
//! worker and that no two workers touch overlapping output regions.

pub mod scan;
pub mod separable;

pub use scan::{scan, scan_single_input, LineView, ScanLine, ScanLineFilter, ScanOptions};
pub use separable::{separable_inplace, SeparableLineFilter};
