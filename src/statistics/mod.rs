//! Statistical operations over N-dimensional images
//!
//! Every operation in this module is a thin precondition layer over a
//! type-specialized line filter driven by the scan or separable driver:
//! checks run before any line is visited, the filter accumulates
//! per-worker partial state, and the driver merges the partials in a
//! fixed order.
//!
//! # Organization
//!
//! - [`count`]: counting set/non-zero samples
//! - [`extrema`]: extreme values and their positions
//! - [`moments`]: sample statistics, covariance, center of mass, spatial
//!   moments
//! - [`cumulative`]: running reductions along chosen dimensions

pub mod count;
pub mod cumulative;
pub mod extrema;
pub mod moments;

// Re-export the main operations for convenience
pub use count::count;
pub use cumulative::cumulative_sum;
pub use extrema::{maximum_and_minimum, maximum_pixel, minimum_pixel, TiePolicy};
pub use moments::{center_of_mass, covariance, moments, sample_statistics};
