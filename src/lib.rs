//! ndscan: N-dimensional image scanning and parallel statistics
//!
//! A Rust library for traversing N-dimensional dense arrays (images) one
//! line at a time and reducing them with numerically stable, mergeable
//! statistical accumulators, using parallel processing.
//!
//! ## Key Features
//!
//! - **Line-based traversal**: an N-dimensional scan decomposes into 1-D
//!   lines along the most cache-friendly dimension
//! - **Parallel reduction**: lines are statically partitioned across
//!   worker threads; per-thread partial results merge in a fixed order,
//!   so results are reproducible for a fixed thread count
//! - **Masked scans**: an optional boolean mask (with singleton
//!   broadcast) selects the samples that participate
//! - **Stable statistics**: count, min/max with position, sample
//!   statistics up to kurtosis, covariance, center of mass, and raw
//!   spatial moments, all as exactly mergeable sufficient statistics
//! - **Separable passes**: running reductions (cumulative sum) along any
//!   subset of dimensions
//!
//! ## Module Organization
//!
//! - [`image`]: the minimal N-dimensional image container and element
//!   type dispatch
//! - [`framework`]: the scan and separable traversal drivers
//! - [`accumulators`]: mergeable value-type accumulators
//! - [`statistics`]: the bundled statistical operations
//! - [`parallel`]: parallel processing configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust
//! use ndarray::ArrayD;
//! use ndscan::prelude::*;
//!
//! let data = ArrayD::from_shape_vec(vec![2, 3], vec![1.0_f64, 5.0, 2.0, 4.0, 3.0, 6.0]).unwrap();
//! let image = Image::from_array(&data);
//!
//! let stats = ndscan::statistics::sample_statistics(&image, None).unwrap();
//! assert_eq!(stats.number(), 6);
//! assert!((stats.mean() - 3.5).abs() < 1e-12);
//!
//! let at = ndscan::statistics::maximum_pixel(&image, None, TiePolicy::First).unwrap();
//! assert_eq!(at, vec![1, 2]);
//! ```

// Core modules
pub mod accumulators;
pub mod errors;
pub mod framework;
pub mod image;
pub mod parallel;
pub mod statistics;

// Direct re-exports for the public API
pub use accumulators::*;
pub use errors::*;
pub use framework::*;
pub use image::{DataType, Image, PixelType, Sample, SampleBuffer};
pub use parallel::*;
pub use statistics::*;

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::accumulators::{
        CovarianceAccumulator, MinMaxAccumulator, MomentAccumulator, StatisticsAccumulator,
    };
    pub use crate::errors::{NdScanError, Result};
    pub use crate::framework::{ScanLineFilter, ScanOptions, SeparableLineFilter};
    pub use crate::image::{DataType, Image};
    pub use crate::parallel::ParallelConfig;
    pub use crate::statistics::TiePolicy;
}
