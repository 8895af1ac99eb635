//! Separable driver: one full pass per processed dimension
//!
//! A separable pass applies a 1-D line filter along one dimension, with
//! all other indices held fixed, and the passes for several dimensions
//! run back to back over the same storage (input and output alias). Each
//! pass chunks the work array along a non-processed axis, one contiguous
//! chunk per worker; the chunks are disjoint views, so no two workers
//! ever write the same lane. Within a chunk, lanes run sequentially.
//!
//! Masked variants must substitute the operation's identity element into
//! masked-out samples before the first pass starts; the driver itself
//! never sees a mask.

use crate::errors::{NdScanError, Result};
use crate::framework::scan::PARALLEL_MIN_OPERATIONS;
use ndarray::parallel::prelude::*;
use ndarray::{ArrayD, ArrayViewMut1, Axis};

/// A 1-D unit of work applied in place to each lane of a pass
pub trait SeparableLineFilter<T>: Sync {
    /// Cost estimation hint in operations per sample
    fn operations_per_sample(&self) -> usize {
        1
    }

    /// Process one lane in place; the lane is both input and output
    fn filter_line(&self, line: &mut ArrayViewMut1<'_, T>);
}

/// Run one in-place pass per dimension in `dims`, in the given order
///
/// Tensor elements, when carried as a trailing axis of `work`, are simply
/// never listed in `dims`, which makes every lane an independent scalar
/// line.
///
/// # Errors
///
/// Returns `InvalidDimension` when a dimension index is out of range.
pub fn separable_inplace<T, F>(work: &mut ArrayD<T>, dims: &[usize], filter: &F) -> Result<()>
where
    T: Send + Sync,
    F: SeparableLineFilter<T>,
{
    let ndim = work.ndim();
    for &dim in dims {
        if dim >= ndim {
            return Err(NdScanError::InvalidDimension {
                dimension: dim,
                ndim,
            });
        }
    }
    let total_operations = work
        .len()
        .saturating_mul(filter.operations_per_sample());
    for &dim in dims {
        // Chunk along the longest non-processed axis so each worker gets a
        // contiguous block of whole lanes.
        let chunk_axis = (0..ndim)
            .filter(|&d| d != dim)
            .max_by_key(|&d| work.len_of(Axis(d)));
        match chunk_axis {
            Some(axis)
                if total_operations >= PARALLEL_MIN_OPERATIONS && work.len_of(Axis(axis)) > 1 =>
            {
                let length = work.len_of(Axis(axis));
                let workers = rayon::current_num_threads().max(1);
                let chunk = (length + workers - 1) / workers;
                work.axis_chunks_iter_mut(Axis(axis), chunk)
                    .into_par_iter()
                    .for_each(|mut block| {
                        for mut lane in block.lanes_mut(Axis(dim)) {
                            filter.filter_line(&mut lane);
                        }
                    });
            }
            _ => {
                for mut lane in work.lanes_mut(Axis(dim)) {
                    filter.filter_line(&mut lane);
                }
            }
        }
    }
    Ok(())
}
