//! Scan driver: line-by-line traversal with fork-join reduction
//!
//! The driver decomposes an N-dimensional traversal into 1-D lines along
//! the dimension with the smallest stride, statically partitions the line
//! range into one contiguous chunk per worker, and hands each worker an
//! exclusively owned accumulator slot. After the parallel phase joins,
//! the slots are folded in index order 0..T-1, so the floating-point
//! result is reproducible for a fixed input and thread count regardless
//! of runtime scheduling.

use crate::errors::{NdScanError, Result};
use crate::image::{Image, Sample};
use rayon::prelude::*;

/// Work below this estimated operation count runs single-threaded
pub(crate) const PARALLEL_MIN_OPERATIONS: usize = 1 << 16;

/// Non-owning view of one line of samples
///
/// `stride` is in samples and may be 0 for a broadcast (singleton
/// expanded) dimension, in which case every index reads the same sample.
#[derive(Debug, Clone, Copy)]
pub struct LineView<'a, S> {
    slice: &'a [S],
    offset: usize,
    stride: isize,
    length: usize,
}

impl<'a, S: Copy> LineView<'a, S> {
    /// View of `length` samples starting at `offset`, `stride` apart
    #[must_use]
    pub fn new(slice: &'a [S], offset: usize, stride: isize, length: usize) -> Self {
        Self {
            slice,
            offset,
            stride,
            length,
        }
    }

    /// Number of samples along the line
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    /// True when the line holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The sample stride in the underlying buffer
    #[must_use]
    pub fn stride(&self) -> isize {
        self.stride
    }

    /// Sample at line index `index`
    #[must_use]
    pub fn get(&self, index: usize) -> S {
        let at = self.offset as isize + index as isize * self.stride;
        self.slice[at as usize]
    }

    /// Iterate the samples in line order
    pub fn iter(&self) -> impl Iterator<Item = S> + '_ {
        let view = *self;
        (0..self.length).map(move |i| view.get(i))
    }
}

/// Per-line parameters handed to a [`ScanLineFilter`]
pub struct ScanLine<'a, S> {
    /// Primary input line
    pub input: LineView<'a, S>,
    /// Second input line, present for dyadic scans
    pub second: Option<LineView<'a, S>>,
    /// Mask line; samples with a false mask are excluded
    pub mask: Option<LineView<'a, bool>>,
    /// N-D position of the line's first sample; empty unless the scan was
    /// started with `need_coordinates`
    pub position: Vec<usize>,
    /// Index of the scanned dimension
    pub dimension: usize,
}

/// Options recognized by the scan driver
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Maintain the absolute N-D position of each line start
    pub need_coordinates: bool,
    /// Treat the tensor index as an extra spatial dimension, letting the
    /// filter span all samples of tensor-valued pixels
    pub tensor_as_spatial_dim: bool,
}

/// A type-specialized unit of work applied once per line
///
/// The driver owns one `Acc` slot per worker; `filter` only ever sees the
/// slot of the worker processing the line, and `merge` runs after the
/// join, in slot index order.
pub trait ScanLineFilter<S: Sample>: Sync {
    /// Per-thread partial state
    type Acc: Send;

    /// Cost estimation hint in operations per sample; only used to decide
    /// whether parallelism is worth engaging
    fn operations_per_sample(&self) -> usize {
        1
    }

    /// Fresh per-thread state, valid as the result of an empty scan
    fn init(&self) -> Self::Acc;

    /// Process one line into the worker's state
    fn filter(&self, line: &ScanLine<'_, S>, acc: &mut Self::Acc);

    /// Fold another worker's state into `into`
    fn merge(&self, into: &mut Self::Acc, other: Self::Acc);
}

/// One operand of a scan: typed samples plus strides over the scan layout
struct Operand<'a, S> {
    slice: &'a [S],
    strides: Vec<isize>,
}

/// Scan a single input, optionally masked
///
/// # Errors
///
/// Propagates the precondition and mask errors of [`scan`].
pub fn scan_single_input<S, F>(
    input: &Image,
    mask: Option<&Image>,
    filter: &F,
    options: ScanOptions,
) -> Result<F::Acc>
where
    S: Sample,
    F: ScanLineFilter<S>,
{
    scan(&[input], mask, filter, options)
}

/// Scan one or more equally-sized inputs, optionally masked
///
/// All inputs must share the primary input's sizes, tensor arity, and
/// element type `S`. The mask is validated and broadcast-expanded before
/// any line is visited, so a failing scan has no partial effects.
///
/// # Errors
///
/// Returns `NotForged` for an unforged operand, `NotScalar` when a
/// tensor-valued input is scanned without `tensor_as_spatial_dim`,
/// `SizesDontMatch` for disagreeing operands, and the mask errors of
/// [`Image::check_is_mask`].
pub fn scan<S, F>(
    inputs: &[&Image],
    mask: Option<&Image>,
    filter: &F,
    options: ScanOptions,
) -> Result<F::Acc>
where
    S: Sample,
    F: ScanLineFilter<S>,
{
    let primary = inputs
        .first()
        .ok_or(NdScanError::Generic("scan needs at least one input".into()))?;
    for input in inputs {
        if !input.is_forged() {
            return Err(NdScanError::NotForged { operand: "input" });
        }
        primary.compare_properties(input)?;
    }
    if primary.tensor_elements() > 1 && !options.tensor_as_spatial_dim {
        return Err(NdScanError::NotScalar { operand: "input" });
    }

    // Layout over which lines are decomposed; the tensor index rides as a
    // trailing dimension when requested.
    let mut sizes = primary.sizes().to_vec();
    let tensor_dim = options.tensor_as_spatial_dim && primary.tensor_elements() > 1;
    if tensor_dim {
        sizes.push(primary.tensor_elements());
    }
    // A 0-d image still holds one pixel; scan it as a single length-1 line.
    let zero_dim = sizes.is_empty();
    if zero_dim {
        sizes.push(1);
    }

    let mut operands = Vec::with_capacity(inputs.len());
    for input in inputs {
        let mut strides = input.strides();
        if tensor_dim {
            strides.push(input.tensor_stride());
        }
        if zero_dim {
            strides.push(0);
        }
        operands.push(Operand {
            slice: input.samples::<S>()?,
            strides,
        });
    }

    let mask_operand = match mask {
        Some(m) => {
            m.check_is_mask(primary.sizes())?;
            Some(Operand {
                slice: m.samples::<bool>()?,
                strides: m.expanded_strides(&sizes)?,
            })
        }
        None => None,
    };

    run_scan(&sizes, &operands, mask_operand.as_ref(), filter, options)
}

fn run_scan<S, F>(
    sizes: &[usize],
    operands: &[Operand<'_, S>],
    mask: Option<&Operand<'_, bool>>,
    filter: &F,
    options: ScanOptions,
) -> Result<F::Acc>
where
    S: Sample,
    F: ScanLineFilter<S>,
{
    let nd = sizes.len();
    if sizes.contains(&0) {
        return Ok(filter.init());
    }

    // Scan along the dimension with the smallest stride of the primary
    // operand, which is the innermost memory order.
    let scan_dim = operands[0]
        .strides
        .iter()
        .enumerate()
        .min_by_key(|(_, s)| s.unsigned_abs())
        .map(|(d, _)| d)
        .unwrap_or(0);
    let line_length = sizes[scan_dim];
    let line_count: usize = sizes
        .iter()
        .enumerate()
        .filter(|&(d, _)| d != scan_dim)
        .map(|(_, &s)| s)
        .product();

    let total_operations = line_count
        .saturating_mul(line_length)
        .saturating_mul(filter.operations_per_sample());
    let threads = if total_operations < PARALLEL_MIN_OPERATIONS {
        1
    } else {
        rayon::current_num_threads().min(line_count).max(1)
    };

    let mut slots: Vec<F::Acc> = (0..threads).map(|_| filter.init()).collect();
    slots.par_iter_mut().enumerate().for_each(|(slot, acc)| {
        let begin = line_count * slot / threads;
        let end = line_count * (slot + 1) / threads;
        scan_chunk(
            sizes, operands, mask, scan_dim, begin, end, filter, options, acc,
        );
    });

    // Deterministic fold in slot index order.
    let mut slots = slots.into_iter();
    let Some(mut result) = slots.next() else {
        return Ok(filter.init());
    };
    for partial in slots {
        filter.merge(&mut result, partial);
    }
    Ok(result)
}

#[allow(clippy::too_many_arguments)]
fn scan_chunk<S, F>(
    sizes: &[usize],
    operands: &[Operand<'_, S>],
    mask: Option<&Operand<'_, bool>>,
    scan_dim: usize,
    begin: usize,
    end: usize,
    filter: &F,
    options: ScanOptions,
    acc: &mut F::Acc,
) where
    S: Sample,
    F: ScanLineFilter<S>,
{
    let nd = sizes.len();
    let line_length = sizes[scan_dim];

    // Unrank the chunk's first line index into an N-D position (the scan
    // dimension stays at 0), then walk lines with an odometer increment.
    let mut position = vec![0_usize; nd];
    let mut remaining = begin;
    for d in (0..nd).rev() {
        if d == scan_dim {
            continue;
        }
        position[d] = remaining % sizes[d];
        remaining /= sizes[d];
    }

    let mut offsets: Vec<isize> = operands
        .iter()
        .map(|op| dot_offset(&position, &op.strides))
        .collect();
    let mut mask_offset = mask.map(|m| dot_offset(&position, &m.strides));

    for _ in begin..end {
        let input = LineView::new(
            operands[0].slice,
            offsets[0] as usize,
            operands[0].strides[scan_dim],
            line_length,
        );
        let second = operands.get(1).map(|op| {
            LineView::new(
                op.slice,
                offsets[1] as usize,
                op.strides[scan_dim],
                line_length,
            )
        });
        let mask_view = mask.map(|m| {
            LineView::new(
                m.slice,
                mask_offset.unwrap_or(0) as usize,
                m.strides[scan_dim],
                line_length,
            )
        });
        let line = ScanLine {
            input,
            second,
            mask: mask_view,
            position: if options.need_coordinates {
                position.clone()
            } else {
                Vec::new()
            },
            dimension: scan_dim,
        };
        filter.filter(&line, acc);

        // Odometer step over all dimensions but the scanned one.
        for d in (0..nd).rev() {
            if d == scan_dim {
                continue;
            }
            position[d] += 1;
            for (offset, op) in offsets.iter_mut().zip(operands) {
                *offset += op.strides[d];
            }
            if let (Some(offset), Some(m)) = (mask_offset.as_mut(), mask) {
                *offset += m.strides[d];
            }
            if position[d] < sizes[d] {
                break;
            }
            position[d] = 0;
            for (offset, op) in offsets.iter_mut().zip(operands) {
                *offset -= op.strides[d] * sizes[d] as isize;
            }
            if let (Some(offset), Some(m)) = (mask_offset.as_mut(), mask) {
                *offset -= m.strides[d] * sizes[d] as isize;
            }
        }
    }
}

fn dot_offset(position: &[usize], strides: &[isize]) -> isize {
    position
        .iter()
        .zip(strides)
        .map(|(&p, &s)| p as isize * s)
        .sum()
}
