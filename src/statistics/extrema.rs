//! Extreme values and their positions

use crate::accumulators::MinMaxAccumulator;
use crate::dispatch_real;
use crate::dispatch_scalar;
use crate::errors::{NdScanError, Result};
use crate::framework::{scan_single_input, ScanLine, ScanLineFilter, ScanOptions};
use crate::image::{Image, Sample};

/// Which occurrence of a tied extreme value is reported
///
/// `First` uses strict comparisons both inside a worker's scan and in the
/// cross-worker merge, so the earliest extreme in scan order wins; `Last`
/// uses non-strict comparisons, so the latest wins. The direction is a
/// tested contract, not a comparator detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiePolicy {
    /// Report the first occurrence in scan order
    #[default]
    First,
    /// Report the last occurrence in scan order
    Last,
}

#[derive(Clone, Copy)]
enum Direction {
    Maximum,
    Minimum,
}

struct ExtremePixelFilter {
    direction: Direction,
    tie: TiePolicy,
}

impl ExtremePixelFilter {
    /// True when `candidate` displaces `current` under the direction and
    /// tie policy
    fn displaces(&self, candidate: f64, current: f64) -> bool {
        match (self.direction, self.tie) {
            (Direction::Maximum, TiePolicy::First) => candidate > current,
            (Direction::Maximum, TiePolicy::Last) => candidate >= current,
            (Direction::Minimum, TiePolicy::First) => candidate < current,
            (Direction::Minimum, TiePolicy::Last) => candidate <= current,
        }
    }
}

/// Best value seen by one worker and where it was; `None` until the
/// worker sees its first (unmasked) sample
type ExtremeState = Option<(f64, Vec<usize>)>;

impl<S: Sample> ScanLineFilter<S> for ExtremePixelFilter {
    type Acc = ExtremeState;

    fn operations_per_sample(&self) -> usize {
        2
    }

    fn init(&self) -> ExtremeState {
        None
    }

    fn filter(&self, line: &ScanLine<'_, S>, acc: &mut ExtremeState) {
        for i in 0..line.input.len() {
            if let Some(mask) = &line.mask {
                if !mask.get(i) {
                    continue;
                }
            }
            let value = line.input.get(i).to_f64();
            let take = match acc {
                None => true,
                Some((current, _)) => self.displaces(value, *current),
            };
            if take {
                let mut coord = line.position.clone();
                coord[line.dimension] += i;
                *acc = Some((value, coord));
            }
        }
    }

    fn merge(&self, into: &mut ExtremeState, other: ExtremeState) {
        if let Some((value, coord)) = other {
            let take = match into {
                None => true,
                Some((current, _)) => self.displaces(value, *current),
            };
            if take {
                *into = Some((value, coord));
            }
        }
    }
}

fn extreme_pixel(
    input: &Image,
    mask: Option<&Image>,
    direction: Direction,
    tie: TiePolicy,
    operation: &'static str,
) -> Result<Vec<usize>> {
    if !input.is_forged() {
        return Err(NdScanError::NotForged { operand: "input" });
    }
    if !input.is_scalar() {
        return Err(NdScanError::NotScalar { operand: "input" });
    }
    let filter = ExtremePixelFilter { direction, tie };
    let options = ScanOptions {
        need_coordinates: true,
        ..ScanOptions::default()
    };
    macro_rules! run {
        ($ty:ty) => {
            scan_single_input::<$ty, _>(input, mask, &filter, options)
        };
    }
    let state = dispatch_real!(input.data_type(), operation, run)?;
    // An empty image or an all-false mask has no extreme position.
    Ok(state.map(|(_, coord)| coord).unwrap_or_default())
}

/// Position of the largest sample
///
/// On ties, `tie` selects the first or last occurrence in scan order.
/// Returns an empty vector when no sample is selected (empty image or
/// all-false mask).
///
/// # Errors
///
/// Returns `NotForged`/`NotScalar` preconditions, mask errors, or
/// `UnsupportedDataType` for binary and complex input.
pub fn maximum_pixel(input: &Image, mask: Option<&Image>, tie: TiePolicy) -> Result<Vec<usize>> {
    extreme_pixel(input, mask, Direction::Maximum, tie, "maximum_pixel")
}

/// Position of the smallest sample
///
/// Same contract as [`maximum_pixel`], with the comparisons mirrored.
///
/// # Errors
///
/// Same conditions as [`maximum_pixel`].
pub fn minimum_pixel(input: &Image, mask: Option<&Image>, tie: TiePolicy) -> Result<Vec<usize>> {
    extreme_pixel(input, mask, Direction::Minimum, tie, "minimum_pixel")
}

struct MinMaxFilter;

impl<S: Sample> ScanLineFilter<S> for MinMaxFilter {
    type Acc = MinMaxAccumulator;

    fn operations_per_sample(&self) -> usize {
        3
    }

    fn init(&self) -> MinMaxAccumulator {
        MinMaxAccumulator::new()
    }

    fn filter(&self, line: &ScanLine<'_, S>, acc: &mut MinMaxAccumulator) {
        match &line.mask {
            Some(mask) => {
                for i in 0..line.input.len() {
                    if mask.get(i) {
                        acc.push(line.input.get(i).to_f64());
                    }
                }
            }
            None => {
                // Two samples per iteration; the odd tail is pushed singly.
                let length = line.input.len();
                let mut i = 0;
                while i + 1 < length {
                    acc.push_pair(line.input.get(i).to_f64(), line.input.get(i + 1).to_f64());
                    i += 2;
                }
                if i < length {
                    acc.push(line.input.get(i).to_f64());
                }
            }
        }
    }

    fn merge(&self, into: &mut MinMaxAccumulator, other: MinMaxAccumulator) {
        *into += other;
    }
}

/// Smallest and largest sample in a single pass
///
/// Complex images are split into real/imaginary parts along an added
/// trailing dimension first; tensor-valued pixels span all samples.
///
/// # Errors
///
/// Returns `NotForged` precondition or mask validation errors.
pub fn maximum_and_minimum(input: &Image, mask: Option<&Image>) -> Result<MinMaxAccumulator> {
    if !input.is_forged() {
        return Err(NdScanError::NotForged { operand: "input" });
    }
    // The mask is singleton-expanded along the dimension the split adds.
    let real_input = input.split_complex()?;
    let options = ScanOptions {
        tensor_as_spatial_dim: true,
        ..ScanOptions::default()
    };
    macro_rules! run {
        ($ty:ty) => {
            scan_single_input::<$ty, _>(&real_input, mask, &MinMaxFilter, options)
        };
    }
    dispatch_scalar!(real_input.data_type(), "maximum_and_minimum", run)
}
