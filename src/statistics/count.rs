//! Counting scans

use crate::dispatch_scalar;
use crate::errors::{NdScanError, Result};
use crate::framework::{scan_single_input, ScanLine, ScanLineFilter, ScanOptions};
use crate::image::{Image, Sample};

struct CountFilter;

impl<S: Sample> ScanLineFilter<S> for CountFilter {
    type Acc = usize;

    fn operations_per_sample(&self) -> usize {
        2
    }

    fn init(&self) -> usize {
        0
    }

    fn filter(&self, line: &ScanLine<'_, S>, acc: &mut usize) {
        match &line.mask {
            Some(mask) => {
                for i in 0..line.input.len() {
                    if mask.get(i) && line.input.get(i).is_nonzero() {
                        *acc += 1;
                    }
                }
            }
            None => {
                for value in line.input.iter() {
                    if value.is_nonzero() {
                        *acc += 1;
                    }
                }
            }
        }
    }

    fn merge(&self, into: &mut usize, other: usize) {
        *into += other;
    }
}

/// Count the samples that are non-zero (and, when a mask is given, have a
/// true mask sample)
///
/// On a binary image this is the number of set pixels.
///
/// # Errors
///
/// Returns `NotForged` or `NotScalar` preconditions, mask validation
/// errors, or `UnsupportedDataType` for complex input.
pub fn count(input: &Image, mask: Option<&Image>) -> Result<usize> {
    if !input.is_forged() {
        return Err(NdScanError::NotForged { operand: "input" });
    }
    if !input.is_scalar() {
        return Err(NdScanError::NotScalar { operand: "input" });
    }
    macro_rules! run {
        ($ty:ty) => {
            scan_single_input::<$ty, _>(input, mask, &CountFilter, ScanOptions::default())
        };
    }
    dispatch_scalar!(input.data_type(), "count", run)
}
