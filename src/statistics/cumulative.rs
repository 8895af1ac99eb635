//! Running reductions along chosen dimensions

use crate::errors::{NdScanError, Result};
use crate::framework::{separable_inplace, SeparableLineFilter};
use crate::image::{DataType, Image, PixelType};
use ndarray::{ArrayD, ArrayViewMut1};
use num_complex::{Complex32, Complex64};
use num_traits::Zero;
use std::ops::AddAssign;

struct CumSumFilter;

impl<T> SeparableLineFilter<T> for CumSumFilter
where
    T: Copy + Zero + AddAssign + Send + Sync,
{
    fn operations_per_sample(&self) -> usize {
        1
    }

    fn filter_line(&self, line: &mut ArrayViewMut1<'_, T>) {
        let mut sum = T::zero();
        for value in line.iter_mut() {
            sum += *value;
            *value = sum;
        }
    }
}

/// Cumulative sum along every dimension flagged in `process`
///
/// The output holds the flex promotion of the input type (integers and
/// binary promote to F64, floating and complex types are kept). When a
/// mask is given, masked-out samples are first replaced by 0, the
/// additive identity, so the running sums skip them; the substitution is
/// fully materialized before the first pass. Tensor elements are summed
/// independently. With no flagged dimension the result is a plain
/// converted copy.
///
/// # Errors
///
/// Returns `NotForged`, `Dimensionality` (at least one dimension
/// required), a `process` length mismatch, or mask validation errors.
pub fn cumulative_sum(input: &Image, mask: Option<&Image>, process: &[bool]) -> Result<Image> {
    if !input.is_forged() {
        return Err(NdScanError::NotForged { operand: "input" });
    }
    let nd = input.dimensionality();
    if nd < 1 {
        return Err(NdScanError::Dimensionality {
            required: 1,
            actual: nd,
        });
    }
    if process.len() != nd {
        return Err(NdScanError::Generic(format!(
            "process array has {} entries, image has {nd} dimensions",
            process.len()
        )));
    }
    if let Some(m) = mask {
        m.check_is_mask(input.sizes())?;
    }
    let dims: Vec<usize> = (0..nd).filter(|&d| process[d]).collect();

    match input.data_type().suggest_flex() {
        DataType::F32 => run_pass::<f32>(&input.convert(DataType::F32)?, mask, &dims),
        DataType::F64 => run_pass::<f64>(&input.convert(DataType::F64)?, mask, &dims),
        DataType::C32 => run_pass::<Complex32>(input, mask, &dims),
        DataType::C64 => run_pass::<Complex64>(input, mask, &dims),
        other => Err(NdScanError::UnsupportedDataType {
            operation: "cumulative_sum",
            dtype: other,
        }),
    }
}

fn run_pass<T>(input: &Image, mask: Option<&Image>, dims: &[usize]) -> Result<Image>
where
    T: PixelType + Zero + AddAssign,
{
    let sizes = input.sizes().to_vec();
    let tensor = input.tensor_elements();

    // Work shape carries the tensor index as a trailing axis, which keeps
    // tensor elements out of the processed dimensions (scalar lines).
    let mut shape = sizes.clone();
    if tensor > 1 {
        shape.push(tensor);
    }

    let mut samples: Vec<T> = input.samples::<T>()?.to_vec();
    if let Some(m) = mask {
        let mask_strides = m.expanded_strides(&shape)?;
        substitute_identity(&mut samples, &shape, m.samples::<bool>()?, &mask_strides);
    }

    let mut work: ArrayD<T> = ArrayD::from_shape_vec(shape, samples)?;
    separable_inplace(&mut work, dims, &CumSumFilter)?;

    let samples: Vec<T> = work.iter().copied().collect();
    Image::from_samples(sizes, tensor, samples)
}

// Walks the samples in storage order with an odometer over the mask's
// broadcast strides, zeroing every masked-out sample.
fn substitute_identity<T: Zero + Copy>(
    samples: &mut [T],
    shape: &[usize],
    mask: &[bool],
    mask_strides: &[isize],
) {
    let nd = shape.len();
    let mut position = vec![0_usize; nd];
    let mut offset = 0_isize;
    for sample in samples.iter_mut() {
        if !mask[offset as usize] {
            *sample = T::zero();
        }
        for d in (0..nd).rev() {
            position[d] += 1;
            offset += mask_strides[d];
            if position[d] < shape[d] {
                break;
            }
            position[d] = 0;
            offset -= mask_strides[d] * shape[d] as isize;
        }
    }
}
