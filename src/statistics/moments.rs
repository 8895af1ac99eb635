//! Sample statistics, covariance, and spatial moments

use crate::accumulators::{CovarianceAccumulator, MomentAccumulator, StatisticsAccumulator};
use crate::dispatch_real;
use crate::dispatch_scalar;
use crate::errors::{NdScanError, Result};
use crate::framework::{scan, scan_single_input, ScanLine, ScanLineFilter, ScanOptions};
use crate::image::{DataType, Image, Sample};

struct SampleStatisticsFilter;

impl<S: Sample> ScanLineFilter<S> for SampleStatisticsFilter {
    type Acc = StatisticsAccumulator;

    fn operations_per_sample(&self) -> usize {
        23
    }

    fn init(&self) -> StatisticsAccumulator {
        StatisticsAccumulator::new()
    }

    fn filter(&self, line: &ScanLine<'_, S>, acc: &mut StatisticsAccumulator) {
        match &line.mask {
            Some(mask) => {
                for i in 0..line.input.len() {
                    if mask.get(i) {
                        acc.push(line.input.get(i).to_f64());
                    }
                }
            }
            None => {
                for value in line.input.iter() {
                    acc.push(value.to_f64());
                }
            }
        }
    }

    fn merge(&self, into: &mut StatisticsAccumulator, other: StatisticsAccumulator) {
        *into += other;
    }
}

/// Single-pass mean, variance, skewness, and kurtosis over all samples
///
/// Tensor-valued pixels span all their samples.
///
/// # Errors
///
/// Returns `NotForged` precondition, mask validation errors, or
/// `UnsupportedDataType` for binary and complex input.
pub fn sample_statistics(input: &Image, mask: Option<&Image>) -> Result<StatisticsAccumulator> {
    if !input.is_forged() {
        return Err(NdScanError::NotForged { operand: "input" });
    }
    let options = ScanOptions {
        tensor_as_spatial_dim: true,
        ..ScanOptions::default()
    };
    macro_rules! run {
        ($ty:ty) => {
            scan_single_input::<$ty, _>(input, mask, &SampleStatisticsFilter, options)
        };
    }
    dispatch_real!(input.data_type(), "sample_statistics", run)
}

struct CovarianceFilter;

impl<S: Sample> ScanLineFilter<S> for CovarianceFilter {
    type Acc = CovarianceAccumulator;

    fn operations_per_sample(&self) -> usize {
        10
    }

    fn init(&self) -> CovarianceAccumulator {
        CovarianceAccumulator::new()
    }

    fn filter(&self, line: &ScanLine<'_, S>, acc: &mut CovarianceAccumulator) {
        let Some(second) = line.second.as_ref() else {
            return;
        };
        match &line.mask {
            Some(mask) => {
                for i in 0..line.input.len() {
                    if mask.get(i) {
                        acc.push(line.input.get(i).to_f64(), second.get(i).to_f64());
                    }
                }
            }
            None => {
                for i in 0..line.input.len() {
                    acc.push(line.input.get(i).to_f64(), second.get(i).to_f64());
                }
            }
        }
    }

    fn merge(&self, into: &mut CovarianceAccumulator, other: CovarianceAccumulator) {
        *into += other;
    }
}

/// Single-pass covariance between two images of equal sizes and tensor
/// arity
///
/// Operands with different data types are promoted to a common real type
/// before the scan. Tensor-valued pixels span all their samples.
///
/// # Errors
///
/// Returns `NotForged` for either operand, `SizesDontMatch` on property
/// disagreement, mask validation errors, or `UnsupportedDataType` for
/// binary and complex operands.
pub fn covariance(
    input1: &Image,
    input2: &Image,
    mask: Option<&Image>,
) -> Result<CovarianceAccumulator> {
    if !input1.is_forged() || !input2.is_forged() {
        return Err(NdScanError::NotForged { operand: "input" });
    }
    input1.compare_properties(input2)?;
    // Binary and complex operands are rejected regardless of whether the
    // two data types happen to match.
    for operand in [input1, input2] {
        if !operand.data_type().is_real() {
            return Err(NdScanError::UnsupportedDataType {
                operation: "covariance",
                dtype: operand.data_type(),
            });
        }
    }
    let options = ScanOptions {
        tensor_as_spatial_dim: true,
        ..ScanOptions::default()
    };
    // Mixed data types scan over materialized F64 copies of both operands.
    let promoted;
    let (a, b) = if input1.data_type() == input2.data_type() {
        (input1, input2)
    } else {
        promoted = (input1.convert(DataType::F64)?, input2.convert(DataType::F64)?);
        (&promoted.0, &promoted.1)
    };
    macro_rules! run {
        ($ty:ty) => {
            scan::<$ty, _>(&[a, b], mask, &CovarianceFilter, options)
        };
    }
    dispatch_real!(a.data_type(), "covariance", run)
}

struct CenterOfMassFilter {
    nd: usize,
}

impl<S: Sample> ScanLineFilter<S> for CenterOfMassFilter {
    /// Per-axis sums of value times position, then the value sum, nd+1
    /// entries in total
    type Acc = Vec<f64>;

    fn operations_per_sample(&self) -> usize {
        self.nd + 1
    }

    fn init(&self) -> Vec<f64> {
        vec![0.0; self.nd + 1]
    }

    fn filter(&self, line: &ScanLine<'_, S>, acc: &mut Vec<f64>) {
        let mut position = line.position.clone();
        let dim = line.dimension;
        for i in 0..line.input.len() {
            let selected = line.mask.as_ref().map_or(true, |mask| mask.get(i));
            if selected {
                let value = line.input.get(i).to_f64();
                for (j, &p) in position.iter().enumerate() {
                    acc[j] += p as f64 * value;
                }
                acc[self.nd] += value;
            }
            position[dim] += 1;
        }
    }

    fn merge(&self, into: &mut Vec<f64>, other: Vec<f64>) {
        for (a, b) in into.iter_mut().zip(other) {
            *a += b;
        }
    }
}

/// Intensity-weighted mean position, one coordinate per dimension
///
/// When the total mass is exactly zero the result is the zero vector
/// rather than a division by zero.
///
/// # Errors
///
/// Returns `NotForged`/`NotScalar` preconditions, mask validation errors,
/// or `UnsupportedDataType` for complex input.
pub fn center_of_mass(input: &Image, mask: Option<&Image>) -> Result<Vec<f64>> {
    if !input.is_forged() {
        return Err(NdScanError::NotForged { operand: "input" });
    }
    if !input.is_scalar() {
        return Err(NdScanError::NotScalar { operand: "input" });
    }
    let nd = input.dimensionality();
    let filter = CenterOfMassFilter { nd };
    let options = ScanOptions {
        need_coordinates: true,
        ..ScanOptions::default()
    };
    macro_rules! run {
        ($ty:ty) => {
            scan_single_input::<$ty, _>(input, mask, &filter, options)
        };
    }
    let sums = dispatch_scalar!(input.data_type(), "center_of_mass", run)?;
    let mass = sums[nd];
    if mass != 0.0 {
        Ok(sums[..nd].iter().map(|&s| s / mass).collect())
    } else {
        Ok(vec![0.0; nd])
    }
}

struct MomentsFilter {
    nd: usize,
}

impl<S: Sample> ScanLineFilter<S> for MomentsFilter {
    type Acc = MomentAccumulator;

    fn operations_per_sample(&self) -> usize {
        // One multiply-accumulate per distinct second-order cross term,
        // plus the first-order terms and the mass sum.
        self.nd * (self.nd + 1) / 2 * 3 + self.nd + 2
    }

    fn init(&self) -> MomentAccumulator {
        MomentAccumulator::new(self.nd)
    }

    fn filter(&self, line: &ScanLine<'_, S>, acc: &mut MomentAccumulator) {
        let mut position: Vec<f64> = line.position.iter().map(|&p| p as f64).collect();
        let dim = line.dimension;
        for i in 0..line.input.len() {
            let selected = line.mask.as_ref().map_or(true, |mask| mask.get(i));
            if selected {
                acc.push(&position, line.input.get(i).to_f64());
            }
            position[dim] += 1.0;
        }
    }

    fn merge(&self, into: &mut MomentAccumulator, other: MomentAccumulator) {
        *into += other;
    }
}

/// Raw spatial moments of the sample intensities up to 2nd order
///
/// # Errors
///
/// Same conditions as [`center_of_mass`].
pub fn moments(input: &Image, mask: Option<&Image>) -> Result<MomentAccumulator> {
    if !input.is_forged() {
        return Err(NdScanError::NotForged { operand: "input" });
    }
    if !input.is_scalar() {
        return Err(NdScanError::NotScalar { operand: "input" });
    }
    let filter = MomentsFilter {
        nd: input.dimensionality(),
    };
    let options = ScanOptions {
        need_coordinates: true,
        ..ScanOptions::default()
    };
    macro_rules! run {
        ($ty:ty) => {
            scan_single_input::<$ty, _>(input, mask, &filter, options)
        };
    }
    dispatch_scalar!(input.data_type(), "moments", run)
}
