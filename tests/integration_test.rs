//! End-to-end tests for ndscan's statistical operations
//!
//! These tests run the full pipeline: image construction, precondition
//! checks, the scan/separable drivers, filter dispatch, and the merged
//! results.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use ndarray::ArrayD;
use ndscan::errors::NdScanError;
use ndscan::image::{DataType, Image};
use ndscan::statistics::{
    center_of_mass, count, covariance, cumulative_sum, maximum_and_minimum, maximum_pixel,
    minimum_pixel, moments, sample_statistics, TiePolicy,
};
use num_complex::Complex64;

fn image_f64(shape: &[usize], values: Vec<f64>) -> Image {
    let array = ArrayD::from_shape_vec(shape.to_vec(), values).expect("valid shape");
    Image::from_array(&array)
}

fn mask_image(shape: &[usize], values: Vec<bool>) -> Image {
    let array = ArrayD::from_shape_vec(shape.to_vec(), values).expect("valid shape");
    Image::from_array(&array)
}

#[test]
fn test_count_unmasked_and_masked() {
    let image = image_f64(&[2, 3], vec![0.0, 1.0, 2.0, 0.0, 3.0, 0.0]);
    assert_eq!(count(&image, None).unwrap(), 3);

    // All-false mask counts nothing.
    let none = mask_image(&[2, 3], vec![false; 6]);
    assert_eq!(count(&image, Some(&none)).unwrap(), 0);

    // All-true mask equals the unmasked count.
    let all = mask_image(&[2, 3], vec![true; 6]);
    assert_eq!(count(&image, Some(&all)).unwrap(), 3);

    // Partial mask hides one of the non-zero samples.
    let partial = mask_image(&[2, 3], vec![true, false, true, true, true, true]);
    assert_eq!(count(&image, Some(&partial)).unwrap(), 2);
}

#[test]
fn test_count_binary_image() {
    let array =
        ArrayD::from_shape_vec(vec![4], vec![true, false, true, true]).expect("valid shape");
    let image = Image::from_array(&array);
    assert_eq!(count(&image, None).unwrap(), 3);
}

#[test]
fn test_count_mask_broadcast_over_missing_dimension() {
    let image = image_f64(&[2, 3], vec![1.0; 6]);
    // A 1-D mask broadcasts over the trailing dimension: row 0 selected.
    let mask = mask_image(&[2], vec![true, false]);
    assert_eq!(count(&image, Some(&mask)).unwrap(), 3);
}

#[test]
fn test_extreme_pixel_tie_policy() {
    let image = image_f64(&[4], vec![3.0, 5.0, 5.0, 2.0]);
    assert_eq!(
        maximum_pixel(&image, None, TiePolicy::First).unwrap(),
        vec![1]
    );
    assert_eq!(
        maximum_pixel(&image, None, TiePolicy::Last).unwrap(),
        vec![2]
    );

    let image = image_f64(&[4], vec![3.0, 1.0, 1.0, 2.0]);
    assert_eq!(
        minimum_pixel(&image, None, TiePolicy::First).unwrap(),
        vec![1]
    );
    assert_eq!(
        minimum_pixel(&image, None, TiePolicy::Last).unwrap(),
        vec![2]
    );
}

#[test]
fn test_extreme_pixel_tie_policy_across_lines() {
    // The tie straddles two scan lines; scan order is storage order.
    let image = image_f64(&[2, 2], vec![3.0, 5.0, 5.0, 2.0]);
    assert_eq!(
        maximum_pixel(&image, None, TiePolicy::First).unwrap(),
        vec![0, 1]
    );
    assert_eq!(
        maximum_pixel(&image, None, TiePolicy::Last).unwrap(),
        vec![1, 0]
    );
}

#[test]
fn test_extreme_pixel_masked() {
    let image = image_f64(&[4], vec![3.0, 9.0, 5.0, 2.0]);
    let mask = mask_image(&[4], vec![true, false, true, true]);
    assert_eq!(
        maximum_pixel(&image, Some(&mask), TiePolicy::First).unwrap(),
        vec![2]
    );

    // All-false mask selects nothing.
    let none = mask_image(&[4], vec![false; 4]);
    assert!(maximum_pixel(&image, Some(&none), TiePolicy::First)
        .unwrap()
        .is_empty());
}

#[test]
fn test_maximum_and_minimum() {
    let image = image_f64(&[2, 3], vec![4.0, -1.0, 7.0, 0.5, 3.0, -6.0]);
    let acc = maximum_and_minimum(&image, None).unwrap();
    assert_eq!(acc.minimum(), -6.0);
    assert_eq!(acc.maximum(), 7.0);

    let mask = mask_image(&[2, 3], vec![true, true, false, true, true, false]);
    let acc = maximum_and_minimum(&image, Some(&mask)).unwrap();
    assert_eq!(acc.minimum(), -1.0);
    assert_eq!(acc.maximum(), 4.0);
}

#[test]
fn test_maximum_and_minimum_complex_splits_parts() {
    let array = ArrayD::from_shape_vec(
        vec![2],
        vec![Complex64::new(1.0, 4.0), Complex64::new(-2.0, 3.0)],
    )
    .expect("valid shape");
    let image = Image::from_array(&array);
    // Real and imaginary parts are scanned as separate real samples.
    let acc = maximum_and_minimum(&image, None).unwrap();
    assert_eq!(acc.minimum(), -2.0);
    assert_eq!(acc.maximum(), 4.0);
}

#[test]
fn test_sample_statistics_against_reference() {
    let values: Vec<f64> = (0..300).map(|i| ((i as f64) * 0.7).sin() * 5.0 + 1.0).collect();
    let image = image_f64(&[300], values.clone());
    let stats = sample_statistics(&image, None).unwrap();

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    assert_eq!(stats.number(), 300);
    assert_relative_eq!(stats.mean(), mean, max_relative = 1e-12);
    assert_relative_eq!(stats.variance(), var, max_relative = 1e-10);
}

#[test]
fn test_sample_statistics_masked() {
    let image = image_f64(&[5], vec![1.0, 100.0, 2.0, 3.0, 100.0]);
    let mask = mask_image(&[5], vec![true, false, true, true, false]);
    let stats = sample_statistics(&image, Some(&mask)).unwrap();
    assert_eq!(stats.number(), 3);
    assert_abs_diff_eq!(stats.mean(), 2.0);
}

#[test]
fn test_sample_statistics_spans_tensor_samples() {
    let mut image = Image::with_tensor(DataType::F64, vec![2], 2);
    image.forge();
    image
        .samples_mut::<f64>()
        .unwrap()
        .copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
    let stats = sample_statistics(&image, None).unwrap();
    assert_eq!(stats.number(), 4);
    assert_abs_diff_eq!(stats.mean(), 2.5);
}

#[test]
fn test_sample_statistics_parallel_reproducibility() {
    // Large enough to cross the parallel threshold.
    let values: Vec<f64> = (0..120_000)
        .map(|i| ((i as f64) * 0.013).sin() * 3.0 + (i % 11) as f64)
        .collect();
    let image = image_f64(&[300, 400], values);

    let first = sample_statistics(&image, None).unwrap();
    let second = sample_statistics(&image, None).unwrap();
    // Fixed merge order makes repeated runs bit-identical.
    assert_eq!(first.mean().to_bits(), second.mean().to_bits());
    assert_eq!(first.variance().to_bits(), second.variance().to_bits());
    assert_eq!(first.skewness().to_bits(), second.skewness().to_bits());
    assert_eq!(first.number(), second.number());
}

#[test]
fn test_covariance_matches_variance_and_is_symmetric() {
    let xs: Vec<f64> = (0..64).map(|i| (i as f64 * 0.21).cos() * 4.0).collect();
    let ys: Vec<f64> = xs.iter().map(|&x| 0.5 * x + 3.0).collect();
    let a = image_f64(&[8, 8], xs);
    let b = image_f64(&[8, 8], ys);

    let ab = covariance(&a, &b, None).unwrap();
    let ba = covariance(&b, &a, None).unwrap();
    assert_relative_eq!(ab.covariance(), ba.covariance(), max_relative = 1e-12);

    let aa = covariance(&a, &a, None).unwrap();
    let stats = sample_statistics(&a, None).unwrap();
    assert_relative_eq!(aa.covariance(), stats.variance(), max_relative = 1e-9);
}

#[test]
fn test_covariance_mixed_types_promote() {
    let ints = ArrayD::from_shape_vec(vec![4], vec![1_i32, 2, 3, 4]).expect("valid shape");
    let a = Image::from_array(&ints);
    let b = image_f64(&[4], vec![2.0, 4.0, 6.0, 8.0]);
    let acc = covariance(&a, &b, None).unwrap();
    assert_eq!(acc.number(), 4);
    assert_relative_eq!(acc.slope(), 2.0, max_relative = 1e-12);
}

#[test]
fn test_covariance_masked() {
    let a = image_f64(&[4], vec![1.0, 2.0, 3.0, 100.0]);
    let b = image_f64(&[4], vec![1.0, 2.0, 3.0, -100.0]);
    let mask = mask_image(&[4], vec![true, true, true, false]);
    let acc = covariance(&a, &b, Some(&mask)).unwrap();
    assert_eq!(acc.number(), 3);
    assert_relative_eq!(acc.correlation(), 1.0, max_relative = 1e-12);
}

#[test]
fn test_center_of_mass_point_mass() {
    let mut values = vec![0.0; 12];
    values[1 * 4 + 2] = 5.0; // position (1, 2) in a 3x4 image
    let image = image_f64(&[3, 4], values);
    let com = center_of_mass(&image, None).unwrap();
    assert_eq!(com, vec![1.0, 2.0]);
}

#[test]
fn test_center_of_mass_zero_image() {
    let image = image_f64(&[3, 4], vec![0.0; 12]);
    assert_eq!(center_of_mass(&image, None).unwrap(), vec![0.0, 0.0]);
}

#[test]
fn test_center_of_mass_uniform() {
    let image = image_f64(&[3, 5], vec![1.0; 15]);
    let com = center_of_mass(&image, None).unwrap();
    assert_abs_diff_eq!(com[0], 1.0);
    assert_abs_diff_eq!(com[1], 2.0);
}

#[test]
fn test_moments_one_dimensional() {
    let image = image_f64(&[3], vec![1.0, 1.0, 1.0]);
    let acc = moments(&image, None).unwrap();
    assert_abs_diff_eq!(acc.sum(), 3.0);
    assert_abs_diff_eq!(acc.first_order()[0], 1.0);
    // Second-order sum is 0 + 1 + 4 over unit masses, normalized by 3.
    assert_relative_eq!(acc.second_order()[0], 5.0 / 3.0, max_relative = 1e-12);
}

#[test]
fn test_moments_merge_matches_masked_split() {
    let values: Vec<f64> = (0..24).map(|i| (i as f64) * 0.5 + 1.0).collect();
    let image = image_f64(&[4, 6], values);

    let whole = moments(&image, None).unwrap();
    let left_mask: Vec<bool> = (0..24).map(|i| i % 2 == 0).collect();
    let right_mask: Vec<bool> = left_mask.iter().map(|&b| !b).collect();
    let mut left = moments(&image, Some(&mask_image(&[4, 6], left_mask))).unwrap();
    let right = moments(&image, Some(&mask_image(&[4, 6], right_mask))).unwrap();
    left += right;

    assert_relative_eq!(left.sum(), whole.sum(), max_relative = 1e-12);
    for (a, b) in left.first_order().into_iter().zip(whole.first_order()) {
        assert_relative_eq!(a, b, max_relative = 1e-10);
    }
    for (a, b) in left.second_order().into_iter().zip(whole.second_order()) {
        assert_relative_eq!(a, b, max_relative = 1e-10);
    }
}

#[test]
fn test_cumulative_sum_one_dimension() {
    let image = image_f64(&[4], vec![1.0, 2.0, 3.0, 4.0]);
    let out = cumulative_sum(&image, None, &[true]).unwrap();
    let result = out.to_array::<f64>().unwrap();
    assert_eq!(result.as_slice().unwrap(), &[1.0, 3.0, 6.0, 10.0]);
}

#[test]
fn test_cumulative_sum_masked_substitutes_identity() {
    let image = image_f64(&[4], vec![1.0, 2.0, 3.0, 4.0]);
    let mask = mask_image(&[4], vec![true, false, true, true]);
    let out = cumulative_sum(&image, Some(&mask), &[true]).unwrap();
    let result = out.to_array::<f64>().unwrap();
    assert_eq!(result.as_slice().unwrap(), &[1.0, 1.0, 4.0, 8.0]);
}

#[test]
fn test_cumulative_sum_selected_dimension_only() {
    let image = image_f64(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]);
    let out = cumulative_sum(&image, None, &[true, false]).unwrap();
    let result = out.to_array::<f64>().unwrap();
    assert_eq!(result.as_slice().unwrap(), &[1.0, 2.0, 4.0, 6.0]);

    let out = cumulative_sum(&image, None, &[false, true]).unwrap();
    let result = out.to_array::<f64>().unwrap();
    assert_eq!(result.as_slice().unwrap(), &[1.0, 3.0, 3.0, 7.0]);

    let out = cumulative_sum(&image, None, &[true, true]).unwrap();
    let result = out.to_array::<f64>().unwrap();
    assert_eq!(result.as_slice().unwrap(), &[1.0, 3.0, 4.0, 10.0]);
}

#[test]
fn test_cumulative_sum_large_image_matches_naive() {
    // Large enough to cross the parallel threshold of the separable pass.
    let (rows, cols) = (128, 600);
    let values: Vec<f64> = (0..rows * cols).map(|i| ((i % 13) as f64) - 5.0).collect();
    let image = image_f64(&[rows, cols], values.clone());
    let out = cumulative_sum(&image, None, &[true, true]).unwrap();
    let result = out.to_array::<f64>().unwrap();

    let mut expected = values;
    for r in 1..rows {
        for c in 0..cols {
            expected[r * cols + c] += expected[(r - 1) * cols + c];
        }
    }
    for r in 0..rows {
        for c in 1..cols {
            expected[r * cols + c] += expected[r * cols + c - 1];
        }
    }
    // Per-lane addition order is unchanged by chunking, so the sums are
    // exact.
    assert_eq!(result.as_slice().unwrap(), expected.as_slice());
}

#[test]
fn test_cumulative_sum_promotes_integers() {
    let ints = ArrayD::from_shape_vec(vec![3], vec![1_u8, 2, 3]).expect("valid shape");
    let image = Image::from_array(&ints);
    let out = cumulative_sum(&image, None, &[true]).unwrap();
    assert_eq!(out.data_type(), DataType::F64);
    let result = out.to_array::<f64>().unwrap();
    assert_eq!(result.as_slice().unwrap(), &[1.0, 3.0, 6.0]);
}

#[test]
fn test_cumulative_sum_complex() {
    let array = ArrayD::from_shape_vec(
        vec![2],
        vec![Complex64::new(1.0, 1.0), Complex64::new(2.0, -3.0)],
    )
    .expect("valid shape");
    let image = Image::from_array(&array);
    let out = cumulative_sum(&image, None, &[true]).unwrap();
    let result = out.to_array::<Complex64>().unwrap();
    assert_eq!(result[[1]], Complex64::new(3.0, -2.0));
}

#[test]
fn test_unforged_input_is_rejected() {
    let image = Image::new(DataType::F64, vec![2, 2]);
    assert!(matches!(
        count(&image, None),
        Err(NdScanError::NotForged { .. })
    ));
    assert!(matches!(
        sample_statistics(&image, None),
        Err(NdScanError::NotForged { .. })
    ));
    assert!(matches!(
        cumulative_sum(&image, None, &[true, true]),
        Err(NdScanError::NotForged { .. })
    ));
}

#[test]
fn test_tensor_input_rejected_where_scalar_required() {
    let mut image = Image::with_tensor(DataType::F64, vec![2, 2], 3);
    image.forge();
    assert!(matches!(
        count(&image, None),
        Err(NdScanError::NotScalar { .. })
    ));
    assert!(matches!(
        center_of_mass(&image, None),
        Err(NdScanError::NotScalar { .. })
    ));
}

#[test]
fn test_mask_size_mismatch_is_rejected() {
    let image = image_f64(&[2, 3], vec![1.0; 6]);
    let mask = mask_image(&[2, 2], vec![true; 4]);
    assert!(matches!(
        count(&image, Some(&mask)),
        Err(NdScanError::MaskSizeMismatch { .. })
    ));
}

#[test]
fn test_non_binary_mask_is_rejected() {
    let image = image_f64(&[4], vec![1.0; 4]);
    let mask = image_f64(&[4], vec![1.0; 4]);
    assert!(matches!(
        count(&image, Some(&mask)),
        Err(NdScanError::NotAMask { .. })
    ));
}

#[test]
fn test_complex_rejected_by_real_only_operations() {
    let array = ArrayD::from_shape_vec(vec![2], vec![Complex64::new(1.0, 0.0); 2])
        .expect("valid shape");
    let image = Image::from_array(&array);
    assert!(matches!(
        sample_statistics(&image, None),
        Err(NdScanError::UnsupportedDataType { .. })
    ));
    assert!(matches!(
        maximum_pixel(&image, None, TiePolicy::First),
        Err(NdScanError::UnsupportedDataType { .. })
    ));
}

#[test]
fn test_zero_dimensional_cumulative_sum_rejected() {
    let mut image = Image::new(DataType::F64, vec![]);
    image.forge();
    assert!(matches!(
        cumulative_sum(&image, None, &[]),
        Err(NdScanError::Dimensionality { .. })
    ));
}

#[test]
fn test_zero_dimensional_image_scans_its_single_pixel() {
    let mut image = Image::new(DataType::F64, vec![]);
    image.forge();
    image.samples_mut::<f64>().unwrap()[0] = 5.0;

    assert_eq!(count(&image, None).unwrap(), 1);

    let stats = sample_statistics(&image, None).unwrap();
    assert_eq!(stats.number(), 1);
    assert_abs_diff_eq!(stats.mean(), 5.0);

    let acc = maximum_and_minimum(&image, None).unwrap();
    assert_eq!(acc.minimum(), 5.0);
    assert_eq!(acc.maximum(), 5.0);
}

#[test]
fn test_covariance_rejects_binary_operands() {
    let bools =
        ArrayD::from_shape_vec(vec![4], vec![true, false, true, true]).expect("valid shape");
    let a = Image::from_array(&bools);
    let b = image_f64(&[4], vec![1.0, 2.0, 3.0, 4.0]);
    // Rejected in either operand position, matching or not.
    assert!(matches!(
        covariance(&a, &b, None),
        Err(NdScanError::UnsupportedDataType { .. })
    ));
    assert!(matches!(
        covariance(&b, &a, None),
        Err(NdScanError::UnsupportedDataType { .. })
    ));
    assert!(matches!(
        covariance(&a, &a, None),
        Err(NdScanError::UnsupportedDataType { .. })
    ));
}

#[test]
fn test_empty_image_statistics() {
    let image = image_f64(&[0], vec![]);
    let stats = sample_statistics(&image, None).unwrap();
    assert_eq!(stats.number(), 0);
    assert_eq!(stats.mean(), 0.0);
    assert_eq!(count(&image, None).unwrap(), 0);
}
