//! Minimal N-dimensional image container and element-type dispatch
//!
//! This module provides the array collaborator consumed by the scan and
//! separable drivers:
//!
//! - [`DataType`]: the closed set of runtime element-type tags
//! - [`SampleBuffer`]: tagged sample storage, one variant per data type
//! - [`Image`]: sizes, tensor arity, forged storage, stride derivation,
//!   mask checking and singleton broadcast, complex splitting
//! - [`PixelType`] / [`Sample`]: the compile-time side of the type tags,
//!   used by the dispatch macros to instantiate type-specialized filters
//!
//! Samples are stored in C order with the tensor index innermost, so the
//! last spatial dimension has the smallest stride and is the preferred
//! scan dimension.

use crate::errors::{NdScanError, Result};
use ndarray::ArrayD;
use num_complex::{Complex32, Complex64};

/// Runtime element-type tag
///
/// This is a closed, enumerable set: dispatch tables match on it
/// exhaustively and an unlisted tag is an `UnsupportedDataType` error,
/// never silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Binary (boolean) samples
    Bin,
    /// 8-bit unsigned integer
    U8,
    /// 8-bit signed integer
    I8,
    /// 16-bit unsigned integer
    U16,
    /// 16-bit signed integer
    I16,
    /// 32-bit unsigned integer
    U32,
    /// 32-bit signed integer
    I32,
    /// Single-precision float
    F32,
    /// Double-precision float
    F64,
    /// Single-precision complex
    C32,
    /// Double-precision complex
    C64,
}

impl DataType {
    /// True for C32 and C64
    #[must_use]
    pub const fn is_complex(self) -> bool {
        matches!(self, Self::C32 | Self::C64)
    }

    /// True for every non-complex, non-binary type
    #[must_use]
    pub const fn is_real(self) -> bool {
        !matches!(self, Self::Bin | Self::C32 | Self::C64)
    }

    /// True for Bin
    #[must_use]
    pub const fn is_binary(self) -> bool {
        matches!(self, Self::Bin)
    }

    /// Flex promotion used for arithmetic output: integers and binary
    /// promote to F64, floating and complex types are kept
    #[must_use]
    pub const fn suggest_flex(self) -> Self {
        match self {
            Self::F32 => Self::F32,
            Self::F64 => Self::F64,
            Self::C32 => Self::C32,
            Self::C64 => Self::C64,
            _ => Self::F64,
        }
    }

    /// Real counterpart: complex types map to the matching float,
    /// everything else is kept
    #[must_use]
    pub const fn suggest_real(self) -> Self {
        match self {
            Self::C32 => Self::F32,
            Self::C64 => Self::F64,
            other => other,
        }
    }
}

/// Tagged sample storage, one variant per [`DataType`]
#[derive(Debug, Clone)]
pub enum SampleBuffer {
    Bin(Vec<bool>),
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    C32(Vec<Complex32>),
    C64(Vec<Complex64>),
}

impl SampleBuffer {
    /// Number of samples in the buffer
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::Bin(v) => v.len(),
            SampleBuffer::U8(v) => v.len(),
            SampleBuffer::I8(v) => v.len(),
            SampleBuffer::U16(v) => v.len(),
            SampleBuffer::I16(v) => v.len(),
            SampleBuffer::U32(v) => v.len(),
            SampleBuffer::I32(v) => v.len(),
            SampleBuffer::F32(v) => v.len(),
            SampleBuffer::F64(v) => v.len(),
            SampleBuffer::C32(v) => v.len(),
            SampleBuffer::C64(v) => v.len(),
        }
    }

    /// True when the buffer holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocate a zero-filled buffer of `len` samples of the given type
    #[must_use]
    pub fn zeroed(dtype: DataType, len: usize) -> Self {
        match dtype {
            DataType::Bin => SampleBuffer::Bin(vec![false; len]),
            DataType::U8 => SampleBuffer::U8(vec![0; len]),
            DataType::I8 => SampleBuffer::I8(vec![0; len]),
            DataType::U16 => SampleBuffer::U16(vec![0; len]),
            DataType::I16 => SampleBuffer::I16(vec![0; len]),
            DataType::U32 => SampleBuffer::U32(vec![0; len]),
            DataType::I32 => SampleBuffer::I32(vec![0; len]),
            DataType::F32 => SampleBuffer::F32(vec![0.0; len]),
            DataType::F64 => SampleBuffer::F64(vec![0.0; len]),
            DataType::C32 => SampleBuffer::C32(vec![Complex32::new(0.0, 0.0); len]),
            DataType::C64 => SampleBuffer::C64(vec![Complex64::new(0.0, 0.0); len]),
        }
    }
}

/// Compile-time side of the [`DataType`] tags
///
/// Every storable element type implements this; the dispatch macros pair
/// a runtime tag with the matching implementor.
pub trait PixelType: Copy + Send + Sync + 'static {
    /// The tag this type stores under
    const DATA_TYPE: DataType;

    /// Wrap a sample vector in the matching buffer variant
    fn into_buffer(samples: Vec<Self>) -> SampleBuffer;

    /// Typed view into a buffer; `None` when the variant does not match
    fn slice(buffer: &SampleBuffer) -> Option<&[Self]>;

    /// Typed mutable view into a buffer
    fn slice_mut(buffer: &mut SampleBuffer) -> Option<&mut [Self]>;
}

/// A scalar (non-complex) sample that scans can promote to `f64`
pub trait Sample: PixelType + PartialOrd {
    /// Promote to double-precision float
    fn to_f64(self) -> f64;

    /// Demote from double-precision float (used by `convert`)
    fn from_f64(value: f64) -> Self;

    /// Non-zero test used by binary counting
    fn is_nonzero(self) -> bool {
        self.to_f64() != 0.0
    }
}

macro_rules! impl_pixel_type {
    ($ty:ty, $variant:ident) => {
        impl PixelType for $ty {
            const DATA_TYPE: DataType = DataType::$variant;

            fn into_buffer(samples: Vec<Self>) -> SampleBuffer {
                SampleBuffer::$variant(samples)
            }

            fn slice(buffer: &SampleBuffer) -> Option<&[Self]> {
                match buffer {
                    SampleBuffer::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn slice_mut(buffer: &mut SampleBuffer) -> Option<&mut [Self]> {
                match buffer {
                    SampleBuffer::$variant(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! impl_sample {
    ($ty:ty, $variant:ident) => {
        impl_pixel_type!($ty, $variant);

        impl Sample for $ty {
            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            fn from_f64(value: f64) -> Self {
                value as $ty
            }
        }
    };
}

impl_pixel_type!(bool, Bin);
impl_pixel_type!(Complex32, C32);
impl_pixel_type!(Complex64, C64);
impl_sample!(u8, U8);
impl_sample!(i8, I8);
impl_sample!(u16, U16);
impl_sample!(i16, I16);
impl_sample!(u32, U32);
impl_sample!(i32, I32);
impl_sample!(f32, F32);
impl_sample!(f64, F64);

impl Sample for bool {
    fn to_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }

    fn from_f64(value: f64) -> Self {
        value != 0.0
    }

    fn is_nonzero(self) -> bool {
        self
    }
}

/// N-dimensional image: spatial sizes, tensor arity, optionally forged storage
///
/// The storage layout is C order over `sizes` with the tensor index
/// innermost; strides are expressed in samples. A fresh image is not
/// forged: operations that traverse samples fail with `NotForged` until
/// [`Image::forge`] allocates the buffer.
#[derive(Debug, Clone)]
pub struct Image {
    dtype: DataType,
    sizes: Vec<usize>,
    tensor: usize,
    buffer: Option<SampleBuffer>,
}

impl Image {
    /// Create an unforged scalar image
    #[must_use]
    pub fn new(dtype: DataType, sizes: Vec<usize>) -> Self {
        Self::with_tensor(dtype, sizes, 1)
    }

    /// Create an unforged image with `tensor` samples per pixel
    #[must_use]
    pub fn with_tensor(dtype: DataType, sizes: Vec<usize>, tensor: usize) -> Self {
        Self {
            dtype,
            sizes,
            tensor: tensor.max(1),
            buffer: None,
        }
    }

    /// Allocate zero-filled backing storage; no-op when already forged
    pub fn forge(&mut self) {
        if self.buffer.is_none() {
            let len = self.num_samples();
            self.buffer = Some(SampleBuffer::zeroed(self.dtype, len));
        }
    }

    /// True when backing storage has been allocated
    #[must_use]
    pub fn is_forged(&self) -> bool {
        self.buffer.is_some()
    }

    /// True when each pixel holds exactly one sample
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.tensor == 1
    }

    /// Number of spatial dimensions
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.sizes.len()
    }

    /// Spatial sizes
    #[must_use]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Samples per pixel
    #[must_use]
    pub fn tensor_elements(&self) -> usize {
        self.tensor
    }

    /// Runtime element-type tag
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.dtype
    }

    /// Total number of samples (pixels times tensor elements)
    #[must_use]
    pub fn num_samples(&self) -> usize {
        self.sizes.iter().product::<usize>() * self.tensor
    }

    /// Number of pixels (spatial sizes only)
    #[must_use]
    pub fn num_pixels(&self) -> usize {
        self.sizes.iter().product::<usize>()
    }

    /// Per-dimension strides in samples (C order, tensor innermost)
    #[must_use]
    pub fn strides(&self) -> Vec<isize> {
        let nd = self.sizes.len();
        let mut strides = vec![0_isize; nd];
        let mut step = self.tensor as isize;
        for d in (0..nd).rev() {
            strides[d] = step;
            step *= self.sizes[d] as isize;
        }
        strides
    }

    /// Stride between tensor elements of one pixel (always 1 sample)
    #[must_use]
    pub fn tensor_stride(&self) -> isize {
        1
    }

    /// The raw sample buffer
    ///
    /// # Errors
    ///
    /// Returns `NotForged` when no storage has been allocated.
    pub fn sample_buffer(&self) -> Result<&SampleBuffer> {
        self.buffer
            .as_ref()
            .ok_or(NdScanError::NotForged { operand: "image" })
    }

    /// Typed view of the samples
    ///
    /// # Errors
    ///
    /// Returns `NotForged` when unforged, or an internal error when `T`
    /// does not match the runtime data type.
    pub fn samples<T: PixelType>(&self) -> Result<&[T]> {
        let buffer = self.sample_buffer()?;
        T::slice(buffer).ok_or_else(|| {
            NdScanError::Generic(format!(
                "internal: sample type mismatch, buffer holds {:?}",
                self.dtype
            ))
        })
    }

    /// Typed mutable view of the samples
    ///
    /// # Errors
    ///
    /// Same conditions as [`Image::samples`].
    pub fn samples_mut<T: PixelType>(&mut self) -> Result<&mut [T]> {
        let dtype = self.dtype;
        let buffer = self
            .buffer
            .as_mut()
            .ok_or(NdScanError::NotForged { operand: "image" })?;
        T::slice_mut(buffer).ok_or_else(|| {
            NdScanError::Generic(format!(
                "internal: sample type mismatch, buffer holds {dtype:?}"
            ))
        })
    }

    /// Check that another image matches in sizes and tensor arity
    ///
    /// # Errors
    ///
    /// Returns `SizesDontMatch` on any disagreement.
    pub fn compare_properties(&self, other: &Image) -> Result<()> {
        if self.sizes != other.sizes || self.tensor != other.tensor {
            return Err(NdScanError::SizesDontMatch {
                left: self.sizes.clone(),
                right: other.sizes.clone(),
            });
        }
        Ok(())
    }

    /// Validate this image as a mask for an image of `target_sizes`
    ///
    /// A mask must be forged, binary, scalar, and each of its dimensions
    /// must either equal the target size or be a singleton; dimensions the
    /// mask lacks are treated as trailing singletons.
    ///
    /// # Errors
    ///
    /// Returns `NotForged`, `NotAMask`, or `MaskSizeMismatch`.
    pub fn check_is_mask(&self, target_sizes: &[usize]) -> Result<()> {
        if !self.is_forged() {
            return Err(NdScanError::NotForged { operand: "mask" });
        }
        if !self.dtype.is_binary() {
            return Err(NdScanError::NotAMask {
                reason: "data type is not binary",
            });
        }
        if !self.is_scalar() {
            return Err(NdScanError::NotAMask {
                reason: "mask is tensor-valued",
            });
        }
        if self.sizes.len() > target_sizes.len() {
            return Err(NdScanError::MaskSizeMismatch {
                mask: self.sizes.clone(),
                image: target_sizes.to_vec(),
            });
        }
        for (d, &size) in self.sizes.iter().enumerate() {
            if size != target_sizes[d] && size != 1 {
                return Err(NdScanError::MaskSizeMismatch {
                    mask: self.sizes.clone(),
                    image: target_sizes.to_vec(),
                });
            }
        }
        Ok(())
    }

    /// Strides of this image broadcast to `target_sizes`
    ///
    /// Singleton dimensions and missing trailing dimensions get stride 0,
    /// so the same sample is re-read along the expanded axis without
    /// duplicating storage.
    ///
    /// # Errors
    ///
    /// Returns `MaskSizeMismatch` when a non-singleton size disagrees.
    pub fn expanded_strides(&self, target_sizes: &[usize]) -> Result<Vec<isize>> {
        if self.sizes.len() > target_sizes.len() {
            return Err(NdScanError::MaskSizeMismatch {
                mask: self.sizes.clone(),
                image: target_sizes.to_vec(),
            });
        }
        let own = self.strides();
        let mut strides = Vec::with_capacity(target_sizes.len());
        for (d, &target) in target_sizes.iter().enumerate() {
            if d >= self.sizes.len() || (self.sizes[d] == 1 && target != 1) {
                strides.push(0);
            } else if self.sizes[d] == target {
                strides.push(own[d]);
            } else {
                return Err(NdScanError::MaskSizeMismatch {
                    mask: self.sizes.clone(),
                    image: target_sizes.to_vec(),
                });
            }
        }
        Ok(strides)
    }

    /// Split a complex image into a real one with a trailing dimension of
    /// size 2 holding the real and imaginary parts
    ///
    /// Complex statistics reduce to scanning twice as many real samples
    /// along the added dimension. The result is a materialized copy.
    ///
    /// # Errors
    ///
    /// Returns `NotForged` on unforged input; non-complex images come back
    /// as an unchanged clone.
    pub fn split_complex(&self) -> Result<Image> {
        if !self.is_forged() {
            return Err(NdScanError::NotForged { operand: "image" });
        }
        if !self.dtype.is_complex() {
            return Ok(self.clone());
        }
        let mut sizes = self.sizes.clone();
        sizes.push(2);
        match self.dtype {
            DataType::C32 => {
                let samples: &[Complex32] = self.samples()?;
                let split = split_complex_samples(samples, self.num_pixels(), self.tensor);
                Image::from_parts(DataType::F32, sizes, self.tensor, SampleBuffer::F32(split))
            }
            DataType::C64 => {
                let samples: &[Complex64] = self.samples()?;
                let split = split_complex_samples(samples, self.num_pixels(), self.tensor);
                Image::from_parts(DataType::F64, sizes, self.tensor, SampleBuffer::F64(split))
            }
            _ => unreachable!(),
        }
    }

    /// Cast copy to another real data type
    ///
    /// # Errors
    ///
    /// Returns `NotForged` on unforged input and `UnsupportedDataType`
    /// when either side is complex (use [`Image::split_complex`] first).
    pub fn convert(&self, dtype: DataType) -> Result<Image> {
        if !self.is_forged() {
            return Err(NdScanError::NotForged { operand: "image" });
        }
        if self.dtype == dtype {
            return Ok(self.clone());
        }
        if self.dtype.is_complex() || dtype.is_complex() {
            return Err(NdScanError::UnsupportedDataType {
                operation: "convert",
                dtype: if self.dtype.is_complex() { self.dtype } else { dtype },
            });
        }
        let values = self.samples_as_f64()?;
        let buffer = match dtype {
            DataType::Bin => SampleBuffer::Bin(values.iter().map(|&v| v != 0.0).collect()),
            DataType::U8 => SampleBuffer::U8(values.iter().map(|&v| v as u8).collect()),
            DataType::I8 => SampleBuffer::I8(values.iter().map(|&v| v as i8).collect()),
            DataType::U16 => SampleBuffer::U16(values.iter().map(|&v| v as u16).collect()),
            DataType::I16 => SampleBuffer::I16(values.iter().map(|&v| v as i16).collect()),
            DataType::U32 => SampleBuffer::U32(values.iter().map(|&v| v as u32).collect()),
            DataType::I32 => SampleBuffer::I32(values.iter().map(|&v| v as i32).collect()),
            DataType::F32 => SampleBuffer::F32(values.iter().map(|&v| v as f32).collect()),
            DataType::F64 => SampleBuffer::F64(values),
            DataType::C32 | DataType::C64 => unreachable!(),
        };
        Image::from_parts(dtype, self.sizes.clone(), self.tensor, buffer)
    }

    /// All samples promoted to `f64`, in storage order
    ///
    /// # Errors
    ///
    /// Returns `NotForged` on unforged input and `UnsupportedDataType` for
    /// complex images.
    pub fn samples_as_f64(&self) -> Result<Vec<f64>> {
        macro_rules! promote {
            ($ty:ty) => {
                Ok(self.samples::<$ty>()?.iter().map(|&v| v.to_f64()).collect())
            };
        }
        match self.dtype {
            DataType::Bin => promote!(bool),
            DataType::U8 => promote!(u8),
            DataType::I8 => promote!(i8),
            DataType::U16 => promote!(u16),
            DataType::I16 => promote!(i16),
            DataType::U32 => promote!(u32),
            DataType::I32 => promote!(i32),
            DataType::F32 => promote!(f32),
            DataType::F64 => promote!(f64),
            other => Err(NdScanError::UnsupportedDataType {
                operation: "samples_as_f64",
                dtype: other,
            }),
        }
    }

    /// Build a forged scalar image from an ndarray array
    ///
    /// The array is copied into standard (C-order) layout.
    pub fn from_array<T: PixelType>(array: &ArrayD<T>) -> Image {
        let sizes = array.shape().to_vec();
        let samples: Vec<T> = array.iter().copied().collect();
        Image {
            dtype: T::DATA_TYPE,
            sizes,
            tensor: 1,
            buffer: Some(T::into_buffer(samples)),
        }
    }

    /// Copy a forged scalar image out into an ndarray array
    ///
    /// # Errors
    ///
    /// Returns `NotForged` or `NotScalar` preconditions, a shape error if
    /// the sizes are inconsistent, or the internal type-mismatch error.
    pub fn to_array<T: PixelType>(&self) -> Result<ArrayD<T>> {
        if !self.is_scalar() {
            return Err(NdScanError::NotScalar { operand: "image" });
        }
        let samples = self.samples::<T>()?.to_vec();
        Ok(ArrayD::from_shape_vec(self.sizes.clone(), samples)?)
    }

    /// Build a forged image from a sample vector in storage order
    ///
    /// # Errors
    ///
    /// Returns an internal error when the sample count does not match the
    /// sizes and tensor arity.
    pub fn from_samples<T: PixelType>(
        sizes: Vec<usize>,
        tensor: usize,
        samples: Vec<T>,
    ) -> Result<Image> {
        Self::from_parts(T::DATA_TYPE, sizes, tensor, T::into_buffer(samples))
    }

    fn from_parts(
        dtype: DataType,
        sizes: Vec<usize>,
        tensor: usize,
        buffer: SampleBuffer,
    ) -> Result<Image> {
        let expected = sizes.iter().product::<usize>() * tensor;
        if buffer.len() != expected {
            return Err(NdScanError::Generic(format!(
                "internal: buffer holds {} samples, sizes require {expected}",
                buffer.len()
            )));
        }
        Ok(Image {
            dtype,
            sizes,
            tensor,
            buffer: Some(buffer),
        })
    }
}

// Interleave order: for each pixel, all tensor elements' real parts come
// before the imaginary parts, matching the trailing size-2 dimension with
// the tensor index still innermost.
fn split_complex_samples<T: Copy>(
    samples: &[num_complex::Complex<T>],
    pixels: usize,
    tensor: usize,
) -> Vec<T> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for p in 0..pixels {
        let base = p * tensor;
        for part in 0..2 {
            for t in 0..tensor {
                let c = samples[base + t];
                out.push(if part == 0 { c.re } else { c.im });
            }
        }
    }
    out
}

/// Dispatch a runtime [`DataType`] tag to a generic function over the real
/// (non-complex, non-binary) sample types
///
/// `$run` is a caller-local macro taking the concrete type; any other tag
/// produces an `UnsupportedDataType` error naming `$operation`.
#[macro_export]
macro_rules! dispatch_real {
    ($dtype:expr, $operation:expr, $run:ident) => {
        match $dtype {
            $crate::image::DataType::U8 => $run!(u8),
            $crate::image::DataType::I8 => $run!(i8),
            $crate::image::DataType::U16 => $run!(u16),
            $crate::image::DataType::I16 => $run!(i16),
            $crate::image::DataType::U32 => $run!(u32),
            $crate::image::DataType::I32 => $run!(i32),
            $crate::image::DataType::F32 => $run!(f32),
            $crate::image::DataType::F64 => $run!(f64),
            other => Err($crate::errors::NdScanError::UnsupportedDataType {
                operation: $operation,
                dtype: other,
            }),
        }
    };
}

/// Like [`dispatch_real!`] but also covering the binary type
#[macro_export]
macro_rules! dispatch_scalar {
    ($dtype:expr, $operation:expr, $run:ident) => {
        match $dtype {
            $crate::image::DataType::Bin => $run!(bool),
            $crate::image::DataType::U8 => $run!(u8),
            $crate::image::DataType::I8 => $run!(i8),
            $crate::image::DataType::U16 => $run!(u16),
            $crate::image::DataType::I16 => $run!(i16),
            $crate::image::DataType::U32 => $run!(u32),
            $crate::image::DataType::I32 => $run!(i32),
            $crate::image::DataType::F32 => $run!(f32),
            $crate::image::DataType::F64 => $run!(f64),
            other => Err($crate::errors::NdScanError::UnsupportedDataType {
                operation: $operation,
                dtype: other,
            }),
        }
    };
}
