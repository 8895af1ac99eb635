//! Centralized error handling for ndscan
//!
//! This module provides structured error types covering the three error
//! classes of the scan engine: precondition violations (unforged or
//! tensor-valued operands, insufficient dimensionality), shape/broadcast
//! violations (operand or mask sizes that cannot be reconciled), and
//! internal dispatch failures (an element type reaching a dispatch table
//! that does not list it).

use crate::image::DataType;
use std::fmt;

/// Main error type for ndscan operations
#[derive(Debug)]
pub enum NdScanError {
    /// An operand has no backing storage (not forged)
    NotForged { operand: &'static str },

    /// An operand is tensor-valued where a scalar image is required
    NotScalar { operand: &'static str },

    /// The image has fewer dimensions than the operation supports
    Dimensionality { required: usize, actual: usize },

    /// Two operands disagree in size or tensor arity
    SizesDontMatch { left: Vec<usize>, right: Vec<usize> },

    /// The mask operand is not a valid mask (wrong type or arity)
    NotAMask { reason: &'static str },

    /// Mask sizes cannot be broadcast to the image sizes
    MaskSizeMismatch { mask: Vec<usize>, image: Vec<usize> },

    /// A dimension index is out of range for the image
    InvalidDimension { dimension: usize, ndim: usize },

    /// An element type reached a dispatch table that does not support it
    UnsupportedDataType {
        operation: &'static str,
        dtype: DataType,
    },

    /// Thread pool configuration error
    ThreadPool(String),

    /// Array shape or conversion error
    Shape(ndarray::ShapeError),

    /// Generic error
    Generic(String),
}

impl fmt::Display for NdScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NdScanError::NotForged { operand } => {
                write!(f, "Image '{operand}' is not forged")
            }
            NdScanError::NotScalar { operand } => {
                write!(f, "Image '{operand}' is not scalar")
            }
            NdScanError::Dimensionality { required, actual } => {
                write!(
                    f,
                    "Dimensionality not supported: need at least {required}, image has {actual}"
                )
            }
            NdScanError::SizesDontMatch { left, right } => {
                write!(f, "Operand sizes don't match: {left:?} vs {right:?}")
            }
            NdScanError::NotAMask { reason } => {
                write!(f, "Mask image is not valid: {reason}")
            }
            NdScanError::MaskSizeMismatch { mask, image } => {
                write!(
                    f,
                    "Mask sizes {mask:?} cannot be expanded to image sizes {image:?}"
                )
            }
            NdScanError::InvalidDimension { dimension, ndim } => {
                write!(
                    f,
                    "Dimension index {dimension} is out of range for a {ndim}-dimensional image"
                )
            }
            NdScanError::UnsupportedDataType { operation, dtype } => {
                write!(f, "Data type {dtype:?} is not supported by '{operation}'")
            }
            NdScanError::ThreadPool(msg) => write!(f, "Thread pool error: {msg}"),
            NdScanError::Shape(e) => write!(f, "Array shape error: {e}"),
            NdScanError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for NdScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NdScanError::Shape(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ndarray::ShapeError> for NdScanError {
    fn from(error: ndarray::ShapeError) -> Self {
        NdScanError::Shape(error)
    }
}

impl From<String> for NdScanError {
    fn from(message: String) -> Self {
        NdScanError::Generic(message)
    }
}

/// Convenience result type for ndscan operations
pub type Result<T> = std::result::Result<T, NdScanError>;
