//! Element types and typed flat buffers.
//!
//! A [`RawArray`] is one contiguous allocation holding an N-dimensional
//! array in row-major order; its shape travels separately.

use crate::{Error, Result};
use std::fmt;

/// Element type reported by a backing store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    Float32,
    Float64,
    /// Character data (one byte per element).
    Char,
}

impl ElementType {
    /// Type that holds every value of `self` as a signed (or float) number.
    ///
    /// | stored | widened |
    /// |--------|---------|
    /// | UInt8  | Int16   |
    /// | UInt16 | Int32   |
    /// | UInt32 | Int64   |
    ///
    /// Every other type maps to itself.
    #[must_use]
    pub fn widened(self) -> Self {
        match self {
            Self::UInt8 => Self::Int16,
            Self::UInt16 => Self::Int32,
            Self::UInt32 => Self::Int64,
            other => other,
        }
    }

    /// Size of one element in bytes.
    #[must_use]
    pub fn size_bytes(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 | Self::Char => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::Float64 => 8,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Char => "char",
        };
        f.write_str(name)
    }
}

/// Typed flat buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum RawArray {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Char(Vec<u8>),
}

/// Applies `$body` to the vector inside any variant.
macro_rules! with_vec {
    ($array:expr, $v:ident => $body:expr) => {
        match $array {
            RawArray::Int8($v) => $body,
            RawArray::UInt8($v) => $body,
            RawArray::Int16($v) => $body,
            RawArray::UInt16($v) => $body,
            RawArray::Int32($v) => $body,
            RawArray::UInt32($v) => $body,
            RawArray::Int64($v) => $body,
            RawArray::Float32($v) => $body,
            RawArray::Float64($v) => $body,
            RawArray::Char($v) => $body,
        }
    };
}

/// Applies `$body` to the two vectors of a same-typed pair; evaluates
/// `$mismatch` when the variants differ.
macro_rules! with_vec_pair {
    ($a:expr, $b:expr, ($x:ident, $y:ident) => $body:expr, _ => $mismatch:expr) => {
        match ($a, $b) {
            (RawArray::Int8($x), RawArray::Int8($y)) => $body,
            (RawArray::UInt8($x), RawArray::UInt8($y)) => $body,
            (RawArray::Int16($x), RawArray::Int16($y)) => $body,
            (RawArray::UInt16($x), RawArray::UInt16($y)) => $body,
            (RawArray::Int32($x), RawArray::Int32($y)) => $body,
            (RawArray::UInt32($x), RawArray::UInt32($y)) => $body,
            (RawArray::Int64($x), RawArray::Int64($y)) => $body,
            (RawArray::Float32($x), RawArray::Float32($y)) => $body,
            (RawArray::Float64($x), RawArray::Float64($y)) => $body,
            (RawArray::Char($x), RawArray::Char($y)) => $body,
            _ => $mismatch,
        }
    };
}

pub(crate) use {with_vec, with_vec_pair};

impl RawArray {
    /// Allocates a zero-filled buffer of `len` elements.
    #[must_use]
    pub fn zeros(element_type: ElementType, len: usize) -> Self {
        match element_type {
            ElementType::Int8 => Self::Int8(vec![0; len]),
            ElementType::UInt8 => Self::UInt8(vec![0; len]),
            ElementType::Int16 => Self::Int16(vec![0; len]),
            ElementType::UInt16 => Self::UInt16(vec![0; len]),
            ElementType::Int32 => Self::Int32(vec![0; len]),
            ElementType::UInt32 => Self::UInt32(vec![0; len]),
            ElementType::Int64 => Self::Int64(vec![0; len]),
            ElementType::Float32 => Self::Float32(vec![0.0; len]),
            ElementType::Float64 => Self::Float64(vec![0.0; len]),
            ElementType::Char => Self::Char(vec![0; len]),
        }
    }

    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Int8(_) => ElementType::Int8,
            Self::UInt8(_) => ElementType::UInt8,
            Self::Int16(_) => ElementType::Int16,
            Self::UInt16(_) => ElementType::UInt16,
            Self::Int32(_) => ElementType::Int32,
            Self::UInt32(_) => ElementType::UInt32,
            Self::Int64(_) => ElementType::Int64,
            Self::Float32(_) => ElementType::Float32,
            Self::Float64(_) => ElementType::Float64,
            Self::Char(_) => ElementType::Char,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        with_vec!(self, v => v.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the first `len` elements of `src` into `self[offset..offset + len]`.
    ///
    /// # Errors
    /// Returns an error if the element types differ or either range is out
    /// of bounds.
    pub fn copy_from(&mut self, offset: usize, src: &RawArray, len: usize) -> Result<()> {
        let expected = self.element_type();
        let found = src.element_type();
        let dst_len = self.len();
        with_vec_pair!(self, src, (dst, src) => {
            if len > src.len() {
                return Err(Error::ShortRead { expected: len, found: src.len() });
            }
            let end = offset.checked_add(len).filter(|&end| end <= dst_len).ok_or_else(|| {
                Error::InvalidSlab(format!(
                    "copy of {len} elements at offset {offset} overruns buffer of {dst_len}"
                ))
            })?;
            dst[offset..end].copy_from_slice(&src[..len]);
            Ok(())
        }, _ => Err(Error::TypeMismatch { expected, found }))
    }

    /// Widens unsigned integer data per [`ElementType::widened`].
    #[must_use]
    pub fn widen(self) -> Self {
        match self {
            Self::UInt8(v) => Self::Int16(v.into_iter().map(i16::from).collect()),
            Self::UInt16(v) => Self::Int32(v.into_iter().map(i32::from).collect()),
            Self::UInt32(v) => Self::Int64(v.into_iter().map(i64::from).collect()),
            other => other,
        }
    }

    /// Converts every element to `f64` (character data as byte values).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            Self::Int8(v) => v.iter().map(|&x| f64::from(x)).collect(),
            Self::UInt8(v) | Self::Char(v) => v.iter().map(|&x| f64::from(x)).collect(),
            Self::Int16(v) => v.iter().map(|&x| f64::from(x)).collect(),
            Self::UInt16(v) => v.iter().map(|&x| f64::from(x)).collect(),
            Self::Int32(v) => v.iter().map(|&x| f64::from(x)).collect(),
            Self::UInt32(v) => v.iter().map(|&x| f64::from(x)).collect(),
            Self::Int64(v) => v.iter().map(|&x| x as f64).collect(),
            Self::Float32(v) => v.iter().map(|&x| f64::from(x)).collect(),
            Self::Float64(v) => v.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening_table() {
        assert_eq!(ElementType::UInt8.widened(), ElementType::Int16);
        assert_eq!(ElementType::UInt16.widened(), ElementType::Int32);
        assert_eq!(ElementType::UInt32.widened(), ElementType::Int64);
        for t in [
            ElementType::Int8,
            ElementType::Int16,
            ElementType::Int32,
            ElementType::Int64,
            ElementType::Float32,
            ElementType::Float64,
            ElementType::Char,
        ] {
            assert_eq!(t.widened(), t);
        }
    }

    #[test]
    fn test_size_bytes() {
        assert_eq!(ElementType::Char.size_bytes(), 1);
        assert_eq!(ElementType::UInt8.size_bytes(), 1);
        assert_eq!(ElementType::Int16.size_bytes(), 2);
        assert_eq!(ElementType::UInt32.size_bytes(), 4);
        assert_eq!(ElementType::Float32.size_bytes(), 4);
        assert_eq!(ElementType::Int64.size_bytes(), 8);
        assert_eq!(ElementType::Float64.size_bytes(), 8);
        // widening doubles the width of unsigned types
        for t in [ElementType::UInt8, ElementType::UInt16, ElementType::UInt32] {
            assert_eq!(t.widened().size_bytes(), 2 * t.size_bytes());
        }
    }

    #[test]
    fn test_widen_keeps_full_unsigned_range() {
        let widened = RawArray::UInt16(vec![0, 1, 32_768, u16::MAX]).widen();
        assert_eq!(widened, RawArray::Int32(vec![0, 1, 32_768, 65_535]));
        assert_eq!(widened.element_type(), ElementType::UInt16.widened());

        let widened = RawArray::UInt8(vec![255, 128]).widen();
        assert_eq!(widened, RawArray::Int16(vec![255, 128]));

        let widened = RawArray::UInt32(vec![u32::MAX]).widen();
        assert_eq!(widened, RawArray::Int64(vec![4_294_967_295]));
    }

    #[test]
    fn test_copy_from() {
        let mut dst = RawArray::zeros(ElementType::Int32, 6);
        let src = RawArray::Int32(vec![7, 8, 9, 10]);
        dst.copy_from(2, &src, 3).unwrap();
        assert_eq!(dst, RawArray::Int32(vec![0, 0, 7, 8, 9, 0]));

        assert!(matches!(
            dst.copy_from(0, &RawArray::Float32(vec![1.0]), 1),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(dst.copy_from(4, &src, 3), Err(Error::InvalidSlab(_))));
        assert!(matches!(dst.copy_from(0, &src, 5), Err(Error::ShortRead { .. })));
    }

    #[test]
    fn test_zeros_and_len() {
        for t in [ElementType::UInt8, ElementType::Float64, ElementType::Char] {
            let a = RawArray::zeros(t, 5);
            assert_eq!(a.len(), 5);
            assert_eq!(a.element_type(), t);
        }
        assert!(RawArray::zeros(ElementType::Int64, 0).is_empty());
        assert_eq!(RawArray::Int8(vec![-1, 2]).to_f64_vec(), vec![-1.0, 2.0]);
    }
}
