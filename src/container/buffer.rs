//! Raw dataset buffers.

use crate::util::{DType, Error, Result};

/// Rust element types that map onto a [`DType`].
pub trait Element: Copy {
    /// The corresponding element type.
    const DTYPE: DType;

    /// Append the little-endian encoding of `self` to `out`.
    fn write_le(self, out: &mut Vec<u8>);
}

macro_rules! impl_element {
    ($($t:ty => $d:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const DTYPE: DType = DType::$d;

                #[inline]
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_element! {
    u8 => Uint8,
    i8 => Int8,
    u16 => Uint16,
    i16 => Int16,
    u32 => Uint32,
    i32 => Int32,
    u64 => Uint64,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
}

fn encode<T: Element>(values: &[T]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * T::DTYPE.num_bytes());
    for v in values {
        v.write_le(&mut bytes);
    }
    bytes
}

/// Contents of one dataset: element type, shape, little-endian bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawBuffer {
    dtype: DType,
    shape: Vec<usize>,
    bytes: Vec<u8>,
}

impl RawBuffer {
    /// Wrap raw bytes, checking that their length matches the shape.
    pub fn new(dtype: DType, shape: Vec<usize>, bytes: Vec<u8>) -> Result<Self> {
        let elements: usize = shape.iter().product();
        let expected = elements
            .checked_mul(dtype.num_bytes())
            .ok_or_else(|| Error::invalid(format!("shape {:?} overflows", shape)))?;
        if bytes.len() != expected {
            return Err(Error::invalid(format!(
                "{} buffer of shape {:?} needs {} bytes, got {}",
                dtype,
                shape,
                expected,
                bytes.len()
            )));
        }
        Ok(Self { dtype, shape, bytes })
    }

    /// One-dimensional buffer from a slice of elements.
    pub fn from_slice<T: Element>(values: &[T]) -> Self {
        Self {
            dtype: T::DTYPE,
            shape: vec![values.len()],
            bytes: encode(values),
        }
    }

    /// Buffer of the given shape from a slice of elements.
    pub fn from_shape<T: Element>(shape: Vec<usize>, values: &[T]) -> Result<Self> {
        Self::new(T::DTYPE, shape, encode(values))
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / self.dtype.num_bytes()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Little-endian element bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Matrix view used for vertical stacking: `(rows, cols)`.
    ///
    /// Scalars are one 1-wide row, 1-D buffers one row, higher ranks keep
    /// their first dimension as rows and flatten the rest.
    pub fn rows_cols(&self) -> (usize, usize) {
        match self.shape.as_slice() {
            [] => (1, 1),
            [n] => (1, *n),
            [rows, rest @ ..] => (*rows, rest.iter().product()),
        }
    }

    /// Bytes with every element's byte order reversed.
    pub fn byteswapped(&self) -> Vec<u8> {
        let width = self.dtype.num_bytes();
        let mut out = self.bytes.clone();
        if width > 1 {
            for chunk in out.chunks_exact_mut(width) {
                chunk.reverse();
            }
        }
        out
    }

    /// Elements converted to f64.
    pub fn to_f64(&self) -> Vec<f64> {
        self.bytes
            .chunks_exact(self.dtype.num_bytes())
            .map(|c| self.dtype.element_to_f64(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_check() {
        assert!(RawBuffer::new(DType::Int32, vec![2], vec![0; 8]).is_ok());
        assert!(RawBuffer::new(DType::Int32, vec![2], vec![0; 7]).is_err());
        let scalar = RawBuffer::new(DType::Float64, vec![], vec![0; 8]).unwrap();
        assert_eq!(scalar.len(), 1);
        assert_eq!(scalar.rows_cols(), (1, 1));
    }

    #[test]
    fn test_rows_cols() {
        assert_eq!(RawBuffer::from_slice(&[1.0f64, 2.0, 3.0]).rows_cols(), (1, 3));
        let m = RawBuffer::from_shape(vec![2, 3, 2], &[0u8; 12]).unwrap();
        assert_eq!(m.rows_cols(), (2, 6));
    }

    #[test]
    fn test_byteswap() {
        let b = RawBuffer::from_slice(&[0x0102_0304i32]);
        assert_eq!(b.bytes(), &[4, 3, 2, 1]);
        assert_eq!(b.byteswapped(), vec![1, 2, 3, 4]);

        let u = RawBuffer::from_slice(&[1u8, 2, 3]);
        assert_eq!(u.byteswapped(), vec![1, 2, 3]);
    }

    #[test]
    fn test_to_f64() {
        let b = RawBuffer::from_slice(&[-1i16, 7]);
        assert_eq!(b.to_f64(), vec![-1.0, 7.0]);
    }
}
