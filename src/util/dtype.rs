//! Element types of dataset buffers.

use byteorder::{ByteOrder, LittleEndian};
use half::f16;
use std::fmt;

/// Element type of a dataset.
///
/// Each type has a fixed width and a little-endian on-disk representation.
/// Names follow the numeric array conventions used by log tooling
/// (`uint8`, `float64`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DType {
    /// Unsigned 8-bit integer
    Uint8 = 1,
    /// Signed 8-bit integer
    Int8 = 2,
    /// Unsigned 16-bit integer
    Uint16 = 3,
    /// Signed 16-bit integer
    Int16 = 4,
    /// Unsigned 32-bit integer
    Uint32 = 5,
    /// Signed 32-bit integer
    Int32 = 6,
    /// Unsigned 64-bit integer
    Uint64 = 7,
    /// Signed 64-bit integer
    Int64 = 8,
    /// 16-bit floating point (IEEE 754 half precision)
    Float16 = 9,
    /// 32-bit floating point (IEEE 754 single precision)
    Float32 = 10,
    /// 64-bit floating point (IEEE 754 double precision)
    Float64 = 11,
}

impl DType {
    /// All supported types, in code order.
    pub const ALL: [DType; 11] = [
        Self::Uint8,
        Self::Int8,
        Self::Uint16,
        Self::Int16,
        Self::Uint32,
        Self::Int32,
        Self::Uint64,
        Self::Int64,
        Self::Float16,
        Self::Float32,
        Self::Float64,
    ];

    /// Size in bytes of a single element.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Uint8 | Self::Int8 => 1,
            Self::Uint16 | Self::Int16 | Self::Float16 => 2,
            Self::Uint32 | Self::Int32 | Self::Float32 => 4,
            Self::Uint64 | Self::Int64 | Self::Float64 => 8,
        }
    }

    /// Display name of this type.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uint8 => "uint8",
            Self::Int8 => "int8",
            Self::Uint16 => "uint16",
            Self::Int16 => "int16",
            Self::Uint32 => "uint32",
            Self::Int32 => "int32",
            Self::Uint64 => "uint64",
            Self::Int64 => "int64",
            Self::Float16 => "float16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Parse a type from its display name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// On-disk type code.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Convert from an on-disk type code.
    pub const fn from_code(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Uint8),
            2 => Some(Self::Int8),
            3 => Some(Self::Uint16),
            4 => Some(Self::Int16),
            5 => Some(Self::Uint32),
            6 => Some(Self::Int32),
            7 => Some(Self::Uint64),
            8 => Some(Self::Int64),
            9 => Some(Self::Float16),
            10 => Some(Self::Float32),
            11 => Some(Self::Float64),
            _ => None,
        }
    }

    /// Returns true if this is a floating point type.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float16 | Self::Float32 | Self::Float64)
    }

    /// Decode one little-endian element as f64.
    ///
    /// `bytes` must be exactly `num_bytes()` long. 64-bit integers lose
    /// precision above 2^53.
    pub fn element_to_f64(self, bytes: &[u8]) -> f64 {
        debug_assert_eq!(bytes.len(), self.num_bytes());
        match self {
            Self::Uint8 => bytes[0] as f64,
            Self::Int8 => bytes[0] as i8 as f64,
            Self::Uint16 => LittleEndian::read_u16(bytes) as f64,
            Self::Int16 => LittleEndian::read_i16(bytes) as f64,
            Self::Uint32 => LittleEndian::read_u32(bytes) as f64,
            Self::Int32 => LittleEndian::read_i32(bytes) as f64,
            Self::Uint64 => LittleEndian::read_u64(bytes) as f64,
            Self::Int64 => LittleEndian::read_i64(bytes) as f64,
            Self::Float16 => f16::from_bits(LittleEndian::read_u16(bytes)).to_f64(),
            Self::Float32 => LittleEndian::read_f32(bytes) as f64,
            Self::Float64 => LittleEndian::read_f64(bytes),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
