//! Ogawa format constants and the named-log layout built on top of it.

/// Magic bytes at the start of an Ogawa file.
pub const OGAWA_MAGIC: &[u8; 5] = b"Ogawa";

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Offset of the frozen flag in the header.
pub const FROZEN_OFFSET: usize = 5;

/// Offset of the version in the header.
pub const VERSION_OFFSET: usize = 6;

/// Offset of the root group position in the header.
pub const ROOT_POS_OFFSET: usize = 8;

/// Current Ogawa format version.
pub const CURRENT_VERSION: u16 = 1;

/// Frozen flag value when archive is frozen (finalized).
pub const FROZEN_FLAG: u8 = 0xFF;

/// Bit mask for the type flag in child offsets.
/// MSB set = data, MSB clear = group.
pub const TYPE_FLAG_MASK: u64 = 1 << 63;

/// Mask to extract the actual offset from a child pointer.
pub const OFFSET_MASK: u64 = !(1 << 63);

/// Index of the names table inside every named group.
/// Node `k` of the group lives at child `k + NAMES_CHILD + 1`.
pub const NAMES_CHILD: u64 = 0;

/// Terminator of each entry in a names table.
pub const NAME_TERMINATOR: u8 = 0;

/// Fixed part of a dataset header: dtype code, rank, two reserved bytes.
pub const DATASET_FIXED_HEADER: usize = 4;

/// Highest rank a dataset header may declare.
pub const MAX_RANK: u8 = 8;

/// Check if a child offset represents a group (MSB NOT set = 0).
#[inline]
pub const fn is_group_offset(offset: u64) -> bool {
    (offset & TYPE_FLAG_MASK) == 0
}

/// Check if a child offset represents data (MSB SET = 1).
#[inline]
pub const fn is_data_offset(offset: u64) -> bool {
    (offset & TYPE_FLAG_MASK) != 0
}

/// Extract the actual position from a child offset.
#[inline]
pub const fn extract_offset(offset: u64) -> u64 {
    offset & OFFSET_MASK
}

/// Create a group child offset (MSB clear = 0).
#[inline]
pub const fn make_group_offset(pos: u64) -> u64 {
    pos & OFFSET_MASK
}

/// Create a data child offset (MSB set = 1).
#[inline]
pub const fn make_data_offset(pos: u64) -> u64 {
    pos | TYPE_FLAG_MASK
}

/// Size of a dataset header for the given rank.
#[inline]
pub const fn dataset_header_size(rank: u8) -> usize {
    DATASET_FIXED_HEADER + rank as usize * 8
}
