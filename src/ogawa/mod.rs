//! Low-level Ogawa binary format reader.
//!
//! Ogawa is a compact tree of groups and data blocks. Perception log
//! archives use it as their on-disk container.
//!
//! ## File Structure
//!
//! ```text
//! +------------------+
//! | Magic: "Ogawa"   |  5 bytes
//! +------------------+
//! | Frozen flag      |  1 byte (0x00 or 0xFF)
//! +------------------+
//! | Version          |  2 bytes (u16 LE)
//! +------------------+
//! | Root Group Pos   |  8 bytes (u64 LE)
//! +------------------+
//! | ... Data ...     |
//! +------------------+
//! ```
//!
//! A group is a u64 child count followed by u64 child offsets (MSB set
//! marks data). A data block is a u64 size followed by its bytes.

mod format;
mod reader;

pub use format::*;
pub use reader::*;
