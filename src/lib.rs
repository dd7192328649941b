//! # perception-log
//!
//! Inspector and frame player for perception log archives.
//!
//! A log archive is a read-only tree of groups and datasets. Sensor
//! streams are stored as groups of numbered frames (`camera/color/0`,
//! `camera/color/1`, ...). This crate enumerates the tree, summarizes
//! groups, stacks numeric frames into one array and replays encoded
//! image frames.
//!
//! ## Modules
//!
//! - [`util`] - Errors, element types, path helpers
//! - [`ogawa`] - Low-level Ogawa binary format reader
//! - [`container`] - Container contract, file-backed (Ogawa, HDF5) and in-memory readers
//! - [`inspect`] - Tree walker, channel classifier, group info, frame stacker
//! - [`playback`] - Image playback loop, decoders and display sinks
//! - [`config`] - Inspector settings
//!
//! ## Example
//!
//! ```ignore
//! use perception_log::prelude::*;
//!
//! let archive = LogArchive::open("20230216_140029_PerceptionLog.plog")?;
//! print_file_info(&archive, &archive.file_name(), &mut std::io::stdout())?;
//!
//! let positions = get_data(&archive, "robot/position/")?;
//! println!("{:?}", positions.shape());
//! ```

pub mod util;
pub mod ogawa;
pub mod container;
pub mod inspect;
pub mod playback;
pub mod config;

// Re-export commonly used types
pub use util::{DType, Error, Result};
pub use container::{open_log, Container, LogArchive, MemoryArchive, Node, RawBuffer};
#[cfg(feature = "hdf5")]
pub use container::Hdf5Archive;
pub use config::InspectorConfig;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{DType, Error, Result};
    pub use crate::container::{open_log, Container, LogArchive, MemoryArchive, Node, NodeKind, RawBuffer};
    pub use crate::inspect::*;
    pub use crate::playback::{
        playback_images, CancelToken, DisplaySink, FrameDecoder, ImageDecoder, Playback,
        PlaybackOptions, PlaybackReport, StopReason,
    };
    pub use crate::config::InspectorConfig;
}
