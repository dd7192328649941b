//! Inspection of log archives.
//!
//! - [`walker`] - enumerate groups and datasets
//! - [`channels`] - pick out groups that hold frame sequences
//! - [`info`] - per-group summary table
//! - [`stack`] - concatenate numbered frames into one array

pub mod channels;
pub mod info;
pub mod stack;
pub mod walker;

pub use channels::{collect_channels, Channel, ChannelDType, ChannelRules, DEFAULT_CHANNEL_THRESHOLD};
pub use info::{group_info, print_file_info, print_group_info, GroupInfo};
pub use stack::{frame_keys, get_data, Stacked};
pub use walker::{collect_datasets, collect_groups, visit, Tree, MAX_DEPTH};
