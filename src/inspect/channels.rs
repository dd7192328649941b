//! Channel classification.
//!
//! A channel is a group with more than [`DEFAULT_CHANNEL_THRESHOLD`]
//! immediate children, read as an ordered sequence of frames.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::walker::collect_groups;
use crate::container::Container;
use crate::util::Result;

/// Groups need strictly more children than this to count as channels.
pub const DEFAULT_CHANNEL_THRESHOLD: usize = 10;

/// Coarse element class of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelDType {
    Float,
    Byte,
    #[serde(rename = "none")]
    Unknown,
}

impl ChannelDType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Byte => "byte",
            Self::Unknown => "none",
        }
    }
}

impl fmt::Display for ChannelDType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Thresholds and name markers used to pick out channels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelRules {
    pub threshold: usize,
    pub float_markers: Vec<String>,
    pub byte_markers: Vec<String>,
}

impl Default for ChannelRules {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CHANNEL_THRESHOLD,
            float_markers: vec!["position".into(), "orientation".into(), "time".into()],
            byte_markers: vec!["image".into(), "depth".into(), "color".into()],
        }
    }
}

impl ChannelRules {
    /// Substring heuristic over the group path. Float markers win.
    pub fn classify(&self, group: &str) -> ChannelDType {
        if self.float_markers.iter().any(|m| group.contains(m.as_str())) {
            ChannelDType::Float
        } else if self.byte_markers.iter().any(|m| group.contains(m.as_str())) {
            ChannelDType::Byte
        } else {
            ChannelDType::Unknown
        }
    }
}

/// A group read as a frame sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Group path with trailing separator.
    pub name: String,
    /// Number of immediate children.
    pub count: usize,
    /// Emitted record type; always [`ChannelDType::Byte`].
    pub dtype: ChannelDType,
    /// What the name heuristic suggests.
    pub inferred: ChannelDType,
}

/// Every group whose child count exceeds `rules.threshold`.
pub fn collect_channels<C: Container + ?Sized>(container: &C, rules: &ChannelRules) -> Result<Vec<Channel>> {
    let mut channels = Vec::new();

    for group in collect_groups(container)? {
        debug!(group = %group, "checking group");
        let count = container.children(&group)?.len();
        if count <= rules.threshold {
            continue;
        }

        let inferred = rules.classify(&group);
        info!(channel = %group, count, inferred = %inferred, "adding channel");
        // Records are emitted as byte channels whatever the heuristic says;
        // `inferred` carries the heuristic result.
        channels.push(Channel {
            name: group,
            count,
            dtype: ChannelDType::Byte,
            inferred,
        });
    }

    Ok(channels)
}
