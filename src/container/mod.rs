//! Container reader contract.
//!
//! A container is a read-only tree of named nodes. Every node is either a
//! [`Node::Group`] (named children, no data) or a [`Node::Dataset`] (a leaf
//! buffer with an element type and shape). Readers return the tagged
//! variant; callers switch on it instead of probing capabilities.
//!
//! Readers:
//! - [`LogArchive`] - file-backed, Ogawa layout
//! - `Hdf5Archive` - file-backed HDF5 (feature `hdf5`)
//! - [`MemoryArchive`] - in-memory tree, built programmatically

mod archive;
mod buffer;
#[cfg(feature = "hdf5")]
mod h5;
mod memory;

pub use archive::*;
pub use buffer::*;
#[cfg(feature = "hdf5")]
pub use h5::*;
pub use memory::*;

use std::fmt;
use std::path::Path;

use crate::util::{path, DType, Error, Result};

/// Kind of a container node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Group,
    Dataset,
}

impl NodeKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Dataset => "dataset",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A resolved container node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Namespace of named children, in the order the container stores them.
    Group { children: Vec<String> },
    /// Leaf array; the buffer itself is fetched with [`Container::read`].
    Dataset { dtype: DType, shape: Vec<usize> },
}

impl Node {
    #[inline]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Group { .. } => NodeKind::Group,
            Self::Dataset { .. } => NodeKind::Dataset,
        }
    }

    #[inline]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group { .. })
    }

    #[inline]
    pub fn is_dataset(&self) -> bool {
        matches!(self, Self::Dataset { .. })
    }
}

/// Read access to a hierarchical array container.
///
/// Paths are slash-delimited and relative to the root (see [`path`]); the
/// empty path is the root group.
pub trait Container {
    /// Resolve the node at `path`.
    fn node(&self, path: &str) -> Result<Node>;

    /// Read the full buffer of the dataset at `path`.
    fn read(&self, path: &str) -> Result<RawBuffer>;

    /// Names of the immediate children of the group at `path`.
    fn children(&self, node_path: &str) -> Result<Vec<String>> {
        match self.node(node_path)? {
            Node::Group { children } => Ok(children),
            Node::Dataset { .. } => Err(Error::kind_mismatch(
                path::normalize(node_path),
                NodeKind::Group.name(),
                NodeKind::Dataset.name(),
            )),
        }
    }

    /// Kind of the node at `path`.
    fn kind(&self, path: &str) -> Result<NodeKind> {
        Ok(self.node(path)?.kind())
    }
}

impl<C: Container + ?Sized> Container for &C {
    fn node(&self, path: &str) -> Result<Node> {
        (**self).node(path)
    }

    fn read(&self, path: &str) -> Result<RawBuffer> {
        (**self).read(path)
    }

    fn children(&self, path: &str) -> Result<Vec<String>> {
        (**self).children(path)
    }
}

impl<C: Container + ?Sized> Container for Box<C> {
    fn node(&self, path: &str) -> Result<Node> {
        (**self).node(path)
    }

    fn read(&self, path: &str) -> Result<RawBuffer> {
        (**self).read(path)
    }

    fn children(&self, path: &str) -> Result<Vec<String>> {
        (**self).children(path)
    }
}

/// Extensions of logs stored as HDF5.
pub const HDF5_EXTENSIONS: [&str; 2] = ["hdf5", "h5"];

/// Whether `path` names an HDF5 log, judged by extension.
pub fn is_hdf5_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| HDF5_EXTENSIONS.iter().any(|h| ext.eq_ignore_ascii_case(h)))
}

/// Open a log file with the reader its extension calls for.
///
/// HDF5 logs need the `hdf5` feature; everything else is read as the
/// Ogawa layout.
pub fn open_log(path: impl AsRef<Path>) -> Result<Box<dyn Container>> {
    let path = path.as_ref();
    if is_hdf5_path(path) {
        #[cfg(feature = "hdf5")]
        {
            return Ok(Box::new(Hdf5Archive::open(path)?));
        }
        #[cfg(not(feature = "hdf5"))]
        {
            return Err(Error::Config(format!(
                "{} is an HDF5 log; rebuild with the `hdf5` feature to read it",
                path.display()
            )));
        }
    }
    Ok(Box::new(LogArchive::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind() {
        let g = Node::Group { children: vec!["0".into()] };
        let d = Node::Dataset {
            dtype: DType::Uint8,
            shape: vec![4],
        };
        assert!(g.is_group() && !g.is_dataset());
        assert_eq!(d.kind(), NodeKind::Dataset);
        assert_eq!(NodeKind::Group.to_string(), "group");
    }

    #[test]
    fn test_children_of_dataset_is_error() {
        let mut archive = MemoryArchive::new();
        archive
            .insert_dataset("a/0", RawBuffer::from_slice(&[1u8, 2]))
            .unwrap();
        let archive: Box<dyn Container> = Box::new(archive);
        assert_eq!(archive.children("a").unwrap(), vec!["0".to_string()]);
        assert!(matches!(
            archive.children("a/0"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_hdf5_paths() {
        assert!(is_hdf5_path(Path::new("logs/20230216_PerceptionLog.hdf5")));
        assert!(is_hdf5_path(Path::new("a.H5")));
        assert!(!is_hdf5_path(Path::new("a.plog")));
        assert!(!is_hdf5_path(Path::new("hdf5")));
    }

    #[cfg(not(feature = "hdf5"))]
    #[test]
    fn test_hdf5_without_feature() {
        assert!(matches!(open_log("missing.hdf5"), Err(Error::Config(_))));
    }

    #[test]
    fn test_open_log_missing_file() {
        assert!(matches!(open_log("missing.plog"), Err(Error::FileNotFound(_))));
    }
}
