//! File-backed container over the Ogawa layout.
//!
//! Named-log layout:
//! - a group is an Ogawa group whose child [`NAMES_CHILD`] is a data block
//!   of NUL-terminated child names; name `k` lives at child `k + 1`
//! - a dataset is an Ogawa data block: dtype code (u8), rank (u8), two
//!   reserved bytes, `rank` u64 dimensions, then little-endian elements

use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use super::{Container, Node, NodeKind, RawBuffer};
use crate::ogawa::{
    dataset_header_size, IArchive, IChild, IData, IGroup, DATASET_FIXED_HEADER, MAX_RANK,
    NAMES_CHILD, NAME_TERMINATOR,
};
use crate::util::{path, DType, Error, Result};

/// Header of a dataset block.
#[derive(Clone, Debug, PartialEq, Eq)]
struct DatasetHeader {
    dtype: DType,
    shape: Vec<usize>,
    /// Byte offset of the first element inside the block.
    payload: u64,
}

enum Resolved {
    Group(Vec<String>),
    Dataset(IData),
}

/// Read-only perception log archive backed by a file.
pub struct LogArchive {
    path: PathBuf,
    archive: IArchive,
}

impl LogArchive {
    /// Open a log archive for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let archive = IArchive::open(path)?;
        debug!(
            path = %path.display(),
            version = archive.version(),
            frozen = archive.is_frozen(),
            mapped = archive.streams().is_mapped(),
            "opened log archive"
        );
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// Path the archive was opened from.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for display.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Underlying Ogawa archive.
    #[inline]
    pub fn ogawa(&self) -> &IArchive {
        &self.archive
    }

    fn resolve(&self, node_path: &str) -> Result<Resolved> {
        let mut group = self.archive.root().clone();
        let mut names = read_names(&group)?;
        let mut ancestors = vec![group.pos()];
        let mut parts = path::components(node_path).peekable();

        while let Some(part) = parts.next() {
            let index = names
                .iter()
                .position(|n| n == part)
                .ok_or_else(|| Error::NodeNotFound(path::normalize(node_path)))?;

            match group.child(index as u64 + NAMES_CHILD + 1)? {
                IChild::Group(g) => {
                    // Position 0 is the shared empty-group marker, never a real ancestor
                    if g.pos() != 0 && ancestors.contains(&g.pos()) {
                        return Err(Error::invalid(format!(
                            "group at {} is its own ancestor under {}",
                            g.pos(),
                            path::normalize(node_path)
                        )));
                    }
                    ancestors.push(g.pos());
                    names = read_names(&g)?;
                    group = g;
                }
                IChild::Data(d) => {
                    if parts.peek().is_some() {
                        return Err(Error::NodeNotFound(path::normalize(node_path)));
                    }
                    return Ok(Resolved::Dataset(d));
                }
            }
        }
        Ok(Resolved::Group(names))
    }
}

/// Read the names table of a named group.
fn read_names(group: &IGroup) -> Result<Vec<String>> {
    // The empty-group marker carries no names table
    if group.is_empty() {
        return Ok(Vec::new());
    }

    let table = group.data(NAMES_CHILD)?.read_all()?;
    let mut names = Vec::new();
    let mut rest = table.as_slice();
    while !rest.is_empty() {
        let end = rest
            .iter()
            .position(|&b| b == NAME_TERMINATOR)
            .ok_or_else(|| Error::invalid(format!("unterminated name in group at {}", group.pos())))?;
        let name = String::from_utf8(rest[..end].to_vec())?;
        if name.is_empty() || name.contains(path::SEPARATOR) {
            return Err(Error::invalid(format!(
                "invalid child name {:?} in group at {}",
                name,
                group.pos()
            )));
        }
        names.push(name);
        rest = &rest[end + 1..];
    }

    let expected = group.num_children() - 1;
    if names.len() as u64 != expected {
        return Err(Error::invalid(format!(
            "group at {} names {} children but holds {}",
            group.pos(),
            names.len(),
            expected
        )));
    }
    Ok(names)
}

fn read_dataset_header(data: &IData) -> Result<DatasetHeader> {
    let fixed = data.read_prefix(DATASET_FIXED_HEADER)?;
    let dtype = DType::from_code(fixed[0])
        .ok_or_else(|| Error::invalid(format!("unknown dtype code {}", fixed[0])))?;
    let rank = fixed[1];
    if rank > MAX_RANK {
        return Err(Error::invalid(format!("dataset rank {} exceeds {}", rank, MAX_RANK)));
    }

    let header_len = dataset_header_size(rank);
    let header = data.read_prefix(header_len)?;
    let shape = header[DATASET_FIXED_HEADER..]
        .chunks_exact(8)
        .map(|c| {
            usize::try_from(LittleEndian::read_u64(c))
                .map_err(|_| Error::invalid("dataset dimension exceeds address space"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DatasetHeader {
        dtype,
        shape,
        payload: header_len as u64,
    })
}

impl Container for LogArchive {
    fn node(&self, node_path: &str) -> Result<Node> {
        Ok(match self.resolve(node_path)? {
            Resolved::Group(children) => Node::Group { children },
            Resolved::Dataset(d) => {
                let header = read_dataset_header(&d)?;
                Node::Dataset {
                    dtype: header.dtype,
                    shape: header.shape,
                }
            }
        })
    }

    fn read(&self, node_path: &str) -> Result<RawBuffer> {
        match self.resolve(node_path)? {
            Resolved::Dataset(d) => {
                let header = read_dataset_header(&d)?;
                let bytes = d.read_from(header.payload)?;
                RawBuffer::new(header.dtype, header.shape, bytes)
            }
            Resolved::Group(..) => Err(Error::kind_mismatch(
                path::normalize(node_path),
                NodeKind::Dataset.name(),
                NodeKind::Group.name(),
            )),
        }
    }

    fn children(&self, node_path: &str) -> Result<Vec<String>> {
        match self.resolve(node_path)? {
            Resolved::Group(names) => Ok(names),
            Resolved::Dataset(_) => Err(Error::kind_mismatch(
                path::normalize(node_path),
                NodeKind::Group.name(),
                NodeKind::Dataset.name(),
            )),
        }
    }
}
