//! File-backed container over HDF5 logs.
//!
//! HDF5 groups and datasets map one to one onto [`Node`]. Children are
//! listed in the library's name order. Only fixed-width integer and
//! 32/64-bit float datasets can be read.

use std::path::{Path, PathBuf};

use hdf5::types::{FloatSize, IntSize, TypeDescriptor};
use tracing::debug;

use super::{Container, Node, NodeKind, RawBuffer};
use crate::util::{path, DType, Error, Result};

enum Located {
    Group(hdf5::Group),
    Dataset(hdf5::Dataset),
}

/// Read-only perception log stored as HDF5.
pub struct Hdf5Archive {
    path: PathBuf,
    file: hdf5::File,
}

impl Hdf5Archive {
    /// Open an HDF5 log for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let file = hdf5::File::open(path)?;
        debug!(path = %path.display(), "opened hdf5 log");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Path the archive was opened from.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn locate(&self, node_path: &str) -> Result<Located> {
        let p = path::normalize(node_path);
        if p.is_empty() {
            return Ok(Located::Group(self.file.group("/")?));
        }
        if !self.file.link_exists(&p) {
            return Err(Error::NodeNotFound(p));
        }
        match self.file.group(&p) {
            Ok(g) => Ok(Located::Group(g)),
            Err(_) => Ok(Located::Dataset(self.file.dataset(&p)?)),
        }
    }
}

/// Element type of an HDF5 dataset.
fn dtype_of(dataset: &hdf5::Dataset, node_path: &str) -> Result<DType> {
    let descriptor = dataset.dtype()?.to_descriptor()?;
    Ok(match descriptor {
        TypeDescriptor::Unsigned(IntSize::U1) => DType::Uint8,
        TypeDescriptor::Unsigned(IntSize::U2) => DType::Uint16,
        TypeDescriptor::Unsigned(IntSize::U4) => DType::Uint32,
        TypeDescriptor::Unsigned(IntSize::U8) => DType::Uint64,
        TypeDescriptor::Integer(IntSize::U1) => DType::Int8,
        TypeDescriptor::Integer(IntSize::U2) => DType::Int16,
        TypeDescriptor::Integer(IntSize::U4) => DType::Int32,
        TypeDescriptor::Integer(IntSize::U8) => DType::Int64,
        TypeDescriptor::Float(FloatSize::U4) => DType::Float32,
        TypeDescriptor::Float(FloatSize::U8) => DType::Float64,
        other => {
            return Err(Error::TypeMismatch {
                path: path::normalize(node_path),
                expected: "numeric dataset".into(),
                actual: format!("{:?}", other),
            })
        }
    })
}

fn read_buffer(dataset: &hdf5::Dataset, dtype: DType) -> Result<RawBuffer> {
    let shape = dataset.shape();
    match dtype {
        DType::Uint8 => RawBuffer::from_shape(shape, &dataset.read_raw::<u8>()?[..]),
        DType::Int8 => RawBuffer::from_shape(shape, &dataset.read_raw::<i8>()?[..]),
        DType::Uint16 => RawBuffer::from_shape(shape, &dataset.read_raw::<u16>()?[..]),
        DType::Int16 => RawBuffer::from_shape(shape, &dataset.read_raw::<i16>()?[..]),
        DType::Uint32 => RawBuffer::from_shape(shape, &dataset.read_raw::<u32>()?[..]),
        DType::Int32 => RawBuffer::from_shape(shape, &dataset.read_raw::<i32>()?[..]),
        DType::Uint64 => RawBuffer::from_shape(shape, &dataset.read_raw::<u64>()?[..]),
        DType::Int64 => RawBuffer::from_shape(shape, &dataset.read_raw::<i64>()?[..]),
        DType::Float32 => RawBuffer::from_shape(shape, &dataset.read_raw::<f32>()?[..]),
        DType::Float64 => RawBuffer::from_shape(shape, &dataset.read_raw::<f64>()?[..]),
        DType::Float16 => Err(Error::other("float16 HDF5 datasets are not supported")),
    }
}

impl Container for Hdf5Archive {
    fn node(&self, node_path: &str) -> Result<Node> {
        Ok(match self.locate(node_path)? {
            Located::Group(g) => Node::Group {
                children: g.member_names()?,
            },
            Located::Dataset(d) => Node::Dataset {
                dtype: dtype_of(&d, node_path)?,
                shape: d.shape(),
            },
        })
    }

    fn read(&self, node_path: &str) -> Result<RawBuffer> {
        match self.locate(node_path)? {
            Located::Dataset(d) => read_buffer(&d, dtype_of(&d, node_path)?),
            Located::Group(_) => Err(Error::kind_mismatch(
                path::normalize(node_path),
                NodeKind::Dataset.name(),
                NodeKind::Group.name(),
            )),
        }
    }
}
