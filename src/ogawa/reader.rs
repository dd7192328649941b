//! Ogawa format reader implementation.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use memmap2::Mmap;
use parking_lot::Mutex;

use super::format::*;
use crate::util::{Error, Result};

/// Parsed archive header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub frozen: bool,
    pub root_pos: u64,
}

impl Header {
    /// Parse and validate the 16-byte header.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::UnexpectedEof(data.len() as u64));
        }
        if &data[0..5] != OGAWA_MAGIC {
            return Err(Error::InvalidMagic);
        }

        let frozen = data[FROZEN_OFFSET] == FROZEN_FLAG;
        let version = LittleEndian::read_u16(&data[VERSION_OFFSET..]);
        let root_pos = LittleEndian::read_u64(&data[ROOT_POS_OFFSET..]);

        Ok(Self {
            version,
            frozen,
            root_pos,
        })
    }
}

/// Input streams for reading Ogawa data.
/// Memory-mapped when possible, buffered file reads otherwise.
pub struct IStreams {
    inner: StreamsInner,
    header: Header,
    size: u64,
}

enum StreamsInner {
    Mmap(Mmap),
    File(Mutex<File>),
}

impl IStreams {
    /// Open a file for reading, memory-mapped when the `mmap` feature is on.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_opts(path, cfg!(feature = "mmap"))
    }

    /// Open a file with optional memory mapping.
    pub fn open_opts(path: impl AsRef<Path>, use_mmap: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let size = file.metadata()?.len();
        if size < HEADER_SIZE as u64 {
            return Err(Error::UnexpectedEof(size));
        }

        let (inner, header) = if use_mmap {
            // Safety: the file is opened read-only and never written by this process.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
            let header = Header::parse(&mmap[..HEADER_SIZE])?;
            (StreamsInner::Mmap(mmap), header)
        } else {
            let mut file = file;
            let mut buf = [0u8; HEADER_SIZE];
            file.seek(SeekFrom::Start(0))?;
            file.read_exact(&mut buf)?;
            (StreamsInner::File(Mutex::new(file)), Header::parse(&buf)?)
        };

        if header.root_pos >= size {
            return Err(Error::invalid(format!(
                "root group position {} beyond file size {}",
                header.root_pos, size
            )));
        }

        Ok(Self { inner, header, size })
    }

    /// Parsed header.
    #[inline]
    pub fn header(&self) -> Header {
        self.header
    }

    /// Get the total file size.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Check if the streams are memory-mapped.
    #[inline]
    pub fn is_mapped(&self) -> bool {
        matches!(self.inner, StreamsInner::Mmap(_))
    }

    /// Read bytes into an existing buffer.
    pub fn read_into(&self, pos: u64, buf: &mut [u8]) -> Result<()> {
        let end = pos
            .checked_add(buf.len() as u64)
            .ok_or(Error::UnexpectedEof(u64::MAX))?;
        if end > self.size {
            return Err(Error::UnexpectedEof(end));
        }

        match &self.inner {
            StreamsInner::Mmap(mmap) => {
                buf.copy_from_slice(&mmap[pos as usize..end as usize]);
            }
            StreamsInner::File(file) => {
                let mut f = file.lock();
                f.seek(SeekFrom::Start(pos))?;
                f.read_exact(buf)?;
            }
        }
        Ok(())
    }

    /// Read `len` bytes at a specific position.
    pub fn read_bytes(&self, pos: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_into(pos, &mut buf)?;
        Ok(buf)
    }

    /// Read a u64 value at the given position.
    pub fn read_u64(&self, pos: u64) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_into(pos, &mut buf)?;
        Ok(LittleEndian::read_u64(&buf))
    }
}

/// Ogawa archive reader.
pub struct IArchive {
    streams: Arc<IStreams>,
    root: IGroup,
}

impl IArchive {
    /// Open an Ogawa file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_streams(IStreams::open(path)?)
    }

    /// Open an Ogawa file with explicit memory-mapping choice.
    pub fn open_opts(path: impl AsRef<Path>, use_mmap: bool) -> Result<Self> {
        Self::from_streams(IStreams::open_opts(path, use_mmap)?)
    }

    fn from_streams(streams: IStreams) -> Result<Self> {
        let streams = Arc::new(streams);
        let root = IGroup::new(streams.clone(), streams.header().root_pos)?;
        Ok(Self { streams, root })
    }

    /// Check if the archive is frozen (finalized).
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.streams.header().frozen
    }

    /// Get the format version.
    #[inline]
    pub fn version(&self) -> u16 {
        self.streams.header().version
    }

    /// Get the root group.
    #[inline]
    pub fn root(&self) -> &IGroup {
        &self.root
    }

    /// Get access to the underlying streams.
    #[inline]
    pub fn streams(&self) -> &Arc<IStreams> {
        &self.streams
    }
}

/// A group in the Ogawa hierarchy.
/// Groups contain children which can be either data or other groups.
#[derive(Clone)]
pub struct IGroup {
    streams: Arc<IStreams>,
    pos: u64,
    child_offsets: Vec<u64>,
}

impl IGroup {
    /// Create a new group reader at the given position.
    pub fn new(streams: Arc<IStreams>, pos: u64) -> Result<Self> {
        // Position 0 is the empty group marker
        let num_children = if pos == 0 { 0 } else { streams.read_u64(pos)? };

        // Each offset takes 8 bytes; reject counts the file cannot hold
        if num_children > streams.size() / 8 {
            return Err(Error::invalid(format!(
                "group at {} claims {} children",
                pos, num_children
            )));
        }

        let mut child_offsets = Vec::with_capacity(num_children as usize);
        for i in 0..num_children {
            child_offsets.push(streams.read_u64(pos + 8 + i * 8)?);
        }

        Ok(Self {
            streams,
            pos,
            child_offsets,
        })
    }

    /// Get the position of this group in the file.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Get the number of children.
    #[inline]
    pub fn num_children(&self) -> u64 {
        self.child_offsets.len() as u64
    }

    /// Check if this group is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.child_offsets.is_empty()
    }

    /// Get the raw offset for a child (with group/data flag).
    pub fn child_offset(&self, index: u64) -> Result<u64> {
        self.child_offsets
            .get(index as usize)
            .copied()
            .ok_or(Error::ChildOutOfBounds {
                index: index as usize,
                count: self.child_offsets.len(),
            })
    }

    /// Check if child at index is a group.
    pub fn is_child_group(&self, index: u64) -> Result<bool> {
        Ok(is_group_offset(self.child_offset(index)?))
    }

    /// Get a child, either group or data.
    pub fn child(&self, index: u64) -> Result<IChild> {
        let offset = self.child_offset(index)?;
        let pos = extract_offset(offset);
        if is_group_offset(offset) {
            Ok(IChild::Group(IGroup::new(self.streams.clone(), pos)?))
        } else {
            Ok(IChild::Data(IData::new(self.streams.clone(), pos)?))
        }
    }

    /// Get child data.
    pub fn data(&self, index: u64) -> Result<IData> {
        match self.child(index)? {
            IChild::Data(d) => Ok(d),
            IChild::Group(g) => Err(Error::kind_mismatch(
                format!("group@{}[{}]", self.pos, g.pos),
                "data",
                "group",
            )),
        }
    }
}

/// A child in the Ogawa hierarchy - either a Group or Data.
pub enum IChild {
    Group(IGroup),
    Data(IData),
}

/// Data block in the Ogawa hierarchy.
pub struct IData {
    streams: Arc<IStreams>,
    pos: u64,
    size: u64,
}

impl IData {
    /// Create a new data reader at the given position.
    pub fn new(streams: Arc<IStreams>, pos: u64) -> Result<Self> {
        // Position 0 is the empty data marker
        let size = if pos == 0 { 0 } else { streams.read_u64(pos)? };
        if size > streams.size() {
            return Err(Error::UnexpectedEof(pos.saturating_add(size)));
        }
        Ok(Self { streams, pos, size })
    }

    /// Get the size of the data in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Check if this data is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Read the first `len` bytes of the block.
    pub fn read_prefix(&self, len: usize) -> Result<Vec<u8>> {
        if len as u64 > self.size {
            return Err(Error::UnexpectedEof(self.pos + 8 + len as u64));
        }
        if len == 0 {
            return Ok(Vec::new());
        }
        self.streams.read_bytes(self.pos + 8, len)
    }

    /// Read the block from `offset` to its end.
    pub fn read_from(&self, offset: u64) -> Result<Vec<u8>> {
        if offset > self.size {
            return Err(Error::UnexpectedEof(self.pos + 8 + offset));
        }
        let len = (self.size - offset) as usize;
        if len == 0 {
            return Ok(Vec::new());
        }
        self.streams.read_bytes(self.pos + 8 + offset, len)
    }

    /// Read all data as bytes.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        self.read_from(0)
    }
}
