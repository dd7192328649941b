//! Writes containers to disk in the named Ogawa layout for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use tempfile::NamedTempFile;

use perception_log::ogawa::{
    make_data_offset, make_group_offset, CURRENT_VERSION, FROZEN_FLAG, HEADER_SIZE, NAME_TERMINATOR,
    OGAWA_MAGIC,
};
use perception_log::util::path;
use perception_log::{Container, MemoryArchive, Node, RawBuffer};

/// Append-only byte sink that lays out Ogawa blocks.
pub struct BlockWriter {
    out: Vec<u8>,
}

impl BlockWriter {
    pub fn new() -> Self {
        let mut out = Vec::with_capacity(4096);
        out.extend_from_slice(OGAWA_MAGIC);
        out.push(FROZEN_FLAG);
        out.write_u16::<LittleEndian>(CURRENT_VERSION).unwrap();
        out.write_u64::<LittleEndian>(0).unwrap();
        assert_eq!(out.len(), HEADER_SIZE);
        Self { out }
    }

    /// Position the next block will be written at.
    pub fn position(&self) -> u64 {
        self.out.len() as u64
    }

    pub fn data(&mut self, bytes: &[u8]) -> u64 {
        let pos = self.out.len() as u64;
        self.out.write_u64::<LittleEndian>(bytes.len() as u64).unwrap();
        self.out.extend_from_slice(bytes);
        make_data_offset(pos)
    }

    pub fn group(&mut self, children: &[u64]) -> u64 {
        let pos = self.out.len() as u64;
        self.out.write_u64::<LittleEndian>(children.len() as u64).unwrap();
        for &child in children {
            self.out.write_u64::<LittleEndian>(child).unwrap();
        }
        make_group_offset(pos)
    }

    fn node<C: Container>(&mut self, container: &C, node_path: &str) -> u64 {
        match container.node(node_path).unwrap() {
            Node::Group { children } => {
                let mut names = Vec::new();
                for name in &children {
                    names.extend_from_slice(name.as_bytes());
                    names.push(NAME_TERMINATOR);
                }
                let mut offsets = vec![self.data(&names)];
                for name in &children {
                    offsets.push(self.node(container, &path::join(node_path, name)));
                }
                self.group(&offsets)
            }
            Node::Dataset { .. } => {
                let buffer = container.read(node_path).unwrap();
                self.dataset(&buffer)
            }
        }
    }

    pub fn dataset(&mut self, buffer: &RawBuffer) -> u64 {
        let mut block = Vec::with_capacity(4 + buffer.shape().len() * 8 + buffer.bytes().len());
        block.push(buffer.dtype().code());
        block.push(buffer.shape().len() as u8);
        block.extend_from_slice(&[0, 0]);
        for &dim in buffer.shape() {
            block.write_u64::<LittleEndian>(dim as u64).unwrap();
        }
        block.extend_from_slice(buffer.bytes());
        self.data(&block)
    }

    pub fn finish(mut self, root: u64) -> Vec<u8> {
        (&mut self.out[8..16]).write_u64::<LittleEndian>(root).unwrap();
        self.out
    }
}

/// Serialize any container into log archive bytes.
pub fn encode<C: Container>(container: &C) -> Vec<u8> {
    let mut writer = BlockWriter::new();
    let root = writer.node(container, "");
    writer.finish(root)
}

/// Write a container to `path`.
pub fn write_log<C: Container>(container: &C, path: &Path) {
    std::fs::write(path, encode(container)).expect("failed to write log");
}

/// Write raw archive bytes to a fresh temp file.
pub fn temp_bytes(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// Write a container to a fresh temp file with the `.plog` extension.
pub fn temp_log<C: Container>(container: &C) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".plog")
        .tempfile()
        .expect("failed to create temp file");
    file.write_all(&encode(container)).unwrap();
    file.flush().unwrap();
    file
}

/// Add `count` frames of `values` (offset by the frame index) under `namespace`.
pub fn add_frames(archive: &mut MemoryArchive, namespace: &str, count: usize, values: &[f64]) {
    for i in 0..count {
        let frame: Vec<f64> = values.iter().map(|v| v + i as f64).collect();
        archive
            .insert_dataset(&path::join(namespace, &i.to_string()), RawBuffer::from_slice(&frame[..]))
            .unwrap();
    }
}

/// PNG bytes of a solid `width` x `height` image.
pub fn png_frame(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
    bytes.into_inner()
}

/// Add `count` PNG frames under `channel`.
pub fn add_image_frames(archive: &mut MemoryArchive, channel: &str, count: usize) {
    for i in 0..count {
        let png = png_frame(4, 3, [(i as u8).wrapping_mul(40), 0, 255]);
        archive
            .insert_dataset(&path::join(channel, &i.to_string()), RawBuffer::from_slice(&png[..]))
            .unwrap();
    }
}
