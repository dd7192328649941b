//! Frame stacking.

use tracing::debug;

use crate::container::{Container, Node, NodeKind};
use crate::util::{path, DType, Error, Result};

/// Frames of one namespace concatenated row-wise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stacked {
    dtype: DType,
    rows: usize,
    cols: usize,
    bytes: Vec<u8>,
}

impl Stacked {
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Little-endian element bytes, row-major.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes of row `i`.
    pub fn row_bytes(&self, i: usize) -> Option<&[u8]> {
        let width = self.cols * self.dtype.num_bytes();
        (i < self.rows).then(|| &self.bytes[i * width..(i + 1) * width])
    }

    /// Row `i` converted to f64.
    pub fn row_f64(&self, i: usize) -> Option<Vec<f64>> {
        let width = self.dtype.num_bytes();
        self.row_bytes(i)
            .map(|r| r.chunks_exact(width).map(|c| self.dtype.element_to_f64(c)).collect())
    }

    /// All rows converted to f64.
    pub fn to_f64_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows).filter_map(|i| self.row_f64(i)).collect()
    }
}

/// Children of `namespace` parsed as frame indices, ascending numerically.
///
/// Every child name must be a non-negative integer.
pub fn frame_keys<C: Container + ?Sized>(container: &C, namespace: &str) -> Result<Vec<(u64, String)>> {
    let mut keys = container
        .children(namespace)?
        .into_iter()
        .map(|key| match key.parse::<u64>() {
            Ok(index) => Ok((index, key)),
            Err(_) => Err(Error::InvalidFrameKey {
                namespace: path::as_group(namespace),
                key,
            }),
        })
        .collect::<Result<Vec<_>>>()?;
    keys.sort_by_key(|(index, _)| *index);
    Ok(keys)
}

/// Stack every frame of `namespace` into one array, in ascending
/// numeric key order (`1, 2, 10`, never `1, 10, 2`).
pub fn get_data<C: Container + ?Sized>(container: &C, namespace: &str) -> Result<Stacked> {
    let keys = frame_keys(container, namespace)?;
    debug!(namespace = %namespace, frames = keys.len(), "stacking frames");

    let mut stacked: Option<Stacked> = None;
    for (_, key) in keys {
        let frame_path = path::join(namespace, &key);
        if let Node::Group { .. } = container.node(&frame_path)? {
            return Err(Error::kind_mismatch(
                frame_path,
                NodeKind::Dataset.name(),
                NodeKind::Group.name(),
            ));
        }

        debug!("Appending: {}", frame_path);
        let buffer = container.read(&frame_path)?;
        let (rows, cols) = buffer.rows_cols();

        match stacked.as_mut() {
            None => {
                stacked = Some(Stacked {
                    dtype: buffer.dtype(),
                    rows,
                    cols,
                    bytes: buffer.into_bytes(),
                });
            }
            Some(acc) => {
                if buffer.dtype() != acc.dtype {
                    return Err(Error::TypeMismatch {
                        path: frame_path,
                        expected: acc.dtype.name().to_string(),
                        actual: buffer.dtype().name().to_string(),
                    });
                }
                if cols != acc.cols {
                    return Err(Error::ShapeMismatch {
                        path: frame_path,
                        expected: acc.cols,
                        actual: cols,
                    });
                }
                acc.rows += rows;
                acc.bytes.extend_from_slice(buffer.bytes());
            }
        }
    }

    stacked.ok_or_else(|| Error::EmptyNamespace(path::as_group(namespace)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{MemoryArchive, RawBuffer};

    #[test]
    fn test_two_rows_in_order() {
        let mut a = MemoryArchive::new();
        a.insert_dataset("ns/1", RawBuffer::from_slice(&[3i64, 4]))
            .unwrap()
            .insert_dataset("ns/0", RawBuffer::from_slice(&[1i64, 2]))
            .unwrap();

        let s = get_data(&a, "ns/").unwrap();
        assert_eq!(s.shape(), (2, 2));
        assert_eq!(s.dtype(), DType::Int64);
        assert_eq!(s.to_f64_rows(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_numeric_not_lexicographic_order() {
        let mut a = MemoryArchive::new();
        for key in ["10", "2", "1"] {
            let v: f64 = key.parse().unwrap();
            a.insert_dataset(&format!("ns/{key}"), RawBuffer::from_slice(&[v]))
                .unwrap();
        }
        let s = get_data(&a, "ns").unwrap();
        assert_eq!(s.to_f64_rows(), vec![vec![1.0], vec![2.0], vec![10.0]]);

        let keys: Vec<u64> = frame_keys(&a, "ns").unwrap().into_iter().map(|(i, _)| i).collect();
        assert_eq!(keys, vec![1, 2, 10]);
    }

    #[test]
    fn test_matrix_frames_contribute_rows() {
        let mut a = MemoryArchive::new();
        a.insert_dataset("m/0", RawBuffer::from_shape(vec![2, 2], &[1u8, 2, 3, 4]).unwrap())
            .unwrap()
            .insert_dataset("m/1", RawBuffer::from_slice(&[5u8, 6]))
            .unwrap();
        let s = get_data(&a, "m").unwrap();
        assert_eq!(s.shape(), (3, 2));
        assert_eq!(s.row_bytes(2), Some(&[5u8, 6][..]));
        assert_eq!(s.row_bytes(3), None);
    }

    #[test]
    fn test_invalid_keys() {
        let mut a = MemoryArchive::new();
        a.insert_dataset("ns/0", RawBuffer::from_slice(&[1u8]))
            .unwrap()
            .insert_dataset("ns/-1", RawBuffer::from_slice(&[1u8]))
            .unwrap();
        assert!(matches!(
            get_data(&a, "ns"),
            Err(Error::InvalidFrameKey { key, .. }) if key == "-1"
        ));
    }

    #[test]
    fn test_mismatches_and_empty() {
        let mut a = MemoryArchive::new();
        a.insert_dataset("w/0", RawBuffer::from_slice(&[1u8, 2]))
            .unwrap()
            .insert_dataset("w/1", RawBuffer::from_slice(&[1u8]))
            .unwrap()
            .insert_dataset("t/0", RawBuffer::from_slice(&[1u8]))
            .unwrap()
            .insert_dataset("t/1", RawBuffer::from_slice(&[1u16]))
            .unwrap()
            .insert_group("g/0")
            .unwrap()
            .insert_group("empty")
            .unwrap();

        assert!(matches!(get_data(&a, "w"), Err(Error::ShapeMismatch { expected: 2, actual: 1, .. })));
        assert!(matches!(get_data(&a, "t"), Err(Error::TypeMismatch { .. })));
        assert!(matches!(get_data(&a, "g"), Err(Error::TypeMismatch { .. })));
        assert!(matches!(get_data(&a, "empty"), Err(Error::EmptyNamespace(_))));
    }
}
