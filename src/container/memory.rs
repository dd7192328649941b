//! In-memory container.

use super::{Container, Node, NodeKind, RawBuffer};
use crate::util::{path, Error, Result};

enum MemNode {
    Group(Vec<(String, MemNode)>),
    Dataset(RawBuffer),
}

impl MemNode {
    fn kind(&self) -> NodeKind {
        match self {
            Self::Group(_) => NodeKind::Group,
            Self::Dataset(_) => NodeKind::Dataset,
        }
    }
}

/// Container tree held in memory.
///
/// Children keep insertion order. Intermediate groups are created on
/// demand when inserting.
///
/// ```
/// use perception_log::container::{Container, MemoryArchive, RawBuffer};
///
/// let mut archive = MemoryArchive::new();
/// archive.insert_dataset("camera/position/0", RawBuffer::from_slice(&[1.0f64, 2.0])).unwrap();
/// assert_eq!(archive.children("camera").unwrap(), vec!["position"]);
/// ```
pub struct MemoryArchive {
    root: MemNode,
}

impl Default for MemoryArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryArchive {
    /// Create an archive with an empty root group.
    pub fn new() -> Self {
        Self {
            root: MemNode::Group(Vec::new()),
        }
    }

    /// Ensure a group exists at `path`, creating parents as needed.
    pub fn insert_group(&mut self, group_path: &str) -> Result<&mut Self> {
        let parts: Vec<&str> = path::components(group_path).collect();
        Self::descend(&mut self.root, &parts, group_path)?;
        Ok(self)
    }

    /// Insert (or replace) a dataset at `path`, creating parents as needed.
    pub fn insert_dataset(&mut self, dataset_path: &str, buffer: RawBuffer) -> Result<&mut Self> {
        let parts: Vec<&str> = path::components(dataset_path).collect();
        let Some((name, parents)) = parts.split_last() else {
            return Err(Error::invalid("cannot replace the root group with a dataset"));
        };

        let children = Self::descend(&mut self.root, parents, dataset_path)?;
        match children.iter().position(|(n, _)| n == name) {
            Some(i) if children[i].1.kind() == NodeKind::Group => {
                return Err(Error::kind_mismatch(
                    path::normalize(dataset_path),
                    NodeKind::Dataset.name(),
                    NodeKind::Group.name(),
                ));
            }
            Some(i) => children[i].1 = MemNode::Dataset(buffer),
            None => children.push((name.to_string(), MemNode::Dataset(buffer))),
        }
        Ok(self)
    }

    /// Walk `parts` from `node`, creating missing groups, and return the
    /// children of the last group.
    fn descend<'a>(
        mut node: &'a mut MemNode,
        parts: &[&str],
        full: &str,
    ) -> Result<&'a mut Vec<(String, MemNode)>> {
        let not_group = || {
            Error::kind_mismatch(
                path::normalize(full),
                NodeKind::Group.name(),
                NodeKind::Dataset.name(),
            )
        };
        for part in parts {
            let MemNode::Group(children) = node else {
                return Err(not_group());
            };
            let idx = match children.iter().position(|(n, _)| n == part) {
                Some(i) => i,
                None => {
                    children.push((part.to_string(), MemNode::Group(Vec::new())));
                    children.len() - 1
                }
            };
            node = &mut children[idx].1;
        }
        match node {
            MemNode::Group(children) => Ok(children),
            MemNode::Dataset(_) => Err(not_group()),
        }
    }

    fn lookup(&self, node_path: &str) -> Result<&MemNode> {
        let mut node = &self.root;
        for part in path::components(node_path) {
            node = match node {
                MemNode::Group(children) => children
                    .iter()
                    .find(|(n, _)| n == part)
                    .map(|(_, c)| c)
                    .ok_or_else(|| Error::NodeNotFound(path::normalize(node_path)))?,
                MemNode::Dataset(_) => return Err(Error::NodeNotFound(path::normalize(node_path))),
            };
        }
        Ok(node)
    }
}

impl Container for MemoryArchive {
    fn node(&self, node_path: &str) -> Result<Node> {
        Ok(match self.lookup(node_path)? {
            MemNode::Group(children) => Node::Group {
                children: children.iter().map(|(n, _)| n.clone()).collect(),
            },
            MemNode::Dataset(buf) => Node::Dataset {
                dtype: buf.dtype(),
                shape: buf.shape().to_vec(),
            },
        })
    }

    fn read(&self, node_path: &str) -> Result<RawBuffer> {
        match self.lookup(node_path)? {
            MemNode::Dataset(buf) => Ok(buf.clone()),
            MemNode::Group(_) => Err(Error::kind_mismatch(
                path::normalize(node_path),
                NodeKind::Dataset.name(),
                NodeKind::Group.name(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::DType;

    #[test]
    fn test_insert_and_lookup() {
        let mut a = MemoryArchive::new();
        a.insert_dataset("/cam/color/1", RawBuffer::from_slice(&[9u8]))
            .unwrap()
            .insert_dataset("cam/color/0", RawBuffer::from_slice(&[8u8]))
            .unwrap()
            .insert_group("cam/empty")
            .unwrap();

        assert_eq!(a.children("").unwrap(), vec!["cam"]);
        assert_eq!(a.children("cam/").unwrap(), vec!["color", "empty"]);
        assert_eq!(a.children("cam//color").unwrap(), vec!["1", "0"]);
        assert_eq!(a.read("cam/color/0").unwrap().bytes(), &[8]);
        assert_eq!(
            a.node("cam/color/1").unwrap(),
            Node::Dataset {
                dtype: DType::Uint8,
                shape: vec![1]
            }
        );
        assert!(a.children("cam/empty").unwrap().is_empty());
    }

    #[test]
    fn test_missing_and_conflicts() {
        let mut a = MemoryArchive::new();
        a.insert_dataset("x/0", RawBuffer::from_slice(&[1u8])).unwrap();

        assert!(matches!(a.node("x/1"), Err(Error::NodeNotFound(p)) if p == "x/1"));
        assert!(matches!(a.node("x/0/deeper"), Err(Error::NodeNotFound(_))));
        assert!(a.insert_dataset("x/0/y", RawBuffer::from_slice(&[1u8])).is_err());
        assert!(a.insert_dataset("x", RawBuffer::from_slice(&[1u8])).is_err());
        assert!(a.insert_group("x/0").is_err());
        assert!(a.read("x").is_err());
    }
}
