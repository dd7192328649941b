//! Tree traversal.

use crate::container::{Container, Node};
use crate::util::{path, Error, Result};

/// Deepest group nesting a traversal follows before reporting a cycle.
pub const MAX_DEPTH: usize = 256;

/// Visit every node below the root, depth-first, parents before children.
///
/// `f` receives the canonical path (no leading or trailing separator) and
/// the resolved node. Sibling order is whatever the container yields.
pub fn visit<C, F>(container: &C, mut f: F) -> Result<()>
where
    C: Container + ?Sized,
    F: FnMut(&str, &Node),
{
    let children = container.children("")?;
    visit_children(container, "", children, 0, &mut f)
}

fn visit_children<C, F>(container: &C, parent: &str, children: Vec<String>, depth: usize, f: &mut F) -> Result<()>
where
    C: Container + ?Sized,
    F: FnMut(&str, &Node),
{
    if depth >= MAX_DEPTH {
        return Err(Error::invalid(format!(
            "groups nested deeper than {} below {}",
            MAX_DEPTH,
            path::as_group(parent)
        )));
    }

    for name in children {
        let child_path = path::join(parent, &name);
        if path::components(&name).count() != 1 {
            return Err(Error::invalid(format!(
                "child {:?} of {} is not a single path component",
                name,
                path::as_group(parent)
            )));
        }
        let node = container.node(&child_path)?;
        f(&child_path, &node);
        if let Node::Group { children } = node {
            visit_children(container, &child_path, children, depth + 1, f)?;
        }
    }
    Ok(())
}

/// Groups and datasets found by one traversal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    /// Group paths, each with a trailing separator.
    pub groups: Vec<String>,
    /// Dataset paths.
    pub datasets: Vec<String>,
}

impl Tree {
    /// Walk the whole container once.
    pub fn collect<C: Container + ?Sized>(container: &C) -> Result<Self> {
        let mut tree = Self::default();
        visit(container, |p, node| match node {
            Node::Group { .. } => tree.groups.push(path::as_group(p)),
            Node::Dataset { .. } => tree.datasets.push(p.to_string()),
        })?;
        Ok(tree)
    }

    /// Total number of visited nodes.
    pub fn len(&self) -> usize {
        self.groups.len() + self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.datasets.is_empty()
    }
}

/// All group paths, each suffixed with a trailing separator.
pub fn collect_groups<C: Container + ?Sized>(container: &C) -> Result<Vec<String>> {
    Ok(Tree::collect(container)?.groups)
}

/// All dataset paths.
pub fn collect_datasets<C: Container + ?Sized>(container: &C) -> Result<Vec<String>> {
    Ok(Tree::collect(container)?.datasets)
}
