//! Arena-backed directory tree
//!
//! Nodes live in a vector and refer to their parent by index, so the tree has
//! no ownership cycles. Removed nodes leave an empty slot behind; slots are
//! never reused, so a stale [`DirId`] can never name a different directory.
//! Directories are addressed by slash-separated paths from the root, e.g.
//! `root/docs/2024`.

use crate::core::error::{BlockfsError, Result};
use serde::{Deserialize, Serialize};

/// Name of the root directory
pub const ROOT_NAME: &str = "root";

/// Index of a directory in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DirId(pub usize);

impl DirId {
    pub const ROOT: DirId = DirId(0);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub name: String,
    /// `None` only for the root
    pub parent: Option<DirId>,
}

/// Owned view of a directory for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryInfo {
    pub id: DirId,
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct DirectoryTree {
    nodes: Vec<Option<DirectoryNode>>,
}

impl Default for DirectoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryTree {
    /// Create a tree holding only the root directory
    pub fn new() -> Self {
        DirectoryTree {
            nodes: vec![Some(DirectoryNode {
                name: ROOT_NAME.to_string(),
                parent: None,
            })],
        }
    }

    pub fn get(&self, id: DirId) -> Option<&DirectoryNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: DirId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live directories, root included
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live directories in creation order
    pub fn iter(&self) -> impl Iterator<Item = (DirId, &DirectoryNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| node.as_ref().map(|n| (DirId(i), n)))
    }

    /// Direct children of a directory
    pub fn children(&self, parent: DirId) -> impl Iterator<Item = DirId> + '_ {
        self.iter()
            .filter(move |(_, node)| node.parent == Some(parent))
            .map(|(id, _)| id)
    }

    pub fn child_named(&self, parent: DirId, name: &str) -> Option<DirId> {
        self.children(parent)
            .find(|&id| self.get(id).is_some_and(|node| node.name == name))
    }

    /// Add a directory under `parent`
    pub fn insert(&mut self, parent: DirId, name: &str) -> Result<DirId> {
        validate_name(name)?;
        if !self.contains(parent) {
            return Err(BlockfsError::DirectoryNotFound(format!("#{}", parent.0)));
        }
        if self.child_named(parent, name).is_some() {
            return Err(BlockfsError::DuplicateName(self.join(parent, name)));
        }

        let id = DirId(self.nodes.len());
        self.nodes.push(Some(DirectoryNode {
            name: name.to_string(),
            parent: Some(parent),
        }));
        Ok(id)
    }

    /// Resolve a path such as `root/docs/2024`
    pub fn resolve(&self, path: &str) -> Result<DirId> {
        let not_found = || BlockfsError::DirectoryNotFound(path.to_string());

        let mut segments = path.split('/').filter(|s| !s.is_empty());
        match segments.next() {
            Some(first) if first == ROOT_NAME => {}
            _ => return Err(not_found()),
        }

        let mut current = DirId::ROOT;
        for segment in segments {
            current = self.child_named(current, segment).ok_or_else(not_found)?;
        }
        Ok(current)
    }

    /// Rebuild the path of a directory by walking parent links
    pub fn path(&self, id: DirId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(dir) = current {
            let node = self.get(dir)?;
            names.push(node.name.as_str());
            current = node.parent;
        }
        names.reverse();
        Some(names.join("/"))
    }

    /// A directory and everything beneath it, parents before children
    pub fn subtree(&self, id: DirId) -> Vec<DirId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut found = vec![id];
        let mut next = 0;
        while next < found.len() {
            let parent = found[next];
            found.extend(self.children(parent));
            next += 1;
        }
        found
    }

    /// Remove a directory and all of its descendants, returning their ids
    pub fn remove_subtree(&mut self, id: DirId) -> Result<Vec<DirId>> {
        if id == DirId::ROOT {
            return Err(BlockfsError::RootDirectoryRemoval);
        }
        if !self.contains(id) {
            return Err(BlockfsError::DirectoryNotFound(format!("#{}", id.0)));
        }

        let removed = self.subtree(id);
        for dir in &removed {
            self.nodes[dir.0] = None;
        }
        Ok(removed)
    }

    pub fn info(&self, id: DirId) -> Option<DirectoryInfo> {
        let node = self.get(id)?;
        Some(DirectoryInfo {
            id,
            name: node.name.clone(),
            path: self.path(id)?,
        })
    }

    fn join(&self, parent: DirId, name: &str) -> String {
        match self.path(parent) {
            Some(path) => format!("{}/{}", path, name),
            None => name.to_string(),
        }
    }
}

/// Names are single path components
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') {
        return Err(BlockfsError::InvalidName(name.to_string()));
    }
    Ok(())
}
