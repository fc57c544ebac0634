//! Drive entry model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a drive entry (Drive file ID, or the `root` alias)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub String);

impl FileId {
    /// Alias the Drive API accepts for the caller's "My Drive" folder
    pub const ROOT: &'static str = "root";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single entry returned by a folder listing
///
/// Nodes are transient: they are built from one listing page, handed to the
/// traversal and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub id: FileId,
    pub name: String,
    pub is_folder: bool,
    /// True when the authenticated account is the first listed owner
    pub is_owned_by_caller: bool,
}

impl FileNode {
    /// Create a plain (non-folder) file node
    pub fn file(id: impl Into<FileId>, name: impl Into<String>, owned: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_folder: false,
            is_owned_by_caller: owned,
        }
    }

    /// Create a folder node
    pub fn folder(id: impl Into<FileId>, name: impl Into<String>, owned: bool) -> Self {
        Self {
            is_folder: true,
            ..Self::file(id, name, owned)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_alias() {
        assert_eq!(FileId::root().as_str(), "root");
        assert_eq!(FileId::root(), FileId::from("root"));
    }

    #[test]
    fn test_folder_constructor() {
        let node = FileNode::folder("f1", "Reports", true);
        assert!(node.is_folder);
        assert!(node.is_owned_by_caller);
        assert_eq!(node.id.to_string(), "f1");

        let node = FileNode::file("f2", "notes.txt", false);
        assert!(!node.is_folder);
        assert!(!node.is_owned_by_caller);
    }
}
