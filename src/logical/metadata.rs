//! File control blocks

use crate::logical::directory::DirId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key under which a file's data lives in the file store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file-{}", self.0)
    }
}

/// File type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Plain text (and anything unrecognised)
    Txt,
    /// PNG image
    Png,
}

impl FileType {
    /// Infer the type from a file name's extension
    pub fn from_name(name: &str) -> Self {
        match name.rsplit_once('.') {
            Some((_, ext)) if ext.eq_ignore_ascii_case("png") => FileType::Png,
            _ => FileType::Txt,
        }
    }
}

/// Metadata for one file in the logical file system
///
/// Holds everything about a file except its content: the name, the directory
/// it lives in, its size and type, and the id of its data in the file store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileControlBlock {
    pub file_name: String,
    pub file_id: FileId,
    pub file_type: FileType,
    pub modified: DateTime<Utc>,
    /// File size in bytes
    pub size: u64,
    /// Directory holding the file
    pub parent: DirId,
}

impl FileControlBlock {
    pub fn new(file_name: impl Into<String>, file_id: FileId, size: u64, parent: DirId) -> Self {
        let file_name = file_name.into();
        FileControlBlock {
            file_type: FileType::from_name(&file_name),
            file_name,
            file_id,
            modified: Utc::now(),
            size,
            parent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_name() {
        assert_eq!(FileType::from_name("image.png"), FileType::Png);
        assert_eq!(FileType::from_name("IMAGE.PNG"), FileType::Png);
        assert_eq!(FileType::from_name("notes.txt"), FileType::Txt);
        assert_eq!(FileType::from_name("README"), FileType::Txt);
        assert_eq!(FileType::from_name("archive.png.txt"), FileType::Txt);
    }

    #[test]
    fn test_fcb_creation() {
        let fcb = FileControlBlock::new("photo.png", FileId(7), 2048, DirId::ROOT);
        assert_eq!(fcb.file_name, "photo.png");
        assert_eq!(fcb.file_id, FileId(7));
        assert_eq!(fcb.file_type, FileType::Png);
        assert_eq!(fcb.size, 2048);
        assert_eq!(fcb.parent, DirId::ROOT);
    }

    #[test]
    fn test_file_id_display() {
        assert_eq!(FileId(42).to_string(), "file-42");
    }

    #[test]
    fn test_serialization() {
        let fcb = FileControlBlock::new("a.txt", FileId(3), 17, DirId::ROOT);
        let json = serde_json::to_string(&fcb).unwrap();
        let deserialized: FileControlBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, fcb);
    }
}
