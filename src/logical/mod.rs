//! Logical file system
//!
//! Named files in a directory tree, layered on the block [`FileStore`]. The
//! logical layer only uses the store's store/get/delete-by-identifier
//! operations: each file gets a fresh [`FileId`] and its bytes are stored
//! under that id, while names, directories, sizes and timestamps live in
//! [`FileControlBlock`]s kept here.

pub mod directory;
pub mod metadata;

pub use directory::{DirId, DirectoryInfo, DirectoryNode, DirectoryTree};
pub use metadata::{FileControlBlock, FileId, FileType};

use crate::core::config::StorageConfig;
use crate::core::error::{BlockfsError, Result};
use crate::core::file_store::{FileStore, StoreStats};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct LogicalFileSystem {
    /// Block-backed file contents, keyed by file id
    store: FileStore<FileId>,

    /// Directory arena
    directories: DirectoryTree,

    /// File control blocks in creation order
    files: Vec<FileControlBlock>,

    /// Next id to hand out
    next_file_id: u64,
}

impl LogicalFileSystem {
    pub fn new(config: StorageConfig) -> Result<Self> {
        info!(
            "Creating logical file system: {} blocks of {} bytes",
            config.memory_size, config.block_size
        );
        Ok(LogicalFileSystem {
            store: FileStore::new(config)?,
            directories: DirectoryTree::new(),
            files: Vec::new(),
            next_file_id: 0,
        })
    }

    /// Read a host file and store it as `name` in the directory at `dir_path`
    pub fn create_file<P: AsRef<Path>>(
        &mut self,
        name: &str,
        source_path: P,
        dir_path: &str,
    ) -> Result<FileId> {
        let parent = self.prepare_file(name, dir_path)?;
        let data = std::fs::read(source_path.as_ref())?;
        self.insert_file(name, &data, parent)
    }

    /// Store `data` as `name` in the directory at `dir_path`
    pub fn write_file(&mut self, name: &str, data: &[u8], dir_path: &str) -> Result<FileId> {
        let parent = self.prepare_file(name, dir_path)?;
        self.insert_file(name, data, parent)
    }

    /// Read the contents of a file
    ///
    /// With `dir_path` of `None` the first file with that name, in creation
    /// order, is used.
    pub fn read_file(&self, name: &str, dir_path: Option<&str>) -> Result<Vec<u8>> {
        let fcb = self.file(name, dir_path)?;
        debug!("Reading {} ({})", name, fcb.file_id);
        self.store.get(&fcb.file_id)
    }

    /// Copy a file out to `output_dir/name`. An existing output file is never
    /// overwritten.
    pub fn export_file<P: AsRef<Path>>(
        &self,
        name: &str,
        dir_path: Option<&str>,
        output_dir: P,
    ) -> Result<PathBuf> {
        let data = self.read_file(name, dir_path)?;
        let target = output_dir.as_ref().join(name);

        let mut out = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)?;
        out.write_all(&data)?;

        debug!("Exported {} bytes to {:?}", data.len(), target);
        Ok(target)
    }

    /// Remove a file and release its blocks
    pub fn delete_file(&mut self, name: &str, dir_path: Option<&str>) -> Result<FileControlBlock> {
        let pos = self.position(name, dir_path)?;
        self.store.delete(&self.files[pos].file_id)?;
        let fcb = self.files.remove(pos);
        debug!("Deleted {} ({})", name, fcb.file_id);
        Ok(fcb)
    }

    /// Metadata of a file
    pub fn file(&self, name: &str, dir_path: Option<&str>) -> Result<&FileControlBlock> {
        let pos = self.position(name, dir_path)?;
        Ok(&self.files[pos])
    }

    /// All files, or the files directly inside one directory
    pub fn list_files(&self, dir_path: Option<&str>) -> Result<Vec<&FileControlBlock>> {
        match dir_path {
            None => Ok(self.files.iter().collect()),
            Some(path) => {
                let dir = self.directories.resolve(path)?;
                Ok(self.files.iter().filter(|f| f.parent == dir).collect())
            }
        }
    }

    /// Create a directory `name` under the directory at `parent_path`
    pub fn create_directory(&mut self, name: &str, parent_path: &str) -> Result<DirId> {
        let parent = self.directories.resolve(parent_path)?;
        let id = self.directories.insert(parent, name)?;
        info!("Created directory {}/{}", parent_path.trim_end_matches('/'), name);
        Ok(id)
    }

    /// Remove a directory, every directory beneath it and all of their files.
    /// Returns the number of files removed.
    pub fn delete_directory(&mut self, path: &str) -> Result<usize> {
        let dir = self.directories.resolve(path)?;
        if dir == DirId::ROOT {
            return Err(BlockfsError::RootDirectoryRemoval);
        }

        let doomed = self.directories.subtree(dir);
        let mut removed = 0;
        while let Some(pos) = self.files.iter().position(|f| doomed.contains(&f.parent)) {
            self.store.delete(&self.files[pos].file_id)?;
            self.files.remove(pos);
            removed += 1;
        }

        self.directories.remove_subtree(dir)?;
        info!("Deleted directory {} ({} files)", path, removed);
        Ok(removed)
    }

    /// All directories, or the direct children of one
    pub fn list_directories(&self, parent_path: Option<&str>) -> Result<Vec<DirectoryInfo>> {
        let ids: Vec<DirId> = match parent_path {
            None => self.directories.iter().map(|(id, _)| id).collect(),
            Some(path) => {
                let parent = self.directories.resolve(path)?;
                self.directories.children(parent).collect()
            }
        };
        Ok(ids
            .into_iter()
            .filter_map(|id| self.directories.info(id))
            .collect())
    }

    pub fn directory_path(&self, id: DirId) -> Option<String> {
        self.directories.path(id)
    }

    pub fn directories(&self) -> &DirectoryTree {
        &self.directories
    }

    pub fn store(&self) -> &FileStore<FileId> {
        &self.store
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// Check the block store and that metadata and stored data agree
    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;

        for fcb in &self.files {
            if !self.store.contains(&fcb.file_id) {
                return Err(BlockfsError::InvariantViolation(format!(
                    "{} has no data under {}",
                    fcb.file_name, fcb.file_id
                )));
            }
            if !self.directories.contains(fcb.parent) {
                return Err(BlockfsError::InvariantViolation(format!(
                    "{} lives in a removed directory",
                    fcb.file_name
                )));
            }
        }

        if self.store.len() != self.files.len() {
            return Err(BlockfsError::InvariantViolation(format!(
                "{} stored payloads for {} files",
                self.store.len(),
                self.files.len()
            )));
        }
        Ok(())
    }

    /// Validate a new file's name and destination before touching any data
    fn prepare_file(&self, name: &str, dir_path: &str) -> Result<DirId> {
        directory::validate_name(name)?;
        let parent = self.directories.resolve(dir_path)?;
        if self
            .files
            .iter()
            .any(|f| f.parent == parent && f.file_name == name)
        {
            return Err(BlockfsError::DuplicateName(format!(
                "{}/{}",
                dir_path.trim_end_matches('/'),
                name
            )));
        }
        Ok(parent)
    }

    fn insert_file(&mut self, name: &str, data: &[u8], parent: DirId) -> Result<FileId> {
        let id = FileId(self.next_file_id);
        self.next_file_id += 1;

        self.store.store(id, data)?;
        self.files.push(FileControlBlock::new(name, id, data.len() as u64, parent));
        debug!("Created {} ({} bytes) as {}", name, data.len(), id);
        Ok(id)
    }

    fn position(&self, name: &str, dir_path: Option<&str>) -> Result<usize> {
        let parent = dir_path.map(|p| self.directories.resolve(p)).transpose()?;
        self.files
            .iter()
            .position(|f| f.file_name == name && parent.map_or(true, |dir| f.parent == dir))
            .ok_or_else(|| match dir_path {
                Some(path) => {
                    BlockfsError::FileNotFound(format!("{}/{}", path.trim_end_matches('/'), name))
                }
                None => BlockfsError::FileNotFound(name.to_string()),
            })
    }
}
