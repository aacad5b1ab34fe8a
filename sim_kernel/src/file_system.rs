//! # Simulated File System
//!
//! A flat, in-memory file system with a fixed byte capacity.
//!
//! Files have a path and a size; no contents are stored. Handles are issued
//! from a counter and never reused, so closing a handle twice is detected as
//! a stale handle instead of silently closing someone else's file.

use core_types::{FileHandle, TaskId};
use kernel_api::KernelError;
use std::collections::BTreeMap;

/// An open handle and what it refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFileEntry {
    pub path: String,
    pub owner: TaskId,
}

/// In-memory file system
#[derive(Debug, Clone)]
pub struct SimFileSystem {
    capacity_bytes: u64,
    /// path -> size in bytes
    files: BTreeMap<String, u64>,
    open: BTreeMap<FileHandle, OpenFileEntry>,
    next_handle: u64,
}

impl SimFileSystem {
    /// Creates an empty file system holding at most `capacity_bytes`
    pub fn new(capacity_bytes: u64) -> Self {
        Self {
            capacity_bytes,
            files: BTreeMap::new(),
            open: BTreeMap::new(),
            next_handle: 1,
        }
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    pub fn used_bytes(&self) -> u64 {
        self.files.values().sum()
    }

    pub fn available_bytes(&self) -> u64 {
        self.capacity_bytes.saturating_sub(self.used_bytes())
    }

    pub fn create(&mut self, path: &str, size_bytes: u64) -> Result<(), KernelError> {
        if self.files.contains_key(path) {
            return Err(KernelError::FileExists(path.to_string()));
        }
        let available = self.available_bytes();
        if size_bytes > available {
            return Err(KernelError::FileSystemFull {
                requested: size_bytes,
                available,
            });
        }
        self.files.insert(path.to_string(), size_bytes);
        Ok(())
    }

    /// Deletes a file
    ///
    /// Handles still open on the path stay open; they simply refer to a file
    /// that no longer has a name.
    pub fn delete(&mut self, path: &str) -> Result<(), KernelError> {
        self.files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| KernelError::FileNotFound(path.to_string()))
    }

    pub fn open(&mut self, path: &str, owner: TaskId) -> Option<FileHandle> {
        if !self.files.contains_key(path) {
            return None;
        }
        let handle = FileHandle::new(self.next_handle);
        self.next_handle += 1;
        self.open.insert(
            handle,
            OpenFileEntry {
                path: path.to_string(),
                owner,
            },
        );
        Some(handle)
    }

    pub fn close(&mut self, handle: FileHandle) -> Result<(), KernelError> {
        self.open
            .remove(&handle)
            .map(|_| ())
            .ok_or(KernelError::StaleFileHandle(handle.as_u64()))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn file_size(&self, path: &str) -> Option<u64> {
        self.files.get(path).copied()
    }

    pub fn is_open(&self, handle: FileHandle) -> bool {
        self.open.contains_key(&handle)
    }

    pub fn open_entry(&self, handle: FileHandle) -> Option<&OpenFileEntry> {
        self.open.get(&handle)
    }

    /// Number of handles currently open on behalf of `owner`
    pub fn open_count_for(&self, owner: TaskId) -> usize {
        self.open.values().filter(|e| e.owner == owner).count()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_size() {
        let mut fs = SimFileSystem::new(1024);
        fs.create("/a", 100).unwrap();
        assert!(fs.exists("/a"));
        assert_eq!(fs.file_size("/a"), Some(100));
        assert_eq!(fs.used_bytes(), 100);
        assert_eq!(fs.available_bytes(), 924);
    }

    #[test]
    fn test_create_fails_when_full() {
        let mut fs = SimFileSystem::new(1024);
        fs.create("/a", 1000).unwrap();
        let result = fs.create("/b", 100);
        assert_eq!(
            result,
            Err(KernelError::FileSystemFull {
                requested: 100,
                available: 24
            })
        );
        assert!(!fs.exists("/b"));
    }

    #[test]
    fn test_create_duplicate_path() {
        let mut fs = SimFileSystem::new(1024);
        fs.create("/a", 1).unwrap();
        assert_eq!(
            fs.create("/a", 1),
            Err(KernelError::FileExists("/a".to_string()))
        );
    }

    #[test]
    fn test_delete_missing_file() {
        let mut fs = SimFileSystem::new(1024);
        assert_eq!(
            fs.delete("/nope"),
            Err(KernelError::FileNotFound("/nope".to_string()))
        );
    }

    #[test]
    fn test_delete_frees_space() {
        let mut fs = SimFileSystem::new(100);
        fs.create("/a", 100).unwrap();
        fs.delete("/a").unwrap();
        assert_eq!(fs.used_bytes(), 0);
        assert!(fs.create("/b", 100).is_ok());
    }

    #[test]
    fn test_open_requires_existing_file() {
        let mut fs = SimFileSystem::new(1024);
        assert!(fs.open("/missing", TaskId::new()).is_none());
    }

    #[test]
    fn test_open_close_lifecycle() {
        let mut fs = SimFileSystem::new(1024);
        let owner = TaskId::new();
        fs.create("/a", 10).unwrap();

        let h1 = fs.open("/a", owner).unwrap();
        let h2 = fs.open("/a", owner).unwrap();
        assert_ne!(h1, h2);
        assert_eq!(fs.open_count_for(owner), 2);
        assert_eq!(fs.open_entry(h1).unwrap().path, "/a");

        fs.close(h1).unwrap();
        assert!(!fs.is_open(h1));
        assert!(fs.is_open(h2));
        assert_eq!(fs.close(h1), Err(KernelError::StaleFileHandle(h1.as_u64())));
    }

    #[test]
    fn test_handles_not_reused() {
        let mut fs = SimFileSystem::new(1024);
        let owner = TaskId::new();
        fs.create("/a", 10).unwrap();
        let h1 = fs.open("/a", owner).unwrap();
        fs.close(h1).unwrap();
        let h2 = fs.open("/a", owner).unwrap();
        assert!(h2 > h1);
    }
}
