//! Kernel error types

use thiserror::Error;

/// Errors reported by kernel collaborators
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KernelError {
    /// The file system has no room for the requested file
    #[error("File system full: {requested} bytes requested, {available} available")]
    FileSystemFull { requested: u64, available: u64 },

    /// A file already exists at the path
    #[error("File already exists: {0}")]
    FileExists(String),

    /// No file exists at the path
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The handle was never issued or has already been closed
    #[error("Stale file handle: {0}")]
    StaleFileHandle(u64),

    /// The page table is unknown to the memory manager
    #[error("Page table not found: {0}")]
    PageTableNotFound(String),

    /// Every frame is mapped or reserved
    #[error("No free frame")]
    NoFreeFrame,

    /// The device refused the request
    #[error("Device error: {0}")]
    DeviceError(String),
}
