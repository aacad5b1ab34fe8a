//! Collaborator contracts consumed by the task subsystem

use crate::{Instant, KernelError};
use core_types::{FileHandle, PageTableId, PortId, TaskId, ThreadId};

/// Source of simulated time
pub trait Clock {
    /// Returns the current simulation time
    fn now(&self) -> Instant;
}

/// The thread subsystem
///
/// Threads are created, scheduled and destroyed here. A task only records
/// which threads are its members; it asks this subsystem to do the work.
pub trait ThreadSubsystem {
    /// Creates a thread inside `task`
    ///
    /// Returns `None` when the subsystem declines to create the thread. The
    /// caller does not second-guess that decision.
    fn spawn_thread(&mut self, task: TaskId) -> Option<ThreadId>;

    /// Tears down a thread
    fn kill_thread(&mut self, thread: ThreadId);

    /// Lets the dispatcher pick other runnable work
    fn dispatch(&mut self);
}

/// The port subsystem
pub trait PortSubsystem {
    /// Destroys a port, dropping any queued messages
    fn destroy_port(&mut self, port: PortId);
}

/// Page table and frame management
pub trait MemoryManager {
    /// Creates an empty page table bound to `task`
    fn create_page_table(&mut self, task: TaskId) -> PageTableId;

    /// Frees every frame mapped through `table`
    ///
    /// Frames that are reserved but not mapped become free and keep their
    /// reservation. Calling this on a table with no mapped frames is a no-op.
    fn deallocate_memory(&mut self, table: PageTableId) -> Result<(), KernelError>;

    /// Forgets the page table itself
    fn destroy_page_table(&mut self, table: PageTableId) -> Result<(), KernelError>;
}

/// The file system
pub trait FileSystem {
    /// Creates a file of `size_bytes` at `path`
    fn create(&mut self, path: &str, size_bytes: u64) -> Result<(), KernelError>;

    /// Deletes the file at `path`
    fn delete(&mut self, path: &str) -> Result<(), KernelError>;

    /// Opens the file at `path` on behalf of `owner`
    fn open(&mut self, path: &str, owner: TaskId) -> Option<FileHandle>;

    /// Closes an open handle
    fn close(&mut self, handle: FileHandle) -> Result<(), KernelError>;

    /// Returns true if a file exists at `path`
    fn exists(&self, path: &str) -> bool;
}

/// Every collaborator the task subsystem needs, in one bound
///
/// Implemented automatically for any type providing all of the parts.
///
/// # Example
///
/// ```
/// use kernel_api::{FileSystem, KernelApi, KernelError};
///
/// fn make_scratch<K: KernelApi>(kernel: &mut K, path: &str) -> Result<(), KernelError> {
///     if !kernel.exists(path) {
///         kernel.create(path, 4096)?;
///     }
///     Ok(())
/// }
/// ```
pub trait KernelApi: Clock + ThreadSubsystem + PortSubsystem + MemoryManager + FileSystem {}

impl<T> KernelApi for T where T: Clock + ThreadSubsystem + PortSubsystem + MemoryManager + FileSystem {}
