//! # Simulated Kernel
//!
//! This crate provides a simulated implementation of every collaborator the
//! task subsystem talks to.
//!
//! ## Purpose
//!
//! The simulated kernel allows testing task lifecycles without hardware:
//! - Runs under `cargo test`
//! - Deterministic (controlled time, counted faults, no real concurrency)
//! - Fast (no real I/O)
//! - Inspectable (frames, files, threads and ports are all visible)
//!
//! ## Philosophy
//!
//! **Testability is a first-class design constraint.**
//!
//! This is not a mock that returns canned answers. Files take up space,
//! frames are really assigned and released, and stale handles are really
//! detected, so a leak in the task subsystem shows up as a leak here.

pub mod fault_injection;
pub mod file_system;
pub mod kernel_audit;
pub mod memory;
pub mod test_utils;
pub mod threads;
pub mod timer;

use core_types::{FileHandle, PageTableId, PortId, TaskId, ThreadId};
use fault_injection::{FaultInjector, FaultPlan};
use file_system::SimFileSystem;
use kernel_api::{
    Clock, Duration, FileSystem, Instant, KernelError, MemoryManager, PortSubsystem,
    ThreadSubsystem,
};
use kernel_audit::{KernelAuditLog, KernelEvent};
use memory::SimMemory;
use threads::{SimPorts, SimThreads};
use timer::SimClock;

/// Default number of physical frames
pub const DEFAULT_FRAME_COUNT: usize = 64;

/// Default disk capacity: room for sixteen default-sized swap files
pub const DEFAULT_DISK_CAPACITY: u64 = 16 * 65536;

/// Simulated kernel state
///
/// Unlike a real kernel, this state is directly accessible for testing.
pub struct SimulatedKernel {
    clock: SimClock,
    fs: SimFileSystem,
    memory: SimMemory,
    threads: SimThreads,
    ports: SimPorts,
    fault_injector: Option<FaultInjector>,
    audit: KernelAuditLog,
}

impl SimulatedKernel {
    /// Creates a new simulated kernel with default sizes
    pub fn new() -> Self {
        Self {
            clock: SimClock::new(),
            fs: SimFileSystem::new(DEFAULT_DISK_CAPACITY),
            memory: SimMemory::new(DEFAULT_FRAME_COUNT),
            threads: SimThreads::new(),
            ports: SimPorts::new(),
            fault_injector: None,
            audit: KernelAuditLog::new(),
        }
    }

    /// Replaces the file system with an empty one of `capacity_bytes`
    pub fn with_disk_capacity(mut self, capacity_bytes: u64) -> Self {
        self.fs = SimFileSystem::new(capacity_bytes);
        self
    }

    /// Sets the fault plan for this kernel
    pub fn with_fault_plan(mut self, plan: FaultPlan) -> Self {
        self.fault_injector = Some(FaultInjector::new(plan));
        self
    }

    /// Advances simulated time
    pub fn advance_time(&mut self, duration: Duration) {
        self.clock.advance(duration);
    }

    /// Creates a port owned by `task`
    ///
    /// Port creation belongs to the port subsystem and is not part of the
    /// task contract; tests use this to obtain real port ids.
    pub fn create_port(&mut self, task: TaskId) -> PortId {
        self.ports.create(task)
    }

    /// Creates a file and opens it for `owner` in one step
    pub fn create_and_open(
        &mut self,
        path: &str,
        size_bytes: u64,
        owner: TaskId,
    ) -> Result<FileHandle, KernelError> {
        self.create(path, size_bytes)?;
        self.open(path, owner)
            .ok_or_else(|| KernelError::FileNotFound(path.to_string()))
    }

    pub fn file_system(&self) -> &SimFileSystem {
        &self.fs
    }

    pub fn memory(&self) -> &SimMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut SimMemory {
        &mut self.memory
    }

    pub fn threads(&self) -> &SimThreads {
        &self.threads
    }

    pub fn ports(&self) -> &SimPorts {
        &self.ports
    }

    pub fn audit_log(&self) -> &KernelAuditLog {
        &self.audit
    }

    pub fn clear_audit_log(&mut self) {
        self.audit.clear();
    }

    fn record(&mut self, event: KernelEvent) {
        let now = self.clock.now();
        self.audit.record(now, event);
    }
}

impl Default for SimulatedKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimulatedKernel {
    fn now(&self) -> Instant {
        self.clock.now()
    }
}

impl ThreadSubsystem for SimulatedKernel {
    fn spawn_thread(&mut self, task: TaskId) -> Option<ThreadId> {
        let declined = self
            .fault_injector
            .as_mut()
            .is_some_and(|f| f.should_decline_spawn());
        if declined {
            self.record(KernelEvent::ThreadSpawnDeclined { task });
            return None;
        }
        let thread = self.threads.spawn(task);
        self.record(KernelEvent::ThreadSpawned { thread, task });
        Some(thread)
    }

    fn kill_thread(&mut self, thread: ThreadId) {
        self.threads.kill(thread);
        self.record(KernelEvent::ThreadKilled { thread });
    }

    fn dispatch(&mut self) {
        self.threads.dispatch();
        self.record(KernelEvent::Dispatched);
    }
}

impl PortSubsystem for SimulatedKernel {
    fn destroy_port(&mut self, port: PortId) {
        self.ports.destroy(port);
        self.record(KernelEvent::PortDestroyed { port });
    }
}

impl MemoryManager for SimulatedKernel {
    fn create_page_table(&mut self, task: TaskId) -> PageTableId {
        let table = self.memory.create_page_table(task);
        self.record(KernelEvent::PageTableCreated { table, task });
        table
    }

    fn deallocate_memory(&mut self, table: PageTableId) -> Result<(), KernelError> {
        let frames = self.memory.deallocate_memory(table)?;
        self.record(KernelEvent::MemoryDeallocated { table, frames });
        Ok(())
    }

    fn destroy_page_table(&mut self, table: PageTableId) -> Result<(), KernelError> {
        self.memory.destroy_page_table(table)?;
        self.record(KernelEvent::PageTableDestroyed { table });
        Ok(())
    }
}

impl FileSystem for SimulatedKernel {
    fn create(&mut self, path: &str, size_bytes: u64) -> Result<(), KernelError> {
        let injected = self
            .fault_injector
            .as_mut()
            .is_some_and(|f| f.should_fail_create(path));
        let result = if injected {
            Err(KernelError::FileSystemFull {
                requested: size_bytes,
                available: 0,
            })
        } else {
            self.fs.create(path, size_bytes)
        };

        match &result {
            Ok(()) => self.record(KernelEvent::FileCreated {
                path: path.to_string(),
                size_bytes,
            }),
            Err(_) => self.record(KernelEvent::FileCreateFailed {
                path: path.to_string(),
            }),
        }
        result
    }

    fn delete(&mut self, path: &str) -> Result<(), KernelError> {
        let injected = self
            .fault_injector
            .as_mut()
            .is_some_and(|f| f.should_fail_delete());
        let result = if injected {
            Err(KernelError::DeviceError(path.to_string()))
        } else {
            self.fs.delete(path)
        };
        let path = path.to_string();
        let event = match &result {
            Ok(()) => KernelEvent::FileDeleted { path },
            Err(KernelError::FileNotFound(_)) => KernelEvent::FileDeleteMissing { path },
            Err(_) => KernelEvent::FileDeleteFailed { path },
        };
        self.record(event);
        result
    }

    fn open(&mut self, path: &str, owner: TaskId) -> Option<FileHandle> {
        let injected = self
            .fault_injector
            .as_mut()
            .is_some_and(|f| f.should_fail_open());
        let handle = if injected {
            None
        } else {
            self.fs.open(path, owner)
        };

        let event = match handle {
            Some(handle) => KernelEvent::FileOpened {
                path: path.to_string(),
                handle,
                owner,
            },
            None => KernelEvent::FileOpenFailed {
                path: path.to_string(),
            },
        };
        self.record(event);
        handle
    }

    fn close(&mut self, handle: FileHandle) -> Result<(), KernelError> {
        let result = self.fs.close(handle);
        let event = match result {
            Ok(()) => KernelEvent::FileClosed { handle },
            Err(_) => KernelEvent::FileCloseStale { handle },
        };
        self.record(event);
        result
    }

    fn exists(&self, path: &str) -> bool {
        self.fs.exists(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fault_injection::{FileSystemFault, ThreadFault};

    #[test]
    fn test_kernel_creation() {
        let kernel = SimulatedKernel::new();
        assert_eq!(kernel.now(), Instant::ZERO);
        assert_eq!(kernel.memory().frame_count(), DEFAULT_FRAME_COUNT);
        assert_eq!(kernel.file_system().capacity_bytes(), DEFAULT_DISK_CAPACITY);
        assert!(kernel.audit_log().is_empty());
    }

    #[test]
    fn test_time_advances() {
        let mut kernel = SimulatedKernel::new();
        kernel.advance_time(Duration::from_ticks(42));
        assert_eq!(kernel.now().as_ticks(), 42);
    }

    #[test]
    fn test_spawn_thread_records_event() {
        let mut kernel = SimulatedKernel::new();
        let task = TaskId::new();
        let thread = kernel.spawn_thread(task).unwrap();

        assert_eq!(kernel.threads().task_of(thread), Some(task));
        assert!(kernel
            .audit_log()
            .has_event(|e| matches!(e, KernelEvent::ThreadSpawned { .. })));
    }

    #[test]
    fn test_spawn_declined_by_fault() {
        let plan =
            FaultPlan::new().with_thread_fault(ThreadFault::DeclineNextSpawn { count: 1 });
        let mut kernel = SimulatedKernel::new().with_fault_plan(plan);
        let task = TaskId::new();

        assert!(kernel.spawn_thread(task).is_none());
        assert!(kernel.spawn_thread(task).is_some());
        assert_eq!(kernel.threads().alive_count(), 1);
    }

    #[test]
    fn test_injected_create_failure_leaves_no_file() {
        let plan =
            FaultPlan::new().with_fs_fault(FileSystemFault::FullOnNextCreate { count: 1 });
        let mut kernel = SimulatedKernel::new().with_fault_plan(plan);

        let result = FileSystem::create(&mut kernel, "/swap/a", 16);
        assert!(matches!(result, Err(KernelError::FileSystemFull { .. })));
        assert!(!kernel.exists("/swap/a"));
        assert!(kernel
            .audit_log()
            .has_event(|e| matches!(e, KernelEvent::FileCreateFailed { .. })));
    }

    #[test]
    fn test_real_disk_full() {
        let mut kernel = SimulatedKernel::new().with_disk_capacity(10);
        assert!(matches!(
            FileSystem::create(&mut kernel, "/big", 11),
            Err(KernelError::FileSystemFull { .. })
        ));
    }

    #[test]
    fn test_injected_open_failure() {
        let plan = FaultPlan::new().with_fs_fault(FileSystemFault::FailNextOpen { count: 1 });
        let mut kernel = SimulatedKernel::new().with_fault_plan(plan);
        let owner = TaskId::new();
        FileSystem::create(&mut kernel, "/f", 1).unwrap();

        assert!(FileSystem::open(&mut kernel, "/f", owner).is_none());
        assert!(FileSystem::open(&mut kernel, "/f", owner).is_some());
    }

    #[test]
    fn test_create_and_open_helper() {
        let mut kernel = SimulatedKernel::new();
        let owner = TaskId::new();
        let handle = kernel.create_and_open("/data", 8, owner).unwrap();
        assert!(kernel.file_system().is_open(handle));
        assert_eq!(kernel.file_system().open_count_for(owner), 1);
    }

    #[test]
    fn test_close_twice_reports_stale() {
        let mut kernel = SimulatedKernel::new();
        let handle = kernel.create_and_open("/data", 8, TaskId::new()).unwrap();
        kernel.close(handle).unwrap();
        assert_eq!(
            kernel.close(handle),
            Err(KernelError::StaleFileHandle(handle.as_u64()))
        );
        assert!(kernel
            .audit_log()
            .has_event(|e| matches!(e, KernelEvent::FileCloseStale { .. })));
    }

    #[test]
    fn test_memory_lifecycle_through_trait() {
        let mut kernel = SimulatedKernel::new();
        let task = TaskId::new();
        let table = kernel.create_page_table(task);
        kernel.memory_mut().map_page(table, 0).unwrap();

        kernel.deallocate_memory(table).unwrap();
        kernel.destroy_page_table(table).unwrap();
        assert_eq!(kernel.memory().page_table_count(), 0);
        assert!(kernel.audit_log().has_event(|e| matches!(
            e,
            KernelEvent::MemoryDeallocated { frames: 1, .. }
        )));
    }

    #[test]
    fn test_injected_delete_failure_keeps_file() {
        let plan = FaultPlan::new().with_fs_fault(FileSystemFault::FailNextDelete { count: 1 });
        let mut kernel = SimulatedKernel::new().with_fault_plan(plan);
        kernel.create("/data/a", 4).unwrap();

        assert!(matches!(
            FileSystem::delete(&mut kernel, "/data/a"),
            Err(KernelError::DeviceError(_))
        ));
        assert!(kernel.exists("/data/a"));
        assert!(kernel
            .audit_log()
            .has_event(|e| matches!(e, KernelEvent::FileDeleteFailed { .. })));
        assert!(FileSystem::delete(&mut kernel, "/data/a").is_ok());
    }

    #[test]
    fn test_delete_missing_is_audited() {
        let mut kernel = SimulatedKernel::new();
        assert!(FileSystem::delete(&mut kernel, "/ghost").is_err());
        assert!(kernel
            .audit_log()
            .has_event(|e| matches!(e, KernelEvent::FileDeleteMissing { .. })));
    }
}
