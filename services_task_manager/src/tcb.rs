//! Task control block
//!
//! The per-task record: identity, status, priority, the address space, and
//! membership of the threads, ports and open files the task tracks.
//!
//! Threads and ports are referenced by id. The task records that they
//! belong to it; creating and destroying them is the job of the thread and
//! port subsystems.
//!
//! Once a task is terminated every mutation is refused with
//! [`TaskError::Terminated`].

use crate::address_space::{AddressSpaceHandle, AddressSpaceInfo};
use crate::error::TaskError;
use core_types::{FileHandle, PortId, TaskId, ThreadId};
use kernel_api::Instant;
use policy::{Priority, TaskPolicy};
use resources::{ResourceContainer, ResourceKind};
use serde::{Deserialize, Serialize};

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Resources allocated, accepting membership changes
    Live,
    /// Torn down; holds nothing
    Terminated,
}

/// Serializable view of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub status: TaskStatus,
    pub creation_time: Instant,
    pub priority: Priority,
    pub threads: Vec<ThreadId>,
    pub ports: Vec<PortId>,
    /// Open-file table slots, `None` for vacated ones
    pub files: Vec<Option<FileHandle>>,
    pub address_space: Option<AddressSpaceInfo>,
}

/// Task control block
#[derive(Debug)]
pub struct TaskControlBlock {
    id: TaskId,
    status: TaskStatus,
    creation_time: Instant,
    priority: Priority,
    priority_highest: u8,
    priority_lowest: u8,
    address_space: Option<AddressSpaceHandle>,
    threads: ResourceContainer<ThreadId>,
    ports: ResourceContainer<PortId>,
    files: ResourceContainer<Option<FileHandle>>,
}

impl TaskControlBlock {
    /// Builds a live task around an allocated address space
    pub(crate) fn new(
        id: TaskId,
        address_space: AddressSpaceHandle,
        creation_time: Instant,
        policy: &TaskPolicy,
    ) -> Self {
        Self {
            id,
            status: TaskStatus::Live,
            creation_time,
            priority: policy.default_priority(),
            priority_highest: policy.priority_highest,
            priority_lowest: policy.priority_lowest,
            address_space: Some(address_space),
            threads: ResourceContainer::bounded(ResourceKind::Threads, policy.max_threads_per_task),
            ports: ResourceContainer::bounded(ResourceKind::Ports, policy.max_ports_per_task),
            files: ResourceContainer::unbounded(ResourceKind::Files),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn is_live(&self) -> bool {
        self.status == TaskStatus::Live
    }

    pub fn creation_time(&self) -> Instant {
        self.creation_time
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn set_priority(&mut self, priority: Priority) -> Result<(), TaskError> {
        self.ensure_live()?;
        if !(self.priority_highest..=self.priority_lowest).contains(&priority.value()) {
            return Err(TaskError::InvalidPriority {
                requested: priority,
                highest: self.priority_highest,
                lowest: self.priority_lowest,
            });
        }
        self.priority = priority;
        Ok(())
    }

    /// The address space, `None` once the task is terminated
    pub fn address_space(&self) -> Option<&AddressSpaceHandle> {
        self.address_space.as_ref()
    }

    // Thread and port membership is changed only through the manager, which
    // keeps each thread and port in at most one task.

    pub(crate) fn add_thread(&mut self, thread: ThreadId) -> Result<(), TaskError> {
        self.ensure_live()?;
        self.threads.add(thread)?;
        Ok(())
    }

    pub(crate) fn remove_thread(&mut self, thread: ThreadId) -> Result<(), TaskError> {
        self.ensure_live()?;
        self.threads.remove(&thread)?;
        Ok(())
    }

    pub(crate) fn add_port(&mut self, port: PortId) -> Result<(), TaskError> {
        self.ensure_live()?;
        self.ports.add(port)?;
        Ok(())
    }

    pub(crate) fn remove_port(&mut self, port: PortId) -> Result<(), TaskError> {
        self.ensure_live()?;
        self.ports.remove(&port)?;
        Ok(())
    }

    /// Records an open file; the open-file table has no limit
    pub fn add_file(&mut self, file: FileHandle) -> Result<(), TaskError> {
        self.ensure_live()?;
        self.files.add(Some(file))?;
        Ok(())
    }

    pub fn remove_file(&mut self, file: FileHandle) -> Result<(), TaskError> {
        self.ensure_live()?;
        self.files.remove(&Some(file))?;
        Ok(())
    }

    /// Marks the slot of a file closed elsewhere as vacated
    ///
    /// The slot keeps its place in the table and is skipped at teardown.
    pub fn vacate_file(&mut self, file: FileHandle) -> Result<(), TaskError> {
        self.ensure_live()?;
        self.files.vacate(&file)?;
        Ok(())
    }

    pub fn thread_count(&self) -> usize {
        self.threads.count()
    }

    pub fn port_count(&self) -> usize {
        self.ports.count()
    }

    /// Number of open-file table slots, vacated ones included
    pub fn file_count(&self) -> usize {
        self.files.count()
    }

    pub fn contains_thread(&self, thread: ThreadId) -> bool {
        self.threads.contains(&thread)
    }

    pub fn contains_port(&self, port: PortId) -> bool {
        self.ports.contains(&port)
    }

    pub fn contains_file(&self, file: FileHandle) -> bool {
        self.files.contains(&Some(file))
    }

    /// Threads in the order they were added
    pub fn threads(&self) -> Vec<ThreadId> {
        self.threads.snapshot()
    }

    /// Ports in the order they were added
    pub fn ports(&self) -> Vec<PortId> {
        self.ports.snapshot()
    }

    /// Open files in the order they were added, vacated slots skipped
    pub fn open_files(&self) -> Vec<FileHandle> {
        self.files.occupied().copied().collect()
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            status: self.status,
            creation_time: self.creation_time,
            priority: self.priority,
            threads: self.threads.snapshot(),
            ports: self.ports.snapshot(),
            files: self.files.snapshot(),
            address_space: self.address_space.as_ref().map(AddressSpaceHandle::info),
        }
    }

    pub(crate) fn ensure_live(&self) -> Result<(), TaskError> {
        match self.status {
            TaskStatus::Live => Ok(()),
            TaskStatus::Terminated => Err(TaskError::Terminated(self.id)),
        }
    }

    pub(crate) fn drain_threads(&mut self) -> Vec<ThreadId> {
        self.threads.drain_newest_first()
    }

    pub(crate) fn drain_ports(&mut self) -> Vec<PortId> {
        self.ports.drain_newest_first()
    }

    pub(crate) fn drain_files(&mut self) -> Vec<Option<FileHandle>> {
        self.files.drain_newest_first()
    }

    pub(crate) fn mark_terminated(&mut self) {
        self.status = TaskStatus::Terminated;
    }

    pub(crate) fn take_address_space(&mut self) -> Option<AddressSpaceHandle> {
        self.address_space.take()
    }
}
