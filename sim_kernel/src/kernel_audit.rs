//! Kernel call audit log
//!
//! Records every collaborator call the simulated kernel answers, in order.
//! Tests use it to check sequencing across subsystems (threads before ports,
//! ports before memory, memory before files). The log does not affect
//! behavior.

use core_types::{FileHandle, PageTableId, PortId, TaskId, ThreadId};
use kernel_api::Instant;
use serde::{Deserialize, Serialize};

/// A collaborator call answered by the simulated kernel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelEvent {
    ThreadSpawned { thread: ThreadId, task: TaskId },
    ThreadSpawnDeclined { task: TaskId },
    ThreadKilled { thread: ThreadId },
    Dispatched,
    PortDestroyed { port: PortId },
    PageTableCreated { table: PageTableId, task: TaskId },
    MemoryDeallocated { table: PageTableId, frames: usize },
    PageTableDestroyed { table: PageTableId },
    FileCreated { path: String, size_bytes: u64 },
    FileCreateFailed { path: String },
    FileDeleted { path: String },
    FileDeleteMissing { path: String },
    FileDeleteFailed { path: String },
    FileOpened { path: String, handle: FileHandle, owner: TaskId },
    FileOpenFailed { path: String },
    FileClosed { handle: FileHandle },
    FileCloseStale { handle: FileHandle },
}

/// Audit entry with timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelAuditEntry {
    pub timestamp: Instant,
    pub event: KernelEvent,
}

/// Ordered log of kernel events
#[derive(Debug, Clone, Default)]
pub struct KernelAuditLog {
    entries: Vec<KernelAuditEntry>,
}

impl KernelAuditLog {
    /// Creates a new empty audit log
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Records an event
    pub fn record(&mut self, timestamp: Instant, event: KernelEvent) {
        self.entries.push(KernelAuditEntry { timestamp, event });
    }

    pub fn entries(&self) -> &[KernelAuditEntry] {
        &self.entries
    }

    /// Events only, in recorded order
    pub fn events(&self) -> impl Iterator<Item = &KernelEvent> {
        self.entries.iter().map(|e| &e.event)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Checks if an event matching the predicate exists
    pub fn has_event<F>(&self, predicate: F) -> bool
    where
        F: Fn(&KernelEvent) -> bool,
    {
        self.events().any(predicate)
    }

    /// Counts events matching the predicate
    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&KernelEvent) -> bool,
    {
        self.events().filter(|e| predicate(e)).count()
    }

    /// Index of the first event matching the predicate
    pub fn position<F>(&self, predicate: F) -> Option<usize>
    where
        F: Fn(&KernelEvent) -> bool,
    {
        self.events().position(predicate)
    }

    /// Index of the last event matching the predicate
    pub fn last_position<F>(&self, predicate: F) -> Option<usize>
    where
        F: Fn(&KernelEvent) -> bool,
    {
        self.entries.iter().rposition(|e| predicate(&e.event))
    }
}
