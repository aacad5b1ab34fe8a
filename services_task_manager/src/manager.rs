//! Task manager: the registry of tasks.

use crate::error::{Attachment, TaskError};
use crate::lifecycle;
use crate::tcb::{TaskControlBlock, TaskSnapshot};
use core_types::{FileHandle, PortId, TaskId, ThreadId};
use kernel_api::KernelApi;
use policy::{PolicyError, Priority, TaskPolicy};
use serde::{Deserialize, Serialize};
use services_logger::{DiagnosticLog, LogEntry, LogLevel};
use std::collections::{BTreeMap, HashMap};

/// Serializable state of the whole task table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerSnapshot {
    pub policy: TaskPolicy,
    pub tasks: Vec<TaskSnapshot>,
}

/// Owns every task and the policy they were built under.
///
/// Threads and ports attached through the manager belong to at most one
/// task at a time.
pub struct TaskManager {
    policy: TaskPolicy,
    tasks: BTreeMap<TaskId, TaskControlBlock>,
    thread_owners: HashMap<ThreadId, TaskId>,
    port_owners: HashMap<PortId, TaskId>,
    diagnostics: DiagnosticLog,
}

impl TaskManager {
    /// Creates a manager after validating `policy`
    pub fn new(policy: TaskPolicy) -> Result<Self, PolicyError> {
        Ok(Self::with_valid_policy(policy.validate()?))
    }

    fn with_valid_policy(policy: TaskPolicy) -> Self {
        Self {
            policy,
            tasks: BTreeMap::new(),
            thread_owners: HashMap::new(),
            port_owners: HashMap::new(),
            diagnostics: DiagnosticLog::new(),
        }
    }

    pub fn policy(&self) -> &TaskPolicy {
        &self.policy
    }

    /// Creates a live task and registers it.
    ///
    /// If the address space cannot be set up the error hook fires, other
    /// work is dispatched, and nothing is registered.
    pub fn create<K: KernelApi>(&mut self, kernel: &mut K) -> Result<TaskId, TaskError> {
        let spawned = match lifecycle::spawn(kernel, &self.policy) {
            Ok(spawned) => spawned,
            Err(err) => {
                let mut entry =
                    LogEntry::new(LogLevel::Error, "task creation failed").with_field("error", &err);
                if let TaskError::AddressSpace(space) = &err {
                    for problem in space.cleanup_errors() {
                        entry = entry.with_field("cleanup", problem);
                    }
                }
                self.report(entry);
                kernel.dispatch();
                return Err(err);
            }
        };

        let id = spawned.task.id();
        for thread in spawned.task.threads() {
            self.thread_owners.insert(thread, id);
        }
        for warning in spawned.warnings {
            self.report(warning);
        }
        self.diagnostics.record(
            LogEntry::new(LogLevel::Info, "task created")
                .with_source(id)
                .with_field("threads", spawned.task.thread_count()),
        );
        self.tasks.insert(id, spawned.task);
        Ok(id)
    }

    /// Tears a task down. It stays registered, terminated, until reaped.
    ///
    /// Killing a terminated task is refused, fires the warning hook, and
    /// touches nothing.
    pub fn kill<K: KernelApi>(&mut self, id: TaskId, kernel: &mut K) -> Result<(), TaskError> {
        let task = self.tasks.get_mut(&id).ok_or(TaskError::NotFound(id))?;
        let threads = task.threads();
        let ports = task.ports();

        match lifecycle::teardown(task, kernel) {
            Ok(warnings) => {
                for thread in threads {
                    self.thread_owners.remove(&thread);
                }
                for port in ports {
                    self.port_owners.remove(&port);
                }
                for warning in warnings {
                    self.report(warning);
                }
                self.diagnostics
                    .record(LogEntry::new(LogLevel::Info, "task terminated").with_source(id));
                Ok(())
            }
            Err(err) => {
                self.report(
                    LogEntry::new(LogLevel::Warn, "kill refused")
                        .with_source(id)
                        .with_field("error", &err),
                );
                Err(err)
            }
        }
    }

    /// Removes a terminated task from the registry and hands it back
    pub fn reap(&mut self, id: TaskId) -> Result<TaskControlBlock, TaskError> {
        match self.tasks.get(&id) {
            None => Err(TaskError::NotFound(id)),
            Some(task) if task.is_live() => Err(TaskError::StillLive(id)),
            Some(_) => self.tasks.remove(&id).ok_or(TaskError::NotFound(id)),
        }
    }

    pub fn task(&self, id: TaskId) -> Option<&TaskControlBlock> {
        self.tasks.get(&id)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn live_task_count(&self) -> usize {
        self.tasks.values().filter(|t| t.is_live()).count()
    }

    /// Task a thread is attached to
    pub fn thread_owner(&self, thread: ThreadId) -> Option<TaskId> {
        self.thread_owners.get(&thread).copied()
    }

    pub fn port_owner(&self, port: PortId) -> Option<TaskId> {
        self.port_owners.get(&port).copied()
    }

    pub fn attach_thread(&mut self, id: TaskId, thread: ThreadId) -> Result<(), TaskError> {
        if let Some(owner) = self.thread_owner(thread) {
            return Err(TaskError::AlreadyAttached {
                resource: Attachment::Thread(thread),
                owner,
            });
        }
        self.live_task_mut(id)?.add_thread(thread)?;
        self.thread_owners.insert(thread, id);
        Ok(())
    }

    pub fn detach_thread(&mut self, id: TaskId, thread: ThreadId) -> Result<(), TaskError> {
        self.live_task_mut(id)?.remove_thread(thread)?;
        self.thread_owners.remove(&thread);
        Ok(())
    }

    pub fn attach_port(&mut self, id: TaskId, port: PortId) -> Result<(), TaskError> {
        if let Some(owner) = self.port_owner(port) {
            return Err(TaskError::AlreadyAttached {
                resource: Attachment::Port(port),
                owner,
            });
        }
        self.live_task_mut(id)?.add_port(port)?;
        self.port_owners.insert(port, id);
        Ok(())
    }

    pub fn detach_port(&mut self, id: TaskId, port: PortId) -> Result<(), TaskError> {
        self.live_task_mut(id)?.remove_port(port)?;
        self.port_owners.remove(&port);
        Ok(())
    }

    pub fn attach_file(&mut self, id: TaskId, file: FileHandle) -> Result<(), TaskError> {
        self.live_task_mut(id)?.add_file(file)
    }

    pub fn detach_file(&mut self, id: TaskId, file: FileHandle) -> Result<(), TaskError> {
        self.live_task_mut(id)?.remove_file(file)
    }

    /// Marks a file closed outside the task as a vacated slot
    pub fn vacate_file(&mut self, id: TaskId, file: FileHandle) -> Result<(), TaskError> {
        self.live_task_mut(id)?.vacate_file(file)
    }

    pub fn set_priority(&mut self, id: TaskId, priority: Priority) -> Result<(), TaskError> {
        self.live_task_mut(id)?.set_priority(priority)
    }

    /// Serializable state of every registered task, ordered by id
    pub fn snapshot(&self) -> ManagerSnapshot {
        ManagerSnapshot {
            policy: self.policy.clone(),
            tasks: self.tasks.values().map(TaskControlBlock::snapshot).collect(),
        }
    }

    /// Error hook: records `message` with a dump of the task table
    pub fn at_error(&mut self, message: impl Into<String>) {
        self.report(LogEntry::new(LogLevel::Error, message));
    }

    /// Warning hook: records `message` with a dump of the task table
    pub fn at_warning(&mut self, message: impl Into<String>) {
        self.report(LogEntry::new(LogLevel::Warn, message));
    }

    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.diagnostics
    }

    fn report(&mut self, entry: LogEntry) {
        let entry = match serde_json::to_string(&self.snapshot()) {
            Ok(dump) => entry.with_field("tasks", dump),
            Err(err) => entry.with_field("dump_error", err),
        };
        self.diagnostics.record(entry);
    }

    fn live_task_mut(&mut self, id: TaskId) -> Result<&mut TaskControlBlock, TaskError> {
        let task = self.tasks.get_mut(&id).ok_or(TaskError::NotFound(id))?;
        task.ensure_live()?;
        Ok(task)
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::with_valid_policy(TaskPolicy::default())
    }
}
