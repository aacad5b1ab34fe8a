//! Task lifecycle
//!
//! Creation and teardown of a task, as two fixed sequences.
//!
//! Creation: fresh id, address space (page table before anything else, then
//! the swap file), creation time, initial thread. Nothing is returned unless
//! the address space was set up completely.
//!
//! Teardown runs in reverse dependency order:
//! 1. threads, newest first
//! 2. ports, newest first
//! 3. status becomes Terminated
//! 4. address space released (frames, page table, swap file)
//! 5. open files closed, newest first, vacated slots skipped
//! 6. swap path deleted again; an already missing file is fine
//!
//! Problems that do not stop a sequence come back as warning entries for the
//! caller to record.

use crate::address_space::AddressSpaceHandle;
use crate::error::TaskError;
use crate::tcb::TaskControlBlock;
use core_types::TaskId;
use kernel_api::{KernelApi, KernelError};
use policy::TaskPolicy;
use services_logger::{LogEntry, LogLevel};

/// A newly created task and anything worth warning about
#[derive(Debug)]
pub struct Spawned {
    pub task: TaskControlBlock,
    pub warnings: Vec<LogEntry>,
}

/// Builds a live task
///
/// The initial thread is requested from the thread subsystem. If it
/// declines, the task is still returned, with no threads and a warning. If
/// the thread cannot be recorded, for instance under a policy that allows no
/// threads, it is killed and the address space released before the error is
/// returned.
pub fn spawn<K: KernelApi>(kernel: &mut K, policy: &TaskPolicy) -> Result<Spawned, TaskError> {
    let id = TaskId::new();
    let address_space = AddressSpaceHandle::allocate(id, policy, kernel)?;
    let mut task = TaskControlBlock::new(id, address_space, kernel.now(), policy);
    let mut warnings = Vec::new();

    match kernel.spawn_thread(id) {
        Some(thread) => {
            if let Err(err) = task.add_thread(thread) {
                kernel.kill_thread(thread);
                if let Some(space) = task.take_address_space() {
                    space.release(kernel);
                }
                return Err(err);
            }
        }
        None => warnings.push(
            LogEntry::new(LogLevel::Warn, "initial thread was not spawned").with_source(id),
        ),
    }

    Ok(Spawned { task, warnings })
}

/// Tears a live task down
///
/// A task that is already terminated is refused with
/// [`TaskError::AlreadyTerminated`] and nothing is touched.
pub fn teardown<K: KernelApi>(
    task: &mut TaskControlBlock,
    kernel: &mut K,
) -> Result<Vec<LogEntry>, TaskError> {
    let id = task.id();
    if !task.is_live() {
        return Err(TaskError::AlreadyTerminated(id));
    }
    let mut warnings = Vec::new();

    for thread in task.drain_threads() {
        kernel.kill_thread(thread);
    }
    for port in task.drain_ports() {
        kernel.destroy_port(port);
    }

    task.mark_terminated();

    let swap_path = match task.take_address_space() {
        Some(space) => {
            let path = space.swap_path().to_string();
            for problem in space.release(kernel) {
                warnings.push(
                    LogEntry::new(LogLevel::Warn, "address space release incomplete")
                        .with_source(id)
                        .with_field("error", &problem),
                );
            }
            Some(path)
        }
        None => None,
    };

    for handle in task.drain_files().into_iter().flatten() {
        if let Err(err) = kernel.close(handle) {
            warnings.push(
                LogEntry::new(LogLevel::Warn, "open file already closed")
                    .with_source(id)
                    .with_field("handle", handle)
                    .with_field("error", &err),
            );
        }
    }

    if let Some(path) = swap_path {
        match kernel.delete(&path) {
            Ok(()) | Err(KernelError::FileNotFound(_)) => {}
            Err(err) => warnings.push(
                LogEntry::new(LogLevel::Warn, "swap file delete failed")
                    .with_source(id)
                    .with_field("path", &path)
                    .with_field("error", &err),
            ),
        }
    }

    Ok(warnings)
}
