//! Resilience Test Utilities
//!
//! This crate provides shared utilities for resilience and integration tests.
//!
//! ## Test Philosophy
//!
//! - **Safety under faults**: a failed creation leaves no page table, file or thread behind
//! - **Deterministic failures**: All faults are reproducible via FaultPlan
//! - **No leaks at teardown**: every thread, port, frame and file a task held is given back
//! - **Order is observable**: the kernel audit log shows teardown order

use core_types::{PortId, TaskId, ThreadId};
use kernel_api::ThreadSubsystem;
use policy::{PolicyError, TaskPolicy};
use services_task_manager::{TaskError, TaskManager};
use sim_kernel::SimulatedKernel;

/// Bootstrap helper for tests
///
/// Creates a kernel and a task manager running the default policy.
pub fn test_bootstrap() -> (SimulatedKernel, TaskManager) {
    (SimulatedKernel::new(), TaskManager::default())
}

/// Same as [`test_bootstrap`] with a custom policy
pub fn bootstrap_with_policy(
    policy: TaskPolicy,
) -> Result<(SimulatedKernel, TaskManager), PolicyError> {
    Ok((SimulatedKernel::new(), TaskManager::new(policy)?))
}

/// Spawns `count` extra threads in the kernel and attaches them to `task`
///
/// Returns the threads in attach order. Stops at the first refusal.
pub fn attach_threads(
    kernel: &mut SimulatedKernel,
    manager: &mut TaskManager,
    task: TaskId,
    count: usize,
) -> Result<Vec<ThreadId>, TaskError> {
    let mut threads = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(thread) = kernel.spawn_thread(task) else {
            break;
        };
        manager.attach_thread(task, thread)?;
        threads.push(thread);
    }
    Ok(threads)
}

/// Creates `count` ports in the kernel and attaches them to `task`
pub fn attach_ports(
    kernel: &mut SimulatedKernel,
    manager: &mut TaskManager,
    task: TaskId,
    count: usize,
) -> Result<Vec<PortId>, TaskError> {
    let mut ports = Vec::with_capacity(count);
    for _ in 0..count {
        let port = kernel.create_port(task);
        manager.attach_port(task, port)?;
        ports.push(port);
    }
    Ok(ports)
}
