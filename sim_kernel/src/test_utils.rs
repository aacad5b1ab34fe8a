//! Test utilities for resilience testing
//!
//! Helpers for building simulated kernels in the shapes tests keep asking
//! for: a disk with no room for a swap file, a frame pool with mapped and
//! reserved pages, and so on.

use crate::fault_injection::{FaultPlan, FileSystemFault};
use crate::SimulatedKernel;
use core_types::{FrameId, PageTableId};
use kernel_api::{Clock, Duration, KernelError};

/// Runs a test function with a specific fault plan
///
/// # Example
///
/// ```
/// use sim_kernel::fault_injection::{FaultPlan, ThreadFault};
/// use sim_kernel::test_utils::with_fault_plan;
///
/// with_fault_plan(
///     FaultPlan::new().with_thread_fault(ThreadFault::DeclineNextSpawn { count: 1 }),
///     |kernel| {
///         assert_eq!(kernel.threads().alive_count(), 0);
///     },
/// );
/// ```
pub fn with_fault_plan<F>(plan: FaultPlan, f: F)
where
    F: FnOnce(&mut SimulatedKernel),
{
    let mut kernel = SimulatedKernel::new().with_fault_plan(plan);
    f(&mut kernel);
}

/// A kernel whose disk refuses every file under `mount_point`
pub fn kernel_with_full_swap(mount_point: &str) -> SimulatedKernel {
    SimulatedKernel::new().with_fault_plan(FaultPlan::new().with_fs_fault(
        FileSystemFault::FullUnderPrefix {
            prefix: mount_point.to_string(),
        },
    ))
}

/// Maps `mapped` pages and reserves `reserved` more for `table`
///
/// Returns the frames in the order they were handed out.
pub fn populate_frames(
    kernel: &mut SimulatedKernel,
    table: PageTableId,
    mapped: u64,
    reserved: u64,
) -> Result<Vec<FrameId>, KernelError> {
    let mut frames = Vec::new();
    for page in 0..mapped {
        frames.push(kernel.memory_mut().map_page(table, page)?);
    }
    for page in mapped..mapped + reserved {
        frames.push(kernel.memory_mut().reserve_for_page(table, page)?);
    }
    Ok(frames)
}

/// Runs a kernel for a specific duration, one tick at a time
pub fn run_for_duration(kernel: &mut SimulatedKernel, duration: Duration) {
    let target_time = kernel.now() + duration;
    const TIME_STEP: Duration = Duration::from_ticks(1);

    while kernel.now() < target_time {
        kernel.advance_time(TIME_STEP);
    }
}
