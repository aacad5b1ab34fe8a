//! Address space handle
//!
//! A task's page table and its swap file travel together: both are acquired
//! at creation and given back at teardown. The handle is only ever handed out
//! whole, so a task never holds a page table without backing store.

use core_types::{FileHandle, PageTableId, TaskId};
use kernel_api::{FileSystem, KernelError, MemoryManager};
use policy::TaskPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an address space could not be set up
///
/// `cleanup` lists the kernel errors hit while giving back what had already
/// been acquired; it is empty when the rollback went through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressSpaceError {
    #[error("No swap file size for a {bits}-bit address space")]
    InvalidAddressWidth { bits: u32 },

    #[error("Failed to create swap file {path}: {source}")]
    SwapCreateFailed {
        path: String,
        source: KernelError,
        cleanup: Vec<KernelError>,
    },

    #[error("Failed to open swap file {path}")]
    SwapOpenFailed {
        path: String,
        cleanup: Vec<KernelError>,
    },
}

impl AddressSpaceError {
    /// Errors from the rollback that followed the failure
    pub fn cleanup_errors(&self) -> &[KernelError] {
        match self {
            Self::InvalidAddressWidth { .. } => &[],
            Self::SwapCreateFailed { cleanup, .. } | Self::SwapOpenFailed { cleanup, .. } => {
                cleanup.as_slice()
            }
        }
    }
}

/// Page table plus swap file of one task
#[derive(Debug, PartialEq, Eq)]
pub struct AddressSpaceHandle {
    page_table: PageTableId,
    swap_path: String,
    swap_size: u64,
    swap_file: FileHandle,
}

/// Serializable view of an address space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSpaceInfo {
    pub page_table: PageTableId,
    pub swap_path: String,
    pub swap_size: u64,
    pub swap_file: FileHandle,
}

impl AddressSpaceHandle {
    /// Builds the address space for `task`
    ///
    /// The swap size is checked before anything is acquired. On a later
    /// failure everything acquired so far is given back: the page table is
    /// destroyed and a swap file that was created but not opened is deleted.
    pub fn allocate<K>(
        task: TaskId,
        policy: &TaskPolicy,
        kernel: &mut K,
    ) -> Result<Self, AddressSpaceError>
    where
        K: MemoryManager + FileSystem,
    {
        let swap_size = policy.swap_file_size().ok_or(AddressSpaceError::InvalidAddressWidth {
            bits: policy.virtual_address_bits,
        })?;
        let swap_path = policy.swap_path_for(task);
        let page_table = kernel.create_page_table(task);

        if let Err(source) = kernel.create(&swap_path, swap_size) {
            let cleanup = kernel.destroy_page_table(page_table).err().into_iter().collect();
            return Err(AddressSpaceError::SwapCreateFailed {
                path: swap_path,
                source,
                cleanup,
            });
        }

        let Some(swap_file) = kernel.open(&swap_path, task) else {
            let steps = [
                kernel.delete(&swap_path),
                kernel.destroy_page_table(page_table),
            ];
            return Err(AddressSpaceError::SwapOpenFailed {
                path: swap_path,
                cleanup: steps.into_iter().filter_map(Result::err).collect(),
            });
        };

        Ok(Self {
            page_table,
            swap_path,
            swap_size,
            swap_file,
        })
    }

    /// Gives the page table and swap file back
    ///
    /// Every step runs even if an earlier one fails; the failures are
    /// returned for the caller to report.
    pub fn release<K>(self, kernel: &mut K) -> Vec<KernelError>
    where
        K: MemoryManager + FileSystem,
    {
        let steps = [
            kernel.deallocate_memory(self.page_table),
            kernel.destroy_page_table(self.page_table),
            kernel.close(self.swap_file),
            kernel.delete(&self.swap_path),
        ];
        steps.into_iter().filter_map(Result::err).collect()
    }

    pub fn page_table(&self) -> PageTableId {
        self.page_table
    }

    pub fn swap_path(&self) -> &str {
        &self.swap_path
    }

    /// Swap file size in bytes, fixed for the life of the task
    pub fn swap_size(&self) -> u64 {
        self.swap_size
    }

    pub fn swap_file(&self) -> FileHandle {
        self.swap_file
    }

    pub fn info(&self) -> AddressSpaceInfo {
        AddressSpaceInfo {
            page_table: self.page_table,
            swap_path: self.swap_path.clone(),
            swap_size: self.swap_size,
            swap_file: self.swap_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_kernel::fault_injection::{FaultPlan, FileSystemFault};
    use sim_kernel::memory::FrameState;
    use sim_kernel::test_utils::{kernel_with_full_swap, populate_frames};
    use sim_kernel::SimulatedKernel;

    #[test]
    fn test_allocate_creates_swap_of_exact_size() {
        let mut kernel = SimulatedKernel::new();
        let policy = TaskPolicy::default().with_virtual_address_bits(12);
        let task = TaskId::new();

        let space = AddressSpaceHandle::allocate(task, &policy, &mut kernel).unwrap();

        assert_eq!(space.swap_size(), 4096);
        assert_eq!(space.swap_path(), policy.swap_path_for(task));
        assert_eq!(kernel.file_system().file_size(space.swap_path()), Some(4096));
        assert!(kernel.file_system().is_open(space.swap_file()));
        assert_eq!(kernel.memory().page_table_owner(space.page_table()), Some(task));
    }

    #[test]
    fn test_swap_path_is_mount_point_plus_id() {
        let mut kernel = SimulatedKernel::new();
        let policy = TaskPolicy::default().with_swap_mount_point("/dev/swap-");
        let task = TaskId::new();

        let space = AddressSpaceHandle::allocate(task, &policy, &mut kernel).unwrap();
        assert_eq!(space.swap_path(), format!("/dev/swap-{}", task.as_uuid()));
    }

    #[test]
    fn test_create_failure_destroys_page_table() {
        let policy = TaskPolicy::default();
        let mut kernel = kernel_with_full_swap(&policy.swap_mount_point);

        let result = AddressSpaceHandle::allocate(TaskId::new(), &policy, &mut kernel);

        assert!(matches!(
            result,
            Err(AddressSpaceError::SwapCreateFailed {
                source: KernelError::FileSystemFull { .. },
                ..
            })
        ));
        assert_eq!(kernel.memory().page_table_count(), 0);
        assert_eq!(kernel.file_system().file_count(), 0);
    }

    #[test]
    fn test_disk_too_small_for_swap() {
        let policy = TaskPolicy::default().with_virtual_address_bits(20);
        let mut kernel = SimulatedKernel::new().with_disk_capacity(1024);

        assert!(AddressSpaceHandle::allocate(TaskId::new(), &policy, &mut kernel).is_err());
        assert_eq!(kernel.memory().page_table_count(), 0);
    }

    #[test]
    fn test_unrepresentable_width_acquires_nothing() {
        let mut kernel = SimulatedKernel::new();
        let policy = TaskPolicy::default().with_virtual_address_bits(64);

        let result = AddressSpaceHandle::allocate(TaskId::new(), &policy, &mut kernel);

        assert_eq!(result, Err(AddressSpaceError::InvalidAddressWidth { bits: 64 }));
        assert_eq!(kernel.memory().page_table_count(), 0);
        assert!(kernel.audit_log().is_empty());
    }

    #[test]
    fn test_open_failure_deletes_created_file() {
        let policy = TaskPolicy::default();
        let plan = FaultPlan::new().with_fs_fault(FileSystemFault::FailNextOpen { count: 1 });
        let mut kernel = SimulatedKernel::new().with_fault_plan(plan);
        let task = TaskId::new();

        let result = AddressSpaceHandle::allocate(task, &policy, &mut kernel);

        assert!(matches!(result, Err(AddressSpaceError::SwapOpenFailed { .. })));
        assert!(result.unwrap_err().cleanup_errors().is_empty());
        assert!(!kernel.exists(&policy.swap_path_for(task)));
        assert_eq!(kernel.memory().page_table_count(), 0);
    }

    #[test]
    fn test_failed_rollback_is_reported() {
        let policy = TaskPolicy::default();
        let plan = FaultPlan::new()
            .with_fs_fault(FileSystemFault::FailNextOpen { count: 1 })
            .with_fs_fault(FileSystemFault::FailNextDelete { count: 1 });
        let mut kernel = SimulatedKernel::new().with_fault_plan(plan);
        let task = TaskId::new();

        let err = AddressSpaceHandle::allocate(task, &policy, &mut kernel).unwrap_err();

        let path = policy.swap_path_for(task);
        assert_eq!(
            err,
            AddressSpaceError::SwapOpenFailed {
                path: path.clone(),
                cleanup: vec![KernelError::DeviceError(path.clone())],
            }
        );
        assert!(kernel.exists(&path));
        assert_eq!(kernel.memory().page_table_count(), 0);
    }

    #[test]
    fn test_release_returns_everything() {
        let mut kernel = SimulatedKernel::new();
        let policy = TaskPolicy::default();
        let task = TaskId::new();
        let space = AddressSpaceHandle::allocate(task, &policy, &mut kernel).unwrap();
        let path = space.swap_path().to_string();
        let swap_file = space.swap_file();

        let problems = space.release(&mut kernel);

        assert!(problems.is_empty());
        assert!(!kernel.exists(&path));
        assert!(!kernel.file_system().is_open(swap_file));
        assert_eq!(kernel.memory().page_table_count(), 0);
    }

    #[test]
    fn test_release_keeps_reservations() {
        let mut kernel = SimulatedKernel::new();
        let policy = TaskPolicy::default();
        let space = AddressSpaceHandle::allocate(TaskId::new(), &policy, &mut kernel).unwrap();
        let frames = populate_frames(&mut kernel, space.page_table(), 2, 1).unwrap();

        space.release(&mut kernel);

        assert_eq!(kernel.memory().frame_state(frames[0]), Some(FrameState::Free));
        assert_eq!(kernel.memory().frame_state(frames[1]), Some(FrameState::Free));
        assert_eq!(
            kernel.memory().frame_state(frames[2]),
            Some(FrameState::FreeReserved)
        );
    }

    #[test]
    fn test_release_reports_but_continues() {
        let mut kernel = SimulatedKernel::new();
        let policy = TaskPolicy::default();
        let space = AddressSpaceHandle::allocate(TaskId::new(), &policy, &mut kernel).unwrap();
        let path = space.swap_path().to_string();
        kernel.close(space.swap_file()).unwrap();

        let problems = space.release(&mut kernel);

        assert_eq!(problems.len(), 1);
        assert!(matches!(problems[0], KernelError::StaleFileHandle(_)));
        assert!(!kernel.exists(&path));
    }
}
