//! Deterministic fault injection for testing
//!
//! Tests describe the failures they want in a [`FaultPlan`]; the simulated
//! kernel consults a [`FaultInjector`] built from that plan before letting a
//! request reach the simulated file system or thread table.
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: faults fire on counted calls, never randomly
//! - **Composable**: a plan holds any number of faults
//! - **Test-focused**: not intended for production use
//!
//! ## Example
//!
//! ```
//! use sim_kernel::fault_injection::{FaultPlan, FileSystemFault, ThreadFault};
//!
//! let plan = FaultPlan::new()
//!     .with_fs_fault(FileSystemFault::FullOnNextCreate { count: 1 })
//!     .with_thread_fault(ThreadFault::DeclineNextSpawn { count: 2 });
//! assert_eq!(plan.fs_faults().len(), 1);
//! ```

/// A fault to inject into file-system requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSystemFault {
    /// Report the disk as full for the next N creations
    FullOnNextCreate { count: usize },

    /// Report the disk as full for every creation under a path prefix
    FullUnderPrefix { prefix: String },

    /// Return no handle for the next N opens
    FailNextOpen { count: usize },

    /// Refuse the next N deletions with a device error
    FailNextDelete { count: usize },
}

/// A fault to inject into thread-subsystem requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadFault {
    /// Decline the next N thread spawns
    DeclineNextSpawn { count: usize },
}

/// A plan describing all faults to inject
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    fs_faults: Vec<FileSystemFault>,
    thread_faults: Vec<ThreadFault>,
}

impl FaultPlan {
    /// Creates a new empty fault plan
    pub fn new() -> Self {
        Self {
            fs_faults: Vec::new(),
            thread_faults: Vec::new(),
        }
    }

    /// Adds a file-system fault to the plan
    pub fn with_fs_fault(mut self, fault: FileSystemFault) -> Self {
        self.fs_faults.push(fault);
        self
    }

    /// Adds a thread fault to the plan
    pub fn with_thread_fault(mut self, fault: ThreadFault) -> Self {
        self.thread_faults.push(fault);
        self
    }

    pub fn fs_faults(&self) -> &[FileSystemFault] {
        &self.fs_faults
    }

    pub fn thread_faults(&self) -> &[ThreadFault] {
        &self.thread_faults
    }
}

/// Applies a fault plan, tracking how many counted faults remain
#[derive(Debug)]
pub struct FaultInjector {
    plan: FaultPlan,
    create_failures_left: usize,
    open_failures_left: usize,
    delete_failures_left: usize,
    spawn_declines_left: usize,
}

impl FaultInjector {
    /// Creates a new fault injector with the given plan
    pub fn new(plan: FaultPlan) -> Self {
        let mut injector = Self {
            plan: plan.clone(),
            create_failures_left: 0,
            open_failures_left: 0,
            delete_failures_left: 0,
            spawn_declines_left: 0,
        };

        for fault in plan.fs_faults() {
            match fault {
                FileSystemFault::FullOnNextCreate { count } => {
                    injector.create_failures_left += *count;
                }
                FileSystemFault::FailNextOpen { count } => {
                    injector.open_failures_left += *count;
                }
                FileSystemFault::FailNextDelete { count } => {
                    injector.delete_failures_left += *count;
                }
                FileSystemFault::FullUnderPrefix { .. } => {
                    // Checked per path
                }
            }
        }

        for fault in plan.thread_faults() {
            match fault {
                ThreadFault::DeclineNextSpawn { count } => {
                    injector.spawn_declines_left += *count;
                }
            }
        }

        injector
    }

    /// Returns true if creating `path` should report a full disk
    pub fn should_fail_create(&mut self, path: &str) -> bool {
        if self.create_failures_left > 0 {
            self.create_failures_left -= 1;
            return true;
        }

        self.plan.fs_faults().iter().any(|fault| {
            matches!(fault, FileSystemFault::FullUnderPrefix { prefix } if path.starts_with(prefix.as_str()))
        })
    }

    /// Returns true if the next open should yield no handle
    pub fn should_fail_open(&mut self) -> bool {
        if self.open_failures_left > 0 {
            self.open_failures_left -= 1;
            return true;
        }
        false
    }

    /// Returns true if the next delete should be refused
    pub fn should_fail_delete(&mut self) -> bool {
        if self.delete_failures_left > 0 {
            self.delete_failures_left -= 1;
            return true;
        }
        false
    }

    /// Returns true if the next thread spawn should be declined
    pub fn should_decline_spawn(&mut self) -> bool {
        if self.spawn_declines_left > 0 {
            self.spawn_declines_left -= 1;
            return true;
        }
        false
    }
}
