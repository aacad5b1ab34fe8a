//! # Task Manager Service
//!
//! Creation, resource accounting and teardown of tasks.
//!
//! ## Philosophy
//!
//! A task is a container of execution and resources: a bounded set of
//! threads, a bounded set of ports, an open-file table, a page table, and a
//! swap file imaging its whole virtual address space.
//! - A task exists only once its address space exists; creation either
//!   completes or leaves nothing behind
//! - Teardown runs in reverse dependency order, so nothing a task owns
//!   outlives the thing it depends on
//! - Every refusal is a returned error, never a panic
//!
//! ## Core Concepts
//!
//! - `AddressSpaceHandle`: page table plus swap file, acquired and released
//!   as one unit
//! - `TaskControlBlock`: per-task record and membership operations
//! - `lifecycle`: the create and teardown sequences
//! - `TaskManager`: registry of tasks, single-owner checks, diagnostic hooks
//!
//! ## Non-Goals
//!
//! Scheduling policy, page replacement and the file system itself live
//! behind the `kernel_api` traits.

pub mod address_space;
pub mod error;
pub mod lifecycle;
pub mod manager;
pub mod tcb;

pub use address_space::{AddressSpaceError, AddressSpaceHandle, AddressSpaceInfo};
pub use error::{Attachment, TaskError};
pub use manager::{ManagerSnapshot, TaskManager};
pub use tcb::{TaskControlBlock, TaskSnapshot, TaskStatus};
