//! # Core Types
//!
//! Identifiers shared by every crate of the task subsystem.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: a thread id can never be passed where a port id is expected.
//! - **Reference, don't own**: tasks hold ids of threads and ports; the owning
//!   subsystems keep lifecycle authority.
//!
//! ## Key Types
//!
//! - [`TaskId`]: Unique identifier for tasks
//! - [`ThreadId`], [`PortId`]: Members tracked by a task
//! - [`FileHandle`]: An open file, scoped to the task that opened it
//! - [`PageTableId`], [`FrameId`]: Virtual memory bookkeeping

pub mod ids;

pub use ids::{FileHandle, FrameId, PageTableId, PortId, TaskId, ThreadId};
