//! # Kernel API
//!
//! This crate defines the contracts between the task subsystem and the
//! kernel services it relies on but does not own.
//!
//! ## Philosophy
//!
//! The task subsystem owns the *resource-ownership contract*. Everything else
//! is a collaborator reached through a trait:
//! - Thread creation and teardown (not scheduling policy)
//! - Port teardown (not message formats)
//! - Page tables and frames (not replacement policy)
//! - Files (not block allocation)
//! - Time (explicit, never ambient)
//!
//! ## Design Goals
//!
//! 1. **Testability**: every collaborator can be simulated deterministically
//! 2. **Explicitness**: no hidden globals, every call is visible in the signature
//! 3. **Synchronous**: calls either succeed or fail immediately

pub mod error;
pub mod kernel;
pub mod time;

pub use error::KernelError;
pub use kernel::{
    Clock, FileSystem, KernelApi, MemoryManager, PortSubsystem, ThreadSubsystem,
};
pub use time::{Duration, Instant};
