//! Task errors

use crate::address_space::AddressSpaceError;
use core_types::{PortId, TaskId, ThreadId};
use policy::Priority;
use resources::MembershipError;
use thiserror::Error;

/// A resource that can be attached to at most one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    Thread(ThreadId),
    Port(PortId),
}

impl std::fmt::Display for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attachment::Thread(id) => write!(f, "{}", id),
            Attachment::Port(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("{0} is terminated")]
    Terminated(TaskId),

    #[error("{0} was already terminated")]
    AlreadyTerminated(TaskId),

    #[error("{0} not found")]
    NotFound(TaskId),

    #[error("{0} is still live")]
    StillLive(TaskId),

    #[error("{requested} outside range {highest}..={lowest}")]
    InvalidPriority {
        requested: Priority,
        highest: u8,
        lowest: u8,
    },

    #[error("{resource} already belongs to {owner}")]
    AlreadyAttached { resource: Attachment, owner: TaskId },

    #[error(transparent)]
    Membership(#[from] MembershipError),

    #[error(transparent)]
    AddressSpace(#[from] AddressSpaceError),
}
