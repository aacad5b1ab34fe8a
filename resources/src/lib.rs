//! # Resources
//!
//! Bounded membership containers for the resources a task tracks.
//!
//! ## Philosophy
//!
//! - **Limits are enforced, not advisory**
//! - **Failure is a value**: every mutation returns a `Result`, nothing panics
//! - **Order is meaningful**: members keep insertion order so teardown can
//!   walk them newest first
//! - **Membership is not ownership**: a container holds ids, never the
//!   resources themselves
//!
//! ## Core Concepts
//!
//! - `ResourceKind`: Threads, Ports, or Files
//! - `Capacity`: Bounded(n) or Unbounded
//! - `ResourceContainer<T>`: ordered, capacity-checked membership set
//! - `MembershipError`: why an add or remove was refused

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The kinds of resource a task tracks membership of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Threads,
    Ports,
    Files,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Threads => write!(f, "threads"),
            ResourceKind::Ports => write!(f, "ports"),
            ResourceKind::Files => write!(f, "files"),
        }
    }
}

/// Maximum number of members a container accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capacity {
    Bounded(usize),
    Unbounded,
}

impl Capacity {
    /// Returns true if a container holding `len` members can take one more
    pub fn admits(&self, len: usize) -> bool {
        match self {
            Capacity::Bounded(max) => len < *max,
            Capacity::Unbounded => true,
        }
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capacity::Bounded(max) => write!(f, "{}", max),
            Capacity::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Reasons a membership change is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("Capacity reached for {kind}: max {max}")]
    CapacityReached { kind: ResourceKind, max: usize },

    #[error("No {kind} to remove")]
    Empty { kind: ResourceKind },

    #[error("Not a member of {kind}")]
    NotMember { kind: ResourceKind },
}

/// Ordered, capacity-checked membership collection
///
/// Members are kept in insertion order. Removal is by identity. The
/// container never clones or drops the resource a member refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContainer<T> {
    kind: ResourceKind,
    capacity: Capacity,
    members: Vec<T>,
}

impl<T: PartialEq> ResourceContainer<T> {
    /// Creates an empty container holding at most `max` members
    pub fn bounded(kind: ResourceKind, max: usize) -> Self {
        Self {
            kind,
            capacity: Capacity::Bounded(max),
            members: Vec::new(),
        }
    }

    /// Creates an empty container with no size limit
    pub fn unbounded(kind: ResourceKind) -> Self {
        Self {
            kind,
            capacity: Capacity::Unbounded,
            members: Vec::new(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Appends a member
    ///
    /// Fails when the container already holds its maximum. The container is
    /// unchanged on failure.
    pub fn add(&mut self, item: T) -> Result<(), MembershipError> {
        if !self.capacity.admits(self.members.len()) {
            let max = match self.capacity {
                Capacity::Bounded(max) => max,
                Capacity::Unbounded => usize::MAX,
            };
            return Err(MembershipError::CapacityReached {
                kind: self.kind,
                max,
            });
        }
        self.members.push(item);
        Ok(())
    }

    /// Removes the first member equal to `item`
    pub fn remove(&mut self, item: &T) -> Result<(), MembershipError> {
        if self.members.is_empty() {
            return Err(MembershipError::Empty { kind: self.kind });
        }
        let index = self
            .members
            .iter()
            .position(|member| member == item)
            .ok_or(MembershipError::NotMember { kind: self.kind })?;
        self.members.remove(index);
        Ok(())
    }

    pub fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterates members oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.members.iter()
    }

    /// Takes every member out, newest first
    ///
    /// The container is empty afterwards. Callers that tear members down can
    /// walk the returned list without touching the container again.
    pub fn drain_newest_first(&mut self) -> Vec<T> {
        let mut drained: Vec<T> = self.members.drain(..).collect();
        drained.reverse();
        drained
    }
}

impl<T: PartialEq + Clone> ResourceContainer<T> {
    /// Returns a copy of the members, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.members.clone()
    }
}

/// Tables whose slots may be vacated in place
impl<T: PartialEq> ResourceContainer<Option<T>> {
    /// Empties the slot holding `item`, keeping the slot itself
    ///
    /// Vacated slots still count as members.
    pub fn vacate(&mut self, item: &T) -> Result<(), MembershipError> {
        let slot = self
            .members
            .iter_mut()
            .find(|slot| slot.as_ref() == Some(item))
            .ok_or(MembershipError::NotMember { kind: self.kind })?;
        *slot = None;
        Ok(())
    }

    /// Occupied slots, oldest first
    pub fn occupied(&self) -> impl Iterator<Item = &T> {
        self.members.iter().flatten()
    }
}
