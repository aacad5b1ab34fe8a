//! # Task Policy
//!
//! The immutable configuration every task is created under.
//!
//! ## Philosophy
//!
//! - **No process-wide statics**: limits and defaults travel in a value that
//!   is handed to the task manager once, at startup
//! - **Validated before use**: a policy that could not produce a legal task
//!   never reaches the task manager
//! - **Deterministic**: the swap path of a task is a pure function of the
//!   policy and the task id
//!
//! ## Core Concepts
//!
//! - `TaskPolicy`: per-kind limits, priority range, address width, swap mount point
//! - `Priority`: lower numeric value means higher priority
//! - `PolicyError`: why a policy was rejected

use core_types::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Task scheduling priority
///
/// Lower values are more urgent. The legal range is set by [`TaskPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Priority(pub u8);

impl Priority {
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Returns true if `self` should be scheduled ahead of `other`
    pub fn is_more_urgent_than(&self, other: Priority) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "priority {}", self.0)
    }
}

/// Errors raised while building or loading a policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("max_threads_per_task must be at least 1 (room for the initial thread)")]
    NoThreadCapacity,

    #[error("max_ports_per_task must be at least 1")]
    NoPortCapacity,

    #[error("Priority range inverted: highest {highest} is numerically above lowest {lowest}")]
    InvertedPriorityRange { highest: u8, lowest: u8 },

    #[error("Default priority {default} outside range {highest}..={lowest}")]
    DefaultPriorityOutOfRange { default: u8, highest: u8, lowest: u8 },

    #[error("virtual_address_bits must be in 1..=63, got {0}")]
    InvalidAddressBits(u32),

    #[error("swap_mount_point must not be empty")]
    EmptyMountPoint,

    #[error("Unsupported policy version: {0}")]
    UnsupportedVersion(u32),

    #[error("Failed to parse policy: {0}")]
    Parse(String),

    #[error("Failed to serialize policy: {0}")]
    Serialize(String),
}

/// Limits and defaults applied to every task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskPolicy {
    /// Format version of the serialized policy
    pub version: u32,
    pub max_threads_per_task: usize,
    pub max_ports_per_task: usize,
    /// Numerically smallest (most urgent) legal priority
    pub priority_highest: u8,
    /// Numerically largest (least urgent) legal priority
    pub priority_lowest: u8,
    pub default_priority: u8,
    /// Width of a virtual address; the swap file holds 2^bits bytes
    pub virtual_address_bits: u32,
    /// Prefix the task id is appended to when naming a swap file
    pub swap_mount_point: String,
}

impl TaskPolicy {
    /// Current version of the serialized policy format
    pub const CURRENT_VERSION: u32 = 1;

    pub fn with_max_threads(mut self, max: usize) -> Self {
        self.max_threads_per_task = max;
        self
    }

    pub fn with_max_ports(mut self, max: usize) -> Self {
        self.max_ports_per_task = max;
        self
    }

    pub fn with_priority_range(mut self, highest: u8, lowest: u8, default: u8) -> Self {
        self.priority_highest = highest;
        self.priority_lowest = lowest;
        self.default_priority = default;
        self
    }

    pub fn with_virtual_address_bits(mut self, bits: u32) -> Self {
        self.virtual_address_bits = bits;
        self
    }

    pub fn with_swap_mount_point(mut self, mount_point: impl Into<String>) -> Self {
        self.swap_mount_point = mount_point.into();
        self
    }

    /// Checks every invariant and returns the policy unchanged if it holds
    pub fn validate(self) -> Result<Self, PolicyError> {
        if self.version != Self::CURRENT_VERSION {
            return Err(PolicyError::UnsupportedVersion(self.version));
        }
        if self.max_threads_per_task == 0 {
            return Err(PolicyError::NoThreadCapacity);
        }
        if self.max_ports_per_task == 0 {
            return Err(PolicyError::NoPortCapacity);
        }
        if self.priority_highest > self.priority_lowest {
            return Err(PolicyError::InvertedPriorityRange {
                highest: self.priority_highest,
                lowest: self.priority_lowest,
            });
        }
        if !self.admits_priority(Priority(self.default_priority)) {
            return Err(PolicyError::DefaultPriorityOutOfRange {
                default: self.default_priority,
                highest: self.priority_highest,
                lowest: self.priority_lowest,
            });
        }
        if self.virtual_address_bits == 0 || self.virtual_address_bits > 63 {
            return Err(PolicyError::InvalidAddressBits(self.virtual_address_bits));
        }
        if self.swap_mount_point.is_empty() {
            return Err(PolicyError::EmptyMountPoint);
        }
        Ok(self)
    }

    pub fn default_priority(&self) -> Priority {
        Priority(self.default_priority)
    }

    pub fn admits_priority(&self, priority: Priority) -> bool {
        (self.priority_highest..=self.priority_lowest).contains(&priority.0)
    }

    /// Size of a task's swap file in bytes
    ///
    /// `None` when the address width does not fit in a `u64` byte count.
    pub fn swap_file_size(&self) -> Option<u64> {
        match self.virtual_address_bits {
            0 => None,
            bits => 1u64.checked_shl(bits),
        }
    }

    /// Path of the swap file belonging to `task`
    pub fn swap_path_for(&self, task: TaskId) -> String {
        format!("{}{}", self.swap_mount_point, task.as_uuid())
    }

    /// Loads and validates a policy from JSON
    ///
    /// Missing fields take their default values.
    pub fn from_json(bytes: &[u8]) -> Result<Self, PolicyError> {
        let policy: TaskPolicy =
            serde_json::from_slice(bytes).map_err(|e| PolicyError::Parse(e.to_string()))?;
        policy.validate()
    }

    pub fn to_json(&self) -> Result<Vec<u8>, PolicyError> {
        serde_json::to_vec_pretty(self).map_err(|e| PolicyError::Serialize(e.to_string()))
    }
}

impl Default for TaskPolicy {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            max_threads_per_task: 8,
            max_ports_per_task: 8,
            priority_highest: 1,
            priority_lowest: 5,
            default_priority: 5,
            virtual_address_bits: 16,
            swap_mount_point: "/swap/".to_string(),
        }
    }
}
