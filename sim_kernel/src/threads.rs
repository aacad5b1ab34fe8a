//! # Simulated Thread and Port Subsystems
//!
//! Both subsystems own their entities outright. Tasks refer to them by id
//! and ask these tables to create or destroy them. Teardown calls are
//! recorded in order so tests can check which entity went first.

use core_types::{PortId, TaskId, ThreadId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a thread or port still exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityState {
    Alive,
    Destroyed,
}

#[derive(Debug, Clone)]
struct Entity {
    task: TaskId,
    state: EntityState,
}

/// Thread table
#[derive(Debug, Clone, Default)]
pub struct SimThreads {
    threads: HashMap<ThreadId, Entity>,
    kill_order: Vec<ThreadId>,
    dispatch_count: usize,
}

impl SimThreads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, task: TaskId) -> ThreadId {
        let id = ThreadId::new();
        self.threads.insert(
            id,
            Entity {
                task,
                state: EntityState::Alive,
            },
        );
        id
    }

    /// Kills a thread and records the call
    ///
    /// Killing an unknown or dead thread is recorded but changes nothing.
    pub fn kill(&mut self, thread: ThreadId) {
        self.kill_order.push(thread);
        if let Some(entity) = self.threads.get_mut(&thread) {
            entity.state = EntityState::Destroyed;
        }
    }

    pub fn dispatch(&mut self) {
        self.dispatch_count += 1;
    }

    pub fn state(&self, thread: ThreadId) -> Option<EntityState> {
        self.threads.get(&thread).map(|e| e.state)
    }

    pub fn task_of(&self, thread: ThreadId) -> Option<TaskId> {
        self.threads.get(&thread).map(|e| e.task)
    }

    pub fn alive_count(&self) -> usize {
        self.threads
            .values()
            .filter(|e| e.state == EntityState::Alive)
            .count()
    }

    /// Threads in the order they were killed
    pub fn kill_order(&self) -> &[ThreadId] {
        &self.kill_order
    }

    pub fn dispatch_count(&self) -> usize {
        self.dispatch_count
    }
}

/// Port table
#[derive(Debug, Clone, Default)]
pub struct SimPorts {
    ports: HashMap<PortId, Entity>,
    destroy_order: Vec<PortId>,
}

impl SimPorts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, task: TaskId) -> PortId {
        let id = PortId::new();
        self.ports.insert(
            id,
            Entity {
                task,
                state: EntityState::Alive,
            },
        );
        id
    }

    pub fn destroy(&mut self, port: PortId) {
        self.destroy_order.push(port);
        if let Some(entity) = self.ports.get_mut(&port) {
            entity.state = EntityState::Destroyed;
        }
    }

    pub fn state(&self, port: PortId) -> Option<EntityState> {
        self.ports.get(&port).map(|e| e.state)
    }

    pub fn task_of(&self, port: PortId) -> Option<TaskId> {
        self.ports.get(&port).map(|e| e.task)
    }

    pub fn alive_count(&self) -> usize {
        self.ports
            .values()
            .filter(|e| e.state == EntityState::Alive)
            .count()
    }

    pub fn destroy_order(&self) -> &[PortId] {
        &self.destroy_order
    }
}
