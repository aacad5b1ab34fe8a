//! # Simulated Memory Manager
//!
//! A fixed pool of physical frames and the page tables that map into it.
//!
//! A frame is in one of three states:
//! - **free**: no page assigned, not reserved
//! - **reserved**: set aside for a task; may have a page assigned that is not
//!   yet valid (a page-in still in flight)
//! - **mapped**: holds a valid page of some page table
//!
//! Releasing a page table's memory clears every page assignment that belongs
//! to it. Reservations survive the release: the frame is free for mapping
//! purposes but still marked reserved, which is distinct from a frame that
//! is free and unreserved.

use core_types::{FrameId, PageTableId, TaskId};
use kernel_api::KernelError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A page of some page table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub table: PageTableId,
    pub page: u64,
}

/// One physical frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Page assigned to this frame
    pub page: Option<PageRef>,
    /// True once the page contents are in place
    pub valid: bool,
    /// Task the frame is set aside for
    pub reserved_by: Option<TaskId>,
}

impl Frame {
    /// No page is assigned to the frame
    pub fn is_free(&self) -> bool {
        self.page.is_none()
    }

    pub fn is_reserved(&self) -> bool {
        self.reserved_by.is_some()
    }

    pub fn is_mapped(&self) -> bool {
        self.page.is_some() && self.valid
    }
}

/// Summary of a frame's state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameState {
    Free,
    FreeReserved,
    Reserved,
    Mapped,
}

/// Frame pool plus page-table registry
#[derive(Debug, Clone)]
pub struct SimMemory {
    frames: Vec<Frame>,
    /// page table -> task it is bound to
    page_tables: HashMap<PageTableId, TaskId>,
}

impl SimMemory {
    /// Creates a pool of `frame_count` free frames
    pub fn new(frame_count: usize) -> Self {
        Self {
            frames: vec![Frame::default(); frame_count],
            page_tables: HashMap::new(),
        }
    }

    pub fn create_page_table(&mut self, task: TaskId) -> PageTableId {
        let table = PageTableId::new();
        self.page_tables.insert(table, task);
        table
    }

    pub fn page_table_owner(&self, table: PageTableId) -> Option<TaskId> {
        self.page_tables.get(&table).copied()
    }

    pub fn page_table_count(&self) -> usize {
        self.page_tables.len()
    }

    /// Maps `page` of `table` into the first free, unreserved frame
    pub fn map_page(&mut self, table: PageTableId, page: u64) -> Result<FrameId, KernelError> {
        self.ensure_table(table)?;
        let index = self
            .frames
            .iter()
            .position(|f| f.is_free() && !f.is_reserved())
            .ok_or(KernelError::NoFreeFrame)?;
        let frame = &mut self.frames[index];
        frame.page = Some(PageRef { table, page });
        frame.valid = true;
        Ok(FrameId(index))
    }

    /// Reserves a free frame for an incoming `page` of `table`
    ///
    /// The page is assigned but not yet valid.
    pub fn reserve_for_page(
        &mut self,
        table: PageTableId,
        page: u64,
    ) -> Result<FrameId, KernelError> {
        let owner = self.ensure_table(table)?;
        let index = self
            .frames
            .iter()
            .position(|f| f.is_free() && !f.is_reserved())
            .ok_or(KernelError::NoFreeFrame)?;
        let frame = &mut self.frames[index];
        frame.page = Some(PageRef { table, page });
        frame.valid = false;
        frame.reserved_by = Some(owner);
        Ok(FrameId(index))
    }

    /// Frees every frame assigned to `table`, keeping reservations
    ///
    /// Returns how many frames were released.
    pub fn deallocate_memory(&mut self, table: PageTableId) -> Result<usize, KernelError> {
        self.ensure_table(table)?;
        let mut released = 0;
        for frame in self
            .frames
            .iter_mut()
            .filter(|f| f.page.map(|p| p.table) == Some(table))
        {
            frame.page = None;
            frame.valid = false;
            released += 1;
        }
        Ok(released)
    }

    pub fn destroy_page_table(&mut self, table: PageTableId) -> Result<(), KernelError> {
        self.page_tables
            .remove(&table)
            .map(|_| ())
            .ok_or_else(|| KernelError::PageTableNotFound(table.to_string()))
    }

    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id.0)
    }

    pub fn frame_state(&self, id: FrameId) -> Option<FrameState> {
        self.frame(id).map(|f| match (f.is_mapped(), f.is_free(), f.is_reserved()) {
            (true, _, _) => FrameState::Mapped,
            (false, true, true) => FrameState::FreeReserved,
            (false, true, false) => FrameState::Free,
            (false, false, _) => FrameState::Reserved,
        })
    }

    pub fn free_frame_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_free()).count()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn ensure_table(&self, table: PageTableId) -> Result<TaskId, KernelError> {
        self.page_table_owner(table)
            .ok_or_else(|| KernelError::PageTableNotFound(table.to_string()))
    }
}
