//! # PMM - Physical Memory Manager
//!
//! Gerencia as páginas físicas da máquina simulada.
//!
//! - `FrameAllocator`: lista livre de ppns, compartilhada por todos os
//!   processos. Não zera páginas na devolução.
//! - `PhysicalMemory`: os bytes da memória física.

pub mod memory;
pub mod stats;

pub use memory::PhysicalMemory;
pub use stats::PmmStats;

use std::collections::VecDeque;

use crate::mm::addr::Ppn;
use crate::mm::error::{MmError, MmResult};

/// Alocador de páginas físicas
pub struct FrameAllocator {
    free: VecDeque<Ppn>,
    allocated: Vec<bool>,
    pub stats: PmmStats,
}

impl FrameAllocator {
    /// Todas as `total_frames` páginas começam livres, em ordem crescente
    pub fn new(total_frames: usize) -> Self {
        Self {
            free: (0..total_frames as Ppn).collect(),
            allocated: vec![false; total_frames],
            stats: PmmStats::new(total_frames),
        }
    }

    /// Aloca uma página física
    pub fn acquire(&mut self) -> Option<Ppn> {
        match self.free.pop_front() {
            Some(ppn) => {
                self.allocated[ppn as usize] = true;
                self.stats.inc_alloc();
                Some(ppn)
            }
            None => {
                self.stats.inc_failed();
                None
            }
        }
    }

    /// Devolve uma página física
    pub fn release(&mut self, ppn: Ppn) -> MmResult<()> {
        let slot = self
            .allocated
            .get_mut(ppn as usize)
            .ok_or(MmError::OutOfBounds)?;
        if !*slot {
            crate::kerror!("(PMM) Double free ppn=", ppn);
            return Err(MmError::DoubleFree);
        }
        *slot = false;
        self.free.push_back(ppn);
        self.stats.inc_free();
        Ok(())
    }

    #[inline]
    pub fn is_free(&self, ppn: Ppn) -> bool {
        matches!(self.allocated.get(ppn as usize), Some(false))
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn total_frames(&self) -> usize {
        self.allocated.len()
    }

    /// Ppns livres
    pub fn free_pages(&self) -> impl Iterator<Item = Ppn> + '_ {
        self.free.iter().copied()
    }
}
