//! # Eviction Engine
//!
//! Remove páginas da memória usando o reverse map.
//!
//! Ordem de uma eviction de (pid, vpn):
//! 1. invalidar todo slot do TLB com (pid, vpn), devolvendo USED/DIRTY
//!    para a tabela;
//! 2. se DIRTY, gravar a página no swap (página limpa já tem cópia válida
//!    na imagem ou no slot);
//! 3. remover a entrada da tabela e devolver a página ao alocador.

use crate::mm::addr::{PageKey, Pid, Ppn, Vpn};
use crate::mm::error::{MmError, MmResult};
use crate::mm::stats::PagingStats;
use crate::mm::vmm::{Pager, PagerState};

impl Pager {
    /// Página física livre, evictando uma vítima se o alocador esgotou
    pub(crate) fn acquire_page(&self, state: &mut PagerState) -> MmResult<Ppn> {
        if let Some(ppn) = state.frames.acquire() {
            return Ok(ppn);
        }
        self.evict_one(state)?;
        state.frames.acquire().ok_or(MmError::OutOfMemory)
    }

    /// Sorteia e evicta uma página residente
    pub(crate) fn evict_one(&self, state: &mut PagerState) -> MmResult<Ppn> {
        let victim = state.table.pick_eviction_victim(&mut state.rng);
        let Some((key, _)) = victim else {
            crate::kerror!("(EVICT) OOM: nenhuma página residente para evictar");
            return Err(MmError::OutOfMemory);
        };
        self.evict_entry(state, key.pid, key.vpn)
    }

    /// Evicta (pid, vpn), devolvendo o ppn liberado
    pub(crate) fn evict_entry(&self, state: &mut PagerState, pid: Pid, vpn: Vpn) -> MmResult<Ppn> {
        if let Some(cached) = self.processor.tlb().invalidate_page(pid, vpn) {
            state.table.update(pid, vpn, cached)?;
        }

        let entry = match state.table.lookup(pid, vpn) {
            Some(entry) if entry.is_valid() => entry,
            _ => return Err(MmError::NotMapped),
        };

        if entry.is_dirty() {
            let mut page = vec![0u8; self.page_size()];
            self.memory.read_page(entry.ppn, &mut page)?;
            let slot = state.swap.write(PageKey::new(pid, vpn), &page)?;
            PagingStats::inc(&self.stats.swap_outs);
            crate::kdebug!("(EVICT) dirty → swap pid/vpn/slot=", pid, vpn, slot.0);
        }

        state.table.remove(pid, vpn)?;
        state.frames.release(entry.ppn)?;
        PagingStats::inc(&self.stats.evictions);
        crate::kdebug!("(EVICT) evictada pid/vpn/ppn=", pid, vpn, entry.ppn);
        Ok(entry.ppn)
    }

    /// Evicta uma página específica
    pub fn evict_page(&self, pid: Pid, vpn: Vpn) -> MmResult<Ppn> {
        let mut state = self.lock();
        self.evict_entry(&mut state, pid, vpn)
    }
}
