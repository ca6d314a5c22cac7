//! Estado de troca de contexto: snapshot do TLB de um processo.
//!
//! Save devolve USED/DIRTY de cada slot do processo para a tabela global
//! e invalida os slots. Restore reinstala só o que ainda bate com a
//! tabela: página evictada enquanto o processo estava fora não volta.

use core::sync::atomic::Ordering;

use crate::mm::addr::Pid;
use crate::mm::fault::install_tlb_entry;
use crate::mm::stats::PagingStats;
use crate::mm::vmm::{Pager, TranslationEntry};

/// Entradas de TLB de um processo fora da CPU
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlbSnapshot {
    pub entries: Vec<TranslationEntry>,
}

impl TlbSnapshot {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Pager {
    /// Salva o contexto de `pid`
    pub fn save_context(&self, pid: Pid) {
        let mut state = self.lock();
        let flushed = {
            let mut tlb = self.processor.tlb();
            let flushed = tlb.invalidate_asid(pid);
            tlb.stats.context_flushes.fetch_add(1, Ordering::Relaxed);
            flushed
        };

        for entry in &flushed {
            if state.table.update(pid, entry.vpn, *entry).is_err() {
                crate::kwarn!("(CTX) entrada de TLB sem tabela pid/vpn=", pid, entry.vpn);
            }
        }

        if let Some(space) = state.spaces.get_mut(&pid) {
            space.snapshot = TlbSnapshot { entries: flushed };
        }
        PagingStats::inc(&self.stats.context_saves);
        crate::ktrace!("(CTX) save pid=", pid);
    }

    /// Restaura o contexto de `pid`
    pub fn restore_context(&self, pid: Pid) {
        let mut state = self.lock();
        let snapshot = match state.spaces.get_mut(&pid) {
            Some(space) => core::mem::take(&mut space.snapshot),
            None => return,
        };

        let mut tlb = self.processor.tlb();
        for saved in snapshot.entries {
            match state.table.lookup(pid, saved.vpn) {
                Some(current) if current.is_valid() && current.ppn == saved.ppn => {
                    install_tlb_entry(&mut tlb, &mut state, pid, current);
                }
                _ => {
                    crate::ktrace!("(CTX) entrada descartada (evictada) pid/vpn=", pid, saved.vpn);
                }
            }
        }
        crate::ktrace!("(CTX) restore pid=", pid);
    }
}
