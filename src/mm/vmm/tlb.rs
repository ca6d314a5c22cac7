//! # TLB da Máquina Simulada
//!
//! Cache de traduções com `tlb_size` slots. Cada slot carrega o ASID (pid)
//! do dono, então entradas de processos diferentes convivem no TLB e a
//! invalidação de uma página vítima acha o slot certo mesmo quando o dono
//! não é o processo que está rodando.
//!
//! O TLB só é tocado com interrupções desligadas (`IrqSpinlock` do
//! `Processor`), dentro do lock global do pager quando a operação é
//! composta.

use core::sync::atomic::{AtomicU64, Ordering};

use super::entry::TranslationEntry;
use crate::mm::addr::{Pid, Vpn};

// =============================================================================
// ESTATÍSTICAS
// =============================================================================

/// Estatísticas de TLB para telemetria
pub struct TlbStats {
    pub refills: AtomicU64,
    pub invalidations: AtomicU64,
    pub misses: AtomicU64,
    pub context_flushes: AtomicU64,
}

impl TlbStats {
    pub const fn new() -> Self {
        Self {
            refills: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            context_flushes: AtomicU64::new(0),
        }
    }

    /// Cópia dos contadores: (refills, invalidations, misses, context_flushes)
    pub fn snapshot(&self) -> (u64, u64, u64, u64) {
        (
            self.refills.load(Ordering::Relaxed),
            self.invalidations.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.context_flushes.load(Ordering::Relaxed),
        )
    }
}

impl Default for TlbStats {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SLOTS
// =============================================================================

/// Um slot do TLB: entrada + dono
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TlbSlot {
    pub asid: Pid,
    pub entry: TranslationEntry,
}

impl TlbSlot {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.entry.is_valid()
    }

    #[inline]
    pub fn matches(&self, asid: Pid, vpn: Vpn) -> bool {
        self.is_valid() && self.asid == asid && self.entry.vpn == vpn
    }
}

/// TLB simulado
pub struct Tlb {
    slots: Vec<TlbSlot>,
    pub stats: TlbStats,
}

impl Tlb {
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![TlbSlot::default(); size],
            stats: TlbStats::new(),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Lê o slot `index`
    #[inline]
    pub fn read(&self, index: usize) -> Option<TlbSlot> {
        self.slots.get(index).copied()
    }

    /// Escreve o slot `index`, devolvendo o conteúdo anterior
    pub fn write(&mut self, index: usize, asid: Pid, entry: TranslationEntry) -> Option<TlbSlot> {
        let slot = self.slots.get_mut(index)?;
        let old = *slot;
        *slot = TlbSlot { asid, entry };
        self.stats.refills.fetch_add(1, Ordering::Relaxed);
        crate::ktrace!("(TLB) refill slot/asid/vpn=", index, asid, entry.vpn);
        Some(old)
    }

    /// Invalida o slot `index`, devolvendo o conteúdo anterior se era válido
    pub fn invalidate(&mut self, index: usize) -> Option<TlbSlot> {
        let slot = self.slots.get_mut(index)?;
        if !slot.is_valid() {
            return None;
        }
        let old = *slot;
        slot.entry.invalidate();
        self.stats.invalidations.fetch_add(1, Ordering::Relaxed);
        crate::ktrace!("(TLB) invalidate slot/asid/vpn=", index, old.asid, old.entry.vpn);
        Some(old)
    }

    /// Índice do slot que traduz (asid, vpn)
    pub fn find(&self, asid: Pid, vpn: Vpn) -> Option<usize> {
        self.slots.iter().position(|s| s.matches(asid, vpn))
    }

    /// Acesso mutável à entrada de (asid, vpn), usado no caminho de tradução
    pub fn lookup_mut(&mut self, asid: Pid, vpn: Vpn) -> Option<&mut TranslationEntry> {
        self.slots
            .iter_mut()
            .find(|s| s.matches(asid, vpn))
            .map(|s| &mut s.entry)
    }

    /// Primeiro slot inválido
    pub fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| !s.is_valid())
    }

    /// Invalida todo slot que traduz (asid, vpn).
    ///
    /// Devolve a entrada com os bits USED/DIRTY acumulados de todos os slots,
    /// para o chamador mesclar na tabela.
    pub fn invalidate_page(&mut self, asid: Pid, vpn: Vpn) -> Option<TranslationEntry> {
        let mut merged: Option<TranslationEntry> = None;
        for index in 0..self.slots.len() {
            if !self.slots[index].matches(asid, vpn) {
                continue;
            }
            if let Some(old) = self.invalidate(index) {
                merged = Some(match merged {
                    Some(mut acc) => {
                        acc.flags |= old.entry.hw_bits();
                        acc
                    }
                    None => old.entry,
                });
            }
        }
        merged
    }

    /// Invalida todos os slots de um ASID, devolvendo as entradas removidas
    pub fn invalidate_asid(&mut self, asid: Pid) -> Vec<TranslationEntry> {
        let mut flushed = Vec::new();
        for index in 0..self.slots.len() {
            if self.slots[index].is_valid() && self.slots[index].asid == asid {
                if let Some(old) = self.invalidate(index) {
                    flushed.push(old.entry);
                }
            }
        }
        flushed
    }

    /// Slots válidos (para verificação de invariantes)
    pub fn valid_slots(&self) -> impl Iterator<Item = (usize, &TlbSlot)> {
        self.slots.iter().enumerate().filter(|(_, s)| s.is_valid())
    }
}
