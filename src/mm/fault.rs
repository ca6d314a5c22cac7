//! # Page Fault Handler
//!
//! Miss de TLB e page fault da paginação sob demanda.
//!
//! ```text
//! UNMAPPED ──(1º toque)──▶ RESIDENT ──(eviction)──▶ ON_STORE
//!                              ▲                        │
//!                              └──────(refault)─────────┘
//! ```
//!
//! Primeiro toque de página da imagem (pending): carrega da imagem, limpa.
//! Página com slot: lê do swap. Qualquer outra (pilha, argv): zerada.

use core::sync::atomic::Ordering;

use rand::Rng;

use crate::arch::Exception;
use crate::mm::addr::{PageKey, Pid, VirtAddr, Vpn};
use crate::mm::error::{MmError, MmResult};
use crate::mm::stats::PagingStats;
use crate::mm::vmm::entry::{EntryFlags, TranslationEntry};
use crate::mm::vmm::tlb::Tlb;
use crate::mm::vmm::{Pager, PagerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultResult {
    Success,
    OutOfMemory,
    ProtectionViolation,
    InvalidAddress,
    FatalError,
}

impl FaultResult {
    /// Resultado de um `handle_miss`
    pub fn from_miss(result: MmResult<TranslationEntry>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(MmError::OutOfMemory) => Self::OutOfMemory,
            Err(MmError::InvalidAddress) => Self::InvalidAddress,
            Err(err) => {
                crate::kerror!("(FAULT) Fault irrecuperável");
                crate::kerror!(err.as_str());
                Self::FatalError
            }
        }
    }

    /// Resultado para exceções que o pager não resolve
    pub fn from_exception(exception: Exception) -> Self {
        match exception {
            Exception::TlbMiss => Self::FatalError,
            Exception::ReadOnly => Self::ProtectionViolation,
            Exception::AddressError => Self::InvalidAddress,
        }
    }

    /// Erro equivalente, para quem propaga `MmResult`
    pub fn as_error(self) -> Option<MmError> {
        match self {
            Self::Success => None,
            Self::OutOfMemory => Some(MmError::OutOfMemory),
            Self::ProtectionViolation => Some(MmError::ReadOnly),
            Self::InvalidAddress => Some(MmError::InvalidAddress),
            Self::FatalError => Some(MmError::SwapIo),
        }
    }
}

/// Instala `entry` de `pid` num slot do TLB.
///
/// Prefere slot inválido; senão sorteia um. Slot válido sobrescrito tem
/// USED/DIRTY devolvidos para a tabela antes.
pub(crate) fn install_tlb_entry(tlb: &mut Tlb, state: &mut PagerState, pid: Pid, entry: TranslationEntry) {
    if tlb.find(pid, entry.vpn).is_some() {
        return;
    }
    if tlb.size() == 0 {
        crate::kerror!("(TLB) TLB sem slots, refill ignorado pid/vpn=", pid, entry.vpn);
        return;
    }

    let index = match tlb.free_slot() {
        Some(index) => index,
        None => state.rng.gen_range(0..tlb.size()),
    };

    if let Some(old) = tlb.invalidate(index) {
        if state.table.update(old.asid, old.entry.vpn, old.entry).is_err() {
            crate::kwarn!("(TLB) slot sem entrada na tabela asid/vpn=", old.asid, old.entry.vpn);
        }
    }
    tlb.write(index, pid, entry);
}

impl Pager {
    /// Trata um miss de TLB de (pid, vaddr).
    ///
    /// Página residente: só refill. Senão, page fault completo: aloca
    /// página (evictando se preciso), carrega o conteúdo, insere na tabela
    /// e faz o refill.
    pub fn handle_miss(&self, pid: Pid, vaddr: VirtAddr) -> MmResult<TranslationEntry> {
        let vpn = vaddr.vpn(self.page_size());
        let mut state = self.lock();

        if !Pager::in_bounds(&state, pid, vpn) {
            crate::kwarn!("(FAULT) Endereço fora do espaço pid/vaddr=", pid, vaddr.as_u32());
            return Err(MmError::InvalidAddress);
        }
        PagingStats::inc(&self.stats.tlb_misses);

        let entry = match state.table.lookup(pid, vpn) {
            Some(entry) if entry.is_valid() => entry,
            _ => self.fault_in(&mut state, pid, vpn)?,
        };

        let mut tlb = self.processor.tlb();
        install_tlb_entry(&mut tlb, &mut state, pid, entry);
        Ok(entry)
    }

    /// Torna (pid, vpn) residente
    fn fault_in(&self, state: &mut PagerState, pid: Pid, vpn: Vpn) -> MmResult<TranslationEntry> {
        PagingStats::inc(&self.stats.page_faults);
        crate::kdebug!("(FAULT) page fault pid/vpn=", pid, vpn);

        let ppn = self.acquire_page(state)?;
        let mut page = vec![0u8; self.page_size()];

        let loaded = self
            .page_in(state, PageKey::new(pid, vpn), &mut page)
            .and_then(|read_only| self.memory.write_page(ppn, &page).map(|_| read_only));
        let read_only = match loaded {
            Ok(read_only) => read_only,
            Err(err) => {
                if state.frames.release(ppn).is_err() {
                    crate::kerror!("(FAULT) release inconsistente ppn=", ppn);
                }
                return Err(err);
            }
        };

        let mut flags = EntryFlags::VALID | EntryFlags::USED;
        if read_only {
            flags |= EntryFlags::READ_ONLY;
        }
        let entry = TranslationEntry::new(vpn, ppn, flags);
        if let Err(err) = state.table.insert(pid, vpn, entry) {
            if state.frames.release(ppn).is_err() {
                crate::kerror!("(FAULT) release inconsistente ppn=", ppn);
            }
            return Err(err);
        }
        Ok(entry)
    }

    /// Preenche `buf` com o conteúdo atual de `key`. Devolve se é read-only.
    fn page_in(&self, state: &mut PagerState, key: PageKey, buf: &mut [u8]) -> MmResult<bool> {
        if state.swap.is_pending(key) {
            let image = state
                .spaces
                .get(&key.pid)
                .and_then(|space| space.image.clone());
            if let Some(image) = image.filter(|image| image.locate(key.vpn).is_some()) {
                let read_only = image.load(key.vpn, buf)?;
                self.stats.image_loads.fetch_add(1, Ordering::Relaxed);
                crate::ktrace!("(FAULT) carregada da imagem pid/vpn=", key.pid, key.vpn);
                return Ok(read_only);
            }
        }

        if state.swap.slot_of(key).is_some() {
            state.swap.read_into(key, buf)?;
            self.stats.swap_ins.fetch_add(1, Ordering::Relaxed);
            crate::ktrace!("(FAULT) lida do swap pid/vpn=", key.pid, key.vpn);
            return Ok(false);
        }

        buf.fill(0);
        self.stats.zero_fills.fetch_add(1, Ordering::Relaxed);
        crate::ktrace!("(FAULT) página zerada pid/vpn=", key.pid, key.vpn);
        Ok(false)
    }
}
