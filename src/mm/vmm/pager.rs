//! # Pager
//!
//! Dono do estado compartilhado da paginação sob demanda: tabela global,
//! alocador de páginas físicas, swap e o RNG da política de substituição.
//! Tudo fica atrás de um único lock (`spin::Mutex<PagerState>`); toda
//! operação composta (fault, eviction, teardown, save/restore) roda
//! inteira dentro dele.
//!
//! O caminho de fault está em `mm::fault`, a eviction em
//! `mm::reclaim::evict` e o save/restore em `mm::aspace::context`.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::entry::TranslationEntry;
use super::table::PageTable;
use crate::arch::{AccessType, Exception, Processor};
use crate::core::image::ImagePages;
use crate::mm::addr::{PageKey, PhysAddr, Pid, Ppn, VirtAddr, Vpn};
use crate::mm::aspace::context::TlbSnapshot;
use crate::mm::aspace::Transfer;
use crate::mm::config::MmConfig;
use crate::mm::error::{MmError, MmResult};
use crate::mm::pmm::{FrameAllocator, PhysicalMemory};
use crate::mm::stats::{PagingSnapshot, PagingStats};
use crate::mm::swap::Swapper;

/// O que o pager sabe de cada espaço de endereçamento
pub struct SpaceInfo {
    pub num_pages: usize,
    pub image: Option<Arc<ImagePages>>,
    pub snapshot: TlbSnapshot,
}

/// Estado protegido pelo lock global
pub struct PagerState {
    pub table: PageTable,
    pub frames: FrameAllocator,
    pub swap: Swapper,
    pub rng: StdRng,
    pub spaces: HashMap<Pid, SpaceInfo>,
}

pub struct Pager {
    state: spin::Mutex<PagerState>,
    pub(crate) processor: Arc<Processor>,
    pub(crate) memory: Arc<PhysicalMemory>,
    pub(crate) stats: PagingStats,
    page_size: usize,
}

impl Pager {
    pub fn new(
        config: &MmConfig,
        processor: Arc<Processor>,
        memory: Arc<PhysicalMemory>,
    ) -> MmResult<Self> {
        config.validate()?;
        let swap = Swapper::open(&config.swap, config.page_size)?;
        Self::with_swapper(config, processor, memory, swap)
    }

    /// Monta o pager sobre um swapper já aberto.
    ///
    /// Processador e memória precisam bater com `config`.
    pub fn with_swapper(
        config: &MmConfig,
        processor: Arc<Processor>,
        memory: Arc<PhysicalMemory>,
        swap: Swapper,
    ) -> MmResult<Self> {
        config.validate()?;
        if processor.tlb_size() == 0 || processor.page_size() != config.page_size {
            crate::kerror!("(PAGER) Processador incompatível tlb/page_size=", processor.tlb_size(), processor.page_size());
            return Err(MmError::InvalidParameter);
        }
        if memory.num_pages() != config.num_phys_pages || memory.page_size() != config.page_size {
            crate::kerror!("(PAGER) Memória incompatível páginas=", memory.num_pages());
            return Err(MmError::InvalidParameter);
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        crate::kinfo!("(PAGER) Inicializado, páginas/tlb=", config.num_phys_pages, config.tlb_size);
        Ok(Self {
            state: spin::Mutex::new(PagerState {
                table: PageTable::new(config.num_phys_pages),
                frames: FrameAllocator::new(config.num_phys_pages),
                swap,
                rng,
                spaces: HashMap::new(),
            }),
            processor,
            memory,
            stats: PagingStats::new(),
            page_size: config.page_size,
        })
    }

    /// Trava o estado global
    #[inline]
    pub fn lock(&self) -> spin::MutexGuard<'_, PagerState> {
        self.state.lock()
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[inline]
    pub fn processor(&self) -> &Arc<Processor> {
        &self.processor
    }

    #[inline]
    pub fn memory(&self) -> &Arc<PhysicalMemory> {
        &self.memory
    }

    // =========================================================================
    // ESPAÇOS DE ENDEREÇAMENTO
    // =========================================================================

    /// Registra o espaço de `pid`. Páginas da imagem ficam pending: o
    /// primeiro toque carrega da imagem.
    pub fn register_space(
        &self,
        pid: Pid,
        num_pages: usize,
        image: Option<Arc<ImagePages>>,
    ) -> MmResult<()> {
        let mut state = self.state.lock();
        if state.spaces.contains_key(&pid) {
            crate::kwarn!("(PAGER) Espaço já registrado pid=", pid);
            return Err(MmError::AlreadyMapped);
        }

        if let Some(image) = &image {
            for vpn in image.vpns() {
                state.swap.mark_pending(PageKey::new(pid, vpn));
            }
        }
        state.spaces.insert(
            pid,
            SpaceInfo {
                num_pages,
                image,
                snapshot: TlbSnapshot::default(),
            },
        );
        crate::kdebug!("(PAGER) Espaço registrado pid/páginas=", pid, num_pages);
        Ok(())
    }

    /// `vpn` pertence ao espaço de `pid`?
    pub(crate) fn in_bounds(state: &PagerState, pid: Pid, vpn: Vpn) -> bool {
        state
            .spaces
            .get(&pid)
            .is_some_and(|space| (vpn as usize) < space.num_pages)
    }

    /// Entrada de (pid, vpn) na tabela global
    pub fn lookup(&self, pid: Pid, vpn: Vpn) -> Option<TranslationEntry> {
        self.state.lock().table.lookup(pid, vpn)
    }

    // =========================================================================
    // TRADUÇÃO
    // =========================================================================

    /// Traduz pelo TLB, checando os limites do espaço
    pub fn translate(
        &self,
        pid: Pid,
        vaddr: VirtAddr,
        access: AccessType,
    ) -> Result<PhysAddr, Exception> {
        let state = self.state.lock();
        if !Self::in_bounds(&state, pid, vaddr.vpn(self.page_size)) {
            return Err(Exception::AddressError);
        }
        self.processor.translate(pid, vaddr, access)
    }

    /// Traduz e copia bytes dentro de uma página, tudo sob o lock global
    /// para que a página não seja evictada no meio da cópia.
    pub fn transfer(&self, pid: Pid, vaddr: VirtAddr, data: Transfer<'_>) -> Result<usize, Exception> {
        let state = self.state.lock();
        if !Self::in_bounds(&state, pid, vaddr.vpn(self.page_size)) {
            return Err(Exception::AddressError);
        }
        let paddr = self.processor.translate(pid, vaddr, data.access())?;
        let copied = data.copy(&self.memory, paddr);
        drop(state);
        Ok(copied)
    }

    // =========================================================================
    // TEARDOWN E SHUTDOWN
    // =========================================================================

    /// Devolve todas as páginas físicas e slots de swap de `pid`
    pub fn teardown(&self, pid: Pid) {
        let mut state = self.state.lock();

        // Processo morrendo: bits do TLB não interessam mais
        self.processor.tlb().invalidate_asid(pid);

        let mut released = 0usize;
        for vpn in state.table.vpns_of(pid) {
            let Ok(entry) = state.table.remove(pid, vpn) else {
                continue;
            };
            if entry.is_valid() {
                if state.frames.release(entry.ppn).is_err() {
                    crate::kerror!("(PAGER) teardown com ppn inconsistente=", entry.ppn);
                }
                released += 1;
            }
        }
        state.swap.release_process(pid);
        state.spaces.remove(&pid);
        crate::kdebug!("(PAGER) teardown pid/páginas=", pid, released);
    }

    /// Fecha e remove o arquivo de swap
    pub fn close(&self) {
        self.state.lock().swap.close();
    }

    // =========================================================================
    // CONSULTAS
    // =========================================================================

    pub fn resident_pages(&self) -> usize {
        self.state.lock().table.resident_count()
    }

    pub fn free_pages(&self) -> usize {
        self.state.lock().frames.free_count()
    }

    pub fn stats(&self) -> PagingSnapshot {
        let state = self.state.lock();
        self.stats
            .snapshot(state.table.resident_count(), state.frames.free_count())
    }

    /// Verifica os invariantes globais:
    /// - livres e residentes particionam {0 … N−1};
    /// - cada ppn residente tem um único dono;
    /// - todo slot válido do TLB concorda com a tabela;
    /// - contabilidade do swap sem slots duplicados.
    pub fn check_invariants(&self) -> MmResult<()> {
        let state = self.state.lock();
        state.table.check_consistency()?;
        state.swap.check_consistency()?;

        let total = state.frames.total_frames();
        if state.frames.free_count() + state.table.resident_count() != total {
            crate::kerror!(
                "(PAGER) partição quebrada livres/residentes=",
                state.frames.free_count(),
                state.table.resident_count()
            );
            return Err(MmError::InvariantViolation);
        }
        for ppn in 0..total as Ppn {
            let free = state.frames.is_free(ppn);
            let resident = state.table.owner_of(ppn).is_some();
            if free == resident {
                crate::kerror!("(PAGER) ppn livre e residente (ou nenhum)=", ppn);
                return Err(MmError::InvariantViolation);
            }
        }

        let tlb = self.processor.tlb();
        for (index, slot) in tlb.valid_slots() {
            match state.table.lookup(slot.asid, slot.entry.vpn) {
                Some(entry) if entry.is_valid() && entry.ppn == slot.entry.ppn => {}
                _ => {
                    crate::kerror!("(PAGER) slot de TLB órfão slot/asid/vpn=", index, slot.asid, slot.entry.vpn);
                    return Err(MmError::InvariantViolation);
                }
            }
        }
        Ok(())
    }
}
