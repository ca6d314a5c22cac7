//! # Swap Subsystem
//!
//! Backing store para páginas evictadas: um arquivo plano de slots do
//! tamanho de uma página, slot *i* em `[i·page_size, (i+1)·page_size)`,
//! sem cabeçalho.
//!
//! Contabilidade por (pid, vpn):
//! - **pending**: página cujo conteúdo inicial ainda é a imagem do programa
//!   e que nunca foi para o swap.
//! - **table**: página com slot atribuído.
//! - **free_slots**: slots devolvidos, reusados antes de crescer o arquivo.

use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::fs::{BackingFile, FsError, HostFile, MemFile};
use crate::mm::addr::{PageKey, Pid};
use crate::mm::config::SwapBacking;
use crate::mm::error::{MmError, MmResult};

/// Slot de swap (índice no backing store)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SwapSlot(pub u64);

impl SwapSlot {
    /// Offset do slot no arquivo
    #[inline]
    pub fn offset(self, page_size: usize) -> u64 {
        self.0 * page_size as u64
    }
}

/// Resultado de uma leitura do swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapRead {
    /// Conteúdo lido do slot
    Loaded(SwapSlot),
    /// (pid, vpn) sem slot: página zerada
    ZeroFilled,
}

/// Estatísticas de swap
pub struct SwapStats {
    pub pages_in: AtomicU64,
    pub pages_out: AtomicU64,
    pub untracked_reads: AtomicU64,
}

impl SwapStats {
    pub const fn new() -> Self {
        Self {
            pages_in: AtomicU64::new(0),
            pages_out: AtomicU64::new(0),
            untracked_reads: AtomicU64::new(0),
        }
    }
}

impl Default for SwapStats {
    fn default() -> Self {
        Self::new()
    }
}

fn io_error(err: FsError) -> MmError {
    match err {
        FsError::Closed => MmError::SwapClosed,
        _ => MmError::SwapIo,
    }
}

pub struct Swapper {
    file: Option<Box<dyn BackingFile>>,
    page_size: usize,
    table: HashMap<PageKey, SwapSlot>,
    pending: HashSet<PageKey>,
    free_slots: VecDeque<SwapSlot>,
    /// Primeiro slot nunca usado (tamanho do arquivo em slots)
    next_slot: u64,
    pub stats: SwapStats,
}

impl Swapper {
    /// Abre o backing store configurado
    pub fn open(backing: &SwapBacking, page_size: usize) -> MmResult<Self> {
        let file: Box<dyn BackingFile> = match backing {
            SwapBacking::File(path) => {
                crate::kinfo!("(SWAP) Criando arquivo de swap");
                Box::new(HostFile::create(path).map_err(|err| {
                    crate::kerror!("(SWAP) Falha ao criar arquivo de swap");
                    io_error(err)
                })?)
            }
            SwapBacking::Memory => Box::new(MemFile::new()),
        };
        Ok(Self::with_file(file, page_size))
    }

    pub fn with_file(file: Box<dyn BackingFile>, page_size: usize) -> Self {
        Self {
            file: Some(file),
            page_size,
            table: HashMap::new(),
            pending: HashSet::new(),
            free_slots: VecDeque::new(),
            next_slot: 0,
            stats: SwapStats::new(),
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    // =========================================================================
    // CONTABILIDADE
    // =========================================================================

    /// Marca a página como "conteúdo ainda é a imagem"
    pub fn mark_pending(&mut self, key: PageKey) {
        if !self.table.contains_key(&key) {
            self.pending.insert(key);
        }
    }

    #[inline]
    pub fn is_pending(&self, key: PageKey) -> bool {
        self.pending.contains(&key)
    }

    #[inline]
    pub fn slot_of(&self, key: PageKey) -> Option<SwapSlot> {
        self.table.get(&key).copied()
    }

    /// Atribui um slot à página (idempotente).
    ///
    /// Reusa slots devolvidos antes de crescer o arquivo. A página deixa de
    /// ser pending.
    pub fn allocate_slot(&mut self, key: PageKey) -> SwapSlot {
        if let Some(slot) = self.table.get(&key) {
            return *slot;
        }
        self.pending.remove(&key);

        let slot = match self.free_slots.pop_front() {
            Some(slot) => slot,
            None => {
                let slot = SwapSlot(self.next_slot);
                self.next_slot += 1;
                slot
            }
        };
        crate::kdebug!("(SWAP) slot atribuído pid/vpn/slot=", key.pid, key.vpn, slot.0);
        self.table.insert(key, slot);
        slot
    }

    /// Devolve o slot da página. No-op se não havia slot.
    pub fn free_slot(&mut self, key: PageKey) {
        if let Some(slot) = self.table.remove(&key) {
            self.free_slots.push_back(slot);
        }
    }

    /// Esquece toda página do processo (slots voltam para a lista livre)
    pub fn release_process(&mut self, pid: Pid) {
        self.pending.retain(|key| key.pid != pid);

        let mut keys: Vec<PageKey> = self
            .table
            .keys()
            .filter(|key| key.pid == pid)
            .copied()
            .collect();
        keys.sort_unstable();
        for key in keys {
            self.free_slot(key);
        }
    }

    // =========================================================================
    // I/O
    // =========================================================================

    /// Lê a página de (pid, vpn) para `buf`.
    ///
    /// Página sem slot é estado inconsistente: devolve página zerada e
    /// registra o diagnóstico, sem erro.
    pub fn read_into(&mut self, key: PageKey, buf: &mut [u8]) -> MmResult<SwapRead> {
        if buf.len() != self.page_size {
            return Err(MmError::InvalidParameter);
        }
        let page_size = self.page_size;
        let slot = self.table.get(&key).copied();
        let file = self.file.as_mut().ok_or(MmError::SwapClosed)?;

        let slot = match slot {
            Some(slot) => slot,
            None => {
                crate::kwarn!("(SWAP) Leitura de página sem slot pid/vpn=", key.pid, key.vpn);
                self.stats.untracked_reads.fetch_add(1, Ordering::Relaxed);
                buf.fill(0);
                return Ok(SwapRead::ZeroFilled);
            }
        };

        let n = file.read_at(slot.offset(page_size), buf).map_err(|err| {
            crate::kerror!("(SWAP) Falha de leitura slot=", slot.0);
            io_error(err)
        })?;
        buf[n..].fill(0);
        self.stats.pages_in.fetch_add(1, Ordering::Relaxed);
        Ok(SwapRead::Loaded(slot))
    }

    /// Lê a página de (pid, vpn) para um buffer novo
    pub fn read(&mut self, key: PageKey) -> MmResult<Vec<u8>> {
        let mut page = vec![0u8; self.page_size];
        self.read_into(key, &mut page)?;
        Ok(page)
    }

    /// Grava a página inteira de (pid, vpn), atribuindo slot se preciso
    pub fn write(&mut self, key: PageKey, page: &[u8]) -> MmResult<SwapSlot> {
        if page.len() != self.page_size {
            return Err(MmError::InvalidParameter);
        }
        if self.file.is_none() {
            return Err(MmError::SwapClosed);
        }

        let slot = self.allocate_slot(key);
        let offset = slot.offset(self.page_size);
        let file = self.file.as_mut().ok_or(MmError::SwapClosed)?;
        file.write_at(offset, page).map_err(|err| {
            crate::kerror!("(SWAP) Falha de escrita slot=", slot.0);
            io_error(err)
        })?;

        self.stats.pages_out.fetch_add(1, Ordering::Relaxed);
        Ok(slot)
    }

    /// Fecha e remove o arquivo de swap
    pub fn close(&mut self) {
        let Some(mut file) = self.file.take() else {
            return;
        };
        file.close();
        if file.remove().is_err() {
            crate::kwarn!("(SWAP) Falha ao remover arquivo de swap");
        }
        self.table.clear();
        self.pending.clear();
        self.free_slots.clear();
        crate::kinfo!("(SWAP) Fechado, slots usados=", self.next_slot);
    }

    // =========================================================================
    // CONSULTAS
    // =========================================================================

    pub fn slots_in_use(&self) -> usize {
        self.table.len()
    }

    pub fn free_slot_count(&self) -> usize {
        self.free_slots.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Tamanho do arquivo em slots
    pub fn capacity(&self) -> u64 {
        self.next_slot
    }

    /// Nenhum slot referenciado duas vezes, nenhum slot livre referenciado,
    /// nenhuma página pending com slot.
    pub fn check_consistency(&self) -> MmResult<()> {
        let mut seen = HashSet::new();
        for (key, slot) in &self.table {
            if slot.0 >= self.next_slot || !seen.insert(*slot) {
                crate::kerror!("(SWAP) slot duplicado ou fora do arquivo=", slot.0);
                return Err(MmError::InvariantViolation);
            }
            if self.pending.contains(key) {
                crate::kerror!("(SWAP) página pending com slot pid/vpn=", key.pid, key.vpn);
                return Err(MmError::InvariantViolation);
            }
        }
        for slot in &self.free_slots {
            if !seen.insert(*slot) {
                crate::kerror!("(SWAP) slot livre ainda referenciado=", slot.0);
                return Err(MmError::InvariantViolation);
            }
        }
        Ok(())
    }
}

impl Drop for Swapper {
    fn drop(&mut self) {
        self.close();
    }
}
