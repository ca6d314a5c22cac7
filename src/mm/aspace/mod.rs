//! # Address Space Manager
//!
//! Estratégias de tradução que um `Process` pode usar:
//! - `StaticMapping`: todas as páginas alocadas no load, sem TLB e sem swap.
//! - `DemandPaging`: páginas sob demanda via pager global, TLB e swap.

pub mod context;
pub mod paged;
pub mod static_map;

pub use paged::DemandPaging;
pub use static_map::StaticMapping;

use std::sync::Arc;

use crate::arch::{AccessType, Exception};
use crate::core::image::ImagePages;
use crate::mm::addr::{PhysAddr, Pid, VirtAddr};
use crate::mm::error::MmResult;
use crate::mm::fault::FaultResult;
use crate::mm::pmm::PhysicalMemory;

/// Layout decidido pelo carregador
pub struct AddressLayout {
    /// Páginas totais: imagem + pilha + argumentos
    pub num_pages: usize,
    pub image: Arc<ImagePages>,
}

/// Cópia entre buffer do kernel e memória de um processo
pub enum Transfer<'a> {
    Read(&'a mut [u8]),
    Write(&'a [u8]),
}

impl Transfer<'_> {
    #[inline]
    pub fn access(&self) -> AccessType {
        match self {
            Self::Read(_) => AccessType::Read,
            Self::Write(_) => AccessType::Write,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::Read(buf) => buf.len(),
            Self::Write(buf) => buf.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Executa a cópia a partir de `paddr`. Devolve bytes copiados.
    pub fn copy(self, memory: &PhysicalMemory, paddr: PhysAddr) -> usize {
        match self {
            Self::Read(buf) => memory.read(paddr, buf),
            Self::Write(buf) => memory.write(paddr, buf),
        }
    }
}

/// Estratégia de tradução de endereços de um processo
pub trait AddressTranslation: Send + Sync {
    /// Prepara o espaço de endereçamento de `pid`
    fn load(&self, pid: Pid, layout: &AddressLayout) -> MmResult<()>;

    /// Traduz um acesso; USED/DIRTY são atualizados
    fn translate(&self, pid: Pid, vaddr: VirtAddr, access: AccessType) -> Result<PhysAddr, Exception>;

    /// Traduz e copia, sem cruzar a página de `vaddr`
    fn transfer(&self, pid: Pid, vaddr: VirtAddr, data: Transfer<'_>) -> Result<usize, Exception>;

    /// Trata a exceção levantada por `translate`/`transfer`
    fn handle_fault(&self, pid: Pid, vaddr: VirtAddr, exception: Exception) -> FaultResult;

    /// Processo sai da CPU
    fn save_context(&self, pid: Pid);

    /// Processo volta para a CPU
    fn restore_context(&self, pid: Pid);

    /// Libera tudo que o processo tem
    fn teardown(&self, pid: Pid);

    fn page_size(&self) -> usize;
}
