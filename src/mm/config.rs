//! # Configuração do Módulo de Memória
//!
//! Define constantes da máquina simulada e a configuração de boot do pager.

use std::path::PathBuf;

use super::error::{MmError, MmResult};

// =============================================================================
// CONSTANTES DA MÁQUINA
// =============================================================================

/// Tamanho de uma página (1 KiB)
pub const PAGE_SIZE: usize = 1024;

/// Número de páginas físicas da máquina padrão
pub const NUM_PHYS_PAGES: usize = 32;

/// Número de slots do TLB
pub const TLB_SIZE: usize = 4;

/// Páginas de pilha reservadas para cada processo
pub const STACK_PAGES: usize = 8;

/// Nome padrão do arquivo de swap
pub const SWAP_FILE_NAME: &str = "forge.swap";

/// Tamanho de um ponteiro do argv na página de argumentos
pub const ARGV_POINTER_SIZE: usize = 4;

/// Tamanho máximo de um espaço de endereçamento (VirtAddr/PhysAddr de 32 bits)
pub const ADDRESS_SPACE_SIZE: u64 = 1 << 32;

// =============================================================================
// MODOS
// =============================================================================

/// Estratégia de tradução usada pelos processos do kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationMode {
    /// Todas as páginas alocadas no load, sem TLB e sem swap.
    Static,
    /// Paginação sob demanda com TLB, eviction e swap.
    DemandPaged,
}

/// Onde vivem as páginas evictadas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapBacking {
    /// Arquivo no sistema de arquivos do host (removido no shutdown).
    File(PathBuf),
    /// Buffer em memória (testes, demonstrações).
    Memory,
}

// =============================================================================
// CONFIGURAÇÃO DE BOOT
// =============================================================================

/// Configuração do subsistema de memória, fixada no boot.
#[derive(Debug, Clone)]
pub struct MmConfig {
    pub page_size: usize,
    pub num_phys_pages: usize,
    pub tlb_size: usize,
    pub stack_pages: usize,
    pub mode: TranslationMode,
    pub swap: SwapBacking,
    /// Semente do RNG de substituição. `None` usa entropia do host.
    pub seed: Option<u64>,
}

impl Default for MmConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            num_phys_pages: NUM_PHYS_PAGES,
            tlb_size: TLB_SIZE,
            stack_pages: STACK_PAGES,
            mode: TranslationMode::DemandPaged,
            swap: SwapBacking::File(PathBuf::from(SWAP_FILE_NAME)),
            seed: None,
        }
    }
}

impl MmConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_phys_pages(mut self, num_phys_pages: usize) -> Self {
        self.num_phys_pages = num_phys_pages;
        self
    }

    pub fn with_tlb_size(mut self, tlb_size: usize) -> Self {
        self.tlb_size = tlb_size;
        self
    }

    pub fn with_stack_pages(mut self, stack_pages: usize) -> Self {
        self.stack_pages = stack_pages;
        self
    }

    pub fn with_mode(mut self, mode: TranslationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_swap(mut self, swap: SwapBacking) -> Self {
        self.swap = swap;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Valida a configuração antes do boot.
    pub fn validate(&self) -> MmResult<()> {
        if self.page_size == 0 || !self.page_size.is_power_of_two() {
            crate::kerror!("(MM) page_size precisa ser potência de 2:", self.page_size);
            return Err(MmError::InvalidParameter);
        }
        if self.num_phys_pages == 0 {
            crate::kerror!("(MM) Memória física vazia");
            return Err(MmError::InvalidParameter);
        }
        if self.tlb_size == 0 {
            crate::kerror!("(MM) TLB sem slots");
            return Err(MmError::InvalidParameter);
        }
        if !fits_address_space(self.num_phys_pages, self.page_size) {
            crate::kerror!("(MM) Memória física maior que 32 bits páginas=", self.num_phys_pages);
            return Err(MmError::InvalidParameter);
        }
        Ok(())
    }
}

// =============================================================================
// FUNÇÕES UTILITÁRIAS
// =============================================================================

/// Verifica se `pages` páginas cabem no espaço de 32 bits
pub fn fits_address_space(pages: usize, page_size: usize) -> bool {
    (pages as u64)
        .checked_mul(page_size as u64)
        .is_some_and(|bytes| bytes <= ADDRESS_SPACE_SIZE)
}

/// Alinha valor para baixo ao múltiplo de align
#[inline(always)]
pub const fn align_down(val: usize, align: usize) -> usize {
    val & !(align - 1)
}
