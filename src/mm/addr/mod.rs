//! # Addr - Wrappers Type-Safe para Endereços
//!
//! Tipos distintos para PhysAddr e VirtAddr evitando confusão, mais os
//! números de página usados como chave em todo o pager.
//!
//! Endereços da máquina simulada têm 32 bits. O tamanho de página é definido
//! no boot (`MmConfig::page_size`), por isso a decomposição recebe o
//! tamanho explicitamente.

mod phys;
mod virt;

pub use phys::PhysAddr;
pub use virt::VirtAddr;

/// Identificador de processo
pub type Pid = u32;

/// Número de página virtual
pub type Vpn = u32;

/// Número de página física
pub type Ppn = u32;

/// Chave da tabela de tradução global: (pid, vpn)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageKey {
    pub pid: Pid,
    pub vpn: Vpn,
}

impl PageKey {
    #[inline]
    pub const fn new(pid: Pid, vpn: Vpn) -> Self {
        Self { pid, vpn }
    }
}
