use crate::mm::config::align_down;
use core::fmt;

use super::Vpn;

/// Endereço virtual (wrapper type-safe)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct VirtAddr(u32);

impl VirtAddr {
    /// Cria novo endereço virtual
    #[inline]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Monta o endereço a partir de (vpn, offset)
    #[inline]
    pub fn from_page(vpn: Vpn, offset: usize, page_size: usize) -> Self {
        Self(vpn * page_size as u32 + offset as u32)
    }

    /// Retorna o valor interno como u32
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Retorna o valor interno como usize
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Número da página virtual que contém este endereço
    #[inline]
    pub fn vpn(self, page_size: usize) -> Vpn {
        self.0 / page_size as u32
    }

    /// Offset dentro da página
    #[inline]
    pub fn page_offset(self, page_size: usize) -> usize {
        self.0 as usize & (page_size - 1)
    }

    /// Início da página que contém este endereço
    #[inline]
    pub fn page_base(self, page_size: usize) -> Self {
        Self(align_down(self.0 as usize, page_size) as u32)
    }

    /// Adiciona offset (None em overflow do espaço de 32 bits)
    #[inline]
    pub fn checked_add(self, offset: usize) -> Option<Self> {
        u32::try_from(offset)
            .ok()
            .and_then(|off| self.0.checked_add(off))
            .map(Self)
    }
}

impl fmt::Debug for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtAddr({:#x})", self.0)
    }
}

impl fmt::LowerHex for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
