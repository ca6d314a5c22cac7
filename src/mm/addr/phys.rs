use core::fmt;

use super::Ppn;

/// Endereço físico (wrapper type-safe)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysAddr(u32);

impl PhysAddr {
    /// Cria novo endereço físico
    #[inline]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Monta o endereço a partir de (ppn, offset)
    #[inline]
    pub fn from_page(ppn: Ppn, offset: usize, page_size: usize) -> Self {
        Self(ppn * page_size as u32 + offset as u32)
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

    /// Número da página física
    #[inline]
    pub fn ppn(self, page_size: usize) -> Ppn {
        self.0 / page_size as u32
    }
}

impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysAddr({:#x})", self.0)
    }
}

impl fmt::LowerHex for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
