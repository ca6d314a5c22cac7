//! # Translation Entry
//!
//! Entrada da tabela de tradução: (vpn → ppn) mais os bits de estado que o
//! hardware simulado atualiza (USED em todo acesso, DIRTY em escrita).

use bitflags::bitflags;

use crate::mm::addr::{Ppn, Vpn};

bitflags! {
    /// Flags de uma entrada de tradução
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntryFlags: u8 {
        const VALID = 1 << 0;
        const READ_ONLY = 1 << 1;
        const USED = 1 << 2;
        const DIRTY = 1 << 3;
    }
}

impl EntryFlags {
    /// Bits que o hardware liga e que precisam voltar para a tabela
    pub const HW_BITS: Self = Self::USED.union(Self::DIRTY);
}

/// Entrada de tradução (vpn, ppn, flags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranslationEntry {
    pub vpn: Vpn,
    pub ppn: Ppn,
    pub flags: EntryFlags,
}

impl TranslationEntry {
    /// Entrada vazia (slot de TLB livre)
    pub const INVALID: Self = Self {
        vpn: 0,
        ppn: 0,
        flags: EntryFlags::empty(),
    };

    pub const fn new(vpn: Vpn, ppn: Ppn, flags: EntryFlags) -> Self {
        Self { vpn, ppn, flags }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.flags.contains(EntryFlags::VALID)
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.flags.contains(EntryFlags::READ_ONLY)
    }

    #[inline]
    pub fn is_used(&self) -> bool {
        self.flags.contains(EntryFlags::USED)
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.flags.contains(EntryFlags::DIRTY)
    }

    #[inline]
    pub fn set_used(&mut self) {
        self.flags.insert(EntryFlags::USED);
    }

    #[inline]
    pub fn set_dirty(&mut self) {
        self.flags.insert(EntryFlags::DIRTY);
    }

    #[inline]
    pub fn invalidate(&mut self) {
        self.flags.remove(EntryFlags::VALID);
    }

    /// Bits de hardware (USED/DIRTY) desta entrada
    #[inline]
    pub fn hw_bits(&self) -> EntryFlags {
        self.flags & EntryFlags::HW_BITS
    }
}

impl Default for TranslationEntry {
    fn default() -> Self {
        Self::INVALID
    }
}
