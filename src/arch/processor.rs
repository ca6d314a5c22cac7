//! # Processador Simulado
//!
//! Dono do TLB e do controlador de interrupções. O caminho de tradução é o
//! que o "hardware" faria em cada load/store de um processo do usuário:
//! procurar (pid, vpn) no TLB, checar proteção e ligar USED/DIRTY.

use core::sync::atomic::Ordering;
use std::sync::Arc;

use super::cpu::SimulatedInterrupts;
use super::traits::InterruptControl;
use crate::mm::addr::{PhysAddr, Pid, VirtAddr};
use crate::mm::vmm::tlb::Tlb;
use crate::sync::{IrqSpinlock, IrqSpinlockGuard};

/// Tipo de acesso que causou a tradução
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
}

/// Exceções levantadas pelo caminho de tradução
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    /// (pid, vpn) não está no TLB
    TlbMiss,
    /// Escrita em página somente-leitura
    ReadOnly,
    /// Endereço fora do espaço de endereçamento
    AddressError,
}

pub struct Processor {
    interrupts: Arc<SimulatedInterrupts>,
    tlb: IrqSpinlock<Tlb>,
    page_size: usize,
}

impl Processor {
    pub fn new(tlb_size: usize, page_size: usize) -> Self {
        let interrupts = Arc::new(SimulatedInterrupts::new());
        let irq: Arc<dyn InterruptControl> = interrupts.clone();
        Self {
            interrupts,
            tlb: IrqSpinlock::new(Tlb::new(tlb_size), irq),
            page_size,
        }
    }

    /// Trava o TLB com interrupções desligadas
    #[inline]
    pub fn tlb(&self) -> IrqSpinlockGuard<'_, Tlb> {
        self.tlb.lock()
    }

    pub fn tlb_size(&self) -> usize {
        self.tlb.lock().size()
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[inline]
    pub fn interrupts(&self) -> &SimulatedInterrupts {
        &self.interrupts
    }

    /// Traduz `vaddr` para o processo `pid` usando só o TLB.
    ///
    /// Liga USED em todo acerto e DIRTY em escrita. Nunca consulta a tabela
    /// global: um miss vira `Exception::TlbMiss` para o fault handler.
    pub fn translate(
        &self,
        pid: Pid,
        vaddr: VirtAddr,
        access: AccessType,
    ) -> Result<PhysAddr, Exception> {
        let vpn = vaddr.vpn(self.page_size);
        let offset = vaddr.page_offset(self.page_size);

        let mut tlb = self.tlb();
        let entry = match tlb.lookup_mut(pid, vpn) {
            Some(entry) => entry,
            None => {
                tlb.stats.misses.fetch_add(1, Ordering::Relaxed);
                return Err(Exception::TlbMiss);
            }
        };

        if access == AccessType::Write && entry.is_read_only() {
            return Err(Exception::ReadOnly);
        }

        entry.set_used();
        if access == AccessType::Write {
            entry.set_dirty();
        }

        Ok(PhysAddr::from_page(entry.ppn, offset, self.page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::vmm::entry::{EntryFlags, TranslationEntry};

    #[test]
    fn translate_sets_used_and_dirty() {
        let cpu = Processor::new(4, 1024);
        cpu.tlb()
            .write(0, 7, TranslationEntry::new(2, 5, EntryFlags::VALID));

        let paddr = cpu
            .translate(7, VirtAddr::new(2 * 1024 + 10), AccessType::Read)
            .unwrap();
        assert_eq!(paddr.as_u32(), 5 * 1024 + 10);
        let slot = cpu.tlb().read(0).unwrap();
        assert!(slot.entry.is_used());
        assert!(!slot.entry.is_dirty());

        cpu.translate(7, VirtAddr::new(2 * 1024), AccessType::Write)
            .unwrap();
        assert!(cpu.tlb().read(0).unwrap().entry.is_dirty());
        assert!(cpu.interrupts().are_enabled());
    }

    #[test]
    fn translate_misses_on_other_asid_and_rejects_readonly_writes() {
        let cpu = Processor::new(2, 1024);
        cpu.tlb().write(
            0,
            1,
            TranslationEntry::new(0, 0, EntryFlags::VALID | EntryFlags::READ_ONLY),
        );

        assert_eq!(
            cpu.translate(2, VirtAddr::new(0), AccessType::Read),
            Err(Exception::TlbMiss)
        );
        assert_eq!(
            cpu.translate(1, VirtAddr::new(4), AccessType::Write),
            Err(Exception::ReadOnly)
        );
        assert!(!cpu.tlb().read(0).unwrap().entry.is_dirty());
    }
}
