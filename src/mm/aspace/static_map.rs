//! Mapeamento estático: cada página do processo recebe uma página física
//! no load. Sem TLB, sem swap; tradução direta pela tabela do processo.

use std::sync::Arc;

use crate::arch::{AccessType, Exception};
use crate::mm::addr::{PhysAddr, Pid, Ppn, VirtAddr, Vpn};
use crate::mm::error::{MmError, MmResult};
use crate::mm::fault::FaultResult;
use crate::mm::pmm::{FrameAllocator, PhysicalMemory};
use crate::mm::vmm::{EntryFlags, TranslationEntry};

use super::{AddressLayout, AddressTranslation, Transfer};

pub struct StaticMapping {
    frames: Arc<spin::Mutex<FrameAllocator>>,
    memory: Arc<PhysicalMemory>,
    table: spin::Mutex<Vec<TranslationEntry>>,
}

impl StaticMapping {
    pub fn new(frames: Arc<spin::Mutex<FrameAllocator>>, memory: Arc<PhysicalMemory>) -> Self {
        Self {
            frames,
            memory,
            table: spin::Mutex::new(Vec::new()),
        }
    }

    /// Entrada de `vpn`
    pub fn entry(&self, vpn: Vpn) -> Option<TranslationEntry> {
        self.table.lock().get(vpn as usize).copied()
    }

    fn release_all(&self, ppns: impl Iterator<Item = Ppn>) {
        let mut frames = self.frames.lock();
        for ppn in ppns {
            if frames.release(ppn).is_err() {
                crate::kerror!("(STATIC) ppn inconsistente=", ppn);
            }
        }
    }

    fn fill_pages(&self, entries: &mut [TranslationEntry], layout: &AddressLayout) -> MmResult<()> {
        let mut page = vec![0u8; self.memory.page_size()];
        for entry in entries.iter_mut() {
            if layout.image.locate(entry.vpn).is_some() {
                if layout.image.load(entry.vpn, &mut page)? {
                    entry.flags |= EntryFlags::READ_ONLY;
                }
                self.memory.write_page(entry.ppn, &page)?;
            } else {
                self.memory.zero_page(entry.ppn)?;
            }
        }
        Ok(())
    }
}

impl AddressTranslation for StaticMapping {
    fn load(&self, pid: Pid, layout: &AddressLayout) -> MmResult<()> {
        let mut entries = Vec::with_capacity(layout.num_pages);
        {
            let mut frames = self.frames.lock();
            if frames.free_count() < layout.num_pages {
                crate::kerror!("(STATIC) Memória insuficiente pid/páginas=", pid, layout.num_pages);
                return Err(MmError::OutOfMemory);
            }
            for vpn in 0..layout.num_pages as Vpn {
                let ppn = frames.acquire().ok_or(MmError::OutOfMemory)?;
                entries.push(TranslationEntry::new(vpn, ppn, EntryFlags::VALID));
            }
        }

        if let Err(err) = self.fill_pages(&mut entries, layout) {
            self.release_all(entries.iter().map(|entry| entry.ppn));
            return Err(err);
        }

        *self.table.lock() = entries;
        crate::kdebug!("(STATIC) carregado pid/páginas=", pid, layout.num_pages);
        Ok(())
    }

    fn translate(&self, _pid: Pid, vaddr: VirtAddr, access: AccessType) -> Result<PhysAddr, Exception> {
        let page_size = self.memory.page_size();
        let mut table = self.table.lock();
        let entry = table
            .get_mut(vaddr.vpn(page_size) as usize)
            .filter(|entry| entry.is_valid())
            .ok_or(Exception::AddressError)?;

        if access == AccessType::Write && entry.is_read_only() {
            return Err(Exception::ReadOnly);
        }
        entry.set_used();
        if access == AccessType::Write {
            entry.set_dirty();
        }
        Ok(PhysAddr::from_page(entry.ppn, vaddr.page_offset(page_size), page_size))
    }

    fn transfer(&self, pid: Pid, vaddr: VirtAddr, data: Transfer<'_>) -> Result<usize, Exception> {
        let paddr = self.translate(pid, vaddr, data.access())?;
        Ok(data.copy(&self.memory, paddr))
    }

    fn handle_fault(&self, pid: Pid, vaddr: VirtAddr, exception: Exception) -> FaultResult {
        if exception == Exception::TlbMiss {
            crate::kerror!("(STATIC) miss de TLB sem TLB pid/vaddr=", pid, vaddr.as_u32());
        }
        FaultResult::from_exception(exception)
    }

    fn save_context(&self, _pid: Pid) {}

    fn restore_context(&self, _pid: Pid) {}

    fn teardown(&self, _pid: Pid) {
        let entries = core::mem::take(&mut *self.table.lock());
        self.release_all(entries.into_iter().map(|entry| entry.ppn));
    }

    fn page_size(&self) -> usize {
        self.memory.page_size()
    }
}
