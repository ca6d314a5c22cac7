//! Paginação sob demanda: todo processo compartilha o `Pager` global.

use std::sync::Arc;

use crate::arch::{AccessType, Exception};
use crate::mm::addr::{PhysAddr, Pid, VirtAddr};
use crate::mm::error::MmResult;
use crate::mm::fault::FaultResult;
use crate::mm::vmm::Pager;

use super::{AddressLayout, AddressTranslation, Transfer};

pub struct DemandPaging {
    pager: Arc<Pager>,
}

impl DemandPaging {
    pub fn new(pager: Arc<Pager>) -> Self {
        Self { pager }
    }

    pub fn pager(&self) -> &Arc<Pager> {
        &self.pager
    }
}

impl AddressTranslation for DemandPaging {
    fn load(&self, pid: Pid, layout: &AddressLayout) -> MmResult<()> {
        self.pager
            .register_space(pid, layout.num_pages, Some(layout.image.clone()))
    }

    fn translate(&self, pid: Pid, vaddr: VirtAddr, access: AccessType) -> Result<PhysAddr, Exception> {
        self.pager.translate(pid, vaddr, access)
    }

    fn transfer(&self, pid: Pid, vaddr: VirtAddr, data: Transfer<'_>) -> Result<usize, Exception> {
        self.pager.transfer(pid, vaddr, data)
    }

    fn handle_fault(&self, pid: Pid, vaddr: VirtAddr, exception: Exception) -> FaultResult {
        match exception {
            Exception::TlbMiss => FaultResult::from_miss(self.pager.handle_miss(pid, vaddr)),
            other => FaultResult::from_exception(other),
        }
    }

    fn save_context(&self, pid: Pid) {
        self.pager.save_context(pid);
    }

    fn restore_context(&self, pid: Pid) {
        self.pager.restore_context(pid);
    }

    fn teardown(&self, pid: Pid) {
        self.pager.teardown(pid);
    }

    fn page_size(&self) -> usize {
        self.pager.page_size()
    }
}
