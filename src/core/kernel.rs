//! Kernel da máquina simulada.
//!
//! `Kernel::boot` constrói os serviços compartilhados (processador,
//! memória física e o backend de tradução) e os distribui como `Arc`.
//! Não há estado global estático: dois kernels convivem no mesmo processo
//! do host (os testes fazem isso).

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::arch::Processor;
use crate::core::image::ProgramImage;
use crate::core::process::Process;
use crate::mm::addr::Pid;
use crate::mm::aspace::{AddressTranslation, DemandPaging, StaticMapping};
use crate::mm::config::{MmConfig, TranslationMode};
use crate::mm::error::MmResult;
use crate::mm::pmm::{FrameAllocator, PhysicalMemory};
use crate::mm::stats::PagingSnapshot;
use crate::mm::vmm::Pager;

/// Backend de tradução escolhido no boot
pub enum Backend {
    Static(Arc<spin::Mutex<FrameAllocator>>),
    Paged(Arc<Pager>),
}

pub struct Kernel {
    config: MmConfig,
    processor: Arc<Processor>,
    memory: Arc<PhysicalMemory>,
    backend: Backend,
    next_pid: AtomicU32,
}

impl Kernel {
    /// Inicializa a máquina e o subsistema de memória
    pub fn boot(config: MmConfig) -> MmResult<Self> {
        crate::kinfo!("(BOOT) Inicializando máquina simulada...");
        config.validate()?;

        let processor = Arc::new(Processor::new(config.tlb_size, config.page_size));
        let memory = Arc::new(PhysicalMemory::new(config.num_phys_pages, config.page_size));

        let backend = match config.mode {
            TranslationMode::Static => {
                crate::kinfo!("(BOOT) Modo: mapeamento estático");
                Backend::Static(Arc::new(spin::Mutex::new(FrameAllocator::new(
                    config.num_phys_pages,
                ))))
            }
            TranslationMode::DemandPaged => {
                crate::kinfo!("(BOOT) Modo: paginação sob demanda");
                Backend::Paged(Arc::new(Pager::new(
                    &config,
                    processor.clone(),
                    memory.clone(),
                )?))
            }
        };

        crate::kok!("(BOOT) Memória pronta");
        Ok(Self {
            config,
            processor,
            memory,
            backend,
            next_pid: AtomicU32::new(1),
        })
    }

    pub fn config(&self) -> &MmConfig {
        &self.config
    }

    pub fn processor(&self) -> &Arc<Processor> {
        &self.processor
    }

    pub fn memory(&self) -> &Arc<PhysicalMemory> {
        &self.memory
    }

    /// Pager global (só no modo sob demanda)
    pub fn pager(&self) -> Option<&Arc<Pager>> {
        match &self.backend {
            Backend::Paged(pager) => Some(pager),
            Backend::Static(_) => None,
        }
    }

    /// Páginas físicas livres
    pub fn free_pages(&self) -> usize {
        match &self.backend {
            Backend::Paged(pager) => pager.free_pages(),
            Backend::Static(frames) => frames.lock().free_count(),
        }
    }

    pub fn stats(&self) -> Option<PagingSnapshot> {
        self.pager().map(|pager| pager.stats())
    }

    fn allocate_pid(&self) -> Pid {
        self.next_pid.fetch_add(1, Ordering::Relaxed)
    }

    fn new_aspace(&self) -> Box<dyn AddressTranslation> {
        match &self.backend {
            Backend::Paged(pager) => Box::new(DemandPaging::new(pager.clone())),
            Backend::Static(frames) => {
                Box::new(StaticMapping::new(frames.clone(), self.memory.clone()))
            }
        }
    }

    /// Cria um processo a partir de `image`
    pub fn spawn(
        &self,
        name: &str,
        image: Arc<dyn ProgramImage>,
        args: &[&str],
    ) -> MmResult<Process> {
        let pid = self.allocate_pid();
        crate::kdebug!("(PROC) spawn pid=", pid);
        Process::load(
            pid,
            name,
            image,
            args,
            self.new_aspace(),
            self.config.stack_pages,
        )
    }

    /// Troca de contexto: `from` sai da CPU, `to` entra
    pub fn context_switch(&self, from: Option<&mut Process>, to: &mut Process) {
        if let Some(from) = from {
            from.switch_out();
        }
        to.switch_in();
    }

    /// Desliga a máquina: fecha e remove o swap
    pub fn shutdown(self) {
        if let Some(pager) = self.pager() {
            pager.close();
        }
        crate::kinfo!("(BOOT) Shutdown completo");
    }
}
