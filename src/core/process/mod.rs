//! Gerenciamento de Processos
//!
//! Um processo do usuário: espaço de endereçamento (estratégia de
//! tradução), layout carregado da imagem e a cópia entre memória do
//! kernel e memória virtual do processo.
//!
//! Layout do espaço de endereçamento:
//!
//! ```text
//! vpn 0 ─┬─ seções da imagem (contíguas)
//!        ├─ pilha (stack_pages)          ◀── SP inicial no topo
//!        └─ página de argumentos (argv)
//! ```

use std::sync::Arc;

use crate::arch::{AccessType, Exception};
use crate::core::image::{ImagePages, ProgramImage};
use crate::mm::addr::{PhysAddr, Pid, VirtAddr};
use crate::mm::aspace::{AddressLayout, AddressTranslation, Transfer};
use crate::mm::config::{fits_address_space, ARGV_POINTER_SIZE};
use crate::mm::error::{MmError, MmResult};
use crate::mm::fault::FaultResult;

/// Tentativas de translate → fault → retranslate por página
pub const MAX_FAULT_RETRIES: usize = 32;

/// Estado do processo
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProcessState {
    Ready,
    Running,
    Terminated,
}

pub struct Process {
    pid: Pid,
    name: String,
    state: ProcessState,
    aspace: Box<dyn AddressTranslation>,
    page_size: usize,
    num_pages: usize,
    initial_sp: VirtAddr,
    entry_point: VirtAddr,
    argc: usize,
    argv: VirtAddr,
    exit_status: Option<i32>,
}

impl Process {
    /// Carrega `image` num espaço novo e escreve `args` na última página.
    ///
    /// Falha com `InvalidImage` para executável fragmentado ou argumentos
    /// que não cabem numa página.
    pub fn load(
        pid: Pid,
        name: &str,
        image: Arc<dyn ProgramImage>,
        args: &[&str],
        aspace: Box<dyn AddressTranslation>,
        stack_pages: usize,
    ) -> MmResult<Self> {
        let page_size = aspace.page_size();
        let pages = ImagePages::new(image)?;

        let args_size: usize = args
            .iter()
            .map(|arg| ARGV_POINTER_SIZE + arg.len() + 1)
            .sum();
        if args_size > page_size {
            crate::kerror!("(LOADER) Argumentos maiores que uma página bytes=", args_size);
            return Err(MmError::InvalidImage);
        }

        let Some(num_pages) = pages
            .num_pages()
            .checked_add(stack_pages)
            .and_then(|top| top.checked_add(1))
            .filter(|&n| fits_address_space(n, page_size))
        else {
            crate::kerror!("(LOADER) Espaço de endereçamento maior que 32 bits pilha=", stack_pages);
            return Err(MmError::InvalidImage);
        };
        let stack_top = num_pages - 1;
        let initial_sp = VirtAddr::new(
            u32::try_from(stack_top * page_size).map_err(|_| MmError::InvalidImage)?,
        );
        let entry_point = pages.entry_point();

        aspace.load(
            pid,
            &AddressLayout {
                num_pages,
                image: Arc::new(pages),
            },
        )?;

        let mut process = Self {
            pid,
            name: name.to_string(),
            state: ProcessState::Ready,
            aspace,
            page_size,
            num_pages,
            initial_sp,
            entry_point,
            argc: args.len(),
            argv: initial_sp,
            exit_status: None,
        };

        if let Err(err) = process.write_args(args) {
            process.exit(-1);
            return Err(err);
        }

        crate::kinfo!("(PROC) Carregado pid/páginas=", pid, num_pages);
        Ok(process)
    }

    /// Tabela de ponteiros (u32 LE) seguida das strings terminadas em NUL
    fn write_args(&mut self, args: &[&str]) -> MmResult<()> {
        let mut pointer = self.argv.as_u32();
        let mut string = pointer + (args.len() * ARGV_POINTER_SIZE) as u32;

        for arg in args {
            self.write_exact(VirtAddr::new(pointer), &string.to_le_bytes())?;
            self.write_exact(VirtAddr::new(string), arg.as_bytes())?;
            self.write_exact(VirtAddr::new(string + arg.len() as u32), &[0])?;
            pointer += ARGV_POINTER_SIZE as u32;
            string += arg.len() as u32 + 1;
        }
        Ok(())
    }

    fn write_exact(&mut self, vaddr: VirtAddr, data: &[u8]) -> MmResult<()> {
        match self.write_inner(vaddr, data) {
            (n, _) if n == data.len() => Ok(()),
            (_, Some(fault)) => Err(fault.as_error().unwrap_or(MmError::InvalidAddress)),
            (_, None) => Err(MmError::InvalidAddress),
        }
    }

    // =========================================================================
    // ACESSORES
    // =========================================================================

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    pub fn initial_sp(&self) -> VirtAddr {
        self.initial_sp
    }

    pub fn entry_point(&self) -> VirtAddr {
        self.entry_point
    }

    pub fn argc(&self) -> usize {
        self.argc
    }

    pub fn argv(&self) -> VirtAddr {
        self.argv
    }

    pub fn exit_status(&self) -> Option<i32> {
        self.exit_status
    }

    pub fn aspace(&self) -> &dyn AddressTranslation {
        self.aspace.as_ref()
    }

    // =========================================================================
    // TRADUÇÃO E EXCEÇÕES
    // =========================================================================

    fn in_bounds(&self, vaddr: VirtAddr) -> bool {
        (vaddr.vpn(self.page_size) as usize) < self.num_pages
    }

    /// Tradução de um acesso da CPU
    pub fn translate(&self, vaddr: VirtAddr, access: AccessType) -> Result<PhysAddr, Exception> {
        if self.state == ProcessState::Terminated || !self.in_bounds(vaddr) {
            return Err(Exception::AddressError);
        }
        self.aspace.translate(self.pid, vaddr, access)
    }

    /// Exceção levantada pela CPU. Qualquer coisa além de um miss resolvido
    /// termina o processo.
    pub fn handle_exception(&mut self, exception: Exception, vaddr: VirtAddr) -> FaultResult {
        let result = if self.in_bounds(vaddr) {
            self.aspace.handle_fault(self.pid, vaddr, exception)
        } else {
            FaultResult::InvalidAddress
        };

        if result != FaultResult::Success {
            crate::kwarn!("(PROC) Exceção não tratada pid/vaddr=", self.pid, vaddr.as_u32());
            self.exit(-1);
        }
        result
    }

    /// Executa `op` na página de `vaddr`, tratando faults até
    /// `MAX_FAULT_RETRIES` vezes
    fn with_page(
        &self,
        vaddr: VirtAddr,
        mut op: impl FnMut(&dyn AddressTranslation) -> Result<usize, Exception>,
    ) -> Result<usize, FaultResult> {
        for _ in 0..MAX_FAULT_RETRIES {
            match op(self.aspace.as_ref()) {
                Ok(n) => return Ok(n),
                Err(exception) => match self.aspace.handle_fault(self.pid, vaddr, exception) {
                    FaultResult::Success => continue,
                    other => return Err(other),
                },
            }
        }
        crate::kerror!("(PROC) Faults demais na mesma página pid/vaddr=", self.pid, vaddr.as_u32());
        Err(FaultResult::FatalError)
    }

    /// Próximo pedaço de [vaddr + done, vaddr + len) dentro de uma página
    fn next_chunk(&self, vaddr: VirtAddr, done: usize, len: usize) -> Option<(VirtAddr, usize)> {
        let addr = vaddr.checked_add(done)?;
        if !self.in_bounds(addr) {
            return None;
        }
        let chunk = (self.page_size - addr.page_offset(self.page_size)).min(len - done);
        Some((addr, chunk))
    }

    fn read_inner(&self, vaddr: VirtAddr, buf: &mut [u8]) -> (usize, Option<FaultResult>) {
        if self.state == ProcessState::Terminated {
            return (0, Some(FaultResult::InvalidAddress));
        }
        let len = buf.len();
        let mut done = 0;
        while done < len {
            let Some((addr, chunk)) = self.next_chunk(vaddr, done, len) else {
                return (done, Some(FaultResult::InvalidAddress));
            };
            let slice = &mut buf[done..done + chunk];
            let result = self.with_page(addr, |aspace| {
                aspace.transfer(self.pid, addr, Transfer::Read(&mut slice[..]))
            });
            match result {
                Ok(n) if n == chunk => done += n,
                Ok(n) => return (done + n, None),
                Err(fault) => return (done, Some(fault)),
            }
        }
        (done, None)
    }

    fn write_inner(&self, vaddr: VirtAddr, data: &[u8]) -> (usize, Option<FaultResult>) {
        if self.state == ProcessState::Terminated {
            return (0, Some(FaultResult::InvalidAddress));
        }
        let len = data.len();
        let mut done = 0;
        while done < len {
            let Some((addr, chunk)) = self.next_chunk(vaddr, done, len) else {
                return (done, Some(FaultResult::InvalidAddress));
            };
            let slice = &data[done..done + chunk];
            let result = self.with_page(addr, |aspace| {
                aspace.transfer(self.pid, addr, Transfer::Write(slice))
            });
            match result {
                Ok(n) if n == chunk => done += n,
                Ok(n) => return (done + n, None),
                Err(fault) => return (done, Some(fault)),
            }
        }
        (done, None)
    }

    // =========================================================================
    // CÓPIA ENTRE KERNEL E PROCESSO
    // =========================================================================

    /// Copia da memória virtual do processo para `buf`.
    ///
    /// Devolve bytes copiados; erro no meio para a cópia sem matar o
    /// processo.
    pub fn read_virtual_memory(&self, vaddr: VirtAddr, buf: &mut [u8]) -> usize {
        let (n, fault) = self.read_inner(vaddr, buf);
        if fault.is_some() {
            crate::kdebug!("(PROC) leitura interrompida pid/bytes=", self.pid, n);
        }
        n
    }

    /// Copia `data` para a memória virtual do processo. Escrita em página
    /// somente-leitura para a cópia.
    pub fn write_virtual_memory(&self, vaddr: VirtAddr, data: &[u8]) -> usize {
        let (n, fault) = self.write_inner(vaddr, data);
        if fault.is_some() {
            crate::kdebug!("(PROC) escrita interrompida pid/bytes=", self.pid, n);
        }
        n
    }

    /// Lê uma string terminada em NUL de até `max_len` bytes (sem o NUL)
    pub fn read_virtual_string(&self, vaddr: VirtAddr, max_len: usize) -> Option<String> {
        let mut buf = vec![0u8; max_len + 1];
        let n = self.read_virtual_memory(vaddr, &mut buf);
        let end = buf[..n].iter().position(|&b| b == 0)?;
        Some(String::from_utf8_lossy(&buf[..end]).into_owned())
    }

    // =========================================================================
    // CICLO DE VIDA
    // =========================================================================

    /// Sai da CPU
    pub fn switch_out(&mut self) {
        if self.state == ProcessState::Terminated {
            return;
        }
        self.aspace.save_context(self.pid);
        self.state = ProcessState::Ready;
    }

    /// Entra na CPU
    pub fn switch_in(&mut self) {
        if self.state == ProcessState::Terminated {
            return;
        }
        self.aspace.restore_context(self.pid);
        self.state = ProcessState::Running;
    }

    /// Termina o processo e devolve toda a memória. Idempotente.
    pub fn exit(&mut self, status: i32) {
        if self.state == ProcessState::Terminated {
            return;
        }
        self.aspace.teardown(self.pid);
        self.state = ProcessState::Terminated;
        self.exit_status = Some(status);
        crate::kinfo!("(PROC) Terminado pid=", self.pid);
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        self.exit(0);
    }
}
