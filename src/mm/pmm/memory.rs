//! Memória física da máquina simulada: `num_pages · page_size` bytes.

use crate::mm::addr::{PhysAddr, Ppn};
use crate::mm::error::{MmError, MmResult};

pub struct PhysicalMemory {
    page_size: usize,
    num_pages: usize,
    data: spin::Mutex<Vec<u8>>,
}

impl PhysicalMemory {
    pub fn new(num_pages: usize, page_size: usize) -> Self {
        Self {
            page_size,
            num_pages,
            data: spin::Mutex::new(vec![0u8; num_pages * page_size]),
        }
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[inline]
    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    fn page_range(&self, ppn: Ppn) -> MmResult<core::ops::Range<usize>> {
        if ppn as usize >= self.num_pages {
            return Err(MmError::OutOfBounds);
        }
        let start = ppn as usize * self.page_size;
        Ok(start..start + self.page_size)
    }

    /// Copia a página `ppn` para `buf` (que precisa ter `page_size` bytes)
    pub fn read_page(&self, ppn: Ppn, buf: &mut [u8]) -> MmResult<()> {
        if buf.len() != self.page_size {
            return Err(MmError::InvalidParameter);
        }
        let range = self.page_range(ppn)?;
        buf.copy_from_slice(&self.data.lock()[range]);
        Ok(())
    }

    /// Sobrescreve a página `ppn` com `buf`
    pub fn write_page(&self, ppn: Ppn, buf: &[u8]) -> MmResult<()> {
        if buf.len() != self.page_size {
            return Err(MmError::InvalidParameter);
        }
        let range = self.page_range(ppn)?;
        self.data.lock()[range].copy_from_slice(buf);
        Ok(())
    }

    pub fn zero_page(&self, ppn: Ppn) -> MmResult<()> {
        let range = self.page_range(ppn)?;
        self.data.lock()[range].fill(0);
        Ok(())
    }

    /// Lê bytes a partir de `paddr` (sem cruzar o fim da memória)
    pub fn read(&self, paddr: PhysAddr, buf: &mut [u8]) -> usize {
        let data = self.data.lock();
        let start = paddr.as_usize().min(data.len());
        let len = buf.len().min(data.len() - start);
        buf[..len].copy_from_slice(&data[start..start + len]);
        len
    }

    /// Escreve bytes a partir de `paddr` (sem cruzar o fim da memória)
    pub fn write(&self, paddr: PhysAddr, buf: &[u8]) -> usize {
        let mut data = self.data.lock();
        let start = paddr.as_usize().min(data.len());
        let len = buf.len().min(data.len() - start);
        data[start..start + len].copy_from_slice(&buf[..len]);
        len
    }
}
