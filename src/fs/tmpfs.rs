//! MemFile - arquivo em memória RAM

use super::{BackingFile, FsError, FsResult};

#[derive(Default)]
pub struct MemFile {
    data: Vec<u8>,
    closed: bool,
}

impl MemFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl BackingFile for MemFile {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> FsResult<usize> {
        if self.closed {
            return Err(FsError::Closed);
        }
        let start = (offset as usize).min(self.data.len());
        let len = buf.len().min(self.data.len() - start);
        buf[..len].copy_from_slice(&self.data[start..start + len]);
        Ok(len)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> FsResult<usize> {
        if self.closed {
            return Err(FsError::Closed);
        }
        let start = offset as usize;
        let end = start + buf.len();
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(buf);
        Ok(buf.len())
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn remove(&mut self) -> FsResult<()> {
        self.closed = true;
        self.data = Vec::new();
        Ok(())
    }
}
