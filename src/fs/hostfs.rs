//! HostFile - arquivo no sistema de arquivos do host

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{BackingFile, FsError, FsResult};

pub struct HostFile {
    path: PathBuf,
    file: Option<File>,
}

impl HostFile {
    /// Cria (ou trunca) o arquivo em `path`
    pub fn create(path: impl AsRef<Path>) -> FsResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&mut self) -> FsResult<&mut File> {
        self.file.as_mut().ok_or(FsError::Closed)
    }
}

impl BackingFile for HostFile {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> FsResult<usize> {
        let file = self.file()?;
        file.seek(SeekFrom::Start(offset))?;

        let mut done = 0;
        while done < buf.len() {
            let n = file.read(&mut buf[done..])?;
            if n == 0 {
                break;
            }
            done += n;
        }
        Ok(done)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> FsResult<usize> {
        let file = self.file()?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        Ok(buf.len())
    }

    fn close(&mut self) {
        if let Some(file) = self.file.take() {
            if file.sync_all().is_err() {
                crate::kwarn!("(HOSTFS) Falha no sync ao fechar arquivo");
            }
        }
    }

    fn remove(&mut self) -> FsResult<()> {
        self.close();
        std::fs::remove_file(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_io_and_removal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slots.bin");
        let mut file = HostFile::create(&path).unwrap();

        assert_eq!(file.write_at(8, b"abcd").unwrap(), 4);
        let mut buf = [0xffu8; 16];
        assert_eq!(file.read_at(0, &mut buf).unwrap(), 12);
        assert_eq!(&buf[..8], &[0u8; 8]);
        assert_eq!(&buf[8..12], b"abcd");

        file.remove().unwrap();
        assert!(!path.exists());
        assert_eq!(file.read_at(0, &mut buf), Err(FsError::Closed));
    }

    #[test]
    fn close_flushes_and_blocks_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("closed.bin");
        let mut file = HostFile::create(&path).unwrap();
        file.write_at(0, b"slot").unwrap();

        file.close();
        file.close();
        assert_eq!(std::fs::read(&path).unwrap(), b"slot");

        let mut buf = [0u8; 4];
        assert_eq!(file.read_at(0, &mut buf), Err(FsError::Closed));
        assert_eq!(file.write_at(0, b"x"), Err(FsError::Closed));

        file.remove().unwrap();
        assert!(!path.exists());
    }
}
