//! # Arquivos de Backing
//!
//! Contrato mínimo de arquivo que o swapper consome: I/O posicional,
//! fechamento e remoção.
//!
//! - `hostfs`: arquivo no sistema de arquivos do host (`std::fs`).
//! - `tmpfs`: arquivo em memória, para testes e demonstrações.

pub mod hostfs;
pub mod tmpfs;

pub use hostfs::HostFile;
pub use tmpfs::MemFile;

/// Erros de I/O de arquivo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    NotFound,
    PermissionDenied,
    IoError,
    /// Arquivo já fechado
    Closed,
}

impl From<std::io::Error> for FsError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::IoError,
        }
    }
}

pub type FsResult<T> = Result<T, FsError>;

/// Arquivo com I/O posicional
pub trait BackingFile: Send {
    /// Lê até `buf.len()` bytes a partir de `offset`. Retorna bytes lidos
    /// (menos que pedido no fim do arquivo).
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> FsResult<usize>;

    /// Escreve `buf` inteiro a partir de `offset`, crescendo o arquivo.
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> FsResult<usize>;

    /// Fecha o arquivo. Operações seguintes falham com `Closed`.
    fn close(&mut self);

    /// Remove o arquivo do armazenamento.
    fn remove(&mut self) -> FsResult<()>;
}
