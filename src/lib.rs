//! Forge Pager Library.
//!
//! Ponto central de exportação dos módulos do pager.
//! Máquina simulada (CPU com TLB, memória física, swap) e o gerenciador de
//! memória virtual com paginação sob demanda que roda sobre ela.

// --- Módulos de Baixo Nível (Máquina Simulada) ---
pub mod arch; // CPU, TLB, interrupções
pub mod fs; // Backing files do swap (host, memória)

// --- Módulos Centrais ---
pub mod core; // Kernel, processos, imagem, logging
pub mod klib; // Framework de testes
pub mod mm; // Gerenciamento de Memória (PMM, VMM, Swap)
pub mod sync; // Spinlock com interrupções desabilitadas

// Re-exportar o essencial para o binário
pub use crate::core::{Kernel, MemoryImage, Process, ProgramImage};
pub use crate::mm::config::{MmConfig, SwapBacking, TranslationMode};
pub use crate::mm::error::{MmError, MmResult};
