//! Core Module
//!
//! Ciclo de vida do kernel simulado: boot, processos, imagens de programa
//! e logging.

pub mod image;
pub mod kernel;
pub mod logging;
pub mod process;

pub use image::{ImagePages, MemoryImage, ProgramImage, Section};
pub use kernel::Kernel;
pub use process::{Process, ProcessState};
