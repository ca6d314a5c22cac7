//! # Memory Management Subsystem (MM)
//!
//! Gerenciador de memória virtual com paginação sob demanda da máquina
//! simulada: vários processos do usuário compartilham uma memória física
//! menor que a soma dos seus espaços de endereçamento.
//!
//! ## 🏗️ Arquitetura dos Módulos
//!
//! | Módulo | Responsabilidade |
//! |--------|------------------|
//! | `vmm`  | Tabela de tradução global (pid, vpn) → entrada, TLB, `Pager`. |
//! | `pmm`  | Lista livre de páginas físicas e os bytes da memória. |
//! | `pfm`  | Reverse map ppn → dono, com lista densa para sorteio O(1). |
//! | `swap` | Arquivo de slots do tamanho de uma página. |
//! | `fault`| Miss de TLB, page fault, refill. |
//! | `reclaim` | Eviction aleatória uniforme. |
//! | `aspace` | Estratégias de tradução (`StaticMapping`, `DemandPaging`) e troca de contexto. |
//!
//! ```text
//! Process ──▶ AddressTranslation ──▶ Pager ──┬─▶ PageTable + ResidentIndex
//!                                            ├─▶ FrameAllocator
//!                                            ├─▶ Swapper ──▶ BackingFile
//!                                            └─▶ Processor (TLB)
//! ```
//!
//! ## Locking
//!
//! Lock global do pager primeiro; a seção do TLB (interrupções desligadas)
//! aninha dentro dele e nunca pede o lock global.

pub mod addr;
pub mod aspace;
pub mod config;
pub mod error;
pub mod fault;
pub mod pfm;
pub mod pmm;
pub mod reclaim;
pub mod stats;
pub mod swap;
pub mod test;
pub mod vmm;

pub use addr::{PageKey, PhysAddr, Pid, Ppn, VirtAddr, Vpn};
pub use aspace::{AddressLayout, AddressTranslation, DemandPaging, StaticMapping, Transfer};
pub use config::{MmConfig, SwapBacking, TranslationMode};
pub use error::{MmError, MmResult};
pub use fault::FaultResult;
pub use pmm::{FrameAllocator, PhysicalMemory};
pub use stats::PagingSnapshot;
pub use swap::{SwapSlot, Swapper};
pub use vmm::{EntryFlags, Pager, TranslationEntry};
