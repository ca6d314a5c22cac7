//! # Synchronization Primitives
//!
//! ```text
//! spin::Mutex  → Lock global do pager, memória física, alocador estático
//! IrqSpinlock  → Read-modify-write do TLB (interrupções desligadas)
//! ```
//!
//! ## Regras
//!
//! - **Ordem de Lock**: lock global do pager primeiro, `IrqSpinlock` do TLB
//!   aninhado dentro dele. Quem segura o TLB nunca pede o lock do pager.

pub mod spinlock;

pub use spinlock::{IrqSpinlock, IrqSpinlockGuard};
