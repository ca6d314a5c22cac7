//! Virtual Memory Manager (VMM)
//!
//! Tabela de tradução global, TLB simulado e o pager que os compõe.

pub mod entry;
pub mod pager;
pub mod table;
pub mod tlb;

pub use entry::{EntryFlags, TranslationEntry};
pub use pager::{Pager, PagerState};
pub use table::PageTable;
pub use tlb::{Tlb, TlbSlot, TlbStats};
