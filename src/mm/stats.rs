//! # Memory Statistics

use core::sync::atomic::{AtomicU64, Ordering};

/// Contadores do pager
#[derive(Debug, Default)]
pub struct PagingStats {
    pub tlb_misses: AtomicU64,
    pub page_faults: AtomicU64,
    pub image_loads: AtomicU64,
    pub swap_ins: AtomicU64,
    pub swap_outs: AtomicU64,
    pub zero_fills: AtomicU64,
    pub evictions: AtomicU64,
    pub context_saves: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PagingSnapshot {
    pub tlb_misses: u64,
    pub page_faults: u64,
    pub image_loads: u64,
    pub swap_ins: u64,
    pub swap_outs: u64,
    pub zero_fills: u64,
    pub evictions: u64,
    pub context_saves: u64,
    pub resident_pages: u64,
    pub free_pages: u64,
}

impl PagingSnapshot {
    pub fn usage_percent(&self) -> u64 {
        let total = self.resident_pages + self.free_pages;
        if total == 0 {
            return 0;
        }
        (self.resident_pages * 100) / total
    }
}

impl PagingStats {
    pub const fn new() -> Self {
        Self {
            tlb_misses: AtomicU64::new(0),
            page_faults: AtomicU64::new(0),
            image_loads: AtomicU64::new(0),
            swap_ins: AtomicU64::new(0),
            swap_outs: AtomicU64::new(0),
            zero_fills: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            context_saves: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, resident_pages: usize, free_pages: usize) -> PagingSnapshot {
        PagingSnapshot {
            tlb_misses: self.tlb_misses.load(Ordering::Relaxed),
            page_faults: self.page_faults.load(Ordering::Relaxed),
            image_loads: self.image_loads.load(Ordering::Relaxed),
            swap_ins: self.swap_ins.load(Ordering::Relaxed),
            swap_outs: self.swap_outs.load(Ordering::Relaxed),
            zero_fills: self.zero_fills.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            context_saves: self.context_saves.load(Ordering::Relaxed),
            resident_pages: resident_pages as u64,
            free_pages: free_pages as u64,
        }
    }
}

/// Imprime o snapshot no formato do log do kernel
pub fn print(snap: &PagingSnapshot) {
    crate::kinfo!("(STATS) tlb_misses=", snap.tlb_misses);
    crate::kinfo!("(STATS) page_faults=", snap.page_faults);
    crate::kinfo!("(STATS) image_loads=", snap.image_loads);
    crate::kinfo!("(STATS) swap_ins/swap_outs=", snap.swap_ins, snap.swap_outs);
    crate::kinfo!("(STATS) zero_fills=", snap.zero_fills);
    crate::kinfo!("(STATS) evictions=", snap.evictions);
    crate::kinfo!("(STATS) context_saves=", snap.context_saves);
    crate::kinfo!("(STATS) resident/free=", snap.resident_pages, snap.free_pages);
    crate::kinfo!("(STATS) uso %=", snap.usage_percent());
}
