//! Controle de interrupções da CPU simulada.
//!
//! Modela o flag de interrupção (IF) de um processador único. O timer
//! simulado só preempta quando o flag está ligado, por isso qualquer
//! read-modify-write no TLB precisa rodar com interrupções desligadas.
//!
//! Threads do host compartilham a mesma CPU: o flag é derivado da
//! profundidade de seções abertas, não de um bit salvo por quem desligou.

use core::sync::atomic::{AtomicU64, Ordering};

use super::traits::InterruptControl;

pub struct SimulatedInterrupts {
    /// Seções com interrupções desligadas ainda abertas (IF = depth == 0)
    depth: AtomicU64,
    /// Quantas vezes `disable` foi chamado (telemetria)
    disables: AtomicU64,
}

impl SimulatedInterrupts {
    pub const fn new() -> Self {
        Self {
            depth: AtomicU64::new(0),
            disables: AtomicU64::new(0),
        }
    }

    pub fn disable_count(&self) -> u64 {
        self.disables.load(Ordering::Relaxed)
    }
}

impl Default for SimulatedInterrupts {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptControl for SimulatedInterrupts {
    #[inline]
    fn disable(&self) -> bool {
        self.disables.fetch_add(1, Ordering::Relaxed);
        self.depth.fetch_add(1, Ordering::AcqRel) == 0
    }

    #[inline]
    fn restore(&self, was_enabled: bool) {
        let previous = self
            .depth
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |depth| depth.checked_sub(1))
            .unwrap_or(0);
        if was_enabled && previous > 1 {
            crate::ktrace!("(CPU) restore com seções abertas=", previous - 1);
        }
    }

    #[inline]
    fn enable(&self) {
        self.depth.store(0, Ordering::Release);
    }

    #[inline]
    fn are_enabled(&self) -> bool {
        self.depth.load(Ordering::Acquire) == 0
    }
}
