//! IrqSpinlock - spinlock que desliga interrupções enquanto está preso

use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::arch::InterruptControl;

/// Spinlock que desabilita interrupções antes de adquirir
///
/// # Quando usar
///
/// - Read-modify-write de estado que o timer simulado também toca (TLB)
///
/// # Quando NÃO usar
///
/// - Seções que fazem I/O (swap): use o lock global do pager
pub struct IrqSpinlock<T> {
    inner: spin::Mutex<T>,
    irq: Arc<dyn InterruptControl>,
}

impl<T> IrqSpinlock<T> {
    /// Cria novo spinlock ligado ao controlador de interrupções
    pub fn new(data: T, irq: Arc<dyn InterruptControl>) -> Self {
        Self {
            inner: spin::Mutex::new(data),
            irq,
        }
    }

    /// Adquire o lock
    pub fn lock(&self) -> IrqSpinlockGuard<'_, T> {
        // Desabilitar interrupções antes de adquirir
        let interrupts_were_enabled = self.irq.disable();
        let guard = self.inner.lock();

        IrqSpinlockGuard {
            guard: ManuallyDrop::new(guard),
            irq: &*self.irq,
            interrupts_were_enabled,
        }
    }

    /// Tenta adquirir sem bloquear
    pub fn try_lock(&self) -> Option<IrqSpinlockGuard<'_, T>> {
        let interrupts_were_enabled = self.irq.disable();

        match self.inner.try_lock() {
            Some(guard) => Some(IrqSpinlockGuard {
                guard: ManuallyDrop::new(guard),
                irq: &*self.irq,
                interrupts_were_enabled,
            }),
            None => {
                // Não conseguiu, restaurar interrupções
                self.irq.restore(interrupts_were_enabled);
                None
            }
        }
    }
}

/// Guard do spinlock - libera ao sair do escopo
pub struct IrqSpinlockGuard<'a, T> {
    guard: ManuallyDrop<spin::MutexGuard<'a, T>>,
    irq: &'a dyn InterruptControl,
    interrupts_were_enabled: bool,
}

impl<T> Deref for IrqSpinlockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for IrqSpinlockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for IrqSpinlockGuard<'_, T> {
    fn drop(&mut self) {
        // Liberar lock
        // SAFETY: o guard não é usado depois daqui
        unsafe { ManuallyDrop::drop(&mut self.guard) };

        // Restaurar interrupções se estavam habilitadas
        self.irq.restore(self.interrupts_were_enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::SimulatedInterrupts;

    #[test]
    fn lock_disables_and_restores_interrupts() {
        let irq = Arc::new(SimulatedInterrupts::new());
        let lock = IrqSpinlock::new(5u32, irq.clone());

        {
            let mut guard = lock.lock();
            *guard += 1;
            assert!(!irq.are_enabled());
        }
        assert!(irq.are_enabled());
        assert_eq!(*lock.lock(), 6);
    }

    #[test]
    fn nested_section_keeps_interrupts_off() {
        let irq = Arc::new(SimulatedInterrupts::new());
        let lock = IrqSpinlock::new((), irq.clone());

        let outer = irq.disable();
        {
            let _guard = lock.lock();
        }
        assert!(!irq.are_enabled());
        irq.restore(outer);
        assert!(irq.are_enabled());
    }

    #[test]
    fn try_lock_fails_while_held() {
        let irq = Arc::new(SimulatedInterrupts::new());
        let lock = IrqSpinlock::new(0u8, irq.clone());

        let guard = lock.lock();
        assert!(lock.try_lock().is_none());
        drop(guard);
        assert!(irq.are_enabled());
        assert!(lock.try_lock().is_some());
    }
}
