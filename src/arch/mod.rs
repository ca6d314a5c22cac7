//! # Máquina Simulada (HAL)
//!
//! O módulo `arch` é a ponte entre o pager e o "hardware" da máquina
//! simulada: controle de interrupções, TLB e tradução de endereços.
//!
//! - `traits`: contrato de controle de interrupções consumido pelo pager.
//! - `cpu`: flag de interrupção da CPU simulada.
//! - `processor`: TLB com tags de ASID e o caminho de tradução.

pub mod cpu;
pub mod processor;
pub mod traits;

pub use cpu::SimulatedInterrupts;
pub use processor::{AccessType, Exception, Processor};
pub use traits::InterruptControl;
