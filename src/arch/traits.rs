//! Interface Abstrata de CPU (HAL).
//!
//! Define as operações de controle de interrupção que o pager consome da
//! camada de threads. A máquina simulada implementa em `cpu.rs`.

pub trait InterruptControl: Send + Sync {
    /// Desabilita interrupções e retorna o estado anterior.
    fn disable(&self) -> bool;

    /// Restaura o estado salvo por `disable`.
    fn restore(&self, was_enabled: bool);

    /// Habilita interrupções incondicionalmente.
    fn enable(&self);

    /// Verifica se as interrupções estão habilitadas.
    fn are_enabled(&self) -> bool;
}
