// =============================================================================
// FORGE PAGER LOGGING SYSTEM
// =============================================================================
//
// Sistema de logging do pager, no mesmo formato dos logs do kernel.
//
// ARQUITETURA:
// - Usa features do Cargo para filtragem em tempo de compilação
// - Com feature "no_logs", TODOS os macros viram expressões vazias
// - Escreve em stderr (`eprint!`), que faz o papel da serial na máquina
//   simulada e é capturado pelo harness de testes
//
// NÍVEIS DE LOG (do mais crítico ao menos):
// - ERROR: Invariante quebrado, fault impossível de resolver
// - WARN:  Estado inconsistente recuperado (ex: leitura de slot inexistente)
// - INFO:  Boot, shutdown, criação/saída de processos
// - DEBUG: Cada page fault, eviction, swap-in/swap-out
// - TRACE: Cada refill e invalidação de TLB
//
// FEATURES:
// - no_logs:   Remove 100% dos logs
// - log_error: Apenas ERROR, WARN
// - log_info:  ERROR, WARN, INFO (padrão)
// - log_debug: ERROR, WARN, INFO, DEBUG
// - log_trace: Todos os níveis
//
// COMO USAR:
//   kinfo!("(PMM) Inicializando...");             // Apenas string
//   kdebug!("(FAULT) pid/vpn=", pid, vpn);         // String + valores hex
//
// =============================================================================

// =============================================================================
// PREFIXOS COM CORES ANSI
// =============================================================================

pub const P_ERROR: &str = "\x1b[1;31m[ERRO]\x1b[0m ";
pub const P_WARN: &str = "\x1b[1;33m[WARN]\x1b[0m ";
pub const P_INFO: &str = "\x1b[32m[INFO]\x1b[0m ";
pub const P_DEBUG: &str = "\x1b[36m[DEBG]\x1b[0m ";
pub const P_TRACE: &str = "\x1b[35m[TRAC]\x1b[0m ";
pub const P_OK: &str = "\x1b[32m[OK]\x1b[0m ";
pub const P_FAIL: &str = "\x1b[1;31m[FAIL]\x1b[0m ";

// =============================================================================
// EMISSÃO
// =============================================================================

/// Emite uma linha completa: prefixo, mensagem e valores em hexadecimal.
///
/// A linha inteira é montada antes de escrever para que logs de threads
/// diferentes não se intercalem no meio de uma linha.
pub fn emit_line(prefix: &str, msg: &str, vals: &[u64]) {
    let mut line = String::with_capacity(prefix.len() + msg.len() + vals.len() * 8);
    line.push_str(prefix);
    line.push_str(msg);
    for (i, val) in vals.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&format!("{:#x}", val));
    }
    eprintln!("{}", line);
}

/// Emite texto cru, sem prefixo e sem newline.
pub fn emit_str(msg: &str) {
    eprint!("{}", msg);
}

/// Emite um valor em hexadecimal, sem newline.
pub fn emit_hex(val: u64) {
    eprint!("{:#x}", val);
}

/// Emite newline.
pub fn emit_nl() {
    eprintln!();
}

// =============================================================================
// MACROS DE LOG - NÍVEL ERROR
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kerror {
    ($msg:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_ERROR, $msg, &[]);
    }};
    ($msg:expr, $($val:expr),+ $(,)?) => {{
        $crate::core::logging::emit_line(
            $crate::core::logging::P_ERROR,
            $msg,
            &[$($val as u64),+],
        );
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kerror {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL WARN
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kwarn {
    ($msg:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_WARN, $msg, &[]);
    }};
    ($msg:expr, $($val:expr),+ $(,)?) => {{
        $crate::core::logging::emit_line(
            $crate::core::logging::P_WARN,
            $msg,
            &[$($val as u64),+],
        );
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kwarn {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL INFO
// =============================================================================

#[cfg(not(any(feature = "no_logs", feature = "log_error")))]
#[macro_export]
macro_rules! kinfo {
    ($msg:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_INFO, $msg, &[]);
    }};
    ($msg:expr, $($val:expr),+ $(,)?) => {{
        $crate::core::logging::emit_line(
            $crate::core::logging::P_INFO,
            $msg,
            &[$($val as u64),+],
        );
    }};
}

#[cfg(any(feature = "no_logs", feature = "log_error"))]
#[macro_export]
macro_rules! kinfo {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL DEBUG
// =============================================================================

#[cfg(any(feature = "log_debug", feature = "log_trace"))]
#[macro_export]
macro_rules! kdebug {
    ($msg:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_DEBUG, $msg, &[]);
    }};
    ($msg:expr, $($val:expr),+ $(,)?) => {{
        $crate::core::logging::emit_line(
            $crate::core::logging::P_DEBUG,
            $msg,
            &[$($val as u64),+],
        );
    }};
}

#[cfg(not(any(feature = "log_debug", feature = "log_trace")))]
#[macro_export]
macro_rules! kdebug {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL TRACE
// =============================================================================

#[cfg(feature = "log_trace")]
#[macro_export]
macro_rules! ktrace {
    ($msg:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_TRACE, $msg, &[]);
    }};
    ($msg:expr, $($val:expr),+ $(,)?) => {{
        $crate::core::logging::emit_line(
            $crate::core::logging::P_TRACE,
            $msg,
            &[$($val as u64),+],
        );
    }};
}

#[cfg(not(feature = "log_trace"))]
#[macro_export]
macro_rules! ktrace {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS AUXILIARES
// =============================================================================

/// klog! - Log genérico sem prefixo de nível e sem newline.
///
/// # Uso
/// ```ignore
/// klog!("Addr=", addr);
/// knl!();
/// ```
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! klog {
    ($msg:expr) => {{
        $crate::core::logging::emit_str($msg);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_hex($val as u64);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! klog {
    ($($t:tt)*) => {{}};
}

/// knl! - Emite apenas newline.
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! knl {
    () => {{
        $crate::core::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! knl {
    () => {{}};
}

// =============================================================================
// MACROS DE STATUS (OK/FAIL)
// =============================================================================

/// kok! - Log de sucesso (prefixo verde [OK]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kok {
    ($msg:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_OK, $msg, &[]);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kok {
    ($($t:tt)*) => {{}};
}

/// kfail! - Log de falha (prefixo vermelho [FAIL]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kfail {
    ($msg:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_FAIL, $msg, &[]);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kfail {
    ($($t:tt)*) => {{}};
}
