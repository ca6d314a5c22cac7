//! # Page Reclaim Subsystem
//!
//! Substituição aleatória uniforme: quando o alocador esgota, uma página
//! residente qualquer (de qualquer processo) é sorteada e evictada.

pub mod evict;
