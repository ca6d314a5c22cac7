//! # Page Frame Metadata (PFM)
//!
//! Metadados por página física. Hoje só o reverse map (ppn → dono), que o
//! pager usa para escolher vítimas e verificar posse única.

pub mod rmap;

pub use rmap::ResidentIndex;
