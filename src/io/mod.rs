//! File import and export.

pub mod actual;
pub mod export;
