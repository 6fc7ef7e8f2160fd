//! SymSafe core: symptom triage over a curated knowledge base with a
//! constrained text-generation fallback.

pub mod actors;
pub mod config;
pub mod error;
pub mod fs_manager;
pub mod learning;
pub mod recorder;
pub mod triage;

#[cfg(test)]
mod tests;
