//! Snaplog Engine - Orchestration layer
//!
//! Provides the command that loads duplicated snapshots through the store
//! layer and sequences them with the core.

pub mod commands;
