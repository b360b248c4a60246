//! Cycle-accurate Tomasulo dynamic-scheduling simulator.
//!
//! This crate implements the core of a Tomasulo-machine simulator over a
//! MIPS-like instruction subset with the following pieces:
//! 1. **Engine:** The per-cycle state machine — issue, execute, single-bus
//!    write-back, in-order store commit, and reverse stepping over a
//!    snapshot history.
//! 2. **Stations:** Heterogeneous reservation stations, load/store buffers,
//!    the register files, and the register status (renaming) table.
//! 3. **Memory:** A byte-addressable backing store behind a set-associative,
//!    write-through, metadata-only data cache.
//! 4. **ISA:** Decoded instructions, programs, and a two-pass assembler for
//!    the textual form.
//! 5. **Support:** Configuration (JSON-friendly, validated at construction),
//!    error types, and run statistics.

/// Shared types: errors, producer tags, operand slots.
pub mod common;
/// Simulator configuration (defaults, structures, validation).
pub mod config;
/// The pipeline engine and its building blocks.
pub mod engine;
/// Instruction set definitions and the assembler.
pub mod isa;
/// Memory hierarchy: backing store and data cache.
pub mod mem;
/// Run statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `SimConfig::default()` or deserialize from JSON.
pub use crate::config::SimConfig;
/// Crate-wide error type.
pub use crate::common::error::SimError;
/// The pipeline engine and its per-cycle report.
pub use crate::engine::{CycleReport, Engine};
/// Decoded program types.
pub use crate::isa::{Instruction, Opcode, Program};
