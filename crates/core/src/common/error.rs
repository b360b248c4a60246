//! Simulator error definitions.
//!
//! This module defines the error type shared across the simulator. It covers:
//! 1. **Configuration errors:** Invalid latencies, station counts, or cache geometry.
//! 2. **Program errors:** Unknown mnemonics, bad operands, or unresolved labels.
//! 3. **Memory errors:** Accesses outside the backing store.
//!
//! Structural stalls (full stations, result-bus collisions) are not errors;
//! the engine absorbs them as idle cycles. A drained or deadlocked program
//! is likewise not an error: the caller detects it through a cycle report
//! that made no progress.

use std::fmt;

/// Errors surfaced by engine construction, program assembly, and cycle advance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimError {
    /// Invalid configuration detected at engine or cache construction.
    ///
    /// The associated string names the offending parameter.
    BadConfig(String),

    /// The program text could not be assembled into a valid decoded program.
    ///
    /// The associated string describes the offending line or operand.
    BadProgram(String),

    /// A memory access left the backing store.
    ///
    /// Carries the faulting address and the access size in bytes.
    OutOfBounds { addr: i64, size: usize },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::BadConfig(what) => write!(f, "bad configuration: {}", what),
            SimError::BadProgram(what) => write!(f, "bad program: {}", what),
            SimError::OutOfBounds { addr, size } => {
                write!(f, "memory access out of bounds: {} bytes at address {}", size, addr)
            }
        }
    }
}

impl std::error::Error for SimError {}
