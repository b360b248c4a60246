//! Architectural register file.
//!
//! This module implements the integer and FP register files. It performs:
//! 1. **Storage:** 32 integer (`R0`-`R31`) and 32 FP (`F0`-`F31`) 64-bit registers.
//! 2. **Invariant enforcement:** Integer register `R0` is hardwired to zero.
//! 3. **Debugging:** Utilities for dumping the complete register state.
//!
//! FP registers hold the raw 64-bit result of the simulator's integer-valued
//! FP arithmetic; no floating-point encoding is modeled.

/// Integer and FP register files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterFile {
    int: [i64; 32],
    fp: [i64; 32],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    /// Creates a register file with all registers zeroed.
    pub fn new() -> Self {
        Self { int: [0; 32], fp: [0; 32] }
    }

    /// Zeroes every register.
    pub fn reset(&mut self) {
        self.int = [0; 32];
        self.fp = [0; 32];
    }

    /// Reads an integer register; `R0` always reads 0.
    pub fn read_int(&self, idx: usize) -> i64 {
        if idx == 0 { 0 } else { self.int[idx] }
    }

    /// Writes an integer register; writes to `R0` are dropped.
    pub fn write_int(&mut self, idx: usize, value: i64) {
        if idx != 0 {
            self.int[idx] = value;
        }
    }

    /// Reads an FP register.
    pub fn read_fp(&self, idx: usize) -> i64 {
        self.fp[idx]
    }

    /// Writes an FP register.
    pub fn write_fp(&mut self, idx: usize, value: i64) {
        self.fp[idx] = value;
    }

    /// Dumps all registers to stdout, two per line.
    pub fn dump(&self) {
        for i in (0..32).step_by(2) {
            println!(
                "R{:<2}={:<20} R{:<2}={:<20}",
                i,
                self.read_int(i),
                i + 1,
                self.read_int(i + 1)
            );
        }
        for i in (0..32).step_by(2) {
            println!(
                "F{:<2}={:<20} F{:<2}={:<20}",
                i,
                self.fp[i],
                i + 1,
                self.fp[i + 1]
            );
        }
    }
}
