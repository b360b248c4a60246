//! Per-instruction cycle stamps.
//!
//! Each instruction records the cycle it issued, first and last counted an
//! execution cycle, and won the result bus (or, for stores, committed).
//! Stamps are part of every snapshot, so reverse stepping restores them.
//! When a loop re-issues an instruction, the stamps reset and track the
//! newest dynamic instance.

/// Cycle stamps of one instruction; `None` until the event happens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InstrTiming {
    /// Cycle the instruction was placed in a station or buffer.
    pub issue: Option<u64>,
    /// First cycle counted toward execution.
    pub exec_start: Option<u64>,
    /// Cycle the countdown reached zero.
    pub exec_end: Option<u64>,
    /// Cycle the result was written back (stores: committed to memory).
    pub write_back: Option<u64>,
}

impl InstrTiming {
    /// Clears all four stamps, for a fresh dynamic instance.
    pub fn reset(&mut self) {
        *self = InstrTiming::default();
    }
}
