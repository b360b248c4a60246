//! Reservation station slot.
//!
//! One slot holds one in-flight ALU, FP, or branch operation: its opcode,
//! two operand slots (value or pending tag), the auxiliary `A` field
//! (immediate or branch target), a destination, and the execution countdown.

use crate::common::tag::{Dest, Operand, Tag};
use crate::isa::Opcode;

/// A single reservation station.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Station {
    /// Stable identifier, e.g. `A0`, `M1`, `I2`.
    pub id: Tag,
    /// Whether this slot holds an operation.
    pub busy: bool,
    /// The operation, when busy.
    pub op: Option<Opcode>,
    /// First operand (`Vj`/`Qj`).
    pub j: Operand,
    /// Second operand (`Vk`/`Qk`).
    pub k: Operand,
    /// Immediate or absolute branch target.
    pub a: i64,
    /// Destination register claimed at issue.
    pub dest: Dest,
    /// Remaining execution cycles; nonzero while executing.
    pub remaining: u64,
    /// Latency chosen when execution started.
    pub latency: u64,
    /// Program index of the occupying instruction.
    pub instr: Option<usize>,
}

impl Station {
    /// Creates a free station with the given identifier.
    pub fn new(id: Tag) -> Self {
        Self {
            id,
            busy: false,
            op: None,
            j: Operand::default(),
            k: Operand::default(),
            a: 0,
            dest: Dest::None,
            remaining: 0,
            latency: 0,
            instr: None,
        }
    }

    /// Frees the slot; the identifier is retained.
    pub fn clear(&mut self) {
        *self = Station::new(self.id);
    }

    /// True while the countdown is running.
    pub fn is_executing(&self) -> bool {
        self.busy && self.remaining > 0
    }

    /// True when both operands hold values.
    pub fn operands_ready(&self) -> bool {
        self.j.is_ready() && self.k.is_ready()
    }
}
