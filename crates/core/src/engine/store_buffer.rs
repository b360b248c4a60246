//! Store buffer slot.
//!
//! A store needs both an effective address and the value to write before it
//! may execute; each arrives independently over the result bus, so the slot
//! carries two pending-capable operands. Once its countdown completes, the
//! store commits to the cache at the start of a following cycle, ahead of
//! that cycle's write-back.

use crate::common::tag::{Operand, Tag};
use crate::isa::Opcode;

/// A single store buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreBuffer {
    /// Stable identifier, e.g. `S0`.
    pub id: Tag,
    /// Whether this slot holds a store.
    pub busy: bool,
    /// The store opcode, when busy (carries the access width).
    pub op: Option<Opcode>,
    /// Base register index.
    pub base: u8,
    /// Offset added to the base register value.
    pub offset: i64,
    /// Effective address, or the producer of the base register.
    pub addr: Operand,
    /// Value to store, or its producer.
    pub value: Operand,
    /// Remaining execution cycles; nonzero while executing.
    pub remaining: u64,
    /// Latency chosen when execution started (base + probed cache latency).
    pub latency: u64,
    /// Program index of the occupying instruction.
    pub instr: Option<usize>,
}

impl StoreBuffer {
    /// Creates a free store buffer with the given identifier.
    pub fn new(id: Tag) -> Self {
        Self {
            id,
            busy: false,
            op: None,
            base: 0,
            offset: 0,
            addr: Operand::default(),
            value: Operand::default(),
            remaining: 0,
            latency: 0,
            instr: None,
        }
    }

    /// Frees the slot; the identifier is retained.
    pub fn clear(&mut self) {
        *self = StoreBuffer::new(self.id);
    }

    /// True while the countdown is running.
    pub fn is_executing(&self) -> bool {
        self.busy && self.remaining > 0
    }

    /// True when both the address and the value are known.
    pub fn ready_to_execute(&self) -> bool {
        self.addr.is_ready() && self.value.is_ready()
    }
}
