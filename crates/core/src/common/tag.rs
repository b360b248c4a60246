//! Producer tags and operand slots.
//!
//! Every reservation station and load/store buffer carries a compact `Tag`
//! identifying it as a producer on the common data bus. The register status
//! table and pending-operand slots store these tags; a broadcast is then an
//! equality test on a small value type rather than a string comparison.

use std::fmt;

/// The five kinds of execution slots a program can occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// FP add/subtract reservation station (`A0`, `A1`, ...).
    FpAdd,
    /// FP multiply/divide reservation station (`M0`, `M1`, ...).
    FpMul,
    /// Integer ALU reservation station (`I0`, `I1`, ...).
    IntAlu,
    /// Load buffer (`L0`, `L1`, ...).
    Load,
    /// Store buffer (`S0`, `S1`, ...).
    Store,
}

impl UnitKind {
    /// One-letter prefix used in the classic display names.
    fn letter(self) -> char {
        match self {
            UnitKind::FpAdd => 'A',
            UnitKind::FpMul => 'M',
            UnitKind::IntAlu => 'I',
            UnitKind::Load => 'L',
            UnitKind::Store => 'S',
        }
    }
}

/// Stable identifier of one station or buffer slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tag {
    /// Slot category.
    pub unit: UnitKind,
    /// Index within the category.
    pub index: u8,
}

impl Tag {
    /// Creates a tag for the `index`-th slot of the given kind.
    pub fn new(unit: UnitKind, index: u8) -> Self {
        Self { unit, index }
    }
}

impl fmt::Display for Tag {
    /// Renders the classic slot name, e.g. `A0`, `M1`, `I2`, `L0`, `S3`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.unit.letter(), self.index)
    }
}

/// Destination register of an in-flight operation.
///
/// Branches have no destination; loads name an integer or FP register
/// depending on the operand form of the source line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Dest {
    /// Integer register `R0`..`R31` (writes to `R0` are dropped).
    Int(u8),
    /// FP register `F0`..`F31`.
    Fp(u8),
    /// No destination register.
    #[default]
    None,
}

/// One source-operand slot: either a known value or a pending producer.
///
/// Exactly one side is ever live; a slot waiting on a tag has no meaningful
/// value until the matching broadcast arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// The operand value is known.
    Ready(i64),
    /// The operand is produced by the named slot; wait for its broadcast.
    Waiting(Tag),
}

impl Default for Operand {
    fn default() -> Self {
        Operand::Ready(0)
    }
}

impl Operand {
    /// True when the value is known.
    pub fn is_ready(&self) -> bool {
        matches!(self, Operand::Ready(_))
    }

    /// The known value, if any.
    pub fn value(&self) -> Option<i64> {
        match self {
            Operand::Ready(v) => Some(*v),
            Operand::Waiting(_) => None,
        }
    }

    /// The pending producer, if any.
    pub fn pending(&self) -> Option<Tag> {
        match self {
            Operand::Ready(_) => None,
            Operand::Waiting(t) => Some(*t),
        }
    }

    /// Captures a broadcast value if this slot waits on `producer`.
    ///
    /// Returns true when the slot transitioned from waiting to ready.
    pub fn capture(&mut self, producer: Tag, value: i64) -> bool {
        if self.pending() == Some(producer) {
            *self = Operand::Ready(value);
            true
        } else {
            false
        }
    }
}
