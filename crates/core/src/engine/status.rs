//! Register status table.
//!
//! Maps each architectural register to the tag of its latest in-flight
//! producer, or `None` when the committed value in the register file is
//! current. Issue consults this table to decide whether an operand is a
//! value or a pending tag, and claims the destination here; write-back
//! releases the claim only when its own tag still holds it.

use crate::common::tag::Tag;

/// Producer tags per architectural register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterStatus {
    /// Integer register owners (`R0` always `None` — hardwired zero).
    int: [Option<Tag>; 32],
    /// FP register owners.
    fp: [Option<Tag>; 32],
}

impl Default for RegisterStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterStatus {
    /// Creates a status table with no pending writers.
    pub fn new() -> Self {
        Self { int: [None; 32], fp: [None; 32] }
    }

    /// Clears every entry.
    pub fn reset(&mut self) {
        self.int = [None; 32];
        self.fp = [None; 32];
    }

    /// Marks a register as owned by the producer `tag`.
    /// No-op for integer register 0.
    pub fn set_owner(&mut self, reg: usize, is_fp: bool, tag: Tag) {
        if is_fp {
            self.fp[reg] = Some(tag);
        } else if reg != 0 {
            self.int[reg] = Some(tag);
        }
    }

    /// The tag of the pending writer, or `None` when the register file
    /// value is current.
    pub fn owner(&self, reg: usize, is_fp: bool) -> Option<Tag> {
        if is_fp { self.fp[reg] } else { self.int[reg] }
    }

    /// Releases a register, but only if `tag` still owns it.
    ///
    /// A completing producer must not release a claim taken by a newer
    /// instruction writing the same register.
    pub fn clear_if_match(&mut self, reg: usize, is_fp: bool, tag: Tag) {
        let slot = if is_fp { &mut self.fp[reg] } else { &mut self.int[reg] };
        if *slot == Some(tag) {
            *slot = None;
        }
    }

    /// Iterates all held owner tags as `(register, is_fp, tag)`.
    pub fn owners(&self) -> impl Iterator<Item = (usize, bool, Tag)> + '_ {
        let ints = self
            .int
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.map(|t| (i, false, t)));
        let fps = self
            .fp
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.map(|t| (i, true, t)));
        ints.chain(fps)
    }
}
