//! Instruction set definitions.
//!
//! The simulator runs a small MIPS-like subset: integer immediate add/sub,
//! FP add/sub/mul/div in single and double formats, word and doubleword
//! loads and stores, and the `BEQ`/`BNE` conditional branches. The textual
//! assembly form is handled by [`asm`]; the engine only ever sees the
//! decoded [`Instruction`] records collected into a [`Program`].

/// Two-pass assembler for the textual form.
pub mod asm;

use std::collections::HashMap;

/// FP operand format of an arithmetic opcode.
///
/// Both formats execute identical 64-bit integer arithmetic; the format is
/// kept only so a decoded program round-trips faithfully.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FpFmt {
    /// `.S` single format.
    Single,
    /// `.D` double format.
    Double,
}

/// Access width of a memory opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemWidth {
    /// 4-byte word (`LW`, `SW`, `L.S`, `S.S`).
    Word,
    /// 8-byte doubleword (`LD`, `SD`, `L.D`, `S.D`).
    Double,
}

/// Execution-slot category an opcode issues into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpClass {
    /// Integer ALU reservation station (immediates and branches).
    IntAlu,
    /// FP add/subtract reservation station.
    FpAdd,
    /// FP multiply/divide reservation station.
    FpMul,
    /// Load buffer.
    Load,
    /// Store buffer.
    Store,
}

/// Decoded operation of one source line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// Integer immediate add: `ADDI Rd, Rs, imm`.
    Addi,
    /// Integer immediate subtract: `SUBI Rd, Rs, imm`.
    Subi,
    /// Branch if equal: `BEQ Rs, Rt, Label`.
    Beq,
    /// Branch if not equal: `BNE Rs, Rt, Label`.
    Bne,
    /// FP add (`ADD.S` / `ADD.D`).
    FAdd(FpFmt),
    /// FP subtract (`SUB.S` / `SUB.D`).
    FSub(FpFmt),
    /// FP multiply (`MUL.S` / `MUL.D`).
    FMul(FpFmt),
    /// FP divide (`DIV.S` / `DIV.D`).
    FDiv(FpFmt),
    /// Memory load of the given width (`LW`, `LD`, `L.S`, `L.D`).
    Load(MemWidth),
    /// Memory store of the given width (`SW`, `SD`, `S.S`, `S.D`).
    Store(MemWidth),
}

impl Opcode {
    /// The slot category this opcode issues into.
    pub fn class(self) -> OpClass {
        match self {
            Opcode::Addi | Opcode::Subi | Opcode::Beq | Opcode::Bne => OpClass::IntAlu,
            Opcode::FAdd(_) | Opcode::FSub(_) => OpClass::FpAdd,
            Opcode::FMul(_) | Opcode::FDiv(_) => OpClass::FpMul,
            Opcode::Load(_) => OpClass::Load,
            Opcode::Store(_) => OpClass::Store,
        }
    }

    /// True for `BEQ`/`BNE`.
    pub fn is_branch(self) -> bool {
        matches!(self, Opcode::Beq | Opcode::Bne)
    }

    /// True for doubleword memory accesses.
    pub fn is_double(self) -> bool {
        matches!(self, Opcode::Load(MemWidth::Double) | Opcode::Store(MemWidth::Double))
    }
}

/// An immutable decode of one source line.
///
/// Register fields are indices into the integer or FP register file; which
/// file a memory operand names is recorded in `mem_fp` (the operand's
/// `R`/`F` prefix decides, not the mnemonic). For branches, `imm` holds the
/// absolute target instruction index after label resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Decoded operation.
    pub op: Opcode,
    /// Raw source text, kept for display.
    pub text: String,
    /// Program-order index of this instruction.
    pub index: usize,
    /// Destination register (or the data register of a store).
    pub rd: u8,
    /// First source register; base register for memory operations.
    pub rs: u8,
    /// Second source register.
    pub rt: u8,
    /// Immediate, memory offset, or resolved branch target index.
    pub imm: i64,
    /// Whether the memory operand register is FP (`F` prefix).
    pub mem_fp: bool,
}

/// A fully assembled program: decoded instructions plus the label map.
#[derive(Clone, Debug, Default)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
}

impl Program {
    /// Builds a program from decoded instructions and resolved labels.
    pub fn new(instructions: Vec<Instruction>, labels: HashMap<String, usize>) -> Self {
        Self { instructions, labels }
    }

    /// The instruction at program index `pc`, if in range.
    pub fn get(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True when the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// All instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// The instruction index a label resolves to, if defined.
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }
}
