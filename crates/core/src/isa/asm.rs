//! Two-pass assembler for the textual instruction form.
//!
//! Pass one strips comments, records `LABEL:` definitions, and decodes each
//! line into an [`Instruction`]. Pass two resolves branch labels to absolute
//! instruction indices, stored in the instruction's immediate field. Any
//! malformed line surfaces as [`SimError::BadProgram`].
//!
//! Mnemonics are case-sensitive; comments run from `#` or `//` to the end of
//! the line. Whether a memory operand targets the integer or FP register
//! file is decided by the operand's `R`/`F` prefix, not by the mnemonic.

use std::collections::HashMap;

use crate::common::error::SimError;
use crate::isa::{FpFmt, Instruction, MemWidth, Opcode, Program};

/// Assembles program text into a decoded [`Program`].
pub fn assemble(src: &str) -> Result<Program, SimError> {
    let mut instructions: Vec<Instruction> = Vec::new();
    let mut labels: HashMap<String, usize> = HashMap::new();
    // (instruction index, unresolved branch label)
    let mut fixups: Vec<(usize, String)> = Vec::new();

    for raw in src.lines() {
        let mut line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(colon) = line.find(':') {
            let label = line[..colon].trim();
            if !label.is_empty() {
                labels.insert(label.to_string(), instructions.len());
            }
            line = line[colon + 1..].trim();
            if line.is_empty() {
                continue;
            }
        }

        let index = instructions.len();
        let (instr, branch_label) = parse_line(line, index)?;
        if let Some(label) = branch_label {
            fixups.push((index, label));
        }
        instructions.push(instr);
    }

    for (index, label) in fixups {
        match labels.get(&label) {
            Some(&target) => instructions[index].imm = target as i64,
            None => {
                return Err(SimError::BadProgram(format!(
                    "unknown label `{}` in `{}`",
                    label, instructions[index].text
                )));
            }
        }
    }

    Ok(Program::new(instructions, labels))
}

fn strip_comment(line: &str) -> &str {
    let end = line.len();
    let hash = line.find('#').unwrap_or(end);
    let slashes = line.find("//").unwrap_or(end);
    &line[..hash.min(slashes)]
}

/// Decodes one instruction line; returns the instruction and, for branches,
/// the label left for pass two.
fn parse_line(line: &str, index: usize) -> Result<(Instruction, Option<String>), SimError> {
    let mut parts = line.splitn(2, char::is_whitespace);
    let mnemonic = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    let op = decode_mnemonic(mnemonic)
        .ok_or_else(|| SimError::BadProgram(format!("unknown opcode `{}` in `{}`", mnemonic, line)))?;

    let mut instr = Instruction {
        op,
        text: line.to_string(),
        index,
        rd: 0,
        rs: 0,
        rt: 0,
        imm: 0,
        mem_fp: false,
    };
    let mut branch_label = None;

    match op {
        Opcode::Addi | Opcode::Subi => {
            let [rd, rs, imm] = three_operands(args, line)?;
            instr.rd = int_reg(rd, line)?;
            instr.rs = int_reg(rs, line)?;
            instr.imm = immediate(imm, line)?;
        }
        Opcode::Beq | Opcode::Bne => {
            let [rs, rt, label] = three_operands(args, line)?;
            instr.rs = int_reg(rs, line)?;
            instr.rt = int_reg(rt, line)?;
            branch_label = Some(label.to_string());
        }
        Opcode::FAdd(_) | Opcode::FSub(_) | Opcode::FMul(_) | Opcode::FDiv(_) => {
            let [fd, fs, ft] = three_operands(args, line)?;
            instr.rd = fp_reg(fd, line)?;
            instr.rs = fp_reg(fs, line)?;
            instr.rt = fp_reg(ft, line)?;
        }
        Opcode::Load(_) | Opcode::Store(_) => {
            let (reg, offset, base) = memory_operands(args, line)?;
            let (idx, is_fp) = any_reg(reg, line)?;
            instr.rd = idx;
            instr.mem_fp = is_fp;
            instr.rs = base;
            instr.imm = offset;
        }
    }

    Ok((instr, branch_label))
}

fn decode_mnemonic(op: &str) -> Option<Opcode> {
    let decoded = match op {
        "ADDI" => Opcode::Addi,
        "SUBI" => Opcode::Subi,
        "BEQ" => Opcode::Beq,
        "BNE" => Opcode::Bne,
        "ADD.S" => Opcode::FAdd(FpFmt::Single),
        "ADD.D" => Opcode::FAdd(FpFmt::Double),
        "SUB.S" => Opcode::FSub(FpFmt::Single),
        "SUB.D" => Opcode::FSub(FpFmt::Double),
        "MUL.S" => Opcode::FMul(FpFmt::Single),
        "MUL.D" => Opcode::FMul(FpFmt::Double),
        "DIV.S" => Opcode::FDiv(FpFmt::Single),
        "DIV.D" => Opcode::FDiv(FpFmt::Double),
        "LW" => Opcode::Load(MemWidth::Word),
        "L.S" => Opcode::Load(MemWidth::Word),
        "LD" => Opcode::Load(MemWidth::Double),
        "L.D" => Opcode::Load(MemWidth::Double),
        "SW" => Opcode::Store(MemWidth::Word),
        "S.S" => Opcode::Store(MemWidth::Word),
        "SD" => Opcode::Store(MemWidth::Double),
        "S.D" => Opcode::Store(MemWidth::Double),
        _ => return None,
    };
    Some(decoded)
}

fn three_operands<'a>(args: &'a str, line: &str) -> Result<[&'a str; 3], SimError> {
    let mut fields = args.split(',').map(str::trim);
    match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(a), Some(b), Some(c), None) if !a.is_empty() && !b.is_empty() && !c.is_empty() => {
            Ok([a, b, c])
        }
        _ => Err(SimError::BadProgram(format!("expected three operands in `{}`", line))),
    }
}

/// Splits `reg, offset(base)` into its parts.
fn memory_operands<'a>(args: &'a str, line: &str) -> Result<(&'a str, i64, u8), SimError> {
    let malformed = || SimError::BadProgram(format!("expected `reg, offset(base)` in `{}`", line));

    let (reg, addr) = args.split_once(',').ok_or_else(malformed)?;
    let addr = addr.trim();
    let open = addr.find('(').ok_or_else(malformed)?;
    if !addr.ends_with(')') {
        return Err(malformed());
    }

    let offset = immediate(addr[..open].trim(), line)?;
    let base = int_reg(addr[open + 1..addr.len() - 1].trim(), line)?;
    Ok((reg.trim(), offset, base))
}

fn immediate(text: &str, line: &str) -> Result<i64, SimError> {
    text.parse::<i64>()
        .map_err(|_| SimError::BadProgram(format!("bad immediate `{}` in `{}`", text, line)))
}

fn int_reg(text: &str, line: &str) -> Result<u8, SimError> {
    match any_reg(text, line)? {
        (idx, false) => Ok(idx),
        (_, true) => Err(SimError::BadProgram(format!(
            "expected integer register, got `{}` in `{}`",
            text, line
        ))),
    }
}

fn fp_reg(text: &str, line: &str) -> Result<u8, SimError> {
    match any_reg(text, line)? {
        (idx, true) => Ok(idx),
        (_, false) => Err(SimError::BadProgram(format!(
            "expected FP register, got `{}` in `{}`",
            text, line
        ))),
    }
}

/// Parses `R<n>` or `F<n>`, returning the index and whether it is FP.
fn any_reg(text: &str, line: &str) -> Result<(u8, bool), SimError> {
    let bad = || SimError::BadProgram(format!("bad register `{}` in `{}`", text, line));

    let mut chars = text.chars();
    let is_fp = match chars.next() {
        Some('R') | Some('r') => false,
        Some('F') | Some('f') => true,
        _ => return Err(bad()),
    };
    let index: u8 = chars.as_str().parse().map_err(|_| bad())?;
    if index >= 32 {
        return Err(bad());
    }
    Ok((index, is_fp))
}
