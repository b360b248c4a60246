//! # Register File Tests
//!
//! Verifies the integer/FP register files, in particular the hardwired
//! integer register 0.

use tomasulo_core::engine::regs::RegisterFile;

#[test]
fn r0_is_hardwired_to_zero() {
    let mut regs = RegisterFile::new();
    regs.write_int(0, 99);
    assert_eq!(regs.read_int(0), 0);
}

#[test]
fn int_and_fp_files_are_independent() {
    let mut regs = RegisterFile::new();
    regs.write_int(5, 10);
    regs.write_fp(5, 20);
    assert_eq!(regs.read_int(5), 10);
    assert_eq!(regs.read_fp(5), 20);
}

#[test]
fn f0_is_writable() {
    let mut regs = RegisterFile::new();
    regs.write_fp(0, 7);
    assert_eq!(regs.read_fp(0), 7);
}

#[test]
fn negative_values_round_trip() {
    let mut regs = RegisterFile::new();
    regs.write_int(31, i64::MIN);
    regs.write_fp(31, -1);
    assert_eq!(regs.read_int(31), i64::MIN);
    assert_eq!(regs.read_fp(31), -1);
}

#[test]
fn reset_clears_everything() {
    let mut regs = RegisterFile::new();
    regs.write_int(3, 1);
    regs.write_fp(4, 2);
    regs.reset();
    assert_eq!(regs, RegisterFile::new());
}
