//! # Engine Unit Tests
//!
//! Per-step engine behavior observable through the public API: issue
//! claiming destination owners, structural issue stalls, branch fetch
//! stalls, divide-by-zero, fatal memory errors, and reset.

/// Architectural register file.
mod regs;

use crate::common::harness::{engine, engine_with};
use tomasulo_core::common::tag::{Tag, UnitKind};
use tomasulo_core::engine::Engine;
use tomasulo_core::engine::timing::InstrTiming;
use tomasulo_core::isa::asm::assemble;
use tomasulo_core::{SimConfig, SimError};

#[test]
fn issue_claims_destination_owner() {
    let mut e = engine("ADDI R1, R0, 5");
    e.next_cycle().unwrap();

    let tag = Tag::new(UnitKind::IntAlu, 0);
    assert_eq!(e.state().status.owner(1, false), Some(tag));
    assert_eq!(e.timings()[0].issue, Some(1));
    assert_eq!(e.pc(), 1);
}

#[test]
fn full_stations_hold_the_pc() {
    let mut cfg = SimConfig::default();
    cfg.stations.int_alu = 1;
    cfg.latency.int_alu = 5;
    let mut e = engine_with("ADDI R1, R0, 1\nADDI R2, R0, 2", &cfg);

    e.next_cycle().unwrap(); // issue first
    let report = e.next_cycle().unwrap(); // second finds no free slot
    assert!(!report.issued);
    assert_eq!(e.pc(), 1);
    assert_eq!(e.stats().issue_stalls, 1);
}

#[test]
fn branch_stalls_issue_until_resolution() {
    let mut e = engine(
        "ADDI R1, R0, 1\n\
         BEQ R1, R0, SKIP\n\
         ADDI R2, R0, 2\n\
         SKIP: ADDI R3, R0, 3",
    );
    e.next_cycle().unwrap();
    e.next_cycle().unwrap(); // branch issues
    assert!(e.fetch_stalled());
    let pc_after_branch = e.pc();

    // No issue happens while stalled.
    e.next_cycle().unwrap();
    assert_eq!(e.pc(), pc_after_branch);
}

#[test]
fn bad_config_fails_engine_construction() {
    let mut cfg = SimConfig::default();
    cfg.cache.size = 100; // not divisible by block_size * associativity
    let prog = assemble("ADDI R1, R0, 1").unwrap();
    assert!(matches!(
        Engine::new(prog, &cfg),
        Err(SimError::BadConfig(_))
    ));
}

#[test]
fn divide_by_zero_yields_zero() {
    // F2 = F0 / F4 with both registers zero.
    let mut e = engine("DIV.D F2, F0, F4");
    for _ in 0..50 {
        e.next_cycle().unwrap();
    }
    assert_eq!(e.registers().read_fp(2), 0);
    assert!(e.timings()[0].write_back.is_some());
}

#[test]
fn out_of_bounds_load_is_fatal() {
    let mut e = engine("LW R1, 8000(R0)");
    let mut saw_error = false;
    for _ in 0..30 {
        match e.next_cycle() {
            Ok(_) => {}
            Err(SimError::OutOfBounds { .. }) => {
                saw_error = true;
                break;
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert!(saw_error);
}

#[test]
fn reset_returns_to_power_on() {
    let mut e = engine("ADDI R1, R0, 5\nSUBI R2, R1, 1");
    for _ in 0..10 {
        e.next_cycle().unwrap();
    }
    assert_ne!(e.registers().read_int(1), 0);

    e.reset();
    assert_eq!(e.cycle(), 0);
    assert_eq!(e.pc(), 0);
    assert_eq!(e.registers().read_int(1), 0);
    assert!(e.timings().iter().all(|t| *t == InstrTiming::default()));

    // The machine runs again after reset.
    for _ in 0..10 {
        e.next_cycle().unwrap();
    }
    assert_eq!(e.registers().read_int(1), 5);
    assert_eq!(e.registers().read_int(2), 4);
}
