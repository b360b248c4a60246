//! Structural and data hazard schedules.
//!
//! The single result bus is modeled by end-cycle reservation: a unit may
//! not start executing if its predicted completion collides with one
//! already in flight. These tests pin down the schedules that rule
//! produces, plus write-after-write ownership and multi-consumer wakeups.

use crate::common::harness::{engine, engine_seeded, run, run_until_idle, timing};
use tomasulo_core::common::tag::Operand;
use tomasulo_core::engine::regs::RegisterFile;
use tomasulo_core::mem::memory::Memory;

// ──────────────────────────────────────────────────────────
// End-cycle collision on the result bus
// ──────────────────────────────────────────────────────────

/// An FP add (latency 2) starts in cycle 2 and will finish in cycle 3. An
/// independent ADDI (latency 1) becomes ready in cycle 3 but would also
/// finish in cycle 3, so its start is deferred one cycle.
#[test]
fn colliding_end_cycles_defer_the_second_start() {
    let mut e = engine("ADD.D F1, F2, F3\nADDI R1, R0, 5");
    run_until_idle(&mut e, 50);

    let fp = timing(&e, 0);
    let alu = timing(&e, 1);
    assert_eq!(fp.exec_start, Some(2));
    assert_eq!(fp.exec_end, Some(3));

    // Without the bus hazard the ADDI would have started in cycle 3.
    assert_eq!(alu.exec_start, Some(4));
    assert_eq!(alu.exec_end, Some(4));
    assert_ne!(fp.exec_end, alu.exec_end);

    assert_eq!(e.registers().read_int(1), 5);
}

/// Every producer writes back the cycle after its execution ends; the
/// reservation rule guarantees the bus is free for each of them.
#[test]
fn writeback_follows_exec_end_by_one_cycle() {
    let mut e = engine(
        "ADD.D F2, F0, F1\n\
         MUL.D F4, F0, F1\n\
         ADDI R1, R0, 3",
    );
    run_until_idle(&mut e, 100);

    for idx in 0..3 {
        let t = timing(&e, idx);
        assert_eq!(
            t.write_back,
            Some(t.exec_end.unwrap() + 1),
            "instruction {} write-back should trail exec-end by one",
            idx
        );
    }
}

// ──────────────────────────────────────────────────────────
// Broadcast wakes every consumer
// ──────────────────────────────────────────────────────────

/// Three consumers wait on one slow producer; the single broadcast readies
/// all of them at once, and the bus rule then staggers their completions.
#[test]
fn one_broadcast_wakes_all_dependents() {
    let mut mem = Memory::new();
    mem.store_word(0, 40).unwrap();
    let mut e = engine_seeded(
        "LW R1, 0(R0)\n\
         ADDI R2, R1, 1\n\
         ADDI R3, R1, 2\n\
         SUBI R4, R1, 3",
        RegisterFile::new(),
        mem,
    );
    run(&mut e, 6);

    // While the load runs, all three consumers hold its pending tag.
    let load_tag = e.state().loads[0].id;
    let waiting = e
        .state()
        .int_alu
        .iter()
        .filter(|st| st.busy && st.j == Operand::Waiting(load_tag))
        .count();
    assert_eq!(waiting, 3);

    run_until_idle(&mut e, 50);
    assert_eq!(e.registers().read_int(1), 40);
    assert_eq!(e.registers().read_int(2), 41);
    assert_eq!(e.registers().read_int(3), 42);
    assert_eq!(e.registers().read_int(4), 37);

    // All four used the bus on distinct cycles.
    let mut wbs: Vec<u64> = (0..4).map(|i| timing(&e, i).write_back.unwrap()).collect();
    wbs.sort_unstable();
    for pair in wbs.windows(2) {
        assert!(pair[0] < pair[1]);
    }
}

// ──────────────────────────────────────────────────────────
// Write-after-write ownership
// ──────────────────────────────────────────────────────────

/// When two in-flight producers target the same register, only the newest
/// owner's write-back lands; the older result is dropped on delivery.
#[test]
fn older_producer_does_not_clobber_newer_claim() {
    let mut e = engine("ADDI R1, R0, 1\nADDI R1, R0, 2");
    run_until_idle(&mut e, 50);

    assert_eq!(e.registers().read_int(1), 2);
    // Both still wrote back (the bus slot is used either way).
    assert!(timing(&e, 0).write_back.is_some());
    assert!(timing(&e, 1).write_back.is_some());
}

/// A store reads its value from the FP file when the operand form says so,
/// waiting on the FP producer rather than the integer one.
#[test]
fn store_value_waits_on_fp_producer() {
    let mut regs = RegisterFile::new();
    regs.write_fp(0, 30);
    regs.write_fp(1, 12);
    let mut e = engine_seeded(
        "ADD.D F2, F0, F1\n\
         S.D F2, 16(R0)",
        regs,
        Memory::new(),
    );
    run_until_idle(&mut e, 100);

    assert_eq!(e.memory().load_double(16).unwrap(), 42);
    // The store could not finish before the add's write-back.
    assert!(timing(&e, 1).exec_start.unwrap() >= timing(&e, 0).write_back.unwrap());
}
