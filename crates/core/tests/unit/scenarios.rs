//! End-to-end pipeline scenarios.
//!
//! Each test runs a short program to quiescence and checks both the
//! architectural outcome and the cycle-exact timing the micro-step ordering
//! implies: write-back before execution start (single-cycle forwarding),
//! store commit before write-back (memory visibility), and cache-probed
//! latencies for memory operations.

use crate::common::harness::{engine, engine_seeded, engine_with, run, run_until_idle, timing};
use tomasulo_core::SimConfig;
use tomasulo_core::common::tag::{Operand, Tag, UnitKind};
use tomasulo_core::engine::regs::RegisterFile;
use tomasulo_core::mem::memory::Memory;

// ──────────────────────────────────────────────────────────
// Integer immediate chain
// ──────────────────────────────────────────────────────────

/// Two dependent immediates: the second picks up the first's result over
/// the bus and leaves R1 = 16.
#[test]
fn integer_immediate_chain() {
    let mut e = engine("ADDI R1, R0, 24\nSUBI R1, R1, 8");
    run_until_idle(&mut e, 50);

    assert_eq!(e.registers().read_int(1), 16);

    let first = timing(&e, 0);
    let second = timing(&e, 1);
    // One issue per cycle.
    assert_eq!(second.issue, Some(first.issue.unwrap() + 1));
    // The dependent cannot start before the producer's write-back.
    assert!(second.exec_start.unwrap() >= first.write_back.unwrap());
    // Concrete schedule with unit ALU latency: issue 1,2; WBs at 3 and 4.
    assert_eq!(first.write_back, Some(3));
    assert_eq!(second.write_back, Some(4));
}

// ──────────────────────────────────────────────────────────
// Cache hit/miss timing
// ──────────────────────────────────────────────────────────

/// Three doubleword loads through one load buffer: addresses 0 and 8 share
/// a 16-byte block, address 100 does not. With hit latency 1, miss penalty
/// 10, and load base 2, the execution spans are 13, 3, and 13 cycles and
/// the cache ends at 1 hit / 2 misses.
#[test]
fn cache_timing_shapes_load_latency() {
    let mut cfg = SimConfig::default();
    cfg.stations.load = 1;
    let mut e = engine_with(
        "L.D F1, 0(R0)\n\
         L.D F2, 8(R0)\n\
         L.D F3, 100(R0)",
        &cfg,
    );
    run_until_idle(&mut e, 100);

    let spans: Vec<u64> = (0..3)
        .map(|i| {
            let t = timing(&e, i);
            t.exec_end.unwrap() - t.exec_start.unwrap() + 1
        })
        .collect();
    assert_eq!(spans, vec![13, 3, 13]);

    let cache = &e.state().cache;
    assert_eq!((cache.hits, cache.misses), (1, 2));
}

// ──────────────────────────────────────────────────────────
// Loop with BNE
// ──────────────────────────────────────────────────────────

/// `R1 = 24; do { R1 -= 8 } while (R1 != 0)`: three trips through the
/// body, then the not-taken branch clears the stall and the PC moves past
/// the loop.
#[test]
fn loop_with_bne_runs_three_times() {
    let mut regs = RegisterFile::new();
    regs.write_int(1, 24);
    let mut e = engine_seeded(
        "LOOP: SUBI R1, R1, 8\n\
         BNE R1, R0, LOOP",
        regs,
        Memory::new(),
    );
    run_until_idle(&mut e, 100);

    assert_eq!(e.registers().read_int(1), 0);
    assert!(!e.fetch_stalled());
    assert_eq!(e.pc(), 2);
    // Three SUBIs and three BNEs issued in total.
    assert_eq!(e.stats().instructions_issued, 6);
}

/// A taken BEQ rewrites the PC to the label's absolute index.
#[test]
fn taken_branch_rewrites_pc() {
    let mut e = engine(
        "BEQ R0, R0, END\n\
         ADDI R1, R0, 1\n\
         END: ADDI R2, R0, 2",
    );
    run_until_idle(&mut e, 50);

    // The fall-through instruction was never reached.
    assert_eq!(e.registers().read_int(1), 0);
    assert_eq!(e.registers().read_int(2), 2);
    assert!(timing(&e, 1).issue.is_none());
}

// ──────────────────────────────────────────────────────────
// RAW through the result bus
// ──────────────────────────────────────────────────────────

/// The consumer issues with a pending tag naming the producer's station,
/// and starts executing exactly on the producer's write-back cycle.
#[test]
fn raw_dependency_forwards_through_bus() {
    let mut e = engine("ADDI R1, R0, 5\nADDI R2, R1, 7");

    run(&mut e, 2); // both issued
    let consumer = e
        .state()
        .int_alu
        .iter()
        .find(|st| st.busy && st.instr == Some(1))
        .expect("consumer station");
    assert_eq!(
        consumer.j,
        Operand::Waiting(Tag::new(UnitKind::IntAlu, 0))
    );

    run_until_idle(&mut e, 50);
    assert_eq!(e.registers().read_int(2), 12);
    assert_eq!(
        timing(&e, 1).exec_start,
        timing(&e, 0).write_back
    );
}

// ──────────────────────────────────────────────────────────
// Load blocked by an older store
// ──────────────────────────────────────────────────────────

/// A load to the same address as an older store may not start executing
/// until the store has committed, and then observes the stored value.
#[test]
fn load_waits_for_older_store_to_same_address() {
    let mut regs = RegisterFile::new();
    regs.write_fp(0, 77);
    let mut e = engine_seeded("S.D F0, 0(R0)\nL.D F1, 0(R0)", regs, Memory::new());
    run_until_idle(&mut e, 100);

    let store = timing(&e, 0);
    let load = timing(&e, 1);
    assert!(load.exec_start.unwrap() >= store.write_back.unwrap());

    assert_eq!(e.memory().load_double(0).unwrap(), 77);
    assert_eq!(e.registers().read_fp(1), 77);
}

/// A load to a different address is not blocked: it starts while the older
/// store is still in flight.
#[test]
fn load_to_different_address_proceeds() {
    let mut e = engine("S.D F0, 0(R0)\nL.D F1, 64(R0)");
    run_until_idle(&mut e, 100);

    let store = timing(&e, 0);
    let load = timing(&e, 1);
    assert!(load.exec_start.unwrap() < store.write_back.unwrap());
}

/// An older store with an unresolved address blocks every younger load.
#[test]
fn unknown_store_address_blocks_loads() {
    // R1 (the store's base) is produced by a slow load, keeping the store
    // address unknown while the younger load is otherwise ready.
    let mut e = engine(
        "LW R1, 0(R0)\n\
         SW R2, 8(R1)\n\
         L.D F1, 32(R0)",
    );
    run(&mut e, 4);

    // The store is issued with a pending address.
    let store = &e.state().stores[0];
    assert!(store.busy);
    assert!(store.addr.value().is_none());

    // The load's address has been known since issue, yet it has not started.
    let load = &e.state().loads[1];
    assert!(load.busy && load.addr.is_ready());
    assert!(timing(&e, 2).exec_start.is_none());

    // It can only start once the base-register load has written back and
    // resolved the store's address.
    run_until_idle(&mut e, 100);
    assert!(timing(&e, 2).exec_start.unwrap() > timing(&e, 0).write_back.unwrap());
}

// ──────────────────────────────────────────────────────────
// FP pipeline
// ──────────────────────────────────────────────────────────

/// FP arithmetic runs on 64-bit integer values; a mul/add chain through F
/// registers produces the expected results.
#[test]
fn fp_chain_computes_integer_semantics() {
    let mut regs = RegisterFile::new();
    regs.write_fp(2, 6);
    regs.write_fp(3, 7);
    let mut e = engine_seeded(
        "MUL.D F4, F2, F3\n\
         ADD.D F5, F4, F2\n\
         SUB.D F6, F5, F3",
        regs,
        Memory::new(),
    );
    run_until_idle(&mut e, 100);

    assert_eq!(e.registers().read_fp(4), 42);
    assert_eq!(e.registers().read_fp(5), 48);
    assert_eq!(e.registers().read_fp(6), 41);
}

/// A word store writes only 4 bytes and a word load sign-extends.
#[test]
fn word_accesses_are_32_bit() {
    let mut e = engine(
        "ADDI R1, R0, -2\n\
         SW R1, 0(R0)\n\
         LW R2, 0(R0)",
    );
    run_until_idle(&mut e, 100);

    assert_eq!(e.registers().read_int(2), -2);
    // Only the first word of the doubleword changed.
    assert_eq!(e.memory().load_word(4).unwrap(), 0);
}
