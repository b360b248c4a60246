//! The pipeline engine.
//!
//! Owns the whole simulated machine and advances it one cycle per call. A
//! cycle is a fixed sequence of micro-steps:
//!
//! 1. **Commit finished stores** to the cache (memory becomes visible before
//!    any load completes this cycle).
//! 2. **Write-back** at most one producer on the single common data bus,
//!    updating the register file and waking pending operands.
//! 3. **Start execution** for every ready station and buffer, unless its
//!    predicted end cycle would collide with one already reserved (this is
//!    what serializes the bus to one transaction per cycle).
//! 4. **Decrement** every running countdown; a countdown reaching zero
//!    stamps the instruction's exec-end.
//! 5. **Issue** at most one instruction into a free slot, claiming its
//!    destination register; branches stall further issue until resolved.
//! 6. **Snapshot** the observable state for reverse stepping.
//!
//! The ordering is load-bearing: write-back precedes execution start, so a
//! value broadcast in cycle N can start its dependents in cycle N; decrement
//! follows start, so a unit started with latency 1 finishes the same cycle
//! and writes back in cycle N+1.

/// Load buffer slots.
pub mod load_buffer;
/// Architectural register file.
pub mod regs;
/// Per-cycle state snapshots.
pub mod snapshot;
/// Reservation station slots.
pub mod station;
/// Register status table.
pub mod status;
/// Store buffer slots.
pub mod store_buffer;
/// Per-instruction cycle stamps.
pub mod timing;

use std::collections::HashSet;

use crate::common::error::SimError;
use crate::common::tag::{Dest, Operand, Tag, UnitKind};
use crate::config::{LatencyConfig, SimConfig};
use crate::engine::load_buffer::LoadBuffer;
use crate::engine::regs::RegisterFile;
use crate::engine::snapshot::CycleState;
use crate::engine::station::Station;
use crate::engine::status::RegisterStatus;
use crate::engine::store_buffer::StoreBuffer;
use crate::engine::timing::InstrTiming;
use crate::isa::{Instruction, OpClass, Opcode, Program};
use crate::mem::cache::Cache;
use crate::mem::memory::Memory;
use crate::stats::SimStats;

/// What happened during one cycle advance.
///
/// A report where nothing issued, executed, wrote back, or committed means
/// the program has drained (or cannot make progress); the caller detects
/// this via [`CycleReport::made_progress`] rather than through an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleReport {
    /// The cycle that was just completed.
    pub cycle: u64,
    /// Whether an instruction was issued.
    pub issued: bool,
    /// Whether a producer won the result bus.
    pub wrote_back: bool,
    /// How many stores committed to memory.
    pub stores_committed: usize,
    /// How many units counted an execution cycle.
    pub units_executing: usize,
}

impl CycleReport {
    /// True when the cycle did any work.
    pub fn made_progress(&self) -> bool {
        self.issued || self.wrote_back || self.stores_committed > 0 || self.units_executing > 0
    }
}

/// Which slot a write-back candidate lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotRef {
    FpAdd(usize),
    FpMul(usize),
    IntAlu(usize),
    Load(usize),
}

/// The Tomasulo pipeline engine.
pub struct Engine {
    program: Program,
    lat: LatencyConfig,
    regs: RegisterFile,
    status: RegisterStatus,
    cache: Cache,
    fp_add: Vec<Station>,
    fp_mul: Vec<Station>,
    int_alu: Vec<Station>,
    loads: Vec<LoadBuffer>,
    stores: Vec<StoreBuffer>,
    timings: Vec<InstrTiming>,
    pc: usize,
    cycle: u64,
    fetch_stalled: bool,
    history: Vec<CycleState>,
    stats: SimStats,
}

impl Engine {
    /// Creates an engine with zeroed registers and memory.
    pub fn new(program: Program, config: &SimConfig) -> Result<Self, SimError> {
        Self::with_state(program, config, RegisterFile::new(), Memory::new())
    }

    /// Creates an engine around caller-prepared registers and memory.
    ///
    /// Fails with [`SimError::BadConfig`] on invalid parameters and
    /// [`SimError::BadProgram`] if the decoded program carries an
    /// out-of-range register index.
    pub fn with_state(
        program: Program,
        config: &SimConfig,
        regs: RegisterFile,
        mem: Memory,
    ) -> Result<Self, SimError> {
        config.validate()?;
        validate_program(&program)?;
        let cache = Cache::new(&config.cache, mem)?;

        let stations =
            |kind, n| (0..n).map(|i| Station::new(Tag::new(kind, i as u8))).collect::<Vec<_>>();
        let s = &config.stations;

        let timings = vec![InstrTiming::default(); program.len()];
        let mut engine = Self {
            program,
            lat: config.latency.clone(),
            regs,
            status: RegisterStatus::new(),
            cache,
            fp_add: stations(UnitKind::FpAdd, s.fp_add),
            fp_mul: stations(UnitKind::FpMul, s.fp_mul),
            int_alu: stations(UnitKind::IntAlu, s.int_alu),
            loads: (0..s.load)
                .map(|i| LoadBuffer::new(Tag::new(UnitKind::Load, i as u8)))
                .collect(),
            stores: (0..s.store)
                .map(|i| StoreBuffer::new(Tag::new(UnitKind::Store, i as u8)))
                .collect(),
            timings,
            pc: 0,
            cycle: 0,
            fetch_stalled: false,
            history: Vec::new(),
            stats: SimStats::default(),
        };
        engine.history.push(engine.take_snapshot());
        Ok(engine)
    }

    /// Current cycle number.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Program counter: index of the next instruction to issue.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Whether issue is stalled behind an unresolved branch.
    pub fn fetch_stalled(&self) -> bool {
        self.fetch_stalled
    }

    /// The decoded program this engine runs.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Running statistics.
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// The architectural register files.
    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Mutable register access.
    ///
    /// To seed values that are also captured in the initial snapshot, pass
    /// a prepared register file to [`Engine::with_state`] instead.
    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    /// The backing store.
    pub fn memory(&self) -> &Memory {
        self.cache.memory()
    }

    /// Mutable backing-store access, for preloading data.
    pub fn memory_mut(&mut self) -> &mut Memory {
        self.cache.memory_mut()
    }

    /// The observable state at the end of the last completed cycle.
    pub fn state(&self) -> &CycleState {
        // The history always holds at least the initial snapshot.
        self.history.last().unwrap()
    }

    /// Per-instruction timing stamps.
    pub fn timings(&self) -> &[InstrTiming] {
        &self.timings
    }

    /// Advances the machine by one cycle.
    ///
    /// Fatal memory errors surface here; structural stalls do not. The
    /// snapshot for the completed cycle is appended before returning.
    pub fn next_cycle(&mut self) -> Result<CycleReport, SimError> {
        self.cycle += 1;

        let stores_committed = self.commit_finished_stores()?;
        let wrote_back = self.write_back()?;
        self.start_ready_executions();
        let units_executing = self.advance_executing();
        let issued = self.issue_one();

        self.history.push(self.take_snapshot());

        self.stats.cycles += 1;
        self.stats.stores_committed += stores_committed as u64;
        if wrote_back {
            self.stats.writebacks += 1;
        }
        if issued {
            self.stats.instructions_issued += 1;
        }

        Ok(CycleReport {
            cycle: self.cycle,
            issued,
            wrote_back,
            stores_committed,
            units_executing,
        })
    }

    /// Steps back one cycle by restoring the previous snapshot.
    ///
    /// Returns false at the initial state. The backing store is not part of
    /// snapshots and keeps its newest contents.
    pub fn previous_cycle(&mut self) -> bool {
        if self.history.len() <= 1 {
            return false;
        }
        self.history.pop();
        // Non-empty by the length check above.
        let prev = self.history.last().unwrap().clone();
        self.restore(&prev);
        true
    }

    /// Returns the machine to its power-on state: zeroed registers and
    /// memory, empty slots, cycle 0, and a fresh history.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.cycle = 0;
        self.fetch_stalled = false;
        self.regs.reset();
        self.status.reset();
        self.cache.reset();
        self.cache.memory_mut().reset();
        for st in self.all_stations_mut() {
            st.clear();
        }
        for lb in &mut self.loads {
            lb.clear();
        }
        for sb in &mut self.stores {
            sb.clear();
        }
        for t in &mut self.timings {
            t.reset();
        }
        self.stats = SimStats::default();
        self.history.clear();
        self.history.push(self.take_snapshot());
    }

    // ---------------------------------------------------------------
    // Micro-step 1: store commit
    // ---------------------------------------------------------------

    /// Commits every store whose execution finished in an earlier cycle.
    fn commit_finished_stores(&mut self) -> Result<usize, SimError> {
        let mut committed = 0;
        for idx in 0..self.stores.len() {
            let sb = &self.stores[idx];
            if !sb.busy {
                continue;
            }
            let Some(instr) = sb.instr else { continue };
            let t = self.timings[instr];
            let finished_earlier = t.exec_end.is_some_and(|e| e < self.cycle);
            if !finished_earlier || t.write_back.is_some() {
                continue;
            }

            let addr = sb.addr.value().unwrap_or(0);
            let value = sb.value.value().unwrap_or(0);
            let is_double = sb.op.is_some_and(Opcode::is_double);

            self.cache.store(addr, value, is_double)?;
            self.timings[instr].write_back = Some(self.cycle);
            self.stores[idx].clear();
            committed += 1;
        }
        Ok(committed)
    }

    // ---------------------------------------------------------------
    // Micro-step 2: write-back on the single result bus
    // ---------------------------------------------------------------

    /// Chooses and performs at most one write-back this cycle.
    fn write_back(&mut self) -> Result<bool, SimError> {
        let Some(winner) = self.select_writeback() else {
            return Ok(false);
        };

        match winner {
            SlotRef::FpAdd(_) | SlotRef::FpMul(_) | SlotRef::IntAlu(_) => {
                self.write_back_station(winner);
            }
            SlotRef::Load(idx) => self.write_back_load(idx)?,
        }
        Ok(true)
    }

    /// Collects finished producers and picks the bus winner: highest
    /// dependent count, then earliest exec-start (issue cycle as fallback).
    fn select_writeback(&self) -> Option<SlotRef> {
        let mut best: Option<(SlotRef, usize, u64)> = None;

        let mut consider = |slot: SlotRef, tag: Tag, instr: Option<usize>| {
            let Some(instr) = instr else { return };
            let t = &self.timings[instr];
            let finished_earlier = t.exec_end.is_some_and(|e| e < self.cycle);
            if !finished_earlier || t.write_back.is_some() {
                return;
            }
            let score = self.dependents(tag);
            let start = t.exec_start.or(t.issue).unwrap_or(u64::MAX);
            let better = match best {
                None => true,
                Some((_, best_score, best_start)) => {
                    score > best_score || (score == best_score && start < best_start)
                }
            };
            if better {
                best = Some((slot, score, start));
            }
        };

        for (i, st) in self.fp_add.iter().enumerate() {
            if st.busy {
                consider(SlotRef::FpAdd(i), st.id, st.instr);
            }
        }
        for (i, st) in self.fp_mul.iter().enumerate() {
            if st.busy {
                consider(SlotRef::FpMul(i), st.id, st.instr);
            }
        }
        for (i, st) in self.int_alu.iter().enumerate() {
            if st.busy {
                consider(SlotRef::IntAlu(i), st.id, st.instr);
            }
        }
        for (i, lb) in self.loads.iter().enumerate() {
            if lb.busy {
                consider(SlotRef::Load(i), lb.id, lb.instr);
            }
        }

        best.map(|(slot, _, _)| slot)
    }

    /// How many pending operands across the machine wait on `producer`.
    fn dependents(&self, producer: Tag) -> usize {
        let mut count = 0;
        for st in self.all_stations() {
            if st.j.pending() == Some(producer) || st.k.pending() == Some(producer) {
                count += 1;
            }
        }
        for lb in &self.loads {
            if lb.addr.pending() == Some(producer) {
                count += 1;
            }
        }
        for sb in &self.stores {
            if sb.addr.pending() == Some(producer) || sb.value.pending() == Some(producer) {
                count += 1;
            }
        }
        count
    }

    /// Write-back of an ALU, FP, or branch station.
    fn write_back_station(&mut self, slot: SlotRef) {
        let st = match slot {
            SlotRef::FpAdd(i) => &self.fp_add[i],
            SlotRef::FpMul(i) => &self.fp_mul[i],
            SlotRef::IntAlu(i) => &self.int_alu[i],
            SlotRef::Load(_) => return,
        };
        let tag = st.id;
        let op = st.op;
        let vj = st.j.value().unwrap_or(0);
        let vk = st.k.value().unwrap_or(0);
        let a = st.a;
        let dest = st.dest;
        let instr = st.instr;

        match op {
            Some(Opcode::Beq) | Some(Opcode::Bne) => {
                let taken = match op {
                    Some(Opcode::Beq) => vj == vk,
                    _ => vj != vk,
                };
                if taken {
                    self.pc = a as usize;
                }
                // Branch resolved either way: resume issue.
                self.fetch_stalled = false;
            }
            Some(op) => {
                let result = alu_result(op, vj, vk, a);
                self.deliver(dest, tag, result);
                self.broadcast(tag, result);
            }
            None => {}
        }

        if let Some(i) = instr {
            self.timings[i].write_back = Some(self.cycle);
        }
        match slot {
            SlotRef::FpAdd(i) => self.fp_add[i].clear(),
            SlotRef::FpMul(i) => self.fp_mul[i].clear(),
            SlotRef::IntAlu(i) => self.int_alu[i].clear(),
            SlotRef::Load(_) => {}
        }
    }

    /// Write-back of a finished load: the cache access happens now, after
    /// this cycle's store commits, so the loaded value is current.
    fn write_back_load(&mut self, idx: usize) -> Result<(), SimError> {
        let lb = &self.loads[idx];
        let tag = lb.id;
        let addr = lb.addr.value().unwrap_or(0);
        let is_double = lb.op.is_some_and(Opcode::is_double);
        let dest = lb.dest;
        let instr = lb.instr;

        let result = self.cache.load(addr, is_double)?;
        self.deliver(dest, tag, result);
        self.broadcast(tag, result);

        if let Some(i) = instr {
            self.timings[i].write_back = Some(self.cycle);
        }
        self.loads[idx].clear();
        Ok(())
    }

    /// Writes `value` to the destination register if `producer` still owns
    /// it, releasing the claim.
    fn deliver(&mut self, dest: Dest, producer: Tag, value: i64) {
        match dest {
            Dest::Int(r) => {
                let r = r as usize;
                if self.status.owner(r, false) == Some(producer) {
                    self.regs.write_int(r, value);
                    self.status.clear_if_match(r, false, producer);
                }
            }
            Dest::Fp(r) => {
                let r = r as usize;
                if self.status.owner(r, true) == Some(producer) {
                    self.regs.write_fp(r, value);
                    self.status.clear_if_match(r, true, producer);
                }
            }
            Dest::None => {}
        }
    }

    /// Broadcasts `(producer, value)` to every pending operand slot.
    ///
    /// Load and store address slots resolve to `value + offset`, completing
    /// the effective-address computation their base register was blocking.
    fn broadcast(&mut self, producer: Tag, value: i64) {
        for st in self
            .fp_add
            .iter_mut()
            .chain(self.fp_mul.iter_mut())
            .chain(self.int_alu.iter_mut())
        {
            st.j.capture(producer, value);
            st.k.capture(producer, value);
        }
        for lb in &mut self.loads {
            if lb.addr.pending() == Some(producer) {
                lb.addr = Operand::Ready(value.wrapping_add(lb.offset));
            }
        }
        for sb in &mut self.stores {
            if sb.addr.pending() == Some(producer) {
                sb.addr = Operand::Ready(value.wrapping_add(sb.offset));
            }
            sb.value.capture(producer, value);
        }
    }

    // ---------------------------------------------------------------
    // Micro-step 3: start ready executions
    // ---------------------------------------------------------------

    /// Starts every ready station and buffer whose predicted end cycle is
    /// still free, reserving it. An occupied end cycle models the single
    /// result bus: two producers may never finish in the same cycle.
    fn start_ready_executions(&mut self) {
        let cycle = self.cycle;
        let mut reserved: HashSet<u64> = HashSet::new();

        for st in self.all_stations() {
            if st.is_executing() {
                reserved.insert(cycle + st.remaining - 1);
            }
        }
        for lb in &self.loads {
            if lb.is_executing() {
                reserved.insert(cycle + lb.remaining - 1);
            }
        }
        for sb in &self.stores {
            if sb.is_executing() {
                reserved.insert(cycle + sb.remaining - 1);
            }
        }

        for idx in 0..self.fp_add.len() {
            if !station_can_start(&self.fp_add[idx], &self.timings) {
                continue;
            }
            let lat = self.lat.fp_add;
            if !reserved.insert(cycle + lat - 1) {
                continue;
            }
            start_station(&mut self.fp_add[idx], lat, cycle, &mut self.timings);
        }

        for idx in 0..self.fp_mul.len() {
            if !station_can_start(&self.fp_mul[idx], &self.timings) {
                continue;
            }
            let lat = match self.fp_mul[idx].op {
                Some(Opcode::FDiv(_)) => self.lat.fp_div,
                _ => self.lat.fp_mul,
            };
            if !reserved.insert(cycle + lat - 1) {
                continue;
            }
            start_station(&mut self.fp_mul[idx], lat, cycle, &mut self.timings);
        }

        for idx in 0..self.int_alu.len() {
            if !station_can_start(&self.int_alu[idx], &self.timings) {
                continue;
            }
            let lat = self.lat.int_alu;
            if !reserved.insert(cycle + lat - 1) {
                continue;
            }
            start_station(&mut self.int_alu[idx], lat, cycle, &mut self.timings);
        }

        for idx in 0..self.loads.len() {
            let lb = &self.loads[idx];
            if !lb.busy || lb.is_executing() || !lb.addr.is_ready() {
                continue;
            }
            let Some(instr) = lb.instr else { continue };
            if self.timings[instr].exec_end.is_some() {
                continue;
            }
            if self.load_blocked_by_older_store(idx) {
                continue;
            }
            let addr = lb.addr.value().unwrap_or(0);
            let lat = self.lat.load_base + self.cache.probe_latency(addr);
            if !reserved.insert(cycle + lat - 1) {
                continue;
            }
            let lb = &mut self.loads[idx];
            lb.latency = lat;
            lb.remaining = lat;
            let t = &mut self.timings[instr];
            if t.exec_start.is_none() {
                t.exec_start = Some(cycle);
            }
        }

        for idx in 0..self.stores.len() {
            let sb = &self.stores[idx];
            if !sb.busy || sb.is_executing() || !sb.ready_to_execute() {
                continue;
            }
            let Some(instr) = sb.instr else { continue };
            if self.timings[instr].exec_end.is_some() {
                continue;
            }
            let addr = sb.addr.value().unwrap_or(0);
            let lat = self.lat.store_base + self.cache.probe_latency(addr);
            if !reserved.insert(cycle + lat - 1) {
                continue;
            }
            let sb = &mut self.stores[idx];
            sb.latency = lat;
            sb.remaining = lat;
            let t = &mut self.timings[instr];
            if t.exec_start.is_none() {
                t.exec_start = Some(cycle);
            }
        }
    }

    /// Memory disambiguation: a load may not start while any older store
    /// still holds an unknown address or the same address.
    fn load_blocked_by_older_store(&self, load_idx: usize) -> bool {
        let lb = &self.loads[load_idx];
        let Some(load_pos) = lb.instr else {
            return true;
        };
        let Some(load_addr) = lb.addr.value() else {
            return true;
        };

        for sb in &self.stores {
            if !sb.busy {
                continue;
            }
            let Some(store_pos) = sb.instr else { continue };
            if store_pos >= load_pos {
                continue;
            }
            match sb.addr.value() {
                None => return true,
                Some(store_addr) if store_addr == load_addr => return true,
                Some(_) => {}
            }
        }
        false
    }

    // ---------------------------------------------------------------
    // Micro-step 4: advance countdowns
    // ---------------------------------------------------------------

    /// Counts one execution cycle on every running unit; a countdown
    /// reaching zero stamps exec-end. Returns how many units ran.
    fn advance_executing(&mut self) -> usize {
        let cycle = self.cycle;
        let mut running = 0;

        for st in self
            .fp_add
            .iter_mut()
            .chain(self.fp_mul.iter_mut())
            .chain(self.int_alu.iter_mut())
        {
            if st.is_executing() {
                running += 1;
                st.remaining -= 1;
                if st.remaining == 0
                    && let Some(i) = st.instr
                {
                    self.timings[i].exec_end = Some(cycle);
                }
            }
        }
        for lb in &mut self.loads {
            if lb.is_executing() {
                running += 1;
                lb.remaining -= 1;
                if lb.remaining == 0
                    && let Some(i) = lb.instr
                {
                    self.timings[i].exec_end = Some(cycle);
                }
            }
        }
        for sb in &mut self.stores {
            if sb.is_executing() {
                running += 1;
                sb.remaining -= 1;
                if sb.remaining == 0
                    && let Some(i) = sb.instr
                {
                    self.timings[i].exec_end = Some(cycle);
                }
            }
        }
        running
    }

    // ---------------------------------------------------------------
    // Micro-step 5: issue
    // ---------------------------------------------------------------

    /// Issues at most one instruction. On a full slot class the PC holds
    /// and the same instruction retries next cycle.
    fn issue_one(&mut self) -> bool {
        if self.pc >= self.program.len() {
            return false;
        }
        if self.fetch_stalled {
            self.stats.branch_stalls += 1;
            return false;
        }

        let Some(instr) = self.program.get(self.pc).cloned() else {
            return false;
        };

        let placed = match instr.op.class() {
            OpClass::IntAlu if instr.op.is_branch() => self.issue_branch(&instr),
            OpClass::IntAlu => self.issue_int_imm(&instr),
            OpClass::FpAdd | OpClass::FpMul => self.issue_fp(&instr),
            OpClass::Load => self.issue_load(&instr),
            OpClass::Store => self.issue_store(&instr),
        };

        if placed {
            // A re-issued loop body starts a fresh dynamic instance.
            self.timings[instr.index].reset();
            self.timings[instr.index].issue = Some(self.cycle);
            self.pc += 1;
            if instr.op.is_branch() {
                self.fetch_stalled = true;
            }
        } else {
            self.stats.issue_stalls += 1;
        }
        placed
    }

    /// An integer source operand: the committed value, or the owner tag.
    fn int_operand(&self, reg: u8) -> Operand {
        match self.status.owner(reg as usize, false) {
            Some(tag) => Operand::Waiting(tag),
            None => Operand::Ready(self.regs.read_int(reg as usize)),
        }
    }

    /// An FP source operand: the committed value, or the owner tag.
    fn fp_operand(&self, reg: u8) -> Operand {
        match self.status.owner(reg as usize, true) {
            Some(tag) => Operand::Waiting(tag),
            None => Operand::Ready(self.regs.read_fp(reg as usize)),
        }
    }

    fn issue_int_imm(&mut self, instr: &Instruction) -> bool {
        let Some(idx) = free_slot(&self.int_alu) else {
            return false;
        };
        let j = self.int_operand(instr.rs);
        let st = &mut self.int_alu[idx];
        st.busy = true;
        st.op = Some(instr.op);
        st.instr = Some(instr.index);
        st.j = j;
        st.k = Operand::Ready(instr.imm);
        st.a = instr.imm;
        st.dest = Dest::Int(instr.rd);
        let tag = st.id;
        self.status.set_owner(instr.rd as usize, false, tag);
        true
    }

    fn issue_branch(&mut self, instr: &Instruction) -> bool {
        let Some(idx) = free_slot(&self.int_alu) else {
            return false;
        };
        let j = self.int_operand(instr.rs);
        let k = self.int_operand(instr.rt);
        let st = &mut self.int_alu[idx];
        st.busy = true;
        st.op = Some(instr.op);
        st.instr = Some(instr.index);
        st.j = j;
        st.k = k;
        st.a = instr.imm;
        st.dest = Dest::None;
        true
    }

    fn issue_fp(&mut self, instr: &Instruction) -> bool {
        let is_mul = instr.op.class() == OpClass::FpMul;
        let list = if is_mul { &self.fp_mul } else { &self.fp_add };
        let Some(idx) = free_slot(list) else {
            return false;
        };
        let j = self.fp_operand(instr.rs);
        let k = self.fp_operand(instr.rt);
        let st = if is_mul { &mut self.fp_mul[idx] } else { &mut self.fp_add[idx] };
        st.busy = true;
        st.op = Some(instr.op);
        st.instr = Some(instr.index);
        st.j = j;
        st.k = k;
        st.dest = Dest::Fp(instr.rd);
        let tag = st.id;
        self.status.set_owner(instr.rd as usize, true, tag);
        true
    }

    fn issue_load(&mut self, instr: &Instruction) -> bool {
        let Some(idx) = self.loads.iter().position(|l| !l.busy) else {
            return false;
        };
        let addr = match self.status.owner(instr.rs as usize, false) {
            Some(tag) => Operand::Waiting(tag),
            None => Operand::Ready(self.regs.read_int(instr.rs as usize).wrapping_add(instr.imm)),
        };
        let lb = &mut self.loads[idx];
        lb.busy = true;
        lb.op = Some(instr.op);
        lb.instr = Some(instr.index);
        lb.base = instr.rs;
        lb.offset = instr.imm;
        lb.addr = addr;
        lb.dest = if instr.mem_fp { Dest::Fp(instr.rd) } else { Dest::Int(instr.rd) };
        let tag = lb.id;
        self.status.set_owner(instr.rd as usize, instr.mem_fp, tag);
        true
    }

    fn issue_store(&mut self, instr: &Instruction) -> bool {
        let Some(idx) = self.stores.iter().position(|s| !s.busy) else {
            return false;
        };
        let addr = match self.status.owner(instr.rs as usize, false) {
            Some(tag) => Operand::Waiting(tag),
            None => Operand::Ready(self.regs.read_int(instr.rs as usize).wrapping_add(instr.imm)),
        };
        let value = if instr.mem_fp {
            self.fp_operand(instr.rd)
        } else {
            self.int_operand(instr.rd)
        };
        let sb = &mut self.stores[idx];
        sb.busy = true;
        sb.op = Some(instr.op);
        sb.instr = Some(instr.index);
        sb.base = instr.rs;
        sb.offset = instr.imm;
        sb.addr = addr;
        sb.value = value;
        true
    }

    // ---------------------------------------------------------------
    // Micro-step 6: snapshot, and restore for reverse stepping
    // ---------------------------------------------------------------

    /// Deep copy of the observable state.
    fn take_snapshot(&self) -> CycleState {
        CycleState {
            cycle: self.cycle,
            pc: self.pc,
            fetch_stalled: self.fetch_stalled,
            fp_add: self.fp_add.clone(),
            fp_mul: self.fp_mul.clone(),
            int_alu: self.int_alu.clone(),
            loads: self.loads.clone(),
            stores: self.stores.clone(),
            regs: self.regs.clone(),
            status: self.status.clone(),
            cache: self.cache.snapshot(),
            timings: self.timings.clone(),
        }
    }

    /// Restores every snapshotted field.
    fn restore(&mut self, state: &CycleState) {
        self.cycle = state.cycle;
        self.pc = state.pc;
        self.fetch_stalled = state.fetch_stalled;
        self.fp_add.clone_from(&state.fp_add);
        self.fp_mul.clone_from(&state.fp_mul);
        self.int_alu.clone_from(&state.int_alu);
        self.loads.clone_from(&state.loads);
        self.stores.clone_from(&state.stores);
        self.regs = state.regs.clone();
        self.status = state.status.clone();
        self.cache.restore(&state.cache);
        self.timings.clone_from(&state.timings);
    }

    fn all_stations(&self) -> impl Iterator<Item = &Station> {
        self.fp_add.iter().chain(&self.fp_mul).chain(&self.int_alu)
    }

    fn all_stations_mut(&mut self) -> impl Iterator<Item = &mut Station> {
        self.fp_add
            .iter_mut()
            .chain(self.fp_mul.iter_mut())
            .chain(self.int_alu.iter_mut())
    }
}

/// Computes a non-branch station result. All arithmetic is wrapping 64-bit
/// integer math; FP divide by zero yields 0.
fn alu_result(op: Opcode, vj: i64, vk: i64, a: i64) -> i64 {
    match op {
        Opcode::Addi => vj.wrapping_add(a),
        Opcode::Subi => vj.wrapping_sub(a),
        Opcode::FAdd(_) => vj.wrapping_add(vk),
        Opcode::FSub(_) => vj.wrapping_sub(vk),
        Opcode::FMul(_) => vj.wrapping_mul(vk),
        Opcode::FDiv(_) => {
            if vk == 0 {
                0
            } else {
                vj.wrapping_div(vk)
            }
        }
        // Branches are resolved separately; memory ops never occupy stations.
        Opcode::Beq | Opcode::Bne | Opcode::Load(_) | Opcode::Store(_) => 0,
    }
}

/// Whether a station may begin executing: occupied, idle, operands known,
/// and not already finished while waiting for the result bus.
fn station_can_start(st: &Station, timings: &[InstrTiming]) -> bool {
    st.busy
        && !st.is_executing()
        && st.operands_ready()
        && st.instr.is_some_and(|i| timings[i].exec_end.is_none())
}

/// Begins execution on a station, stamping exec-start on first start.
fn start_station(st: &mut Station, latency: u64, cycle: u64, timings: &mut [InstrTiming]) {
    st.latency = latency;
    st.remaining = latency;
    if let Some(i) = st.instr {
        let t = &mut timings[i];
        if t.exec_start.is_none() {
            t.exec_start = Some(cycle);
        }
    }
}

/// First free slot in a station list.
fn free_slot(stations: &[Station]) -> Option<usize> {
    stations.iter().position(|s| !s.busy)
}

/// Validates the decoded program's register indices.
fn validate_program(program: &Program) -> Result<(), SimError> {
    for instr in program.instructions() {
        if instr.rd >= 32 || instr.rs >= 32 || instr.rt >= 32 {
            return Err(SimError::BadProgram(format!(
                "register index out of range in `{}`",
                instr.text
            )));
        }
    }
    Ok(())
}
