//! Simulation statistics collection and reporting.
//!
//! Tracks counters the engine accumulates while stepping:
//! 1. **Progress:** Cycles stepped, instructions issued, write-backs, store commits.
//! 2. **Stalls:** Issue attempts blocked on full stations and cycles spent
//!    fetch-stalled behind a branch.
//! 3. **Memory:** Data cache hits and misses (sourced from the cache).
//!
//! Counters run forward only; reverse stepping does not unwind them.

/// Running counters for one simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Cycles stepped.
    pub cycles: u64,
    /// Instructions placed into a station or buffer.
    pub instructions_issued: u64,
    /// Result-bus transactions performed.
    pub writebacks: u64,
    /// Stores committed to memory.
    pub stores_committed: u64,
    /// Cycles an instruction was available but no slot was free.
    pub issue_stalls: u64,
    /// Cycles issue was held behind an unresolved branch.
    pub branch_stalls: u64,
}

impl SimStats {
    /// Prints the full report to stdout.
    ///
    /// Cache counters are passed in because the cache owns them.
    pub fn print(&self, cache_hits: u64, cache_misses: u64) {
        let cycles = if self.cycles == 0 { 1 } else { self.cycles };

        println!("==================================================");
        println!("TOMASULO SIMULATION STATISTICS");
        println!("==================================================");
        println!("cycles                 {}", self.cycles);
        println!("instructions_issued    {}", self.instructions_issued);
        println!(
            "ipc                    {:.4}",
            self.instructions_issued as f64 / cycles as f64
        );
        println!("--------------------------------------------------");
        println!("PIPELINE");
        println!("  writebacks           {}", self.writebacks);
        println!("  stores_committed     {}", self.stores_committed);
        println!(
            "  stalls.issue         {} ({:.2}%)",
            self.issue_stalls,
            (self.issue_stalls as f64 / cycles as f64) * 100.0
        );
        println!(
            "  stalls.branch        {} ({:.2}%)",
            self.branch_stalls,
            (self.branch_stalls as f64 / cycles as f64) * 100.0
        );
        println!("--------------------------------------------------");
        let accesses = cache_hits + cache_misses;
        let miss_rate = if accesses > 0 {
            (cache_misses as f64 / accesses as f64) * 100.0
        } else {
            0.0
        };
        println!("DATA CACHE");
        println!("  accesses             {}", accesses);
        println!("  hits                 {}", cache_hits);
        println!("  misses               {}", cache_misses);
        println!("  miss_rate            {:.2}%", miss_rate);
        println!("==================================================");
    }
}
