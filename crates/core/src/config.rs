//! Simulator configuration.
//!
//! This module defines the structures that parameterize an engine. It
//! provides:
//! 1. **Defaults:** Baseline station counts, latencies, and cache geometry.
//! 2. **Structures:** Hierarchical config for stations, latencies, and cache.
//! 3. **Validation:** Explicit positivity and geometry checks at construction.
//!
//! Configuration is supplied as JSON (every field is optional and falls back
//! to its default) or via `SimConfig::default()`.

use serde::Deserialize;

use crate::common::error::SimError;

/// Default configuration constants.
mod defaults {
    /// FP add/sub reservation stations.
    pub const FP_ADD_STATIONS: usize = 3;

    /// FP mul/div reservation stations.
    pub const FP_MUL_STATIONS: usize = 2;

    /// Integer ALU reservation stations (immediates and branches).
    pub const INT_ALU_STATIONS: usize = 3;

    /// Load buffers.
    pub const LOAD_BUFFERS: usize = 3;

    /// Store buffers.
    pub const STORE_BUFFERS: usize = 3;

    /// FP add/sub latency in cycles.
    pub const FP_ADD_LATENCY: u64 = 2;

    /// FP multiply latency in cycles.
    pub const FP_MUL_LATENCY: u64 = 4;

    /// FP divide latency in cycles.
    pub const FP_DIV_LATENCY: u64 = 40;

    /// Integer ALU latency in cycles.
    pub const INT_ALU_LATENCY: u64 = 1;

    /// Load base latency; the probed cache latency is added on top.
    pub const LOAD_BASE_LATENCY: u64 = 2;

    /// Store base latency; the probed cache latency is added on top.
    pub const STORE_BASE_LATENCY: u64 = 2;

    /// Total cache size in bytes.
    pub const CACHE_SIZE: usize = 1024;

    /// Cache block (line) size in bytes.
    pub const BLOCK_SIZE: usize = 16;

    /// Cache associativity (ways per set).
    pub const ASSOCIATIVITY: usize = 2;

    /// Cache hit latency in cycles.
    pub const HIT_LATENCY: u64 = 1;

    /// Additional cycles on a cache miss.
    pub const MISS_PENALTY: u64 = 10;
}

/// Root configuration for one engine.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SimConfig {
    /// Station and buffer counts per category.
    #[serde(default)]
    pub stations: StationConfig,

    /// Execution latencies per operation class.
    #[serde(default)]
    pub latency: LatencyConfig,

    /// Data cache geometry and timing.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl SimConfig {
    /// Checks every parameter for positivity.
    ///
    /// Cache geometry divisibility is checked where the cache is built; this
    /// covers everything else so an engine fails loudly before any state is
    /// allocated.
    pub fn validate(&self) -> Result<(), SimError> {
        let s = &self.stations;
        for (count, what) in [
            (s.fp_add, "fp_add station count"),
            (s.fp_mul, "fp_mul station count"),
            (s.int_alu, "int_alu station count"),
            (s.load, "load buffer count"),
            (s.store, "store buffer count"),
        ] {
            if count == 0 {
                return Err(SimError::BadConfig(format!("{} must be positive", what)));
            }
            // Slot indices live in a u8 inside producer tags.
            if count > 256 {
                return Err(SimError::BadConfig(format!("{} exceeds 256", what)));
            }
        }

        let l = &self.latency;
        for (lat, what) in [
            (l.fp_add, "fp_add latency"),
            (l.fp_mul, "fp_mul latency"),
            (l.fp_div, "fp_div latency"),
            (l.int_alu, "int_alu latency"),
            (l.load_base, "load base latency"),
            (l.store_base, "store base latency"),
        ] {
            if lat == 0 {
                return Err(SimError::BadConfig(format!("{} must be positive", what)));
            }
        }

        Ok(())
    }
}

/// Reservation station and buffer counts.
#[derive(Clone, Debug, Deserialize)]
pub struct StationConfig {
    /// FP add/sub stations.
    #[serde(default = "StationConfig::default_fp_add")]
    pub fp_add: usize,

    /// FP mul/div stations.
    #[serde(default = "StationConfig::default_fp_mul")]
    pub fp_mul: usize,

    /// Integer ALU stations.
    #[serde(default = "StationConfig::default_int_alu")]
    pub int_alu: usize,

    /// Load buffers.
    #[serde(default = "StationConfig::default_load")]
    pub load: usize,

    /// Store buffers.
    #[serde(default = "StationConfig::default_store")]
    pub store: usize,
}

impl StationConfig {
    fn default_fp_add() -> usize {
        defaults::FP_ADD_STATIONS
    }

    fn default_fp_mul() -> usize {
        defaults::FP_MUL_STATIONS
    }

    fn default_int_alu() -> usize {
        defaults::INT_ALU_STATIONS
    }

    fn default_load() -> usize {
        defaults::LOAD_BUFFERS
    }

    fn default_store() -> usize {
        defaults::STORE_BUFFERS
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            fp_add: defaults::FP_ADD_STATIONS,
            fp_mul: defaults::FP_MUL_STATIONS,
            int_alu: defaults::INT_ALU_STATIONS,
            load: defaults::LOAD_BUFFERS,
            store: defaults::STORE_BUFFERS,
        }
    }
}

/// Execution latencies in cycles.
#[derive(Clone, Debug, Deserialize)]
pub struct LatencyConfig {
    /// FP add/sub (`ADD.S`, `ADD.D`, `SUB.S`, `SUB.D`).
    #[serde(default = "LatencyConfig::default_fp_add")]
    pub fp_add: u64,

    /// FP multiply (`MUL.S`, `MUL.D`).
    #[serde(default = "LatencyConfig::default_fp_mul")]
    pub fp_mul: u64,

    /// FP divide (`DIV.S`, `DIV.D`).
    #[serde(default = "LatencyConfig::default_fp_div")]
    pub fp_div: u64,

    /// Integer ALU (`ADDI`, `SUBI`, `BEQ`, `BNE`).
    #[serde(default = "LatencyConfig::default_int_alu")]
    pub int_alu: u64,

    /// Load base; the probed cache latency is added per access.
    #[serde(default = "LatencyConfig::default_load_base")]
    pub load_base: u64,

    /// Store base; the probed cache latency is added per access.
    #[serde(default = "LatencyConfig::default_store_base")]
    pub store_base: u64,
}

impl LatencyConfig {
    fn default_fp_add() -> u64 {
        defaults::FP_ADD_LATENCY
    }

    fn default_fp_mul() -> u64 {
        defaults::FP_MUL_LATENCY
    }

    fn default_fp_div() -> u64 {
        defaults::FP_DIV_LATENCY
    }

    fn default_int_alu() -> u64 {
        defaults::INT_ALU_LATENCY
    }

    fn default_load_base() -> u64 {
        defaults::LOAD_BASE_LATENCY
    }

    fn default_store_base() -> u64 {
        defaults::STORE_BASE_LATENCY
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            fp_add: defaults::FP_ADD_LATENCY,
            fp_mul: defaults::FP_MUL_LATENCY,
            fp_div: defaults::FP_DIV_LATENCY,
            int_alu: defaults::INT_ALU_LATENCY,
            load_base: defaults::LOAD_BASE_LATENCY,
            store_base: defaults::STORE_BASE_LATENCY,
        }
    }
}

/// Data cache geometry and timing.
#[derive(Clone, Debug, Deserialize)]
pub struct CacheConfig {
    /// Total size in bytes.
    #[serde(default = "CacheConfig::default_size")]
    pub size: usize,

    /// Block (line) size in bytes.
    #[serde(default = "CacheConfig::default_block_size")]
    pub block_size: usize,

    /// Ways per set (1 = direct-mapped).
    #[serde(default = "CacheConfig::default_associativity")]
    pub associativity: usize,

    /// Cycles for a hit.
    #[serde(default = "CacheConfig::default_hit_latency")]
    pub hit_latency: u64,

    /// Additional cycles for a miss.
    #[serde(default = "CacheConfig::default_miss_penalty")]
    pub miss_penalty: u64,
}

impl CacheConfig {
    fn default_size() -> usize {
        defaults::CACHE_SIZE
    }

    fn default_block_size() -> usize {
        defaults::BLOCK_SIZE
    }

    fn default_associativity() -> usize {
        defaults::ASSOCIATIVITY
    }

    fn default_hit_latency() -> u64 {
        defaults::HIT_LATENCY
    }

    fn default_miss_penalty() -> u64 {
        defaults::MISS_PENALTY
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size: defaults::CACHE_SIZE,
            block_size: defaults::BLOCK_SIZE,
            associativity: defaults::ASSOCIATIVITY,
            hit_latency: defaults::HIT_LATENCY,
            miss_penalty: defaults::MISS_PENALTY,
        }
    }
}
