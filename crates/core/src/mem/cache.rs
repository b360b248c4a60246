//! Set-associative, metadata-only data cache.
//!
//! The cache is write-through with no write-allocate, so the backing store
//! is always authoritative and lines carry no data bytes; only valid bits,
//! tags, and LRU stamps are modeled. For a given address:
//!
//! ```text
//! block = addr / block_size
//! set   = block % num_sets
//! tag   = block / num_sets
//! ```
//!
//! Replacement picks the first invalid way, otherwise the way with the
//! smallest LRU stamp. Stamps are drawn from a cache-wide access counter
//! that advances on every mutating access.
//!
//! Timing and state are split across two calls: [`Cache::probe_latency`] is
//! a pure lookup the engine uses to size an execution window before a
//! load/store starts, and [`Cache::load`] / [`Cache::store`] perform the
//! access (and the hit/miss accounting) when the operation completes.

use crate::common::error::SimError;
use crate::config::CacheConfig;
use crate::mem::memory::Memory;

/// Metadata of one cache line; no data bytes are held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheLine {
    /// Whether this line holds a block.
    pub valid: bool,
    /// Tag of the held block.
    pub tag: u64,
    /// LRU stamp; smaller means less recently used.
    pub lru: u64,
}

/// By-value copy of all cache metadata, for snapshots and display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheSnapshot {
    /// All lines, `num_sets * ways` entries, set-major.
    pub lines: Vec<CacheLine>,
    /// Number of sets.
    pub num_sets: usize,
    /// Ways per set.
    pub ways: usize,
    /// Cache-wide access counter backing the LRU stamps.
    pub accesses: u64,
    /// Hit count.
    pub hits: u64,
    /// Miss count.
    pub misses: u64,
}

/// The data cache, owning the backing store it reads through to.
#[derive(Clone, Debug)]
pub struct Cache {
    block_size: usize,
    num_sets: usize,
    ways: usize,
    hit_latency: u64,
    miss_penalty: u64,
    lines: Vec<CacheLine>,
    accesses: u64,
    hits: u64,
    misses: u64,
    mem: Memory,
}

impl Cache {
    /// Builds a cache around `mem` from the given geometry and latencies.
    ///
    /// Fails with [`SimError::BadConfig`] when any parameter is zero or the
    /// size is not an exact multiple of `block_size * associativity`.
    pub fn new(cfg: &CacheConfig, mem: Memory) -> Result<Self, SimError> {
        if cfg.size == 0 || cfg.block_size == 0 || cfg.associativity == 0 {
            return Err(SimError::BadConfig(
                "cache size, block size, and associativity must be positive".to_string(),
            ));
        }
        if cfg.hit_latency == 0 || cfg.miss_penalty == 0 {
            return Err(SimError::BadConfig(
                "cache latencies must be positive".to_string(),
            ));
        }
        let line_bytes = cfg.block_size * cfg.associativity;
        if cfg.size % line_bytes != 0 {
            return Err(SimError::BadConfig(format!(
                "cache size {} is not divisible by block_size * associativity = {}",
                cfg.size, line_bytes
            )));
        }

        let num_sets = cfg.size / line_bytes;
        Ok(Self {
            block_size: cfg.block_size,
            num_sets,
            ways: cfg.associativity,
            hit_latency: cfg.hit_latency,
            miss_penalty: cfg.miss_penalty,
            lines: vec![CacheLine::default(); num_sets * cfg.associativity],
            accesses: 0,
            hits: 0,
            misses: 0,
            mem,
        })
    }

    /// Number of sets.
    pub fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Ways per set.
    pub fn ways(&self) -> usize {
        self.ways
    }

    /// Hit count so far.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Miss count so far.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Shared access to the backing store.
    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Mutable access to the backing store (preloading test data).
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    /// Splits an address into (set index, tag).
    fn locate(&self, addr: i64) -> (usize, u64) {
        let block = (addr as u64) / self.block_size as u64;
        let set = (block % self.num_sets as u64) as usize;
        let tag = block / self.num_sets as u64;
        (set, tag)
    }

    /// The way holding `tag` in `set`, if present and valid.
    fn find(&self, set: usize, tag: u64) -> Option<usize> {
        let base = set * self.ways;
        (0..self.ways).find(|&w| {
            let line = &self.lines[base + w];
            line.valid && line.tag == tag
        })
    }

    /// Victim selection: first invalid way, else the smallest LRU stamp.
    fn victim(&self, set: usize) -> usize {
        let base = set * self.ways;
        let mut chosen = 0;
        let mut oldest = u64::MAX;
        for w in 0..self.ways {
            let line = &self.lines[base + w];
            if !line.valid {
                return w;
            }
            if line.lru < oldest {
                oldest = line.lru;
                chosen = w;
            }
        }
        chosen
    }

    /// Expected latency of accessing `addr`, without touching any state.
    ///
    /// Returns the hit latency when the block is resident, otherwise hit
    /// latency plus miss penalty.
    pub fn probe_latency(&self, addr: i64) -> u64 {
        let (set, tag) = self.locate(addr);
        if self.find(set, tag).is_some() {
            self.hit_latency
        } else {
            self.hit_latency + self.miss_penalty
        }
    }

    /// Performs a load, updating LRU state and hit/miss counters, and reads
    /// the value through from the backing store.
    ///
    /// Latency is not reported here; the engine has already modeled it from
    /// [`Cache::probe_latency`] when the load started executing.
    pub fn load(&mut self, addr: i64, is_double: bool) -> Result<i64, SimError> {
        let (set, tag) = self.locate(addr);
        self.accesses += 1;

        match self.find(set, tag) {
            Some(way) => {
                self.lines[set * self.ways + way].lru = self.accesses;
                self.hits += 1;
            }
            None => {
                self.misses += 1;
                let way = self.victim(set);
                self.lines[set * self.ways + way] = CacheLine {
                    valid: true,
                    tag,
                    lru: self.accesses,
                };
            }
        }

        if is_double {
            self.mem.load_double(addr)
        } else {
            self.mem.load_word(addr)
        }
    }

    /// Performs a store: write-through on hit, write-through without
    /// allocation on miss.
    pub fn store(&mut self, addr: i64, value: i64, is_double: bool) -> Result<(), SimError> {
        let (set, tag) = self.locate(addr);
        self.accesses += 1;

        match self.find(set, tag) {
            Some(way) => {
                self.lines[set * self.ways + way].lru = self.accesses;
                self.hits += 1;
            }
            None => self.misses += 1,
        }

        if is_double {
            self.mem.store_double(addr, value)
        } else {
            self.mem.store_word(addr, value)
        }
    }

    /// By-value copy of all metadata.
    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            lines: self.lines.clone(),
            num_sets: self.num_sets,
            ways: self.ways,
            accesses: self.accesses,
            hits: self.hits,
            misses: self.misses,
        }
    }

    /// Restores metadata from a snapshot taken on this cache.
    pub fn restore(&mut self, snap: &CacheSnapshot) {
        self.lines.clone_from(&snap.lines);
        self.accesses = snap.accesses;
        self.hits = snap.hits;
        self.misses = snap.misses;
    }

    /// Invalidates every line and clears the counters.
    pub fn reset(&mut self) {
        self.lines.fill(CacheLine::default());
        self.accesses = 0;
        self.hits = 0;
        self.misses = 0;
    }
}
