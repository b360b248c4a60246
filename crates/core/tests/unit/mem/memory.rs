//! # Backing Store Tests
//!
//! Verifies the byte-addressable memory: big-endian word and doubleword
//! accessors, sign extension, bounds checking, and reset.

use tomasulo_core::SimError;
use tomasulo_core::mem::memory::Memory;

#[test]
fn word_round_trip_is_big_endian() {
    let mut mem = Memory::new();
    mem.store_word(4, 0x0102_0304).unwrap();
    assert_eq!(mem.load_word(4).unwrap(), 0x0102_0304);
    // Big-endian byte order: most significant byte first.
    assert_eq!(mem.load_word(5).unwrap(), 0x0203_0400);
}

#[test]
fn word_load_sign_extends() {
    let mut mem = Memory::new();
    mem.store_word(0, -5).unwrap();
    assert_eq!(mem.load_word(0).unwrap(), -5);
}

#[test]
fn word_store_truncates_to_32_bits() {
    let mut mem = Memory::new();
    mem.store_word(0, 0x0000_0001_0000_0002).unwrap();
    assert_eq!(mem.load_word(0).unwrap(), 2);
}

#[test]
fn double_round_trip() {
    let mut mem = Memory::new();
    let value = 0x0102_0304_0506_0708;
    mem.store_double(8, value).unwrap();
    assert_eq!(mem.load_double(8).unwrap(), value);
    // The high word sits at the lower address.
    assert_eq!(mem.load_word(8).unwrap(), 0x0102_0304);
}

#[test]
fn negative_double_round_trip() {
    let mut mem = Memory::new();
    mem.store_double(16, -1234).unwrap();
    assert_eq!(mem.load_double(16).unwrap(), -1234);
}

#[test]
fn rejects_out_of_bounds() {
    let mut mem = Memory::new();
    let len = mem.len() as i64;
    assert_eq!(
        mem.load_word(len - 2),
        Err(SimError::OutOfBounds { addr: len - 2, size: 4 })
    );
    assert!(mem.store_double(len - 7, 1).is_err());
    assert!(mem.load_word(-4).is_err());
    // The last fully contained access is fine.
    assert!(mem.load_double(len - 8).is_ok());
}

#[test]
fn default_size_is_4_kib() {
    assert_eq!(Memory::new().len(), 4096);
    assert_eq!(Memory::with_size(64).len(), 64);
}

#[test]
fn reset_zeroes_contents() {
    let mut mem = Memory::new();
    mem.store_double(0, 99).unwrap();
    mem.reset();
    assert_eq!(mem.load_double(0).unwrap(), 0);
}
