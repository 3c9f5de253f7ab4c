//! stflash-dummy - Register-level microcontroller emulator for testing
//!
//! This crate provides a dummy [`Target`] that keeps a sparse 32-bit
//! register file in memory. Status registers can be scripted with a
//! sequence of values, key registers can be wired to a lock bit the way
//! flash controllers do it, and every access is journaled so tests can
//! check the exact register traffic a driver produced.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use stflash_core::error::{Error, Result};
use stflash_core::target::{ArmArch, Target};

/// First key the emulated controllers expect
pub const KEY1: u32 = 0x4567_0123;
/// Second key the emulated controllers expect
pub const KEY2: u32 = 0xCDEF_89AB;

/// Configuration for the dummy target
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Reported core architecture, `None` for a non-ARM target
    pub arch: Option<ArmArch>,
    /// Whether the core is halted
    pub halted: bool,
    /// Whether the target has been examined
    pub examined: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            arch: Some(ArmArch::V8M),
            halted: true,
            examined: true,
        }
    }
}

/// One journaled access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// 32-bit register read and the value returned
    Read { addr: u32, value: u32 },
    /// 32-bit register write
    Write { addr: u32, value: u32 },
    /// Block memory write
    WriteMemory { addr: u32, unit_size: u32, units: u32 },
}

/// Key register wired to a lock bit in a control register
#[derive(Debug, Clone)]
struct KeyLock {
    keyr: u32,
    cr: u32,
    lock_bit: u32,
    /// Set once a wrong key was written; only a reset clears it
    stuck: bool,
    got_key1: bool,
}

/// Dummy target
///
/// Unwritten registers read as zero.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone)]
pub struct DummyTarget {
    config: DummyConfig,
    regs: BTreeMap<u32, u32>,
    scripts: BTreeMap<u32, VecDeque<u32>>,
    key_locks: Vec<KeyLock>,
    failing_reads: BTreeSet<u32>,
    failing_writes: BTreeSet<u32>,
    write_one_to_clear: BTreeSet<u32>,
    triggers: Vec<(u32, u32, u32)>,
    fail_memory_writes: bool,
    memory: Vec<(u32, Vec<u8>)>,
    journal: Vec<Access>,
    ticks: u64,
}

#[cfg(feature = "alloc")]
impl DummyTarget {
    /// Create a new dummy target with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            config,
            regs: BTreeMap::new(),
            scripts: BTreeMap::new(),
            key_locks: Vec::new(),
            failing_reads: BTreeSet::new(),
            failing_writes: BTreeSet::new(),
            write_one_to_clear: BTreeSet::new(),
            triggers: Vec::new(),
            fail_memory_writes: false,
            memory: Vec::new(),
            journal: Vec::new(),
            ticks: 0,
        }
    }

    /// Create a halted, examined target of the given architecture
    pub fn with_arch(arch: ArmArch) -> Self {
        Self::new(DummyConfig {
            arch: Some(arch),
            ..DummyConfig::default()
        })
    }

    /// Set a register value without journaling it
    pub fn set_register(&mut self, addr: u32, value: u32) {
        self.regs.insert(addr, value);
    }

    /// Current register value, without journaling the access
    pub fn register(&self, addr: u32) -> u32 {
        self.regs.get(&addr).copied().unwrap_or(0)
    }

    /// Queue values returned by the next reads of `addr`
    ///
    /// Once the queue is drained reads fall back to the stored register value.
    pub fn push_reads<I: IntoIterator<Item = u32>>(&mut self, addr: u32, values: I) {
        self.scripts.entry(addr).or_default().extend(values);
    }

    /// Wire `keyr` to `lock_bit` of `cr` and start out locked
    ///
    /// Writing the two keys in order clears the lock bit. A wrong key
    /// leaves the controller locked until [`reset`](Self::reset).
    pub fn add_key_lock(&mut self, keyr: u32, cr: u32, lock_bit: u32) {
        let value = self.register(cr) | lock_bit;
        self.regs.insert(cr, value);
        self.key_locks.push(KeyLock {
            keyr,
            cr,
            lock_bit,
            stuck: false,
            got_key1: false,
        });
    }

    /// Like [`add_key_lock`](Self::add_key_lock) but the keys are never accepted
    pub fn add_stuck_key_lock(&mut self, keyr: u32, cr: u32, lock_bit: u32) {
        self.add_key_lock(keyr, cr, lock_bit);
        if let Some(lock) = self.key_locks.last_mut() {
            lock.stuck = true;
        }
    }

    /// Treat `addr` as a status register whose bits are cleared by writing ones
    pub fn set_write_one_to_clear(&mut self, addr: u32) {
        self.write_one_to_clear.insert(addr);
    }

    /// Store `value` at `addr` whenever `trigger` is written
    ///
    /// Models a controller that finishes every operation instantly.
    pub fn on_write(&mut self, trigger: u32, addr: u32, value: u32) {
        self.triggers.push((trigger, addr, value));
    }

    /// Make every read of `addr` fail
    pub fn fail_reads_at(&mut self, addr: u32) {
        self.failing_reads.insert(addr);
    }

    /// Make every write of `addr` fail
    pub fn fail_writes_at(&mut self, addr: u32) {
        self.failing_writes.insert(addr);
    }

    /// Make every block memory write fail
    pub fn fail_memory_writes(&mut self) {
        self.fail_memory_writes = true;
    }

    /// Halt or resume the core
    pub fn set_halted(&mut self, halted: bool) {
        self.config.halted = halted;
    }

    /// Mark the target as examined or not
    pub fn set_examined(&mut self, examined: bool) {
        self.config.examined = examined;
    }

    /// Clear stuck key locks, as a system reset would
    pub fn reset(&mut self) {
        for lock in &mut self.key_locks {
            lock.stuck = false;
            lock.got_key1 = false;
            let value = self.regs.get(&lock.cr).copied().unwrap_or(0) | lock.lock_bit;
            self.regs.insert(lock.cr, value);
        }
    }

    /// All accesses so far, in order
    pub fn journal(&self) -> &[Access] {
        &self.journal
    }

    /// Forget all journaled accesses and ticks
    pub fn clear_journal(&mut self) {
        self.journal.clear();
        self.ticks = 0;
    }

    /// Values written to `addr`, in order
    pub fn writes_to(&self, addr: u32) -> Vec<u32> {
        self.journal
            .iter()
            .filter_map(|access| match *access {
                Access::Write { addr: a, value } if a == addr => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Number of reads of `addr`
    pub fn reads_of(&self, addr: u32) -> usize {
        self.journal
            .iter()
            .filter(|access| matches!(access, Access::Read { addr: a, .. } if *a == addr))
            .count()
    }

    /// Milliseconds spent in [`Target::alive_sleep`]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Blocks written with [`Target::write_memory`], in order
    pub fn memory_blocks(&self) -> &[(u32, Vec<u8>)] {
        &self.memory
    }

    fn apply_key(&mut self, addr: u32, value: u32) {
        for lock in self.key_locks.iter_mut().filter(|l| l.keyr == addr) {
            let accepted = if lock.got_key1 {
                lock.got_key1 = false;
                value == KEY2
            } else {
                lock.got_key1 = value == KEY1;
                lock.got_key1
            };

            if !accepted {
                lock.stuck = true;
                continue;
            }
            if lock.got_key1 || lock.stuck {
                continue;
            }

            let cr = self.regs.get(&lock.cr).copied().unwrap_or(0) & !lock.lock_bit;
            self.regs.insert(lock.cr, cr);
            log::trace!("dummy: unlocked control register 0x{:08X}", lock.cr);
        }
    }
}

#[cfg(feature = "alloc")]
impl Default for DummyTarget {
    fn default() -> Self {
        Self::new(DummyConfig::default())
    }
}

#[cfg(feature = "alloc")]
impl Target for DummyTarget {
    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        if self.failing_reads.contains(&addr) {
            return Err(Error::RegisterRead { addr });
        }
        let scripted = self.scripts.get_mut(&addr).and_then(|q| q.pop_front());
        let value = scripted.unwrap_or_else(|| self.register(addr));
        self.journal.push(Access::Read { addr, value });
        Ok(value)
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        if self.failing_writes.contains(&addr) {
            return Err(Error::RegisterWrite { addr });
        }
        self.journal.push(Access::Write { addr, value });
        if self.key_locks.iter().any(|l| l.keyr == addr) {
            self.apply_key(addr, value);
        } else if self.write_one_to_clear.contains(&addr) {
            let cleared = self.register(addr) & !value;
            self.regs.insert(addr, cleared);
        } else {
            self.regs.insert(addr, value);
        }
        for &(trigger, target, result) in &self.triggers {
            if trigger == addr {
                self.regs.insert(target, result);
            }
        }
        Ok(())
    }

    fn write_memory(&mut self, addr: u32, unit_size: u32, units: u32, data: &[u8]) -> Result<()> {
        if self.fail_memory_writes || data.len() != (unit_size * units) as usize {
            return Err(Error::MemoryWrite { addr });
        }
        self.journal.push(Access::WriteMemory {
            addr,
            unit_size,
            units,
        });
        self.memory.push((addr, data.to_vec()));
        Ok(())
    }

    fn is_halted(&self) -> bool {
        self.config.halted
    }

    fn was_examined(&self) -> bool {
        self.config.examined
    }

    fn arch(&self) -> Option<ArmArch> {
        self.config.arch
    }

    fn alive_sleep(&mut self, ms: u32) {
        self.ticks += u64::from(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYR: u32 = 0x4002_2004;
    const CR: u32 = 0x4002_2028;

    #[test]
    fn test_unwritten_registers_read_zero() {
        let mut t = DummyTarget::default();
        assert_eq!(t.read_u32(0x4002_2020).unwrap(), 0);
        assert_eq!(t.reads_of(0x4002_2020), 1);
    }

    #[test]
    fn test_scripted_reads_then_fallback() {
        let mut t = DummyTarget::default();
        t.set_register(0x10, 7);
        t.push_reads(0x10, [1, 2]);
        assert_eq!(t.read_u32(0x10).unwrap(), 1);
        assert_eq!(t.read_u32(0x10).unwrap(), 2);
        assert_eq!(t.read_u32(0x10).unwrap(), 7);
    }

    #[test]
    fn test_key_sequence_unlocks() {
        let mut t = DummyTarget::default();
        t.add_key_lock(KEYR, CR, 1);
        assert_eq!(t.register(CR), 1);

        t.write_u32(KEYR, KEY1).unwrap();
        assert_eq!(t.register(CR), 1);
        t.write_u32(KEYR, KEY2).unwrap();
        assert_eq!(t.register(CR), 0);

        // Relocking is a plain CR write
        t.write_u32(CR, 1).unwrap();
        assert_eq!(t.register(CR), 1);
    }

    #[test]
    fn test_wrong_key_sticks_until_reset() {
        let mut t = DummyTarget::default();
        t.add_key_lock(KEYR, CR, 1);

        t.write_u32(KEYR, KEY2).unwrap();
        t.write_u32(KEYR, KEY1).unwrap();
        t.write_u32(KEYR, KEY2).unwrap();
        assert_eq!(t.register(CR), 1);

        t.reset();
        t.write_u32(KEYR, KEY1).unwrap();
        t.write_u32(KEYR, KEY2).unwrap();
        assert_eq!(t.register(CR), 0);
    }

    #[test]
    fn test_failures_and_memory() {
        let mut t = DummyTarget::default();
        t.fail_reads_at(0x20);
        t.fail_writes_at(0x24);
        assert_eq!(t.read_u32(0x20), Err(Error::RegisterRead { addr: 0x20 }));
        assert_eq!(t.write_u32(0x24, 0), Err(Error::RegisterWrite { addr: 0x24 }));

        t.write_memory(0x0800_0000, 4, 4, &[0xAA; 16]).unwrap();
        assert_eq!(t.memory_blocks()[0].0, 0x0800_0000);
        assert!(t.write_memory(0x0800_0010, 4, 4, &[0; 8]).is_err());
    }

    #[test]
    fn test_write_one_to_clear() {
        let mut t = DummyTarget::default();
        t.set_write_one_to_clear(0x20);
        t.set_register(0x20, 0x0001_0003);
        t.write_u32(0x20, 0x1).unwrap();
        assert_eq!(t.register(0x20), 0x0001_0002);
    }

    #[test]
    fn test_write_trigger() {
        let mut t = DummyTarget::default();
        t.on_write(CR, 0x4002_2020, 0x1);
        t.write_u32(CR, 0x0001_8004).unwrap();
        assert_eq!(t.register(0x4002_2020), 0x1);
    }

    #[test]
    fn test_ticks() {
        let mut t = DummyTarget::default();
        t.alive_sleep(1);
        t.alive_sleep(1);
        assert_eq!(t.ticks(), 2);
        t.clear_journal();
        assert_eq!(t.ticks(), 0);
    }
}
