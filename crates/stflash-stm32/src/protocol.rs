//! Flash controller register protocol
//!
//! All supported controllers follow the same sequence for any operation:
//! check that nothing is running, clear stale status flags, unlock with the
//! key sequence, start the operation through the control register, poll the
//! status register and finally lock again. A [`Protocol`] value captures
//! the register addresses and masks of one controller so the sequence only
//! has to be written once.

use stflash_core::{Error, Result, Target};

use crate::regs::{FLASH_KEY1, FLASH_KEY2};

/// Poll budget for a mass erase, in ticks of 1 ms
pub const MASS_ERASE_TICKS: u32 = 3000;
/// Poll budget for one sector erase
pub const SECTOR_ERASE_TICKS: u32 = 300;
/// Poll budget for one quad-word program
pub const PROGRAM_TICKS: u32 = 300;

/// Addresses of one controller's key, status, control and clear registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSet {
    /// Key register
    pub keyr: u32,
    /// Status register
    pub sr: u32,
    /// Control register
    pub cr: u32,
    /// Register the clear value is written to (SR itself on U5)
    pub ccr: u32,
}

/// Status pattern that ends a started operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Any of these bits set means the operation failed
    pub error_mask: u32,
    /// Bits compared against `done_value`
    pub done_mask: u32,
    /// Expected value of `SR & done_mask` once finished
    pub done_value: u32,
}

impl Completion {
    /// Classify a status register value
    pub fn check(&self, sr: u32) -> Option<Result<()>> {
        if sr & self.error_mask != 0 {
            Some(Err(Error::StatusError { status: sr }))
        } else if sr & self.done_mask == self.done_value {
            Some(Ok(()))
        } else {
            None
        }
    }
}

/// Register layout and bit masks of one flash controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Protocol {
    /// Register addresses
    pub regs: RegisterSet,
    /// CR lock bit; also the value written to lock
    pub lock_bit: u32,
    /// SR bits that are set while an operation is running
    pub busy_mask: u32,
    /// Value written to `regs.ccr` to clear status flags
    pub clear_value: u32,
    /// End-of-operation pattern
    pub completion: Completion,
}

/// Control register value between operations
pub const CR_IDLE: u32 = 0;

impl Protocol {
    /// Fail with [`Error::ResourceBusy`] if an operation is in progress
    pub fn check_idle<T: Target + ?Sized>(&self, target: &mut T) -> Result<()> {
        let sr = target.read_u32(self.regs.sr)?;
        if sr & self.busy_mask != 0 {
            log::error!("Operation in progress (SR=0x{:08X})", sr);
            return Err(Error::ResourceBusy);
        }
        Ok(())
    }

    /// Clear end-of-operation and error flags
    pub fn clear_error_flags<T: Target + ?Sized>(&self, target: &mut T) -> Result<()> {
        target.write_u32(self.regs.ccr, self.clear_value)
    }

    /// Unlock the control register
    ///
    /// Does nothing if it is already unlocked. A rejected key sequence locks
    /// the controller until the next reset.
    pub fn unlock<T: Target + ?Sized>(&self, target: &mut T) -> Result<()> {
        let cr = target.read_u32(self.regs.cr)?;
        if cr & self.lock_bit == 0 {
            return Ok(());
        }

        target.write_u32(self.regs.keyr, FLASH_KEY1)?;
        target.write_u32(self.regs.keyr, FLASH_KEY2)?;

        let cr = target.read_u32(self.regs.cr)?;
        if cr & self.lock_bit != 0 {
            log::error!("Flash controller locked until next reset (CR=0x{:08X})", cr);
            return Err(Error::LockedUntilReset);
        }
        log::debug!("Unlocked flash controller at 0x{:08X}", self.regs.cr);
        Ok(())
    }

    /// Set the lock bit
    pub fn lock<T: Target + ?Sized>(&self, target: &mut T) -> Result<()> {
        target.write_u32(self.regs.cr, self.lock_bit)
    }

    /// Poll the status register once per tick until the operation ends
    pub fn wait_for_eop<T: Target + ?Sized>(&self, target: &mut T, ticks: u32) -> Result<()> {
        for _ in 0..ticks {
            target.alive_sleep(1);
            let sr = target.read_u32(self.regs.sr)?;
            if let Some(result) = self.completion.check(sr) {
                if result.is_err() {
                    log::debug!("Flash operation failed, SR=0x{:08X}", sr);
                }
                return result;
            }
        }
        log::debug!("Flash operation still running after {} ms", ticks);
        Err(Error::Timeout)
    }

    /// Run `op` with the controller unlocked
    ///
    /// Nothing is written if the controller is busy or the flags cannot be
    /// cleared. Once unlocking has been attempted the controller is always
    /// locked again, and a failed lock does not change the result.
    pub fn with_unlocked<T, F>(&self, target: &mut T, op: F) -> Result<()>
    where
        T: Target + ?Sized,
        F: FnOnce(&mut T) -> Result<()>,
    {
        self.check_idle(target)?;
        self.clear_error_flags(target)?;

        let result = self.unlock(target).and_then(|()| op(target));

        if let Err(e) = self.lock(target) {
            log::debug!("Locking flash controller failed: {}", e);
        }
        result
    }

    /// Start an operation with `start` and wait for it to end
    ///
    /// The control register is returned to idle afterwards unless writing
    /// the start value already failed.
    pub fn run<T: Target + ?Sized>(&self, target: &mut T, start: u32, ticks: u32) -> Result<()> {
        target.write_u32(self.regs.cr, start)?;
        let result = self.wait_for_eop(target, ticks);
        self.idle(target);
        result
    }

    /// Best-effort write of the idle control value
    pub fn idle<T: Target + ?Sized>(&self, target: &mut T) {
        if let Err(e) = target.write_u32(self.regs.cr, CR_IDLE) {
            log::debug!("Resetting control register failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stflash_dummy::{Access, DummyTarget, KEY1, KEY2};

    const P: Protocol = Protocol {
        regs: RegisterSet {
            keyr: 0x100,
            sr: 0x104,
            cr: 0x108,
            ccr: 0x10C,
        },
        lock_bit: 0x1,
        busy_mask: 0xB,
        clear_value: 0x00FF_0000,
        completion: Completion {
            error_mask: 0x00FE_0000,
            done_mask: 0x0001_000B,
            done_value: 0x0001_0000,
        },
    };

    fn locked() -> DummyTarget {
        let mut t = DummyTarget::default();
        t.add_key_lock(P.regs.keyr, P.regs.cr, P.lock_bit);
        t
    }

    #[test]
    fn test_check_idle() {
        let mut t = DummyTarget::default();
        assert!(P.check_idle(&mut t).is_ok());

        t.set_register(P.regs.sr, 0x1);
        assert_eq!(P.check_idle(&mut t), Err(Error::ResourceBusy));
        assert!(t.writes_to(P.regs.cr).is_empty());
    }

    #[test]
    fn test_unlock_twice_sends_keys_once() {
        let mut t = locked();
        P.unlock(&mut t).unwrap();
        P.unlock(&mut t).unwrap();
        assert_eq!(t.writes_to(P.regs.keyr), vec![KEY1, KEY2]);
    }

    #[test]
    fn test_unlock_rejected() {
        let mut t = DummyTarget::default();
        t.add_stuck_key_lock(P.regs.keyr, P.regs.cr, P.lock_bit);
        assert_eq!(P.unlock(&mut t), Err(Error::LockedUntilReset));
    }

    #[test]
    fn test_completion_check() {
        assert_eq!(P.completion.check(0x0001_0000), Some(Ok(())));
        assert_eq!(P.completion.check(0x0001_0001), None);
        assert_eq!(P.completion.check(0), None);
        assert_eq!(
            P.completion.check(0x0002_0000),
            Some(Err(Error::StatusError { status: 0x0002_0000 }))
        );
    }

    #[test]
    fn test_wait_for_eop_counts_ticks() {
        let mut t = DummyTarget::default();
        t.push_reads(P.regs.sr, [0x1, 0x1]);
        t.set_register(P.regs.sr, 0x0001_0000);
        P.wait_for_eop(&mut t, 10).unwrap();
        assert_eq!(t.ticks(), 3);
        assert_eq!(t.reads_of(P.regs.sr), 3);
    }

    #[test]
    fn test_wait_for_eop_read_failure_aborts() {
        let mut t = DummyTarget::default();
        t.fail_reads_at(P.regs.sr);
        assert_eq!(
            P.wait_for_eop(&mut t, 10),
            Err(Error::RegisterRead { addr: P.regs.sr })
        );
        assert_eq!(t.ticks(), 1);
    }

    #[test]
    fn test_run_sequence() {
        let mut t = locked();
        t.set_register(P.regs.sr, 0x0001_0000);
        P.with_unlocked(&mut t, |t| P.run(t, 0x8020, 10)).unwrap();

        assert_eq!(t.writes_to(P.regs.ccr), vec![0x00FF_0000]);
        assert_eq!(t.writes_to(P.regs.cr), vec![0x8020, CR_IDLE, 0x1]);
        assert_eq!(t.register(P.regs.cr), 0x1);
    }

    #[test]
    fn test_lock_attempted_after_failed_unlock() {
        let mut t = DummyTarget::default();
        t.add_stuck_key_lock(P.regs.keyr, P.regs.cr, P.lock_bit);
        let mut ran = false;
        let result = P.with_unlocked(&mut t, |_| {
            ran = true;
            Ok(())
        });
        assert_eq!(result, Err(Error::LockedUntilReset));
        assert!(!ran);
        assert_eq!(t.writes_to(P.regs.cr), vec![0x1]);
    }

    #[test]
    fn test_failed_start_write_skips_idle() {
        let mut t = locked();
        t.fail_writes_at(P.regs.cr);
        let result = P.with_unlocked(&mut t, |t| P.run(t, 0x8020, 10));
        assert_eq!(result, Err(Error::RegisterWrite { addr: P.regs.cr }));
        assert_eq!(t.reads_of(P.regs.sr), 1);
        assert!(!t
            .journal()
            .iter()
            .any(|a| matches!(a, Access::Write { addr, .. } if *addr == P.regs.cr)));
    }

    #[test]
    fn test_clear_failure_stops_early() {
        let mut t = locked();
        t.fail_writes_at(P.regs.ccr);
        let result = P.with_unlocked(&mut t, |_| Ok(()));
        assert_eq!(result, Err(Error::RegisterWrite { addr: P.regs.ccr }));
        assert!(t.writes_to(P.regs.keyr).is_empty());
        assert!(t.writes_to(P.regs.cr).is_empty());
    }
}
