//! STM32H7 flash controller
//!
//! Each of the two banks has its own key/control/status register set, so
//! every operation runs once per bank.

use stflash_core::{Result, Target};

use crate::protocol::{Completion, Protocol, RegisterSet, MASS_ERASE_TICKS};
use crate::regs::*;

/// Number of independent banks
pub const BANK_COUNT: u32 = 2;

/// Register set of bank `bank` (0 or 1)
pub const fn register_set(bank: u32) -> RegisterSet {
    let base = H7_FLASH_REGS + bank * H7_BANK_STRIDE;
    RegisterSet {
        keyr: base + H7_KEYR_OFFSET,
        sr: base + H7_SR_OFFSET,
        cr: base + H7_CR_OFFSET,
        ccr: base + H7_CCR_OFFSET,
    }
}

/// Register protocol of bank `bank`
pub const fn protocol(bank: u32) -> Protocol {
    Protocol {
        regs: register_set(bank),
        lock_bit: H7_CR_LOCK,
        busy_mask: H7_SR_BUSY,
        clear_value: H7_CCR_CLEAR_ALL,
        completion: Completion {
            error_mask: H7_SR_ERRORS,
            done_mask: H7_SR_BUSY,
            done_value: 0,
        },
    }
}

/// Protocols of both banks, in erase order
pub const BANKS: [Protocol; BANK_COUNT as usize] = [protocol(0), protocol(1)];

/// Erase both banks
///
/// The second bank is erased even if the first one failed; the result is
/// that of the last bank.
pub fn mass_erase<T: Target + ?Sized>(target: &mut T) -> Result<()> {
    let mut result = Ok(());
    for (index, bank) in BANKS.iter().enumerate() {
        result = bank.with_unlocked(target, |t| bank.run(t, H7_CR_MASS_ERASE, MASS_ERASE_TICKS));
        if let Err(e) = &result {
            log::warn!("Mass erase of bank {} failed: {}", index + 1, e);
        }
    }
    result
}

/// Sector erase, not implemented yet
///
/// Reports success without touching the target.
pub fn erase<T: Target + ?Sized>(_target: &mut T, first: u32, last: u32) -> Result<()> {
    log::warn!(
        "STM32H7 sector erase not implemented, sectors {}..={} left untouched",
        first,
        last
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stflash_core::Error;
    use stflash_dummy::DummyTarget;

    fn h7() -> DummyTarget {
        let mut t = DummyTarget::with_arch(stflash_core::ArmArch::V7M);
        for bank in &BANKS {
            t.add_key_lock(bank.regs.keyr, bank.regs.cr, H7_CR_LOCK);
        }
        t
    }

    #[test]
    fn test_register_sets() {
        assert_eq!(
            register_set(0),
            RegisterSet {
                keyr: 0x5200_2004,
                sr: 0x5200_2010,
                cr: 0x5200_200C,
                ccr: 0x5200_2014,
            }
        );
        assert_eq!(register_set(1).keyr, 0x5200_2104);
        assert_eq!(register_set(1).cr, 0x5200_210C);
        assert_eq!(register_set(1).sr, 0x5200_2110);
        assert_eq!(register_set(1).ccr, 0x5200_2114);
    }

    #[test]
    fn test_mass_erase_both_banks() {
        let mut t = h7();
        mass_erase(&mut t).unwrap();
        for bank in &BANKS {
            assert_eq!(t.writes_to(bank.regs.ccr), vec![0x00FF_0000]);
            assert_eq!(t.writes_to(bank.regs.keyr).len(), 2);
            assert_eq!(t.writes_to(bank.regs.cr), vec![0x0000_8020, 0, 0x0000_0001]);
        }
    }

    #[test]
    fn test_first_bank_failure_continues() {
        let mut t = h7();
        let sr0 = BANKS[0].regs.sr;
        t.push_reads(sr0, [0, 0x1, 0x1, 0x0002_0000]);

        // Second bank succeeds, so the last result wins
        assert!(mass_erase(&mut t).is_ok());
        assert_eq!(t.reads_of(sr0), 4);
        assert_eq!(t.writes_to(BANKS[1].regs.cr), vec![0x0000_8020, 0, 0x0000_0001]);
    }

    #[test]
    fn test_second_bank_failure_reported() {
        let mut t = h7();
        t.set_register(BANKS[1].regs.sr, 0x1);
        assert_eq!(mass_erase(&mut t), Err(Error::ResourceBusy));
        assert!(t.writes_to(BANKS[1].regs.cr).is_empty());
        assert_eq!(t.writes_to(BANKS[0].regs.cr), vec![0x0000_8020, 0, 0x0000_0001]);
    }

    #[test]
    fn test_erase_is_a_no_op() {
        let mut t = h7();
        erase(&mut t, 0, 15).unwrap();
        assert!(t.journal().is_empty());
    }
}
