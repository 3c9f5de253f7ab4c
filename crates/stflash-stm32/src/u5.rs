//! STM32U5 flash controller

use stflash_core::{Result, Target};

use crate::protocol::{Completion, Protocol, RegisterSet, MASS_ERASE_TICKS};
use crate::regs::*;

/// U5 non-secure register protocol
pub const PROTOCOL: Protocol = Protocol {
    regs: RegisterSet {
        keyr: U5_NSKEYR,
        sr: U5_NSSR,
        cr: U5_NSCR,
        ccr: U5_NSSR,
    },
    lock_bit: U5_NSCR_LOCK,
    busy_mask: U5_NSSR_BSY,
    clear_value: U5_NSSR_CLEAR,
    completion: Completion {
        error_mask: U5_NSSR_ERRORS,
        done_mask: U5_NSSR_BSY | U5_NSSR_EOP,
        done_value: U5_NSSR_EOP,
    },
};

/// Erase both banks
pub fn mass_erase<T: Target + ?Sized>(target: &mut T) -> Result<()> {
    PROTOCOL.with_unlocked(target, |t| {
        PROTOCOL.run(t, U5_NSCR_MASS_ERASE, MASS_ERASE_TICKS)
    })
}

/// Sector erase, not implemented yet
///
/// Reports success without touching the target.
pub fn erase<T: Target + ?Sized>(_target: &mut T, first: u32, last: u32) -> Result<()> {
    log::warn!(
        "STM32U5 sector erase not implemented, sectors {}..={} left untouched",
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

    fn u5() -> DummyTarget {
        let mut t = DummyTarget::default();
        t.add_key_lock(U5_NSKEYR, U5_NSCR, U5_NSCR_LOCK);
        t.set_write_one_to_clear(U5_NSSR);
        t
    }

    #[test]
    fn test_mass_erase() {
        let mut t = u5();
        t.push_reads(U5_NSSR, [0, U5_NSSR_BSY, U5_NSSR_BSY, U5_NSSR_EOP]);
        mass_erase(&mut t).unwrap();

        assert_eq!(t.writes_to(U5_NSSR), vec![0x0000_20FB]);
        assert_eq!(
            t.writes_to(U5_NSCR),
            vec![0x0001_8004, 0, 0x8000_0000]
        );
        assert_eq!(t.ticks(), 3);
    }

    #[test]
    fn test_mass_erase_error_flag() {
        let mut t = u5();
        t.push_reads(U5_NSSR, [0, U5_NSSR_BSY, 0x0000_0080 | U5_NSSR_EOP]);
        assert_eq!(
            mass_erase(&mut t),
            Err(Error::StatusError { status: 0x0000_0081 })
        );
        assert_eq!(t.writes_to(U5_NSCR).last(), Some(&U5_NSCR_LOCK));
    }

    #[test]
    fn test_busy_controller_untouched() {
        let mut t = u5();
        t.set_register(U5_NSSR, U5_NSSR_BSY);
        assert_eq!(mass_erase(&mut t), Err(Error::ResourceBusy));
        assert!(t.writes_to(U5_NSCR).is_empty());
        assert!(t.writes_to(U5_NSKEYR).is_empty());
    }

    #[test]
    fn test_erase_is_a_no_op() {
        let mut t = u5();
        erase(&mut t, 0, 3).unwrap();
        assert!(t.journal().is_empty());
    }
}
