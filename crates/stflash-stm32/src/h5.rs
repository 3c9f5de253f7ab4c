//! STM32H5 flash controller
//!
//! The H5 is the only family with sector erase and programming. Flash is
//! split into two equally sized banks; sectors are numbered across both,
//! with the upper half selected through BKSEL.

use stflash_core::{Error, Result, Target};

use crate::protocol::{
    Completion, Protocol, RegisterSet, MASS_ERASE_TICKS, PROGRAM_TICKS, SECTOR_ERASE_TICKS,
};
use crate::regs::*;

/// Programming granule in bytes
pub const QUAD_WORD: usize = 16;

/// H5 non-secure register protocol
pub const PROTOCOL: Protocol = Protocol {
    regs: RegisterSet {
        keyr: H5_NSKEYR,
        sr: H5_NSSR,
        cr: H5_NSCR,
        ccr: H5_NSCCR,
    },
    lock_bit: H5_NSCR_LOCK,
    busy_mask: H5_NSSR_BUSY,
    clear_value: H5_NSCCR_CLEAR_ALL,
    completion: Completion {
        error_mask: H5_NSSR_ERRORS,
        done_mask: H5_NSSR_EOP | H5_NSSR_BUSY,
        done_value: H5_NSSR_EOP,
    },
};

/// Erase both banks
pub fn mass_erase<T: Target + ?Sized>(target: &mut T) -> Result<()> {
    PROTOCOL.with_unlocked(target, |t| {
        PROTOCOL.run(t, H5_NSCR_MASS_ERASE, MASS_ERASE_TICKS)
    })
}

/// Validate a sector range and return the number of sectors per bank
pub fn sectors_per_bank(total: u32, first: u32, last: u32) -> Result<u32> {
    if total == 0 || total % 2 != 0 {
        log::error!("Sector count {} cannot be split into two banks", total);
        return Err(Error::InvalidGeometry);
    }
    let per_bank = total / 2;
    if per_bank > H5_MAX_SECTORS_PER_BANK {
        log::error!("{} sectors per bank exceed the SNB field", per_bank);
        return Err(Error::InvalidGeometry);
    }
    if first > last || last >= total {
        return Err(Error::InvalidSectorRange);
    }
    Ok(per_bank)
}

/// Control register value that erases `sector`
pub fn sector_erase_cr(sector: u32, per_bank: u32) -> u32 {
    if sector < per_bank {
        H5_NSCR_SECTOR_ERASE | (sector << H5_NSCR_SNB_SHIFT)
    } else {
        H5_NSCR_SECTOR_ERASE | ((sector - per_bank) << H5_NSCR_SNB_SHIFT) | H5_NSCR_BKSEL
    }
}

/// Erase sectors `first..=last` out of `total`
///
/// Stops at the first sector that fails.
pub fn erase<T: Target + ?Sized>(target: &mut T, total: u32, first: u32, last: u32) -> Result<()> {
    let per_bank = sectors_per_bank(total, first, last)?;

    PROTOCOL.with_unlocked(target, |t| {
        for sector in first..=last {
            log::info!("Erasing sector {} ({}..={})", sector, first, last);
            PROTOCOL.run(t, sector_erase_cr(sector, per_bank), SECTOR_ERASE_TICKS)?;
        }
        Ok(())
    })
}

/// Copy up to 16 bytes into a quad-word, padding with the erased value
pub fn quad_word(chunk: &[u8]) -> [u8; QUAD_WORD] {
    let mut quad = [0xFF; QUAD_WORD];
    let len = chunk.len().min(QUAD_WORD);
    quad[..len].copy_from_slice(&chunk[..len]);
    quad
}

/// Program `data` at absolute address `addr`
///
/// `addr` must be quad-word aligned. A trailing partial quad-word is
/// padded with 0xFF.
pub fn write<T: Target + ?Sized>(target: &mut T, addr: u32, data: &[u8]) -> Result<()> {
    if addr as usize % QUAD_WORD != 0 {
        log::error!("Write address 0x{:08X} is not quad-word aligned", addr);
        return Err(Error::InvalidAlignment);
    }

    PROTOCOL.with_unlocked(target, |t| {
        t.write_u32(H5_NSCR, H5_NSCR_PG)?;
        let result = program(t, addr, data);
        PROTOCOL.idle(t);
        result
    })
}

fn program<T: Target + ?Sized>(target: &mut T, mut addr: u32, data: &[u8]) -> Result<()> {
    for chunk in data.chunks(QUAD_WORD) {
        let quad = quad_word(chunk);
        if let Err(e) = target.write_memory(addr, 4, 4, &quad) {
            log::error!("Write to 0x{:08X} failed: {}", addr, e);
            return Err(e);
        }
        PROTOCOL.wait_for_eop(target, PROGRAM_TICKS)?;
        addr += QUAD_WORD as u32;
    }
    Ok(())
}
