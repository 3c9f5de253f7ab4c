//! Device identification
//!
//! Probing walks the device catalog, reads each candidate's DBGMCU_IDCODE
//! through the debug transport and binds the first match to the bank. The
//! bank geometry is then derived from the descriptor and the size the MCU
//! reports about itself.

use stflash_core::{ArmArch, Error, Result, Target};

use crate::bank::{DriverState, FlashBank};
use crate::catalog::{DeviceDescriptor, DEVICES};
use crate::regs::IDCODE_REV_ID_SHIFT;

/// Find the catalog entry of the connected device
///
/// Only rows of architecture `arch` are tried. A row whose IDCODE cannot be
/// read is skipped. Returns the descriptor and the raw IDCODE value.
pub fn identify<T: Target + ?Sized>(
    target: &mut T,
    arch: ArmArch,
) -> Option<(&'static DeviceDescriptor, u32)> {
    for dev in DEVICES.iter().filter(|d| d.arch == arch) {
        match target.read_u32(dev.idcode_addr) {
            Ok(idcode) if dev.matches_idcode(idcode) => return Some((dev, idcode)),
            Ok(_) => {}
            Err(e) => log::debug!("Skipping {}: {}", dev.name, e),
        }
    }
    None
}

/// Flash size the MCU reports, if it is plausible for `dev`
pub fn read_flash_size<T: Target + ?Sized>(target: &mut T, dev: &DeviceDescriptor) -> Option<u32> {
    match target.read_u16(dev.flash_size_addr) {
        Ok(kib) => {
            let size = u32::from(kib) * 1024;
            if size > 0 && size <= dev.max_flash_size {
                Some(size)
            } else {
                log::warn!("MCU indicates invalid flash size ({}kB)", kib);
                None
            }
        }
        Err(e) => {
            log::warn!("Unable to read flash size from MCU: {}", e);
            None
        }
    }
}

/// Identify the device behind `bank` and set up its geometry
///
/// The bank only counts as resolved once the geometry is in place, so a bank
/// rejected here is probed again by the next operation.
pub(crate) fn probe<T: Target>(bank: &mut FlashBank<T>) -> Result<()> {
    if !bank.target.was_examined() {
        log::error!("Target not examined yet");
        return Err(Error::TargetNotExamined);
    }
    if bank.state.is_resolved() {
        return Ok(());
    }
    let Some(arch) = bank.target.arch() else {
        log::error!("Not an ARM target");
        return Err(Error::NotArmTarget);
    };

    let Some((dev, idcode)) = identify(&mut bank.target, arch) else {
        log::error!("No supported {} device found", arch);
        return Err(Error::UnknownDevice);
    };
    log::info!("{} found", dev.name);

    let rev_id = (idcode >> IDCODE_REV_ID_SHIFT) as u16;
    let revision = dev.revision(rev_id);
    match revision {
        Some(letter) => log::info!("Silicon revision {}", letter),
        None => log::warn!("Unknown silicon revision 0x{:04X}", rev_id),
    }

    let flash_size = apply_geometry(bank, dev)?;
    bank.state = DriverState::resolved(dev, idcode, revision, flash_size);
    Ok(())
}

fn apply_geometry<T: Target>(bank: &mut FlashBank<T>, dev: &'static DeviceDescriptor) -> Result<u32> {
    if bank.base != dev.flash_base {
        log::error!("Unknown flash area at 0x{:08X}", bank.base);
        return Err(Error::UnknownFlashArea { base: bank.base });
    }

    let declared = bank.size;
    if declared > dev.max_flash_size {
        log::warn!(
            "Size given at 'flash bank' command ({}kB) exceeds maximum flash size",
            declared / 1024
        );
    }
    let mut size = if declared == 0 {
        dev.max_flash_size
    } else {
        declared.min(dev.max_flash_size)
    };

    if let Some(reported) = read_flash_size(&mut bank.target, dev) {
        if declared != 0 && size != reported {
            log::warn!(
                "Size given at 'flash bank' command ({}kB) differs from device reported size",
                size / 1024
            );
        }
        size = reported;
    }
    log::info!("Using flash size: {}kB", size / 1024);

    bank.size = size;
    bank.chip_width = dev.bus_width;
    bank.bus_width = dev.bus_width;
    bank.write_alignment = dev.bus_width;
    bank.minimal_write_gap = dev.bus_width;
    bank.num_sectors = dev.pages(size);
    Ok(size)
}
