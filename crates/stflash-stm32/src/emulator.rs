//! Emulated MCUs built on [`stflash_dummy::DummyTarget`]

use stflash_dummy::{DummyConfig, DummyTarget};

use crate::catalog::{DeviceDescriptor, Family};
use crate::regs::*;
use crate::{h5, h7, u5};

/// Build a halted, examined target that looks like `dev`
///
/// DBGMCU_IDCODE carries `rev_id` and the flash size register reports
/// `size_kib`. Every flash controller starts locked and finishes each
/// operation instantly.
pub fn emulated_mcu(dev: &DeviceDescriptor, rev_id: u16, size_kib: u16) -> DummyTarget {
    let mut t = DummyTarget::new(DummyConfig {
        arch: Some(dev.arch),
        ..DummyConfig::default()
    });

    let idcode = (u32::from(rev_id) << IDCODE_REV_ID_SHIFT) | u32::from(dev.dev_id);
    t.set_register(dev.idcode_addr, idcode);
    t.set_register(dev.flash_size_addr, u32::from(size_kib));

    match dev.family {
        Family::U5 => {
            let regs = u5::PROTOCOL.regs;
            t.add_key_lock(regs.keyr, regs.cr, u5::PROTOCOL.lock_bit);
            t.set_write_one_to_clear(regs.sr);
            t.on_write(regs.cr, regs.sr, U5_NSSR_EOP);
        }
        Family::H5 => {
            let regs = h5::PROTOCOL.regs;
            t.add_key_lock(regs.keyr, regs.cr, h5::PROTOCOL.lock_bit);
            t.set_register(regs.sr, H5_NSSR_EOP);
        }
        Family::H7 => {
            for bank in &h7::BANKS {
                t.add_key_lock(bank.regs.keyr, bank.regs.cr, bank.lock_bit);
            }
        }
    }
    t
}
