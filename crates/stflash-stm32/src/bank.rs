//! Flash bank front end
//!
//! A [`FlashBank`] is one declared flash region on one target. It resolves
//! the device on first use and routes every operation to the controller of
//! the device's family.

use alloc::format;
use alloc::string::String;

use stflash_core::{Error, Result, Target};

use crate::catalog::{Capabilities, DeviceDescriptor, Family};
use crate::regs::IDCODE_REV_ID_SHIFT;
use crate::{h5, h7, probe, u5};

/// Per-bank driver state, filled in once by probing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverState {
    descriptor: Option<&'static DeviceDescriptor>,
    idcode: u32,
    revision: Option<char>,
    flash_size: u32,
}

impl DriverState {
    pub(crate) fn resolved(
        descriptor: &'static DeviceDescriptor,
        idcode: u32,
        revision: Option<char>,
        flash_size: u32,
    ) -> Self {
        Self {
            descriptor: Some(descriptor),
            idcode,
            revision,
            flash_size,
        }
    }

    /// Whether a device has been identified and the bank geometry set up
    pub fn is_resolved(&self) -> bool {
        self.descriptor.is_some()
    }

    /// Descriptor of the identified device
    pub fn descriptor(&self) -> Option<&'static DeviceDescriptor> {
        self.descriptor
    }

    /// Raw DBGMCU_IDCODE value
    pub fn idcode(&self) -> u32 {
        self.idcode
    }

    /// Silicon revision letter, if the revision id is known
    pub fn revision(&self) -> Option<char> {
        self.revision
    }

    /// Flash size in bytes
    pub fn flash_size(&self) -> u32 {
        self.flash_size
    }
}

/// One flash bank on one target
#[derive(Debug)]
pub struct FlashBank<T> {
    pub(crate) target: T,
    pub(crate) base: u32,
    pub(crate) size: u32,
    pub(crate) chip_width: u32,
    pub(crate) bus_width: u32,
    pub(crate) write_alignment: u32,
    pub(crate) minimal_write_gap: u32,
    pub(crate) num_sectors: u32,
    pub(crate) state: DriverState,
}

impl<T: Target> FlashBank<T> {
    /// Declare a bank at `base`; a `size` of 0 takes the device size
    pub fn new(target: T, base: u32, size: u32) -> Self {
        Self {
            target,
            base,
            size,
            chip_width: 0,
            bus_width: 0,
            write_alignment: 0,
            minimal_write_gap: 0,
            num_sectors: 0,
            state: DriverState::default(),
        }
    }

    /// Identify the device and set up the bank geometry
    pub fn probe(&mut self) -> Result<()> {
        probe::probe(self)
    }

    /// Probe unless the device is already identified
    pub fn auto_probe(&mut self) -> Result<()> {
        if self.state.is_resolved() {
            return Ok(());
        }
        self.probe()
    }

    /// Erase the whole device
    pub fn mass_erase(&mut self) -> Result<()> {
        let dev = self.prepare(Capabilities::MASS_ERASE)?;
        match dev.family {
            Family::U5 => u5::mass_erase(&mut self.target),
            Family::H5 => h5::mass_erase(&mut self.target),
            Family::H7 => h7::mass_erase(&mut self.target),
        }
    }

    /// Erase sectors `first..=last`
    pub fn erase(&mut self, first: u32, last: u32) -> Result<()> {
        let dev = self.prepare(Capabilities::ERASE)?;
        match dev.family {
            Family::U5 => u5::erase(&mut self.target, first, last),
            Family::H5 => h5::erase(&mut self.target, self.num_sectors, first, last),
            Family::H7 => h7::erase(&mut self.target, first, last),
        }
    }

    /// Program `data` at `offset` bytes into the bank
    pub fn write(&mut self, data: &[u8], offset: u32) -> Result<()> {
        let dev = self.prepare(Capabilities::WRITE)?;

        let end = u64::from(offset) + data.len() as u64;
        if end > u64::from(self.size) {
            log::error!(
                "Write of {} bytes at offset 0x{:X} exceeds bank size 0x{:X}",
                data.len(),
                offset,
                self.size
            );
            return Err(Error::AddressOutOfBounds);
        }

        match dev.family {
            Family::H5 => {
                if self.bus_width as usize != h5::QUAD_WORD {
                    return Err(Error::InvalidGeometry);
                }
                let addr = self.base + offset;
                log::info!("Programming {} bytes at 0x{:08X}", data.len(), addr);
                h5::write(&mut self.target, addr, data)
            }
            Family::U5 | Family::H7 => Err(Error::Unsupported),
        }
    }

    /// One-line summary of the identified device
    pub fn info(&self) -> Result<String> {
        let dev = self.state.descriptor.ok_or(Error::NotProbed)?;
        let revision = match self.state.revision {
            Some(letter) => format!("rev {}", letter),
            None => format!("rev id 0x{:04X}", self.state.idcode >> IDCODE_REV_ID_SHIFT),
        };
        Ok(format!(
            "{} {}, {}kB flash at 0x{:08X}, {} sectors of {}kB, {}-bit bus",
            dev.name,
            revision,
            self.size / 1024,
            self.base,
            self.num_sectors,
            dev.page_size / 1024,
            self.bus_width * 8
        ))
    }

    fn prepare(&mut self, needed: Capabilities) -> Result<&'static DeviceDescriptor> {
        if !self.target.is_halted() {
            log::error!("Target not halted");
            return Err(Error::TargetNotHalted);
        }
        self.auto_probe()?;
        let dev = self.state.descriptor.ok_or(Error::NotProbed)?;
        if !dev.capabilities.contains(needed) {
            log::error!("{:?} not supported on {}", needed, dev.name);
            return Err(Error::Unsupported);
        }
        Ok(dev)
    }
}

impl<T> FlashBank<T> {
    /// Target handle
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Mutable target handle
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Give the target back
    pub fn into_target(self) -> T {
        self.target
    }

    /// Driver state
    pub fn state(&self) -> &DriverState {
        &self.state
    }

    /// Descriptor of the identified device
    pub fn descriptor(&self) -> Option<&'static DeviceDescriptor> {
        self.state.descriptor
    }

    /// Bank base address
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Bank size in bytes
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Chip width in bytes
    pub fn chip_width(&self) -> u32 {
        self.chip_width
    }

    /// Bus width in bytes
    pub fn bus_width(&self) -> u32 {
        self.bus_width
    }

    /// Required start alignment of writes
    pub fn write_alignment(&self) -> u32 {
        self.write_alignment
    }

    /// Smallest gap between two writes that is not merged
    pub fn minimal_write_gap(&self) -> u32 {
        self.minimal_write_gap
    }

    /// Number of erase sectors
    pub fn num_sectors(&self) -> u32 {
        self.num_sectors
    }
}
