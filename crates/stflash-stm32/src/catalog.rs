//! Supported device database
//!
//! Each [`DeviceDescriptor`] describes one group of parts that share a
//! DBGMCU device id. Descriptors are matched by `(architecture, device id)`
//! and never change after build time.

use alloc::format;
use alloc::string::String;
use core::fmt;

use bitflags::bitflags;
use stflash_core::ArmArch;

use crate::regs::*;

/// Flash controller family, selects the register protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// STM32U5 series
    U5,
    /// STM32H5 series
    H5,
    /// STM32H7 series (dual bank, per-bank register sets)
    H7,
}

impl Family {
    /// Command group name for this family
    pub fn command_group(self) -> &'static str {
        match self {
            Self::U5 => "stm32u5",
            Self::H5 => "stm32h5",
            Self::H7 => "stm32h7",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::U5 => "STM32U5",
            Self::H5 => "STM32H5",
            Self::H7 => "STM32H7",
        };
        write!(f, "{}", name)
    }
}

bitflags! {
    /// Operations a device's flash controller driver implements
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Whole-device erase
        const MASS_ERASE = 1 << 0;
        /// Sector range erase
        const ERASE      = 1 << 1;
        /// Programming
        const WRITE      = 1 << 2;
    }
}

/// Silicon revision id and its marking letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision {
    /// REV_ID field of DBGMCU_IDCODE
    pub id: u16,
    /// Revision letter printed on the package
    pub letter: char,
}

impl Revision {
    const fn new(id: u16, letter: char) -> Self {
        Self { id, letter }
    }
}

/// Static description of a supported device group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Core architecture the debug framework reports for this part
    pub arch: ArmArch,
    /// Address of DBGMCU_IDCODE
    pub idcode_addr: u32,
    /// 12-bit device id
    pub dev_id: u16,
    /// Display name
    pub name: &'static str,
    /// Known silicon revisions
    pub revisions: &'static [Revision],
    /// Base address of main flash
    pub flash_base: u32,
    /// Flash bus width in bytes
    pub bus_width: u32,
    /// Erase page size in bytes
    pub page_size: u32,
    /// Largest flash size of any part in the group, in bytes
    pub max_flash_size: u32,
    /// Address of the flash size data register
    pub flash_size_addr: u32,
    /// Implemented operations
    pub capabilities: Capabilities,
    /// Controller family
    pub family: Family,
}

impl DeviceDescriptor {
    /// Check if a raw IDCODE value belongs to this device
    pub fn matches_idcode(&self, idcode: u32) -> bool {
        idcode & IDCODE_DEV_ID_MASK == u32::from(self.dev_id)
    }

    /// Look up the revision letter for a REV_ID value
    pub fn revision(&self, rev_id: u16) -> Option<char> {
        self.revisions
            .iter()
            .find(|r| r.id == rev_id)
            .map(|r| r.letter)
    }

    /// Number of erase pages in `size` bytes of flash
    pub fn pages(&self, size: u32) -> u32 {
        size / self.page_size
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (dev id 0x{:03X}, {})",
            self.name, self.dev_id, self.arch
        )
    }
}

const REV_U5F_U5G: &[Revision] = &[Revision::new(0x1000, 'A'), Revision::new(0x1001, 'Z')];
const REV_U59_U5A: &[Revision] = &[Revision::new(0x3001, 'X')];
const REV_U575_U585: &[Revision] = &[Revision::new(0x2001, 'X'), Revision::new(0x3001, 'W')];
const REV_U535_U545: &[Revision] = &[Revision::new(0x1001, 'Z')];
const REV_H5: &[Revision] = &[
    Revision::new(0x1000, 'A'),
    Revision::new(0x1001, 'Z'),
    Revision::new(0x1007, 'X'),
];
const REV_H7: &[Revision] = &[
    Revision::new(0x1001, 'Z'),
    Revision::new(0x1003, 'Y'),
    Revision::new(0x2001, 'X'),
    Revision::new(0x2003, 'V'),
];

const KIB: u32 = 1024;
const MIB: u32 = 1024 * 1024;

const U5_OPS: Capabilities = Capabilities::MASS_ERASE.union(Capabilities::ERASE);
const H5_OPS: Capabilities = Capabilities::all();
const H7_OPS: Capabilities = Capabilities::MASS_ERASE.union(Capabilities::ERASE);

/// All supported devices, in match order
pub static DEVICES: &[DeviceDescriptor] = &[
    // U535xB 128k, U535xC 256k, U535xE/U545xE 512k
    DeviceDescriptor {
        arch: ArmArch::V8M,
        idcode_addr: U5_DBGMCU_IDCODE,
        dev_id: 0x455,
        name: "STM32U535/545",
        revisions: REV_U535_U545,
        flash_base: FLASH_BANK_BASE,
        bus_width: 16,
        page_size: 8 * KIB,
        max_flash_size: 512 * KIB,
        flash_size_addr: U5_FLASH_SIZE_DATA,
        capabilities: U5_OPS,
        family: Family::U5,
    },
    // U5GxxJ/U5FxxJ 4M, U5FxxI 2M
    DeviceDescriptor {
        arch: ArmArch::V8M,
        idcode_addr: U5_DBGMCU_IDCODE,
        dev_id: 0x476,
        name: "STM32U5Fx/5Gx",
        revisions: REV_U5F_U5G,
        flash_base: FLASH_BANK_BASE,
        bus_width: 16,
        page_size: 8 * KIB,
        max_flash_size: 4 * MIB,
        flash_size_addr: U5_FLASH_SIZE_DATA,
        capabilities: U5_OPS,
        family: Family::U5,
    },
    // U5AxxI/U59xxI 2M, U5AxxJ/U59xxJ 4M
    DeviceDescriptor {
        arch: ArmArch::V8M,
        idcode_addr: U5_DBGMCU_IDCODE,
        dev_id: 0x481,
        name: "STM32U59x/5Ax",
        revisions: REV_U59_U5A,
        flash_base: FLASH_BANK_BASE,
        bus_width: 16,
        page_size: 8 * KIB,
        max_flash_size: 4 * MIB,
        flash_size_addr: U5_FLASH_SIZE_DATA,
        capabilities: U5_OPS,
        family: Family::U5,
    },
    // U575xG 1M, U575xI/U585xI 2M
    DeviceDescriptor {
        arch: ArmArch::V8M,
        idcode_addr: U5_DBGMCU_IDCODE,
        dev_id: 0x482,
        name: "STM32U575/585",
        revisions: REV_U575_U585,
        flash_base: FLASH_BANK_BASE,
        bus_width: 16,
        page_size: 8 * KIB,
        max_flash_size: 2 * MIB,
        flash_size_addr: U5_FLASH_SIZE_DATA,
        capabilities: U5_OPS,
        family: Family::U5,
    },
    // H56xxG 1M, H56xxI/H573xI 2M
    DeviceDescriptor {
        arch: ArmArch::V8M,
        idcode_addr: H5_DBGMCU_IDCODE,
        dev_id: 0x484,
        name: "STM32H562/563/573",
        revisions: REV_H5,
        flash_base: FLASH_BANK_BASE,
        bus_width: 16,
        page_size: 8 * KIB,
        max_flash_size: 2 * MIB,
        flash_size_addr: H5_FLASH_SIZE_DATA,
        capabilities: H5_OPS,
        family: Family::H5,
    },
    // H523xC 256k, H523xE/H533xE 512k
    DeviceDescriptor {
        arch: ArmArch::V8M,
        idcode_addr: H5_DBGMCU_IDCODE,
        dev_id: 0x478,
        name: "STM32H523/533",
        revisions: REV_H5,
        flash_base: FLASH_BANK_BASE,
        bus_width: 16,
        page_size: 8 * KIB,
        max_flash_size: 512 * KIB,
        flash_size_addr: H5_FLASH_SIZE_DATA,
        capabilities: H5_OPS,
        family: Family::H5,
    },
    // H503xB 128k
    DeviceDescriptor {
        arch: ArmArch::V8M,
        idcode_addr: H5_DBGMCU_IDCODE,
        dev_id: 0x474,
        name: "STM32H503",
        revisions: REV_H5,
        flash_base: FLASH_BANK_BASE,
        bus_width: 16,
        page_size: 8 * KIB,
        max_flash_size: 512 * KIB,
        flash_size_addr: H5_FLASH_SIZE_DATA,
        capabilities: H5_OPS,
        family: Family::H5,
    },
    // H742/H743/H750/H753, two 1M banks
    DeviceDescriptor {
        arch: ArmArch::V7M,
        idcode_addr: H7_DBGMCU_IDCODE,
        dev_id: 0x450,
        name: "STM32H742/743/750/753",
        revisions: REV_H7,
        flash_base: FLASH_BANK_BASE,
        bus_width: 32,
        page_size: 128 * KIB,
        max_flash_size: 2 * MIB,
        flash_size_addr: H7_FLASH_SIZE_DATA,
        capabilities: H7_OPS,
        family: Family::H7,
    },
];

/// Iterate over all supported devices
pub fn devices() -> impl Iterator<Item = &'static DeviceDescriptor> {
    DEVICES.iter()
}

/// Find the descriptor for an `(architecture, device id)` pair
pub fn find_device(arch: ArmArch, dev_id: u16) -> Option<&'static DeviceDescriptor> {
    DEVICES
        .iter()
        .find(|d| d.arch == arch && d.dev_id == dev_id)
}

/// Find a device by part name (case-insensitive substring match)
///
/// Grouped names are split into their parts first, so `"h743"` finds
/// STM32H742/743/750/753 and `"u5a5"` finds STM32U59x/5Ax. An `x` in a
/// part name matches any character.
pub fn find_by_name(name: &str) -> Option<&'static DeviceDescriptor> {
    if name.is_empty() {
        return None;
    }
    DEVICES
        .iter()
        .find(|d| part_names(d.name).any(|part| part_matches(&part, name)))
}

/// Full part names of a grouped name, `"STM32H523/533"` gives
/// `"STM32H523"` and `"STM32H533"`
fn part_names(name: &str) -> impl Iterator<Item = String> + '_ {
    let mut parts = name.split('/');
    let first = parts.next().unwrap_or_default();
    core::iter::once(String::from(first)).chain(parts.map(move |suffix| {
        let prefix = &first[..first.len().saturating_sub(suffix.len())];
        format!("{}{}", prefix, suffix)
    }))
}

fn part_matches(part: &str, needle: &str) -> bool {
    let (part, needle) = (part.as_bytes(), needle.as_bytes());
    needle.len() <= part.len()
        && part.windows(needle.len()).any(|window| {
            window
                .iter()
                .zip(needle)
                .all(|(&p, n)| p == b'x' || p.eq_ignore_ascii_case(n))
        })
}

/// Iterate over the devices of one family
pub fn family_devices(family: Family) -> impl Iterator<Item = &'static DeviceDescriptor> {
    DEVICES.iter().filter(move |d| d.family == family)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_row_has_flash() {
        for dev in devices() {
            assert!(dev.max_flash_size > 0, "{} has no flash", dev.name);
            assert_eq!(dev.max_flash_size % dev.page_size, 0, "{}", dev.name);
            assert!(!dev.revisions.is_empty(), "{}", dev.name);
        }
        assert_eq!(DEVICES.len(), 8);
    }

    #[test]
    fn test_dev_ids_unique_per_arch() {
        for (i, a) in DEVICES.iter().enumerate() {
            for b in &DEVICES[i + 1..] {
                assert!(
                    a.arch != b.arch || a.dev_id != b.dev_id,
                    "{} and {} collide",
                    a.name,
                    b.name
                );
            }
        }
    }

    #[test]
    fn test_find_device() {
        let dev = find_device(ArmArch::V8M, 0x455).unwrap();
        assert_eq!(dev.name, "STM32U535/545");
        assert_eq!(dev.family, Family::U5);

        let h7 = find_device(ArmArch::V7M, 0x450).unwrap();
        assert_eq!(h7.bus_width, 32);
        assert_eq!(h7.page_size, 128 * 1024);

        // Right id, wrong architecture
        assert!(find_device(ArmArch::V7M, 0x455).is_none());
    }

    #[test]
    fn test_find_by_name() {
        assert_eq!(find_by_name("h503").unwrap().dev_id, 0x474);
        assert_eq!(find_by_name("U585").unwrap().dev_id, 0x482);
        assert_eq!(find_by_name("743").unwrap().dev_id, 0x450);
        assert_eq!(find_by_name("stm32h743").unwrap().dev_id, 0x450);
        assert_eq!(find_by_name("h753").unwrap().dev_id, 0x450);
        assert_eq!(find_by_name("h563").unwrap().dev_id, 0x484);
        assert_eq!(find_by_name("H533").unwrap().dev_id, 0x478);
        assert_eq!(find_by_name("u545").unwrap().dev_id, 0x455);
        assert!(find_by_name("l476").is_none());
        assert!(find_by_name("").is_none());
    }

    #[test]
    fn test_find_by_name_wildcard_parts() {
        assert_eq!(find_by_name("u5a5").unwrap().dev_id, 0x481);
        assert_eq!(find_by_name("STM32U5G9").unwrap().dev_id, 0x476);
        assert_eq!(find_by_name("u5Fx").unwrap().dev_id, 0x476);
        assert!(find_by_name("u5b5").is_none());
    }

    #[test]
    fn test_revision_lookup() {
        let h7 = find_device(ArmArch::V7M, 0x450).unwrap();
        assert_eq!(h7.revision(0x2003), Some('V'));
        assert_eq!(h7.revision(0x1000), None);
        assert!(h7.matches_idcode(0x2003_6450));
        assert!(!h7.matches_idcode(0x2003_6451));
    }

    #[test]
    fn test_capabilities() {
        for dev in family_devices(Family::H5) {
            assert!(dev.capabilities.contains(Capabilities::WRITE));
        }
        for dev in family_devices(Family::U5).chain(family_devices(Family::H7)) {
            assert!(dev.capabilities.contains(Capabilities::MASS_ERASE));
            assert!(!dev.capabilities.contains(Capabilities::WRITE));
        }
    }
}
