//! Target access trait
//!
//! A [`Target`] is a connected microcontroller as seen through the host's
//! debug transport. Flash drivers only ever talk to the chip through these
//! primitives, so the same driver code runs against real hardware and the
//! in-memory emulator used by the tests.

use core::fmt;

use crate::error::Result;

/// ARM architecture profile of the target core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmArch {
    /// ARMv6-M (Cortex-M0/M0+)
    V6M,
    /// ARMv7-M (Cortex-M3/M4/M7)
    V7M,
    /// ARMv8-M (Cortex-M23/M33)
    V8M,
}

impl fmt::Display for ArmArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V6M => write!(f, "ARMv6-M"),
            Self::V7M => write!(f, "ARMv7-M"),
            Self::V8M => write!(f, "ARMv8-M"),
        }
    }
}

/// Debug-transport access to a connected microcontroller
///
/// All addresses are in the target's 32-bit physical address space and all
/// register values are little-endian.
pub trait Target {
    /// Read a 32-bit word
    fn read_u32(&mut self, addr: u32) -> Result<u32>;

    /// Read a 16-bit halfword
    ///
    /// The default implementation reads the containing aligned word.
    fn read_u16(&mut self, addr: u32) -> Result<u16> {
        let word = self.read_u32(addr & !3)?;
        Ok((word >> ((addr & 2) * 8)) as u16)
    }

    /// Write a 32-bit word
    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()>;

    /// Write `units` items of `unit_size` bytes each, starting at `addr`
    ///
    /// `data` must hold exactly `unit_size * units` bytes.
    fn write_memory(&mut self, addr: u32, unit_size: u32, units: u32, data: &[u8]) -> Result<()>;

    /// Whether the core is currently halted
    fn is_halted(&self) -> bool;

    /// Whether the debug framework has examined the target
    fn was_examined(&self) -> bool;

    /// Architecture of the core, or `None` for non-ARM targets
    fn arch(&self) -> Option<ArmArch>;

    /// Sleep for roughly `ms` milliseconds while keeping the transport alive
    fn alive_sleep(&mut self, ms: u32);
}

impl<T: Target + ?Sized> Target for &mut T {
    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        (**self).read_u32(addr)
    }

    fn read_u16(&mut self, addr: u32) -> Result<u16> {
        (**self).read_u16(addr)
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        (**self).write_u32(addr, value)
    }

    fn write_memory(&mut self, addr: u32, unit_size: u32, units: u32, data: &[u8]) -> Result<()> {
        (**self).write_memory(addr, unit_size, units, data)
    }

    fn is_halted(&self) -> bool {
        (**self).is_halted()
    }

    fn was_examined(&self) -> bool {
        (**self).was_examined()
    }

    fn arch(&self) -> Option<ArmArch> {
        (**self).arch()
    }

    fn alive_sleep(&mut self, ms: u32) {
        (**self).alive_sleep(ms)
    }
}

#[cfg(feature = "alloc")]
impl<T: Target + ?Sized> Target for alloc::boxed::Box<T> {
    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        (**self).read_u32(addr)
    }

    fn read_u16(&mut self, addr: u32) -> Result<u16> {
        (**self).read_u16(addr)
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        (**self).write_u32(addr, value)
    }

    fn write_memory(&mut self, addr: u32, unit_size: u32, units: u32, data: &[u8]) -> Result<()> {
        (**self).write_memory(addr, unit_size, units, data)
    }

    fn is_halted(&self) -> bool {
        (**self).is_halted()
    }

    fn was_examined(&self) -> bool {
        (**self).was_examined()
    }

    fn arch(&self) -> Option<ArmArch> {
        (**self).arch()
    }

    fn alive_sleep(&mut self, ms: u32) {
        (**self).alive_sleep(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Word(u32);

    impl Target for Word {
        fn read_u32(&mut self, addr: u32) -> Result<u32> {
            assert_eq!(addr & 3, 0);
            Ok(self.0)
        }

        fn write_u32(&mut self, _addr: u32, value: u32) -> Result<()> {
            self.0 = value;
            Ok(())
        }

        fn write_memory(&mut self, _: u32, _: u32, _: u32, _: &[u8]) -> Result<()> {
            Ok(())
        }

        fn is_halted(&self) -> bool {
            true
        }

        fn was_examined(&self) -> bool {
            true
        }

        fn arch(&self) -> Option<ArmArch> {
            Some(ArmArch::V8M)
        }

        fn alive_sleep(&mut self, _ms: u32) {}
    }

    #[test]
    fn test_read_u16_picks_halfword() {
        let mut t = Word(0xBEEF_0200);
        assert_eq!(t.read_u16(0x0BFA_07A0).unwrap(), 0x0200);
        assert_eq!(t.read_u16(0x0BFA_07A2).unwrap(), 0xBEEF);
    }

    fn poke<T: Target>(mut target: T, value: u32) -> Result<u32> {
        target.write_u32(0x4002_2028, value)?;
        target.read_u32(0x4002_2028)
    }

    #[test]
    fn test_forwarding_through_reference() {
        let mut t = Word(0);
        assert_eq!(poke(&mut t, 0x8000_0000).unwrap(), 0x8000_0000);
        assert_eq!(t.0, 0x8000_0000);
    }
}
