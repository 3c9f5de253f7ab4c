//! Error types for stflash-core
//!
//! This module provides a no_std compatible error type shared by the
//! target access layer and every flash controller driver.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Target state errors
    /// Target must be halted for flash operations
    TargetNotHalted,
    /// Target has not been examined by the debug framework yet
    TargetNotExamined,
    /// Target does not expose ARM architecture information
    NotArmTarget,

    // Transport errors
    /// Reading a target register failed
    RegisterRead {
        /// Register address
        addr: u32,
    },
    /// Writing a target register failed
    RegisterWrite {
        /// Register address
        addr: u32,
    },
    /// Block memory write failed
    MemoryWrite {
        /// Start address of the block
        addr: u32,
    },

    // Identification errors
    /// No device descriptor matches the target
    UnknownDevice,
    /// Bank has not been identified yet
    NotProbed,
    /// Bank base address is not a flash area of the identified device
    UnknownFlashArea {
        /// Declared bank base address
        base: u32,
    },

    // Controller errors
    /// A flash operation is already in progress
    ResourceBusy,
    /// Unlock key sequence was rejected; the controller stays locked until reset
    LockedUntilReset,
    /// Controller reported an error flag while polling
    StatusError {
        /// Status register value that carried the error
        status: u32,
    },
    /// Operation did not complete within its poll budget
    Timeout,

    // Argument errors
    /// Address range is beyond the bank
    AddressOutOfBounds,
    /// Address is not aligned to the programming granule
    InvalidAlignment,
    /// Sector range is empty or beyond the bank
    InvalidSectorRange,
    /// Bank geometry does not fit the controller
    InvalidGeometry,
    /// Operation is not implemented for this device
    Unsupported,
}

impl Error {
    /// Returns true if this error came from the register transport
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::RegisterRead { .. } | Self::RegisterWrite { .. } | Self::MemoryWrite { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetNotHalted => write!(f, "target not halted"),
            Self::TargetNotExamined => write!(f, "target not examined yet"),
            Self::NotArmTarget => write!(f, "not an ARM target"),
            Self::RegisterRead { addr } => {
                write!(f, "failed to read register at 0x{:08X}", addr)
            }
            Self::RegisterWrite { addr } => {
                write!(f, "failed to write register at 0x{:08X}", addr)
            }
            Self::MemoryWrite { addr } => {
                write!(f, "failed to write memory at 0x{:08X}", addr)
            }
            Self::UnknownDevice => write!(f, "unknown device"),
            Self::NotProbed => write!(f, "flash bank not probed"),
            Self::UnknownFlashArea { base } => {
                write!(f, "unknown flash area at 0x{:08X}", base)
            }
            Self::ResourceBusy => write!(f, "flash operation in progress"),
            Self::LockedUntilReset => {
                write!(f, "flash controller locked until next reset")
            }
            Self::StatusError { status } => {
                write!(f, "flash controller reported error (SR=0x{:08X})", status)
            }
            Self::Timeout => write!(f, "flash operation timed out"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidAlignment => write!(f, "invalid alignment"),
            Self::InvalidSectorRange => write!(f, "invalid sector range"),
            Self::InvalidGeometry => write!(f, "bank geometry not supported by controller"),
            Self::Unsupported => write!(f, "operation not supported for this device"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
