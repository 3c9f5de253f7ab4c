//! stflash-stm32 - STM32U5/H5/H7 on-chip flash driver
//!
//! This crate drives the embedded flash controllers of three STM32
//! families through the memory-mapped registers a debug probe can reach.
//!
//! # Overview
//!
//! A [`FlashBank`] is declared with a base address and an optional size.
//! On first use it reads DBGMCU_IDCODE to find out which device it is
//! talking to, then routes mass erase, sector erase and programming to the
//! matching controller implementation.
//!
//! # Supported Devices
//!
//! - STM32U535/545, U575/585, U59x/5Ax, U5Fx/5Gx (mass erase)
//! - STM32H503, H523/533, H562/563/573 (mass erase, sector erase, programming)
//! - STM32H742/743/750/753 (mass erase of both banks)
//!
//! Sector erase on U5 and H7 is accepted but does nothing yet; programming
//! those parts reports [`stflash_core::Error::Unsupported`].
//!
//! # References
//!
//! - RM0456 (STM32U5), RM0481 (STM32H5), RM0492 (STM32H503), RM0433 (STM32H7)

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod bank;
pub mod catalog;
#[cfg(feature = "std")]
pub mod command;
#[cfg(any(test, feature = "emulator"))]
pub mod emulator;
#[cfg(feature = "std")]
pub mod error;
pub mod h5;
pub mod h7;
pub mod probe;
pub mod protocol;
pub mod regs;
pub mod u5;

pub use bank::{DriverState, FlashBank};
pub use catalog::{find_by_name, find_device, Capabilities, DeviceDescriptor, Family, DEVICES};
#[cfg(feature = "std")]
pub use command::{mass_erase_command, parse_bank_command, BankDeclaration, DRIVER_NAME};
#[cfg(feature = "std")]
pub use error::CommandError;
pub use protocol::{Protocol, RegisterSet};
