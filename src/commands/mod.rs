//! CLI command implementations
//!
//! Every device command works on a [`FlashBank`](stflash_stm32::FlashBank)
//! over the selected target. The bank resolves the device on first use, so
//! commands only probe explicitly when they want to report what was found.

pub mod erase;
mod list;
pub mod probe;
pub mod write;

pub use list::{list_devices, list_targets};
