//! stflash-core - Core library for on-chip flash programming
//!
//! This crate defines the small surface that flash controller drivers are
//! built on: the [`Target`] trait describing what the host debug framework
//! can do with a connected microcontroller, and the shared [`Error`] type.
//! It is `no_std` compatible so drivers can run inside probe firmware.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable the `Box<T>` forwarding impl of [`Target`]
//!
//! # Example
//!
//! ```ignore
//! use stflash_core::{Result, Target};
//!
//! fn flash_locked<T: Target>(target: &mut T, cr: u32) -> Result<bool> {
//!     Ok(target.read_u32(cr)? & 1 != 0)
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod target;

pub use error::{Error, Result};
pub use target::{ArmArch, Target};
