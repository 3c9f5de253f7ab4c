//! Command-line interface definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a hex string (with or without 0x prefix) to u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "stflash")]
#[command(author, version, about = "STM32U5/H5/H7 on-chip flash programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Target and flash bank selection shared by all device commands
#[derive(clap::Args, Debug, Clone)]
pub struct BankArgs {
    /// Target to use, e.g. "dummy:device=h503,size=128"
    #[arg(short, long)]
    pub target: String,

    /// Flash bank declaration: "<name> stm32u5_h5_h7 <base> <size> <chip_width> <bus_width> [<target>]"
    #[arg(long, value_name = "DECL", conflicts_with_all = ["base", "size"])]
    pub flash_bank: Option<String>,

    /// Flash bank base address
    #[arg(long, default_value = "0x08000000", value_parser = parse_hex_u32)]
    pub base: u32,

    /// Flash bank size in bytes (0 = use the size the device reports)
    #[arg(long, default_value = "0", value_parser = parse_hex_u32)]
    pub size: u32,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify the connected device
    Probe {
        #[command(flatten)]
        bank: BankArgs,
    },

    /// Show flash bank information
    Info {
        #[command(flatten)]
        bank: BankArgs,
    },

    /// Erase the entire flash
    MassErase {
        #[command(flatten)]
        bank: BankArgs,
    },

    /// Erase a range of sectors
    Erase {
        #[command(flatten)]
        bank: BankArgs,

        /// First sector to erase
        #[arg(long)]
        first: u32,

        /// Last sector to erase (inclusive)
        #[arg(long)]
        last: u32,
    },

    /// Program a binary file
    Write {
        #[command(flatten)]
        bank: BankArgs,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Offset into the bank (must be 16-byte aligned)
        #[arg(long, default_value = "0", value_parser = parse_hex_u32)]
        offset: u32,
    },

    /// List supported devices
    ListDevices {
        /// Only show this family (u5, h5, h7)
        #[arg(long)]
        family: Option<String>,
    },

    /// List available targets
    ListTargets,
}
