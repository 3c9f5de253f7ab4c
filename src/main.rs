//! stflash - STM32U5/H5/H7 on-chip flash programmer
//!
//! Drives the embedded flash controller of a connected STM32 through its
//! memory-mapped registers: identify the device, mass erase, erase sectors
//! and program binaries.
//!
//! # Architecture
//!
//! Every device command builds one `FlashBank` on the selected target. The
//! bank identifies the device on first use and picks the register protocol
//! of its family, so the command implementations are the same for all
//! supported parts.

mod cli;
mod commands;
mod targets;

use clap::Parser;
use cli::{BankArgs, Cli, Commands};
use stflash_dummy::DummyTarget;
use stflash_stm32::{parse_bank_command, FlashBank};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Probe { bank } => commands::probe::run_probe(&mut open_bank(&bank)?),
        Commands::Info { bank } => commands::probe::run_info(&mut open_bank(&bank)?),
        Commands::MassErase { bank } => commands::erase::run_mass_erase(&mut [open_bank(&bank)?]),
        Commands::Erase { bank, first, last } => {
            commands::erase::run_erase(&mut open_bank(&bank)?, first, last)
        }
        Commands::Write {
            bank,
            input,
            offset,
        } => commands::write::run_write(&mut open_bank(&bank)?, &input, offset),
        Commands::ListDevices { family } => commands::list_devices(family.as_deref()),
        Commands::ListTargets => {
            commands::list_targets();
            Ok(())
        }
    }
}

/// Open the target and declare the flash bank on it
fn open_bank(args: &BankArgs) -> Result<FlashBank<DummyTarget>, Box<dyn std::error::Error>> {
    let target = targets::open_target(&args.target)?;

    match &args.flash_bank {
        Some(decl) => {
            let words: Vec<&str> = decl.split_whitespace().collect();
            let decl = parse_bank_command(&words)?;
            log::debug!(
                "Flash bank '{}' at 0x{:08X}, size 0x{:X}",
                decl.name,
                decl.base,
                decl.size
            );
            Ok(decl.into_bank(target))
        }
        None => Ok(FlashBank::new(target, args.base, args.size)),
    }
}
