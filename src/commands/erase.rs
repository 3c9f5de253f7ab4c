//! Erase command implementation

use indicatif::{ProgressBar, ProgressStyle};
use stflash_core::Target;
use stflash_stm32::{command, FlashBank};
use std::time::Duration;

/// Erase the whole device through the driver's `mass_erase` command
pub fn run_mass_erase<T: Target>(
    banks: &mut [FlashBank<T>],
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(bank) = banks.first_mut() else {
        return Err("no flash bank declared".into());
    };
    bank.auto_probe()?;
    let group = match bank.descriptor() {
        Some(dev) => dev.family.command_group(),
        None => return Err("device not identified".into()),
    };

    let pb = spinner("Erasing entire flash (this may take a while)...")?;
    let mut out = Vec::new();
    let result = command::execute(group, "mass_erase", banks, &["0"], &mut out);
    pb.finish_and_clear();

    print!("{}", String::from_utf8_lossy(&out));
    result.map_err(Into::into)
}

/// Erase sectors `first..=last` with a progress spinner
pub fn run_erase<T: Target>(
    bank: &mut FlashBank<T>,
    first: u32,
    last: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    bank.auto_probe()?;

    let pb = spinner(&format!("Erasing sectors {}..={}...", first, last))?;
    let result = bank.erase(first, last);
    match &result {
        Ok(()) => pb.finish_with_message(format!("Erased sectors {}..={}", first, last)),
        Err(e) => pb.abandon_with_message(format!("Erase failed: {}", e)),
    }
    result.map_err(Into::into)
}

fn spinner(message: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
