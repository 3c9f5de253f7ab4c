//! Probe and info command implementation

use stflash_core::Target;
use stflash_stm32::FlashBank;

/// Identify the device behind the bank
pub fn run_probe<T: Target>(bank: &mut FlashBank<T>) -> Result<(), Box<dyn std::error::Error>> {
    match bank.probe() {
        Ok(()) => {
            println!("Found: {}", bank.info()?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Probe failed: {}", e);
            Err(Box::new(e))
        }
    }
}

/// Print everything known about the bank
pub fn run_info<T: Target>(bank: &mut FlashBank<T>) -> Result<(), Box<dyn std::error::Error>> {
    bank.probe()?;

    let state = bank.state();
    let Some(dev) = state.descriptor() else {
        return Err("device not identified".into());
    };

    println!("Device:     {}", dev.name);
    println!("Family:     {}", dev.family);
    println!("Core:       {}", dev.arch);
    println!("IDCODE:     0x{:08X}", state.idcode());
    match state.revision() {
        Some(letter) => println!("Revision:   {}", letter),
        None => println!("Revision:   unknown"),
    }
    println!(
        "Flash:      {} KiB at 0x{:08X} (max {} KiB)",
        bank.size() / 1024,
        bank.base(),
        dev.max_flash_size / 1024
    );
    println!(
        "Sectors:    {} x {} KiB",
        bank.num_sectors(),
        dev.page_size / 1024
    );
    println!(
        "Bus width:  {} bytes (write alignment {}, minimal gap {})",
        bank.bus_width(),
        bank.write_alignment(),
        bank.minimal_write_gap()
    );
    println!("Commands:   {} mass_erase <bank_id>", dev.family.command_group());
    Ok(())
}
