//! List commands implementation

use stflash_stm32::catalog::{self, Family};

use crate::targets::TARGETS;

/// List all available targets
pub fn list_targets() {
    println!("Available targets:");
    println!();
    for target in TARGETS {
        println!("  {:<9} - {}", target.name, target.description);
        println!("              {}", target.params);
    }
}

/// List supported devices, optionally filtered by family
pub fn list_devices(family_filter: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let family = family_filter.map(parse_family).transpose()?;

    println!("Supported devices:");
    println!();
    println!(
        "{:<24} {:>6} {:>8} {:>9} {:>6}  {}",
        "Name", "DevID", "Arch", "Flash", "Page", "Operations"
    );
    println!("{}", "-".repeat(78));

    for dev in catalog::devices() {
        if family.is_some_and(|f| f != dev.family) {
            continue;
        }

        let ops: Vec<_> = dev.capabilities.iter_names().map(|(name, _)| name).collect();
        println!(
            "{:<24} {:>6} {:>8} {:>9} {:>6}  {}",
            dev.name,
            format!("0x{:03X}", dev.dev_id),
            dev.arch.to_string(),
            format_size(dev.max_flash_size),
            format_size(dev.page_size),
            ops.join(", ").to_lowercase()
        );
    }
    Ok(())
}

fn parse_family(s: &str) -> Result<Family, String> {
    match s.to_lowercase().trim_start_matches("stm32") {
        "u5" => Ok(Family::U5),
        "h5" => Ok(Family::H5),
        "h7" => Ok(Family::H7),
        other => Err(format!("Unknown family: {} (expected u5, h5 or h7)", other)),
    }
}

fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}
