//! Target registry
//!
//! Targets are selected with a string of the form `name` or
//! `name:key1=value1,key2=value2`, parsed the same way for every target.

use std::collections::HashMap;

use stflash_dummy::DummyTarget;
use stflash_stm32::catalog::find_by_name;
use stflash_stm32::command::parse_number;
use stflash_stm32::emulator::emulated_mcu;

/// Information about a target
pub struct TargetInfo {
    /// Target name
    pub name: &'static str,
    /// Short description
    pub description: &'static str,
    /// Accepted parameters
    pub params: &'static str,
}

/// All known targets
pub const TARGETS: &[TargetInfo] = &[TargetInfo {
    name: "dummy",
    description: "Emulated MCU for testing without hardware",
    params: "device=<name>, rev=<rev id>, size=<KiB>, halted=<bool>",
}];

/// Parsed target parameters
pub struct TargetParams {
    /// Target name
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

/// Parse a target string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
pub fn parse_target_params(s: &str) -> Result<TargetParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.to_string(), value.to_string());
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(TargetParams {
        name: name.to_string(),
        params,
    })
}

/// Open a target by its specification string
pub fn open_target(spec: &str) -> Result<DummyTarget, Box<dyn std::error::Error>> {
    let params = parse_target_params(spec)?;
    match params.name.as_str() {
        "dummy" => open_dummy(&params.params),
        name => {
            let names: Vec<_> = TARGETS.iter().map(|t| t.name).collect();
            Err(format!(
                "Unknown target: {}\n\nAvailable targets: {}",
                name,
                names.join(", ")
            )
            .into())
        }
    }
}

fn open_dummy(params: &HashMap<String, String>) -> Result<DummyTarget, Box<dyn std::error::Error>> {
    let device = params.get("device").map(String::as_str).unwrap_or("h563");
    let dev = find_by_name(device).ok_or_else(|| format!("Unknown device: {}", device))?;

    let rev_id = match params.get("rev") {
        Some(rev) => u16::try_from(parse_number(rev)?)?,
        None => dev.revisions.first().map(|r| r.id).unwrap_or(0),
    };
    let size_kib = match params.get("size") {
        Some(size) => u16::try_from(parse_number(size)?)?,
        None => u16::try_from(dev.max_flash_size / 1024)?,
    };
    let halted = match params.get("halted") {
        Some(halted) => halted.parse::<bool>()?,
        None => true,
    };

    log::info!(
        "Emulating {} rev 0x{:04X} with {}kB flash",
        dev.name,
        rev_id,
        size_kib
    );

    let mut target = emulated_mcu(dev, rev_id, size_kib);
    target.set_halted(halted);
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stflash_core::{ArmArch, Target};

    #[test]
    fn test_parse_target_params() {
        let p = parse_target_params("dummy:device=h503,size=128").unwrap();
        assert_eq!(p.name, "dummy");
        assert_eq!(p.params.get("device").map(String::as_str), Some("h503"));
        assert_eq!(p.params.get("size").map(String::as_str), Some("128"));

        assert!(parse_target_params("dummy:device").is_err());
        assert!(parse_target_params("dummy").unwrap().params.is_empty());
    }

    #[test]
    fn test_open_dummy() {
        let t = open_target("dummy:device=h743,halted=false").unwrap();
        assert_eq!(t.arch(), Some(ArmArch::V7M));
        assert!(!t.is_halted());

        assert!(open_target("dummy:device=l476").is_err());
        assert!(open_target("stlink").is_err());
        assert!(open_target("dummy:size=0x20000").is_err());
    }
}
