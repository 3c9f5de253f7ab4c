//! Driver commands
//!
//! Parsing of the `flash bank` declaration and the `mass_erase` command
//! shared by the `stm32u5`, `stm32h5` and `stm32h7` command groups.

use std::io::Write;

use stflash_core::Target;

use crate::bank::FlashBank;
use crate::error::CommandError;

/// Driver name used in `flash bank` declarations
pub const DRIVER_NAME: &str = "stm32u5_h5_h7";

/// Usage of the `flash bank` declaration
pub const BANK_USAGE: &str = "<name> stm32u5_h5_h7 <base> <size> <chip_width> <bus_width> <target>";

/// Driver-specific commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Erase a whole bank
    MassErase,
}

/// Static description of one command
#[derive(Debug, Clone, Copy)]
pub struct CommandRegistration {
    /// Command name
    pub name: &'static str,
    /// Argument synopsis
    pub usage: &'static str,
    /// One-line help
    pub help: &'static str,
    /// Command to run
    pub command: Command,
}

/// A named group of commands
#[derive(Debug, Clone, Copy)]
pub struct CommandGroup {
    /// Group name
    pub name: &'static str,
    /// One-line help
    pub help: &'static str,
    /// Commands in the group
    pub commands: &'static [CommandRegistration],
}

const EXEC_COMMANDS: &[CommandRegistration] = &[CommandRegistration {
    name: "mass_erase",
    usage: "bank_id",
    help: "Erase entire flash device.",
    command: Command::MassErase,
}];

/// All command groups of this driver
pub static COMMAND_GROUPS: &[CommandGroup] = &[
    CommandGroup {
        name: "stm32u5",
        help: "stm32u5 flash command group",
        commands: EXEC_COMMANDS,
    },
    CommandGroup {
        name: "stm32h5",
        help: "stm32h5 flash command group",
        commands: EXEC_COMMANDS,
    },
    CommandGroup {
        name: "stm32h7",
        help: "stm32h7 flash command group",
        commands: EXEC_COMMANDS,
    },
];

/// Look up a command by group and name
pub fn find_command(group: &str, name: &str) -> Option<&'static CommandRegistration> {
    COMMAND_GROUPS
        .iter()
        .find(|g| g.name == group)?
        .commands
        .iter()
        .find(|c| c.name == name)
}

/// A parsed `flash bank` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankDeclaration {
    /// Bank name
    pub name: String,
    /// Base address
    pub base: u32,
    /// Size in bytes, 0 to take the device size
    pub size: u32,
    /// Declared chip width, replaced by probing
    pub chip_width: u32,
    /// Declared bus width, replaced by probing
    pub bus_width: u32,
    /// Target name, if given
    pub target: Option<String>,
}

impl BankDeclaration {
    /// Create the bank on `target`
    pub fn into_bank<T: Target>(self, target: T) -> FlashBank<T> {
        FlashBank::new(target, self.base, self.size)
    }
}

/// Parse a number in decimal or `0x` hex notation
pub fn parse_number(s: &str) -> Result<u32, CommandError> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse::<u32>()
    };
    parsed.map_err(|_| CommandError::InvalidNumber(s.to_string()))
}

/// Parse `flash bank` arguments
///
/// `<name> <driver> <base> <size> <chip_width> <bus_width> [<target>]`
pub fn parse_bank_command(args: &[&str]) -> Result<BankDeclaration, CommandError> {
    if args.len() < 6 {
        return Err(CommandError::Syntax { usage: BANK_USAGE });
    }
    if args[1] != DRIVER_NAME {
        return Err(CommandError::UnknownDriver(args[1].to_string()));
    }

    Ok(BankDeclaration {
        name: args[0].to_string(),
        base: parse_number(args[2])?,
        size: parse_number(args[3])?,
        chip_width: parse_number(args[4])?,
        bus_width: parse_number(args[5])?,
        target: args.get(6).map(|t| t.to_string()),
    })
}

/// `mass_erase <bank_id>`
///
/// Prints `Flash erased.` or `Flash erase failed!` to `out`.
pub fn mass_erase_command<T: Target, W: Write>(
    banks: &mut [FlashBank<T>],
    args: &[&str],
    out: &mut W,
) -> Result<(), CommandError> {
    let [bank_id] = args else {
        return Err(CommandError::Syntax { usage: "bank_id" });
    };
    let bank = get_bank(banks, bank_id)?;

    match bank.mass_erase() {
        Ok(()) => {
            writeln!(out, "Flash erased.")?;
            Ok(())
        }
        Err(e) => {
            writeln!(out, "Flash erase failed!")?;
            Err(e.into())
        }
    }
}

/// Run `<group> <name> <args...>`
pub fn execute<T: Target, W: Write>(
    group: &str,
    name: &str,
    banks: &mut [FlashBank<T>],
    args: &[&str],
    out: &mut W,
) -> Result<(), CommandError> {
    let registration = find_command(group, name).ok_or_else(|| CommandError::UnknownCommand {
        group: group.to_string(),
        name: name.to_string(),
    })?;

    match registration.command {
        Command::MassErase => mass_erase_command(banks, args, out),
    }
}

fn get_bank<'a, T>(banks: &'a mut [FlashBank<T>], id: &str) -> Result<&'a mut FlashBank<T>, CommandError> {
    let index = id
        .parse::<usize>()
        .map_err(|_| CommandError::NoSuchBank(id.to_string()))?;
    banks
        .get_mut(index)
        .ok_or_else(|| CommandError::NoSuchBank(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_by_name;
    use crate::emulator::emulated_mcu;
    use stflash_core::Error;
    use stflash_dummy::DummyTarget;

    fn banks(name: &str) -> Vec<FlashBank<DummyTarget>> {
        let dev = find_by_name(name).unwrap();
        vec![FlashBank::new(emulated_mcu(dev, 0x1001, 0), 0x0800_0000, 0)]
    }

    #[test]
    fn test_parse_bank_command() {
        let decl = parse_bank_command(&[
            "$_FLASHNAME",
            "stm32u5_h5_h7",
            "0x08000000",
            "0",
            "0",
            "0",
            "$_TARGETNAME",
        ])
        .unwrap();
        assert_eq!(decl.base, 0x0800_0000);
        assert_eq!(decl.size, 0);
        assert_eq!(decl.target.as_deref(), Some("$_TARGETNAME"));

        let decl = parse_bank_command(&["b", "stm32u5_h5_h7", "0x08000000", "131072", "0", "0"])
            .unwrap();
        assert_eq!(decl.size, 128 * 1024);
        assert_eq!(decl.target, None);
    }

    #[test]
    fn test_parse_bank_command_errors() {
        assert!(matches!(
            parse_bank_command(&["b", "stm32u5_h5_h7", "0x08000000", "0", "0"]),
            Err(CommandError::Syntax { .. })
        ));
        assert!(matches!(
            parse_bank_command(&["b", "stm32l4x", "0x08000000", "0", "0", "0"]),
            Err(CommandError::UnknownDriver(_))
        ));
        assert!(matches!(
            parse_bank_command(&["b", "stm32u5_h5_h7", "flash", "0", "0", "0"]),
            Err(CommandError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_registration_table() {
        for group in ["stm32u5", "stm32h5", "stm32h7"] {
            let cmd = find_command(group, "mass_erase").unwrap();
            assert_eq!(cmd.usage, "bank_id");
            assert_eq!(cmd.help, "Erase entire flash device.");
        }
        assert!(find_command("stm32l4x", "mass_erase").is_none());
        assert!(find_command("stm32h5", "unlock").is_none());
    }

    #[test]
    fn test_mass_erase_command_output() {
        let mut banks = banks("H503");
        let mut out = Vec::new();
        mass_erase_command(&mut banks, &["0"], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Flash erased.\n");
    }

    #[test]
    fn test_mass_erase_command_failure() {
        let mut banks = banks("H503");
        banks[0].target_mut().set_halted(false);
        let mut out = Vec::new();
        let err = mass_erase_command(&mut banks, &["0"], &mut out).unwrap_err();
        assert!(matches!(err, CommandError::Flash(Error::TargetNotHalted)));
        assert_eq!(String::from_utf8(out).unwrap(), "Flash erase failed!\n");
    }

    #[test]
    fn test_mass_erase_command_arity() {
        let mut banks = banks("U575");
        let mut out = Vec::new();
        assert!(matches!(
            mass_erase_command(&mut banks, &[], &mut out),
            Err(CommandError::Syntax { usage: "bank_id" })
        ));
        assert!(matches!(
            mass_erase_command(&mut banks, &["0", "1"], &mut out),
            Err(CommandError::Syntax { .. })
        ));
        assert!(matches!(
            mass_erase_command(&mut banks, &["3"], &mut out),
            Err(CommandError::NoSuchBank(_))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_execute() {
        let mut banks = banks("H743");
        let mut out = Vec::new();
        execute("stm32h7", "mass_erase", &mut banks, &["0"], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Flash erased.\n");

        let mut out = Vec::new();
        assert!(matches!(
            execute("stm32h7", "lock", &mut banks, &["0"], &mut out),
            Err(CommandError::UnknownCommand { .. })
        ));
    }
}
