//! STM32U5 / STM32H5 / STM32H7 flash controller register definitions
//!
//! Addresses and bit masks of the non-secure flash interface of each
//! family, plus the debug-visible identification registers.
//!
//! # Register Layout by Family
//!
//! - U5: one register set, errors cleared by writing the status register
//! - H5: one register set with a separate clear-control register
//! - H7: one register set per bank, banks 0x100 apart

// ============================================================================
// Shared
// ============================================================================

/// First unlock key
pub const FLASH_KEY1: u32 = 0x4567_0123;
/// Second unlock key
pub const FLASH_KEY2: u32 = 0xCDEF_89AB;

/// Main flash base on U5 and H5 parts
pub const FLASH_BANK_BASE: u32 = 0x0800_0000;

/// Mask of the device id in DBGMCU_IDCODE
pub const IDCODE_DEV_ID_MASK: u32 = 0x0000_0FFF;
/// Shift of the revision id in DBGMCU_IDCODE
pub const IDCODE_REV_ID_SHIFT: u32 = 16;

// ============================================================================
// STM32U5
// ============================================================================

/// U5 DBGMCU_IDCODE
pub const U5_DBGMCU_IDCODE: u32 = 0xE004_4000;
/// U5 flash size data register (16 bits, KiB)
pub const U5_FLASH_SIZE_DATA: u32 = 0x0BFA_07A0;

/// U5 flash interface base
pub const U5_FLASH_REGS: u32 = 0x4002_2000;
/// U5 non-secure key register
pub const U5_NSKEYR: u32 = U5_FLASH_REGS + 0x08;
/// U5 non-secure status register
pub const U5_NSSR: u32 = U5_FLASH_REGS + 0x20;
/// U5 non-secure control register
pub const U5_NSCR: u32 = U5_FLASH_REGS + 0x28;

// U5 NSSR bits
/// End of operation
pub const U5_NSSR_EOP: u32 = 0x0000_0001;
/// Busy
pub const U5_NSSR_BSY: u32 = 0x0001_0000;
/// OPERR | PROGERR | WRPERR | PGAERR | SIZERR | PGSERR | OPTWERR
pub const U5_NSSR_ERRORS: u32 = 0x0000_20FA;
/// Write-one-to-clear value for EOP and all error flags
pub const U5_NSSR_CLEAR: u32 = U5_NSSR_ERRORS | U5_NSSR_EOP;

// U5 NSCR bits
/// MER1
pub const U5_NSCR_MER1: u32 = 0x0000_0004;
/// MER2
pub const U5_NSCR_MER2: u32 = 0x0000_8000;
/// STRT
pub const U5_NSCR_STRT: u32 = 0x0001_0000;
/// LOCK
pub const U5_NSCR_LOCK: u32 = 0x8000_0000;
/// Erase both banks
pub const U5_NSCR_MASS_ERASE: u32 = U5_NSCR_STRT | U5_NSCR_MER2 | U5_NSCR_MER1;

// ============================================================================
// STM32H5
// ============================================================================

/// H5 DBGMCU_IDCODE
pub const H5_DBGMCU_IDCODE: u32 = 0x4402_4000;
/// H5 flash size data register (16 bits, KiB)
pub const H5_FLASH_SIZE_DATA: u32 = 0x08FF_F80C;

/// H5 flash interface base
pub const H5_FLASH_REGS: u32 = 0x4002_2000;
/// H5 non-secure key register
pub const H5_NSKEYR: u32 = H5_FLASH_REGS + 0x04;
/// H5 non-secure status register
pub const H5_NSSR: u32 = H5_FLASH_REGS + 0x20;
/// H5 non-secure control register
pub const H5_NSCR: u32 = H5_FLASH_REGS + 0x28;
/// H5 non-secure clear control register
pub const H5_NSCCR: u32 = H5_FLASH_REGS + 0x30;

// H5 NSSR bits
/// BSY | WBNE | DBNE
pub const H5_NSSR_BUSY: u32 = 0x0000_000B;
/// End of operation
pub const H5_NSSR_EOP: u32 = 0x0001_0000;
/// WRPERR | PGSERR | STRBERR | INCERR | OBKERR | OBKWERR | OPTCHANGEERR
pub const H5_NSSR_ERRORS: u32 = 0x00FE_0000;

/// H5 NSCCR: clear EOP and all error flags
pub const H5_NSCCR_CLEAR_ALL: u32 = 0x00FF_0000;

// H5 NSCR bits
/// LOCK
pub const H5_NSCR_LOCK: u32 = 0x0000_0001;
/// PG
pub const H5_NSCR_PG: u32 = 0x0000_0002;
/// SER
pub const H5_NSCR_SER: u32 = 0x0000_0004;
/// STRT
pub const H5_NSCR_STRT: u32 = 0x0000_0020;
/// SNB field shift (7 bits)
pub const H5_NSCR_SNB_SHIFT: u32 = 6;
/// MER
pub const H5_NSCR_MER: u32 = 0x0000_8000;
/// BKSEL
pub const H5_NSCR_BKSEL: u32 = 0x8000_0000;
/// Erase both banks
pub const H5_NSCR_MASS_ERASE: u32 = H5_NSCR_MER | H5_NSCR_STRT;
/// Erase one sector; combine with SNB and BKSEL
pub const H5_NSCR_SECTOR_ERASE: u32 = H5_NSCR_SER | H5_NSCR_STRT;

/// Largest sector count addressable through SNB
pub const H5_MAX_SECTORS_PER_BANK: u32 = 0x80;

// ============================================================================
// STM32H7
// ============================================================================

/// H7 DBGMCU_IDCODE
pub const H7_DBGMCU_IDCODE: u32 = 0x5C00_1000;
/// H7 flash size data register (16 bits, KiB)
pub const H7_FLASH_SIZE_DATA: u32 = 0x1FF1_E880;

/// H7 flash interface base (bank 1 registers)
pub const H7_FLASH_REGS: u32 = 0x5200_2000;
/// Distance between the bank 1 and bank 2 register sets
pub const H7_BANK_STRIDE: u32 = 0x100;
/// KEYR offset within a bank register set
pub const H7_KEYR_OFFSET: u32 = 0x04;
/// CR offset within a bank register set
pub const H7_CR_OFFSET: u32 = 0x0C;
/// SR offset within a bank register set
pub const H7_SR_OFFSET: u32 = 0x10;
/// CCR offset within a bank register set
pub const H7_CCR_OFFSET: u32 = 0x14;

// H7 SR bits
/// BSY | WBNE | CRC_BUSY
pub const H7_SR_BUSY: u32 = 0x0000_000B;
/// Bits 16..23, EOP included
pub const H7_SR_ERRORS: u32 = 0x00FF_0000;

/// H7 CCR: clear EOP and all error flags
pub const H7_CCR_CLEAR_ALL: u32 = 0x00FF_0000;

// H7 CR bits
/// LOCK
pub const H7_CR_LOCK: u32 = 0x0000_0001;
/// Bank erase start value (bits 15 and 5)
pub const H7_CR_MASS_ERASE: u32 = 0x0000_8020;
