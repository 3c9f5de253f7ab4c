//! Write command implementation

use indicatif::{ProgressBar, ProgressStyle};
use stflash_core::Target;
use stflash_stm32::FlashBank;
use std::fs;
use std::path::Path;

/// Chunk size for programming, a multiple of the 16-byte quad-word
const WRITE_CHUNK_SIZE: usize = 4096;

/// Program a file into the bank at `offset`
pub fn run_write<T: Target>(
    bank: &mut FlashBank<T>,
    input: &Path,
    offset: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    bank.auto_probe()?;

    let end = u64::from(offset) + data.len() as u64;
    if end > u64::from(bank.size()) {
        return Err(format!(
            "File is {} bytes but only {} bytes fit at offset 0x{:X}",
            data.len(),
            bank.size().saturating_sub(offset),
            offset
        )
        .into());
    }

    let pb = ProgressBar::new(data.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} Writing")?
            .progress_chars("#>-"),
    );

    let mut chunk_offset = offset;
    for chunk in data.chunks(WRITE_CHUNK_SIZE) {
        if let Err(e) = bank.write(chunk, chunk_offset) {
            pb.abandon_with_message("Write failed");
            return Err(e.into());
        }
        chunk_offset += chunk.len() as u32;
        pb.inc(chunk.len() as u64);
    }
    pb.finish();

    println!(
        "Wrote {} bytes at 0x{:08X}",
        data.len(),
        bank.base() + offset
    );
    Ok(())
}
