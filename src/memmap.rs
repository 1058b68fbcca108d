//! GBA address-space constants and the memory-block catalog templates.
//!
//! One template exists per save-media variant plus a base layout with no
//! save region; the façade copies the matching template into its owned
//! vector whenever the board's save-media tag changes.

use crate::core::{
    MEMORY_MAPPED, MEMORY_READ, MEMORY_RW, MEMORY_VIRTUAL, MEMORY_WORM, MemoryBlock,
};
use crate::savedata::SaveType;

pub const GBA_BASE_BIOS: u32 = 0x0000_0000;
pub const GBA_BASE_EWRAM: u32 = 0x0200_0000;
pub const GBA_BASE_IWRAM: u32 = 0x0300_0000;
pub const GBA_BASE_IO: u32 = 0x0400_0000;
pub const GBA_BASE_PALETTE_RAM: u32 = 0x0500_0000;
pub const GBA_BASE_VRAM: u32 = 0x0600_0000;
pub const GBA_BASE_OAM: u32 = 0x0700_0000;
pub const GBA_BASE_ROM0: u32 = 0x0800_0000;
pub const GBA_BASE_ROM1: u32 = 0x0A00_0000;
pub const GBA_BASE_ROM2: u32 = 0x0C00_0000;
pub const GBA_BASE_SRAM: u32 = 0x0E00_0000;
pub const GBA_BASE_SRAM_MIRROR: u32 = 0x0F00_0000;

pub const GBA_SIZE_BIOS: u32 = 0x4000;
pub const GBA_SIZE_EWRAM: u32 = 0x4_0000;
pub const GBA_SIZE_IWRAM: u32 = 0x8000;
pub const GBA_SIZE_IO: u32 = 0x400;
pub const GBA_SIZE_PALETTE_RAM: u32 = 0x400;
pub const GBA_SIZE_VRAM: u32 = 0x1_8000;
pub const GBA_SIZE_OAM: u32 = 0x400;
pub const GBA_SIZE_ROM0: u32 = 0x200_0000;
pub const GBA_SIZE_SRAM: u32 = 0x8000;
pub const GBA_SIZE_SRAM512: u32 = 0x1_0000;
pub const GBA_SIZE_FLASH512: u32 = 0x1_0000;
pub const GBA_SIZE_FLASH1M: u32 = 0x2_0000;
pub const GBA_SIZE_EEPROM: u32 = 0x2000;
pub const GBA_SIZE_EEPROM512: u32 = 0x200;

/// Minimum loadable image: the cartridge header.
pub const GBA_SIZE_CART_HEADER: usize = 0xC0;

pub const GBA_VIDEO_HORIZONTAL_PIXELS: u32 = 240;
pub const GBA_VIDEO_VERTICAL_PIXELS: u32 = 160;
pub const GBA_VIDEO_VERTICAL_TOTAL: u32 = 228;
/// Cycles per scanline, including HBlank.
pub const VIDEO_HORIZONTAL_LENGTH: u32 = 1232;
/// Cycles per full frame.
pub const VIDEO_TOTAL_LENGTH: u32 = VIDEO_HORIZONTAL_LENGTH * GBA_VIDEO_VERTICAL_TOTAL;

pub const GBA_ARM7TDMI_FREQUENCY: i32 = 0x100_0000;

/// Region ids, matching the high byte of the region's bus address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum Region {
    Bios = 0x0,
    Ewram = 0x2,
    Iwram = 0x3,
    Io = 0x4,
    PaletteRam = 0x5,
    Vram = 0x6,
    Oam = 0x7,
    Rom0 = 0x8,
    Rom1 = 0xA,
    Rom2 = 0xC,
    Sram = 0xE,
    SramMirror = 0xF,
}

const fn block(
    id: i32,
    internal_name: &'static str,
    short_name: &'static str,
    long_name: &'static str,
    start: u32,
    end: u32,
    size: u32,
    flags: u32,
) -> MemoryBlock {
    MemoryBlock {
        id,
        internal_name,
        short_name,
        long_name,
        start,
        end,
        size,
        flags,
        max_segment: 0,
        segment_start: 0,
    }
}

const BLOCK_ALL: MemoryBlock = block(
    -1,
    "mem",
    "All",
    "All",
    0,
    0x1000_0000,
    0x1000_0000,
    MEMORY_VIRTUAL,
);
const BLOCK_BIOS: MemoryBlock = block(
    Region::Bios as i32,
    "bios",
    "BIOS",
    "BIOS (16kiB)",
    GBA_BASE_BIOS,
    GBA_BASE_BIOS + GBA_SIZE_BIOS,
    GBA_SIZE_BIOS,
    MEMORY_READ | MEMORY_MAPPED,
);
const BLOCK_EWRAM: MemoryBlock = block(
    Region::Ewram as i32,
    "wram",
    "EWRAM",
    "Working RAM (256kiB)",
    GBA_BASE_EWRAM,
    GBA_BASE_EWRAM + GBA_SIZE_EWRAM,
    GBA_SIZE_EWRAM,
    MEMORY_RW | MEMORY_MAPPED,
);
const BLOCK_IWRAM: MemoryBlock = block(
    Region::Iwram as i32,
    "iwram",
    "IWRAM",
    "Internal Working RAM (32kiB)",
    GBA_BASE_IWRAM,
    GBA_BASE_IWRAM + GBA_SIZE_IWRAM,
    GBA_SIZE_IWRAM,
    MEMORY_RW | MEMORY_MAPPED,
);
const BLOCK_IO: MemoryBlock = block(
    Region::Io as i32,
    "io",
    "MMIO",
    "Memory-Mapped I/O",
    GBA_BASE_IO,
    GBA_BASE_IO + GBA_SIZE_IO,
    GBA_SIZE_IO,
    MEMORY_RW | MEMORY_MAPPED,
);
const BLOCK_PALETTE: MemoryBlock = block(
    Region::PaletteRam as i32,
    "palette",
    "Palette",
    "Palette RAM (1kiB)",
    GBA_BASE_PALETTE_RAM,
    GBA_BASE_PALETTE_RAM + GBA_SIZE_PALETTE_RAM,
    GBA_SIZE_PALETTE_RAM,
    MEMORY_RW | MEMORY_MAPPED,
);
const BLOCK_VRAM: MemoryBlock = block(
    Region::Vram as i32,
    "vram",
    "VRAM",
    "Video RAM (96kiB)",
    GBA_BASE_VRAM,
    GBA_BASE_VRAM + GBA_SIZE_VRAM,
    GBA_SIZE_VRAM,
    MEMORY_RW | MEMORY_MAPPED,
);
const BLOCK_OAM: MemoryBlock = block(
    Region::Oam as i32,
    "oam",
    "OAM",
    "OBJ Attribute Memory (1kiB)",
    GBA_BASE_OAM,
    GBA_BASE_OAM + GBA_SIZE_OAM,
    GBA_SIZE_OAM,
    MEMORY_RW | MEMORY_MAPPED,
);
const BLOCK_ROM0: MemoryBlock = block(
    Region::Rom0 as i32,
    "cart0",
    "ROM",
    "Game Pak (32MiB)",
    GBA_BASE_ROM0,
    GBA_BASE_ROM0 + GBA_SIZE_ROM0,
    GBA_SIZE_ROM0,
    MEMORY_READ | MEMORY_WORM | MEMORY_MAPPED,
);
const BLOCK_ROM1: MemoryBlock = block(
    Region::Rom1 as i32,
    "cart1",
    "ROM WS1",
    "Game Pak (Waitstate 1)",
    GBA_BASE_ROM1,
    GBA_BASE_ROM1 + GBA_SIZE_ROM0,
    GBA_SIZE_ROM0,
    MEMORY_READ | MEMORY_WORM | MEMORY_MAPPED,
);
const BLOCK_ROM2: MemoryBlock = block(
    Region::Rom2 as i32,
    "cart2",
    "ROM WS2",
    "Game Pak (Waitstate 2)",
    GBA_BASE_ROM2,
    GBA_BASE_ROM2 + GBA_SIZE_ROM0,
    GBA_SIZE_ROM0,
    MEMORY_READ | MEMORY_WORM | MEMORY_MAPPED,
);

const BLOCK_SRAM: MemoryBlock = block(
    Region::Sram as i32,
    "sram",
    "SRAM",
    "Static RAM (32kiB)",
    GBA_BASE_SRAM,
    GBA_BASE_SRAM + GBA_SIZE_SRAM,
    GBA_SIZE_SRAM,
    MEMORY_RW | MEMORY_MAPPED,
);
const BLOCK_SRAM512: MemoryBlock = block(
    Region::Sram as i32,
    "sram",
    "SRAM",
    "Static RAM (64kiB)",
    GBA_BASE_SRAM,
    GBA_BASE_SRAM + GBA_SIZE_SRAM512,
    GBA_SIZE_SRAM512,
    MEMORY_RW | MEMORY_MAPPED,
);
const BLOCK_FLASH512: MemoryBlock = block(
    Region::Sram as i32,
    "sram",
    "Flash",
    "Flash Memory (64kiB)",
    GBA_BASE_SRAM,
    GBA_BASE_SRAM + GBA_SIZE_FLASH512,
    GBA_SIZE_FLASH512,
    MEMORY_RW | MEMORY_MAPPED,
);
const BLOCK_FLASH1M: MemoryBlock = MemoryBlock {
    max_segment: 1,
    segment_start: GBA_BASE_SRAM,
    ..block(
        Region::Sram as i32,
        "sram",
        "Flash",
        "Flash Memory (128kiB)",
        GBA_BASE_SRAM,
        GBA_BASE_SRAM + GBA_SIZE_FLASH512,
        GBA_SIZE_FLASH1M,
        MEMORY_RW | MEMORY_MAPPED,
    )
};
const BLOCK_EEPROM: MemoryBlock = block(
    Region::SramMirror as i32,
    "eeprom",
    "EEPROM",
    "EEPROM (8kiB)",
    0,
    GBA_SIZE_EEPROM,
    GBA_SIZE_EEPROM,
    MEMORY_RW,
);
const BLOCK_EEPROM512: MemoryBlock = block(
    Region::SramMirror as i32,
    "eeprom",
    "EEPROM",
    "EEPROM (512B)",
    0,
    GBA_SIZE_EEPROM,
    GBA_SIZE_EEPROM512,
    MEMORY_RW,
);

macro_rules! base_blocks {
    ($($extra:expr),*) => {
        [
            BLOCK_ALL, BLOCK_BIOS, BLOCK_EWRAM, BLOCK_IWRAM, BLOCK_IO, BLOCK_PALETTE,
            BLOCK_VRAM, BLOCK_OAM, BLOCK_ROM0, BLOCK_ROM1, BLOCK_ROM2, $($extra),*
        ]
    };
}

pub static MEMORY_BLOCKS_BASE: [MemoryBlock; 11] = base_blocks!();
pub static MEMORY_BLOCKS_SRAM: [MemoryBlock; 12] = base_blocks!(BLOCK_SRAM);
pub static MEMORY_BLOCKS_SRAM512: [MemoryBlock; 12] = base_blocks!(BLOCK_SRAM512);
pub static MEMORY_BLOCKS_FLASH512: [MemoryBlock; 12] = base_blocks!(BLOCK_FLASH512);
pub static MEMORY_BLOCKS_FLASH1M: [MemoryBlock; 12] = base_blocks!(BLOCK_FLASH1M);
pub static MEMORY_BLOCKS_EEPROM: [MemoryBlock; 12] = base_blocks!(BLOCK_EEPROM);
pub static MEMORY_BLOCKS_EEPROM512: [MemoryBlock; 12] = base_blocks!(BLOCK_EEPROM512);

/// The catalog template matching a save-media type.
pub fn catalog_for(save_type: SaveType) -> &'static [MemoryBlock] {
    match save_type {
        SaveType::Sram => &MEMORY_BLOCKS_SRAM,
        SaveType::Sram512 => &MEMORY_BLOCKS_SRAM512,
        SaveType::Flash512 => &MEMORY_BLOCKS_FLASH512,
        SaveType::Flash1M => &MEMORY_BLOCKS_FLASH1M,
        SaveType::Eeprom => &MEMORY_BLOCKS_EEPROM,
        SaveType::Eeprom512 => &MEMORY_BLOCKS_EEPROM512,
        SaveType::None => &MEMORY_BLOCKS_BASE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_catalog_has_no_save_region() {
        assert_eq!(MEMORY_BLOCKS_BASE.len(), 11);
        assert!(
            MEMORY_BLOCKS_BASE
                .iter()
                .all(|b| b.id != Region::Sram as i32 && b.id != Region::SramMirror as i32)
        );
    }

    #[test]
    fn flash1m_catalog_reports_banked_flash() {
        let sram = MEMORY_BLOCKS_FLASH1M
            .iter()
            .find(|b| b.id == Region::Sram as i32)
            .unwrap();
        assert_eq!(sram.size, GBA_SIZE_FLASH1M);
        assert_eq!(sram.end - sram.start, GBA_SIZE_FLASH512);
        assert_eq!(sram.max_segment, 1);
    }

    #[test]
    fn every_template_is_selected_by_its_tag() {
        for save_type in [
            SaveType::None,
            SaveType::Sram,
            SaveType::Sram512,
            SaveType::Flash512,
            SaveType::Flash1M,
            SaveType::Eeprom,
            SaveType::Eeprom512,
        ] {
            let catalog = catalog_for(save_type);
            assert!(catalog.len() >= 11);
        }
    }
}
