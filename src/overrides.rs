//! Cartridge overrides: per-title save media, attached hardware, idle-loop
//! addresses and emulation quirks, keyed by the 4-byte game id.

use crate::savedata::SaveType;

pub const HW_RTC: u32 = 0x01;
pub const HW_RUMBLE: u32 = 0x02;
pub const HW_LIGHT_SENSOR: u32 = 0x04;
pub const HW_GYRO: u32 = 0x08;
pub const HW_TILT: u32 = 0x10;
pub const HW_GB_PLAYER_DETECTION: u32 = 0x20;

pub const IDLE_LOOP_NONE: u32 = 0xFFFF_FFFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CartridgeOverride {
    pub id: [u8; 4],
    pub save_type: Option<SaveType>,
    pub hardware: u32,
    pub idle_loop: u32,
    pub vba_bug_compat: bool,
}

impl CartridgeOverride {
    pub const fn new(id: [u8; 4]) -> Self {
        Self {
            id,
            save_type: None,
            hardware: 0,
            idle_loop: IDLE_LOOP_NONE,
            vba_bug_compat: false,
        }
    }
}

const fn entry(id: &[u8; 4], save_type: SaveType, hardware: u32) -> CartridgeOverride {
    CartridgeOverride {
        id: *id,
        save_type: Some(save_type),
        hardware,
        idle_loop: IDLE_LOOP_NONE,
        vba_bug_compat: false,
    }
}

const fn entry_idle(
    id: &[u8; 4],
    save_type: SaveType,
    hardware: u32,
    idle_loop: u32,
) -> CartridgeOverride {
    CartridgeOverride {
        id: *id,
        save_type: Some(save_type),
        hardware,
        idle_loop,
        vba_bug_compat: false,
    }
}

/// Built-in table for titles whose media or hardware cannot be detected
/// from the ROM image alone.
static DEFAULT_OVERRIDES: &[CartridgeOverride] = &[
    // Advance Wars
    entry_idle(b"AWRE", SaveType::Flash512, 0, 0x0803_8810),
    entry_idle(b"AWRP", SaveType::Flash512, 0, 0x0803_8810),
    // Advance Wars 2: Black Hole Rising
    entry_idle(b"AW2E", SaveType::Flash512, 0, 0x0803_6E08),
    entry_idle(b"AW2P", SaveType::Flash512, 0, 0x0803_6E08),
    // Boktai: The Sun is in Your Hand
    entry(b"U3IJ", SaveType::Eeprom, HW_RTC | HW_LIGHT_SENSOR),
    entry(b"U3IE", SaveType::Eeprom, HW_RTC | HW_LIGHT_SENSOR),
    entry(b"U3IP", SaveType::Eeprom, HW_RTC | HW_LIGHT_SENSOR),
    // Boktai 2: Solar Boy Django
    entry(b"U32J", SaveType::Eeprom, HW_RTC | HW_LIGHT_SENSOR),
    entry(b"U32E", SaveType::Eeprom, HW_RTC | HW_LIGHT_SENSOR),
    entry(b"U32P", SaveType::Eeprom, HW_RTC | HW_LIGHT_SENSOR),
    // Drill Dozer
    entry(b"V49J", SaveType::Sram, HW_RUMBLE),
    entry(b"V49E", SaveType::Sram, HW_RUMBLE),
    // Koro Koro Puzzle: Happy Panechu!
    entry(b"KHPJ", SaveType::Eeprom, HW_TILT),
    // Pokemon Ruby
    entry(b"AXVJ", SaveType::Flash1M, HW_RTC),
    entry(b"AXVE", SaveType::Flash1M, HW_RTC),
    entry(b"AXVP", SaveType::Flash1M, HW_RTC),
    // Pokemon Sapphire
    entry(b"AXPJ", SaveType::Flash1M, HW_RTC),
    entry(b"AXPE", SaveType::Flash1M, HW_RTC),
    entry(b"AXPP", SaveType::Flash1M, HW_RTC),
    // Pokemon Emerald
    entry(b"BPEJ", SaveType::Flash1M, HW_RTC),
    entry(b"BPEE", SaveType::Flash1M, HW_RTC),
    entry(b"BPEP", SaveType::Flash1M, HW_RTC),
    // Pokemon FireRed
    entry(b"BPRJ", SaveType::Flash1M, 0),
    entry(b"BPRE", SaveType::Flash1M, 0),
    entry(b"BPRP", SaveType::Flash1M, 0),
    // Pokemon LeafGreen
    entry(b"BPGJ", SaveType::Flash1M, 0),
    entry(b"BPGE", SaveType::Flash1M, 0),
    entry(b"BPGP", SaveType::Flash1M, 0),
    // WarioWare: Twisted!
    entry(b"RZWJ", SaveType::Sram, HW_RUMBLE | HW_GYRO),
    entry(b"RZWE", SaveType::Sram, HW_RUMBLE | HW_GYRO),
    // Yoshi's Universal Gravitation
    entry(b"KYGJ", SaveType::Eeprom, HW_TILT),
    entry(b"KYGE", SaveType::Eeprom, HW_TILT),
    entry(b"KYGP", SaveType::Eeprom, HW_TILT),
];

/// Look up the default override for a game id. Ids beginning with `F` are
/// the Classic NES series, which all carry EEPROM and ship with the
/// VBA-compatible misdetection quirk.
pub fn find(id: [u8; 4]) -> Option<CartridgeOverride> {
    if id[0] == b'F' {
        return Some(CartridgeOverride {
            id,
            save_type: Some(SaveType::Eeprom),
            hardware: 0,
            idle_loop: IDLE_LOOP_NONE,
            vba_bug_compat: true,
        });
    }
    DEFAULT_OVERRIDES.iter().copied().find(|o| o.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_title_resolves_media_and_hardware() {
        let o = find(*b"BPEE").unwrap();
        assert_eq!(o.save_type, Some(SaveType::Flash1M));
        assert_eq!(o.hardware, HW_RTC);
        assert_eq!(o.idle_loop, IDLE_LOOP_NONE);
    }

    #[test]
    fn classic_nes_prefix_matches_any_suffix() {
        let o = find(*b"FSME").unwrap();
        assert_eq!(o.save_type, Some(SaveType::Eeprom));
        assert!(o.vba_bug_compat);
    }

    #[test]
    fn unknown_title_has_no_override() {
        assert!(find(*b"ZZZZ").is_none());
    }
}
