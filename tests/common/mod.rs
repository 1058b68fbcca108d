#![allow(dead_code)]

/// Minimal image with a valid header shape: ARM branch at the entry point
/// and a populated title/code/maker block. The logo bitmap is absent, so
/// resets with a BIOS force the skip path.
pub fn make_rom(code: &[u8; 4]) -> Vec<u8> {
    let mut rom = vec![0u8; 0x1000];
    rom[3] = 0xEA;
    rom[0xA0..0xAC].copy_from_slice(b"INTEGRATION\0");
    rom[0xAC..0xB0].copy_from_slice(code);
    rom[0xB0..0xB2].copy_from_slice(b"01");
    rom
}

/// 16kiB image that passes BIOS validation.
pub fn make_bios() -> Vec<u8> {
    let mut bios = vec![0u8; 0x4000];
    bios[3] = 0xEA;
    bios
}
