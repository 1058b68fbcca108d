//! The board aggregate: memories, the MMIO file, keypad state, the bus and
//! raw access planes, ROM/BIOS ingest and the event clock.

use md5::{Digest, Md5};
use sha1::Sha1;

use crate::audio::Audio;
use crate::core::{
    AvStream, Checksum, ChecksumKind, CoreCallbacks, CoreSync, GameInfo, LuminanceSource, Rumble,
    RotationSource,
};
use crate::memmap::{
    GBA_SIZE_BIOS, GBA_SIZE_CART_HEADER, GBA_SIZE_EWRAM, GBA_SIZE_IO, GBA_SIZE_IWRAM,
    GBA_SIZE_OAM, GBA_SIZE_PALETTE_RAM, GBA_SIZE_VRAM, Region,
};
use crate::overrides::IDLE_LOOP_NONE;
use crate::savedata::Savedata;
use crate::sio::SioDriver;
use crate::video::Video;

/// CRC-32 of the header logo bitmap on a legitimately mastered cartridge.
pub const LOGO_CRC32: u32 = 0xD0BE_B55E;

pub const IO_KEYINPUT: usize = 0x130;
pub const IO_KEYCNT: usize = 0x132;
pub const IO_IE: usize = 0x200;
pub const IO_IF: usize = 0x202;
pub const IO_IME: usize = 0x208;
pub const IO_HALTCNT: usize = 0x301;
pub const IRQ_KEYPAD: u16 = 1 << 12;

/// BIOS images are exactly 16kiB and open with an ARM branch.
pub fn is_bios(data: &[u8]) -> bool {
    data.len() == GBA_SIZE_BIOS as usize && data.get(3) == Some(&0xEA)
}

/// Anything with a full header and an ARM branch at the entry point.
pub fn is_rom(data: &[u8]) -> bool {
    data.len() >= GBA_SIZE_CART_HEADER && data.get(3) == Some(&0xEA)
}

/// Multiboot images are small enough for EWRAM and branch within the file.
pub fn is_mb(data: &[u8]) -> bool {
    if !is_rom(data) || data.len() > GBA_SIZE_EWRAM as usize {
        return false;
    }
    let entry = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let offset = ((entry & 0x00FF_FFFF) << 2).wrapping_add(8) as usize;
    // The entry branch must clear the header but stay inside the image.
    (GBA_SIZE_CART_HEADER..data.len()).contains(&offset)
}

#[derive(Default)]
pub struct Timing {
    pub time: u64,
}

/// Idle-loop handling policy. `Detect` downgrades to `Remove` once a loop
/// address is known.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdleOptimization {
    Ignore,
    #[default]
    Remove,
    Detect,
}

pub struct Board {
    pub bios: Option<Vec<u8>>,
    pub ewram: Vec<u8>,
    pub iwram: Vec<u8>,
    pub io: Vec<u8>,
    pub palette: Vec<u8>,
    pub vram: Vec<u8>,
    pub oam: Vec<u8>,
    pub rom: Vec<u8>,
    rom_unpatched: Option<Vec<u8>>,
    pub rom_crc32: u32,
    pub multiboot: bool,
    keys: u16,
    pub savedata: Savedata,
    pub timing: Timing,
    pub video: Video,
    pub audio: Audio,
    pub sio: Option<Box<dyn SioDriver>>,
    pub rotation: Option<Box<dyn RotationSource>>,
    pub rumble: Option<Box<dyn Rumble>>,
    pub luminance: Option<Box<dyn LuminanceSource>>,
    pub callbacks: Vec<CoreCallbacks>,
    pub sync: Option<Box<dyn CoreSync>>,
    pub av_stream: Option<Box<dyn AvStream>>,
    pub hardware: u32,
    pub idle_loop: u32,
    pub idle_optimization: IdleOptimization,
    pub vba_bug_compat: bool,
    pub allow_opposing_directions: bool,
    early_exit: bool,
    halt_request: bool,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            bios: None,
            ewram: vec![0; GBA_SIZE_EWRAM as usize],
            iwram: vec![0; GBA_SIZE_IWRAM as usize],
            io: vec![0; GBA_SIZE_IO as usize],
            palette: vec![0; GBA_SIZE_PALETTE_RAM as usize],
            vram: vec![0; GBA_SIZE_VRAM as usize],
            oam: vec![0; GBA_SIZE_OAM as usize],
            rom: Vec::new(),
            rom_unpatched: None,
            rom_crc32: 0,
            multiboot: false,
            keys: 0,
            savedata: Savedata::new(),
            timing: Timing::default(),
            video: Video::new(),
            audio: Audio::new(),
            sio: None,
            rotation: None,
            rumble: None,
            luminance: None,
            callbacks: Vec::new(),
            sync: None,
            av_stream: None,
            hardware: 0,
            idle_loop: IDLE_LOOP_NONE,
            idle_optimization: IdleOptimization::default(),
            vba_bug_compat: true,
            allow_opposing_directions: false,
            early_exit: false,
            halt_request: false,
        }
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Power-on memory state. Input, loaded media and attachments survive.
    pub fn reset(&mut self) {
        self.ewram.fill(0);
        self.iwram.fill(0);
        self.io.fill(0);
        self.palette.fill(0);
        self.vram.fill(0);
        self.oam.fill(0);
        self.savedata.reset();
        self.timing.time = 0;
        self.video.reset();
        self.audio.reset();
        self.early_exit = false;
        self.halt_request = false;
        if let Some(sio) = self.sio.as_mut() {
            sio.reset();
        }
        // KEYINPUT is live; seed the stored copy from current input.
        let raw = !self.keys & 0x3FF;
        self.io[IO_KEYINPUT..IO_KEYINPUT + 2].copy_from_slice(&raw.to_le_bytes());
    }

    // --- ROM and BIOS ingest -------------------------------------------

    pub fn load_rom(&mut self, data: Vec<u8>) -> bool {
        if data.len() < GBA_SIZE_CART_HEADER {
            return false;
        }
        self.multiboot = is_mb(&data);
        self.rom_crc32 = crc32fast::hash(&data);
        self.rom = data;
        self.rom_unpatched = None;
        true
    }

    pub fn unload_rom(&mut self) {
        self.rom = Vec::new();
        self.rom_unpatched = None;
        self.rom_crc32 = 0;
        self.multiboot = false;
    }

    pub fn load_bios(&mut self, data: Vec<u8>) -> bool {
        if !is_bios(&data) {
            return false;
        }
        self.bios = Some(data);
        true
    }

    pub fn has_bios(&self) -> bool {
        self.bios.is_some()
    }

    pub fn game_id(&self) -> Option<[u8; 4]> {
        let code = self.rom.get(0xAC..0xB0)?;
        Some([code[0], code[1], code[2], code[3]])
    }

    pub fn game_info(&self) -> Option<GameInfo> {
        if self.rom.len() < GBA_SIZE_CART_HEADER {
            return None;
        }
        let text = |range: std::ops::Range<usize>| {
            String::from_utf8_lossy(&self.rom[range])
                .trim_end_matches('\0')
                .to_string()
        };
        Some(GameInfo {
            title: text(0xA0..0xAC),
            code: text(0xAC..0xB0),
            maker: text(0xB0..0xB2),
            version: self.rom[0xBC],
        })
    }

    /// CRC-32 over the header logo bitmap, when enough ROM is present.
    pub fn rom_logo_crc32(&self) -> Option<u32> {
        let logo = self.rom.get(1..0x9D)?;
        Some(crc32fast::hash(logo))
    }

    /// Checksums always describe the pristine image, not patched bytes.
    pub fn checksum(&self, kind: ChecksumKind) -> Checksum {
        let data = self.rom_unpatched.as_deref().unwrap_or(&self.rom);
        match kind {
            ChecksumKind::Crc32 => Checksum::Crc32(crc32fast::hash(data)),
            ChecksumKind::Md5 => Checksum::Md5(Md5::digest(data).into()),
            ChecksumKind::Sha1 => Checksum::Sha1(Sha1::digest(data).into()),
        }
    }

    /// Patch a ROM byte, stashing the pristine image on first touch.
    pub fn patch_rom(&mut self, offset: usize, value: u8) {
        if offset >= self.rom.len() {
            return;
        }
        if self.rom_unpatched.is_none() {
            self.rom_unpatched = Some(self.rom.clone());
        }
        self.rom[offset] = value;
    }

    // --- Keypad --------------------------------------------------------

    pub fn set_keys(&mut self, keys: u16) {
        let mut keys = keys & 0x3FF;
        if !self.allow_opposing_directions {
            // Opposing D-pad pairs cancel out, as on real hardware.
            if keys & 0x0030 == 0x0030 {
                keys &= !0x0030;
            }
            if keys & 0x00C0 == 0x00C0 {
                keys &= !0x00C0;
            }
        }
        self.keys = keys;
        self.sync_keyinput();
        self.test_keypad_irq();
    }

    pub fn add_keys(&mut self, keys: u16) {
        self.set_keys(self.keys | keys);
    }

    pub fn clear_keys(&mut self, keys: u16) {
        self.set_keys(self.keys & !keys);
    }

    pub fn get_keys(&self) -> u16 {
        self.keys
    }

    fn sync_keyinput(&mut self) {
        let raw = !self.keys & 0x3FF;
        self.io[IO_KEYINPUT..IO_KEYINPUT + 2].copy_from_slice(&raw.to_le_bytes());
    }

    fn test_keypad_irq(&mut self) {
        let keycnt = self.io16(IO_KEYCNT);
        if keycnt & 0x4000 == 0 {
            return;
        }
        let selected = keycnt & 0x3FF;
        let fired = if keycnt & 0x8000 != 0 {
            selected != 0 && self.keys & selected == selected
        } else {
            self.keys & selected != 0
        };
        if fired {
            let raised = self.io16(IO_IF) | IRQ_KEYPAD;
            self.io[IO_IF..IO_IF + 2].copy_from_slice(&raised.to_le_bytes());
        }
    }

    // --- MMIO ----------------------------------------------------------

    pub fn io16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.io[offset], self.io[offset + 1]])
    }

    fn io_read8(&self, offset: usize) -> u8 {
        self.io[offset]
    }

    fn io_write8(&mut self, offset: usize, value: u8) {
        match offset {
            IO_KEYINPUT | 0x131 => {}
            IO_IF | 0x203 => self.io[offset] &= !value,
            IO_IME => self.io[offset] = value & 1,
            0x209..=0x20B => {}
            IO_HALTCNT => self.halt_request = true,
            0x200 | 0x201 => {
                self.io[offset] = value;
                let masked = self.io16(IO_IE) & 0x3FFF;
                self.io[IO_IE..IO_IE + 2].copy_from_slice(&masked.to_le_bytes());
            }
            IO_KEYCNT | 0x133 => {
                self.io[offset] = value;
                self.test_keypad_irq();
            }
            _ => self.io[offset] = value,
        }
    }

    // --- Bus plane -----------------------------------------------------

    pub fn bus_read8(&mut self, address: u32) -> u8 {
        match address >> 24 {
            0x0 | 0x1 => match &self.bios {
                Some(bios) if (address as usize) < bios.len() => bios[address as usize],
                _ => 0,
            },
            0x2 => self.ewram[address as usize & (GBA_SIZE_EWRAM as usize - 1)],
            0x3 => self.iwram[address as usize & (GBA_SIZE_IWRAM as usize - 1)],
            0x4 => {
                let offset = (address & 0x00FF_FFFF) as usize;
                if offset < GBA_SIZE_IO as usize {
                    self.io_read8(offset)
                } else {
                    0
                }
            }
            0x5 => self.palette[address as usize & (GBA_SIZE_PALETTE_RAM as usize - 1)],
            0x6 => self.vram[vram_offset(address)],
            0x7 => self.oam[address as usize & (GBA_SIZE_OAM as usize - 1)],
            0x8..=0xD => {
                let offset = (address & 0x01FF_FFFF) as usize;
                if offset < self.rom.len() {
                    self.rom[offset]
                } else {
                    // Open bus: the address echoes back.
                    ((address >> 1) & 0xFF) as u8
                }
            }
            0xE | 0xF => {
                if self.savedata.save_type().is_bus_mapped() {
                    let window = self.savedata.window();
                    window[address as usize & (window.len() - 1)]
                } else {
                    0xFF
                }
            }
            _ => 0,
        }
    }

    pub fn bus_read16(&mut self, address: u32) -> u16 {
        let address = address & !1;
        u16::from_le_bytes([self.bus_read8(address), self.bus_read8(address + 1)])
    }

    pub fn bus_read32(&mut self, address: u32) -> u32 {
        let address = address & !3;
        u32::from(self.bus_read16(address)) | u32::from(self.bus_read16(address + 2)) << 16
    }

    pub fn bus_write8(&mut self, address: u32, value: u8) {
        match address >> 24 {
            0x2 => self.ewram[address as usize & (GBA_SIZE_EWRAM as usize - 1)] = value,
            0x3 => self.iwram[address as usize & (GBA_SIZE_IWRAM as usize - 1)] = value,
            0x4 => {
                let offset = (address & 0x00FF_FFFF) as usize;
                if offset < GBA_SIZE_IO as usize {
                    self.io_write8(offset, value);
                }
            }
            0x5 => self.palette[address as usize & (GBA_SIZE_PALETTE_RAM as usize - 1)] = value,
            0x6 => self.vram[vram_offset(address)] = value,
            0x7 => self.oam[address as usize & (GBA_SIZE_OAM as usize - 1)] = value,
            0xE | 0xF => {
                if self.savedata.save_type().is_bus_mapped() {
                    let window = self.savedata.window_mut();
                    let mask = window.len() - 1;
                    window[address as usize & mask] = value;
                }
            }
            _ => {}
        }
    }

    pub fn bus_write16(&mut self, address: u32, value: u16) {
        let address = address & !1;
        let bytes = value.to_le_bytes();
        self.bus_write8(address, bytes[0]);
        self.bus_write8(address + 1, bytes[1]);
    }

    pub fn bus_write32(&mut self, address: u32, value: u32) {
        let address = address & !3;
        self.bus_write16(address, value as u16);
        self.bus_write16(address + 2, (value >> 16) as u16);
    }

    // --- Raw plane -----------------------------------------------------
    //
    // Raw access bypasses MMIO side effects and open-bus behavior; the
    // segment selects a bank where media is banked.

    pub fn raw_read8(&self, address: u32, segment: i32) -> u8 {
        match address >> 24 {
            0x0 | 0x1 => match &self.bios {
                Some(bios) if (address as usize) < bios.len() => bios[address as usize],
                _ => 0,
            },
            0x2 => self.ewram[address as usize & (GBA_SIZE_EWRAM as usize - 1)],
            0x3 => self.iwram[address as usize & (GBA_SIZE_IWRAM as usize - 1)],
            0x4 => {
                let offset = (address & 0x00FF_FFFF) as usize;
                if offset < GBA_SIZE_IO as usize {
                    self.io[offset]
                } else {
                    0
                }
            }
            0x5 => self.palette[address as usize & (GBA_SIZE_PALETTE_RAM as usize - 1)],
            0x6 => self.vram[vram_offset(address)],
            0x7 => self.oam[address as usize & (GBA_SIZE_OAM as usize - 1)],
            0x8..=0xD => {
                let offset = (address & 0x01FF_FFFF) as usize;
                self.rom.get(offset).copied().unwrap_or(0)
            }
            0xE | 0xF => {
                let bank = self.savedata.segment(segment);
                if bank.is_empty() {
                    0xFF
                } else {
                    bank[address as usize & (bank.len() - 1)]
                }
            }
            _ => 0,
        }
    }

    pub fn raw_read16(&self, address: u32, segment: i32) -> u16 {
        let address = address & !1;
        u16::from_le_bytes([
            self.raw_read8(address, segment),
            self.raw_read8(address + 1, segment),
        ])
    }

    pub fn raw_read32(&self, address: u32, segment: i32) -> u32 {
        let address = address & !3;
        u32::from(self.raw_read16(address, segment))
            | u32::from(self.raw_read16(address + 2, segment)) << 16
    }

    pub fn raw_write8(&mut self, address: u32, segment: i32, value: u8) {
        match address >> 24 {
            0x0 | 0x1 => {
                if let Some(bios) = self.bios.as_mut()
                    && (address as usize) < bios.len()
                {
                    bios[address as usize] = value;
                }
            }
            0x2 => self.ewram[address as usize & (GBA_SIZE_EWRAM as usize - 1)] = value,
            0x3 => self.iwram[address as usize & (GBA_SIZE_IWRAM as usize - 1)] = value,
            0x4 => {
                let offset = (address & 0x00FF_FFFF) as usize;
                if offset < GBA_SIZE_IO as usize {
                    self.io[offset] = value;
                }
            }
            0x5 => self.palette[address as usize & (GBA_SIZE_PALETTE_RAM as usize - 1)] = value,
            0x6 => self.vram[vram_offset(address)] = value,
            0x7 => self.oam[address as usize & (GBA_SIZE_OAM as usize - 1)] = value,
            0x8..=0xD => self.patch_rom((address & 0x01FF_FFFF) as usize, value),
            0xE | 0xF => {
                let is_flash_bank = (0..2).contains(&segment)
                    && self.savedata.save_type() == crate::savedata::SaveType::Flash1M;
                if is_flash_bank {
                    let saved_bank = self.savedata.bank();
                    self.savedata.switch_bank(segment as usize);
                    let window = self.savedata.window_mut();
                    let mask = window.len() - 1;
                    window[address as usize & mask] = value;
                    self.savedata.switch_bank(saved_bank);
                } else if !self.savedata.window().is_empty() {
                    let window = self.savedata.window_mut();
                    let mask = window.len() - 1;
                    window[address as usize & mask] = value;
                }
            }
            _ => {}
        }
    }

    pub fn raw_write16(&mut self, address: u32, segment: i32, value: u16) {
        let address = address & !1;
        let bytes = value.to_le_bytes();
        self.raw_write8(address, segment, bytes[0]);
        self.raw_write8(address + 1, segment, bytes[1]);
    }

    pub fn raw_write32(&mut self, address: u32, segment: i32, value: u32) {
        let address = address & !3;
        self.raw_write16(address, segment, value as u16);
        self.raw_write16(address + 2, segment, (value >> 16) as u16);
    }

    /// Borrow a whole catalog block. Banked flash exposes the active bank.
    pub fn memory_block(&self, id: i32) -> Option<&[u8]> {
        match id {
            id if id == Region::Bios as i32 => self.bios.as_deref(),
            id if id == Region::Ewram as i32 => Some(&self.ewram),
            id if id == Region::Iwram as i32 => Some(&self.iwram),
            id if id == Region::Io as i32 => Some(&self.io),
            id if id == Region::PaletteRam as i32 => Some(&self.palette),
            id if id == Region::Vram as i32 => Some(&self.vram),
            id if id == Region::Oam as i32 => Some(&self.oam),
            id if id == Region::Rom0 as i32
                || id == Region::Rom1 as i32
                || id == Region::Rom2 as i32 =>
            {
                Some(&self.rom)
            }
            id if id == Region::Sram as i32 => Some(self.savedata.window()),
            id if id == Region::SramMirror as i32 => Some(self.savedata.data()),
            _ => None,
        }
    }

    // --- Event clock ---------------------------------------------------

    pub fn next_event_deadline(&self) -> Option<u64> {
        self.video.active.then_some(self.video.next_event)
    }

    pub fn process_events(&mut self) {
        while self.video.active && self.timing.time >= self.video.next_event {
            let backdrop = u16::from_le_bytes([self.palette[0], self.palette[1]]);
            let outcome = self.video.run_scanline(backdrop);
            if outcome.entered_vblank {
                if let Some(stream) = self.av_stream.as_mut()
                    && let Some((pixels, stride)) = self.video.renderer().get_pixels()
                {
                    stream.post_video_frame(pixels, stride);
                }
                if let Some(sync) = self.sync.as_mut() {
                    sync.post_frame();
                }
                for callbacks in &mut self.callbacks {
                    if let Some(hook) = callbacks.video_frame_ended.as_mut() {
                        hook();
                    }
                }
            }
            if outcome.started_frame {
                for callbacks in &mut self.callbacks {
                    if let Some(hook) = callbacks.video_frame_started.as_mut() {
                        hook();
                    }
                }
            }
            if outcome.early_exit {
                self.early_exit = true;
            }
        }
    }

    pub fn request_halt(&mut self) {
        self.halt_request = true;
    }

    pub fn take_halt_request(&mut self) -> bool {
        std::mem::take(&mut self.halt_request)
    }

    pub fn take_early_exit(&mut self) -> bool {
        std::mem::take(&mut self.early_exit)
    }
}

fn vram_offset(address: u32) -> usize {
    let offset = address as usize & 0x1_FFFF;
    if offset >= GBA_SIZE_VRAM as usize {
        offset - 0x8000
    } else {
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_with_header() -> Vec<u8> {
        let mut rom = vec![0; 0x1000];
        rom[3] = 0xEA;
        rom[0xA0..0xAC].copy_from_slice(b"TESTTITLE\0\0\0");
        rom[0xAC..0xB0].copy_from_slice(b"ABCD");
        rom[0xB0..0xB2].copy_from_slice(b"01");
        rom[0xBC] = 2;
        rom
    }

    #[test]
    fn keyinput_reads_active_low() {
        let mut board = Board::new();
        board.set_keys(0x0001);
        assert_eq!(board.bus_read16(0x0400_0130), 0x03FE);
        board.clear_keys(0x0001);
        assert_eq!(board.bus_read16(0x0400_0130), 0x03FF);
    }

    #[test]
    fn opposing_directions_cancel_unless_allowed() {
        let mut board = Board::new();
        board.set_keys(0x0030);
        assert_eq!(board.get_keys(), 0);
        board.set_keys(0x00C0 | 0x0001);
        assert_eq!(board.get_keys(), 0x0001);
        board.set_keys(0x0010);
        board.add_keys(0x0020);
        assert_eq!(board.get_keys(), 0);

        board.allow_opposing_directions = true;
        board.set_keys(0x0030);
        assert_eq!(board.get_keys(), 0x0030);
    }

    #[test]
    fn keypad_irq_fires_in_or_mode() {
        let mut board = Board::new();
        board.bus_write16(0x0400_0132, 0x4000 | 0x0001);
        board.set_keys(0x0001);
        assert_eq!(board.io16(IO_IF) & IRQ_KEYPAD, IRQ_KEYPAD);
    }

    #[test]
    fn keypad_irq_and_mode_needs_all_keys() {
        let mut board = Board::new();
        board.bus_write16(0x0400_0132, 0xC000 | 0x0003);
        board.set_keys(0x0001);
        assert_eq!(board.io16(IO_IF) & IRQ_KEYPAD, 0);
        board.add_keys(0x0002);
        assert_eq!(board.io16(IO_IF) & IRQ_KEYPAD, IRQ_KEYPAD);
    }

    #[test]
    fn interrupt_registers_mask_and_ack() {
        let mut board = Board::new();
        board.bus_write16(0x0400_0200, 0xFFFF);
        assert_eq!(board.io16(IO_IE), 0x3FFF);
        board.bus_write16(0x0400_0208, 0xFFFF);
        assert_eq!(board.io16(IO_IME), 1);
        // IF is acknowledge-on-write.
        board.set_keys(0);
        board.bus_write16(0x0400_0132, 0x4000 | 0x0004);
        board.set_keys(0x0004);
        assert_ne!(board.io16(IO_IF), 0);
        board.bus_write16(0x0400_0202, IRQ_KEYPAD);
        assert_eq!(board.io16(IO_IF), 0);
    }

    #[test]
    fn haltcnt_write_requests_halt() {
        let mut board = Board::new();
        board.bus_write8(0x0400_0301, 0);
        assert!(board.take_halt_request());
        assert!(!board.take_halt_request());
    }

    #[test]
    fn rom_reads_mirror_and_open_bus() {
        let mut board = Board::new();
        let mut rom = rom_with_header();
        rom[0x10] = 0x42;
        assert!(board.load_rom(rom));
        assert_eq!(board.bus_read8(0x0800_0010), 0x42);
        assert_eq!(board.bus_read8(0x0A00_0010), 0x42);
        assert_eq!(board.bus_read8(0x0C00_0010), 0x42);
        // Past the image, the address echoes back.
        let address = 0x0900_0000u32;
        assert_eq!(board.bus_read8(address), ((address >> 1) & 0xFF) as u8);
    }

    #[test]
    fn vram_upper_mirror_folds_down() {
        let mut board = Board::new();
        board.bus_write8(0x0601_0000, 0x5A);
        assert_eq!(board.bus_read8(0x0601_8000), 0x5A);
    }

    #[test]
    fn raw_rom_write_patches_and_preserves_checksum_source() {
        let mut board = Board::new();
        let rom = rom_with_header();
        let pristine_crc = crc32fast::hash(&rom);
        assert!(board.load_rom(rom));
        board.raw_write8(0x0800_0010, 0, 0x99);
        assert_eq!(board.raw_read8(0x0800_0010, 0), 0x99);
        assert_eq!(board.checksum(ChecksumKind::Crc32), Checksum::Crc32(pristine_crc));
    }

    #[test]
    fn game_info_decodes_header() {
        let mut board = Board::new();
        assert!(board.load_rom(rom_with_header()));
        let info = board.game_info().unwrap();
        assert_eq!(info.title, "TESTTITLE");
        assert_eq!(info.code, "ABCD");
        assert_eq!(info.maker, "01");
        assert_eq!(info.version, 2);
    }
}
