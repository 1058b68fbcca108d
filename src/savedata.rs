//! Save-media backing store: type tags, sizing, flash banking and the
//! temporary-save masking used by rewind-style front-ends.

/// Save media wired to the cartridge bus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SaveType {
    #[default]
    None,
    Sram,
    Flash512,
    Flash1M,
    Eeprom,
    Eeprom512,
    Sram512,
}

impl SaveType {
    /// Stable numeric tag, used to detect media changes cheaply.
    pub fn tag(self) -> i32 {
        match self {
            SaveType::None => 0,
            SaveType::Sram => 1,
            SaveType::Flash512 => 2,
            SaveType::Flash1M => 3,
            SaveType::Eeprom => 4,
            SaveType::Eeprom512 => 5,
            SaveType::Sram512 => 6,
        }
    }

    pub fn size(self) -> usize {
        match self {
            SaveType::None => 0,
            SaveType::Sram => crate::memmap::GBA_SIZE_SRAM as usize,
            SaveType::Sram512 => crate::memmap::GBA_SIZE_SRAM512 as usize,
            SaveType::Flash512 => crate::memmap::GBA_SIZE_FLASH512 as usize,
            SaveType::Flash1M => crate::memmap::GBA_SIZE_FLASH1M as usize,
            SaveType::Eeprom => crate::memmap::GBA_SIZE_EEPROM as usize,
            SaveType::Eeprom512 => crate::memmap::GBA_SIZE_EEPROM512 as usize,
        }
    }

    /// True for media mapped into the SRAM region of the bus.
    pub fn is_bus_mapped(self) -> bool {
        matches!(
            self,
            SaveType::Sram | SaveType::Sram512 | SaveType::Flash512 | SaveType::Flash1M
        )
    }
}

/// Flash bank size on 1Mbit media.
pub const FLASH_BANK_SIZE: usize = crate::memmap::GBA_SIZE_FLASH512 as usize;

#[derive(Default)]
pub struct Savedata {
    save_type: SaveType,
    data: Vec<u8>,
    bank: usize,
    // Real contents stashed while a temporary save is active.
    masked: Option<Vec<u8>>,
}

impl Savedata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_type(&self) -> SaveType {
        self.save_type
    }

    /// Switch media type, reallocating the backing store. Erased flash and
    /// fresh SRAM both read back 0xFF.
    pub fn set_type(&mut self, save_type: SaveType) {
        if self.save_type == save_type {
            return;
        }
        self.save_type = save_type;
        self.data = vec![0xFF; save_type.size()];
        self.bank = 0;
        self.masked = None;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The bus-visible window. On 1Mbit flash this is the active 64KiB bank;
    /// on everything else it is the whole store.
    pub fn window(&self) -> &[u8] {
        match self.save_type {
            SaveType::Flash1M => {
                let base = self.bank * FLASH_BANK_SIZE;
                &self.data[base..base + FLASH_BANK_SIZE]
            }
            _ => &self.data,
        }
    }

    pub fn window_mut(&mut self) -> &mut [u8] {
        match self.save_type {
            SaveType::Flash1M => {
                let base = self.bank * FLASH_BANK_SIZE;
                &mut self.data[base..base + FLASH_BANK_SIZE]
            }
            _ => &mut self.data,
        }
    }

    /// Bank-addressed view, for raw access with an explicit segment.
    pub fn segment(&self, segment: i32) -> &[u8] {
        match self.save_type {
            SaveType::Flash1M if (0..2).contains(&segment) => {
                let base = segment as usize * FLASH_BANK_SIZE;
                &self.data[base..base + FLASH_BANK_SIZE]
            }
            _ => self.window(),
        }
    }

    pub fn bank(&self) -> usize {
        self.bank
    }

    pub fn switch_bank(&mut self, bank: usize) {
        if self.save_type == SaveType::Flash1M && bank < 2 {
            self.bank = bank;
        }
    }

    /// Load save contents, sizing the media from the payload when the type
    /// is still undetermined.
    pub fn load(&mut self, data: Vec<u8>) -> bool {
        if self.save_type == SaveType::None {
            let inferred = match data.len() {
                0 => return false,
                n if n <= SaveType::Eeprom512.size() => SaveType::Eeprom512,
                n if n <= SaveType::Eeprom.size() => SaveType::Eeprom,
                n if n <= SaveType::Sram.size() => SaveType::Sram,
                n if n <= SaveType::Flash512.size() => SaveType::Flash512,
                _ => SaveType::Flash1M,
            };
            self.set_type(inferred);
        }
        let len = data.len().min(self.data.len());
        self.data[..len].copy_from_slice(&data[..len]);
        true
    }

    /// Swap in a temporary save, stashing the real contents. The stash is
    /// restored by `unmask` and never written back to.
    pub fn mask(&mut self, temporary: Vec<u8>) {
        if self.masked.is_none() {
            self.masked = Some(std::mem::take(&mut self.data));
            self.data = vec![0xFF; self.save_type.size()];
        }
        let len = temporary.len().min(self.data.len());
        self.data[..len].copy_from_slice(&temporary[..len]);
    }

    pub fn unmask(&mut self) {
        if let Some(real) = self.masked.take() {
            self.data = real;
        }
    }

    pub fn is_masked(&self) -> bool {
        self.masked.is_some()
    }

    pub fn clone_contents(&self) -> Option<Vec<u8>> {
        if self.save_type == SaveType::None {
            return None;
        }
        Some(self.data.clone())
    }

    /// Restore cloned contents. With `writeback` the restore lands in the
    /// real store even while a temporary save is masked in; without it a
    /// masked store only updates the temporary copy.
    pub fn restore(&mut self, data: &[u8], writeback: bool) -> bool {
        if self.save_type == SaveType::None {
            return false;
        }
        let len = data.len().min(self.data.len());
        self.data[..len].copy_from_slice(&data[..len]);
        if writeback && let Some(real) = self.masked.as_mut() {
            let len = data.len().min(real.len());
            real[..len].copy_from_slice(&data[..len]);
        }
        true
    }

    pub fn reset(&mut self) {
        self.bank = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash1m_window_tracks_bank() {
        let mut save = Savedata::new();
        save.set_type(SaveType::Flash1M);
        save.window_mut()[0] = 0x11;
        save.switch_bank(1);
        save.window_mut()[0] = 0x22;
        assert_eq!(save.segment(0)[0], 0x11);
        assert_eq!(save.segment(1)[0], 0x22);
        assert_eq!(save.window()[0], 0x22);
        assert_eq!(save.window().len(), FLASH_BANK_SIZE);
        assert_eq!(save.data().len(), SaveType::Flash1M.size());
    }

    #[test]
    fn mask_and_unmask_preserve_real_contents() {
        let mut save = Savedata::new();
        save.set_type(SaveType::Sram);
        save.window_mut()[0] = 0xAA;
        save.mask(vec![0x55; 4]);
        assert_eq!(save.window()[0], 0x55);
        save.window_mut()[0] = 0x66;
        save.unmask();
        assert_eq!(save.window()[0], 0xAA);
    }

    #[test]
    fn restore_without_writeback_leaves_stash_alone() {
        let mut save = Savedata::new();
        save.set_type(SaveType::Sram);
        save.window_mut()[0] = 0xAA;
        save.mask(vec![0x00; 4]);
        assert!(save.restore(&[0x77], false));
        assert_eq!(save.window()[0], 0x77);
        save.unmask();
        assert_eq!(save.window()[0], 0xAA);
    }

    #[test]
    fn load_infers_type_from_size() {
        let mut save = Savedata::new();
        assert!(save.load(vec![0; 0x2_0000]));
        assert_eq!(save.save_type(), SaveType::Flash1M);
        let mut save = Savedata::new();
        assert!(save.load(vec![0; 0x200]));
        assert_eq!(save.save_type(), SaveType::Eeprom512);
    }
}
