//! Cheat device: a hot-pluggable CPU component holding patch sets.

/// One raw cheat code: a target address and the value patched in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cheat {
    pub address: u32,
    pub operand: u32,
    pub width: u8,
}

#[derive(Clone, Debug, Default)]
pub struct CheatSet {
    pub name: String,
    pub enabled: bool,
    pub codes: Vec<Cheat>,
}

impl CheatSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            codes: Vec::new(),
        }
    }

    pub fn add_code(&mut self, address: u32, operand: u32, width: u8) {
        self.codes.push(Cheat {
            address,
            operand,
            width,
        });
    }
}

/// The device itself. Created lazily the first time the front-end asks for
/// it and destroyed when the ROM is unloaded.
#[derive(Debug, Default)]
pub struct CheatDevice {
    sets: Vec<CheatSet>,
}

impl CheatDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_set(&mut self, set: CheatSet) {
        self.sets.push(set);
    }

    pub fn remove_set(&mut self, index: usize) -> Option<CheatSet> {
        (index < self.sets.len()).then(|| self.sets.remove(index))
    }

    pub fn sets(&self) -> &[CheatSet] {
        &self.sets
    }

    pub fn sets_mut(&mut self) -> &mut [CheatSet] {
        &mut self.sets
    }

    pub fn clear(&mut self) {
        self.sets.clear();
    }

    /// Patches due on the current frame, in set order. Disabled sets
    /// contribute nothing.
    pub fn pending_patches(&self) -> impl Iterator<Item = Cheat> + '_ {
        self.sets
            .iter()
            .filter(|s| s.enabled)
            .flat_map(|s| s.codes.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_sets_are_skipped() {
        let mut device = CheatDevice::new();
        let mut on = CheatSet::new("on");
        on.add_code(0x0200_0000, 0xFF, 1);
        let mut off = CheatSet::new("off");
        off.add_code(0x0200_0004, 0xEE, 1);
        off.enabled = false;
        device.add_set(on);
        device.add_set(off);
        let pending: Vec<_> = device.pending_patches().collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].address, 0x0200_0000);
    }
}
