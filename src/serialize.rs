//! Save-state plumbing: the fixed primary state layout and the tagged
//! extra-data bag that rides alongside it.

use std::collections::BTreeMap;

pub const STATE_MAGIC: u32 = 0x0100_0000;
pub const STATE_VERSION: u32 = 3;

// Primary state layout, little-endian throughout.
pub const OFS_MAGIC: usize = 0x00;
pub const OFS_ROM_CRC32: usize = 0x04;
pub const OFS_FRAME_COUNTER: usize = 0x08;
pub const OFS_VCOUNT: usize = 0x0C;
pub const OFS_KEYS: usize = 0x0E;
pub const OFS_TIME: usize = 0x10;
pub const OFS_GPRS: usize = 0x18;
pub const OFS_CPSR: usize = 0x58;
pub const OFS_SPSR: usize = 0x5C;
pub const OFS_BANKED_SPSRS: usize = 0x60;
pub const OFS_HALTED: usize = 0x74;
pub const OFS_IO: usize = 0x80;
pub const OFS_PALETTE: usize = 0x480;
pub const OFS_OAM: usize = 0x880;
pub const OFS_VRAM: usize = 0xC80;
pub const OFS_IWRAM: usize = 0x18C80;
pub const OFS_EWRAM: usize = 0x20C80;
pub const STATE_SIZE: usize = 0x60C80;

pub fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

pub fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub fn put_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

pub fn get_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(buf[offset..offset + 2].try_into().unwrap())
}

pub fn get_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

pub fn get_u64(buf: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap())
}

/// Extra-data keys start here; each subsystem adds its own index.
pub const EXTDATA_SUBSYSTEM_START: i32 = 0x20;
pub const SUBSYSTEM_VIDEO_RENDERER: i32 = 0;
pub const SUBSYSTEM_SIO_DRIVER: i32 = 1;

/// Outcome of fetching one subsystem's extra-data item.
#[derive(Debug, PartialEq, Eq)]
pub enum ExtdataItem<'a> {
    /// Nothing stored; the subsystem keeps its current state.
    Missing,
    /// Present but too short to carry a type tag.
    Malformed,
    /// Stored by a different implementation; silently skipped.
    Mismatch,
    Payload(&'a [u8]),
}

/// Tagged per-subsystem payloads attached to a save state.
///
/// Every item is prefixed with a 4-byte little-endian type tag naming the
/// implementation that wrote it.
#[derive(Clone, Debug, Default)]
pub struct StateExtdata {
    items: BTreeMap<i32, Vec<u8>>,
}

impl StateExtdata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, subsystem: i32, type_tag: u32, body: &[u8]) {
        let mut item = Vec::with_capacity(4 + body.len());
        item.extend_from_slice(&type_tag.to_le_bytes());
        item.extend_from_slice(body);
        self.items.insert(EXTDATA_SUBSYSTEM_START + subsystem, item);
    }

    /// Raw insert, without the type-tag convention. Test hook for malformed
    /// payload handling.
    pub fn put_raw(&mut self, subsystem: i32, item: Vec<u8>) {
        self.items.insert(EXTDATA_SUBSYSTEM_START + subsystem, item);
    }

    pub fn fetch(&self, subsystem: i32, expected_tag: u32) -> ExtdataItem<'_> {
        let Some(item) = self.items.get(&(EXTDATA_SUBSYSTEM_START + subsystem)) else {
            return ExtdataItem::Missing;
        };
        if item.is_empty() {
            return ExtdataItem::Missing;
        }
        if item.len() <= 4 {
            return ExtdataItem::Malformed;
        }
        let tag = u32::from_le_bytes(item[..4].try_into().unwrap());
        if tag != expected_tag {
            return ExtdataItem::Mismatch;
        }
        ExtdataItem::Payload(&item[4..])
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_distinguishes_all_outcomes() {
        let mut extdata = StateExtdata::new();
        extdata.put(SUBSYSTEM_VIDEO_RENDERER, 0x1234, &[1, 2, 3]);
        assert_eq!(
            extdata.fetch(SUBSYSTEM_VIDEO_RENDERER, 0x1234),
            ExtdataItem::Payload(&[1, 2, 3][..])
        );
        assert_eq!(
            extdata.fetch(SUBSYSTEM_VIDEO_RENDERER, 0x9999),
            ExtdataItem::Mismatch
        );
        assert_eq!(
            extdata.fetch(SUBSYSTEM_SIO_DRIVER, 0x1234),
            ExtdataItem::Missing
        );
        extdata.put_raw(SUBSYSTEM_SIO_DRIVER, vec![1, 2]);
        assert_eq!(
            extdata.fetch(SUBSYSTEM_SIO_DRIVER, 0x1234),
            ExtdataItem::Malformed
        );
        extdata.put_raw(SUBSYSTEM_SIO_DRIVER, Vec::new());
        assert_eq!(
            extdata.fetch(SUBSYSTEM_SIO_DRIVER, 0x1234),
            ExtdataItem::Missing
        );
    }

    #[test]
    fn layout_regions_tile_the_state() {
        assert_eq!(OFS_IO + 0x400, OFS_PALETTE);
        assert_eq!(OFS_PALETTE + 0x400, OFS_OAM);
        assert_eq!(OFS_OAM + 0x400, OFS_VRAM);
        assert_eq!(OFS_VRAM + 0x18000, OFS_IWRAM);
        assert_eq!(OFS_IWRAM + 0x8000, OFS_EWRAM);
        assert_eq!(OFS_EWRAM + 0x40000, STATE_SIZE);
    }
}
