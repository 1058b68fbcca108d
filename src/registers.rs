//! CPU register catalog, the name/alias parser backing register peek/poke,
//! and the MMIO register name table used by identifier lookup.

use crate::core::{RegisterInfo, RegisterKind};
use crate::memmap::GBA_BASE_IO;

pub const CPSR_WRITE_MASK: u32 = 0xF000_00FF;

const fn gpr(name: &'static str, aliases: &'static [&'static str]) -> RegisterInfo {
    RegisterInfo {
        name,
        aliases,
        width: 4,
        mask: 0xFFFF_FFFF,
        kind: RegisterKind::Gpr,
    }
}

const fn status(name: &'static str) -> RegisterInfo {
    RegisterInfo {
        name,
        aliases: &[],
        width: 4,
        mask: CPSR_WRITE_MASK,
        kind: RegisterKind::Flags,
    }
}

static REGISTERS: [RegisterInfo; 23] = [
    gpr("r0", &[]),
    gpr("r1", &[]),
    gpr("r2", &[]),
    gpr("r3", &[]),
    gpr("r4", &[]),
    gpr("r5", &[]),
    gpr("r6", &[]),
    gpr("r7", &[]),
    gpr("r8", &[]),
    gpr("r9", &[]),
    gpr("r10", &[]),
    gpr("r11", &[]),
    gpr("r12", &["ip"]),
    gpr("r13", &["sp"]),
    gpr("r14", &["lr"]),
    gpr("r15", &["pc"]),
    status("cpsr"),
    // Published for catalog consumers; the name parser does not resolve
    // banked status registers.
    status("spsr"),
    status("spsr_fiq"),
    status("spsr_irq"),
    status("spsr_svc"),
    status("spsr_abt"),
    status("spsr_und"),
];

pub fn list() -> &'static [RegisterInfo] {
    &REGISTERS
}

/// A parsed register reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterRef {
    Gpr(usize),
    Cpsr,
}

fn parse_alias(name: &str) -> Option<&'static str> {
    match name {
        _ if name.eq_ignore_ascii_case("ip") => Some("r12"),
        _ if name.eq_ignore_ascii_case("sp") => Some("r13"),
        _ if name.eq_ignore_ascii_case("lr") => Some("r14"),
        _ if name.eq_ignore_ascii_case("pc") => Some("r15"),
        _ => None,
    }
}

fn parse_gpr(name: &str) -> Option<usize> {
    let digits = name
        .strip_prefix('r')
        .or_else(|| name.strip_prefix('R'))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index: usize = digits.parse().ok()?;
    (index < 16).then_some(index)
}

/// Parse a register name for reading. `cpsr` matches case-insensitively.
pub fn parse_read(name: &str) -> Option<RegisterRef> {
    if name.eq_ignore_ascii_case("cpsr") {
        return Some(RegisterRef::Cpsr);
    }
    let name = parse_alias(name).unwrap_or(name);
    parse_gpr(name).map(RegisterRef::Gpr)
}

/// Parse a register name for writing. Unlike the read side, `cpsr` only
/// matches in lowercase here.
pub fn parse_write(name: &str) -> Option<RegisterRef> {
    if name == "cpsr" {
        return Some(RegisterRef::Cpsr);
    }
    let name = parse_alias(name).unwrap_or(name);
    parse_gpr(name).map(RegisterRef::Gpr)
}

/// MMIO registers resolvable by name. Offsets are relative to the I/O base.
static IO_REGISTER_NAMES: &[(&str, u32)] = &[
    ("DISPCNT", 0x000),
    ("DISPSTAT", 0x004),
    ("VCOUNT", 0x006),
    ("BG0CNT", 0x008),
    ("BG1CNT", 0x00A),
    ("BG2CNT", 0x00C),
    ("BG3CNT", 0x00E),
    ("BG0HOFS", 0x010),
    ("BG0VOFS", 0x012),
    ("BG1HOFS", 0x014),
    ("BG1VOFS", 0x016),
    ("BG2HOFS", 0x018),
    ("BG2VOFS", 0x01A),
    ("BG3HOFS", 0x01C),
    ("BG3VOFS", 0x01E),
    ("BG2PA", 0x020),
    ("BG2PB", 0x022),
    ("BG2PC", 0x024),
    ("BG2PD", 0x026),
    ("BG2X", 0x028),
    ("BG2Y", 0x02C),
    ("BG3PA", 0x030),
    ("BG3PB", 0x032),
    ("BG3PC", 0x034),
    ("BG3PD", 0x036),
    ("BG3X", 0x038),
    ("BG3Y", 0x03C),
    ("WIN0H", 0x040),
    ("WIN1H", 0x042),
    ("WIN0V", 0x044),
    ("WIN1V", 0x046),
    ("WININ", 0x048),
    ("WINOUT", 0x04A),
    ("MOSAIC", 0x04C),
    ("BLDCNT", 0x050),
    ("BLDALPHA", 0x052),
    ("BLDY", 0x054),
    ("SOUND1CNT_LO", 0x060),
    ("SOUND1CNT_HI", 0x062),
    ("SOUND1CNT_X", 0x064),
    ("SOUND2CNT_LO", 0x068),
    ("SOUND2CNT_HI", 0x06C),
    ("SOUND3CNT_LO", 0x070),
    ("SOUND3CNT_HI", 0x072),
    ("SOUND3CNT_X", 0x074),
    ("SOUND4CNT_LO", 0x078),
    ("SOUND4CNT_HI", 0x07C),
    ("SOUNDCNT_LO", 0x080),
    ("SOUNDCNT_HI", 0x082),
    ("SOUNDCNT_X", 0x084),
    ("SOUNDBIAS", 0x088),
    ("DMA0SAD", 0x0B0),
    ("DMA0DAD", 0x0B4),
    ("DMA0CNT_LO", 0x0B8),
    ("DMA0CNT_HI", 0x0BA),
    ("DMA1SAD", 0x0BC),
    ("DMA1DAD", 0x0C0),
    ("DMA1CNT_LO", 0x0C4),
    ("DMA1CNT_HI", 0x0C6),
    ("DMA2SAD", 0x0C8),
    ("DMA2DAD", 0x0CC),
    ("DMA2CNT_LO", 0x0D0),
    ("DMA2CNT_HI", 0x0D2),
    ("DMA3SAD", 0x0D4),
    ("DMA3DAD", 0x0D8),
    ("DMA3CNT_LO", 0x0DC),
    ("DMA3CNT_HI", 0x0DE),
    ("TM0CNT_LO", 0x100),
    ("TM0CNT_HI", 0x102),
    ("TM1CNT_LO", 0x104),
    ("TM1CNT_HI", 0x106),
    ("TM2CNT_LO", 0x108),
    ("TM2CNT_HI", 0x10A),
    ("TM3CNT_LO", 0x10C),
    ("TM3CNT_HI", 0x10E),
    ("SIOMULTI0", 0x120),
    ("SIOMULTI1", 0x122),
    ("SIOMULTI2", 0x124),
    ("SIOMULTI3", 0x126),
    ("SIOCNT", 0x128),
    ("SIOMLT_SEND", 0x12A),
    ("KEYINPUT", 0x130),
    ("KEYCNT", 0x132),
    ("RCNT", 0x134),
    ("JOYCNT", 0x140),
    ("JOY_RECV", 0x150),
    ("JOY_TRANS", 0x154),
    ("JOYSTAT", 0x158),
    ("IE", 0x200),
    ("IF", 0x202),
    ("WAITCNT", 0x204),
    ("IME", 0x208),
    ("POSTFLG", 0x300),
    ("HALTCNT", 0x301),
];

/// Resolve an MMIO register name to its bus address. The returned segment
/// is always -1; I/O is never banked.
pub fn lookup_io_register(name: &str) -> Option<(i32, i32)> {
    IO_REGISTER_NAMES
        .iter()
        .find(|(n, _)| name.eq_ignore_ascii_case(n))
        .map(|&(_, offset)| ((GBA_BASE_IO | offset) as i32, -1))
}
