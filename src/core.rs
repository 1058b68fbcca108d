use std::path::Path;

use crate::{
    cheats::CheatDevice,
    config::CoreConfig,
    debugger::{Debugger, DebuggerPlatform, SymbolTable},
    overrides::CartridgeOverride,
    serialize::StateExtdata,
    sio::SioDriver,
    vlp::VideoLogContext,
};
use std::rc::Rc;

/// Platform reported by a core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Gba,
}

/// Optional capabilities a front-end can query before relying on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feature {
    OpenGl,
}

/// Checksum kinds a core can compute for the loaded ROM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChecksumKind {
    Crc32,
    Md5,
    Sha1,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Checksum {
    Crc32(u32),
    Md5([u8; 16]),
    Sha1([u8; 20]),
}

/// Game metadata decoded from the cartridge header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameInfo {
    pub title: String,
    pub code: String,
    pub maker: String,
    pub version: u8,
}

/// One togglable video layer or audio channel.
#[derive(Clone, Copy, Debug)]
pub struct ChannelInfo {
    pub id: usize,
    pub internal_name: &'static str,
    pub visible_name: &'static str,
    pub extra: Option<&'static str>,
}

#[derive(Clone, Copy, Debug)]
pub struct ScreenRegion {
    pub id: usize,
    pub description: &'static str,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

pub const MEMORY_READ: u32 = 0x01;
pub const MEMORY_WRITE: u32 = 0x02;
pub const MEMORY_RW: u32 = 0x03;
pub const MEMORY_WORM: u32 = 0x04;
pub const MEMORY_MAPPED: u32 = 0x10;
pub const MEMORY_VIRTUAL: u32 = 0x20;

/// One addressable region as published by `list_memory_blocks`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryBlock {
    pub id: i32,
    pub internal_name: &'static str,
    pub short_name: &'static str,
    pub long_name: &'static str,
    pub start: u32,
    pub end: u32,
    pub size: u32,
    pub flags: u32,
    pub max_segment: u32,
    pub segment_start: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterKind {
    Gpr,
    Flags,
}

/// One CPU-visible register in the register catalog.
#[derive(Clone, Copy, Debug)]
pub struct RegisterInfo {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub width: u32,
    pub mask: u32,
    pub kind: RegisterKind,
}

/// Front-end sync object. The core never schedules against wall-clock time
/// itself; it only pokes this at frame boundaries.
pub trait CoreSync {
    fn post_frame(&mut self) {}
}

pub trait RotationSource {
    fn sample(&mut self) {}
    fn tilt_x(&self) -> i32 {
        0
    }
    fn tilt_y(&self) -> i32 {
        0
    }
    fn gyro_z(&self) -> i32 {
        0
    }
}

pub trait Rumble {
    fn set_rumble(&mut self, enable: bool);
}

pub trait LuminanceSource {
    fn sample(&mut self) {}
    fn luminance(&self) -> u8 {
        0
    }
}

/// A/V stream sink for recording front-ends.
pub trait AvStream {
    fn video_dimensions_changed(&mut self, _width: u32, _height: u32) {}
    fn audio_rate_changed(&mut self, _rate: u32) {}
    fn post_video_frame(&mut self, _pixels: &[u32], _stride: usize) {}
}

/// CPU-attached peripherals settable through the façade.
pub enum Peripheral {
    Rotation(Box<dyn RotationSource>),
    Rumble(Box<dyn Rumble>),
    Luminance(Box<dyn LuminanceSource>),
    LinkPort(Box<dyn SioDriver>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeripheralKind {
    Rotation,
    Rumble,
    Luminance,
    LinkPort,
}

/// Hooks invoked by the board at frame boundaries.
#[derive(Default)]
pub struct CoreCallbacks {
    pub video_frame_started: Option<Box<dyn FnMut()>>,
    pub video_frame_ended: Option<Box<dyn FnMut()>>,
}

/// A decoded ROM patch, as produced by the (external) patch engine.
#[derive(Clone, Debug, Default)]
pub struct Patch {
    pub changes: Vec<(u32, u8)>,
}

/// The machine-agnostic core interface.
///
/// The GBA machine and the video-log player are the two implementations; the
/// player differs only in construction, `reset`, `load_rom`, `load_state` and
/// `is_rom`.
pub trait Core {
    fn platform(&self) -> Platform;
    fn supports_feature(&self, feature: Feature) -> bool;

    fn set_sync(&mut self, sync: Option<Box<dyn CoreSync>>);
    fn load_config(&mut self, config: &CoreConfig);
    fn reload_config_option(&mut self, option: Option<&str>, config: Option<&CoreConfig>);
    fn set_override(&mut self, override_: CartridgeOverride);

    fn base_video_size(&self) -> (u32, u32);
    fn current_video_size(&self) -> (u32, u32);
    fn video_scale(&self) -> u32;
    fn screen_regions(&self) -> &'static [ScreenRegion];
    fn set_video_buffer(&mut self, stride: usize);
    #[cfg(feature = "opengl")]
    fn set_video_gl_tex(&mut self, tex: u32);
    fn get_pixels(&self) -> Option<(&[u32], usize)>;
    fn put_pixels(&mut self, pixels: &[u32], stride: usize);

    fn audio_sample_rate(&self) -> u32;
    fn audio_buffer_size(&self) -> usize;
    fn set_audio_buffer_size(&mut self, samples: usize);

    fn add_core_callbacks(&mut self, callbacks: CoreCallbacks);
    fn clear_core_callbacks(&mut self);
    fn set_av_stream(&mut self, stream: Option<Box<dyn AvStream>>);

    fn is_rom(&self, data: &[u8]) -> bool;
    fn load_rom(&mut self, data: Vec<u8>) -> bool;
    fn load_rom_file(&mut self, path: &Path) -> bool;
    fn load_bios(&mut self, data: Vec<u8>) -> bool;
    fn load_save(&mut self, data: Vec<u8>) -> bool;
    fn load_temporary_save(&mut self, data: Vec<u8>) -> bool;
    fn load_patch(&mut self, patch: &Patch) -> bool;
    fn unload_rom(&mut self);
    fn rom_size(&self) -> usize;
    fn checksum(&self, kind: ChecksumKind) -> Checksum;

    fn reset(&mut self);
    fn run_frame(&mut self);
    fn run_loop(&mut self);
    fn step(&mut self);

    fn state_size(&self) -> usize;
    fn load_state(&mut self, state: &[u8]) -> bool;
    fn save_state(&self, state: &mut [u8]) -> bool;
    fn load_extra_state(&mut self, extdata: &StateExtdata) -> bool;
    fn save_extra_state(&self, extdata: &mut StateExtdata) -> bool;

    fn set_keys(&mut self, keys: u16);
    fn add_keys(&mut self, keys: u16);
    fn clear_keys(&mut self, keys: u16);
    fn get_keys(&self) -> u16;

    fn frame_counter(&self) -> u32;
    fn frame_cycles(&self) -> i32;
    fn frequency(&self) -> i32;
    fn get_game_info(&self) -> Option<GameInfo>;

    fn set_peripheral(&mut self, peripheral: Peripheral);
    fn has_peripheral(&self, kind: PeripheralKind) -> bool;

    fn bus_read8(&mut self, address: u32) -> u8;
    fn bus_read16(&mut self, address: u32) -> u16;
    fn bus_read32(&mut self, address: u32) -> u32;
    fn bus_write8(&mut self, address: u32, value: u8);
    fn bus_write16(&mut self, address: u32, value: u16);
    fn bus_write32(&mut self, address: u32, value: u32);

    fn raw_read8(&self, address: u32, segment: i32) -> u8;
    fn raw_read16(&self, address: u32, segment: i32) -> u16;
    fn raw_read32(&self, address: u32, segment: i32) -> u32;
    fn raw_write8(&mut self, address: u32, segment: i32, value: u8);
    fn raw_write16(&mut self, address: u32, segment: i32, value: u16);
    fn raw_write32(&mut self, address: u32, segment: i32, value: u32);

    fn list_memory_blocks(&mut self) -> &[MemoryBlock];
    fn get_memory_block(&self, id: i32) -> Option<&[u8]>;

    fn list_registers(&self) -> &'static [RegisterInfo];
    fn read_register(&self, name: &str) -> Option<i32>;
    fn write_register(&mut self, name: &str, value: i32) -> bool;

    fn debugger_platform(&mut self) -> &mut DebuggerPlatform;
    fn attach_debugger(&mut self, debugger: Rc<Debugger>);
    fn detach_debugger(&mut self);
    fn load_symbols(&mut self, table: SymbolTable);
    fn lookup_identifier(&self, name: &str) -> Option<(i32, i32)>;

    fn cheat_device(&mut self) -> &mut CheatDevice;

    fn savedata_clone(&self) -> Option<Vec<u8>>;
    fn savedata_restore(&mut self, data: &[u8], writeback: bool) -> bool;

    fn list_video_layers(&self) -> &'static [ChannelInfo];
    fn list_audio_channels(&self) -> &'static [ChannelInfo];
    fn enable_video_layer(&mut self, id: usize, enable: bool);
    fn enable_audio_channel(&mut self, id: usize, enable: bool);
    fn adjust_video_layer(&mut self, id: usize, x: i32, y: i32);

    fn start_video_log(&mut self) -> bool;
    fn end_video_log(&mut self) -> Option<VideoLogContext>;
}
