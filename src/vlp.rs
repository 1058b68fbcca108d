//! Video-log playback: the log container format, the frame-replay hook
//! installed in the video unit, and `GbaVideoLogPlayer`, the core variant
//! that plays a recorded command log instead of executing a ROM.

use std::path::Path;
use std::rc::Rc;

use crate::cheats::CheatDevice;
use crate::config::CoreConfig;
use crate::core::{
    AvStream, ChannelInfo, Checksum, ChecksumKind, Core, CoreCallbacks, CoreSync, Feature,
    GameInfo, MemoryBlock, Patch, Peripheral, PeripheralKind, Platform, RegisterInfo,
    ScreenRegion,
};
use crate::debugger::{Debugger, DebuggerPlatform, SymbolTable};
use crate::gba::GbaCore;
use crate::memmap::GBA_BASE_EWRAM;
use crate::overrides::CartridgeOverride;
use crate::renderer::{LoggedCommand, VideoRenderer};
use crate::serialize::{
    OFS_FRAME_COUNTER, OFS_IO, OFS_OAM, OFS_PALETTE, OFS_VRAM, STATE_SIZE, StateExtdata, get_u32,
};

pub const VIDEO_LOG_MAGIC: [u8; 4] = *b"RVLG";
pub const VIDEO_LOG_VERSION: u32 = 1;

/// A recorded renderer command log: the state it started from plus the
/// per-frame command lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VideoLogContext {
    pub initial_state: Vec<u8>,
    pub frames: Vec<Vec<LoggedCommand>>,
}

impl VideoLogContext {
    pub fn new(initial_state: Vec<u8>) -> Self {
        Self {
            initial_state,
            frames: Vec::new(),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&VIDEO_LOG_MAGIC);
        out.extend_from_slice(&VIDEO_LOG_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.initial_state.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.initial_state);
        out.extend_from_slice(&(self.frames.len() as u32).to_le_bytes());
        for frame in &self.frames {
            out.extend_from_slice(&(frame.len() as u32).to_le_bytes());
            for command in frame {
                match *command {
                    LoggedCommand::DrawScanline(y) => {
                        out.push(0);
                        out.extend_from_slice(&y.to_le_bytes());
                    }
                    LoggedCommand::FinishFrame(n) => {
                        out.push(1);
                        out.extend_from_slice(&n.to_le_bytes());
                    }
                }
            }
        }
        out
    }

    pub fn deserialize(data: &[u8]) -> Option<Self> {
        let mut cursor = Cursor { data, pos: 0 };
        if cursor.bytes::<4>()? != VIDEO_LOG_MAGIC {
            return None;
        }
        if cursor.u32()? != VIDEO_LOG_VERSION {
            return None;
        }
        let state_len = cursor.u32()? as usize;
        let initial_state = cursor.slice(state_len)?.to_vec();
        let frame_count = cursor.u32()? as usize;
        let mut frames = Vec::with_capacity(frame_count.min(1024));
        for _ in 0..frame_count {
            let command_count = cursor.u32()? as usize;
            let mut frame = Vec::with_capacity(command_count.min(1024));
            for _ in 0..command_count {
                let opcode = cursor.slice(1)?[0];
                frame.push(match opcode {
                    0 => LoggedCommand::DrawScanline(u16::from_le_bytes(cursor.bytes::<2>()?)),
                    1 => LoggedCommand::FinishFrame(cursor.u32()?),
                    _ => return None,
                });
            }
            frames.push(frame);
        }
        Some(Self {
            initial_state,
            frames,
        })
    }
}

/// Quick sniff for the container magic.
pub fn is_video_log(data: &[u8]) -> bool {
    data.starts_with(&VIDEO_LOG_MAGIC)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn slice(&mut self, len: usize) -> Option<&'a [u8]> {
        let slice = self.data.get(self.pos..self.pos + len)?;
        self.pos += len;
        Some(slice)
    }

    fn bytes<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.slice(N)?.try_into().ok()
    }

    fn u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.bytes()?))
    }
}

/// Playback cursor owned by the video unit. At each frame boundary the
/// next recorded frame is replayed into the renderer; an exhausted log
/// rewinds and reports the end.
pub struct VlpPlayback {
    context: VideoLogContext,
    position: usize,
}

impl VlpPlayback {
    pub fn new(context: VideoLogContext) -> Self {
        Self {
            context,
            position: 0,
        }
    }

    pub fn initial_state(&self) -> &[u8] {
        &self.context.initial_state
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Replay the next frame. Returns false when the log is exhausted, in
    /// which case the cursor has rewound.
    pub fn replay_frame(&mut self, renderer: &mut dyn VideoRenderer) -> bool {
        let Some(frame) = self.context.frames.get(self.position) else {
            self.position = 0;
            return false;
        };
        for command in frame {
            match *command {
                LoggedCommand::DrawScanline(y) => renderer.draw_scanline(y),
                LoggedCommand::FinishFrame(_) => renderer.finish_frame(),
            }
        }
        self.position += 1;
        true
    }
}

/// Core variant that replays a recorded video log. It differs from the
/// live machine only in construction, `reset`, ROM and state loading, and
/// in accepting any image as a "ROM".
pub struct GbaVideoLogPlayer {
    core: GbaCore,
}

impl Default for GbaVideoLogPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl GbaVideoLogPlayer {
    pub fn new() -> Self {
        Self {
            core: GbaCore::new(),
        }
    }

    pub fn load_context(&mut self, context: VideoLogContext) {
        self.core
            .board
            .video
            .set_playback(Some(VlpPlayback::new(context)));
    }

    fn initial_state(&mut self) -> Option<Vec<u8>> {
        self.core
            .board
            .video
            .playback_mut()
            .map(|playback| playback.initial_state().to_vec())
    }
}

macro_rules! forward {
    ($(fn $name:ident(&self $(, $arg:ident: $ty:ty)*) $(-> $ret:ty)?;)*) => {
        $(
            fn $name(&self $(, $arg: $ty)*) $(-> $ret)? {
                self.core.$name($($arg),*)
            }
        )*
    };
}

macro_rules! forward_mut {
    ($(fn $name:ident(&mut self $(, $arg:ident: $ty:ty)*) $(-> $ret:ty)?;)*) => {
        $(
            fn $name(&mut self $(, $arg: $ty)*) $(-> $ret)? {
                self.core.$name($($arg),*)
            }
        )*
    };
}

impl Core for GbaVideoLogPlayer {
    forward! {
        fn platform(&self) -> Platform;
        fn supports_feature(&self, feature: Feature) -> bool;
        fn base_video_size(&self) -> (u32, u32);
        fn current_video_size(&self) -> (u32, u32);
        fn video_scale(&self) -> u32;
        fn screen_regions(&self) -> &'static [ScreenRegion];
        fn get_pixels(&self) -> Option<(&[u32], usize)>;
        fn audio_sample_rate(&self) -> u32;
        fn audio_buffer_size(&self) -> usize;
        fn rom_size(&self) -> usize;
        fn checksum(&self, kind: ChecksumKind) -> Checksum;
        fn state_size(&self) -> usize;
        fn save_state(&self, state: &mut [u8]) -> bool;
        fn save_extra_state(&self, extdata: &mut StateExtdata) -> bool;
        fn get_keys(&self) -> u16;
        fn frame_counter(&self) -> u32;
        fn frame_cycles(&self) -> i32;
        fn frequency(&self) -> i32;
        fn get_game_info(&self) -> Option<GameInfo>;
        fn has_peripheral(&self, kind: PeripheralKind) -> bool;
        fn raw_read8(&self, address: u32, segment: i32) -> u8;
        fn raw_read16(&self, address: u32, segment: i32) -> u16;
        fn raw_read32(&self, address: u32, segment: i32) -> u32;
        fn get_memory_block(&self, id: i32) -> Option<&[u8]>;
        fn list_registers(&self) -> &'static [RegisterInfo];
        fn read_register(&self, name: &str) -> Option<i32>;
        fn lookup_identifier(&self, name: &str) -> Option<(i32, i32)>;
        fn savedata_clone(&self) -> Option<Vec<u8>>;
        fn list_video_layers(&self) -> &'static [ChannelInfo];
        fn list_audio_channels(&self) -> &'static [ChannelInfo];
    }

    forward_mut! {
        fn set_sync(&mut self, sync: Option<Box<dyn CoreSync>>);
        fn load_config(&mut self, config: &CoreConfig);
        fn reload_config_option(&mut self, option: Option<&str>, config: Option<&CoreConfig>);
        fn set_override(&mut self, override_: CartridgeOverride);
        fn set_video_buffer(&mut self, stride: usize);
        fn put_pixels(&mut self, pixels: &[u32], stride: usize);
        fn set_audio_buffer_size(&mut self, samples: usize);
        fn add_core_callbacks(&mut self, callbacks: CoreCallbacks);
        fn clear_core_callbacks(&mut self);
        fn set_av_stream(&mut self, stream: Option<Box<dyn AvStream>>);
        fn load_bios(&mut self, data: Vec<u8>) -> bool;
        fn load_save(&mut self, data: Vec<u8>) -> bool;
        fn load_temporary_save(&mut self, data: Vec<u8>) -> bool;
        fn load_patch(&mut self, patch: &Patch) -> bool;
        fn unload_rom(&mut self);
        fn run_frame(&mut self);
        fn run_loop(&mut self);
        fn step(&mut self);
        fn load_extra_state(&mut self, extdata: &StateExtdata) -> bool;
        fn set_keys(&mut self, keys: u16);
        fn add_keys(&mut self, keys: u16);
        fn clear_keys(&mut self, keys: u16);
        fn set_peripheral(&mut self, peripheral: Peripheral);
        fn bus_read8(&mut self, address: u32) -> u8;
        fn bus_read16(&mut self, address: u32) -> u16;
        fn bus_read32(&mut self, address: u32) -> u32;
        fn bus_write8(&mut self, address: u32, value: u8);
        fn bus_write16(&mut self, address: u32, value: u16);
        fn bus_write32(&mut self, address: u32, value: u32);
        fn raw_write8(&mut self, address: u32, segment: i32, value: u8);
        fn raw_write16(&mut self, address: u32, segment: i32, value: u16);
        fn raw_write32(&mut self, address: u32, segment: i32, value: u32);
        fn list_memory_blocks(&mut self) -> &[MemoryBlock];
        fn write_register(&mut self, name: &str, value: i32) -> bool;
        fn debugger_platform(&mut self) -> &mut DebuggerPlatform;
        fn detach_debugger(&mut self);
        fn load_symbols(&mut self, table: SymbolTable);
        fn cheat_device(&mut self) -> &mut CheatDevice;
        fn savedata_restore(&mut self, data: &[u8], writeback: bool) -> bool;
        fn enable_video_layer(&mut self, id: usize, enable: bool);
        fn enable_audio_channel(&mut self, id: usize, enable: bool);
        fn adjust_video_layer(&mut self, id: usize, x: i32, y: i32);
        fn start_video_log(&mut self) -> bool;
        fn end_video_log(&mut self) -> Option<VideoLogContext>;
    }

    #[cfg(feature = "opengl")]
    fn set_video_gl_tex(&mut self, tex: u32) {
        self.core.set_video_gl_tex(tex);
    }

    fn attach_debugger(&mut self, debugger: Rc<Debugger>) {
        self.core.attach_debugger(debugger);
    }

    /// Any payload counts as loadable here; a parse failure surfaces from
    /// `load_rom` instead.
    fn is_rom(&self, _data: &[u8]) -> bool {
        true
    }

    fn load_rom(&mut self, data: Vec<u8>) -> bool {
        let Some(context) = VideoLogContext::deserialize(&data) else {
            return false;
        };
        self.load_context(context);
        true
    }

    fn load_rom_file(&mut self, path: &Path) -> bool {
        match std::fs::read(path) {
            Ok(data) => self.load_rom(data),
            Err(_) => false,
        }
    }

    fn reset(&mut self) {
        if let Some(playback) = self.core.board.video.playback_mut() {
            playback.rewind();
        }
        self.core.reset();
        if let Some(initial) = self.initial_state()
            && !initial.is_empty()
        {
            self.load_state(&initial);
        } else {
            self.halt_and_quiesce();
        }
    }

    /// Restricted state load: only the display-visible memories and the
    /// frame counter come back. The CPU is parked at the start of EWRAM,
    /// halted, with interrupts cut off, so nothing ever executes.
    fn load_state(&mut self, state: &[u8]) -> bool {
        if state.len() < STATE_SIZE {
            return false;
        }
        self.core
            .board
            .io
            .copy_from_slice(&state[OFS_IO..OFS_IO + 0x400]);
        self.core
            .board
            .palette
            .copy_from_slice(&state[OFS_PALETTE..OFS_PALETTE + 0x400]);
        self.core
            .board
            .oam
            .copy_from_slice(&state[OFS_OAM..OFS_OAM + 0x400]);
        self.core
            .board
            .vram
            .copy_from_slice(&state[OFS_VRAM..OFS_VRAM + 0x18000]);
        self.core.board.video.frame_counter = get_u32(state, OFS_FRAME_COUNTER);
        self.core.board.audio.reset();
        self.halt_and_quiesce();
        true
    }
}

impl GbaVideoLogPlayer {
    fn halt_and_quiesce(&mut self) {
        self.core.cpu.write_pc(GBA_BASE_EWRAM as i32);
        self.core.cpu.halted = true;
        self.core.bus_write16(0x0400_0208, 0);
        self.core.bus_write16(0x0400_0200, 0);
        self.core.board.video.schedule(self.core.board.timing.time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_round_trips_through_container() {
        let mut context = VideoLogContext::new(vec![7; 16]);
        context.frames.push(vec![
            LoggedCommand::DrawScanline(0),
            LoggedCommand::DrawScanline(1),
            LoggedCommand::FinishFrame(0),
        ]);
        context.frames.push(vec![LoggedCommand::FinishFrame(1)]);
        let bytes = context.serialize();
        assert!(is_video_log(&bytes));
        assert_eq!(VideoLogContext::deserialize(&bytes), Some(context));
    }

    #[test]
    fn truncated_container_is_rejected() {
        let context = VideoLogContext::new(vec![1, 2, 3]);
        let bytes = context.serialize();
        assert!(VideoLogContext::deserialize(&bytes[..bytes.len() - 1]).is_none());
        assert!(VideoLogContext::deserialize(b"NOPE").is_none());
    }

    #[test]
    fn playback_rewinds_at_end_of_log() {
        let mut context = VideoLogContext::new(Vec::new());
        context.frames.push(vec![LoggedCommand::FinishFrame(0)]);
        let mut playback = VlpPlayback::new(context);
        let mut renderer = crate::renderer::DummyRenderer;
        assert!(playback.replay_frame(&mut renderer));
        assert_eq!(playback.position(), 1);
        assert!(!playback.replay_frame(&mut renderer));
        assert_eq!(playback.position(), 0);
    }
}
