//! `GbaCore`: the machine façade tying CPU, board, renderer pipeline,
//! configuration and the debugging surface together behind `Core`.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::warn;

use crate::board::{Board, IdleOptimization, LOGO_CRC32, is_rom as image_is_rom};
use crate::cheats::CheatDevice;
use crate::config::{CoreConfig, CoreOptions};
use crate::core::{
    AvStream, ChannelInfo, Checksum, ChecksumKind, Core, CoreCallbacks, CoreSync, Feature,
    GameInfo, MemoryBlock, Patch, Peripheral, PeripheralKind, Platform, RegisterInfo,
    ScreenRegion,
};
use crate::cpu::{CPU_COMPONENT_CHEAT_DEVICE, CPU_COMPONENT_DEBUGGER, Cpu, CpuComponent};
use crate::debugger::{Debugger, DebuggerPlatform, SymbolTable};
use crate::memmap::{
    GBA_ARM7TDMI_FREQUENCY, GBA_BASE_EWRAM, GBA_BASE_ROM0, GBA_VIDEO_HORIZONTAL_PIXELS,
    GBA_VIDEO_VERTICAL_PIXELS, Region, VIDEO_HORIZONTAL_LENGTH, VIDEO_TOTAL_LENGTH, catalog_for,
};
use crate::overrides::{self, CartridgeOverride, HW_GB_PLAYER_DETECTION, IDLE_LOOP_NONE};
use crate::registers::{self, CPSR_WRITE_MASK, RegisterRef};
use crate::renderer::{ContextRecorder, DummyRenderer, ProxyRenderer, SoftwareRenderer,
    VideoLogger, VideoRenderer};
#[cfg(feature = "opengl")]
use crate::renderer::GlRenderer;
#[cfg(feature = "threaded-video")]
use crate::renderer::ThreadedLogger;
use crate::savedata::Savedata;
use crate::serialize::{
    ExtdataItem, OFS_BANKED_SPSRS, OFS_CPSR, OFS_EWRAM, OFS_FRAME_COUNTER, OFS_GPRS, OFS_HALTED,
    OFS_IO, OFS_IWRAM, OFS_KEYS, OFS_MAGIC, OFS_OAM, OFS_PALETTE, OFS_ROM_CRC32, OFS_SPSR,
    OFS_TIME, OFS_VCOUNT, OFS_VRAM, STATE_MAGIC, STATE_SIZE, STATE_VERSION, StateExtdata,
    SUBSYSTEM_SIO_DRIVER, SUBSYSTEM_VIDEO_RENDERER, get_u16, get_u32, get_u64, put_u16, put_u32,
    put_u64,
};
use crate::vlp::VideoLogContext;

/// Cache tag that never matches a real save-media tag.
const BLOCK_CACHE_INVALID: i32 = -2;

/// Fallback BIOS filename searched in the configuration directory.
const BIOS_FILENAME: &str = "gba_bios.bin";

/// Stack pointer published when the BIOS intro is skipped.
const SKIP_BIOS_SP: i32 = 0x0300_7F00;

static VIDEO_LAYERS: [ChannelInfo; 5] = [
    ChannelInfo {
        id: 0,
        internal_name: "bg0",
        visible_name: "Background 0",
        extra: None,
    },
    ChannelInfo {
        id: 1,
        internal_name: "bg1",
        visible_name: "Background 1",
        extra: None,
    },
    ChannelInfo {
        id: 2,
        internal_name: "bg2",
        visible_name: "Background 2",
        extra: None,
    },
    ChannelInfo {
        id: 3,
        internal_name: "bg3",
        visible_name: "Background 3",
        extra: None,
    },
    ChannelInfo {
        id: 4,
        internal_name: "obj",
        visible_name: "Objects",
        extra: None,
    },
];

static SCREEN_REGIONS: [ScreenRegion; 1] = [ScreenRegion {
    id: 0,
    description: "Screen",
    x: 0,
    y: 0,
    width: GBA_VIDEO_HORIZONTAL_PIXELS,
    height: GBA_VIDEO_VERTICAL_PIXELS,
}];

/// Configuration keys the core snapshots for itself.
const CONFIG_KEYS: &[&str] = &[
    "mute",
    "volume",
    "frameskip",
    "skipBios",
    "useBios",
    "gba.bios",
    "hwaccelVideo",
    "threadedVideo",
    "threadedVideo.flushScanline",
    "videoScale",
    "gba.forceGbp",
    "vbaBugCompat",
    "allowOpposingDirections",
    "idleOptimization",
];

fn parse_idle_optimization(value: Option<&str>) -> IdleOptimization {
    match value {
        Some(v) if v.eq_ignore_ascii_case("ignore") => IdleOptimization::Ignore,
        Some(v) if v.eq_ignore_ascii_case("detect") => IdleOptimization::Detect,
        _ => IdleOptimization::Remove,
    }
}

pub struct GbaCore {
    pub(crate) cpu: Cpu,
    pub(crate) board: Board,
    config: CoreConfig,
    opts: CoreOptions,
    memory_blocks: Vec<MemoryBlock>,
    memory_blocks_tag: i32,
    explicit_override: Option<CartridgeOverride>,
    symbols: SymbolTable,
    debugger_platform: DebuggerPlatform,
    stride: Option<usize>,
    #[cfg(feature = "opengl")]
    gl_tex: Option<u32>,
    hwaccel: bool,
    threaded: bool,
    flush_scanline: Option<u16>,
    video_scale: u32,
    force_gbp: bool,
    vba_bug_compat_cfg: Option<bool>,
    idle_optimization: IdleOptimization,
    layer_enabled: [bool; 5],
    layer_offsets: [(i32, i32); 5],
}

impl Default for GbaCore {
    fn default() -> Self {
        Self::new()
    }
}

impl GbaCore {
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            board: Board::new(),
            config: CoreConfig::new(),
            opts: CoreOptions::default(),
            memory_blocks: Vec::new(),
            memory_blocks_tag: BLOCK_CACHE_INVALID,
            explicit_override: None,
            symbols: SymbolTable::new(),
            debugger_platform: DebuggerPlatform::new(),
            stride: None,
            #[cfg(feature = "opengl")]
            gl_tex: None,
            hwaccel: false,
            threaded: false,
            flush_scanline: None,
            video_scale: 1,
            force_gbp: false,
            vba_bug_compat_cfg: None,
            idle_optimization: IdleOptimization::default(),
            layer_enabled: [true; 5],
            layer_offsets: [(0, 0); 5],
        }
    }

    fn apply_config(&mut self) {
        let config = &self.config;
        let mut opts = CoreOptions::default();
        if let Some(mute) = config.get_bool("mute") {
            opts.mute = mute;
        }
        if let Some(volume) = config.get_int("volume") {
            opts.volume = volume;
        }
        if let Some(frameskip) = config.get_int("frameskip") {
            opts.frameskip = frameskip;
        }
        if let Some(skip) = config.get_bool("skipBios") {
            opts.skip_bios = skip;
        }
        if let Some(use_bios) = config.get_bool("useBios") {
            opts.use_bios = use_bios;
        }
        opts.bios = config.get_value("gba.bios").map(PathBuf::from);
        self.hwaccel = config.get_bool("hwaccelVideo").unwrap_or(false);
        self.threaded = config.get_bool("threadedVideo").unwrap_or(false);
        // A negative interval means flush only at frame boundaries.
        self.flush_scanline = config
            .get_int("threadedVideo.flushScanline")
            .and_then(|n| u16::try_from(n).ok());
        self.video_scale = config.get_int("videoScale").map_or(1, |n| n.max(1) as u32);
        self.force_gbp = config.get_bool("gba.forceGbp").unwrap_or(false);
        self.vba_bug_compat_cfg = config.get_bool("vbaBugCompat");
        self.idle_optimization = parse_idle_optimization(config.get_value("idleOptimization"));
        self.board.allow_opposing_directions = config
            .get_bool("allowOpposingDirections")
            .unwrap_or(false);
        self.board.audio.mute = opts.mute;
        self.board.audio.master_volume = if opts.mute { 0 } else { opts.volume };
        self.opts = opts;
    }

    /// `Detect` has nothing left to detect once an override already names
    /// the loop address; it collapses to `Remove`.
    fn effective_idle_optimization(&self) -> IdleOptimization {
        if self.idle_optimization == IdleOptimization::Detect
            && self.board.idle_loop != IDLE_LOOP_NONE
        {
            IdleOptimization::Remove
        } else {
            self.idle_optimization
        }
    }

    /// Build the renderer pipeline for the current configuration. Stages
    /// stack dummy-first; the last built stage wins.
    fn build_renderer_chain(&self) -> Box<dyn VideoRenderer> {
        let mut chain: Box<dyn VideoRenderer> = Box::new(DummyRenderer);
        if let Some(stride) = self.stride {
            chain = Box::new(SoftwareRenderer::new(stride));
        }
        #[cfg(feature = "opengl")]
        if self.hwaccel && let Some(tex) = self.gl_tex {
            chain = Box::new(GlRenderer::new(tex, self.video_scale));
        }
        #[cfg(feature = "threaded-video")]
        if self.threaded && !self.board.video.renderer().is_recording() {
            // Decouple the command stream from the emulation thread. A live
            // recording already owns the stream, so it takes precedence.
            chain = Box::new(ProxyRenderer::pipe(
                chain,
                Box::new(ThreadedLogger::pipe()),
                self.flush_scanline,
            ));
        }
        for (layer, &enabled) in self.layer_enabled.iter().enumerate() {
            chain.set_layer_enabled(layer, enabled);
        }
        for (layer, &(x, y)) in self.layer_offsets.iter().enumerate() {
            chain.adjust_layer(layer, x, y);
        }
        chain
    }

    /// Rebuild the chain in place. A live recording proxy adopts the new
    /// chain instead of being torn down.
    fn rebuild_renderer(&mut self) {
        // Build before taking; the chain builder inspects the live renderer.
        let chain = self.build_renderer_chain();
        let old = self.board.video.take_renderer();
        self.board.video.install_renderer(old.reshim(chain));
    }

    fn rebuild_memory_blocks(&mut self) {
        let tag = self.board.savedata.save_type().tag();
        if self.memory_blocks_tag == tag {
            return;
        }
        let mut blocks = catalog_for(self.board.savedata.save_type()).to_vec();
        let rom_size = self.board.rom.len() as u32;
        for block in &mut blocks {
            if block.id == Region::Rom0 as i32
                || block.id == Region::Rom1 as i32
                || block.id == Region::Rom2 as i32
            {
                block.size = rom_size;
            }
        }
        self.memory_blocks = blocks;
        self.memory_blocks_tag = tag;
    }

    fn load_bios_from(&mut self, path: &Path) -> std::io::Result<bool> {
        let data = std::fs::read(path)?;
        Ok(self.board.load_bios(data))
    }

    /// BIOS discovery: explicit option, then the configured path, then the
    /// well-known filename in the configuration directory. Every candidate
    /// must pass image validation before it is accepted.
    fn discover_bios(&mut self) {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(bios) = &self.opts.bios {
            candidates.push(bios.clone());
        }
        if let Some(path) = self.config.get_value("gba.bios") {
            candidates.push(PathBuf::from(path));
        }
        if let Some(dir) = self.config.directory() {
            candidates.push(dir.join(BIOS_FILENAME));
        }
        for path in candidates {
            if self.load_bios_from(&path).unwrap_or(false) {
                return;
            }
        }
    }

    fn apply_skip_bios(&mut self) {
        let target = if self.board.multiboot {
            GBA_BASE_EWRAM
        } else {
            GBA_BASE_ROM0
        };
        self.cpu.gprs[13] = SKIP_BIOS_SP;
        self.cpu.write_pc(target as i32);
    }

    fn apply_cheats(&mut self) {
        let Some(CpuComponent::Cheats(device)) = self.cpu.component(CPU_COMPONENT_CHEAT_DEVICE)
        else {
            return;
        };
        let patches: Vec<_> = device.pending_patches().collect();
        for patch in patches {
            match patch.width {
                1 => self.board.bus_write8(patch.address, patch.operand as u8),
                2 => self.board.bus_write16(patch.address, patch.operand as u16),
                _ => self.board.bus_write32(patch.address, patch.operand),
            }
        }
    }
}

impl Core for GbaCore {
    fn platform(&self) -> Platform {
        Platform::Gba
    }

    fn supports_feature(&self, feature: Feature) -> bool {
        match feature {
            Feature::OpenGl => cfg!(feature = "opengl"),
        }
    }

    fn set_sync(&mut self, sync: Option<Box<dyn CoreSync>>) {
        self.board.sync = sync;
    }

    fn load_config(&mut self, config: &CoreConfig) {
        for &key in CONFIG_KEYS {
            self.config.copy_value(config, key);
        }
        if let Some(dir) = config.directory() {
            self.config.set_directory(dir);
        }
        self.apply_config();
    }

    fn reload_config_option(&mut self, option: Option<&str>, config: Option<&CoreConfig>) {
        let Some(key) = option else {
            if let Some(config) = config {
                self.load_config(config);
            }
            return;
        };
        if let Some(config) = config {
            self.config.copy_value(config, key);
        }
        match key {
            "mute" => {
                self.opts.mute = self.config.get_bool("mute").unwrap_or(false);
                self.board.audio.mute = self.opts.mute;
                self.board.audio.master_volume =
                    if self.opts.mute { 0 } else { self.opts.volume };
            }
            "volume" => {
                self.opts.volume = self.config.get_int("volume").unwrap_or(0x100);
                self.board.audio.master_volume =
                    if self.opts.mute { 0 } else { self.opts.volume };
            }
            "frameskip" => {
                self.opts.frameskip = self.config.get_int("frameskip").unwrap_or(0);
            }
            // The threaded flag is deliberately not re-read here; it only
            // takes effect at the next reset.
            "hwaccelVideo" => {
                self.hwaccel = self.config.get_bool("hwaccelVideo").unwrap_or(false);
                self.rebuild_renderer();
            }
            "videoScale" => {
                self.video_scale = self
                    .config
                    .get_int("videoScale")
                    .map_or(1, |n| n.max(1) as u32);
                self.board.video.renderer_mut().set_scale(self.video_scale);
            }
            "allowOpposingDirections" => {
                self.board.allow_opposing_directions = self
                    .config
                    .get_bool("allowOpposingDirections")
                    .unwrap_or(false);
            }
            "idleOptimization" => {
                self.idle_optimization =
                    parse_idle_optimization(self.config.get_value("idleOptimization"));
                self.board.idle_optimization = self.effective_idle_optimization();
            }
            _ => {}
        }
    }

    fn set_override(&mut self, override_: CartridgeOverride) {
        self.explicit_override = Some(override_);
    }

    fn base_video_size(&self) -> (u32, u32) {
        (GBA_VIDEO_HORIZONTAL_PIXELS, GBA_VIDEO_VERTICAL_PIXELS)
    }

    fn current_video_size(&self) -> (u32, u32) {
        let scale = self.board.video.renderer().scale();
        (
            GBA_VIDEO_HORIZONTAL_PIXELS * scale,
            GBA_VIDEO_VERTICAL_PIXELS * scale,
        )
    }

    fn video_scale(&self) -> u32 {
        self.board.video.renderer().scale()
    }

    fn screen_regions(&self) -> &'static [ScreenRegion] {
        &SCREEN_REGIONS
    }

    fn set_video_buffer(&mut self, stride: usize) {
        self.stride = Some(stride);
        self.rebuild_renderer();
    }

    #[cfg(feature = "opengl")]
    fn set_video_gl_tex(&mut self, tex: u32) {
        self.gl_tex = Some(tex);
        self.rebuild_renderer();
    }

    fn get_pixels(&self) -> Option<(&[u32], usize)> {
        self.board.video.renderer().get_pixels()
    }

    fn put_pixels(&mut self, pixels: &[u32], stride: usize) {
        self.board.video.renderer_mut().put_pixels(pixels, stride);
    }

    fn audio_sample_rate(&self) -> u32 {
        self.board.audio.sample_rate()
    }

    fn audio_buffer_size(&self) -> usize {
        self.board.audio.buffer_samples()
    }

    fn set_audio_buffer_size(&mut self, samples: usize) {
        self.board.audio.resize_buffer(samples);
    }

    fn add_core_callbacks(&mut self, callbacks: CoreCallbacks) {
        self.board.callbacks.push(callbacks);
    }

    fn clear_core_callbacks(&mut self) {
        self.board.callbacks.clear();
    }

    fn set_av_stream(&mut self, stream: Option<Box<dyn AvStream>>) {
        self.board.av_stream = stream;
        if let Some(stream) = self.board.av_stream.as_mut() {
            let scale = self.board.video.renderer().scale();
            stream.video_dimensions_changed(
                GBA_VIDEO_HORIZONTAL_PIXELS * scale,
                GBA_VIDEO_VERTICAL_PIXELS * scale,
            );
            stream.audio_rate_changed(self.board.audio.sample_rate());
        }
    }

    fn is_rom(&self, data: &[u8]) -> bool {
        image_is_rom(data)
    }

    fn load_rom(&mut self, data: Vec<u8>) -> bool {
        if !self.board.load_rom(data) {
            return false;
        }
        self.memory_blocks_tag = BLOCK_CACHE_INVALID;
        true
    }

    fn load_rom_file(&mut self, path: &Path) -> bool {
        match std::fs::read(path) {
            Ok(data) => self.load_rom(data),
            Err(_) => false,
        }
    }

    fn load_bios(&mut self, data: Vec<u8>) -> bool {
        self.board.load_bios(data)
    }

    fn load_save(&mut self, data: Vec<u8>) -> bool {
        let loaded = self.board.savedata.load(data);
        if loaded {
            self.memory_blocks_tag = BLOCK_CACHE_INVALID;
        }
        loaded
    }

    fn load_temporary_save(&mut self, data: Vec<u8>) -> bool {
        self.board.savedata.mask(data);
        true
    }

    fn load_patch(&mut self, patch: &Patch) -> bool {
        if self.board.rom.is_empty() || patch.changes.is_empty() {
            return false;
        }
        for &(offset, value) in &patch.changes {
            self.board.patch_rom(offset as usize, value);
        }
        true
    }

    fn unload_rom(&mut self) {
        // The cheat device is bound to the loaded image; tear it down
        // before the ROM goes away.
        self.cpu.detach_component(CPU_COMPONENT_CHEAT_DEVICE);
        self.board.unload_rom();
        self.board.savedata = Savedata::new();
        self.memory_blocks_tag = BLOCK_CACHE_INVALID;
    }

    fn rom_size(&self) -> usize {
        self.board.rom.len()
    }

    fn checksum(&self, kind: ChecksumKind) -> Checksum {
        self.board.checksum(kind)
    }

    fn reset(&mut self) {
        self.rebuild_renderer();
        self.board.hardware = 0;
        self.board.idle_loop = IDLE_LOOP_NONE;
        self.board.vba_bug_compat = self.vba_bug_compat_cfg.unwrap_or(true);
        if self.force_gbp {
            self.board.hardware |= HW_GB_PLAYER_DETECTION;
        }
        let override_ = self
            .explicit_override
            .or_else(|| self.board.game_id().and_then(overrides::find));
        if let Some(override_) = override_ {
            if let Some(save_type) = override_.save_type {
                self.board.savedata.set_type(save_type);
            }
            self.board.hardware |= override_.hardware;
            self.board.idle_loop = override_.idle_loop;
            self.board.vba_bug_compat |= override_.vba_bug_compat;
        }
        self.board.idle_optimization = self.effective_idle_optimization();
        self.memory_blocks_tag = BLOCK_CACHE_INVALID;
        if self.opts.use_bios && !self.board.has_bios() {
            self.discover_bios();
        }
        self.board.reset();
        self.cpu.reset();
        if self.board.multiboot {
            let len = self.board.rom.len();
            self.board.ewram[..len].copy_from_slice(&self.board.rom);
        }
        let mut skip = self.opts.skip_bios || !self.board.has_bios();
        if !skip
            && let Some(crc) = self.board.rom_logo_crc32()
            && crc != LOGO_CRC32
        {
            warn!("ROM header logo is invalid; skipping BIOS intro");
            skip = true;
        }
        if skip && !self.board.rom.is_empty() {
            self.apply_skip_bios();
        }
        self.board.video.schedule(self.board.timing.time);
    }

    fn run_frame(&mut self) {
        self.board.take_early_exit();
        self.apply_cheats();
        let frame = self.board.video.frame_counter;
        let start = self.board.timing.time;
        let bound = (VIDEO_TOTAL_LENGTH + VIDEO_HORIZONTAL_LENGTH) as u64;
        while self.board.video.frame_counter == frame
            && self.board.timing.time.wrapping_sub(start) < bound
        {
            self.cpu.run_loop(&mut self.board);
            if self.board.take_early_exit() {
                break;
            }
        }
    }

    fn run_loop(&mut self) {
        self.cpu.run_loop(&mut self.board);
    }

    fn step(&mut self) {
        self.cpu.step(&mut self.board);
    }

    fn state_size(&self) -> usize {
        STATE_SIZE
    }

    fn load_state(&mut self, state: &[u8]) -> bool {
        if state.len() < STATE_SIZE {
            return false;
        }
        if get_u32(state, OFS_MAGIC) != STATE_MAGIC + STATE_VERSION {
            warn!("Save state magic mismatch; refusing to load");
            return false;
        }
        if get_u32(state, OFS_ROM_CRC32) != self.board.rom_crc32 {
            warn!("Save state was taken from a different ROM image");
        }
        self.board.io.copy_from_slice(&state[OFS_IO..OFS_IO + 0x400]);
        self.board
            .palette
            .copy_from_slice(&state[OFS_PALETTE..OFS_PALETTE + 0x400]);
        self.board.oam.copy_from_slice(&state[OFS_OAM..OFS_OAM + 0x400]);
        self.board
            .vram
            .copy_from_slice(&state[OFS_VRAM..OFS_VRAM + 0x18000]);
        self.board
            .iwram
            .copy_from_slice(&state[OFS_IWRAM..OFS_IWRAM + 0x8000]);
        self.board
            .ewram
            .copy_from_slice(&state[OFS_EWRAM..OFS_EWRAM + 0x40000]);
        for i in 0..16 {
            self.cpu.gprs[i] = get_u32(state, OFS_GPRS + 4 * i) as i32;
        }
        self.cpu.cpsr = get_u32(state, OFS_CPSR);
        self.cpu.spsr = get_u32(state, OFS_SPSR);
        for (i, spsr) in self.cpu.banked_spsrs.iter_mut().enumerate() {
            *spsr = get_u32(state, OFS_BANKED_SPSRS + 4 * i);
        }
        self.cpu.halted = state[OFS_HALTED] != 0;
        self.board.timing.time = get_u64(state, OFS_TIME);
        self.board.video.frame_counter = get_u32(state, OFS_FRAME_COUNTER);
        self.board.video.vcount = get_u16(state, OFS_VCOUNT);
        self.board.set_keys(get_u16(state, OFS_KEYS));
        if self.board.video.active {
            self.board.video.schedule(self.board.timing.time);
        }
        true
    }

    fn save_state(&self, state: &mut [u8]) -> bool {
        if state.len() < STATE_SIZE {
            return false;
        }
        put_u32(state, OFS_MAGIC, STATE_MAGIC + STATE_VERSION);
        put_u32(state, OFS_ROM_CRC32, self.board.rom_crc32);
        put_u32(state, OFS_FRAME_COUNTER, self.board.video.frame_counter);
        put_u16(state, OFS_VCOUNT, self.board.video.vcount);
        put_u16(state, OFS_KEYS, self.board.get_keys());
        put_u64(state, OFS_TIME, self.board.timing.time);
        for i in 0..16 {
            put_u32(state, OFS_GPRS + 4 * i, self.cpu.gprs[i] as u32);
        }
        put_u32(state, OFS_CPSR, self.cpu.cpsr);
        put_u32(state, OFS_SPSR, self.cpu.spsr);
        for (i, &spsr) in self.cpu.banked_spsrs.iter().enumerate() {
            put_u32(state, OFS_BANKED_SPSRS + 4 * i, spsr);
        }
        state[OFS_HALTED] = self.cpu.halted as u8;
        state[OFS_IO..OFS_IO + 0x400].copy_from_slice(&self.board.io);
        state[OFS_PALETTE..OFS_PALETTE + 0x400].copy_from_slice(&self.board.palette);
        state[OFS_OAM..OFS_OAM + 0x400].copy_from_slice(&self.board.oam);
        state[OFS_VRAM..OFS_VRAM + 0x18000].copy_from_slice(&self.board.vram);
        state[OFS_IWRAM..OFS_IWRAM + 0x8000].copy_from_slice(&self.board.iwram);
        state[OFS_EWRAM..OFS_EWRAM + 0x40000].copy_from_slice(&self.board.ewram);
        true
    }

    fn load_extra_state(&mut self, extdata: &StateExtdata) -> bool {
        let mut ok = true;
        let renderer_tag = self.board.video.renderer().type_tag();
        match extdata.fetch(SUBSYSTEM_VIDEO_RENDERER, renderer_tag) {
            ExtdataItem::Payload(body) => {
                ok &= self.board.video.renderer_mut().load_state(body);
            }
            ExtdataItem::Malformed => ok = false,
            ExtdataItem::Missing | ExtdataItem::Mismatch => {}
        }
        if let Some(sio) = self.board.sio.as_mut() {
            match extdata.fetch(SUBSYSTEM_SIO_DRIVER, sio.driver_id()) {
                ExtdataItem::Payload(body) => ok &= sio.load_state(body),
                ExtdataItem::Malformed => ok = false,
                ExtdataItem::Missing | ExtdataItem::Mismatch => {}
            }
        }
        ok
    }

    fn save_extra_state(&self, extdata: &mut StateExtdata) -> bool {
        let renderer = self.board.video.renderer();
        let body = renderer.save_state();
        if !body.is_empty() {
            extdata.put(SUBSYSTEM_VIDEO_RENDERER, renderer.type_tag(), &body);
        }
        if let Some(sio) = self.board.sio.as_ref() {
            let body = sio.save_state();
            if !body.is_empty() {
                extdata.put(SUBSYSTEM_SIO_DRIVER, sio.driver_id(), &body);
            }
        }
        true
    }

    fn set_keys(&mut self, keys: u16) {
        self.board.set_keys(keys);
    }

    fn add_keys(&mut self, keys: u16) {
        self.board.add_keys(keys);
    }

    fn clear_keys(&mut self, keys: u16) {
        self.board.clear_keys(keys);
    }

    fn get_keys(&self) -> u16 {
        self.board.get_keys()
    }

    fn frame_counter(&self) -> u32 {
        self.board.video.frame_counter
    }

    fn frame_cycles(&self) -> i32 {
        VIDEO_TOTAL_LENGTH as i32
    }

    fn frequency(&self) -> i32 {
        GBA_ARM7TDMI_FREQUENCY
    }

    fn get_game_info(&self) -> Option<GameInfo> {
        self.board.game_info()
    }

    fn set_peripheral(&mut self, peripheral: Peripheral) {
        match peripheral {
            Peripheral::Rotation(rotation) => self.board.rotation = Some(rotation),
            Peripheral::Rumble(rumble) => self.board.rumble = Some(rumble),
            Peripheral::Luminance(luminance) => self.board.luminance = Some(luminance),
            Peripheral::LinkPort(mut driver) => {
                if driver.init() {
                    self.board.sio = Some(driver);
                }
            }
        }
    }

    fn has_peripheral(&self, kind: PeripheralKind) -> bool {
        match kind {
            PeripheralKind::Rotation => self.board.rotation.is_some(),
            PeripheralKind::Rumble => self.board.rumble.is_some(),
            PeripheralKind::Luminance => self.board.luminance.is_some(),
            PeripheralKind::LinkPort => self.board.sio.is_some(),
        }
    }

    fn bus_read8(&mut self, address: u32) -> u8 {
        self.board.bus_read8(address)
    }

    fn bus_read16(&mut self, address: u32) -> u16 {
        self.board.bus_read16(address)
    }

    fn bus_read32(&mut self, address: u32) -> u32 {
        self.board.bus_read32(address)
    }

    fn bus_write8(&mut self, address: u32, value: u8) {
        self.board.bus_write8(address, value);
        if self.board.take_halt_request() {
            self.cpu.halted = true;
        }
    }

    fn bus_write16(&mut self, address: u32, value: u16) {
        self.board.bus_write16(address, value);
        if self.board.take_halt_request() {
            self.cpu.halted = true;
        }
    }

    fn bus_write32(&mut self, address: u32, value: u32) {
        self.board.bus_write32(address, value);
        if self.board.take_halt_request() {
            self.cpu.halted = true;
        }
    }

    fn raw_read8(&self, address: u32, segment: i32) -> u8 {
        self.board.raw_read8(address, segment)
    }

    fn raw_read16(&self, address: u32, segment: i32) -> u16 {
        self.board.raw_read16(address, segment)
    }

    fn raw_read32(&self, address: u32, segment: i32) -> u32 {
        self.board.raw_read32(address, segment)
    }

    fn raw_write8(&mut self, address: u32, segment: i32, value: u8) {
        self.board.raw_write8(address, segment, value);
    }

    fn raw_write16(&mut self, address: u32, segment: i32, value: u16) {
        self.board.raw_write16(address, segment, value);
    }

    fn raw_write32(&mut self, address: u32, segment: i32, value: u32) {
        self.board.raw_write32(address, segment, value);
    }

    fn list_memory_blocks(&mut self) -> &[MemoryBlock] {
        self.rebuild_memory_blocks();
        &self.memory_blocks
    }

    fn get_memory_block(&self, id: i32) -> Option<&[u8]> {
        self.board.memory_block(id)
    }

    fn list_registers(&self) -> &'static [RegisterInfo] {
        registers::list()
    }

    fn read_register(&self, name: &str) -> Option<i32> {
        match registers::parse_read(name)? {
            RegisterRef::Gpr(index) => Some(self.cpu.gprs[index]),
            RegisterRef::Cpsr => Some(self.cpu.cpsr as i32),
        }
    }

    fn write_register(&mut self, name: &str, value: i32) -> bool {
        match registers::parse_write(name) {
            Some(RegisterRef::Cpsr) => {
                self.cpu.cpsr = value as u32 & CPSR_WRITE_MASK;
                true
            }
            Some(RegisterRef::Gpr(15)) => {
                self.cpu.write_pc(value);
                true
            }
            Some(RegisterRef::Gpr(index)) => {
                self.cpu.gprs[index] = value;
                true
            }
            None => false,
        }
    }

    fn debugger_platform(&mut self) -> &mut DebuggerPlatform {
        &mut self.debugger_platform
    }

    fn attach_debugger(&mut self, debugger: Rc<Debugger>) {
        self.debugger_platform.attach(Rc::clone(&debugger));
        self.cpu
            .attach_component(CPU_COMPONENT_DEBUGGER, CpuComponent::Debugger(debugger));
    }

    fn detach_debugger(&mut self) {
        self.debugger_platform.detach();
        self.cpu.detach_component(CPU_COMPONENT_DEBUGGER);
    }

    fn load_symbols(&mut self, table: SymbolTable) {
        self.symbols = table;
    }

    fn lookup_identifier(&self, name: &str) -> Option<(i32, i32)> {
        self.symbols
            .lookup(name)
            .map(|value| (value, -1))
            .or_else(|| registers::lookup_io_register(name))
    }

    fn cheat_device(&mut self) -> &mut CheatDevice {
        if !matches!(
            self.cpu.component(CPU_COMPONENT_CHEAT_DEVICE),
            Some(CpuComponent::Cheats(_))
        ) {
            self.cpu.attach_component(
                CPU_COMPONENT_CHEAT_DEVICE,
                CpuComponent::Cheats(CheatDevice::new()),
            );
        }
        match self.cpu.component_mut(CPU_COMPONENT_CHEAT_DEVICE) {
            Some(CpuComponent::Cheats(device)) => device,
            _ => unreachable!(),
        }
    }

    fn savedata_clone(&self) -> Option<Vec<u8>> {
        self.board.savedata.clone_contents()
    }

    fn savedata_restore(&mut self, data: &[u8], writeback: bool) -> bool {
        self.board.savedata.restore(data, writeback)
    }

    fn list_video_layers(&self) -> &'static [ChannelInfo] {
        &VIDEO_LAYERS
    }

    fn list_audio_channels(&self) -> &'static [ChannelInfo] {
        crate::audio::channels()
    }

    fn enable_video_layer(&mut self, id: usize, enable: bool) {
        if let Some(slot) = self.layer_enabled.get_mut(id) {
            *slot = enable;
        }
        self.board.video.renderer_mut().set_layer_enabled(id, enable);
    }

    fn enable_audio_channel(&mut self, id: usize, enable: bool) {
        self.board.audio.set_channel_enabled(id, enable);
    }

    fn adjust_video_layer(&mut self, id: usize, x: i32, y: i32) {
        if let Some(slot) = self.layer_offsets.get_mut(id) {
            *slot = (x, y);
        }
        self.board.video.renderer_mut().adjust_layer(id, x, y);
    }

    fn start_video_log(&mut self) -> bool {
        if self.board.video.renderer().is_recording() {
            return false;
        }
        let mut initial = vec![0u8; STATE_SIZE];
        if !self.save_state(&mut initial) {
            return false;
        }
        #[cfg(feature = "threaded-video")]
        let logger: Box<dyn VideoLogger> = if self.threaded {
            Box::new(ThreadedLogger::spawn(initial))
        } else {
            Box::new(ContextRecorder::new(initial))
        };
        #[cfg(not(feature = "threaded-video"))]
        let logger: Box<dyn VideoLogger> = Box::new(ContextRecorder::new(initial));
        let inner = self.board.video.take_renderer();
        self.board
            .video
            .install_renderer(Box::new(ProxyRenderer::new(
                inner,
                logger,
                self.flush_scanline,
            )));
        true
    }

    fn end_video_log(&mut self) -> Option<VideoLogContext> {
        let (inner, context) = self.board.video.renderer_mut().end_log()?;
        self.board.video.install_renderer(inner);
        Some(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vba_bug_compat_defaults_on() {
        let mut core = GbaCore::new();
        core.reset();
        assert!(core.board.vba_bug_compat);

        let mut config = CoreConfig::new();
        config.set("vbaBugCompat", false);
        core.load_config(&config);
        core.reset();
        assert!(!core.board.vba_bug_compat);
    }

    #[test]
    fn mute_forces_master_volume_to_zero() {
        let mut core = GbaCore::new();
        let mut config = CoreConfig::new();
        config.set("mute", true);
        config.set("volume", 0x40);
        core.load_config(&config);
        assert!(core.board.audio.mute);
        assert_eq!(core.board.audio.master_volume, 0);

        config.set("volume", 0x80);
        core.reload_config_option(Some("volume"), Some(&config));
        assert_eq!(core.board.audio.master_volume, 0);

        config.set("mute", false);
        core.reload_config_option(Some("mute"), Some(&config));
        assert_eq!(core.board.audio.master_volume, 0x80);
    }

    #[test]
    fn idle_detection_downgrades_when_loop_is_known() {
        let mut core = GbaCore::new();
        let mut config = CoreConfig::new();
        config.set("idleOptimization", "detect");
        core.load_config(&config);
        core.reset();
        assert_eq!(core.board.idle_optimization, IdleOptimization::Detect);

        core.board.idle_loop = 0x0800_1234;
        core.reload_config_option(Some("idleOptimization"), Some(&config));
        assert_eq!(core.board.idle_optimization, IdleOptimization::Remove);

        config.set("idleOptimization", "ignore");
        core.reload_config_option(Some("idleOptimization"), Some(&config));
        assert_eq!(core.board.idle_optimization, IdleOptimization::Ignore);
    }
}
