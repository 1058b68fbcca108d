mod common;

use std::cell::Cell;
use std::rc::Rc;

use once_cell::sync::Lazy;

use rgba_core::cheats::CheatSet;
use rgba_core::config::CoreConfig;
use rgba_core::core::{Checksum, ChecksumKind, Core, CoreCallbacks};
use rgba_core::serialize::{STATE_MAGIC, StateExtdata, SUBSYSTEM_VIDEO_RENDERER, put_u32};
use rgba_core::GbaCore;

use common::{make_bios, make_rom};

static TEST_ROM: Lazy<Vec<u8>> = Lazy::new(|| make_rom(b"ZZZZ"));

fn core_with_rom() -> GbaCore {
    let mut core = GbaCore::new();
    assert!(core.load_rom(TEST_ROM.clone()));
    core
}

#[test]
fn memory_block_catalog_tracks_save_media() {
    let mut core = core_with_rom();
    let blocks = core.list_memory_blocks();
    assert_eq!(blocks.len(), 11);
    let rom = blocks
        .iter()
        .find(|b| b.internal_name == "cart0")
        .expect("ROM block");
    assert_eq!(rom.size, TEST_ROM.len() as u32);

    // A 128kiB save switches the media to banked flash.
    assert!(core.load_save(vec![0xAA; 0x2_0000]));
    let blocks = core.list_memory_blocks();
    assert_eq!(blocks.len(), 12);
    let sram = blocks
        .iter()
        .find(|b| b.internal_name == "sram")
        .expect("save block");
    assert_eq!(sram.size, 0x2_0000);
    assert_eq!(sram.end - sram.start, 0x1_0000);
    assert_eq!(sram.max_segment, 1);
    let sram_id = sram.id;
    // The borrowable block is the active 64kiB bank.
    assert_eq!(core.get_memory_block(sram_id).unwrap().len(), 0x1_0000);
}

#[test]
fn catalog_reports_empty_rom_before_load() {
    let mut core = GbaCore::new();
    let blocks = core.list_memory_blocks();
    let rom = blocks
        .iter()
        .find(|b| b.internal_name == "cart0")
        .expect("ROM block");
    assert_eq!(rom.size, 0);
}

#[test]
fn known_title_gets_default_override_at_reset() {
    let mut core = GbaCore::new();
    assert!(core.load_rom(make_rom(b"BPEE")));
    core.reset();
    let blocks = core.list_memory_blocks();
    let sram = blocks.iter().find(|b| b.internal_name == "sram").unwrap();
    assert_eq!(sram.size, 0x2_0000);
}

#[test]
fn register_names_aliases_and_masks() {
    let mut core = GbaCore::new();
    assert!(core.write_register("sp", 0x0300_7F00));
    assert_eq!(core.read_register("r13"), Some(0x0300_7F00));
    assert!(core.write_register("ip", 12));
    assert_eq!(core.read_register("r12"), Some(12));

    // PC writes realign and refill the pipeline.
    assert!(core.write_register("pc", 0x0800_0001));
    assert_eq!(core.read_register("r15"), Some(0x0800_0004));
    assert_eq!(core.read_register("pc"), Some(0x0800_0004));

    // cpsr reads either case but only writes in lowercase.
    assert!(!core.write_register("CPSR", 0));
    assert!(core.write_register("cpsr", -1));
    assert_eq!(core.read_register("CPSR"), Some(0xF000_00FFu32 as i32));

    assert!(!core.write_register("r16", 0));
    assert_eq!(core.read_register("r16"), None);
}

#[test]
fn key_state_reflects_into_keyinput() {
    let mut core = GbaCore::new();
    core.set_keys(0x0001);
    core.add_keys(0x0200);
    assert_eq!(core.get_keys(), 0x0201);
    assert_eq!(core.bus_read16(0x0400_0130), !0x0201 & 0x3FF);
    core.clear_keys(0x0001);
    assert_eq!(core.get_keys(), 0x0200);
    core.set_keys(0);
    assert_eq!(core.bus_read16(0x0400_0130), 0x3FF);
}

#[test]
fn unknown_config_option_is_a_no_op() {
    let mut core = core_with_rom();
    core.reset();
    let mut config = CoreConfig::new();
    config.set("bogusOption", "7");
    core.reload_config_option(Some("bogusOption"), Some(&config));
    core.run_frame();
    assert_eq!(core.frame_counter(), 1);
}

#[test]
fn run_frame_advances_counter_and_fires_callbacks() {
    let mut core = core_with_rom();
    core.reset();
    let started = Rc::new(Cell::new(0u32));
    let ended = Rc::new(Cell::new(0u32));
    let started_hook = Rc::clone(&started);
    let ended_hook = Rc::clone(&ended);
    core.add_core_callbacks(CoreCallbacks {
        video_frame_started: Some(Box::new(move || {
            started_hook.set(started_hook.get() + 1);
        })),
        video_frame_ended: Some(Box::new(move || {
            ended_hook.set(ended_hook.get() + 1);
        })),
    });
    assert_eq!(core.frame_counter(), 0);
    core.run_frame();
    assert_eq!(core.frame_counter(), 1);
    assert_eq!(started.get(), 1);
    assert_eq!(ended.get(), 1);
    core.run_frame();
    assert_eq!(core.frame_counter(), 2);
    assert_eq!(started.get(), 2);
}

#[test]
fn save_state_round_trips() {
    let mut a = core_with_rom();
    a.reset();
    a.run_frame();
    a.bus_write8(0x0200_0123, 0x42);
    assert!(a.write_register("r3", 77));
    let mut state = vec![0u8; a.state_size()];
    assert!(a.save_state(&mut state));

    let mut b = core_with_rom();
    b.reset();
    assert!(b.load_state(&state));
    assert_eq!(b.frame_counter(), 1);
    assert_eq!(b.bus_read8(0x0200_0123), 0x42);
    assert_eq!(b.read_register("r3"), Some(77));

    // Undersized buffers and bad magic are rejected outright.
    let mut short = vec![0u8; 16];
    assert!(!a.save_state(&mut short));
    assert!(!b.load_state(&short));
    put_u32(&mut state, 0, STATE_MAGIC);
    assert!(!b.load_state(&state));
}

#[test]
fn extra_state_honors_type_tags() {
    let mut core = core_with_rom();
    core.set_video_buffer(240);
    core.reset();
    core.enable_video_layer(2, false);
    let mut extdata = StateExtdata::new();
    assert!(core.save_extra_state(&mut extdata));

    let mut other = GbaCore::new();
    other.set_video_buffer(240);
    assert!(other.load_extra_state(&extdata));

    // A foreign tag is skipped silently.
    let mut mismatched = StateExtdata::new();
    mismatched.put(SUBSYSTEM_VIDEO_RENDERER, 0xDEAD_BEEF, &[0u8; 8]);
    assert!(other.load_extra_state(&mismatched));

    // A payload too short for its tag is an error.
    let mut malformed = StateExtdata::new();
    malformed.put_raw(SUBSYSTEM_VIDEO_RENDERER, vec![1, 2, 3]);
    assert!(!other.load_extra_state(&malformed));
}

#[test]
fn cheat_device_hot_plug_lifecycle() {
    let mut core = core_with_rom();
    core.reset();
    let mut set = CheatSet::new("poke");
    set.add_code(0x0200_0010, 0x5A, 1);
    core.cheat_device().add_set(set);
    core.run_frame();
    assert_eq!(core.bus_read8(0x0200_0010), 0x5A);

    // Unloading the ROM destroys the device with it.
    core.unload_rom();
    assert!(core.cheat_device().sets().is_empty());
}

#[test]
fn checksums_describe_the_pristine_image() {
    let mut core = core_with_rom();
    let expected = crc32fast::hash(&TEST_ROM);
    assert_eq!(core.checksum(ChecksumKind::Crc32), Checksum::Crc32(expected));
    core.raw_write8(0x0800_0010, 0, 0x99);
    assert_eq!(core.bus_read8(0x0800_0010), 0x99);
    assert_eq!(core.checksum(ChecksumKind::Crc32), Checksum::Crc32(expected));
}

#[test]
fn bios_is_discovered_from_the_config_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("gba_bios.bin"), make_bios()).unwrap();
    let mut config = CoreConfig::new();
    config.set_directory(dir.path());

    let mut core = core_with_rom();
    core.load_config(&config);
    core.reset();
    assert_eq!(core.bus_read8(0x0000_0003), 0xEA);
    // The test image carries no logo bitmap, so the intro is skipped.
    assert_eq!(core.read_register("pc"), Some(0x0800_0004));
}

#[test]
fn invalid_bios_candidates_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.bin");
    std::fs::write(&bad, vec![0u8; 16]).unwrap();
    let mut config = CoreConfig::new();
    config.set("gba.bios", bad.display());
    config.set_directory(dir.path());

    let mut core = core_with_rom();
    core.load_config(&config);
    core.reset();
    // Nothing valid was found; the core boots straight into the ROM.
    assert_eq!(core.bus_read8(0x0000_0003), 0);
    assert_eq!(core.read_register("pc"), Some(0x0800_0004));
}

#[test]
fn multiboot_images_boot_from_ewram() {
    let mut rom = make_rom(b"ZZZZ");
    // Entry branch clears the header: b 0xC0.
    rom[0] = 0x2E;
    let mut core = GbaCore::new();
    assert!(core.load_rom(rom));
    core.reset();
    assert_eq!(core.read_register("pc"), Some(0x0200_0004));
    assert_eq!(core.bus_read8(0x0200_0003), 0xEA);
}

#[test]
fn short_images_are_not_roms() {
    let mut core = GbaCore::new();
    assert!(!core.is_rom(&[0xEA; 8]));
    assert!(!core.load_rom(vec![0xEA; 8]));
    assert!(core.is_rom(&TEST_ROM));
}

#[cfg(feature = "opengl")]
#[test]
fn hardware_renderer_takes_over_and_falls_back() {
    use rgba_core::core::Feature;

    let mut core = GbaCore::new();
    assert!(core.supports_feature(Feature::OpenGl));
    let mut config = CoreConfig::new();
    config.set("hwaccelVideo", "true");
    core.load_config(&config);
    core.set_video_buffer(240);
    assert!(core.get_pixels().is_some());

    core.set_video_gl_tex(7);
    assert!(core.get_pixels().is_none());
    assert_eq!(core.video_scale(), 1);

    config.set("hwaccelVideo", "false");
    core.reload_config_option(Some("hwaccelVideo"), Some(&config));
    assert!(core.get_pixels().is_some());
}

#[cfg(feature = "opengl")]
#[test]
fn video_scale_reaches_a_live_hardware_renderer() {
    let mut core = GbaCore::new();
    let mut config = CoreConfig::new();
    config.set("hwaccelVideo", "true");
    config.set("videoScale", 2);
    core.load_config(&config);
    core.set_video_gl_tex(7);
    assert_eq!(core.video_scale(), 2);
    assert_eq!(core.current_video_size(), (480, 320));

    // A reload pushes the new scale without waiting for a reset.
    config.set("videoScale", 3);
    core.reload_config_option(Some("videoScale"), Some(&config));
    assert_eq!(core.video_scale(), 3);
}

#[cfg(feature = "threaded-video")]
#[test]
fn threaded_pipeline_still_renders_and_records() {
    let mut core = core_with_rom();
    let mut config = CoreConfig::new();
    config.set("threadedVideo", "true");
    config.set("threadedVideo.flushScanline", 32);
    core.load_config(&config);
    core.set_video_buffer(240);
    core.reset();
    core.run_frame();
    assert_eq!(core.frame_counter(), 1);
    assert!(core.get_pixels().is_some());

    // An explicit recording takes the stream over from the pipe.
    assert!(core.start_video_log());
    core.run_frame();
    let context = core.end_video_log().expect("open log");
    assert_eq!(context.frames.len(), 1);
    core.run_frame();
    assert_eq!(core.frame_counter(), 3);
}
