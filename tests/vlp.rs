mod common;

use rgba_core::serialize::STATE_SIZE;
use rgba_core::vlp::{VideoLogContext, is_video_log};
use rgba_core::{Core, GbaCore, GbaVideoLogPlayer};

use common::make_rom;

fn record_log(frames: usize) -> VideoLogContext {
    let mut core = GbaCore::new();
    core.set_video_buffer(240);
    assert!(core.load_rom(make_rom(b"ZZZZ")));
    core.reset();
    assert!(core.start_video_log());
    // Recording twice is refused while a log is open.
    assert!(!core.start_video_log());
    for _ in 0..frames {
        core.run_frame();
    }
    core.end_video_log().expect("open log")
}

#[test]
fn recording_captures_whole_frames() {
    let context = record_log(3);
    assert_eq!(context.frames.len(), 3);
    // 160 visible scanlines plus the frame terminator.
    assert_eq!(context.frames[0].len(), 161);
    assert_eq!(context.initial_state.len(), STATE_SIZE);
    assert!(is_video_log(&context.serialize()));
}

#[test]
fn ending_without_a_log_yields_nothing() {
    let mut core = GbaCore::new();
    assert!(core.end_video_log().is_none());
}

#[test]
fn player_accepts_any_image_as_rom() {
    let player = GbaVideoLogPlayer::new();
    assert!(player.is_rom(b"anything at all"));
}

#[test]
fn player_rejects_garbage_payloads() {
    let mut player = GbaVideoLogPlayer::new();
    assert!(!player.load_rom(b"not a log".to_vec()));
}

#[test]
fn player_replays_then_rewinds_at_end_of_log() {
    let context = record_log(2);
    let mut player = GbaVideoLogPlayer::new();
    assert!(player.load_rom(context.serialize()));
    player.set_video_buffer(240);
    player.reset();
    assert_eq!(player.frame_counter(), 0);

    player.run_frame();
    assert_eq!(player.frame_counter(), 1);
    player.run_frame();
    assert_eq!(player.frame_counter(), 2);

    // The log is exhausted: this boundary claims no frame.
    player.run_frame();
    assert_eq!(player.frame_counter(), 2);

    // After the rewind, playback starts over.
    player.run_frame();
    assert_eq!(player.frame_counter(), 3);
}

#[test]
fn reset_rewinds_playback() {
    let context = record_log(2);
    let mut player = GbaVideoLogPlayer::new();
    assert!(player.load_rom(context.serialize()));
    player.set_video_buffer(240);
    player.reset();
    player.run_frame();
    player.run_frame();
    assert_eq!(player.frame_counter(), 2);
    player.reset();
    assert_eq!(player.frame_counter(), 0);
    player.run_frame();
    assert_eq!(player.frame_counter(), 1);
}

#[test]
fn restricted_state_load_parks_the_cpu() {
    let mut live = GbaCore::new();
    assert!(live.load_rom(make_rom(b"ZZZZ")));
    live.reset();
    live.bus_write8(0x0600_0002, 0x7E);
    live.bus_write16(0x0400_0208, 1);
    live.bus_write16(0x0400_0200, 0x0008);
    let mut state = vec![0u8; live.state_size()];
    assert!(live.save_state(&mut state));

    let mut player = GbaVideoLogPlayer::new();
    assert!(player.load_state(&state));
    // Display memory came back...
    assert_eq!(player.raw_read8(0x0600_0002, -1), 0x7E);
    // ...but the CPU is parked with interrupts cut off.
    assert_eq!(player.read_register("pc"), Some(0x0200_0004));
    assert_eq!(player.bus_read16(0x0400_0208), 0);
    assert_eq!(player.bus_read16(0x0400_0200), 0);
    assert!(!player.load_state(&state[..64]));
}
