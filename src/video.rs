//! Video unit: the scanline clock, renderer association, and the playback
//! hook that lets a recorded command log drive the renderer instead of
//! live drawing.

use crate::memmap::{GBA_VIDEO_VERTICAL_PIXELS, GBA_VIDEO_VERTICAL_TOTAL, VIDEO_HORIZONTAL_LENGTH};
use crate::renderer::{DummyRenderer, VideoRenderer};
use crate::vlp::VlpPlayback;

/// What a single scanline tick crossed.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScanlineOutcome {
    pub entered_vblank: bool,
    pub started_frame: bool,
    pub early_exit: bool,
}

pub struct Video {
    pub vcount: u16,
    pub frame_counter: u32,
    /// Absolute time of the next scanline event. Only meaningful while
    /// `active`; an inactive clock schedules nothing.
    pub next_event: u64,
    pub active: bool,
    renderer: Box<dyn VideoRenderer>,
    playback: Option<VlpPlayback>,
}

impl Default for Video {
    fn default() -> Self {
        Self {
            vcount: 0,
            frame_counter: 0,
            next_event: 0,
            active: false,
            renderer: Box::new(DummyRenderer),
            playback: None,
        }
    }
}

impl Video {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.vcount = 0;
        self.frame_counter = 0;
        self.renderer.reset();
    }

    /// Start the scanline clock relative to `now`.
    pub fn schedule(&mut self, now: u64) {
        self.next_event = now + VIDEO_HORIZONTAL_LENGTH as u64;
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn renderer(&self) -> &dyn VideoRenderer {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> &mut dyn VideoRenderer {
        self.renderer.as_mut()
    }

    pub fn install_renderer(&mut self, renderer: Box<dyn VideoRenderer>) {
        self.renderer = renderer;
    }

    pub fn take_renderer(&mut self) -> Box<dyn VideoRenderer> {
        std::mem::replace(&mut self.renderer, Box::new(DummyRenderer))
    }

    pub fn set_playback(&mut self, playback: Option<VlpPlayback>) {
        self.playback = playback;
    }

    pub fn playback_mut(&mut self) -> Option<&mut VlpPlayback> {
        self.playback.as_mut()
    }

    pub fn has_playback(&self) -> bool {
        self.playback.is_some()
    }

    /// Advance one scanline. Live drawing happens on visible lines; frame
    /// boundaries run the playback hook before the frame counter moves, so
    /// an exhausted log rewinds without claiming a frame.
    pub fn run_scanline(&mut self, backdrop: u16) -> ScanlineOutcome {
        let mut outcome = ScanlineOutcome::default();
        if self.playback.is_none() && self.vcount < GBA_VIDEO_VERTICAL_PIXELS as u16 {
            self.renderer.set_backdrop(backdrop);
            self.renderer.draw_scanline(self.vcount);
        }
        self.vcount += 1;
        if self.vcount == GBA_VIDEO_VERTICAL_PIXELS as u16 {
            outcome.entered_vblank = true;
            if self.playback.is_none() {
                self.renderer.finish_frame();
            }
        }
        if self.vcount == GBA_VIDEO_VERTICAL_TOTAL as u16 {
            self.vcount = 0;
            outcome.started_frame = true;
            if let Some(playback) = self.playback.as_mut() {
                if playback.replay_frame(self.renderer.as_mut()) {
                    self.frame_counter += 1;
                } else {
                    // End of log: rewound, and this boundary claims no
                    // frame.
                    outcome.early_exit = true;
                    outcome.started_frame = false;
                }
            } else {
                self.frame_counter += 1;
            }
        }
        self.next_event += VIDEO_HORIZONTAL_LENGTH as u64;
        outcome
    }
}
