//! Audio unit surface: master volume, per-channel force disables and
//! sample buffer sizing. Mixing itself happens downstream of the façade.

use crate::core::ChannelInfo;
use crate::memmap::GBA_ARM7TDMI_FREQUENCY;

/// Default output buffer, in stereo sample pairs.
pub const DEFAULT_BUFFER_SAMPLES: usize = 2048;
/// Cycles between output samples; yields a 32768Hz stream.
pub const DEFAULT_SAMPLE_INTERVAL: u32 = 512;

static AUDIO_CHANNELS: [ChannelInfo; 6] = [
    ChannelInfo {
        id: 0,
        internal_name: "ch1",
        visible_name: "PSG Channel 1",
        extra: Some("Square/Sweep"),
    },
    ChannelInfo {
        id: 1,
        internal_name: "ch2",
        visible_name: "PSG Channel 2",
        extra: Some("Square"),
    },
    ChannelInfo {
        id: 2,
        internal_name: "ch3",
        visible_name: "PSG Channel 3",
        extra: Some("PCM"),
    },
    ChannelInfo {
        id: 3,
        internal_name: "ch4",
        visible_name: "PSG Channel 4",
        extra: Some("Noise"),
    },
    ChannelInfo {
        id: 4,
        internal_name: "chA",
        visible_name: "FIFO Channel A",
        extra: None,
    },
    ChannelInfo {
        id: 5,
        internal_name: "chB",
        visible_name: "FIFO Channel B",
        extra: None,
    },
];

pub fn channels() -> &'static [ChannelInfo] {
    &AUDIO_CHANNELS
}

pub struct Audio {
    pub master_volume: i32,
    pub mute: bool,
    force_disable: [bool; 6],
    buffer_samples: usize,
    sample_interval: u32,
}

impl Default for Audio {
    fn default() -> Self {
        Self {
            master_volume: 0x100,
            mute: false,
            force_disable: [false; 6],
            buffer_samples: DEFAULT_BUFFER_SAMPLES,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

impl Audio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        // Volume, mute and channel toggles survive reset.
    }

    pub fn sample_rate(&self) -> u32 {
        GBA_ARM7TDMI_FREQUENCY as u32 / self.sample_interval
    }

    pub fn buffer_samples(&self) -> usize {
        self.buffer_samples
    }

    pub fn resize_buffer(&mut self, samples: usize) {
        if samples > 0 {
            self.buffer_samples = samples;
        }
    }

    pub fn set_channel_enabled(&mut self, id: usize, enable: bool) {
        if let Some(slot) = self.force_disable.get_mut(id) {
            *slot = !enable;
        }
    }

    pub fn channel_enabled(&self, id: usize) -> bool {
        self.force_disable.get(id).is_none_or(|d| !d)
    }
}
