//! Link-port (SIO) driver attachment.
//!
//! The façade only owns the attachment point; concrete drivers (lockstep
//! link, Joy Bus dongles, GB Player rumble) live with the front-end.

/// A driver plugged into the serial port.
pub trait SioDriver {
    /// Stable identifier recorded into save states so a mismatched driver
    /// never consumes another driver's payload.
    fn driver_id(&self) -> u32;

    fn init(&mut self) -> bool {
        true
    }

    fn reset(&mut self) {}

    /// Serialized driver state for the save-state extra-data bag.
    fn save_state(&self) -> Vec<u8> {
        Vec::new()
    }

    fn load_state(&mut self, _state: &[u8]) -> bool {
        true
    }
}
