//! Game Boy Advance core façade.
//!
//! The crate exposes one capability trait, [`core::Core`], with two
//! implementations: [`gba::GbaCore`], the live machine, and
//! [`vlp::GbaVideoLogPlayer`], which replays a recorded video command log
//! through the same interface.

pub mod audio;
pub mod board;
pub mod cheats;
pub mod config;
pub mod core;
pub mod cpu;
pub mod debugger;
pub mod gba;
pub mod memmap;
pub mod overrides;
pub mod registers;
pub mod renderer;
pub mod savedata;
pub mod serialize;
pub mod sio;
pub mod video;
pub mod vlp;

pub use crate::core::Core;
pub use crate::gba::GbaCore;
pub use crate::vlp::GbaVideoLogPlayer;
