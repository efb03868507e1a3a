//! Sega Master System machine emulation.
//!
//! Ties the Z80 core to the SMS memory map (BIOS / RAM / banked
//! cartridge ROM), the Sega mapper, the VDP and the I/O port decode.
//! The host drives it one instruction at a time or one frame at a time.

mod bus;
mod cartridge;
mod sms;
mod vdp;

pub use bus::SmsBus;
pub use cartridge::Cartridge;
pub use sms::{Sms, SmsConfig, SmsError};
pub use vdp::{Vdp, VdpError, SCREEN_HEIGHT, SCREEN_WIDTH};
