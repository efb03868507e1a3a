//! SMS memory and port decode.
//!
//! Memory map:
//! - 0x0000-0xBFFF: enabled sources ANDed together - BIOS (mirrored
//!   through its 8 KiB) and cartridge ROM via the mapper
//! - 0xC000-0xDFFF: 8 KiB RAM
//! - 0xE000-0xFFFF: RAM mirror; writes to 0xFFFC-0xFFFF also program
//!   the mapper
//!
//! I/O ports:
//! - 0x3E: memory enable control
//! - 0x40-0x7F: PSG (writes, dropped) / V and H counters (reads)
//! - 0xBE/0xBF: VDP data / control
//! - 0xDC/0xDD: joysticks (no input attached, always 0xFF)

use emu_core::{Bus, IoBus};
use log::{error, trace};

use crate::cartridge::Cartridge;
use crate::vdp::Vdp;

// Port 0x3E enable bits; a set bit disables the source.
const MEM_DISABLE_CART: u8 = 1 << 6;
const MEM_DISABLE_BIOS: u8 = 1 << 3;

/// A port access the machine cannot service. Latched by the bus and
/// turned into a hard error by the machine after the instruction that
/// caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BusFault {
    PortIn(u8),
    PortOut(u8),
}

pub struct SmsBus {
    ram: [u8; 0x2000],
    bios: Option<Vec<u8>>,
    cartridge: Cartridge,
    pub(crate) vdp: Vdp,
    memory_control: u8,
    fault: Option<BusFault>,
}

impl SmsBus {
    #[must_use]
    pub fn new(cartridge: Cartridge, bios: Option<Vec<u8>>) -> Self {
        Self {
            ram: [0; 0x2000],
            bios,
            cartridge,
            vdp: Vdp::new(),
            memory_control: 0,
            fault: None,
        }
    }

    fn bios_enabled(&self) -> bool {
        self.bios.is_some() && self.memory_control & MEM_DISABLE_BIOS == 0
    }

    fn cart_enabled(&self) -> bool {
        self.memory_control & MEM_DISABLE_CART == 0
    }

    pub(crate) fn take_fault(&mut self) -> Option<BusFault> {
        self.fault.take()
    }

    #[must_use]
    pub fn vdp(&self) -> &Vdp {
        &self.vdp
    }

    pub fn vdp_mut(&mut self) -> &mut Vdp {
        &mut self.vdp
    }

    #[must_use]
    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }
}

impl Bus for SmsBus {
    fn read(&mut self, address: u16) -> u8 {
        if address < 0xC000 {
            // Enabled sources drive the bus together; disabled or absent
            // ones contribute all ones.
            let mut value = 0xFF;
            if self.bios_enabled() {
                if let Some(bios) = &self.bios {
                    value &= bios
                        .get((address & 0x1FFF) as usize)
                        .copied()
                        .unwrap_or(0xFF);
                }
            }
            if self.cart_enabled() {
                value &= self.cartridge.read(address);
            }
            value
        } else {
            self.ram[(address & 0x1FFF) as usize]
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        if address < 0xC000 {
            // ROM region; no cart RAM is mapped.
            return;
        }
        self.ram[(address & 0x1FFF) as usize] = value;
        if address >= 0xFFFC {
            self.cartridge.control_write(address, value);
        }
    }
}

impl IoBus for SmsBus {
    fn read_io(&mut self, port: u8) -> u8 {
        match port {
            0x40..=0x7F => {
                if port & 1 == 0 {
                    self.vdp.vcounter_byte()
                } else {
                    self.vdp.hcounter_byte()
                }
            }
            0xBE => self.vdp.read_data(),
            0xBF => self.vdp.read_status(),
            // Joystick ports, no input attached.
            0xDC | 0xDD => 0xFF,
            _ => {
                error!("read from unsupported port {port:#04X}");
                self.fault = Some(BusFault::PortIn(port));
                0xFF
            }
        }
    }

    fn write_io(&mut self, port: u8, value: u8) {
        match port {
            0x3E => {
                trace!("memory control = {value:02X}");
                self.memory_control = value;
            }
            0x40..=0x7F => {
                // PSG is out of scope; drop the write.
                trace!("psg write {value:02X} ignored");
            }
            0xBE => self.vdp.write_data(value),
            0xBF => self.vdp.write_control(value),
            _ => {
                error!("write {value:02X} to unsupported port {port:#04X}");
                self.fault = Some(BusFault::PortOut(port));
            }
        }
    }
}
