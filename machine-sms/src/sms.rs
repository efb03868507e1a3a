//! The machine aggregate: one CPU, one bus, one VDP.

use cpu_z80::{Z80, Z80Error};
use log::info;
use thiserror::Error;

use crate::bus::{BusFault, SmsBus};
use crate::cartridge::Cartridge;
use crate::vdp::VdpError;

/// Configuration for creating an [`Sms`].
pub struct SmsConfig {
    /// Cartridge ROM image. Required.
    pub rom: Vec<u8>,
    /// BIOS image (8 KiB), if one is available. Without it the BIOS
    /// simply never drives the bus.
    pub bios: Option<Vec<u8>>,
}

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("no ROM image provided")]
    NoRom,
    #[error(transparent)]
    Cpu(#[from] Z80Error),
    #[error(transparent)]
    Vdp(#[from] VdpError),
    #[error("read from unsupported port {0:#04X}")]
    UnsupportedPortIn(u8),
    #[error("write to unsupported port {0:#04X}")]
    UnsupportedPortOut(u8),
}

impl From<BusFault> for SmsError {
    fn from(fault: BusFault) -> Self {
        match fault {
            BusFault::PortIn(port) => SmsError::UnsupportedPortIn(port),
            BusFault::PortOut(port) => SmsError::UnsupportedPortOut(port),
        }
    }
}

/// A Sega Master System.
pub struct Sms {
    cpu: Z80,
    bus: SmsBus,
}

impl Sms {
    pub fn new(config: SmsConfig) -> Result<Self, SmsError> {
        if config.rom.is_empty() {
            return Err(SmsError::NoRom);
        }
        info!(
            "sms: {} KiB rom, bios {}",
            config.rom.len() / 1024,
            if config.bios.is_some() {
                "present"
            } else {
                "absent"
            }
        );
        Ok(Self {
            cpu: Z80::new(),
            bus: SmsBus::new(Cartridge::new(config.rom), config.bios),
        })
    }

    /// Run one instruction: CPU first, then the VDP catches up on the
    /// T-states, then the interrupt line is sampled.
    pub fn step(&mut self) -> Result<u32, SmsError> {
        let cycles = self.cpu.step(&mut self.bus)?;
        if let Some(fault) = self.bus.take_fault() {
            return Err(fault.into());
        }
        self.bus.vdp.step(cycles)?;
        if self.bus.vdp.interrupt_pending() {
            self.cpu.interrupt();
        }
        Ok(cycles)
    }

    /// Run until the VDP finishes a frame, then hand out the framebuffer.
    pub fn run_frame(&mut self) -> Result<&[u8], SmsError> {
        loop {
            self.step()?;
            if self.bus.vdp.take_frame_ready() {
                return Ok(self.bus.vdp.framebuffer());
            }
        }
    }

    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        self.bus.vdp.framebuffer()
    }

    #[must_use]
    pub fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &SmsBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut SmsBus {
        &mut self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::{Bus, IoBus};

    /// A ROM that just spins at the reset vector.
    fn spin_rom() -> Vec<u8> {
        let mut rom = vec![0u8; 0x4000];
        rom[0] = 0x18; // JR -2
        rom[1] = 0xFE;
        rom
    }

    /// Program mode 4 through the control port, as boot code would.
    fn set_mode4(sms: &mut Sms) {
        let bus = sms.bus_mut();
        bus.write_io(0xBF, 0x06); // mode control 1: M4 | M2
        bus.write_io(0xBF, 0x80);
        bus.write_io(0xBF, 0x00); // mode control 2
        bus.write_io(0xBF, 0x81);
    }

    #[test]
    fn missing_rom_is_an_error() {
        assert!(matches!(
            Sms::new(SmsConfig {
                rom: Vec::new(),
                bios: None
            }),
            Err(SmsError::NoRom)
        ));
    }

    #[test]
    fn machine_runs_a_frame_once_mode4_is_set() {
        let mut sms = Sms::new(SmsConfig {
            rom: spin_rom(),
            bios: None,
        })
        .unwrap();
        set_mode4(&mut sms);
        let frame = sms.run_frame().unwrap();
        assert_eq!(frame.len(), crate::SCREEN_WIDTH * crate::SCREEN_HEIGHT);
    }

    #[test]
    fn block_copy_through_system_ram() {
        let mut sms = Sms::new(SmsConfig {
            rom: spin_rom(),
            bios: None,
        })
        .unwrap();
        set_mode4(&mut sms);

        for i in 0..16u16 {
            sms.bus_mut().write(0xC000 + i, i as u8);
        }
        let regs = sms.cpu_mut().registers_mut();
        regs.set_hl(0xC000);
        regs.set_de(0xD000);
        regs.set_bc(0x0010);

        // Drop an LDIR in RAM and run it from there.
        sms.bus_mut().write(0xD800, 0xED);
        sms.bus_mut().write(0xD801, 0xB0);
        sms.cpu_mut().set_pc(0xD800);
        while sms.cpu().pc() != 0xD802 {
            sms.step().unwrap();
        }

        for i in 0..16u16 {
            assert_eq!(sms.bus_mut().read(0xD000 + i), i as u8);
        }
        let regs = sms.cpu().registers();
        assert_eq!(regs.bc(), 0);
        assert_eq!(regs.de(), 0xD010);
        assert_eq!(regs.hl(), 0xC010);
        assert_eq!(regs.f & cpu_z80::PF, 0);
        assert_eq!(regs.f & (cpu_z80::NF | cpu_z80::HF), 0);
    }

    #[test]
    fn unsupported_port_surfaces_after_the_instruction() {
        let mut sms = Sms::new(SmsConfig {
            rom: vec![0xD3, 0x12, 0x00, 0x00], // OUT (0x12), A
            bios: None,
        })
        .unwrap();
        assert!(matches!(
            sms.step(),
            Err(SmsError::UnsupportedPortOut(0x12))
        ));
    }

    #[test]
    fn frame_interrupt_reaches_the_cpu() {
        // Mode 4 with frame interrupts enabled, IM 1, handler at 0x38
        // reads the status port and spins.
        let mut rom = vec![0u8; 0x4000];
        let code = [
            0x31, 0xF0, 0xDF, // LD SP, 0xDFF0
            0x3E, 0x06, 0xD3, 0xBF, // mode control 1 = M4 | M2
            0x3E, 0x80, 0xD3, 0xBF,
            0x3E, 0x20, 0xD3, 0xBF, // mode control 2 = frame irq enable
            0x3E, 0x81, 0xD3, 0xBF,
            0xED, 0x56, // IM 1
            0xFB, // EI
            0x18, 0xFE, // JR -2
        ];
        rom[..code.len()].copy_from_slice(&code);
        // Handler: IN A,(0xBF); LD (0xC000), A sentinel; spin
        let handler = [
            0xDB, 0xBF, // IN A, (0xBF) - acknowledge
            0x3E, 0x77, // LD A, 0x77
            0x32, 0x00, 0xC0, // LD (0xC000), A
            0x18, 0xFE, // JR -2
        ];
        rom[0x38..0x38 + handler.len()].copy_from_slice(&handler);

        let mut sms = Sms::new(SmsConfig { rom, bios: None }).unwrap();
        for _ in 0..200_000 {
            sms.step().unwrap();
            if sms.bus_mut().read(0xC000) == 0x77 {
                return;
            }
        }
        panic!("frame interrupt never reached the handler");
    }
}
