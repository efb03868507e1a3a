use crate::Bus;

/// A bus that also supports separate I/O port operations.
///
/// The Z80 has a separate I/O address space accessed via IN and OUT
/// instructions. Systems that decode only the low 8 address bits (the
/// Master System among them) implement this trait.
pub trait IoBus: Bus {
    /// Read a byte from the given I/O port.
    fn read_io(&mut self, port: u8) -> u8;

    /// Write a byte to the given I/O port.
    fn write_io(&mut self, port: u8, value: u8);
}
