/// A bus that supports memory read/write operations.
///
/// The address space is the 16-bit space seen by an 8-bit CPU. Reads take
/// `&mut self` because some memory-mapped devices change internal state
/// when read (a video chip's data port, for example).
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}
