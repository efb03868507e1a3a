use crate::Bus;

/// A CPU that can execute instructions.
///
/// The type parameter `B` is the bus type this CPU operates on.
pub trait Cpu<B: Bus> {
    /// Error surfaced when the CPU hits an instruction form it cannot
    /// execute (illegal prefix sequence, unsupported interrupt mode).
    /// The host is expected to log it and exit.
    type Error: std::error::Error;

    /// Execute one instruction. Returns T-states consumed.
    fn step(&mut self, bus: &mut B) -> Result<u32, Self::Error>;

    /// Reset the CPU to its power-on state.
    fn reset(&mut self);

    /// Assert the maskable interrupt line.
    fn interrupt(&mut self);

    /// Get the current program counter.
    fn pc(&self) -> u16;
}
