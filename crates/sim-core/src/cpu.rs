//! CPU core trait.

/// A CPU core that owns its memory and executes whole instructions.
///
/// CPUs expose their internal state for observation and debugging.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Execute one instruction. Returns the T-states it consumed.
    fn step(&mut self) -> u32;

    /// Returns the current program counter.
    ///
    /// Returns `u32` so that wider address buses fit too; 16-bit CPUs
    /// zero-extend.
    fn pc(&self) -> u32;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is sitting on a HALT instruction.
    fn is_halted(&self) -> bool;

    /// Request a maskable interrupt. Returns true if accepted.
    fn interrupt(&mut self) -> bool;
}
