//! Hooks for observing execution and servicing I/O ports.

use crate::Simulator;

/// What the run loop should do after a trace callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Optional capabilities a host can attach to a [`Simulator`].
///
/// Every method has a neutral default, so implementors override only what
/// they need. Callbacks run synchronously inside [`Simulator::run`]; they may
/// inspect or modify the simulator but must not call `run` on it.
pub trait Tracer {
    /// Called after each instruction (and any interrupt it let in) with the
    /// address the instruction was fetched from.
    fn trace(&mut self, _sim: &mut Simulator, _pc: u16) -> Flow {
        Flow::Continue
    }

    /// Value returned by IN instructions. The default is a floating bus.
    fn read_port(&mut self, _port: u16) -> u8 {
        0xFF
    }

    /// Called by OUT instructions.
    fn write_port(&mut self, _port: u16, _value: u8) {}
}
