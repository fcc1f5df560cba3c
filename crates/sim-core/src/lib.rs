//! Core traits and types for instruction-level simulation.
//!
//! A simulator owns its memory image and register state outright. Hosts
//! build the image, hand it over, and read everything back through these
//! traits once a run returns.

mod bus;
mod cpu;
mod memory;
mod observable;

pub use bus::Bus;
pub use cpu::Cpu;
pub use memory::{MEMORY_SIZE, Memory, MemoryError, ROM_END};
pub use observable::{Observable, Value};
