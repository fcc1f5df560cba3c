//! Instruction-level Z80 simulator.
//!
//! Executes whole instructions against a 64K memory image with exact flag
//! results (undocumented bits 5 and 3 included), exact T-state counts, the
//! R register's refresh counter, and a frame-based model of maskable
//! interrupts and HALT.
//!
//! Flag results come from lookup tables computed once per process; opcodes
//! are dispatched through per-simulator tables that bind each opcode to a
//! handler and its operands.
//!
//! ```
//! use z80_sim::{Memory, Simulator, StopReason};
//!
//! let mut memory = Memory::new();
//! // LD A,$2A : INC A
//! memory.load(0x8000, &[0x3E, 0x2A, 0x3C]);
//! let mut sim = Simulator::from_memory(memory);
//! assert_eq!(sim.run(Some(0x8000), Some(0x8003)), StopReason::Address);
//! assert_eq!(sim.register("A").unwrap(), 0x2B);
//! assert_eq!(sim.tstates(), 11);
//! ```

mod alu;
mod config;
mod cpu;
mod dispatch;
mod error;
mod flags;
mod registers;
mod tables;
mod tracer;

pub use alu::AluResult;
pub use config::{Config, DEFAULT_FRAME_DURATION, DEFAULT_INTERRUPT_WINDOW, InitialState};
pub use cpu::{Simulator, StopReason};
pub use error::SimError;
pub use flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
pub use registers::{Location, RegisterFile};
pub use sim_core::{Bus, Cpu, MEMORY_SIZE, Memory, MemoryError, Observable, ROM_END, Value};
pub use tables::{FlagTables, flag_tables};
pub use tracer::{Flow, Tracer};

/// Register slot indices for [`RegisterFile::get`] and friends.
pub mod slots {
    pub use crate::registers::{
        A, A_ALT, B, B_ALT, C, C_ALT, D, D_ALT, E, E_ALT, F, F_ALT, H, H_ALT, I, IXH, IXL, IYH,
        IYL, L, L_ALT, R, SLOTS, SPH, SPL,
    };
}
