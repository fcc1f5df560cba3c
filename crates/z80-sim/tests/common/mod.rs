//! Helpers shared by the integration tests.

#![allow(dead_code)]

use z80_sim::{Config, InitialState, Memory, Simulator};

/// Where test programs are assembled. Above the ROM, well clear of the stack.
pub const ORG: u16 = 0x8000;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A memory image with `code` at [`ORG`].
pub fn image(code: &[u8]) -> Memory {
    let mut memory = Memory::new();
    memory.load(ORG, code);
    memory
}

/// A simulator with `code` at [`ORG`], PC pointing at it, and `registers`
/// applied on top of the defaults.
pub fn sim(code: &[u8], registers: &[(&str, u64)]) -> Simulator {
    sim_with(code, registers, InitialState::default(), Config::default())
}

pub fn sim_with(
    code: &[u8],
    registers: &[(&str, u64)],
    state: InitialState,
    config: Config,
) -> Simulator {
    init_logging();
    let mut regs = vec![("PC", u64::from(ORG))];
    regs.extend_from_slice(registers);
    Simulator::new(image(code), regs, state, config).expect("valid register names")
}

pub fn reg(sim: &Simulator, name: &str) -> u64 {
    sim.register(name).expect("valid register name")
}

/// Run from the current PC until PC reaches `stop`.
pub fn run_to(sim: &mut Simulator, stop: u16) {
    sim.run(None, Some(stop));
}
