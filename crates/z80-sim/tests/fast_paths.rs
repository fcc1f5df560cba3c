//! The fast DJNZ and LDIR/LDDR handlers must leave exactly the state the
//! ordinary handlers leave.

mod common;

use common::{ORG, reg, sim_with};
use z80_sim::{Config, InitialState, Memory, Simulator};

fn configs() -> (Config, Config) {
    let slow = Config::default();
    let fast = Config { fast_djnz: true, fast_ldir: true, ..Config::default() };
    (slow, fast)
}

/// Run the same program under both configurations and compare everything.
fn assert_equivalent(
    code: &[u8],
    registers: &[(&str, u64)],
    state: InitialState,
    setup: impl Fn(&mut Simulator),
    stop: u16,
) -> Simulator {
    let (slow, fast) = configs();
    let mut a = sim_with(code, registers, state, slow);
    let mut b = sim_with(code, registers, state, fast);
    setup(&mut a);
    setup(&mut b);
    a.run(None, Some(stop));
    b.run(None, Some(stop));
    assert_eq!(a.regs(), b.regs());
    assert_eq!(a.iff(), b.iff());
    assert!(a.memory() == b.memory(), "memory differs");
    b
}

#[test]
fn djnz_loop_100() {
    let sim = assert_equivalent(&[0x10, 0xFE], &[("B", 100)], InitialState::default(), |_| {}, ORG + 2);
    assert_eq!(reg(&sim, "B"), 0);
    assert_eq!(sim.tstates(), 99 * 13 + 8);
    assert_eq!(reg(&sim, "R"), 100);
}

#[test]
fn djnz_with_b_zero_loops_256_times() {
    let sim = assert_equivalent(&[0x10, 0xFE], &[], InitialState::default(), |_| {}, ORG + 2);
    assert_eq!(sim.tstates(), 255 * 13 + 8);
    assert_eq!(reg(&sim, "R"), 0);
}

#[test]
fn djnz_elsewhere_is_not_collapsed() {
    // NOP : DJNZ -3
    let sim = assert_equivalent(&[0x00, 0x10, 0xFD], &[("B", 5)], InitialState::default(), |_| {}, ORG + 3);
    assert_eq!(sim.tstates(), 5 * 4 + 4 * 13 + 8);
}

fn fill_source(sim: &mut Simulator) {
    let bytes: Vec<u8> = (0..=255).collect();
    sim.memory_mut().load(0x9000, &bytes);
}

#[test]
fn ldir_200_bytes() {
    let sim = assert_equivalent(
        &[0xED, 0xB0],
        &[("HL", 0x9000), ("DE", 0xA000), ("BC", 200), ("A", 0x10)],
        InitialState::default(),
        fill_source,
        ORG + 2,
    );
    assert_eq!(sim.memory().slice(0xA000, 200), sim.memory().slice(0x9000, 200));
    assert_eq!(reg(&sim, "BC"), 0);
    assert_eq!(reg(&sim, "HL"), 0x9000 + 200);
    assert_eq!(reg(&sim, "DE"), 0xA000 + 200);
    assert_eq!(sim.tstates(), 199 * 21 + 16);
    assert_eq!(reg(&sim, "R"), 400 % 128);
}

#[test]
fn lddr_50_bytes() {
    let sim = assert_equivalent(
        &[0xED, 0xB8],
        &[("HL", 0x90FF), ("DE", 0xA0FF), ("BC", 50)],
        InitialState::default(),
        fill_source,
        ORG + 2,
    );
    assert_eq!(reg(&sim, "HL"), 0x90FF - 50);
    assert_eq!(sim.memory().peek(0xA0FF), 0xFF);
    assert_eq!(sim.memory().peek(0xA0CE), 0xCE);
}

#[test]
fn ldir_with_bc_zero() {
    // Run from ROM so the copy cannot overwrite the instruction.
    let (slow, fast) = configs();
    let run = |config: Config| {
        let mut memory = Memory::new();
        memory.load(0x0100, &[0xED, 0xB0]);
        let mut sim = Simulator::new(
            memory,
            [("PC", 0x0100), ("HL", 0x9000), ("DE", 0xA000)],
            InitialState::default(),
            config,
        )
        .unwrap();
        sim.run(None, Some(0x0102));
        sim
    };
    let a = run(slow);
    let b = run(fast);
    assert_eq!(a.regs(), b.regs());
    assert!(a.memory() == b.memory());
    assert_eq!(reg(&b, "BC"), 0);
    assert_eq!(reg(&b, "HL"), 0x9000);
    assert_eq!(b.tstates(), 65535 * 21 + 16);
}

#[test]
fn ldir_overwriting_itself() {
    // The copy runs up into the LDIR at $8000.
    let sim = assert_equivalent(
        &[0xED, 0xB0, 0x00],
        &[("HL", 0x9000), ("DE", 0x7FF0), ("BC", 0x20)],
        InitialState::default(),
        |s| s.memory_mut().load(0x9000, &[0x00; 0x20]),
        ORG + 3,
    );
    // The first byte was replaced before the second was reached.
    assert_eq!(sim.memory().slice(ORG, 2), [0x00, 0xB0]);
}

#[test]
fn ldir_with_interrupts_enabled_falls_back() {
    let sim = assert_equivalent(
        &[0xED, 0xB0],
        &[("HL", 0x9000), ("DE", 0xA000), ("BC", 100)],
        InitialState { iff: true, tstates: 1000, ..InitialState::default() },
        fill_source,
        ORG + 2,
    );
    assert_eq!(sim.tstates(), 1000 + 99 * 21 + 16);
}
