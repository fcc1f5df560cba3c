//! Tracer callbacks and I/O ports.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{ORG, reg, sim};
use z80_sim::{Flow, Simulator, StopReason, Tracer};

/// Records every callback and serves a fixed value on every input port.
#[derive(Default)]
struct Log {
    traced: Vec<u16>,
    reads: Vec<u16>,
    writes: Vec<(u16, u8)>,
}

struct Recorder {
    log: Rc<RefCell<Log>>,
    input: u8,
    stop_at: Option<u16>,
}

impl Recorder {
    fn new(input: u8) -> (Self, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let recorder = Self { log: Rc::clone(&log), input, stop_at: None };
        (recorder, log)
    }
}

impl Tracer for Recorder {
    fn trace(&mut self, _sim: &mut Simulator, pc: u16) -> Flow {
        self.log.borrow_mut().traced.push(pc);
        if self.stop_at == Some(pc) { Flow::Stop } else { Flow::Continue }
    }

    fn read_port(&mut self, port: u16) -> u8 {
        self.log.borrow_mut().reads.push(port);
        self.input
    }

    fn write_port(&mut self, port: u16, value: u8) {
        self.log.borrow_mut().writes.push((port, value));
    }
}

#[test]
fn trace_sees_each_instruction_address() {
    // NOP : LD A,1 : INC A
    let mut sim = sim(&[0x00, 0x3E, 0x01, 0x3C], &[]);
    let (recorder, log) = Recorder::new(0);
    assert!(sim.set_tracer(Box::new(recorder)).is_none());
    assert_eq!(sim.run(None, Some(ORG + 4)), StopReason::Address);
    assert_eq!(log.borrow().traced, [ORG, ORG + 1, ORG + 3]);
}

#[test]
fn tracer_can_stop_the_run() {
    let mut sim = sim(&[0x00; 16], &[]);
    let (mut recorder, log) = Recorder::new(0);
    recorder.stop_at = Some(ORG + 2);
    sim.set_tracer(Box::new(recorder));
    assert_eq!(sim.run(None, Some(ORG + 10)), StopReason::Tracer);
    assert_eq!(reg(&sim, "PC"), u64::from(ORG) + 3);
    assert_eq!(log.borrow().traced.len(), 3);
}

#[test]
fn tracer_may_modify_the_simulator() {
    struct Poke;
    impl Tracer for Poke {
        fn trace(&mut self, sim: &mut Simulator, _pc: u16) -> Flow {
            sim.set_register("B", 0x42).unwrap();
            Flow::Continue
        }
    }
    let mut sim = sim(&[0x00], &[]);
    sim.set_tracer(Box::new(Poke));
    sim.run(None, None);
    assert_eq!(reg(&sim, "B"), 0x42);
    assert!(sim.take_tracer().is_some());
    assert!(sim.take_tracer().is_none());
}

#[test]
fn default_methods_float_the_bus() {
    struct Quiet;
    impl Tracer for Quiet {}
    // IN A,(C) : OUT (C),A
    let mut sim = sim(&[0xED, 0x78, 0xED, 0x79], &[("BC", 0x1234)]);
    sim.set_tracer(Box::new(Quiet));
    sim.run(None, Some(ORG + 4));
    assert_eq!(reg(&sim, "A"), 0xFF);
}

#[test]
fn in_and_out_use_full_port_address() {
    // IN A,(C) : OUT ($FE),A : OUT (C),0
    let mut sim = sim(&[0xED, 0x78, 0xD3, 0xFE, 0xED, 0x71], &[("BC", 0x12FE)]);
    let (recorder, log) = Recorder::new(0x07);
    sim.set_tracer(Box::new(recorder));
    sim.run(None, Some(ORG + 6));
    assert_eq!(reg(&sim, "A"), 0x07);
    // 0x07 has odd parity and bits 5 and 3 clear
    assert_eq!(reg(&sim, "F"), 0x00);
    let log = log.borrow();
    assert_eq!(log.reads, [0x12FE]);
    assert_eq!(log.writes, [(0x07FE, 0x07), (0x12FE, 0x00)]);
}

#[test]
fn outi_decrements_b_before_output() {
    let mut sim = sim(&[0xED, 0xA3], &[("HL", 0x9001), ("BC", 0x0210)]);
    sim.memory_mut().poke(0x9001, 0x80);
    let (recorder, log) = Recorder::new(0);
    sim.set_tracer(Box::new(recorder));
    sim.run(None, None);
    assert_eq!(log.borrow().writes, [(0x0110, 0x80)]);
    assert_eq!(reg(&sim, "HL"), 0x9002);
    assert_eq!(reg(&sim, "B"), 1);
    // N from bit 7 of the byte; P from ((byte + L) & 7) ^ B
    assert_eq!(reg(&sim, "F"), 0x06);
    assert_eq!(sim.tstates(), 16);
}

#[test]
fn inir_fills_memory_from_port() {
    let mut sim = sim(&[0xED, 0xB2], &[("HL", 0x9000), ("BC", 0x0310)]);
    let (recorder, log) = Recorder::new(0x01);
    sim.set_tracer(Box::new(recorder));
    sim.run(None, Some(ORG + 2));
    assert_eq!(sim.memory().slice(0x9000, 4), [0x01, 0x01, 0x01, 0x00]);
    assert_eq!(reg(&sim, "B"), 0);
    assert_eq!(reg(&sim, "HL"), 0x9003);
    assert_eq!(reg(&sim, "F"), 0x40);
    assert_eq!(sim.tstates(), 21 + 21 + 16);
    assert_eq!(log.borrow().reads, [0x0310, 0x0210, 0x0110]);
}
