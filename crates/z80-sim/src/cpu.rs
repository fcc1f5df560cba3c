//! The simulator: register file, memory image, interrupt state and the run
//! loop that drives the dispatch tables.

mod execute;
mod fast;
mod prefixed;

use std::fmt;

use sim_core::{Bus, Cpu, Memory, Observable, Value};

use crate::config::{Config, InitialState};
use crate::dispatch::{Args, DispatchTables};
use crate::error::SimError;
use crate::flags::{CF, HF, NF, PF, SF, ZF};
use crate::registers::{self, I, R, RegisterFile, SPH};
use crate::tables::flag_tables;
use crate::tracer::{Flow, Tracer};

/// Why [`Simulator::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No stop address was given, so one instruction was executed.
    Step,
    /// PC reached the stop address.
    Address,
    /// The tracer asked to stop.
    Tracer,
}

/// Instruction-level Z80 simulator.
///
/// The simulator owns a flat 64K memory image whose first 16K is ROM.
/// Instructions execute whole: registers, memory and the T-state counter
/// are updated together, then a maskable interrupt is accepted if one is due.
pub struct Simulator {
    pub(crate) regs: RegisterFile,
    pub(crate) memory: Memory,
    /// Interrupt-enable latch.
    pub(crate) iff: bool,
    /// Interrupt mode, 0 to 2.
    pub(crate) im: u8,
    pub(crate) config: Config,
    pub(crate) tables: Box<DispatchTables>,
    tracer: Option<Box<dyn Tracer>>,
    /// Address of the last instruction executed by `run`.
    last_pc: Option<u16>,
}

impl Simulator {
    /// Create a simulator over `memory`, with `registers` applied on top of
    /// the defaults (everything zero, SP 0xFFFF).
    ///
    /// `state` is applied first, so a `"T"` entry in `registers` overrides
    /// `state.tstates`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownRegister`] for a name not in the register
    /// table.
    pub fn new<Iter, K>(
        memory: Memory,
        registers: Iter,
        state: InitialState,
        config: Config,
    ) -> Result<Self, SimError>
    where
        Iter: IntoIterator<Item = (K, u64)>,
        K: AsRef<str>,
    {
        let mut sim = Self::with_config(memory, config);
        sim.set_im(state.im);
        sim.iff = state.iff;
        sim.regs.t = state.tstates;
        for (name, value) in registers {
            sim.set_register(name.as_ref(), value)?;
        }
        log::debug!(
            "simulator created: pc={:04X} im={} iff={} t={} fast_djnz={} fast_ldir={}",
            sim.regs.pc,
            sim.im,
            sim.iff,
            sim.regs.t,
            config.fast_djnz,
            config.fast_ldir
        );
        Ok(sim)
    }

    /// Create a simulator with default registers, interrupt state and
    /// configuration.
    #[must_use]
    pub fn from_memory(memory: Memory) -> Self {
        Self::with_config(memory, Config::default())
    }

    /// Create a simulator with default registers and interrupt state.
    #[must_use]
    pub fn with_config(memory: Memory, config: Config) -> Self {
        if config.frame_duration == 0 {
            log::warn!("frame duration of 0 T-states; using 1");
        }
        let config = Config {
            frame_duration: config.frame_duration.max(1),
            ..config
        };
        Self {
            regs: RegisterFile::new(),
            memory,
            iff: false,
            im: 1,
            config,
            tables: DispatchTables::new(flag_tables(), &config),
            tracer: None,
            last_pc: None,
        }
    }

    /// Execute instructions.
    ///
    /// With `start`, PC is set first. With no `stop`, exactly one
    /// instruction runs. Otherwise instructions run until PC equals `stop`
    /// after an instruction, or the tracer returns [`Flow::Stop`]. At least
    /// one instruction always runs.
    ///
    /// After each instruction the order is: interrupt check, trace
    /// callback, stop-address check.
    pub fn run(&mut self, start: Option<u16>, stop: Option<u16>) -> StopReason {
        if let Some(pc) = start {
            self.regs.pc = pc;
        }
        loop {
            let pc = self.regs.pc;
            self.execute();
            self.last_pc = Some(pc);

            if self.interrupt_due() {
                self.accept_interrupt();
            }

            if let Some(mut tracer) = self.tracer.take() {
                let flow = tracer.trace(self, pc);
                // The callback may have installed a replacement.
                if self.tracer.is_none() {
                    self.tracer = Some(tracer);
                }
                if flow == Flow::Stop {
                    return StopReason::Tracer;
                }
            }

            match stop {
                None => return StopReason::Step,
                Some(addr) if self.regs.pc == addr => return StopReason::Address,
                Some(_) => {}
            }
        }
    }

    /// Execute the instruction at PC.
    fn execute(&mut self) {
        let opcode = self.memory.read(self.regs.pc);
        let entry = self.tables.main[usize::from(opcode)];
        (entry.handler)(self, entry.args);
    }

    fn interrupt_due(&self) -> bool {
        self.iff && self.regs.t % self.config.frame() < u64::from(self.config.interrupt_window)
    }

    /// Accept a maskable interrupt if the latch allows it. Returns true if
    /// it was accepted.
    ///
    /// An interrupt is not accepted straight after EI, nor between a DD/FD
    /// prefix and the instruction it modifies. On acceptance PC is pushed,
    /// the latch is cleared, R is bumped and PC moves to 0x0038 (IM 0 and
    /// IM 1, 13 T-states) or to the word at `I*256+255` (IM 2, 19 T-states).
    ///
    /// If the CPU is sitting on a HALT, the address after it is pushed so
    /// the handler returns past the HALT.
    pub fn accept_interrupt(&mut self) -> bool {
        if !self.iff {
            return false;
        }
        let mut pc = self.regs.pc;
        if let Some(prev) = self.last_pc {
            let opcode = self.memory.read(prev);
            if opcode == 0xFB {
                return false;
            }
            if matches!(opcode, 0xDD | 0xFD) && prev == pc.wrapping_sub(1) {
                return false;
            }
            if opcode == 0x76 && prev == pc {
                pc = pc.wrapping_add(1);
            }
        }

        self.iff = false;
        self.bump_r(1);
        self.push_word(pc);
        let (vector, t) = if self.im == 2 {
            let addr = u16::from(self.regs.get(I)) << 8 | 0xFF;
            (self.memory.read_word(addr), 19)
        } else {
            (0x0038, 13)
        };
        log::trace!("interrupt accepted: im={} pc={pc:04X} -> {vector:04X}", self.im);
        self.regs.pc = vector;
        self.regs.t += t;
        true
    }

    /// Attach a tracer, returning the previous one.
    pub fn set_tracer(&mut self, tracer: Box<dyn Tracer>) -> Option<Box<dyn Tracer>> {
        log::debug!("tracer attached");
        self.tracer.replace(tracer)
    }

    /// Detach the tracer.
    pub fn take_tracer(&mut self) -> Option<Box<dyn Tracer>> {
        self.tracer.take()
    }

    /// Read a register by name (`"A"`, `"HL"`, `"^BC"`, `"PC"`, `"T"`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownRegister`] for an unknown name.
    pub fn register(&self, name: &str) -> Result<u64, SimError> {
        Ok(self.regs.read(registers::locate(name)?))
    }

    /// Write a register by name. Bytes take the value mod 256, pairs and PC
    /// mod 65536.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownRegister`] for an unknown name.
    pub fn set_register(&mut self, name: &str, value: u64) -> Result<(), SimError> {
        self.regs.write(registers::locate(name)?, value);
        Ok(())
    }

    /// Every register as `(name, value)`, in canonical order.
    pub fn register_values(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        registers::names().filter_map(|name| {
            registers::locate(name)
                .ok()
                .map(|loc| (name, self.regs.read(loc)))
        })
    }

    #[must_use]
    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    #[must_use]
    pub fn into_memory(self) -> Memory {
        self.memory
    }

    #[must_use]
    pub fn iff(&self) -> bool {
        self.iff
    }

    pub fn set_iff(&mut self, iff: bool) {
        self.iff = iff;
    }

    #[must_use]
    pub fn im(&self) -> u8 {
        self.im
    }

    /// Set the interrupt mode. Values above 2 are clamped.
    pub fn set_im(&mut self, im: u8) {
        if im > 2 {
            log::warn!("interrupt mode {im} out of range; using 2");
        }
        self.im = im.min(2);
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn tstates(&self) -> u64 {
        self.regs.t
    }

    // === Helpers shared by the handlers ===

    /// Add `n` to the low seven bits of R, keeping bit 7.
    #[inline]
    pub(crate) fn bump_r(&mut self, n: u8) {
        let r = self.regs.get(R);
        self.regs.set(R, (r & 0x80) | (r.wrapping_add(n) & 0x7F));
    }

    /// Complete an instruction: set PC, add T-states and bump R.
    #[inline]
    pub(crate) fn finish(&mut self, a: Args, pc: u16, t: u8) {
        self.regs.pc = pc;
        self.regs.t += u64::from(t);
        self.bump_r(a.r_inc);
    }

    /// Complete an instruction that falls through to the next one.
    #[inline]
    pub(crate) fn advance(&mut self, a: Args) {
        let pc = self.next_pc(a);
        self.finish(a, pc, a.t);
    }

    #[inline]
    pub(crate) fn next_pc(&self, a: Args) -> u16 {
        self.regs.pc.wrapping_add(u16::from(a.size))
    }

    /// Immediate byte: the last byte of the instruction.
    #[inline]
    pub(crate) fn imm8(&self, a: Args) -> u8 {
        self.memory
            .read(self.regs.pc.wrapping_add(u16::from(a.size)).wrapping_sub(1))
    }

    /// Immediate word: the last two bytes of the instruction.
    #[inline]
    pub(crate) fn imm16(&self, a: Args) -> u16 {
        self.memory
            .read_word(self.regs.pc.wrapping_add(u16::from(a.size)).wrapping_sub(2))
    }

    /// Address of the memory operand: (HL), or (IX+d)/(IY+d) with d at PC+2.
    #[inline]
    pub(crate) fn mem_addr(&self, a: Args) -> u16 {
        let base = self.regs.pair(a.hl);
        if a.indexed {
            let d = self.memory.read(self.regs.pc.wrapping_add(2)) as i8;
            base.wrapping_add_signed(i16::from(d))
        } else {
            base
        }
    }

    /// Relative jump target for an instruction whose displacement is its
    /// last byte.
    #[inline]
    pub(crate) fn relative(&self, a: Args) -> u16 {
        let e = self.imm8(a) as i8;
        self.next_pc(a).wrapping_add_signed(i16::from(e))
    }

    #[inline]
    pub(crate) fn condition(&self, a: Args) -> bool {
        self.regs.f() & a.n == a.m
    }

    #[inline]
    pub(crate) fn carry(&self) -> bool {
        self.regs.f() & CF != 0
    }

    pub(crate) fn push_word(&mut self, value: u16) {
        let sp = self.regs.sp().wrapping_sub(2);
        self.regs.set_pair(SPH, sp);
        self.memory.write_word(sp, value);
    }

    pub(crate) fn pop_word(&mut self) -> u16 {
        let sp = self.regs.sp();
        self.regs.set_pair(SPH, sp.wrapping_add(2));
        self.memory.read_word(sp)
    }

    /// Value on an input port. With no tracer the bus floats high.
    pub(crate) fn port_in(&mut self, port: u16) -> u8 {
        self.tracer
            .as_mut()
            .map_or(0xFF, |tracer| tracer.read_port(port))
    }

    pub(crate) fn port_out(&mut self, port: u16, value: u8) {
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.write_port(port, value);
        }
    }
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("regs", &self.regs)
            .field("iff", &self.iff)
            .field("im", &self.im)
            .field("config", &self.config)
            .field("tracer", &self.tracer.is_some())
            .finish_non_exhaustive()
    }
}

impl Cpu for Simulator {
    type Registers = RegisterFile;

    fn step(&mut self) -> u32 {
        let start = self.regs.t;
        self.run(None, None);
        self.regs.t.wrapping_sub(start) as u32
    }

    fn pc(&self) -> u32 {
        u32::from(self.regs.pc)
    }

    fn registers(&self) -> RegisterFile {
        self.regs.clone()
    }

    fn is_halted(&self) -> bool {
        self.last_pc == Some(self.regs.pc) && self.memory.read(self.regs.pc) == 0x76
    }

    fn interrupt(&mut self) -> bool {
        self.accept_interrupt()
    }
}

/// Query paths: every register name in lower case, plus interrupt state
/// and individual flags.
const QUERY_PATHS: &[&str] = &[
    "a", "f", "b", "c", "d", "e", "h", "l", "ixh", "ixl", "iyh", "iyl", "i", "r",
    "a'", "f'", "b'", "c'", "d'", "e'", "h'", "l'",
    "af", "bc", "de", "hl", "ix", "iy", "sp", "af'", "bc'", "de'", "hl'",
    "pc", "t", "iff", "im", "halted",
    "flags.s", "flags.z", "flags.h", "flags.p", "flags.n", "flags.c",
];

impl Observable for Simulator {
    fn query(&self, path: &str) -> Option<Value> {
        let flag = |mask: u8| Some(Value::Bool(self.regs.f() & mask != 0));
        match path {
            "iff" => Some(self.iff.into()),
            "im" => Some(self.im.into()),
            "halted" => Some(self.is_halted().into()),
            "flags.s" => flag(SF),
            "flags.z" => flag(ZF),
            "flags.h" => flag(HF),
            "flags.p" => flag(PF),
            "flags.n" => flag(NF),
            "flags.c" => flag(CF),
            _ => {
                let loc = registers::locate(path).ok()?;
                let value = self.regs.read(loc);
                Some(match loc {
                    registers::Location::Byte(_) => Value::U8(value as u8),
                    registers::Location::Pair(_) | registers::Location::Pc => {
                        Value::U16(value as u16)
                    }
                    registers::Location::Tstates => Value::U64(value),
                })
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(code: &[u8]) -> Simulator {
        let mut memory = Memory::new();
        memory.load(0x8000, code);
        let mut sim = Simulator::from_memory(memory);
        sim.regs.pc = 0x8000;
        sim
    }

    #[test]
    fn bump_r_keeps_bit_7() {
        let mut s = sim(&[]);
        s.regs.set(R, 0xFF);
        s.bump_r(1);
        assert_eq!(s.regs.get(R), 0x80);
        s.regs.set(R, 0x7E);
        s.bump_r(2);
        assert_eq!(s.regs.get(R), 0x00);
    }

    #[test]
    fn indexed_address_uses_signed_displacement() {
        let mut s = sim(&[0xDD, 0x7E, 0xFE]);
        s.regs.set_pair(crate::registers::IXH, 0x9000);
        let entry = s.tables.dd[0x7E];
        assert_eq!(s.mem_addr(entry.args), 0x8FFE);
    }

    #[test]
    fn im_is_clamped() {
        let mut s = sim(&[]);
        s.set_im(7);
        assert_eq!(s.im(), 2);
    }

    #[test]
    fn query_covers_registers_and_flags() {
        let mut s = sim(&[]);
        s.regs.set_pair(crate::registers::H, 0x1234);
        s.regs.set(crate::registers::F, CF | ZF);
        assert_eq!(s.query("hl"), Some(Value::U16(0x1234)));
        assert_eq!(s.query("h"), Some(Value::U8(0x12)));
        assert_eq!(s.query("flags.c"), Some(Value::Bool(true)));
        assert_eq!(s.query("flags.s"), Some(Value::Bool(false)));
        assert_eq!(s.query("pc"), Some(Value::U16(0x8000)));
        assert_eq!(s.query("nonsense"), None);
        for path in s.query_paths() {
            assert!(s.query(path).is_some(), "{path}");
        }
    }

    #[test]
    fn port_reads_float_without_tracer() {
        let mut s = sim(&[]);
        assert_eq!(s.port_in(0xFE), 0xFF);
    }
}
