//! CB, ED, DDCB and FDCB instructions.

use sim_core::Bus;

use super::Simulator;
use crate::dispatch::Args;
use crate::flags::{self, CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::registers::{A, B, C, D, F, H, L, R};
use crate::tables::{flag_tables, unary_index};

/// Pointer step for a block instruction: +1 or -1.
fn step(a: Args) -> u16 {
    i16::from(a.n as i8) as u16
}

/// Flags shared by INI/IND/OUTI/OUTD and their repeating forms.
fn io_block_flags(value: u8, b: u8, k: u16) -> u8 {
    let mut f = flags::sz53(b);
    if value & 0x80 != 0 {
        f |= NF;
    }
    if k > 0xFF {
        f |= HF | CF;
    }
    if flags::parity((k as u8 & 0x07) ^ b) {
        f |= PF;
    }
    f
}

impl Simulator {
    // === Rotates, shifts and bit operations ===

    pub(crate) fn rot_r(&mut self, a: Args) {
        let carry = a.carry && self.carry();
        let result = a.table[unary_index(self.regs.get(a.r1), carry)];
        self.regs.set(a.r1, result.value);
        self.regs.set(F, result.flags);
        self.advance(a);
    }

    /// Rotate/shift (HL), (IX+d) or (IY+d). Returns the result.
    fn rot_mem_value(&mut self, a: Args) -> u8 {
        let addr = self.mem_addr(a);
        let carry = a.carry && self.carry();
        let result = a.table[unary_index(self.memory.read(addr), carry)];
        self.memory.write(addr, result.value);
        self.regs.set(F, result.flags);
        result.value
    }

    pub(crate) fn rot_mem(&mut self, a: Args) {
        self.rot_mem_value(a);
        self.advance(a);
    }

    /// Undocumented DDCB/FDCB form that also copies the result to a register.
    pub(crate) fn rot_mem_r(&mut self, a: Args) {
        let value = self.rot_mem_value(a);
        self.regs.set(a.r1, value);
        self.advance(a);
    }

    pub(crate) fn bit_r(&mut self, a: Args) {
        let v = self.regs.get(a.r1);
        let result = flag_tables().bit[usize::from(a.n) << 8 | usize::from(v)];
        self.regs.set(F, result | (self.regs.f() & CF));
        self.advance(a);
    }

    /// BIT n,(HL) takes bits 5 and 3 from the value; the indexed forms take
    /// them from the high byte of the address.
    pub(crate) fn bit_mem(&mut self, a: Args) {
        let addr = self.mem_addr(a);
        let v = self.memory.read(addr);
        let mut result = flag_tables().bit[usize::from(a.n) << 8 | usize::from(v)];
        if a.indexed {
            result = (result & !(YF | XF)) | ((addr >> 8) as u8 & (YF | XF));
        }
        self.regs.set(F, result | (self.regs.f() & CF));
        self.advance(a);
    }

    pub(crate) fn res_set_r(&mut self, a: Args) {
        let value = (self.regs.get(a.r1) & a.n) | a.m;
        self.regs.set(a.r1, value);
        self.advance(a);
    }

    fn res_set_mem_value(&mut self, a: Args) -> u8 {
        let addr = self.mem_addr(a);
        let value = (self.memory.read(addr) & a.n) | a.m;
        self.memory.write(addr, value);
        value
    }

    pub(crate) fn res_set_mem(&mut self, a: Args) {
        self.res_set_mem_value(a);
        self.advance(a);
    }

    /// Undocumented DDCB/FDCB form that also copies the result to a register.
    pub(crate) fn res_set_mem_r(&mut self, a: Args) {
        let value = self.res_set_mem_value(a);
        self.regs.set(a.r1, value);
        self.advance(a);
    }

    // === ED arithmetic ===

    pub(crate) fn adc_hl(&mut self, a: Args) {
        let (value, f) =
            crate::alu::adc16(self.regs.hl(), self.regs.pair(a.r2), self.carry());
        self.regs.set_pair(H, value);
        self.regs.set(F, f);
        self.advance(a);
    }

    pub(crate) fn sbc_hl(&mut self, a: Args) {
        let (value, f) =
            crate::alu::sbc16(self.regs.hl(), self.regs.pair(a.r2), self.carry());
        self.regs.set_pair(H, value);
        self.regs.set(F, f);
        self.advance(a);
    }

    pub(crate) fn neg(&mut self, a: Args) {
        let result = a.table[usize::from(self.regs.a())];
        self.regs.set(A, result.value);
        self.regs.set(F, result.flags);
        self.advance(a);
    }

    pub(crate) fn rrd(&mut self, a: Args) {
        let hl = self.regs.hl();
        let v = self.memory.read(hl);
        let acc = self.regs.a();
        self.memory.write(hl, (acc << 4) | (v >> 4));
        let acc = (acc & 0xF0) | (v & 0x0F);
        self.regs.set(A, acc);
        self.regs.set(F, (self.regs.f() & CF) | flags::sz53p(acc));
        self.advance(a);
    }

    pub(crate) fn rld(&mut self, a: Args) {
        let hl = self.regs.hl();
        let v = self.memory.read(hl);
        let acc = self.regs.a();
        self.memory.write(hl, (v << 4) | (acc & 0x0F));
        let acc = (acc & 0xF0) | (v >> 4);
        self.regs.set(A, acc);
        self.regs.set(F, (self.regs.f() & CF) | flags::sz53p(acc));
        self.advance(a);
    }

    // === ED control ===

    /// RETN and RETI. With a single enable latch both are plain returns.
    pub(crate) fn retn(&mut self, a: Args) {
        let target = self.pop_word();
        self.finish(a, target, a.t);
    }

    pub(crate) fn set_interrupt_mode(&mut self, a: Args) {
        self.im = a.n;
        self.advance(a);
    }

    /// LD R,A. R takes A after the fetch increments.
    pub(crate) fn ld_r_a(&mut self, a: Args) {
        self.advance(a);
        self.regs.set(R, self.regs.a());
    }

    /// LD A,I / LD A,R. P/V reflects the enable latch.
    pub(crate) fn ld_a_ir(&mut self, a: Args) {
        self.advance(a);
        let value = self.regs.get(a.r2);
        self.regs.set(A, value);
        let mut f = (self.regs.f() & CF) | flags::sz53(value);
        if self.iff {
            f |= PF;
        }
        self.regs.set(F, f);
    }

    // === ED I/O ===

    pub(crate) fn in_r_c(&mut self, a: Args) {
        let value = self.port_in(self.regs.bc());
        self.regs.set(a.r1, value);
        self.regs
            .set(F, (self.regs.f() & CF) | flags::sz53p(value));
        self.advance(a);
    }

    /// IN F,(C): flags only.
    pub(crate) fn in_f_c(&mut self, a: Args) {
        let value = self.port_in(self.regs.bc());
        self.regs
            .set(F, (self.regs.f() & CF) | flags::sz53p(value));
        self.advance(a);
    }

    pub(crate) fn out_c_r(&mut self, a: Args) {
        self.port_out(self.regs.bc(), self.regs.get(a.r2));
        self.advance(a);
    }

    /// OUT (C),0
    pub(crate) fn out_c_0(&mut self, a: Args) {
        self.port_out(self.regs.bc(), 0);
        self.advance(a);
    }

    // === Block transfer ===

    /// One LDI/LDD iteration. Returns BC after the decrement.
    pub(crate) fn ld_block_step(&mut self, a: Args) -> u16 {
        let hl = self.regs.hl();
        let de = self.regs.de();
        let value = self.memory.read(hl);
        self.memory.write(de, value);
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_pair(H, hl.wrapping_add(step(a)));
        self.regs.set_pair(D, de.wrapping_add(step(a)));
        self.regs.set_pair(B, bc);
        self.regs.set(F, ld_block_flags(self.regs.f(), self.regs.a(), value, bc));
        bc
    }

    pub(crate) fn ldi(&mut self, a: Args) {
        self.ld_block_step(a);
        self.advance(a);
    }

    /// LDIR/LDDR: one iteration per execution, PC held until BC is 0.
    pub(crate) fn ldir(&mut self, a: Args) {
        if self.ld_block_step(a) == 0 {
            self.advance(a);
        } else {
            self.finish(a, self.regs.pc, a.t + 5);
        }
    }

    /// One CPI/CPD iteration. Returns true if the block should repeat.
    fn cp_block_step(&mut self, a: Args) -> bool {
        let hl = self.regs.hl();
        let value = self.memory.read(hl);
        let acc = self.regs.a();
        let result = acc.wrapping_sub(value);
        let half = (acc ^ value ^ result) & HF;
        let n = result.wrapping_sub(u8::from(half != 0));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_pair(H, hl.wrapping_add(step(a)));
        self.regs.set_pair(B, bc);

        let mut f = (self.regs.f() & CF) | NF | (result & SF) | half | (n & XF) | ((n & 0x02) << 4);
        if result == 0 {
            f |= ZF;
        }
        if bc != 0 {
            f |= PF;
        }
        self.regs.set(F, f);
        bc != 0 && result != 0
    }

    pub(crate) fn cpi(&mut self, a: Args) {
        self.cp_block_step(a);
        self.advance(a);
    }

    pub(crate) fn cpir(&mut self, a: Args) {
        if self.cp_block_step(a) {
            self.finish(a, self.regs.pc, a.t + 5);
        } else {
            self.advance(a);
        }
    }

    /// One INI/IND iteration. Returns B after the decrement.
    fn in_block_step(&mut self, a: Args) -> u8 {
        let hl = self.regs.hl();
        let value = self.port_in(self.regs.bc());
        self.memory.write(hl, value);
        let b = self.regs.get(B).wrapping_sub(1);
        self.regs.set(B, b);
        self.regs.set_pair(H, hl.wrapping_add(step(a)));
        let c = self.regs.get(C).wrapping_add(a.n);
        let k = u16::from(value) + u16::from(c);
        self.regs.set(F, io_block_flags(value, b, k));
        b
    }

    pub(crate) fn ini(&mut self, a: Args) {
        self.in_block_step(a);
        self.advance(a);
    }

    pub(crate) fn inir(&mut self, a: Args) {
        if self.in_block_step(a) == 0 {
            self.advance(a);
        } else {
            self.finish(a, self.regs.pc, a.t + 5);
        }
    }

    /// One OUTI/OUTD iteration. B is decremented before the port is
    /// addressed. Returns B.
    fn out_block_step(&mut self, a: Args) -> u8 {
        let hl = self.regs.hl();
        let value = self.memory.read(hl);
        let b = self.regs.get(B).wrapping_sub(1);
        self.regs.set(B, b);
        self.port_out(self.regs.bc(), value);
        self.regs.set_pair(H, hl.wrapping_add(step(a)));
        let k = u16::from(value) + u16::from(self.regs.get(L));
        self.regs.set(F, io_block_flags(value, b, k));
        b
    }

    pub(crate) fn outi(&mut self, a: Args) {
        self.out_block_step(a);
        self.advance(a);
    }

    pub(crate) fn otir(&mut self, a: Args) {
        if self.out_block_step(a) == 0 {
            self.advance(a);
        } else {
            self.finish(a, self.regs.pc, a.t + 5);
        }
    }
}

/// Flags after an LDI/LDD iteration. Bits 5 and 3 come from A plus the
/// byte copied.
pub(crate) fn ld_block_flags(f: u8, acc: u8, value: u8, bc: u16) -> u8 {
    let n = acc.wrapping_add(value);
    let mut flags = (f & (SF | ZF | CF)) | (n & XF) | ((n & 0x02) << 4);
    if bc != 0 {
        flags |= PF;
    }
    flags
}
