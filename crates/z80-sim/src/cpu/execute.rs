//! Unprefixed instructions, and their DD/FD forms.

use sim_core::Bus;

use super::Simulator;
use crate::dispatch::Args;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::registers::{A, A_ALT, B, B_ALT, D, F, H, SPH};
use crate::tables::{binary_index, daa_index, unary_index};

impl Simulator {
    pub(crate) fn nop(&mut self, a: Args) {
        self.advance(a);
    }

    // === Loads ===

    pub(crate) fn ld_r_r(&mut self, a: Args) {
        self.regs.set(a.r1, self.regs.get(a.r2));
        self.advance(a);
    }

    pub(crate) fn ld_r_n(&mut self, a: Args) {
        let n = self.imm8(a);
        self.regs.set(a.r1, n);
        self.advance(a);
    }

    pub(crate) fn ld_r_mem(&mut self, a: Args) {
        let value = self.memory.read(self.mem_addr(a));
        self.regs.set(a.r1, value);
        self.advance(a);
    }

    pub(crate) fn ld_mem_r(&mut self, a: Args) {
        let addr = self.mem_addr(a);
        self.memory.write(addr, self.regs.get(a.r2));
        self.advance(a);
    }

    pub(crate) fn ld_mem_n(&mut self, a: Args) {
        let addr = self.mem_addr(a);
        let n = self.imm8(a);
        self.memory.write(addr, n);
        self.advance(a);
    }

    pub(crate) fn ld_rr_nn(&mut self, a: Args) {
        let nn = self.imm16(a);
        self.regs.set_pair(a.r1, nn);
        self.advance(a);
    }

    /// LD (BC),A / LD (DE),A
    pub(crate) fn ld_mem_rr_a(&mut self, a: Args) {
        let addr = self.regs.pair(a.r1);
        self.memory.write(addr, self.regs.a());
        self.advance(a);
    }

    /// LD A,(BC) / LD A,(DE)
    pub(crate) fn ld_a_mem_rr(&mut self, a: Args) {
        let value = self.memory.read(self.regs.pair(a.r2));
        self.regs.set(A, value);
        self.advance(a);
    }

    pub(crate) fn ld_mem_nn_a(&mut self, a: Args) {
        let addr = self.imm16(a);
        self.memory.write(addr, self.regs.a());
        self.advance(a);
    }

    pub(crate) fn ld_a_mem_nn(&mut self, a: Args) {
        let value = self.memory.read(self.imm16(a));
        self.regs.set(A, value);
        self.advance(a);
    }

    /// LD (nn),rr, unprefixed or ED
    pub(crate) fn ld_mem_nn_rr(&mut self, a: Args) {
        let addr = self.imm16(a);
        self.memory.write_word(addr, self.regs.pair(a.r1));
        self.advance(a);
    }

    /// LD rr,(nn), unprefixed or ED
    pub(crate) fn ld_rr_mem_nn(&mut self, a: Args) {
        let value = self.memory.read_word(self.imm16(a));
        self.regs.set_pair(a.r1, value);
        self.advance(a);
    }

    pub(crate) fn ld_sp_rr(&mut self, a: Args) {
        self.regs.set_pair(SPH, self.regs.pair(a.r1));
        self.advance(a);
    }

    // === Exchanges ===

    pub(crate) fn ex_af(&mut self, a: Args) {
        self.regs.swap(A, A_ALT, 2);
        self.advance(a);
    }

    pub(crate) fn exx(&mut self, a: Args) {
        self.regs.swap(B, B_ALT, 6);
        self.advance(a);
    }

    pub(crate) fn ex_de_hl(&mut self, a: Args) {
        self.regs.swap(D, H, 2);
        self.advance(a);
    }

    /// EX (SP),HL / EX (SP),IX / EX (SP),IY
    pub(crate) fn ex_sp_rr(&mut self, a: Args) {
        let sp = self.regs.sp();
        let value = self.memory.read_word(sp);
        self.memory.write_word(sp, self.regs.pair(a.r1));
        self.regs.set_pair(a.r1, value);
        self.advance(a);
    }

    // === Arithmetic ===

    /// 8-bit arithmetic and logic on A through a 256x256 result table.
    fn alu(&mut self, a: Args, operand: u8) {
        let carry = a.carry && self.carry();
        let result = a.table[binary_index(self.regs.a(), operand, carry)];
        self.regs.set(A, result.value);
        self.regs.set(F, result.flags);
    }

    pub(crate) fn alu_r(&mut self, a: Args) {
        self.alu(a, self.regs.get(a.r2));
        self.advance(a);
    }

    pub(crate) fn alu_n(&mut self, a: Args) {
        self.alu(a, self.imm8(a));
        self.advance(a);
    }

    pub(crate) fn alu_mem(&mut self, a: Args) {
        let operand = self.memory.read(self.mem_addr(a));
        self.alu(a, operand);
        self.advance(a);
    }

    /// INC r / DEC r. Carry survives.
    pub(crate) fn inc_dec_r(&mut self, a: Args) {
        let result = a.table[usize::from(self.regs.get(a.r1))];
        self.regs.set(a.r1, result.value);
        self.regs.set(F, (self.regs.f() & CF) | result.flags);
        self.advance(a);
    }

    pub(crate) fn inc_dec_mem(&mut self, a: Args) {
        let addr = self.mem_addr(a);
        let result = a.table[usize::from(self.memory.read(addr))];
        self.memory.write(addr, result.value);
        self.regs.set(F, (self.regs.f() & CF) | result.flags);
        self.advance(a);
    }

    pub(crate) fn inc_rr(&mut self, a: Args) {
        self.regs.set_pair(a.r1, self.regs.pair(a.r1).wrapping_add(1));
        self.advance(a);
    }

    pub(crate) fn dec_rr(&mut self, a: Args) {
        self.regs.set_pair(a.r1, self.regs.pair(a.r1).wrapping_sub(1));
        self.advance(a);
    }

    /// ADD HL,rr / ADD IX,rr / ADD IY,rr
    pub(crate) fn add_rr(&mut self, a: Args) {
        let (value, flags) = crate::alu::add16(self.regs.pair(a.r1), self.regs.pair(a.r2));
        self.regs.set_pair(a.r1, value);
        self.regs.set(F, (self.regs.f() & (SF | ZF | PF)) | flags);
        self.advance(a);
    }

    pub(crate) fn daa(&mut self, a: Args) {
        let f = self.regs.f();
        let result = a.table[daa_index(f) << 8 | usize::from(self.regs.a())];
        self.regs.set(A, result.value);
        self.regs.set(F, result.flags);
        self.advance(a);
    }

    pub(crate) fn cpl(&mut self, a: Args) {
        let value = !self.regs.a();
        self.regs.set(A, value);
        self.regs
            .set(F, (self.regs.f() & (SF | ZF | PF | CF)) | HF | NF | (value & (YF | XF)));
        self.advance(a);
    }

    pub(crate) fn scf(&mut self, a: Args) {
        let f = self.regs.f();
        self.regs
            .set(F, (f & (SF | ZF | PF)) | (self.regs.a() & (YF | XF)) | CF);
        self.advance(a);
    }

    /// CCF: H takes the old carry.
    pub(crate) fn ccf(&mut self, a: Args) {
        let f = self.regs.f();
        let carry = if f & CF != 0 { HF } else { CF };
        self.regs
            .set(F, (f & (SF | ZF | PF)) | (self.regs.a() & (YF | XF)) | carry);
        self.advance(a);
    }

    /// RLCA / RRCA / RLA / RRA: S, Z and P/V are left alone.
    pub(crate) fn rot_a(&mut self, a: Args) {
        let f = self.regs.f();
        let result = a.table[unary_index(self.regs.a(), a.carry && f & CF != 0)];
        self.regs.set(A, result.value);
        self.regs
            .set(F, (f & (SF | ZF | PF)) | (result.flags & (YF | XF | CF)));
        self.advance(a);
    }

    // === Control flow ===

    pub(crate) fn jp(&mut self, a: Args) {
        let target = self.imm16(a);
        self.finish(a, target, a.t);
    }

    pub(crate) fn jp_cc(&mut self, a: Args) {
        let target = if self.condition(a) {
            self.imm16(a)
        } else {
            self.next_pc(a)
        };
        self.finish(a, target, a.t);
    }

    /// JP (HL) / JP (IX) / JP (IY)
    pub(crate) fn jp_rr(&mut self, a: Args) {
        let target = self.regs.pair(a.r1);
        self.finish(a, target, a.t);
    }

    pub(crate) fn jr(&mut self, a: Args) {
        let target = self.relative(a);
        self.finish(a, target, a.t);
    }

    pub(crate) fn jr_cc(&mut self, a: Args) {
        if self.condition(a) {
            let target = self.relative(a);
            self.finish(a, target, a.t + 5);
        } else {
            self.advance(a);
        }
    }

    pub(crate) fn djnz(&mut self, a: Args) {
        let b = self.regs.get(B).wrapping_sub(1);
        self.regs.set(B, b);
        if b == 0 {
            self.advance(a);
        } else {
            let target = self.relative(a);
            self.finish(a, target, a.t + 5);
        }
    }

    pub(crate) fn call(&mut self, a: Args) {
        let target = self.imm16(a);
        self.push_word(self.next_pc(a));
        self.finish(a, target, a.t);
    }

    pub(crate) fn call_cc(&mut self, a: Args) {
        if self.condition(a) {
            let target = self.imm16(a);
            self.push_word(self.next_pc(a));
            self.finish(a, target, a.t + 7);
        } else {
            self.advance(a);
        }
    }

    pub(crate) fn ret(&mut self, a: Args) {
        let target = self.pop_word();
        self.finish(a, target, a.t);
    }

    pub(crate) fn ret_cc(&mut self, a: Args) {
        if self.condition(a) {
            let target = self.pop_word();
            self.finish(a, target, a.t + 6);
        } else {
            self.advance(a);
        }
    }

    pub(crate) fn rst(&mut self, a: Args) {
        self.push_word(self.next_pc(a));
        self.finish(a, u16::from(a.n), a.t);
    }

    pub(crate) fn push(&mut self, a: Args) {
        self.push_word(self.regs.pair(a.r1));
        self.advance(a);
    }

    pub(crate) fn pop(&mut self, a: Args) {
        let value = self.pop_word();
        self.regs.set_pair(a.r1, value);
        self.advance(a);
    }

    /// HALT holds PC on itself until a frame boundary passes with
    /// interrupts enabled.
    pub(crate) fn halt(&mut self, a: Args) {
        let t = self.regs.t;
        let frame = self.config.frame();
        let released = self.iff && (t + u64::from(a.t)) / frame > t / frame;
        let pc = if released { self.next_pc(a) } else { self.regs.pc };
        self.finish(a, pc, a.t);
    }

    pub(crate) fn di(&mut self, a: Args) {
        self.iff = false;
        self.advance(a);
    }

    pub(crate) fn ei(&mut self, a: Args) {
        self.iff = true;
        self.advance(a);
    }

    // === I/O ===

    /// OUT (n),A: the port's high byte is A.
    pub(crate) fn out_n_a(&mut self, a: Args) {
        let acc = self.regs.a();
        let port = u16::from(acc) << 8 | u16::from(self.imm8(a));
        self.port_out(port, acc);
        self.advance(a);
    }

    /// IN A,(n): the port's high byte is A. Flags are untouched.
    pub(crate) fn in_a_n(&mut self, a: Args) {
        let port = u16::from(self.regs.a()) << 8 | u16::from(self.imm8(a));
        let value = self.port_in(port);
        self.regs.set(A, value);
        self.advance(a);
    }

    // === Prefixes ===

    pub(crate) fn prefix_cb(&mut self, _a: Args) {
        let opcode = self.memory.read(self.regs.pc.wrapping_add(1));
        let entry = self.tables.cb[usize::from(opcode)];
        (entry.handler)(self, entry.args);
    }

    pub(crate) fn prefix_ed(&mut self, _a: Args) {
        let opcode = self.memory.read(self.regs.pc.wrapping_add(1));
        let entry = self.tables.ed[usize::from(opcode)];
        (entry.handler)(self, entry.args);
    }

    pub(crate) fn prefix_dd(&mut self, _a: Args) {
        let opcode = self.memory.read(self.regs.pc.wrapping_add(1));
        let entry = self.tables.dd[usize::from(opcode)];
        (entry.handler)(self, entry.args);
    }

    pub(crate) fn prefix_fd(&mut self, _a: Args) {
        let opcode = self.memory.read(self.regs.pc.wrapping_add(1));
        let entry = self.tables.fd[usize::from(opcode)];
        (entry.handler)(self, entry.args);
    }

    /// DD CB d op: the opcode comes after the displacement.
    pub(crate) fn prefix_ddcb(&mut self, _a: Args) {
        let opcode = self.memory.read(self.regs.pc.wrapping_add(3));
        let entry = self.tables.ddcb[usize::from(opcode)];
        (entry.handler)(self, entry.args);
    }

    pub(crate) fn prefix_fdcb(&mut self, _a: Args) {
        let opcode = self.memory.read(self.regs.pc.wrapping_add(3));
        let entry = self.tables.fdcb[usize::from(opcode)];
        (entry.handler)(self, entry.args);
    }
}
