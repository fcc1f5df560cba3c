//! Whole-loop replacements for `DJNZ $`, LDIR and LDDR.
//!
//! Each produces the same registers, memory and T-state count as running
//! the ordinary handler to completion. They only take over while interrupts
//! are disabled, since an enabled latch can break into the loop.

use sim_core::Bus;

use super::Simulator;
use super::prefixed::ld_block_flags;
use crate::dispatch::Args;
use crate::registers::{B, D, F, H};

impl Simulator {
    pub(crate) fn djnz_fast(&mut self, a: Args) {
        // Only `DJNZ $`, which jumps back onto itself.
        if self.iff || self.imm8(a) != 0xFE {
            self.djnz(a);
            return;
        }
        let b = self.regs.get(B);
        let count = if b == 0 { 256 } else { u64::from(b) };
        let taken = u64::from(a.t) + 5;
        self.regs.set(B, 0);
        self.regs.t += (count - 1) * taken;
        self.bump_r(((count - 1) % 128) as u8);
        log::trace!("fast DJNZ at {:04X}: {count} iterations", self.regs.pc);
        self.advance(a);
    }

    /// LDIR and LDDR. Stops early if a write lands on the instruction
    /// itself, so the modified code is fetched next.
    pub(crate) fn ldir_fast(&mut self, a: Args) {
        if self.iff {
            self.ldir(a);
            return;
        }
        let pc = self.regs.pc;
        let step = i16::from(a.n as i8) as u16;
        let mut hl = self.regs.hl();
        let mut de = self.regs.de();
        let mut bc = self.regs.bc();
        let mut count: u64 = 0;

        let last = loop {
            let value = self.memory.read(hl);
            self.memory.write(de, value);
            let hit_self = de == pc || de == pc.wrapping_add(1);
            hl = hl.wrapping_add(step);
            de = de.wrapping_add(step);
            bc = bc.wrapping_sub(1);
            count += 1;
            if bc == 0 || hit_self {
                break value;
            }
        };

        self.regs.set_pair(H, hl);
        self.regs.set_pair(D, de);
        self.regs.set_pair(B, bc);
        self.regs
            .set(F, ld_block_flags(self.regs.f(), self.regs.a(), last, bc));

        // All but the last iteration repeated; the last is charged below.
        log::trace!("fast block copy at {pc:04X}: {count} bytes");
        self.regs.t += (count - 1) * (u64::from(a.t) + 5);
        self.bump_r(((2 * (count - 1)) % 128) as u8);
        if bc == 0 {
            self.advance(a);
        } else {
            self.finish(a, pc, a.t + 5);
        }
    }
}
