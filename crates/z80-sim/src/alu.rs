//! Z80 ALU formulas.
//!
//! These compute one result at a time. The simulator never calls them on the
//! hot path; `tables` runs each of them over its whole input space once and
//! dispatch reads the stored results.

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, sz53, sz53p};

/// Result of an ALU operation with flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
}

impl AluResult {
    const fn new(value: u8, flags: u8) -> Self {
        Self { value, flags }
    }
}

/// Add two bytes with optional carry.
#[must_use]
pub const fn add8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = carry as u16;
    let result16 = a as u16 + b as u16 + c;
    let result = result16 as u8;

    let mut flags = sz53(result);
    if (a & 0x0F) as u16 + (b & 0x0F) as u16 + c > 0x0F {
        flags |= HF;
    }
    // Both operands same sign, result different sign.
    if (a ^ b) & 0x80 == 0 && (a ^ result) & 0x80 != 0 {
        flags |= PF;
    }
    if result16 > 0xFF {
        flags |= CF;
    }
    AluResult::new(result, flags)
}

/// Subtract two bytes with optional borrow.
#[must_use]
pub const fn sub8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = carry as u16;
    let result = (a as u16).wrapping_sub(b as u16).wrapping_sub(c) as u8;

    let mut flags = sz53(result) | NF;
    if ((a & 0x0F) as u16) < (b & 0x0F) as u16 + c {
        flags |= HF;
    }
    // Operands different sign, result same sign as subtrahend.
    if (a ^ b) & 0x80 != 0 && (b ^ result) & 0x80 == 0 {
        flags |= PF;
    }
    if (a as u16) < b as u16 + c {
        flags |= CF;
    }
    AluResult::new(result, flags)
}

#[must_use]
pub const fn and8(a: u8, b: u8) -> AluResult {
    let result = a & b;
    AluResult::new(result, sz53p(result) | HF)
}

#[must_use]
pub const fn or8(a: u8, b: u8) -> AluResult {
    let result = a | b;
    AluResult::new(result, sz53p(result))
}

#[must_use]
pub const fn xor8(a: u8, b: u8) -> AluResult {
    let result = a ^ b;
    AluResult::new(result, sz53p(result))
}

/// Compare. The accumulator is returned unchanged; bits 5 and 3 come from
/// the operand, not the difference.
#[must_use]
pub const fn cp8(a: u8, b: u8) -> AluResult {
    let diff = sub8(a, b, false);
    AluResult::new(a, (diff.flags & !(YF | XF)) | (b & (YF | XF)))
}

/// Increment byte. Carry is left clear for the caller to merge in.
#[must_use]
pub const fn inc8(a: u8) -> AluResult {
    let result = a.wrapping_add(1);
    let mut flags = sz53(result);
    if a & 0x0F == 0x0F {
        flags |= HF;
    }
    if a == 0x7F {
        flags |= PF;
    }
    AluResult::new(result, flags)
}

/// Decrement byte. Carry is left clear for the caller to merge in.
#[must_use]
pub const fn dec8(a: u8) -> AluResult {
    let result = a.wrapping_sub(1);
    let mut flags = sz53(result) | NF;
    if a & 0x0F == 0x00 {
        flags |= HF;
    }
    if a == 0x80 {
        flags |= PF;
    }
    AluResult::new(result, flags)
}

const fn shifted(result: u8, carry_out: u8) -> AluResult {
    AluResult::new(result, sz53p(result) | (carry_out & CF))
}

/// Rotate left circular (bit 7 -> carry and bit 0).
#[must_use]
pub const fn rlc8(a: u8) -> AluResult {
    shifted(a.rotate_left(1), a >> 7)
}

/// Rotate right circular (bit 0 -> carry and bit 7).
#[must_use]
pub const fn rrc8(a: u8) -> AluResult {
    shifted(a.rotate_right(1), a)
}

/// Rotate left through carry.
#[must_use]
pub const fn rl8(a: u8, carry: bool) -> AluResult {
    shifted((a << 1) | carry as u8, a >> 7)
}

/// Rotate right through carry.
#[must_use]
pub const fn rr8(a: u8, carry: bool) -> AluResult {
    shifted((a >> 1) | ((carry as u8) << 7), a)
}

/// Shift left arithmetic (bit 0 = 0).
#[must_use]
pub const fn sla8(a: u8) -> AluResult {
    shifted(a << 1, a >> 7)
}

/// Shift right arithmetic (bit 7 preserved).
#[must_use]
pub const fn sra8(a: u8) -> AluResult {
    shifted((a >> 1) | (a & 0x80), a)
}

/// Shift left logical (undocumented SLL - bit 0 = 1).
#[must_use]
pub const fn sll8(a: u8) -> AluResult {
    shifted((a << 1) | 1, a >> 7)
}

/// Shift right logical (bit 7 = 0).
#[must_use]
pub const fn srl8(a: u8) -> AluResult {
    shifted(a >> 1, a)
}

/// Flags for BIT n,v. Carry is left clear; bits 5 and 3 come from `v`.
#[must_use]
pub const fn bit8(n: u8, v: u8) -> u8 {
    let tested = v & (1 << n);
    let mut flags = HF | (v & (YF | XF));
    if tested == 0 {
        flags |= ZF | PF;
    }
    if tested & 0x80 != 0 {
        flags |= SF;
    }
    flags
}

/// Decimal adjust. Only C, N and H of `f` matter.
#[must_use]
pub const fn daa8(a: u8, f: u8) -> AluResult {
    let n = f & NF != 0;
    let h = f & HF != 0;
    let mut carry = f & CF != 0;
    let mut diff = 0u8;

    if h || a & 0x0F > 9 {
        diff |= 0x06;
    }
    if carry || a > 0x99 {
        diff |= 0x60;
        carry = true;
    }

    let result = if n { a.wrapping_sub(diff) } else { a.wrapping_add(diff) };
    let half = if n { h && a & 0x0F < 6 } else { a & 0x0F > 9 };

    let mut flags = sz53p(result) | (f & NF);
    if half {
        flags |= HF;
    }
    if carry {
        flags |= CF;
    }
    AluResult::new(result, flags)
}

/// Negate (0 - a).
#[must_use]
pub const fn neg8(a: u8) -> AluResult {
    sub8(0, a, false)
}

/// 16-bit add for HL/IX/IY. Returns only H, 5, 3 and C; the caller keeps
/// S, Z and P/V.
#[must_use]
pub const fn add16(a: u16, b: u16) -> (u16, u8) {
    let result32 = a as u32 + b as u32;
    let result = result32 as u16;

    let mut flags = ((result >> 8) as u8) & (YF | XF);
    // Half-carry from bit 11
    if (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF {
        flags |= HF;
    }
    if result32 > 0xFFFF {
        flags |= CF;
    }
    (result, flags)
}

/// 16-bit add with carry for HL.
#[must_use]
pub const fn adc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = carry as u32;
    let result32 = a as u32 + b as u32 + c;
    let result = result32 as u16;

    let mut flags = ((result >> 8) as u8) & (SF | YF | XF);
    if result == 0 {
        flags |= ZF;
    }
    if (a & 0x0FFF) as u32 + (b & 0x0FFF) as u32 + c > 0x0FFF {
        flags |= HF;
    }
    if (a ^ b) & 0x8000 == 0 && (a ^ result) & 0x8000 != 0 {
        flags |= PF;
    }
    if result32 > 0xFFFF {
        flags |= CF;
    }
    (result, flags)
}

/// 16-bit subtract with borrow for HL.
#[must_use]
pub const fn sbc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = carry as u32;
    let result = (a as u32).wrapping_sub(b as u32).wrapping_sub(c) as u16;

    let mut flags = NF | (((result >> 8) as u8) & (SF | YF | XF));
    if result == 0 {
        flags |= ZF;
    }
    // Borrow from bit 12
    if ((a & 0x0FFF) as u32) < (b & 0x0FFF) as u32 + c {
        flags |= HF;
    }
    if (a ^ b) & 0x8000 != 0 && (b ^ result) & 0x8000 == 0 {
        flags |= PF;
    }
    if (a as u32) < b as u32 + c {
        flags |= CF;
    }
    (result, flags)
}
