//! Precomputed result/flag tables.
//!
//! Every 8-bit ALU, shift, rotate and bit-test operation is tabulated over
//! its full input space the first time any simulator is built. Dispatch
//! entries hold `&'static` slices into these tables, so executing an
//! arithmetic instruction is one index and two stores.
//!
//! Index layouts:
//! - binary ops: `carry << 16 | a << 8 | operand` (carry half only present
//!   for ADC/SBC)
//! - RL/RR: `carry << 8 | operand`
//! - BIT: `bit << 8 | operand`
//! - DAA: `daa_index(f) << 8 | a`
//!
//! Per-byte S/Z/5/3/P flags are a compile-time table in `flags`.

use std::sync::LazyLock;

use crate::alu::{self, AluResult};
use crate::flags::{CF, HF, NF};

/// The complete set of lookup tables.
pub struct FlagTables {
    /// ADD (carry half 0) and ADC.
    pub adc: Box<[AluResult]>,
    /// SUB (carry half 0) and SBC.
    pub sbc: Box<[AluResult]>,
    pub and: Box<[AluResult]>,
    pub xor: Box<[AluResult]>,
    pub or: Box<[AluResult]>,
    /// CP. The value column holds the unchanged accumulator.
    pub cp: Box<[AluResult]>,
    pub inc: Box<[AluResult]>,
    pub dec: Box<[AluResult]>,
    pub rlc: Box<[AluResult]>,
    pub rrc: Box<[AluResult]>,
    pub rl: Box<[AluResult]>,
    pub rr: Box<[AluResult]>,
    pub sla: Box<[AluResult]>,
    pub sra: Box<[AluResult]>,
    pub sll: Box<[AluResult]>,
    pub srl: Box<[AluResult]>,
    /// BIT flags with carry clear.
    pub bit: Box<[u8]>,
    pub daa: Box<[AluResult]>,
    pub neg: Box<[AluResult]>,
}

static TABLES: LazyLock<FlagTables> = LazyLock::new(FlagTables::build);

/// The process-wide tables, built on first use.
#[must_use]
pub fn flag_tables() -> &'static FlagTables {
    &TABLES
}

/// Index into a binary-op table.
#[inline]
#[must_use]
pub const fn binary_index(a: u8, operand: u8, carry: bool) -> usize {
    (carry as usize) << 16 | (a as usize) << 8 | operand as usize
}

/// Index into a unary table that may take carry in (RL/RR).
#[inline]
#[must_use]
pub const fn unary_index(operand: u8, carry: bool) -> usize {
    (carry as usize) << 8 | operand as usize
}

/// The three flag bits DAA depends on, packed into 0..8.
#[inline]
#[must_use]
pub const fn daa_index(f: u8) -> usize {
    ((f & (NF | CF)) | ((f & HF) >> 2)) as usize
}

fn binary(op: impl Fn(u8, u8) -> AluResult) -> Box<[AluResult]> {
    (0..=0xFFFFu32)
        .map(|i| op((i >> 8) as u8, i as u8))
        .collect()
}

fn binary_with_carry(op: impl Fn(u8, u8, bool) -> AluResult) -> Box<[AluResult]> {
    (0..=0x1_FFFFu32)
        .map(|i| op((i >> 8) as u8, i as u8, i >> 16 != 0))
        .collect()
}

fn unary(op: impl Fn(u8) -> AluResult) -> Box<[AluResult]> {
    (0..=0xFFu8).map(op).collect()
}

fn unary_with_carry(op: impl Fn(u8, bool) -> AluResult) -> Box<[AluResult]> {
    (0..=0x1FFu16)
        .map(|i| op(i as u8, i >> 8 != 0))
        .collect()
}

impl FlagTables {
    fn build() -> Self {
        Self {
            adc: binary_with_carry(alu::add8),
            sbc: binary_with_carry(alu::sub8),
            and: binary(alu::and8),
            xor: binary(alu::xor8),
            or: binary(alu::or8),
            cp: binary(alu::cp8),
            inc: unary(alu::inc8),
            dec: unary(alu::dec8),
            rlc: unary(alu::rlc8),
            rrc: unary(alu::rrc8),
            rl: unary_with_carry(alu::rl8),
            rr: unary_with_carry(alu::rr8),
            sla: unary(alu::sla8),
            sra: unary(alu::sra8),
            sll: unary(alu::sll8),
            srl: unary(alu::srl8),
            bit: (0..0x800u16)
                .map(|i| alu::bit8((i >> 8) as u8, i as u8))
                .collect(),
            daa: (0..0x800u16)
                .map(|i| {
                    // Unpack the index back into a flag byte.
                    let bits = (i >> 8) as u8;
                    let f = (bits & (NF | CF)) | ((bits << 2) & HF);
                    alu::daa8(i as u8, f)
                })
                .collect(),
            neg: unary(alu::neg8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{PF, SF};

    #[test]
    fn table_sizes() {
        let t = flag_tables();
        assert_eq!(t.adc.len(), 0x2_0000);
        assert_eq!(t.cp.len(), 0x1_0000);
        assert_eq!(t.rl.len(), 0x200);
        assert_eq!(t.bit.len(), 0x800);
        assert_eq!(t.daa.len(), 0x800);
    }

    #[test]
    fn daa_index_round_trips_flag_bits() {
        for f in [0, CF, NF, HF, CF | NF | HF, 0xFF] {
            let bits = daa_index(f) as u8;
            let back = (bits & (NF | CF)) | ((bits << 2) & HF);
            assert_eq!(back, f & (NF | CF | HF));
        }
    }

    #[test]
    fn adc_a_a_aliases_through_the_square_table() {
        let t = flag_tables();
        let r = t.adc[binary_index(0x40, 0x40, true)];
        assert_eq!(r.value, 0x81);
        assert_eq!(r.flags & (SF | PF), SF | PF);
        let r = t.sbc[binary_index(0x12, 0x12, true)];
        assert_eq!(r.value, 0xFF);
        assert_eq!(r.flags & CF, CF);
    }
}
