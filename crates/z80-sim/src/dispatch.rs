//! Opcode dispatch tables.
//!
//! Each table maps an opcode byte to a handler plus the operands it was
//! bound to when the table was built: register slots, a result table,
//! timing and length. Executing an instruction is one lookup and one call.
//!
//! The DD and FD tables come out of the same builder as the main table.
//! Every entry gains the prefix's 4 T-states and byte, H/L become the index
//! halves, and (HL) becomes (IX+d)/(IY+d).

use std::array;

use crate::Simulator as S;
use crate::alu::AluResult;
use crate::config::Config;
use crate::flags::{CF, PF, SF, ZF};
use crate::registers::{A, B, C, D, E, H, I, IXH, IXL, IYH, IYL, L, R, SPH};
use crate::tables::FlagTables;

pub(crate) type Handler = fn(&mut S, Args);

/// Operands bound into a dispatch entry.
#[derive(Clone, Copy)]
pub(crate) struct Args {
    /// Destination slot, or high slot of a destination pair.
    pub r1: usize,
    /// Source slot, or high slot of a source pair.
    pub r2: usize,
    /// High slot of the pair used for memory operands (H, IXH or IYH).
    pub hl: usize,
    /// Memory operand is (hl+d) with d at PC+2.
    pub indexed: bool,
    /// Bit number, AND mask, condition mask, restart address, interrupt
    /// mode or block step, depending on the handler.
    pub n: u8,
    /// OR mask or expected condition bits.
    pub m: u8,
    /// Index `table` with the carry flag.
    pub carry: bool,
    pub table: &'static [AluResult],
    /// T-states (the not-taken/finished figure for variable timings).
    pub t: u8,
    /// Instruction length in bytes.
    pub size: u8,
    /// Amount added to the low seven bits of R.
    pub r_inc: u8,
}

impl Args {
    const fn new(t: u8, size: u8) -> Self {
        Self {
            r1: 0,
            r2: 0,
            hl: H,
            indexed: false,
            n: 0,
            m: 0,
            carry: false,
            table: &[],
            t,
            size,
            r_inc: 1,
        }
    }

    /// Same instruction behind a CB or ED prefix.
    const fn prefixed(self) -> Self {
        Self { r_inc: 2, ..self }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct Opcode {
    pub handler: Handler,
    pub args: Args,
}

const fn op(handler: Handler, args: Args) -> Opcode {
    Opcode { handler, args }
}

/// Which pair plays the part of HL.
#[derive(Clone, Copy, PartialEq, Eq)]
struct Index {
    hi: usize,
    lo: usize,
    prefixed: bool,
}

const HL: Index = Index { hi: H, lo: L, prefixed: false };
const IX: Index = Index { hi: IXH, lo: IXL, prefixed: true };
const IY: Index = Index { hi: IYH, lo: IYL, prefixed: true };

/// Register from a 3-bit field. Code 6 is the memory operand and has no slot.
fn reg(code: u8, x: Index) -> usize {
    match code {
        0 => B,
        1 => C,
        2 => D,
        3 => E,
        4 => x.hi,
        5 => x.lo,
        _ => A,
    }
}

/// Pair from a 2-bit field, SP variant.
fn rp(code: u8, x: Index) -> usize {
    match code {
        0 => B,
        1 => D,
        2 => x.hi,
        _ => SPH,
    }
}

/// Pair from a 2-bit field, AF variant (PUSH/POP).
fn rp2(code: u8, x: Index) -> usize {
    if code == 3 { A } else { rp(code, x) }
}

/// Condition code as (mask, expected) over F.
fn cond(code: u8) -> (u8, u8) {
    match code {
        0 => (ZF, 0),
        1 => (ZF, ZF),
        2 => (CF, 0),
        3 => (CF, CF),
        4 => (PF, 0),
        5 => (PF, PF),
        6 => (SF, 0),
        _ => (SF, SF),
    }
}

fn with_cond(args: Args, code: u8) -> Args {
    let (n, m) = cond(code);
    Args { n, m, ..args }
}

fn alu_op(code: u8, t: &'static FlagTables) -> (&'static [AluResult], bool) {
    match code {
        0 => (&t.adc[..], false),
        1 => (&t.adc[..], true),
        2 => (&t.sbc[..], false),
        3 => (&t.sbc[..], true),
        4 => (&t.and[..], false),
        5 => (&t.xor[..], false),
        6 => (&t.or[..], false),
        _ => (&t.cp[..], false),
    }
}

fn rot_op(code: u8, t: &'static FlagTables) -> (&'static [AluResult], bool) {
    match code {
        0 => (&t.rlc[..], false),
        1 => (&t.rrc[..], false),
        2 => (&t.rl[..], true),
        3 => (&t.rr[..], true),
        4 => (&t.sla[..], false),
        5 => (&t.sra[..], false),
        6 => (&t.sll[..], false),
        _ => (&t.srl[..], false),
    }
}

/// Main-table entry for `code`, with `x` standing in for HL. Timings and
/// lengths exclude any DD/FD prefix; `index_table` adds it.
fn main_entry(code: u8, x: Index, t: &'static FlagTables) -> Opcode {
    let y = (code >> 3) & 7;
    let z = code & 7;
    let p = y >> 1;

    // (HL), or (IX+d) with one more byte and the address arithmetic cycles.
    let mem = |args: Args, extra: u8| {
        if x.prefixed {
            Args {
                hl: x.hi,
                indexed: true,
                size: args.size + 1,
                t: args.t + extra,
                ..args
            }
        } else {
            args
        }
    };

    match code {
        0x00 => op(S::nop, Args::new(4, 1)),
        0x01 | 0x11 | 0x21 | 0x31 => op(S::ld_rr_nn, Args { r1: rp(p, x), ..Args::new(10, 3) }),
        0x02 | 0x12 => op(S::ld_mem_rr_a, Args { r1: rp(p, HL), ..Args::new(7, 1) }),
        0x0A | 0x1A => op(S::ld_a_mem_rr, Args { r2: rp(p, HL), ..Args::new(7, 1) }),
        0x03 | 0x13 | 0x23 | 0x33 => op(S::inc_rr, Args { r1: rp(p, x), ..Args::new(6, 1) }),
        0x0B | 0x1B | 0x2B | 0x3B => op(S::dec_rr, Args { r1: rp(p, x), ..Args::new(6, 1) }),
        0x34 => op(S::inc_dec_mem, mem(Args { table: &t.inc, ..Args::new(11, 1) }, 8)),
        0x35 => op(S::inc_dec_mem, mem(Args { table: &t.dec, ..Args::new(11, 1) }, 8)),
        0x36 => op(S::ld_mem_n, mem(Args::new(10, 2), 5)),
        0x07 | 0x0F | 0x17 | 0x1F => {
            let (table, carry) = rot_op(y, t);
            op(S::rot_a, Args { table, carry, ..Args::new(4, 1) })
        }
        0x08 => op(S::ex_af, Args::new(4, 1)),
        0x09 | 0x19 | 0x29 | 0x39 => op(
            S::add_rr,
            Args { r1: x.hi, r2: rp(p, x), ..Args::new(11, 1) },
        ),
        0x10 => op(S::djnz, Args::new(8, 2)),
        0x18 => op(S::jr, Args::new(12, 2)),
        0x20 | 0x28 | 0x30 | 0x38 => op(S::jr_cc, with_cond(Args::new(7, 2), y - 4)),
        0x22 => op(S::ld_mem_nn_rr, Args { r1: x.hi, ..Args::new(16, 3) }),
        0x2A => op(S::ld_rr_mem_nn, Args { r1: x.hi, ..Args::new(16, 3) }),
        0x27 => op(S::daa, Args { table: &t.daa, ..Args::new(4, 1) }),
        0x2F => op(S::cpl, Args::new(4, 1)),
        0x37 => op(S::scf, Args::new(4, 1)),
        0x3F => op(S::ccf, Args::new(4, 1)),
        0x32 => op(S::ld_mem_nn_a, Args::new(13, 3)),
        0x3A => op(S::ld_a_mem_nn, Args::new(13, 3)),
        0x00..=0x3F => match z {
            4 => op(S::inc_dec_r, Args { r1: reg(y, x), table: &t.inc, ..Args::new(4, 1) }),
            5 => op(S::inc_dec_r, Args { r1: reg(y, x), table: &t.dec, ..Args::new(4, 1) }),
            _ => op(S::ld_r_n, Args { r1: reg(y, x), ..Args::new(7, 2) }),
        },

        0x76 => op(S::halt, Args::new(4, 1)),
        0x40..=0x7F if z == 6 => op(S::ld_r_mem, mem(Args { r1: reg(y, HL), ..Args::new(7, 1) }, 8)),
        0x40..=0x7F if y == 6 => op(S::ld_mem_r, mem(Args { r2: reg(z, HL), ..Args::new(7, 1) }, 8)),
        0x40..=0x7F => op(S::ld_r_r, Args { r1: reg(y, x), r2: reg(z, x), ..Args::new(4, 1) }),

        0x80..=0xBF => {
            let (table, carry) = alu_op(y, t);
            if z == 6 {
                op(S::alu_mem, mem(Args { table, carry, ..Args::new(7, 1) }, 8))
            } else {
                op(S::alu_r, Args { r2: reg(z, x), table, carry, ..Args::new(4, 1) })
            }
        }

        0xC9 => op(S::ret, Args::new(10, 1)),
        0xC3 => op(S::jp, Args::new(10, 3)),
        0xCD => op(S::call, Args::new(17, 3)),
        0xCB => op(S::prefix_cb, Args::new(0, 0)),
        0xDD => op(S::prefix_dd, Args::new(0, 0)),
        0xED => op(S::prefix_ed, Args::new(0, 0)),
        0xFD => op(S::prefix_fd, Args::new(0, 0)),
        0xD3 => op(S::out_n_a, Args::new(11, 2)),
        0xDB => op(S::in_a_n, Args::new(11, 2)),
        0xD9 => op(S::exx, Args::new(4, 1)),
        0xE3 => op(S::ex_sp_rr, Args { r1: x.hi, ..Args::new(19, 1) }),
        0xE9 => op(S::jp_rr, Args { r1: x.hi, ..Args::new(4, 1) }),
        0xEB => op(S::ex_de_hl, Args::new(4, 1)),
        0xF9 => op(S::ld_sp_rr, Args { r1: x.hi, ..Args::new(6, 1) }),
        0xF3 => op(S::di, Args::new(4, 1)),
        0xFB => op(S::ei, Args::new(4, 1)),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => op(S::pop, Args { r1: rp2(p, x), ..Args::new(10, 1) }),
        0xC5 | 0xD5 | 0xE5 | 0xF5 => op(S::push, Args { r1: rp2(p, x), ..Args::new(11, 1) }),
        _ => match z {
            0 => op(S::ret_cc, with_cond(Args::new(5, 1), y)),
            2 => op(S::jp_cc, with_cond(Args::new(10, 3), y)),
            4 => op(S::call_cc, with_cond(Args::new(10, 3), y)),
            6 => {
                let (table, carry) = alu_op(y, t);
                op(S::alu_n, Args { table, carry, ..Args::new(7, 2) })
            }
            _ => op(S::rst, Args { n: y * 8, ..Args::new(11, 1) }),
        },
    }
}

/// The DD or FD table.
fn index_table(x: Index, t: &'static FlagTables) -> [Opcode; 256] {
    array::from_fn(|i| match i as u8 {
        0xCB if x == IX => op(S::prefix_ddcb, Args::new(0, 0)),
        0xCB => op(S::prefix_fdcb, Args::new(0, 0)),
        // A prefix followed by another prefix is a 4 T-state no-op; the
        // second prefix is decoded afresh.
        0xDD | 0xED | 0xFD => op(S::nop, Args::new(4, 1)),
        code => {
            let mut entry = main_entry(code, x, t);
            entry.args.t += 4;
            entry.args.size += 1;
            entry.args.r_inc = 2;
            entry
        }
    })
}

fn cb_entry(code: u8, t: &'static FlagTables) -> Opcode {
    let y = (code >> 3) & 7;
    let z = code & 7;
    let base = Args { r1: reg(z, HL), ..Args::new(8, 2).prefixed() };

    match code >> 6 {
        0 => {
            let (table, carry) = rot_op(y, t);
            let args = Args { table, carry, ..base };
            if z == 6 {
                op(S::rot_mem, Args { t: 15, ..args })
            } else {
                op(S::rot_r, args)
            }
        }
        1 => {
            let args = Args { n: y, ..base };
            if z == 6 {
                op(S::bit_mem, Args { t: 12, ..args })
            } else {
                op(S::bit_r, args)
            }
        }
        kind => {
            let (n, m) = if kind == 2 { (!(1 << y), 0) } else { (0xFF, 1 << y) };
            let args = Args { n, m, ..base };
            if z == 6 {
                op(S::res_set_mem, Args { t: 15, ..args })
            } else {
                op(S::res_set_r, args)
            }
        }
    }
}

/// DDCB/FDCB: `prefix CB d op`. Every form works on (IX+d)/(IY+d); all but
/// BIT also copy the result into register `z` unless `z` is 6.
fn xycb_entry(code: u8, x: Index, t: &'static FlagTables) -> Opcode {
    let y = (code >> 3) & 7;
    let z = code & 7;
    let base = Args {
        r1: reg(z, HL),
        hl: x.hi,
        indexed: true,
        ..Args::new(23, 4).prefixed()
    };

    match code >> 6 {
        0 => {
            let (table, carry) = rot_op(y, t);
            let args = Args { table, carry, ..base };
            if z == 6 {
                op(S::rot_mem, args)
            } else {
                op(S::rot_mem_r, args)
            }
        }
        1 => op(S::bit_mem, Args { n: y, t: 20, ..base }),
        kind => {
            let (n, m) = if kind == 2 { (!(1 << y), 0) } else { (0xFF, 1 << y) };
            let args = Args { n, m, ..base };
            if z == 6 {
                op(S::res_set_mem, args)
            } else {
                op(S::res_set_mem_r, args)
            }
        }
    }
}

fn ed_entry(code: u8, t: &'static FlagTables) -> Opcode {
    let y = (code >> 3) & 7;
    let z = code & 7;
    let p = y >> 1;
    let base = Args::new(8, 2).prefixed();

    match code {
        0x40..=0x7F => match z {
            0 if y == 6 => op(S::in_f_c, Args { t: 12, ..base }),
            0 => op(S::in_r_c, Args { r1: reg(y, HL), t: 12, ..base }),
            1 if y == 6 => op(S::out_c_0, Args { t: 12, ..base }),
            1 => op(S::out_c_r, Args { r2: reg(y, HL), t: 12, ..base }),
            2 if y & 1 == 0 => op(S::sbc_hl, Args { r2: rp(p, HL), t: 15, ..base }),
            2 => op(S::adc_hl, Args { r2: rp(p, HL), t: 15, ..base }),
            3 if y & 1 == 0 => op(S::ld_mem_nn_rr, Args { r1: rp(p, HL), t: 20, size: 4, ..base }),
            3 => op(S::ld_rr_mem_nn, Args { r1: rp(p, HL), t: 20, size: 4, ..base }),
            4 => op(S::neg, Args { table: &t.neg, ..base }),
            5 => op(S::retn, Args { t: 14, ..base }),
            6 => {
                let mode = match y & 3 {
                    0 | 1 => 0,
                    2 => 1,
                    _ => 2,
                };
                op(S::set_interrupt_mode, Args { n: mode, ..base })
            }
            _ => match y {
                0 => op(S::ld_r_r, Args { r1: I, r2: A, t: 9, ..base }),
                1 => op(S::ld_r_a, Args { t: 9, ..base }),
                2 => op(S::ld_a_ir, Args { r2: I, t: 9, ..base }),
                3 => op(S::ld_a_ir, Args { r2: R, t: 9, ..base }),
                4 => op(S::rrd, Args { t: 18, ..base }),
                5 => op(S::rld, Args { t: 18, ..base }),
                _ => op(S::nop, base),
            },
        },
        0xA0..=0xBF if z <= 3 && y >= 4 => {
            let args = Args {
                // +1 for the I forms, -1 for the D forms.
                n: if y & 1 == 0 { 1 } else { 0xFF },
                t: 16,
                ..base
            };
            let repeat = y >= 6;
            let handler: fn(&mut S, Args) = match (z, repeat) {
                (0, false) => S::ldi,
                (0, true) => S::ldir,
                (1, false) => S::cpi,
                (1, true) => S::cpir,
                (2, false) => S::ini,
                (2, true) => S::inir,
                (_, false) => S::outi,
                (_, true) => S::otir,
            };
            op(handler, args)
        }
        _ => op(S::nop, base),
    }
}

/// All seven tables: main, CB, ED, DD, FD, DDCB and FDCB.
pub(crate) struct DispatchTables {
    pub main: [Opcode; 256],
    pub cb: [Opcode; 256],
    pub ed: [Opcode; 256],
    pub dd: [Opcode; 256],
    pub fd: [Opcode; 256],
    pub ddcb: [Opcode; 256],
    pub fdcb: [Opcode; 256],
}

impl DispatchTables {
    pub(crate) fn new(t: &'static FlagTables, config: &Config) -> Box<Self> {
        let mut tables = Box::new(Self {
            main: array::from_fn(|i| main_entry(i as u8, HL, t)),
            cb: array::from_fn(|i| cb_entry(i as u8, t)),
            ed: array::from_fn(|i| ed_entry(i as u8, t)),
            dd: index_table(IX, t),
            fd: index_table(IY, t),
            ddcb: array::from_fn(|i| xycb_entry(i as u8, IX, t)),
            fdcb: array::from_fn(|i| xycb_entry(i as u8, IY, t)),
        });

        if config.fast_djnz {
            log::trace!("installing fast DJNZ");
            tables.main[0x10].handler = S::djnz_fast;
        }
        if config.fast_ldir {
            log::trace!("installing fast LDIR/LDDR");
            tables.ed[0xB0].handler = S::ldir_fast;
            tables.ed[0xB8].handler = S::ldir_fast;
        }
        tables
    }
}
