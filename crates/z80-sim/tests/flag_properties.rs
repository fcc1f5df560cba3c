//! Exhaustive checks of flag behaviour and register invariants.

mod common;

use common::{ORG, reg, sim, sim_with};
use z80_sim::{CF, Config, HF, InitialState, Memory, NF, PF, SF, Simulator, ZF};

#[test]
fn add_a_n_flags_for_all_operands() {
    let mut sim = sim(&[0xC6, 0x00], &[]);
    for a in 0..=255u8 {
        for b in 0..=255u8 {
            sim.memory_mut().poke(ORG + 1, b);
            sim.set_register("A", u64::from(a)).unwrap();
            sim.run(Some(ORG), None);

            let sum = u16::from(a) + u16::from(b);
            let result = sum as u8;
            let f = reg(&sim, "F") as u8;
            assert_eq!(reg(&sim, "A") as u8, result);
            assert_eq!(f & SF != 0, result & 0x80 != 0, "S {a:02X}+{b:02X}");
            assert_eq!(f & ZF != 0, result == 0, "Z {a:02X}+{b:02X}");
            assert_eq!(f & HF != 0, (a & 0x0F) + (b & 0x0F) > 0x0F, "H {a:02X}+{b:02X}");
            assert_eq!(f & CF != 0, sum > 0xFF, "C {a:02X}+{b:02X}");
            let overflow = (a ^ result) & (b ^ result) & 0x80 != 0;
            assert_eq!(f & PF != 0, overflow, "V {a:02X}+{b:02X}");
            assert_eq!(f & NF, 0);
        }
    }
}

#[test]
fn inc_and_dec_preserve_carry() {
    let names = ["B", "C", "D", "E", "H", "L", "", "A"];
    let mut sim = sim(&[0x00], &[]);
    for (code, name) in names.iter().enumerate() {
        if name.is_empty() {
            continue;
        }
        for opcode in [0x04 | (code as u8) << 3, 0x05 | (code as u8) << 3] {
            sim.memory_mut().poke(ORG, opcode);
            for value in 0..=255u64 {
                for carry in [0, CF] {
                    sim.set_register(name, value).unwrap();
                    sim.set_register("F", u64::from(carry)).unwrap();
                    sim.run(Some(ORG), None);
                    assert_eq!(
                        reg(&sim, "F") as u8 & CF,
                        carry,
                        "{opcode:02X} on {name}={value:02X}"
                    );
                }
            }
        }
    }
}

#[test]
fn inc_and_dec_memory_preserve_carry() {
    for opcode in [0x34, 0x35] {
        for carry in [0, CF] {
            let mut sim = sim(&[opcode], &[("HL", 0x9000), ("F", u64::from(carry))]);
            sim.memory_mut().poke(0x9000, 0xFF);
            sim.run(None, None);
            assert_eq!(reg(&sim, "F") as u8 & CF, carry);
        }
    }
}

#[test]
fn rlca_rrca_round_trip() {
    // RLCA : RRCA, then RRCA : RLCA
    for code in [[0x07, 0x0F], [0x0F, 0x07]] {
        let mut sim = sim(&code, &[]);
        for a in 0..=255u8 {
            for carry in [0, CF] {
                sim.set_register("A", u64::from(a)).unwrap();
                sim.set_register("F", u64::from(carry)).unwrap();
                sim.run(Some(ORG), Some(ORG + 2));
                assert_eq!(reg(&sim, "A") as u8, a);
                // The carry out of the second rotate is the bit the first
                // rotate moved round.
                let expected = if code[0] == 0x07 { a >> 7 } else { a & 1 };
                assert_eq!(reg(&sim, "F") as u8 & CF, expected);
            }
        }
    }
}

#[test]
fn rla_rra_round_trip_restores_carry() {
    for code in [[0x17, 0x1F], [0x1F, 0x17]] {
        let mut sim = sim(&code, &[]);
        for a in 0..=255u8 {
            for carry in [0, CF] {
                sim.set_register("A", u64::from(a)).unwrap();
                sim.set_register("F", u64::from(carry)).unwrap();
                sim.run(Some(ORG), Some(ORG + 2));
                assert_eq!(reg(&sim, "A") as u8, a);
                assert_eq!(reg(&sim, "F") as u8 & CF, carry);
            }
        }
    }
}

/// Run one instruction outside the interrupt window and return R.
fn r_after(code: &[u8], start_r: u64) -> u64 {
    let state = InitialState { tstates: 1000, ..InitialState::default() };
    let mut sim = sim_with(code, &[("R", start_r)], state, Config::default());
    sim.run(None, None);
    reg(&sim, "R")
}

#[test]
fn r_increments_by_one_for_unprefixed_opcodes() {
    for opcode in 0..=255u8 {
        if matches!(opcode, 0xCB | 0xDD | 0xED | 0xFD) {
            continue;
        }
        assert_eq!(r_after(&[opcode], 0xFF), 0x80, "{opcode:02X}");
    }
}

#[test]
fn r_increments_by_two_for_prefixed_opcodes() {
    for opcode in 0..=255u8 {
        assert_eq!(r_after(&[0xCB, opcode], 0xFE), 0x80, "CB {opcode:02X}");
        // LD R,A overwrites R
        if opcode != 0x4F {
            assert_eq!(r_after(&[0xED, opcode], 0xFE), 0x80, "ED {opcode:02X}");
        }
        assert_eq!(r_after(&[0xDD, 0xCB, 0x00, opcode], 0xFE), 0x80, "DDCB {opcode:02X}");
        assert_eq!(r_after(&[0xFD, 0xCB, 0x00, opcode], 0xFE), 0x80, "FDCB {opcode:02X}");
        if !matches!(opcode, 0xCB | 0xDD | 0xED | 0xFD) {
            assert_eq!(r_after(&[0xDD, opcode], 0xFE), 0x80, "DD {opcode:02X}");
            assert_eq!(r_after(&[0xFD, opcode], 0xFE), 0x80, "FD {opcode:02X}");
        }
    }
}

#[test]
fn r_keeps_bit_7_clear() {
    assert_eq!(r_after(&[0x00], 0x7F), 0x00);
    assert_eq!(r_after(&[0xED, 0x00], 0x7E), 0x00);
}

#[test]
fn one_byte_instruction_at_ffff_wraps_pc() {
    for opcode in [0x00, 0x3C, 0x78, 0xA8, 0x2F] {
        let mut memory = Memory::new();
        memory.poke(0xFFFF, opcode);
        let mut sim = Simulator::from_memory(memory);
        sim.run(Some(0xFFFF), None);
        assert_eq!(reg(&sim, "PC"), 0, "{opcode:02X}");
    }
}

#[test]
fn rom_is_never_written() {
    let cases: &[(&[u8], &[(&str, u64)])] = &[
        (&[0x36, 0x11], &[]),                         // LD (HL),n
        (&[0x70], &[("B", 0x11)]),                    // LD (HL),B
        (&[0x02], &[("BC", 0x2000), ("A", 0x11)]),    // LD (BC),A
        (&[0x32, 0x00, 0x30], &[("A", 0x11)]),        // LD (nn),A
        (&[0x22, 0x00, 0x30], &[]),                   // LD (nn),HL
        (&[0xED, 0x43, 0x00, 0x30], &[("BC", 0x1111)]), // LD (nn),BC
        (&[0x34], &[]),                               // INC (HL)
        (&[0x35], &[]),                               // DEC (HL)
        (&[0xCB, 0x06], &[]),                         // RLC (HL)
        (&[0xCB, 0xC6], &[]),                         // SET 0,(HL)
        (&[0xCB, 0x86], &[]),                         // RES 0,(HL)
        (&[0xDD, 0x36, 0x01, 0x11], &[("IX", 0x1000)]), // LD (IX+1),n
        (&[0xDD, 0xCB, 0x01, 0xC6], &[("IX", 0x1000)]), // SET 0,(IX+1)
        (&[0xFD, 0x34, 0x00], &[("IY", 0x1000)]),     // INC (IY+0)
        (&[0xED, 0xA0], &[("DE", 0x2000), ("BC", 1)]), // LDI
        (&[0xED, 0xB0], &[("DE", 0x2000), ("BC", 8)]), // LDIR
        (&[0xED, 0x67], &[]),                         // RRD
        (&[0xED, 0x6F], &[]),                         // RLD
        (&[0xED, 0xA2], &[("B", 1)]),                 // INI
        (&[0xC5], &[("SP", 0x2000), ("BC", 0x1111)]), // PUSH BC
        (&[0xCD, 0x00, 0x90], &[("SP", 0x2000)]),     // CALL nn
        (&[0xE3], &[("SP", 0x2000)]),                 // EX (SP),HL
        (&[0xC7], &[("SP", 0x2000)]),                 // RST 0
    ];

    for &(code, registers) in cases {
        let mut memory = Memory::filled(0x5A);
        memory.load(ORG, code);
        let mut regs = vec![("PC", u64::from(ORG)), ("HL", 0x1000), ("A", 0x11)];
        regs.extend_from_slice(registers);
        let mut sim = Simulator::new(memory, regs, InitialState::default(), Config::default())
            .unwrap();
        for _ in 0..8 {
            sim.run(None, None);
        }
        assert!(
            sim.memory().as_slice()[..0x4000].iter().all(|&b| b == 0x5A),
            "{code:02X?} wrote to ROM"
        );
    }
}
