//! Tests T-states of every op-code in each of the op-code tables.
//!
//! Each op-code is executed once on a fresh Cpu with empty Flags, `SP=0x8000`
//! and zeroed operands. With no Flags set, `NZ`, `NC`, `PO` and `P` conditions
//! are met, while `Z`, `C`, `PE` and `M` are not.
use core::num::NonZeroU8;
use z80nemu::*;

/// Counts T-states together with the M1 cycles.
#[derive(Clone, Copy, Debug, Default)]
struct M1Counter {
    tsc: TsCounter<u64>,
    m1: u32,
}

impl Clock for M1Counter {
    type Limit = u64;
    type Timestamp = u64;

    fn is_past_limit(&self, limit: Self::Limit) -> bool {
        self.tsc.is_past_limit(limit)
    }

    fn add_irq(&mut self, _pc: u16) -> u64 {
        panic!("no irq expected");
    }

    fn add_no_mreq(&mut self, address: u16, add_ts: NonZeroU8) {
        self.tsc.add_no_mreq(address, add_ts)
    }

    fn add_io(&mut self, port: u16) -> u64 {
        self.tsc.add_io(port)
    }

    fn add_mreq(&mut self, address: u16) -> u64 {
        self.tsc.add_mreq(address)
    }

    fn add_m1(&mut self, address: u16) -> u64 {
        self.m1 += 1;
        self.tsc.add_m1(address)
    }

    fn as_timestamp(&self) -> u64 {
        self.tsc.as_timestamp()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Step {
    tacts: u64,
    pc: u16,
    m1: u32,
}

fn step_with(code: &[u8], extended: bool, setup: impl FnOnce(&mut Z80)) -> Step {
    let mut cpu = Z80::new();
    cpu.set_af(0);
    cpu.set_sp(0x8000);
    cpu.set_extended_instructions(extended);
    setup(&mut cpu);
    let mut bus = Bus::new();
    bus.set_access_log(false);
    bus.load(0, code);
    let mut clock = M1Counter::default();
    cpu.execute_next(&mut bus, &mut clock);
    assert_eq!(u32::from(cpu.get_r()), clock.m1, "{:02X?}: R", code);
    Step { tacts: clock.as_timestamp(), pc: cpu.get_pc(), m1: clock.m1 }
}

fn step(code: &[u8], extended: bool) -> Step {
    step_with(code, extended, |_| {})
}

fn is_prefix(code: u8) -> bool {
    matches!(code, 0xCB|0xDD|0xED|0xFD)
}

// prefixes are 0
const MAIN_TACTS: [u8; 256] = [
/*      0   1   2   3   4   5   6   7   8   9   A   B   C   D   E   F */
/*0*/   4, 10,  7,  6,  4,  4,  7,  4,  4, 11,  7,  6,  4,  4,  7,  4,
/*1*/  13, 10,  7,  6,  4,  4,  7,  4, 12, 11,  7,  6,  4,  4,  7,  4,
/*2*/  12, 10, 16,  6,  4,  4,  7,  4,  7, 11, 16,  6,  4,  4,  7,  4,
/*3*/  12, 10, 13,  6, 11, 11, 10,  4,  7, 11, 13,  6,  4,  4,  7,  4,
/*4*/   4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4,
/*5*/   4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4,
/*6*/   4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4,
/*7*/   7,  7,  7,  7,  7,  7,  4,  7,  4,  4,  4,  4,  4,  4,  7,  4,
/*8*/   4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4,
/*9*/   4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4,
/*A*/   4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4,
/*B*/   4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4,
/*C*/  11, 10, 10, 10, 17, 11,  7, 11,  5, 10, 10,  0, 10, 17,  7, 11,
/*D*/  11, 10, 10, 11, 17, 11,  7, 11,  5,  4, 10, 11, 10,  0,  7, 11,
/*E*/  11, 10, 10, 19, 17, 11,  7, 11,  5,  4, 10,  4, 10,  0,  7, 11,
/*F*/  11, 10, 10,  4, 17, 11,  7, 11,  5,  6, 10,  4, 10,  0,  7, 11,
];

// PC after the op-code executed at 0
const MAIN_PC: [u8; 256] = [
/*      0   1   2   3   4   5   6   7   8   9   A   B   C   D   E   F */
/*0*/   1,  3,  1,  1,  1,  1,  2,  1,  1,  1,  1,  1,  1,  1,  2,  1,
/*1*/   2,  3,  1,  1,  1,  1,  2,  1,  2,  1,  1,  1,  1,  1,  2,  1,
/*2*/   2,  3,  3,  1,  1,  1,  2,  1,  2,  1,  3,  1,  1,  1,  2,  1,
/*3*/   2,  3,  3,  1,  1,  1,  2,  1,  2,  1,  3,  1,  1,  1,  2,  1,
/*4*/   1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,
/*5*/   1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,
/*6*/   1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,
/*7*/   1,  1,  1,  1,  1,  1,  0,  1,  1,  1,  1,  1,  1,  1,  1,  1,
/*8*/   1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,
/*9*/   1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,
/*A*/   1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,
/*B*/   1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,  1,
/*C*/   0,  1,  0,  0,  0,  1,  2,  0,  1,  0,  3,  0,  3,  0,  2,  8,
/*D*/   0,  1,  0,  2,  0,  1,  2, 16,  1,  1,  3,  2,  3,  0,  2, 24,
/*E*/   0,  1,  0,  1,  0,  1,  2, 32,  1,  0,  3,  1,  3,  0,  2, 40,
/*F*/   0,  1,  0,  1,  0,  1,  2, 48,  1,  1,  3,  1,  3,  0,  2, 56,
];

/// Op-codes which leave PC at the branch target regardless of a prefix.
fn is_taken_jump(code: u8) -> bool {
    matches!(code, 0xC0|0xC2|0xC3|0xC4|0xC9|0xCD|0xD0|0xD2|0xD4|0xE0|0xE2|0xE4|0xE9|0xF0|0xF2|0xF4)
        || code & 0b11_000_111 == 0b11_000_111
}

/// `LD`, `INC`, `DEC` and the ALU op-codes with a `(HL)` operand, except `HALT`.
fn has_mem_operand(code: u8) -> bool {
    match code {
        0x34..=0x36 => true,
        0x76 => false,
        0x40..=0x7F => code & 0b111 == 0b110 || code & 0b111_000 == 0b110_000,
        0x80..=0xBF => code & 0b111 == 0b110,
        _ => false
    }
}

fn ed_expected(code: u8, extended: bool) -> (u64, u16) {
    if extended {
        match code {
            0x23|0x24|0x28..=0x2C|0x30..=0x33|0x93..=0x95 => return (8, 2),
            0x27 => return (11, 3),
            0x34..=0x36 => return (16, 4),
            0x8A => return (23, 4),
            0x90 => return (16, 2),
            0x91 => return (20, 4),
            0x92 => return (17, 3),
            0x98 => return (13, 0),
            0xA4|0xAC => return (16, 2),
            0xA5 => return (14, 2),
            0xB4|0xB7|0xBC => return (21, 0),
            _ => {}
        }
    }
    match code {
        0x40..=0x7F => match code & 0b111 {
            0b000|0b001 => (12, 2),
            0b010 => (15, 2),
            0b011 => (20, 4),
            0b101 => (14, 0),
            0b111 => match code {
                0x47|0x4F|0x57|0x5F => (9, 2),
                0x67|0x6F => (18, 2),
                _ => (8, 2)
            },
            _ => (8, 2)
        },
        0xA0..=0xA3|0xA8..=0xAB => (16, 2),
        0xB0..=0xB3|0xB8..=0xBB => (21, 0),
        _ => (8, 2)
    }
}

#[test]
fn main_cycles_work() {
    for code in (0..=255u8).filter(|&code| !is_prefix(code)) {
        let step = step(&[code], false);
        assert_eq!(step.tacts, u64::from(MAIN_TACTS[code as usize]), "{:02X}: T", code);
        assert_eq!(step.pc, u16::from(MAIN_PC[code as usize]), "{:02X}: PC", code);
        assert_eq!(step.m1, 1, "{:02X}: M1", code);
    }
}

#[test]
fn bit_cycles_work() {
    for code in 0..=255u8 {
        let expected = match (code >> 6, code & 0b111) {
            (0b01, 0b110) => 12,
            (_, 0b110) => 15,
            _ => 8
        };
        let step = step(&[0xCB, code], false);
        assert_eq!(step, Step { tacts: expected, pc: 2, m1: 2 }, "CB {:02X}", code);
    }
}

#[test]
fn extended_cycles_work() {
    for extended in [false, true] {
        for code in 0..=255u8 {
            let (tacts, pc) = ed_expected(code, extended);
            let step = step(&[0xED, code], extended);
            assert_eq!(step, Step { tacts, pc, m1: 2 }, "ED {:02X} Z80N: {}", code, extended);
        }
    }
}

#[test]
fn block_ops_end_without_rewinding() {
    let set_counters = |cpu: &mut Z80| {
        cpu.set_reg16(Reg16::BC, 0x0101);
        // CPIR and CPDR find the op-code byte at (HL)
        cpu.set_acc(0xED);
    };
    for code in [0xB0, 0xB1, 0xB2, 0xB3, 0xB8, 0xB9, 0xBA, 0xBB] {
        let step = step_with(&[0xED, code], false, |cpu| {
            set_counters(cpu);
            if code & 0b10 == 0 {
                cpu.set_reg16(Reg16::BC, 1);
            }
        });
        assert_eq!(step, Step { tacts: 16, pc: 2, m1: 2 }, "ED {:02X}", code);
    }
    for code in [0xB4, 0xB7, 0xBC] {
        let step = step_with(&[0xED, code], true, |cpu| cpu.set_reg16(Reg16::BC, 1));
        assert_eq!(step, Step { tacts: 16, pc: 2, m1: 2 }, "ED {:02X}", code);
    }
    // CPIR stops on a match even when BC is not exhausted
    let step = step_with(&[0xED, 0xB1], false, set_counters);
    assert_eq!(step.tacts, 16);
}

#[test]
fn index_cycles_work() {
    for prefix in [0xDD, 0xFD] {
        for code in (0..=255u8).filter(|&code| !is_prefix(code)) {
            let (tacts, pc) = match code {
                0x34|0x35 => (23, 3),
                0x36 => (19, 4),
                code if has_mem_operand(code) => (19, 3),
                code => {
                    let pc = MAIN_PC[code as usize];
                    (4 + MAIN_TACTS[code as usize], if is_taken_jump(code) { pc } else { pc + 1 })
                }
            };
            let step = step(&[prefix, code], false);
            assert_eq!(step, Step { tacts: tacts.into(), pc: pc.into(), m1: 2 },
                       "{:02X} {:02X}", prefix, code);
        }
    }
    // HALT keeps PC on its op-code, after the prefix
    assert_eq!(step(&[0xDD, 0x76], false), Step { tacts: 8, pc: 1, m1: 2 });
}

#[test]
fn index_bit_cycles_work() {
    for prefix in [0xDD, 0xFD] {
        for code in 0..=255u8 {
            let tacts = if code >> 6 == 0b01 { 20 } else { 23 };
            let step = step(&[prefix, 0xCB, 0x00, code], false);
            assert_eq!(step, Step { tacts, pc: 4, m1: 2 }, "{:02X} CB 00 {:02X}", prefix, code);
        }
    }
}

#[test]
fn prefix_runs_work() {
    for n in 1..=4usize {
        for first in [0xDD, 0xFD] {
            let mut code: Vec<u8> = (0..n).map(|i| if i % 2 == 0 { first } else { first ^ 0x20 }).collect();
            code.extend_from_slice(&[0x21, 0x00, 0x00]); // LD ii,0
            let step = step(&code, false);
            assert_eq!(step, Step { tacts: 4 * (n as u64 - 1) + 14, pc: n as u16 + 3, m1: n as u32 + 1 },
                       "{:02X?}", code);
        }
    }
    // the index prefix before ED is dropped
    assert_eq!(step(&[0xDD, 0xED, 0x44], false), Step { tacts: 12, pc: 3, m1: 3 });
    assert_eq!(step(&[0xFD, 0xED, 0x23], false), Step { tacts: 12, pc: 3, m1: 3 });
    assert_eq!(step(&[0xFD, 0xED, 0x23], true), Step { tacts: 12, pc: 3, m1: 3 });
}
