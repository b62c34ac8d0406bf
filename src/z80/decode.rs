/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! Op-code descriptor tables.
//!
//! Each opcode space has a `[descriptor; 256]` table evaluated at compile time.
//! The dispatcher indexes a table with the fetched op-code and hands the
//! descriptor to its handler.
use crate::cpu::*;
use super::internal::BlockDelta;

/// An 8-bit operand selected by bits `0..=2` or `3..=5` of an op-code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Operand {
    Reg(Reg8),
    /// `(HL)`, or `(IX+d)`/`(IY+d)` after an index prefix.
    Mem,
}

impl Operand {
    const fn from_code(code: u8) -> Self {
        match Reg8::from_code(code) {
            Some(reg) => Operand::Reg(reg),
            None => Operand::Mem
        }
    }
}

/// Main op-code table descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    Nop,
    LdRpNn(Reg16),
    /// `LD (BC),A` or `LD (DE),A`.
    LdIndA(Reg16),
    /// `LD A,(BC)` or `LD A,(DE)`.
    LdAInd(Reg16),
    IncRp(Reg16),
    DecRp(Reg16),
    Inc(Operand),
    Dec(Operand),
    LdN(Operand),
    Rlca,
    Rrca,
    Rla,
    Rra,
    ExAf,
    AddHlRp(Reg16),
    Djnz,
    Jr,
    JrCc(Condition),
    LdNnHl,
    LdHlNn,
    LdNnA,
    LdANn,
    Daa,
    Cpl,
    Scf,
    Ccf,
    /// `LD dst,src`, never both [Operand::Mem].
    Ld(Operand, Operand),
    Halt,
    Alu(Ops8, Operand),
    AluN(Ops8),
    RetCc(Condition),
    Pop(StkReg16),
    JpCc(Condition),
    Jp,
    CallCc(Condition),
    Push(StkReg16),
    Rst(u16),
    Ret,
    Call,
    OutNA,
    InAN,
    Exx,
    ExSpHl,
    JpHl,
    ExDeHl,
    Di,
    LdSpHl,
    Ei,
    PrefixCb,
    PrefixEd,
    PrefixIndex(Prefix),
}

/// The kind of a block instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockKind {
    Ld,
    Cp,
    In,
    Out,
}

/// A descriptor of the `LDI`..`OTDR` family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BlockOp {
    pub kind: BlockKind,
    pub delta: BlockDelta,
    pub repeat: bool,
}

/// ZX Spectrum Next extended op-codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NextOp {
    SwapNib,
    MirrorA,
    TestN,
    BslaDeB,
    BsraDeB,
    BsrlDeB,
    BsrfDeB,
    BrlcDeB,
    MulDE,
    /// `ADD HL,A`, `ADD DE,A` or `ADD BC,A`.
    AddRpA(Reg16),
    /// `ADD HL,nn`, `ADD DE,nn` or `ADD BC,nn`.
    AddRpNn(Reg16),
    PushNn,
    OutInB,
    NextRegNn,
    NextRegA,
    PixelDn,
    PixelAd,
    SetAE,
    JpC,
    Ldix,
    Ldws,
    Lddx,
    Ldirx,
    Ldpirx,
    Lddrx,
}

/// `0xED` op-code table descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EdOp {
    /// An undefined op-code: a 2 byte `NOP`.
    Nop,
    /// `IN r,(C)`, `None` for `IN F,(C)`.
    InC(Option<Reg8>),
    /// `OUT (C),r`, `None` for `OUT (C),0`.
    OutC(Option<Reg8>),
    SbcHl(Reg16),
    AdcHl(Reg16),
    LdNnRp(Reg16),
    LdRpNn(Reg16),
    Neg,
    Retn,
    Reti,
    Im(InterruptMode),
    LdIA,
    LdRA,
    LdAI,
    LdAR,
    Rrd,
    Rld,
    Block(BlockOp),
    Next(NextOp),
}

/// `0xCB` op-code table descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BitOp {
    Rot(Rot, Operand),
    Bit(u8, Operand),
    Res(u8, Operand),
    Set(u8, Operand),
}

impl BitOp {
    /// The operand field of the op-code.
    pub(crate) fn operand(self) -> Operand {
        match self {
            BitOp::Rot(_, arg)|BitOp::Bit(_, arg)|BitOp::Res(_, arg)|BitOp::Set(_, arg) => arg
        }
    }
}

pub(crate) static MAIN_OPS: [Op; 256] = build_table!(Op::Nop, decode_main);
pub(crate) static ED_OPS: [EdOp; 256] = build_table!(EdOp::Nop, decode_ed);
pub(crate) static BIT_OPS: [BitOp; 256] = build_table!(BitOp::Rot(Rot::RLC, Operand::Reg(Reg8::B)), decode_cb);

const fn decode_main(code: u8) -> Op {
    let rp = Reg16::from_code(code);
    let dst = Operand::from_code(code >> 3);
    let src = Operand::from_code(code);
    let cc = Condition::from_code(code);
    match code >> 6 {
        0b00 => match code & 0b111 {
            0b000 => match code >> 3 {
                0 => Op::Nop,
                1 => Op::ExAf,
                2 => Op::Djnz,
                3 => Op::Jr,
                _ => Op::JrCc(Condition::from_jr_subset(code))
            },
            0b001 if code & 0b1000 == 0 => Op::LdRpNn(rp),
            0b001 => Op::AddHlRp(rp),
            0b010 => match (code >> 3) & 0b111 {
                0 => Op::LdIndA(Reg16::BC),
                1 => Op::LdAInd(Reg16::BC),
                2 => Op::LdIndA(Reg16::DE),
                3 => Op::LdAInd(Reg16::DE),
                4 => Op::LdNnHl,
                5 => Op::LdHlNn,
                6 => Op::LdNnA,
                _ => Op::LdANn
            },
            0b011 if code & 0b1000 == 0 => Op::IncRp(rp),
            0b011 => Op::DecRp(rp),
            0b100 => Op::Inc(dst),
            0b101 => Op::Dec(dst),
            0b110 => Op::LdN(dst),
            _ => match (code >> 3) & 0b111 {
                0 => Op::Rlca,
                1 => Op::Rrca,
                2 => Op::Rla,
                3 => Op::Rra,
                4 => Op::Daa,
                5 => Op::Cpl,
                6 => Op::Scf,
                _ => Op::Ccf
            }
        },
        0b01 => match (dst, src) {
            (Operand::Mem, Operand::Mem) => Op::Halt,
            _ => Op::Ld(dst, src)
        },
        0b10 => Op::Alu(Ops8::from_code(code), src),
        _ => match code & 0b111 {
            0b000 => Op::RetCc(cc),
            0b001 => match (code >> 3) & 0b111 {
                1 => Op::Ret,
                3 => Op::Exx,
                5 => Op::JpHl,
                7 => Op::LdSpHl,
                _ => Op::Pop(StkReg16::from_code(code))
            },
            0b010 => Op::JpCc(cc),
            0b011 => match (code >> 3) & 0b111 {
                0 => Op::Jp,
                1 => Op::PrefixCb,
                2 => Op::OutNA,
                3 => Op::InAN,
                4 => Op::ExSpHl,
                5 => Op::ExDeHl,
                6 => Op::Di,
                _ => Op::Ei
            },
            0b100 => Op::CallCc(cc),
            0b101 => match (code >> 3) & 0b111 {
                1 => Op::Call,
                3 => Op::PrefixIndex(Prefix::Xdd),
                5 => Op::PrefixEd,
                7 => Op::PrefixIndex(Prefix::Yfd),
                _ => Op::Push(StkReg16::from_code(code))
            },
            0b110 => Op::AluN(Ops8::from_code(code)),
            _ => Op::Rst(parse_restart_address(code))
        }
    }
}

const fn block(kind: BlockKind, delta: BlockDelta, repeat: bool) -> EdOp {
    EdOp::Block(BlockOp { kind, delta, repeat })
}

const fn decode_ed(code: u8) -> EdOp {
    let rp = Reg16::from_code(code);
    match code {
        0x23 => EdOp::Next(NextOp::SwapNib),
        0x24 => EdOp::Next(NextOp::MirrorA),
        0x27 => EdOp::Next(NextOp::TestN),
        0x28 => EdOp::Next(NextOp::BslaDeB),
        0x29 => EdOp::Next(NextOp::BsraDeB),
        0x2A => EdOp::Next(NextOp::BsrlDeB),
        0x2B => EdOp::Next(NextOp::BsrfDeB),
        0x2C => EdOp::Next(NextOp::BrlcDeB),
        0x30 => EdOp::Next(NextOp::MulDE),
        0x31 => EdOp::Next(NextOp::AddRpA(Reg16::HL)),
        0x32 => EdOp::Next(NextOp::AddRpA(Reg16::DE)),
        0x33 => EdOp::Next(NextOp::AddRpA(Reg16::BC)),
        0x34 => EdOp::Next(NextOp::AddRpNn(Reg16::HL)),
        0x35 => EdOp::Next(NextOp::AddRpNn(Reg16::DE)),
        0x36 => EdOp::Next(NextOp::AddRpNn(Reg16::BC)),
        0x8A => EdOp::Next(NextOp::PushNn),
        0x90 => EdOp::Next(NextOp::OutInB),
        0x91 => EdOp::Next(NextOp::NextRegNn),
        0x92 => EdOp::Next(NextOp::NextRegA),
        0x93 => EdOp::Next(NextOp::PixelDn),
        0x94 => EdOp::Next(NextOp::PixelAd),
        0x95 => EdOp::Next(NextOp::SetAE),
        0x98 => EdOp::Next(NextOp::JpC),
        0xA4 => EdOp::Next(NextOp::Ldix),
        0xA5 => EdOp::Next(NextOp::Ldws),
        0xAC => EdOp::Next(NextOp::Lddx),
        0xB4 => EdOp::Next(NextOp::Ldirx),
        0xB7 => EdOp::Next(NextOp::Ldpirx),
        0xBC => EdOp::Next(NextOp::Lddrx),
        0x40..=0x7F => match code & 0b111 {
            0b000 => EdOp::InC(Reg8::from_code(code >> 3)),
            0b001 => EdOp::OutC(Reg8::from_code(code >> 3)),
            0b010 if code & 0b1000 == 0 => EdOp::SbcHl(rp),
            0b010 => EdOp::AdcHl(rp),
            0b011 if code & 0b1000 == 0 => EdOp::LdNnRp(rp),
            0b011 => EdOp::LdRpNn(rp),
            0b100 => EdOp::Neg,
            0b101 if code == 0x4D => EdOp::Reti,
            0b101 => EdOp::Retn,
            0b110 => match (code >> 3) & 0b11 {
                0 | 1 => EdOp::Im(InterruptMode::Mode0),
                2 => EdOp::Im(InterruptMode::Mode1),
                _ => EdOp::Im(InterruptMode::Mode2)
            },
            _ => match (code >> 3) & 0b111 {
                0 => EdOp::LdIA,
                1 => EdOp::LdRA,
                2 => EdOp::LdAI,
                3 => EdOp::LdAR,
                4 => EdOp::Rrd,
                5 => EdOp::Rld,
                _ => EdOp::Nop
            }
        },
        0xA0..=0xBF if code & 0b100 == 0 => {
            let kind = match code & 0b11 {
                0 => BlockKind::Ld,
                1 => BlockKind::Cp,
                2 => BlockKind::In,
                _ => BlockKind::Out
            };
            let delta = if code & 0b1000 == 0 { BlockDelta::Increase } else { BlockDelta::Decrease };
            block(kind, delta, code & 0b1_0000 != 0)
        }
        _ => EdOp::Nop
    }
}

const fn decode_cb(code: u8) -> BitOp {
    let arg = Operand::from_code(code);
    let n = parse_bit_number(code);
    match code >> 6 {
        0b00 => BitOp::Rot(Rot::from_code(code), arg),
        0b01 => BitOp::Bit(n, arg),
        0b10 => BitOp::Res(n, arg),
        _ => BitOp::Set(n, arg)
    }
}
