/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! Arithmetic, logic, bit and block operations.
//!
//! Every function is pure: it takes the operands and the current Flags, and returns
//! the result together with the new Flags. Instruction handlers never compute
//! Flags on their own.
use crate::cpu::{CpuFlags, Ops8, Rot};

const SIGN8: u8 = 0x80;
const SIGN16: u16 = 0x8000;
const NIBBLE_LO: u8 = 0x0F;
const NIBBLE_HI: u8 = 0xF0;

/// `ADD` or `ADC` when `cf` is set.
#[inline]
pub fn add(val: u8, arg: u8, cf: bool) -> (u8, CpuFlags) {
    let wide = u16::from(val) + u16::from(arg) + u16::from(cf);
    let res = wide as u8;
    let vf = (val ^ !arg) & (val ^ res) & SIGN8 != 0;
    let flags = CpuFlags::mask_nh_add(val, arg, cf) |
                CpuFlags::mask_szxy(res) |
                CpuFlags::V.when(vf) |
                CpuFlags::C.when(wide > 0xFF);
    (res, flags)
}

/// `SUB` or `SBC` when `cf` is set.
#[inline]
pub fn sub(val: u8, arg: u8, cf: bool) -> (u8, CpuFlags) {
    let res = val.wrapping_sub(arg).wrapping_sub(u8::from(cf));
    let borrow = u16::from(val) < u16::from(arg) + u16::from(cf);
    let vf = (val ^ arg) & (val ^ res) & SIGN8 != 0;
    let flags = CpuFlags::mask_nh_sub(val, arg, cf) |
                CpuFlags::mask_szxy(res) |
                CpuFlags::V.when(vf) |
                CpuFlags::C.when(borrow);
    (res, flags)
}

/// `CP` takes bits 3 and 5 from the operand, not from the result.
#[inline]
pub fn cp(val: u8, arg: u8) -> CpuFlags {
    let (_, flags) = sub(val, arg, false);
    (flags - CpuFlags::XY) | CpuFlags::mask_xy(arg)
}

#[inline]
pub fn and(val: u8, arg: u8) -> (u8, CpuFlags) {
    let res = val & arg;
    (res, CpuFlags::mask_bitops(res, true, false))
}

#[inline]
pub fn xor(val: u8, arg: u8) -> (u8, CpuFlags) {
    let res = val ^ arg;
    (res, CpuFlags::mask_bitops(res, false, false))
}

#[inline]
pub fn or(val: u8, arg: u8) -> (u8, CpuFlags) {
    let res = val | arg;
    (res, CpuFlags::mask_bitops(res, false, false))
}

/// Applies one of the 8-bit arithmetic/logic group operations to the accumulator.
///
/// `CP` returns the accumulator unchanged.
#[inline]
pub fn alu(op: Ops8, acc: u8, arg: u8, flags: CpuFlags) -> (u8, CpuFlags) {
    match op {
        Ops8::ADD => add(acc, arg, false),
        Ops8::ADC => add(acc, arg, flags.cf()),
        Ops8::SUB => sub(acc, arg, false),
        Ops8::SBC => sub(acc, arg, flags.cf()),
        Ops8::AND => and(acc, arg),
        Ops8::XOR => xor(acc, arg),
        Ops8::OR  => or(acc, arg),
        Ops8::CP  => (acc, cp(acc, arg)),
    }
}

#[inline]
pub fn inc(val: u8, flags: CpuFlags) -> (u8, CpuFlags) {
    let res = val.wrapping_add(1);
    let flags = CpuFlags::mask_nh_add(val, 1, false) |
                CpuFlags::mask_szxy(res) |
                CpuFlags::V.when(val == 0x7F) |
                (flags & CpuFlags::C);
    (res, flags)
}

#[inline]
pub fn dec(val: u8, flags: CpuFlags) -> (u8, CpuFlags) {
    let res = val.wrapping_sub(1);
    let flags = CpuFlags::mask_nh_sub(val, 1, false) |
                CpuFlags::mask_szxy(res) |
                CpuFlags::V.when(val == SIGN8) |
                (flags & CpuFlags::C);
    (res, flags)
}

/// `ADD HL,rr` keeps S, Z and PV.
#[inline]
pub fn add16(val: u16, arg: u16, flags: CpuFlags) -> (u16, CpuFlags) {
    let (res, cf) = val.overflowing_add(arg);
    let flags = (flags & (CpuFlags::S|CpuFlags::Z|CpuFlags::PV)) |
                CpuFlags::mask_nh_add16(val, arg, false) |
                CpuFlags::mask_xy((res >> 8) as u8) |
                CpuFlags::C.when(cf);
    (res, flags)
}

#[inline]
pub fn adc16(val: u16, arg: u16, flags: CpuFlags) -> (u16, CpuFlags) {
    let cf = flags.cf();
    let wide = u32::from(val) + u32::from(arg) + u32::from(cf);
    let res = wide as u16;
    let vf = (val ^ !arg) & (val ^ res) & SIGN16 != 0;
    let flags = CpuFlags::mask_nh_add16(val, arg, cf) |
                CpuFlags::mask_sxy((res >> 8) as u8) |
                CpuFlags::Z.when(res == 0) |
                CpuFlags::V.when(vf) |
                CpuFlags::C.when(wide > 0xFFFF);
    (res, flags)
}

#[inline]
pub fn sbc16(val: u16, arg: u16, flags: CpuFlags) -> (u16, CpuFlags) {
    let cf = flags.cf();
    let res = val.wrapping_sub(arg).wrapping_sub(u16::from(cf));
    let borrow = u32::from(val) < u32::from(arg) + u32::from(cf);
    let vf = (val ^ arg) & (val ^ res) & SIGN16 != 0;
    let flags = CpuFlags::mask_nh_sub16(val, arg, cf) |
                CpuFlags::mask_sxy((res >> 8) as u8) |
                CpuFlags::Z.when(res == 0) |
                CpuFlags::V.when(vf) |
                CpuFlags::C.when(borrow);
    (res, flags)
}

#[inline]
pub fn neg(acc: u8) -> (u8, CpuFlags) {
    sub(0, acc, false)
}

#[inline]
pub fn cpl(acc: u8, flags: CpuFlags) -> (u8, CpuFlags) {
    let res = !acc;
    let flags = (flags - CpuFlags::XY) | CpuFlags::mask_xy(res) | CpuFlags::H | CpuFlags::N;
    (res, flags)
}

/// Bits 3 and 5 come from the accumulator.
#[inline]
pub fn scf(acc: u8, flags: CpuFlags) -> CpuFlags {
    (flags & (CpuFlags::S|CpuFlags::Z|CpuFlags::PV)) | CpuFlags::mask_xy(acc) | CpuFlags::C
}

/// H receives the previous Carry.
#[inline]
pub fn ccf(acc: u8, flags: CpuFlags) -> CpuFlags {
    let cf = flags.cf();
    (flags & (CpuFlags::S|CpuFlags::Z|CpuFlags::PV)) |
    CpuFlags::mask_xy(acc) |
    CpuFlags::H.when(cf) |
    CpuFlags::C.when(!cf)
}

#[inline]
pub fn daa(acc: u8, flags: CpuFlags) -> (u8, CpuFlags) {
    let lo = acc & NIBBLE_LO;
    let mut diff = 0;
    let mut cf = flags.cf();
    if flags.hf() || lo > 9 {
        diff |= 0x06;
    }
    if cf || acc > 0x99 {
        diff |= 0x60;
        cf = true;
    }
    let (res, hf) = if flags.nf() {
        (acc.wrapping_sub(diff), flags.hf() && lo < 6)
    }
    else {
        (acc.wrapping_add(diff), lo > 9)
    };
    (res, CpuFlags::mask_bitops(res, hf, cf) | (flags & CpuFlags::N))
}

/// Flags of the accumulator rotations: S, Z and PV are kept.
#[inline]
fn acc_rot_flags(res: u8, cf: bool, flags: CpuFlags) -> CpuFlags {
    (flags & (CpuFlags::S|CpuFlags::Z|CpuFlags::PV)) | CpuFlags::mask_xy(res) | CpuFlags::C.when(cf)
}

#[inline]
pub fn rlca(acc: u8, flags: CpuFlags) -> (u8, CpuFlags) {
    let res = acc.rotate_left(1);
    (res, acc_rot_flags(res, acc & SIGN8 != 0, flags))
}

#[inline]
pub fn rrca(acc: u8, flags: CpuFlags) -> (u8, CpuFlags) {
    let res = acc.rotate_right(1);
    (res, acc_rot_flags(res, acc & 1 != 0, flags))
}

#[inline]
pub fn rla(acc: u8, flags: CpuFlags) -> (u8, CpuFlags) {
    let res = acc << 1 | u8::from(flags.cf());
    (res, acc_rot_flags(res, acc & SIGN8 != 0, flags))
}

#[inline]
pub fn rra(acc: u8, flags: CpuFlags) -> (u8, CpuFlags) {
    let res = acc >> 1 | u8::from(flags.cf()) << 7;
    (res, acc_rot_flags(res, acc & 1 != 0, flags))
}

/// One of the `0xCB` shift and rotate group operations.
#[inline]
pub fn rot(op: Rot, val: u8, flags: CpuFlags) -> (u8, CpuFlags) {
    let carry_in = u8::from(flags.cf());
    let (res, cf) = match op {
        Rot::RLC => (val.rotate_left(1), val & SIGN8 != 0),
        Rot::RRC => (val.rotate_right(1), val & 1 != 0),
        Rot::RL  => (val << 1 | carry_in, val & SIGN8 != 0),
        Rot::RR  => (val >> 1 | carry_in << 7, val & 1 != 0),
        Rot::SLA => (val << 1, val & SIGN8 != 0),
        Rot::SRA => (val >> 1 | val & SIGN8, val & 1 != 0),
        Rot::SLL => (val << 1 | 1, val & SIGN8 != 0),
        Rot::SRL => (val >> 1, val & 1 != 0),
    };
    (res, CpuFlags::mask_bitops(res, false, cf))
}

/// Returns `(acc, mem, flags)`.
#[inline]
pub fn rld(acc: u8, mem: u8, flags: CpuFlags) -> (u8, u8, CpuFlags) {
    let res_acc = (acc & NIBBLE_HI) | mem >> 4;
    let res_mem = mem << 4 | (acc & NIBBLE_LO);
    (res_acc, res_mem, CpuFlags::mask_bitops(res_acc, false, flags.cf()))
}

/// Returns `(acc, mem, flags)`.
#[inline]
pub fn rrd(acc: u8, mem: u8, flags: CpuFlags) -> (u8, u8, CpuFlags) {
    let res_acc = (acc & NIBBLE_HI) | (mem & NIBBLE_LO);
    let res_mem = acc << 4 | mem >> 4;
    (res_acc, res_mem, CpuFlags::mask_bitops(res_acc, false, flags.cf()))
}

/// `BIT n` with the undocumented bits 3 and 5 taken from `xy`.
///
/// For a register operand `xy` is the register itself, for the memory operands it
/// is the high byte of the `WZ` latch.
#[inline]
pub fn bit(n: u8, val: u8, xy: u8, flags: CpuFlags) -> CpuFlags {
    debug_assert!(n <= 7);
    let res = val & (1 << n);
    CpuFlags::mask_sign(res) |
    CpuFlags::mask_xy(xy) |
    CpuFlags::H |
    (CpuFlags::Z|CpuFlags::PV).when(res == 0) |
    (flags & CpuFlags::C)
}

#[inline]
pub fn res(n: u8, val: u8) -> u8 {
    val & !(1 << n)
}

#[inline]
pub fn set(n: u8, val: u8) -> u8 {
    val | 1 << n
}

/// `LD A,I` and `LD A,R`: PV reflects `IFF2`.
#[inline]
pub fn ld_a_ir(val: u8, iff2: bool, flags: CpuFlags) -> CpuFlags {
    CpuFlags::mask_szxy(val) | CpuFlags::PV.when(iff2) | (flags & CpuFlags::C)
}

/// `IN r,(C)`.
#[inline]
pub fn io(val: u8, flags: CpuFlags) -> CpuFlags {
    CpuFlags::mask_bitops(val, false, flags.cf())
}

/// `LDI`/`LDD`: the undocumented bits come from `(HL) + A`.
#[inline]
pub fn ldx(acc: u8, val: u8, bc_is_zero: bool, flags: CpuFlags) -> CpuFlags {
    let n = val.wrapping_add(acc);
    (flags & (CpuFlags::S|CpuFlags::Z|CpuFlags::C)) |
    CpuFlags::mask_block_op_xy(n) |
    CpuFlags::PV.when(!bc_is_zero)
}

/// `CPI`/`CPD`: the undocumented bits come from `A - (HL) - H`.
#[inline]
pub fn cpx(acc: u8, val: u8, bc_is_zero: bool, flags: CpuFlags) -> CpuFlags {
    let res = acc.wrapping_sub(val);
    let nh = CpuFlags::mask_nh_sub(acc, val, false);
    let n = res.wrapping_sub(u8::from(nh.hf()));
    nh |
    CpuFlags::mask_sign(res) |
    CpuFlags::mask_zero(res) |
    CpuFlags::mask_block_op_xy(n) |
    CpuFlags::PV.when(!bc_is_zero) |
    (flags & CpuFlags::C)
}

/// Block I/O: `data` is the byte transferred, `b` is the decremented B and `m` is the
/// value added to `data` to form `k` (`C ± 1` for input, `L` for output).
#[inline]
pub fn iox(data: u8, b: u8, m: u8) -> CpuFlags {
    let (k, hcf) = data.overflowing_add(m);
    CpuFlags::mask_szxy(b) |
    CpuFlags::N.when(data & SIGN8 != 0) |
    (CpuFlags::H|CpuFlags::C).when(hcf) |
    CpuFlags::parity(k & 7 ^ b)
}
