/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! ZX Spectrum Next Z80N extended instructions.
//!
//! These are executed only when the extended instruction set is enabled, otherwise
//! their op-codes are 2-byte `NOP`s. None of them modify Flags, except `TEST n`.
use crate::bus::TBBLUE_REGISTER_SELECT_PORT;
use crate::cpu::*;
use crate::host::{Clock, Io, Memory};
use super::decode::NextOp;
use super::internal::{cycles::*, BlockDelta, Exec, WordBytes};
use super::ops;

/// `SWAPNIB`: exchanges the nibbles of the accumulator.
#[inline]
pub fn swap_nibbles(acc: u8) -> u8 {
    acc.rotate_left(4)
}

/// `MIRROR A`: reverses the bit order of the accumulator.
#[inline]
pub fn mirror(acc: u8) -> u8 {
    acc.reverse_bits()
}

/// `BSLA DE,B`: shift counts above 15 clear the result.
#[inline]
pub fn barrel_shift_left(de: u16, b: u8) -> u16 {
    de.checked_shl((b & 0x1F).into()).unwrap_or(0)
}

/// `BSRA DE,B`: arithmetic shift right.
#[inline]
pub fn barrel_shift_right_arithmetic(de: u16, b: u8) -> u16 {
    let count = (b & 0x1F).min(15);
    ((de as i16) >> count) as u16
}

/// `BSRL DE,B`: logical shift right.
#[inline]
pub fn barrel_shift_right_logical(de: u16, b: u8) -> u16 {
    de.checked_shr((b & 0x1F).into()).unwrap_or(0)
}

/// `BSRF DE,B`: shift right, filling with ones.
#[inline]
pub fn barrel_shift_right_fill(de: u16, b: u8) -> u16 {
    !barrel_shift_right_logical(!de, b)
}

/// `BRLC DE,B`: rotate left by `B & 0x0F`.
#[inline]
pub fn barrel_rotate_left(de: u16, b: u8) -> u16 {
    de.rotate_left((b & 0x0F).into())
}

/// `PIXELDN`: moves `HL` one pixel row down in the ZX Spectrum screen layout.
pub fn pixel_down(hl: u16) -> u16 {
    let [l, h] = hl.to_le_bytes();
    let (h, l) = if h & 0x07 != 0x07 {
        (h.wrapping_add(1), l)
    }
    else if l & 0xE0 != 0xE0 {
        (h & 0xF8, l.wrapping_add(0x20))
    }
    else {
        ((h & 0xF8).wrapping_add(0x08), l.wrapping_add(0x20))
    };
    u16::from_le_bytes([l, h])
}

/// `PIXELAD`: the ZX Spectrum screen address of the pixel at row `d` and column `e`.
pub fn pixel_address(d: u8, e: u8) -> u16 {
    let (d, e) = (u16::from(d), u16::from(e));
    0x4000 + ((d & 0xC0) << 5) + ((d & 0x07) << 8) + ((d & 0x38) << 2) + (e >> 3)
}

/// `SETAE`: the pixel mask of the column `e` within its screen byte.
#[inline]
pub fn pixel_mask(e: u8) -> u8 {
    0x80 >> (e & 0x07)
}

/// `JP (C)`: jumps within the current 16 KB bank to a 64-byte boundary given by `input`.
#[inline]
pub fn io_jump_target(pc: u16, input: u8) -> u16 {
    (pc & 0xC000).wrapping_add(u16::from(input) << 6)
}

impl<'a, M, T> Exec<'a, M, T>
    where M: Memory<Timestamp=T::Timestamp> + Io<Timestamp=T::Timestamp>, T: Clock
{
    pub fn execute_next_op(&mut self, op: NextOp) {
        match op {
            NextOp::SwapNib => self.set_acc(swap_nibbles(self.acc())),
            NextOp::MirrorA => self.set_acc(mirror(self.acc())),
            NextOp::TestN => {
                let n = self.fetch_imm8(); // pc+2:3
                let (_, flags) = ops::and(self.acc(), n);
                self.set_flags(flags);
            }
            NextOp::BslaDeB => self.barrel_shift(barrel_shift_left),
            NextOp::BsraDeB => self.barrel_shift(barrel_shift_right_arithmetic),
            NextOp::BsrlDeB => self.barrel_shift(barrel_shift_right_logical),
            NextOp::BsrfDeB => self.barrel_shift(barrel_shift_right_fill),
            NextOp::BrlcDeB => self.barrel_shift(barrel_rotate_left),
            NextOp::MulDE => {
                let (d, e) = self.cpu.regs.de.get();
                self.cpu.regs.de.set16(u16::from(d) * u16::from(e));
            }
            NextOp::AddRpA(rp) => {
                let val = self.cpu.get_reg16(rp).wrapping_add(self.acc().into());
                self.cpu.set_reg16(rp, val);
            }
            NextOp::AddRpNn(rp) => {
                let nn = self.fetch_imm16(); // pc+2:3, pc+3:3
                let pc = self.cpu.pc.wrapping_sub(1);
                self.no_mreq(pc, NO_MREQ_X2); // pc+3:1 x 2
                let val = self.cpu.get_reg16(rp).wrapping_add(nn);
                self.cpu.set_reg16(rp, val);
            }
            NextOp::PushNn => {
                // the operand is stored big-endian
                let hi = self.fetch_imm8(); // pc+2:3
                let lo = self.fetch_imm8(); // pc+3:3
                let pc = self.cpu.pc.wrapping_sub(1);
                self.no_mreq(pc, NO_MREQ_X3); // pc+3:1 x 3
                self.push16(u16::from_le_bytes([lo, hi])); // sp-1:3, sp-2:3
            }
            NextOp::OutInB => {
                let hl = self.cpu.regs.hl.get16();
                let val = self.read_mem(hl); // hl:3
                let bc = self.cpu.regs.bc.get16();
                self.write_io(bc, val); // IO
                self.no_mreq(bc, NO_MREQ_X1); // bc:1
                self.cpu.regs.hl.set16(hl.wrapping_add(1));
            }
            NextOp::NextRegNn => {
                let reg = self.fetch_imm8(); // pc+2:3
                let val = self.fetch_imm8(); // pc+3:3
                self.write_next_reg(reg, val);
            }
            NextOp::NextRegA => {
                let reg = self.fetch_imm8(); // pc+2:3
                let a = self.acc();
                self.write_next_reg(reg, a);
            }
            NextOp::PixelDn => {
                let hl = pixel_down(self.cpu.regs.hl.get16());
                self.cpu.regs.hl.set16(hl);
            }
            NextOp::PixelAd => {
                let (d, e) = self.cpu.regs.de.get();
                self.cpu.regs.hl.set16(pixel_address(d, e));
            }
            NextOp::SetAE => {
                let e = self.cpu.regs.de.lo();
                self.set_acc(pixel_mask(e));
            }
            NextOp::JpC => {
                let bc = self.cpu.regs.bc.get16();
                let input = self.read_io(bc); // IO
                self.no_mreq(bc, NO_MREQ_X1); // bc:1
                let pc = io_jump_target(self.cpu.pc, input);
                self.cpu.pc = pc;
                self.cpu.wz = pc;
            }
            NextOp::Ldix => { self.load_skipping_acc(BlockDelta::Increase); }
            NextOp::Lddx => { self.load_skipping_acc(BlockDelta::Decrease); }
            NextOp::Ldirx => {
                if self.load_skipping_acc(BlockDelta::Increase) {
                    self.repeat_block();
                }
            }
            NextOp::Lddrx => {
                if self.load_skipping_acc(BlockDelta::Decrease) {
                    self.repeat_block();
                }
            }
            NextOp::Ldws => {
                let hl = self.cpu.regs.hl.get16();
                let de = self.cpu.regs.de.get16();
                let val = self.read_mem(hl); // hl:3
                self.write_mem(de, val); // de:3
                self.cpu.regs.hl.set_lo(hl.lsb().wrapping_add(1));
                let (d, flags) = ops::inc(de.msb(), self.flags());
                self.cpu.regs.de.set_hi(d);
                self.set_flags(flags);
            }
            NextOp::Ldpirx => {
                let hl = self.cpu.regs.hl.get16();
                let de = self.cpu.regs.de.get16();
                let src = (hl & 0xFFF8) | (de & 0x0007);
                let val = self.read_mem(src); // src:3
                self.store_unless_acc(de, val); // de:3
                self.no_mreq(de, NO_MREQ_X2); // de:1 x 2
                self.cpu.regs.de.set16(de.wrapping_add(1));
                if !self.cpu.regs.bc.dec16_is_zero() {
                    self.repeat_block();
                }
            }
        }
    }

    fn barrel_shift(&mut self, op: fn(u16, u8) -> u16) {
        let b = self.cpu.regs.bc.hi();
        let de = op(self.cpu.regs.de.get16(), b);
        self.cpu.regs.de.set16(de);
    }

    fn write_next_reg(&mut self, reg: u8, val: u8) {
        let pc = self.cpu.pc.wrapping_sub(1);
        self.no_mreq(pc, NO_MREQ_X2); // pc:1 x 2
        let ts = self.tsc.add_io(TBBLUE_REGISTER_SELECT_PORT);
        self.bus.write_next_reg(reg, val, ts);
    }

    /// Writes `val` to `address` unless it equals the accumulator. The memory
    /// cycle takes its time either way.
    fn store_unless_acc(&mut self, address: u16, val: u8) {
        if val != self.acc() {
            self.write_mem(address, val); // de:3
        }
        else {
            self.no_mreq(address, NO_MREQ_X3); // de:3
        }
    }

    /// `LDIX` and `LDDX`. Returns `true` if `BC` is not zero afterwards.
    fn load_skipping_acc(&mut self, delta: BlockDelta) -> bool {
        let hl = self.cpu.regs.hl.get16();
        let de = self.cpu.regs.de.get16();
        let val = self.read_mem(hl); // hl:3
        self.store_unless_acc(de, val); // de:3
        self.no_mreq(de, NO_MREQ_X2); // de:1 x 2
        self.cpu.regs.hl.set16(delta.apply(hl));
        self.cpu.regs.de.set16(delta.apply(de));
        !self.cpu.regs.bc.dec16_is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nibbles_and_mirror_work() {
        assert_eq!(swap_nibbles(0x3d), 0xd3);
        assert_eq!(mirror(0xc4), 0x23);
        assert_eq!(mirror(0x01), 0x80);
    }

    #[test]
    fn barrel_shifts_work() {
        assert_eq!(barrel_shift_left(0xffff, 0x05), 0xffe0);
        assert_eq!(barrel_shift_left(0xffff, 0x65), 0xffe0);
        assert_eq!(barrel_shift_left(0xffff, 0x12), 0x0000);
        assert_eq!(barrel_shift_left(0xffff, 0x0c), 0xf000);
        assert_eq!(barrel_shift_right_arithmetic(0xffff, 0x05), 0xffff);
        assert_eq!(barrel_shift_right_arithmetic(0x13ff, 0x65), 0x009f);
        assert_eq!(barrel_shift_right_arithmetic(0x12ff, 0x12), 0x0000);
        assert_eq!(barrel_shift_right_arithmetic(0x1fff, 0x0a), 0x0007);
        assert_eq!(barrel_shift_right_arithmetic(0x8000, 0x1f), 0xffff);
        assert_eq!(barrel_shift_right_logical(0xffff, 0x05), 0x07ff);
        assert_eq!(barrel_shift_right_logical(0x12ff, 0x12), 0x0000);
        assert_eq!(barrel_shift_right_fill(0xffff, 0x05), 0xffff);
        assert_eq!(barrel_shift_right_fill(0x13ff, 0x65), 0xf89f);
        assert_eq!(barrel_shift_right_fill(0x12ff, 0x12), 0xffff);
        assert_eq!(barrel_shift_right_fill(0x1fff, 0x0a), 0xffc7);
        assert_eq!(barrel_shift_right_fill(0xaaaa, 0x08), 0xffaa);
        assert_eq!(barrel_rotate_left(0xffff, 0x05), 0xffff);
        assert_eq!(barrel_rotate_left(0x13ff, 0x65), 0x7fe2);
        assert_eq!(barrel_rotate_left(0x12ff, 0x12), 0x4bfc);
        assert_eq!(barrel_rotate_left(0x1fff, 0x0a), 0xfc7f);
        assert_eq!(barrel_rotate_left(0x1234, 0xd4), 0x2341);
    }

    #[test]
    fn pixel_down_works() {
        for (orig, down) in [
            (0x4000, 0x4100), (0x401f, 0x411f), (0x411e, 0x421e), (0x471f, 0x403f),
            (0x471e, 0x403e), (0x47e2, 0x4802), (0x47ff, 0x481f), (0x491e, 0x4a1e),
            (0x4f1f, 0x483f), (0x4f1e, 0x483e), (0x4fe2, 0x5002), (0x4fff, 0x501f)]
        {
            assert_eq!(pixel_down(orig), down, "{:04x}", orig);
        }
    }

    #[test]
    fn pixel_address_works() {
        for (row, col, addr) in [
            (0x00, 0x00, 0x4000), (0x00, 0xf7, 0x401e), (0x00, 0xfe, 0x401f),
            (0x06, 0x00, 0x4600), (0x0c, 0xf7, 0x443e), (0x40, 0xfe, 0x481f),
            (0x46, 0xf7, 0x4e1e), (0x4c, 0x00, 0x4c20), (0x80, 0x00, 0x5000),
            (0x86, 0xfe, 0x561f), (0x8c, 0xf7, 0x543e)]
        {
            assert_eq!(pixel_address(row, col), addr, "{:02x} {:02x}", row, col);
        }
    }

    #[test]
    fn pixel_mask_and_io_jump_work() {
        assert_eq!(pixel_mask(0xff), 0x01);
        assert_eq!(pixel_mask(0x00), 0x80);
        assert_eq!(pixel_mask(0x03), 0x10);
        assert_eq!(io_jump_target(0x0002, 0xd5), 0x3540);
        assert_eq!(io_jump_target(0xC123, 0x01), 0xC040);
    }
}
