/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! The execution context of a single instruction and its bus helpers.
use core::num::NonZeroU8;

use crate::cpu::*;
use crate::host::{Clock, Io, Memory};
use super::Z80;

/// Constants for internal cycles.
pub(super) mod cycles {
    use core::num::NonZeroU8;
    macro_rules! def_consts_non_zero_u8 {
        ($($n:ident: $i:literal;)*) => {
            $(pub const $n: NonZeroU8 = match NonZeroU8::new($i) { Some(n) => n, None => panic!() };)*
        };
    }
    def_consts_non_zero_u8!{
        NO_MREQ_X1: 1;
        NO_MREQ_X2: 2;
        NO_MREQ_X3: 3;
        NO_MREQ_X4: 4;
        NO_MREQ_X5: 5;
        NO_MREQ_X7: 7;
    }
}

/// Determines the direction for the block instruction group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i8)]
pub(crate) enum BlockDelta {
    Increase = 1,
    Decrease = -1
}

impl BlockDelta {
    #[inline]
    pub(super) fn apply(self, val: u16) -> u16 {
        val.wrapping_add(self as i8 as i16 as u16)
    }
}

pub(super) trait WordBytes {
    fn msb(self) -> u8;
    fn lsb(self) -> u8;
}

impl WordBytes for u16 {
    #[inline]
    fn msb(self) -> u8 {
        (self >> 8) as u8
    }

    #[inline]
    fn lsb(self) -> u8 {
        self as u8
    }
}

/// Borrows the Cpu, the bus and the clock for the duration of one instruction.
///
/// `prefix` holds the active `0xDD`/`0xFD` prefix. Register accessors of this type
/// substitute `HL`, `H` and `L` accordingly; the plain accessors on [Z80] never do.
pub(super) struct Exec<'a, M, T> {
    pub cpu: &'a mut Z80,
    pub bus: &'a mut M,
    pub tsc: &'a mut T,
    pub prefix: Option<Prefix>,
}

impl<'a, M, T> Exec<'a, M, T>
    where M: Memory<Timestamp=T::Timestamp> + Io<Timestamp=T::Timestamp>, T: Clock
{
    pub fn new(cpu: &'a mut Z80, bus: &'a mut M, tsc: &'a mut T) -> Self {
        Exec { cpu, bus, tsc, prefix: None }
    }

    /// Reads an op-code in an M1 cycle, increases PC and the memory refresh counter.
    #[inline]
    pub fn fetch_opcode(&mut self) -> u8 { // pc:4, pc+=1
        self.cpu.inc_r();
        let pc = self.cpu.pc;
        let code = self.bus.read_opcode(pc, self.cpu.get_ir(), self.tsc.add_m1(pc));
        self.cpu.pc = pc.wrapping_add(1);
        self.cpu.push_code(code);
        code
    }

    /// Reads an immediate byte. Also used for the displacement and the op-code
    /// following `0xDD 0xCB`, which are not M1 cycles.
    #[inline]
    pub fn fetch_imm8(&mut self) -> u8 { // pc:3, pc+=1
        let pc = self.cpu.pc;
        let n = self.bus.read_mem(pc, self.tsc.add_mreq(pc));
        self.cpu.pc = pc.wrapping_add(1);
        self.cpu.push_code(n);
        n
    }

    /// Reads a little-endian immediate word.
    #[inline]
    pub fn fetch_imm16(&mut self) -> u16 { // pc:3, pc+1:3, pc+=2
        let lo = self.fetch_imm8();
        let hi = self.fetch_imm8();
        u16::from_le_bytes([lo, hi])
    }

    #[inline]
    pub fn no_mreq(&mut self, address: u16, add_ts: NonZeroU8) {
        self.tsc.add_no_mreq(address, add_ts);
    }

    /// Adds internal cycles attributed to the IR address.
    #[inline]
    pub fn no_mreq_ir(&mut self, add_ts: NonZeroU8) {
        let ir = self.cpu.get_ir();
        self.tsc.add_no_mreq(ir, add_ts);
    }

    #[inline]
    pub fn read_mem(&mut self, address: u16) -> u8 { // addr:3
        self.bus.read_mem(address, self.tsc.add_mreq(address))
    }

    #[inline]
    pub fn write_mem(&mut self, address: u16, value: u8) { // addr:3
        self.bus.write_mem(address, value, self.tsc.add_mreq(address))
    }

    #[inline]
    pub fn read_mem16(&mut self, address: u16) -> u16 { // addr:3, addr+1:3
        let lo = self.read_mem(address);
        let hi = self.read_mem(address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    #[inline]
    pub fn write_mem16(&mut self, address: u16, value: u16) { // addr:3, addr+1:3
        let [lo, hi] = value.to_le_bytes();
        self.write_mem(address, lo);
        self.write_mem(address.wrapping_add(1), hi);
    }

    #[inline]
    pub fn read_io(&mut self, port: u16) -> u8 { // port:4
        self.bus.read_io(port, self.tsc.add_io(port))
    }

    #[inline]
    pub fn write_io(&mut self, port: u16, data: u8) { // port:4
        self.bus.write_io(port, data, self.tsc.add_io(port))
    }

    #[inline]
    pub fn push16(&mut self, val: u16) { // sp-1:3, sp-2:3
        let sp = self.cpu.sp.wrapping_sub(1);
        self.write_mem(sp, val.msb());
        let sp = sp.wrapping_sub(1);
        self.write_mem(sp, val.lsb());
        self.cpu.sp = sp;
    }

    #[inline]
    pub fn pop16(&mut self) -> u16 { // sp:3, sp+1:3
        let sp = self.cpu.sp;
        let val = self.read_mem16(sp);
        self.cpu.sp = sp.wrapping_add(2);
        val
    }

    #[inline]
    pub fn flags(&self) -> CpuFlags {
        self.cpu.get_flags()
    }

    #[inline]
    pub fn set_flags(&mut self, flags: CpuFlags) {
        self.cpu.set_flags(flags)
    }

    #[inline]
    pub fn acc(&self) -> u8 {
        self.cpu.get_acc()
    }

    #[inline]
    pub fn set_acc(&mut self, val: u8) {
        self.cpu.set_acc(val)
    }

    /// `HL`, `IX` or `IY` depending on the active prefix.
    #[inline]
    pub fn get_hl(&self) -> u16 {
        match self.prefix {
            None => self.cpu.regs.hl.get16(),
            Some(prefix) => self.cpu.get_index16(prefix)
        }
    }

    #[inline]
    pub fn set_hl(&mut self, val: u16) {
        match self.prefix {
            None => self.cpu.regs.hl.set16(val),
            Some(prefix) => self.cpu.set_index16(prefix, val)
        }
    }

    /// An 8-bit register with `H` and `L` substituted by the halves of the active
    /// index register.
    #[inline]
    pub fn get_reg8(&self, reg: Reg8) -> u8 {
        self.cpu.get_reg(reg, self.prefix)
    }

    #[inline]
    pub fn set_reg8(&mut self, reg: Reg8, val: u8) {
        self.cpu.set_reg(reg, self.prefix, val)
    }

    /// A register pair with `HL` substituted by the active index register.
    #[inline]
    pub fn get_rp(&self, rp: Reg16) -> u16 {
        match rp {
            Reg16::HL => self.get_hl(),
            rp => self.cpu.get_reg16(rp)
        }
    }

    #[inline]
    pub fn set_rp(&mut self, rp: Reg16, val: u16) {
        match rp {
            Reg16::HL => self.set_hl(val),
            rp => self.cpu.set_reg16(rp, val)
        }
    }

    /// The address of the memory operand: `HL`, or `IX+d`/`IY+d` with the displacement
    /// fetched from the code stream. `WZ` is set to the indexed address.
    #[inline]
    pub fn operand_address(&mut self) -> u16 {
        match self.prefix {
            None => self.cpu.regs.hl.get16(),
            Some(prefix) => {
                let d = self.fetch_imm8(); // pc+2:3
                let pc = self.cpu.pc.wrapping_sub(1);
                self.no_mreq(pc, cycles::NO_MREQ_X5); // pc+2:1 x 5
                self.indexed_address(prefix, d)
            }
        }
    }

    #[inline]
    pub fn indexed_address(&mut self, prefix: Prefix, d: u8) -> u16 {
        let address = indexed_address!(self.cpu.get_index16(prefix), d);
        self.cpu.wz = address;
        address
    }

    /// Reads a register ignoring the prefix. Used by `LD r,(IX+d)` and friends.
    #[inline]
    pub fn read_operand_plain(&self, reg: Reg8) -> u8 {
        self.cpu.get_reg(reg, None)
    }

    #[inline]
    pub fn write_operand_plain(&mut self, reg: Reg8, val: u8) {
        self.cpu.set_reg(reg, None, val)
    }
}
