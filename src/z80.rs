/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! A home of the Cpu implementation.
#[macro_use]
mod macros;
mod decode;
mod handlers;
mod internal;
mod next;
mod ops;

use core::mem::swap;
use arrayvec::ArrayVec;
use log::debug;

use crate::cpu::*;
use crate::host::{Clock, Io, Memory};
use crate::{IRQ_RESTART, NMI_RESTART};
use internal::{cycles::*, Exec};

pub use next::{
    swap_nibbles, mirror, barrel_shift_left, barrel_shift_right_arithmetic,
    barrel_shift_right_logical, barrel_shift_right_fill, barrel_rotate_left,
    pixel_down, pixel_address, pixel_mask, io_jump_target
};

/// The maximum number of bytes of a single instruction, prefixes included.
pub const MAX_INSTRUCTION_LENGTH: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
struct GeneralRegisters {
    bc: RegisterPair,
    de: RegisterPair,
    hl: RegisterPair,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
struct IndexRegisters {
    ix: RegisterPair,
    iy: RegisterPair,
}

/// The Z80 Cpu with the optional ZX Spectrum Next Z80N extensions.
///
/// The Cpu owns only its registers. Memory, I/O and the T-state counter are
/// borrowed by [Z80::execute_next] for every step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Z80 {
    af: RegisterPair,
    af_alt: RegisterPair,
    regs: GeneralRegisters,
    regs_alt: GeneralRegisters,
    index: IndexRegisters,
    pc: u16,
    sp: u16,
    wz: u16,
    ir: RegisterPair,
    im: InterruptMode,
    iff1: bool,
    iff2: bool,
    state: StateFlags,
    extended_instructions: bool,
    last_code: ArrayVec<u8, MAX_INSTRUCTION_LENGTH>,
}

impl Default for Z80 {
    fn default() -> Self {
        Z80::new()
    }
}

impl Z80 {
    /// Creates a new instance of Z80 with the state just after `RESET`.
    ///
    /// The Z80N extended instructions are disabled.
    pub fn new() -> Self {
        let mut cpu = Z80 {
            af: RegisterPair::default(),
            af_alt: RegisterPair::default(),
            regs: GeneralRegisters::default(),
            regs_alt: GeneralRegisters::default(),
            index: IndexRegisters::default(),
            pc: 0,
            sp: 0,
            wz: 0,
            ir: RegisterPair::default(),
            im: InterruptMode::Mode0,
            iff1: false,
            iff2: false,
            state: StateFlags::empty(),
            extended_instructions: false,
            last_code: ArrayVec::new(),
        };
        cpu.reset();
        cpu
    }

    /// Resets all registers to the `RESET` state: `AF`, `AF'` and `SP` are `0xFFFF`,
    /// everything else is cleared. Does not change the extended instruction setting.
    pub fn reset(&mut self) {
        self.set_state(&CpuState::default());
        self.last_code.clear();
    }

    /// Returns a snapshot of the registers. The `tacts` field is left at `0`, the
    /// T-states are owned by the clock.
    pub fn state(&self) -> CpuState {
        CpuState {
            af: self.af,
            bc: self.regs.bc,
            de: self.regs.de,
            hl: self.regs.hl,
            af_alt: self.af_alt,
            bc_alt: self.regs_alt.bc,
            de_alt: self.regs_alt.de,
            hl_alt: self.regs_alt.hl,
            ix: self.index.ix,
            iy: self.index.iy,
            pc: self.pc,
            sp: self.sp,
            wz: self.wz,
            i: self.ir.hi(),
            r: self.ir.lo(),
            iff1: self.iff1,
            iff2: self.iff2,
            im: self.im,
            state: self.state,
            tacts: 0,
        }
    }

    /// Loads all registers from the snapshot. The `tacts` field is ignored.
    pub fn set_state(&mut self, state: &CpuState) {
        self.af = state.af;
        self.regs = GeneralRegisters { bc: state.bc, de: state.de, hl: state.hl };
        self.af_alt = state.af_alt;
        self.regs_alt = GeneralRegisters { bc: state.bc_alt, de: state.de_alt, hl: state.hl_alt };
        self.index = IndexRegisters { ix: state.ix, iy: state.iy };
        self.pc = state.pc;
        self.sp = state.sp;
        self.wz = state.wz;
        self.ir = RegisterPair::new(state.i, state.r);
        self.iff1 = state.iff1;
        self.iff2 = state.iff2;
        self.im = state.im;
        self.state = state.state;
    }

    /// Returns `true` if the ZX Spectrum Next extended instructions are executed.
    #[inline]
    pub fn extended_instructions(&self) -> bool {
        self.extended_instructions
    }

    /// Enables or disables the ZX Spectrum Next extended instructions.
    ///
    /// When disabled, their op-codes are executed as 2-byte `NOP`s taking 8 T-states.
    #[inline]
    pub fn set_extended_instructions(&mut self, enabled: bool) {
        self.extended_instructions = enabled;
    }

    /// The bytes of the last executed instruction. Empty after an idle `HALT` step
    /// or an accepted interrupt. A discarded index prefix is not included.
    #[inline]
    pub fn last_instruction(&self) -> &[u8] {
        &self.last_code
    }

    #[inline]
    pub(crate) fn push_code(&mut self, code: u8) {
        // instructions never exceed the buffer
        self.last_code.try_push(code).ok();
    }

    #[inline]
    pub fn get_pc(&self) -> u16 {
        self.pc
    }

    #[inline]
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc
    }

    #[inline]
    pub fn get_sp(&self) -> u16 {
        self.sp
    }

    #[inline]
    pub fn set_sp(&mut self, sp: u16) {
        self.sp = sp
    }

    /// Returns the content of the internal `WZ` (`MEMPTR`) register.
    #[inline]
    pub fn get_memptr(&self) -> u16 {
        self.wz
    }

    #[inline]
    pub fn set_memptr(&mut self, memptr: u16) {
        self.wz = memptr
    }

    #[inline]
    pub fn get_af(&self) -> u16 {
        self.af.get16()
    }

    #[inline]
    pub fn set_af(&mut self, af: u16) {
        self.af.set16(af)
    }

    #[inline]
    pub fn get_acc(&self) -> u8 {
        self.af.hi()
    }

    #[inline]
    pub fn set_acc(&mut self, val: u8) {
        self.af.set_hi(val)
    }

    /// Returns Flags including the undocumented bits 3 and 5.
    #[inline]
    pub fn get_flags(&self) -> CpuFlags {
        CpuFlags::from_bits_retain(self.af.lo())
    }

    #[inline]
    pub fn set_flags(&mut self, flags: CpuFlags) {
        self.af.set_lo(flags.bits())
    }

    /// Increases the lower 7 bits of the memory refresh register `R`; bit 7 is kept.
    #[inline]
    pub fn inc_r(&mut self) {
        let r = self.ir.lo();
        self.ir.set_lo((r & 0x80) | (r.wrapping_add(1) & 0x7F));
    }

    #[inline]
    pub fn get_r(&self) -> u8 {
        self.ir.lo()
    }

    #[inline]
    pub fn set_r(&mut self, r: u8) {
        self.ir.set_lo(r)
    }

    #[inline]
    pub fn get_i(&self) -> u8 {
        self.ir.hi()
    }

    #[inline]
    pub fn set_i(&mut self, i: u8) {
        self.ir.set_hi(i)
    }

    /// Returns the `I` register in the high byte and `R` in the low byte.
    #[inline]
    pub fn get_ir(&self) -> u16 {
        self.ir.get16()
    }

    #[inline]
    pub fn get_iffs(&self) -> (bool, bool) {
        (self.iff1, self.iff2)
    }

    #[inline]
    pub fn set_iffs(&mut self, iff1: bool, iff2: bool) {
        self.iff1 = iff1;
        self.iff2 = iff2;
    }

    #[inline]
    pub fn disable_interrupts(&mut self) {
        self.set_iffs(false, false)
    }

    /// `EI` takes effect immediately; there is no delay of one instruction.
    #[inline]
    pub fn enable_interrupts(&mut self) {
        self.set_iffs(true, true)
    }

    #[inline]
    pub fn get_im(&self) -> InterruptMode {
        self.im
    }

    #[inline]
    pub fn set_im(&mut self, im: InterruptMode) {
        self.im = im
    }

    #[inline]
    pub fn state_flags(&self) -> StateFlags {
        self.state
    }

    /// Puts the Cpu in the `HALT` state. `PC` is expected to address the `HALT` op-code.
    #[inline]
    pub fn halt(&mut self) {
        self.state.insert(StateFlags::HALTED)
    }

    #[inline]
    pub fn is_halt(&self) -> bool {
        self.state.contains(StateFlags::HALTED)
    }

    /// Latches a non-maskable interrupt. It is accepted before the next instruction.
    #[inline]
    pub fn raise_nmi(&mut self) {
        self.state.insert(StateFlags::NMI)
    }

    /// Requests a maskable interrupt. The request stays active until it is
    /// accepted or cleared with [Z80::clear_int].
    #[inline]
    pub fn raise_int(&mut self) {
        self.state.insert(StateFlags::INT)
    }

    #[inline]
    pub fn clear_int(&mut self) {
        self.state.remove(StateFlags::INT)
    }

    /// Returns `true` if a signal will be accepted by the next step.
    #[inline]
    pub fn is_interrupt_pending(&self) -> bool {
        self.state.contains(StateFlags::NMI) ||
        (self.iff1 && self.state.contains(StateFlags::INT))
    }

    #[inline]
    pub fn ex_af_af(&mut self) {
        swap(&mut self.af, &mut self.af_alt)
    }

    #[inline]
    pub fn exx(&mut self) {
        swap(&mut self.regs, &mut self.regs_alt)
    }

    #[inline]
    pub fn ex_de_hl(&mut self) {
        swap(&mut self.regs.de, &mut self.regs.hl)
    }

    /// Returns the 8-bit register. With a `prefix`, `H` and `L` are the halves of
    /// the selected index register.
    pub fn get_reg(&self, reg: Reg8, prefix: Option<Prefix>) -> u8 {
        match reg {
            Reg8::B => self.regs.bc.hi(),
            Reg8::C => self.regs.bc.lo(),
            Reg8::D => self.regs.de.hi(),
            Reg8::E => self.regs.de.lo(),
            Reg8::H => self.hl_or_index(prefix).hi(),
            Reg8::L => self.hl_or_index(prefix).lo(),
            Reg8::A => self.af.hi(),
        }
    }

    pub fn set_reg(&mut self, reg: Reg8, prefix: Option<Prefix>, val: u8) {
        match reg {
            Reg8::B => self.regs.bc.set_hi(val),
            Reg8::C => self.regs.bc.set_lo(val),
            Reg8::D => self.regs.de.set_hi(val),
            Reg8::E => self.regs.de.set_lo(val),
            Reg8::H => self.hl_or_index_mut(prefix).set_hi(val),
            Reg8::L => self.hl_or_index_mut(prefix).set_lo(val),
            Reg8::A => self.af.set_hi(val),
        }
    }

    fn hl_or_index(&self, prefix: Option<Prefix>) -> &RegisterPair {
        match prefix {
            None => &self.regs.hl,
            Some(Prefix::Xdd) => &self.index.ix,
            Some(Prefix::Yfd) => &self.index.iy,
        }
    }

    fn hl_or_index_mut(&mut self, prefix: Option<Prefix>) -> &mut RegisterPair {
        match prefix {
            None => &mut self.regs.hl,
            Some(Prefix::Xdd) => &mut self.index.ix,
            Some(Prefix::Yfd) => &mut self.index.iy,
        }
    }

    pub fn get_reg16(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::BC => self.regs.bc.get16(),
            Reg16::DE => self.regs.de.get16(),
            Reg16::HL => self.regs.hl.get16(),
            Reg16::SP => self.sp,
        }
    }

    pub fn set_reg16(&mut self, reg: Reg16, val: u16) {
        match reg {
            Reg16::BC => self.regs.bc.set16(val),
            Reg16::DE => self.regs.de.set16(val),
            Reg16::HL => self.regs.hl.set16(val),
            Reg16::SP => self.sp = val,
        }
    }

    pub fn get_stk_reg16(&self, reg: StkReg16) -> u16 {
        match reg {
            StkReg16::BC => self.regs.bc.get16(),
            StkReg16::DE => self.regs.de.get16(),
            StkReg16::HL => self.regs.hl.get16(),
            StkReg16::AF => self.af.get16(),
        }
    }

    pub fn set_stk_reg16(&mut self, reg: StkReg16, val: u16) {
        match reg {
            StkReg16::BC => self.regs.bc.set16(val),
            StkReg16::DE => self.regs.de.set16(val),
            StkReg16::HL => self.regs.hl.set16(val),
            StkReg16::AF => self.af.set16(val),
        }
    }

    /// Returns the alternative register pair. `AF` gives `AF'`.
    pub fn get_alt_reg16(&self, reg: StkReg16) -> u16 {
        match reg {
            StkReg16::BC => self.regs_alt.bc.get16(),
            StkReg16::DE => self.regs_alt.de.get16(),
            StkReg16::HL => self.regs_alt.hl.get16(),
            StkReg16::AF => self.af_alt.get16(),
        }
    }

    #[inline]
    pub fn get_index16(&self, prefix: Prefix) -> u16 {
        self.hl_or_index(Some(prefix)).get16()
    }

    #[inline]
    pub fn set_index16(&mut self, prefix: Prefix, val: u16) {
        self.hl_or_index_mut(Some(prefix)).set16(val)
    }

    /// Executes a single step:
    ///
    /// * accepts a pending NMI, or a maskable interrupt if `IFF1` is set,
    /// * otherwise, when halted, idles for a single M1 cycle without fetching,
    /// * otherwise executes one instruction, prefixes included.
    pub fn execute_next<M, T>(&mut self, bus: &mut M, tsc: &mut T)
        where M: Memory<Timestamp=T::Timestamp> + Io<Timestamp=T::Timestamp>, T: Clock
    {
        if self.state.contains(StateFlags::NMI) {
            self.nmi(bus, tsc);
        }
        else if self.iff1 && self.state.contains(StateFlags::INT) {
            self.irq(bus, tsc);
        }
        else if self.is_halt() {
            self.last_code.clear();
            self.inc_r();
            tsc.add_m1(self.pc); // pc:4
        }
        else {
            let pc = self.pc;
            Exec::new(self, bus, tsc).execute_instruction();
            cpu_trace!("{:04X}: {:02X?}", pc, self.last_instruction());
        }
    }

    /// Leaves the `HALT` state. `PC` moves past the `HALT` op-code it was kept on.
    #[inline]
    fn wake_up(&mut self) {
        if self.is_halt() {
            self.state.remove(StateFlags::HALTED);
            self.pc = self.pc.wrapping_add(1);
        }
    }

    fn nmi<M, T>(&mut self, bus: &mut M, tsc: &mut T)
        where M: Memory<Timestamp=T::Timestamp> + Io<Timestamp=T::Timestamp>, T: Clock
    {
        self.state.remove(StateFlags::NMI);
        self.wake_up();
        debug!("NMI accepted at {:04X}", self.pc);
        self.last_code.clear();
        self.iff2 = self.iff1;
        self.iff1 = false;
        self.inc_r();
        let pc = self.pc;
        tsc.add_m1(pc); // pc:4
        let mut exec = Exec::new(self, bus, tsc);
        exec.no_mreq_ir(NO_MREQ_X1); // ir:1
        exec.push16(pc); // sp-1:3, sp-2:3
        self.pc = NMI_RESTART;
        self.wz = NMI_RESTART;
    }

    fn irq<M, T>(&mut self, bus: &mut M, tsc: &mut T)
        where M: Memory<Timestamp=T::Timestamp> + Io<Timestamp=T::Timestamp>, T: Clock
    {
        self.state.remove(StateFlags::INT);
        self.wake_up();
        debug!("INT accepted at {:04X} in {:?}", self.pc, self.im);
        self.last_code.clear();
        self.disable_interrupts();
        self.inc_r();
        let pc = self.pc;
        tsc.add_irq(pc); // pc:6
        let mut exec = Exec::new(self, bus, tsc);
        exec.no_mreq_ir(NO_MREQ_X1); // ir:1
        exec.push16(pc); // sp-1:3, sp-2:3
        let target = match exec.cpu.im {
            InterruptMode::Mode0|InterruptMode::Mode1 => IRQ_RESTART,
            InterruptMode::Mode2 => {
                let vector = u16::from_le_bytes([0xFF, exec.cpu.get_i()]);
                exec.read_mem16(vector) // vector:3, vector+1:3
            }
        };
        self.pc = target;
        self.wz = target;
    }
}
