/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! Instruction handlers of the main, `0xCB`, `0xED` and the indexed op-code spaces.
//!
//! The comments next to the bus operations list the machine cycles in the
//! `address:T-states` notation. The M1 cycle of the op-code is not shown.
use log::debug;

use crate::cpu::*;
use crate::host::{Clock, Io, Memory};
use super::decode::*;
use super::internal::{cycles::*, Exec, WordBytes};
use super::ops;

impl<'a, M, T> Exec<'a, M, T>
    where M: Memory<Timestamp=T::Timestamp> + Io<Timestamp=T::Timestamp>, T: Clock
{
    /// Fetches and executes one complete instruction with all of its prefixes.
    pub fn execute_instruction(&mut self) {
        self.cpu.last_code.clear();
        let mut code = self.fetch_opcode();
        loop {
            match MAIN_OPS[code as usize] {
                Op::PrefixIndex(prefix) => {
                    if self.prefix.replace(prefix).is_some() {
                        // the previous prefix is discarded, it was a 4 T-states NOP
                        self.cpu.last_code.clear();
                        self.cpu.push_code(code);
                    }
                    code = self.fetch_opcode();
                }
                Op::PrefixEd => {
                    if self.prefix.take().is_some() {
                        self.cpu.last_code.clear();
                        self.cpu.push_code(code);
                    }
                    return self.execute_ed()
                }
                Op::PrefixCb => {
                    return match self.prefix {
                        Some(prefix) => self.execute_index_cb(prefix),
                        None => self.execute_cb()
                    }
                }
                op => return self.execute_main(op)
            }
        }
    }

    fn execute_main(&mut self, op: Op) {
        match op {
            Op::Nop => {}
            Op::LdRpNn(rp) => { // pc+1:3, pc+2:3
                let nn = self.fetch_imm16();
                self.set_rp(rp, nn);
            }
            Op::LdIndA(rp) => {
                let address = self.cpu.get_reg16(rp);
                let a = self.acc();
                self.write_mem(address, a); // rp:3
                self.cpu.wz = u16::from_le_bytes([address.wrapping_add(1) as u8, a]);
            }
            Op::LdAInd(rp) => {
                let address = self.cpu.get_reg16(rp);
                let val = self.read_mem(address); // rp:3
                self.set_acc(val);
                self.cpu.wz = address.wrapping_add(1);
            }
            Op::IncRp(rp) => {
                self.no_mreq_ir(NO_MREQ_X2); // ir:1 x 2
                let val = self.get_rp(rp).wrapping_add(1);
                self.set_rp(rp, val);
            }
            Op::DecRp(rp) => {
                self.no_mreq_ir(NO_MREQ_X2); // ir:1 x 2
                let val = self.get_rp(rp).wrapping_sub(1);
                self.set_rp(rp, val);
            }
            Op::Inc(arg) => self.modify_operand(arg, ops::inc),
            Op::Dec(arg) => self.modify_operand(arg, ops::dec),
            Op::LdN(Operand::Reg(reg)) => {
                let n = self.fetch_imm8(); // pc+1:3
                self.set_reg8(reg, n);
            }
            Op::LdN(Operand::Mem) => {
                let address = match self.prefix {
                    None => self.cpu.regs.hl.get16(),
                    Some(prefix) => {
                        let d = self.fetch_imm8(); // pc+2:3
                        self.indexed_address(prefix, d)
                    }
                };
                let n = self.fetch_imm8(); // pc+1:3 or pc+3:3
                if self.prefix.is_some() {
                    let pc = self.cpu.pc.wrapping_sub(1);
                    self.no_mreq(pc, NO_MREQ_X2); // pc+3:1 x 2
                }
                self.write_mem(address, n); // hl:3
            }
            Op::Rlca => self.modify_acc(ops::rlca),
            Op::Rrca => self.modify_acc(ops::rrca),
            Op::Rla => self.modify_acc(ops::rla),
            Op::Rra => self.modify_acc(ops::rra),
            Op::ExAf => self.cpu.ex_af_af(),
            Op::AddHlRp(rp) => {
                let hl = self.get_hl();
                let val = self.get_rp(rp);
                self.no_mreq_ir(NO_MREQ_X7); // ir:1 x 7
                let (res, flags) = ops::add16(hl, val, self.flags());
                self.cpu.wz = hl.wrapping_add(1);
                self.set_hl(res);
                self.set_flags(flags);
            }
            Op::Djnz => {
                self.no_mreq_ir(NO_MREQ_X1); // ir:1
                let e = self.fetch_imm8(); // pc+1:3
                let b = self.cpu.regs.bc.hi().wrapping_sub(1);
                self.cpu.regs.bc.set_hi(b);
                if b != 0 {
                    self.jump_relative(e);
                }
            }
            Op::Jr => {
                let e = self.fetch_imm8(); // pc+1:3
                self.jump_relative(e);
            }
            Op::JrCc(cc) => {
                let e = self.fetch_imm8(); // pc+1:3
                if cc.is_satisfied(self.flags()) {
                    self.jump_relative(e);
                }
            }
            Op::LdNnHl => {
                let nn = self.fetch_imm16(); // pc+1:3, pc+2:3
                let hl = self.get_hl();
                self.write_mem16(nn, hl); // nn:3, nn+1:3
                self.cpu.wz = nn.wrapping_add(1);
            }
            Op::LdHlNn => {
                let nn = self.fetch_imm16(); // pc+1:3, pc+2:3
                let val = self.read_mem16(nn); // nn:3, nn+1:3
                self.set_hl(val);
                self.cpu.wz = nn.wrapping_add(1);
            }
            Op::LdNnA => {
                let nn = self.fetch_imm16(); // pc+1:3, pc+2:3
                let a = self.acc();
                self.write_mem(nn, a); // nn:3
                self.cpu.wz = u16::from_le_bytes([nn.wrapping_add(1) as u8, a]);
            }
            Op::LdANn => {
                let nn = self.fetch_imm16(); // pc+1:3, pc+2:3
                let val = self.read_mem(nn); // nn:3
                self.set_acc(val);
                self.cpu.wz = nn.wrapping_add(1);
            }
            Op::Daa => self.modify_acc(ops::daa),
            Op::Cpl => self.modify_acc(ops::cpl),
            Op::Scf => {
                let flags = ops::scf(self.acc(), self.flags());
                self.set_flags(flags);
            }
            Op::Ccf => {
                let flags = ops::ccf(self.acc(), self.flags());
                self.set_flags(flags);
            }
            Op::Ld(Operand::Reg(dst), Operand::Reg(src)) => {
                let val = self.get_reg8(src);
                self.set_reg8(dst, val);
            }
            Op::Ld(Operand::Reg(dst), Operand::Mem) => {
                let address = self.operand_address();
                let val = self.read_mem(address); // hl:3
                self.write_operand_plain(dst, val);
            }
            Op::Ld(Operand::Mem, Operand::Reg(src)) => {
                let address = self.operand_address();
                let val = self.read_operand_plain(src);
                self.write_mem(address, val); // hl:3
            }
            // LD (HL),(HL) decodes as HALT
            Op::Halt | Op::Ld(Operand::Mem, Operand::Mem) => {
                // PC stays on the op-code until a signal wakes the Cpu
                let pc = self.cpu.pc.wrapping_sub(1);
                self.cpu.pc = pc;
                self.cpu.state.insert(StateFlags::HALTED);
                debug!("HALT at {:04X}", pc);
            }
            Op::Alu(op, arg) => {
                let val = match arg {
                    Operand::Reg(reg) => self.get_reg8(reg),
                    Operand::Mem => {
                        let address = self.operand_address();
                        self.read_mem(address) // hl:3
                    }
                };
                self.alu(op, val);
            }
            Op::AluN(op) => {
                let n = self.fetch_imm8(); // pc+1:3
                self.alu(op, n);
            }
            Op::RetCc(cc) => {
                self.no_mreq_ir(NO_MREQ_X1); // ir:1
                if cc.is_satisfied(self.flags()) {
                    self.ret(); // sp:3, sp+1:3
                }
            }
            Op::Pop(ss) => {
                let val = self.pop16(); // sp:3, sp+1:3
                match ss {
                    StkReg16::HL => self.set_hl(val),
                    ss => self.cpu.set_stk_reg16(ss, val)
                }
            }
            Op::JpCc(cc) => {
                let nn = self.fetch_imm16(); // pc+1:3, pc+2:3
                self.cpu.wz = nn;
                if cc.is_satisfied(self.flags()) {
                    self.cpu.pc = nn;
                }
            }
            Op::Jp => {
                let nn = self.fetch_imm16(); // pc+1:3, pc+2:3
                self.cpu.wz = nn;
                self.cpu.pc = nn;
            }
            Op::CallCc(cc) => {
                let nn = self.fetch_imm16(); // pc+1:3, pc+2:3
                self.cpu.wz = nn;
                if cc.is_satisfied(self.flags()) {
                    self.call(nn); // pc+2:1, sp-1:3, sp-2:3
                }
            }
            Op::Push(ss) => {
                self.no_mreq_ir(NO_MREQ_X1); // ir:1
                let val = match ss {
                    StkReg16::HL => self.get_hl(),
                    ss => self.cpu.get_stk_reg16(ss)
                };
                self.push16(val); // sp-1:3, sp-2:3
            }
            Op::Rst(address) => {
                self.no_mreq_ir(NO_MREQ_X1); // ir:1
                let pc = self.cpu.pc;
                self.push16(pc); // sp-1:3, sp-2:3
                self.cpu.pc = address;
                self.cpu.wz = address;
            }
            Op::Ret => self.ret(), // sp:3, sp+1:3
            Op::Call => {
                let nn = self.fetch_imm16(); // pc+1:3, pc+2:3
                self.cpu.wz = nn;
                self.call(nn); // pc+2:1, sp-1:3, sp-2:3
            }
            Op::OutNA => {
                let n = self.fetch_imm8(); // pc+1:3
                let a = self.acc();
                let port = u16::from_le_bytes([n, a]);
                self.write_io(port, a); // IO
                self.cpu.wz = u16::from_le_bytes([n.wrapping_add(1), a]);
            }
            Op::InAN => {
                let n = self.fetch_imm8(); // pc+1:3
                let port = u16::from_le_bytes([n, self.acc()]);
                let val = self.read_io(port); // IO
                self.set_acc(val);
                self.cpu.wz = port.wrapping_add(1);
            }
            Op::Exx => self.cpu.exx(),
            Op::ExSpHl => {
                let sp = self.cpu.sp;
                let sp1 = sp.wrapping_add(1);
                let val = self.read_mem16(sp); // sp:3, sp+1:3
                self.no_mreq(sp1, NO_MREQ_X1); // sp+1:1
                let hl = self.get_hl();
                self.write_mem(sp1, hl.msb()); // sp+1:3
                self.write_mem(sp, hl.lsb()); // sp:3
                self.no_mreq(sp, NO_MREQ_X2); // sp:1 x 2
                self.set_hl(val);
                self.cpu.wz = val;
            }
            Op::JpHl => {
                self.cpu.pc = self.get_hl();
            }
            Op::ExDeHl => self.cpu.ex_de_hl(),
            Op::Di => self.cpu.disable_interrupts(),
            Op::Ei => self.cpu.enable_interrupts(),
            Op::LdSpHl => {
                self.no_mreq_ir(NO_MREQ_X2); // ir:1 x 2
                self.cpu.sp = self.get_hl();
            }
            // dispatched by execute_instruction
            Op::PrefixCb|Op::PrefixEd|Op::PrefixIndex(..) => {}
        }
    }

    #[inline]
    fn modify_acc(&mut self, op: fn(u8, CpuFlags) -> (u8, CpuFlags)) {
        let (res, flags) = op(self.acc(), self.flags());
        self.set_acc(res);
        self.set_flags(flags);
    }

    #[inline]
    fn alu(&mut self, op: Ops8, val: u8) {
        let (res, flags) = ops::alu(op, self.acc(), val, self.flags());
        self.set_acc(res);
        self.set_flags(flags);
    }

    /// `INC` and `DEC` of a register or a memory operand.
    fn modify_operand(&mut self, arg: Operand, op: fn(u8, CpuFlags) -> (u8, CpuFlags)) {
        match arg {
            Operand::Reg(reg) => {
                let (res, flags) = op(self.get_reg8(reg), self.flags());
                self.set_reg8(reg, res);
                self.set_flags(flags);
            }
            Operand::Mem => {
                let address = self.operand_address();
                let val = self.read_mem(address); // hl:3
                self.no_mreq(address, NO_MREQ_X1); // hl:1
                let (res, flags) = op(val, self.flags());
                self.write_mem(address, res); // hl:3
                self.set_flags(flags);
            }
        }
    }

    fn jump_relative(&mut self, e: u8) {
        let pc = self.cpu.pc;
        self.no_mreq(pc.wrapping_sub(1), NO_MREQ_X5); // pc+1:1 x 5
        let pc = pc.wrapping_add(e as i8 as i16 as u16);
        self.cpu.pc = pc;
        self.cpu.wz = pc;
    }

    fn call(&mut self, address: u16) {
        let pc = self.cpu.pc;
        self.no_mreq(pc.wrapping_sub(1), NO_MREQ_X1); // pc+2:1
        self.push16(pc); // sp-1:3, sp-2:3
        self.cpu.pc = address;
    }

    fn ret(&mut self) {
        let pc = self.pop16(); // sp:3, sp+1:3
        self.cpu.pc = pc;
        self.cpu.wz = pc;
    }

    /// Applies a `0xCB` operation to `val`. Returns `None` for `BIT`, which only
    /// affects Flags. `xy` is the source of the undocumented Flags of `BIT`.
    fn bit_op(&mut self, op: BitOp, val: u8, xy: u8) -> Option<u8> {
        let flags = self.flags();
        match op {
            BitOp::Rot(rot, _) => {
                let (res, flags) = ops::rot(rot, val, flags);
                self.set_flags(flags);
                Some(res)
            }
            BitOp::Bit(n, _) => {
                self.set_flags(ops::bit(n, val, xy, flags));
                None
            }
            BitOp::Res(n, _) => Some(ops::res(n, val)),
            BitOp::Set(n, _) => Some(ops::set(n, val)),
        }
    }

    fn execute_cb(&mut self) {
        let code = self.fetch_opcode(); // pc+1:4
        let op = BIT_OPS[code as usize];
        match op.operand() {
            Operand::Reg(reg) => {
                let val = self.cpu.get_reg(reg, None);
                if let Some(res) = self.bit_op(op, val, val) {
                    self.cpu.set_reg(reg, None, res);
                }
            }
            Operand::Mem => {
                let hl = self.cpu.regs.hl.get16();
                let val = self.read_mem(hl); // hl:3
                self.no_mreq(hl, NO_MREQ_X1); // hl:1
                let xy = self.cpu.wz.msb();
                if let Some(res) = self.bit_op(op, val, xy) {
                    self.write_mem(hl, res); // hl:3
                }
            }
        }
    }

    /// `0xDD 0xCB d op` and `0xFD 0xCB d op`.
    ///
    /// Neither the displacement nor the last op-code are fetched in M1 cycles.
    /// Besides writing the result to memory, the non-`BIT` operations also load it
    /// into the register selected by bits `0..=2` unless they are `0b110`.
    fn execute_index_cb(&mut self, prefix: Prefix) {
        let d = self.fetch_imm8(); // pc+2:3
        let code = self.fetch_imm8(); // pc+3:3
        let pc = self.cpu.pc.wrapping_sub(1);
        self.no_mreq(pc, NO_MREQ_X2); // pc+3:1 x 2
        let op = BIT_OPS[code as usize];
        let address = self.indexed_address(prefix, d);
        let val = self.read_mem(address); // ii+d:3
        self.no_mreq(address, NO_MREQ_X1); // ii+d:1
        if let Some(res) = self.bit_op(op, val, address.msb()) {
            self.write_mem(address, res); // ii+d:3
            if let Operand::Reg(reg) = op.operand() {
                self.cpu.set_reg(reg, None, res);
            }
        }
    }

    fn execute_ed(&mut self) {
        let code = self.fetch_opcode(); // pc+1:4
        match ED_OPS[code as usize] {
            EdOp::Nop => {}
            EdOp::InC(reg) => {
                let bc = self.cpu.regs.bc.get16();
                let val = self.read_io(bc); // IO
                self.cpu.wz = bc.wrapping_add(1);
                let flags = ops::io(val, self.flags());
                self.set_flags(flags);
                if let Some(reg) = reg {
                    self.cpu.set_reg(reg, None, val);
                }
            }
            EdOp::OutC(reg) => {
                let bc = self.cpu.regs.bc.get16();
                let val = reg.map_or(0, |reg| self.cpu.get_reg(reg, None));
                self.write_io(bc, val); // IO
                self.cpu.wz = bc.wrapping_add(1);
            }
            EdOp::SbcHl(rp) => self.hl_carry_op(rp, ops::sbc16),
            EdOp::AdcHl(rp) => self.hl_carry_op(rp, ops::adc16),
            EdOp::LdNnRp(rp) => {
                let nn = self.fetch_imm16(); // pc+2:3, pc+3:3
                let val = self.cpu.get_reg16(rp);
                self.write_mem16(nn, val); // nn:3, nn+1:3
                self.cpu.wz = nn.wrapping_add(1);
            }
            EdOp::LdRpNn(rp) => {
                let nn = self.fetch_imm16(); // pc+2:3, pc+3:3
                let val = self.read_mem16(nn); // nn:3, nn+1:3
                self.cpu.set_reg16(rp, val);
                self.cpu.wz = nn.wrapping_add(1);
            }
            EdOp::Neg => {
                let (res, flags) = ops::neg(self.acc());
                self.set_acc(res);
                self.set_flags(flags);
            }
            EdOp::Retn|EdOp::Reti => {
                self.ret(); // sp:3, sp+1:3
                self.cpu.iff1 = self.cpu.iff2;
            }
            EdOp::Im(mode) => self.cpu.im = mode,
            EdOp::LdIA => {
                self.no_mreq_ir(NO_MREQ_X1); // ir:1
                let a = self.acc();
                self.cpu.set_i(a);
            }
            EdOp::LdRA => {
                self.no_mreq_ir(NO_MREQ_X1); // ir:1
                let a = self.acc();
                self.cpu.set_r(a);
            }
            EdOp::LdAI => {
                self.no_mreq_ir(NO_MREQ_X1); // ir:1
                let i = self.cpu.get_i();
                self.ld_a_ir(i);
            }
            EdOp::LdAR => {
                self.no_mreq_ir(NO_MREQ_X1); // ir:1
                let r = self.cpu.get_r();
                self.ld_a_ir(r);
            }
            EdOp::Rrd => self.rotate_digit(ops::rrd),
            EdOp::Rld => self.rotate_digit(ops::rld),
            EdOp::Block(op) => self.execute_block(op),
            EdOp::Next(op) if self.cpu.extended_instructions => self.execute_next_op(op),
            EdOp::Next(op) => {
                debug!("{:?} (ED {:02X}) without the extended instruction set: NOP", op, code);
            }
        }
    }

    fn hl_carry_op(&mut self, rp: Reg16, op: fn(u16, u16, CpuFlags) -> (u16, CpuFlags)) {
        let hl = self.cpu.regs.hl.get16();
        let val = self.cpu.get_reg16(rp);
        self.no_mreq_ir(NO_MREQ_X7); // ir:1 x 7
        let (res, flags) = op(hl, val, self.flags());
        self.cpu.wz = hl.wrapping_add(1);
        self.cpu.regs.hl.set16(res);
        self.set_flags(flags);
    }

    fn ld_a_ir(&mut self, val: u8) {
        let flags = ops::ld_a_ir(val, self.cpu.iff2, self.flags());
        self.set_acc(val);
        self.set_flags(flags);
    }

    fn rotate_digit(&mut self, op: fn(u8, u8, CpuFlags) -> (u8, u8, CpuFlags)) {
        let hl = self.cpu.regs.hl.get16();
        let val = self.read_mem(hl); // hl:3
        self.no_mreq(hl, NO_MREQ_X4); // hl:1 x 4
        let (acc, res, flags) = op(self.acc(), val, self.flags());
        self.write_mem(hl, res); // hl:3
        self.set_acc(acc);
        self.set_flags(flags);
        self.cpu.wz = hl.wrapping_add(1);
    }

    /// The `LDI`..`OTDR` family.
    fn execute_block(&mut self, BlockOp { kind, delta, repeat }: BlockOp) {
        let repeats = match kind {
            BlockKind::Ld => {
                let hl = self.cpu.regs.hl.get16();
                let de = self.cpu.regs.de.get16();
                let val = self.read_mem(hl); // hl:3
                self.write_mem(de, val); // de:3
                self.no_mreq(de, NO_MREQ_X2); // de:1 x 2
                self.cpu.regs.hl.set16(delta.apply(hl));
                self.cpu.regs.de.set16(delta.apply(de));
                let bc_is_zero = self.cpu.regs.bc.dec16_is_zero();
                let flags = ops::ldx(self.acc(), val, bc_is_zero, self.flags());
                self.set_flags(flags);
                !bc_is_zero
            }
            BlockKind::Cp => {
                let hl = self.cpu.regs.hl.get16();
                let val = self.read_mem(hl); // hl:3
                self.no_mreq(hl, NO_MREQ_X5); // hl:1 x 5
                self.cpu.regs.hl.set16(delta.apply(hl));
                let bc_is_zero = self.cpu.regs.bc.dec16_is_zero();
                let flags = ops::cpx(self.acc(), val, bc_is_zero, self.flags());
                self.set_flags(flags);
                self.cpu.wz = delta.apply(self.cpu.wz);
                !bc_is_zero && !flags.zf()
            }
            BlockKind::In => {
                self.no_mreq_ir(NO_MREQ_X1); // ir:1
                let bc = self.cpu.regs.bc.get16();
                let hl = self.cpu.regs.hl.get16();
                let data = self.read_io(bc); // IO
                self.write_mem(hl, data); // hl:3
                self.cpu.wz = delta.apply(bc);
                let b = bc.msb().wrapping_sub(1);
                self.cpu.regs.bc.set_hi(b);
                self.cpu.regs.hl.set16(delta.apply(hl));
                let c = delta.apply(bc.lsb().into()) as u8;
                self.set_flags(ops::iox(data, b, c));
                b != 0
            }
            BlockKind::Out => {
                self.no_mreq_ir(NO_MREQ_X1); // ir:1
                let hl = self.cpu.regs.hl.get16();
                let data = self.read_mem(hl); // hl:3
                let b = self.cpu.regs.bc.hi().wrapping_sub(1);
                self.cpu.regs.bc.set_hi(b);
                let bc = self.cpu.regs.bc.get16();
                self.write_io(bc, data); // IO
                let hl = delta.apply(hl);
                self.cpu.regs.hl.set16(hl);
                self.cpu.wz = delta.apply(bc);
                self.set_flags(ops::iox(data, b, hl.lsb()));
                b != 0
            }
        };
        if repeat && repeats {
            self.repeat_block();
        }
    }

    /// Moves PC back to the first byte of the repeated block instruction.
    pub fn repeat_block(&mut self) {
        let pc = self.cpu.pc.wrapping_sub(2);
        self.no_mreq(pc.wrapping_add(1), NO_MREQ_X5); // pc+1:1 x 5
        self.cpu.pc = pc;
        self.cpu.wz = pc.wrapping_add(1);
    }
}
