//! Tests of the `0xDD` and `0xFD` prefixed instructions.
use rand::prelude::*;

mod machine;
use machine::TestMachine;

use z80nemu::*;

#[test]
fn ld_ix_nn_works() {
    let mut m = TestMachine::new(RunMode::OneInstruction);
    m.init_code(&[0xDD, 0x21, 0x34, 0x12]); // LD IX,0x1234
    m.run();
    m.should_keep_registers("IX");
    assert_eq!(m.cpu().get_index16(Prefix::Xdd), 0x1234);
    assert_eq!(m.cpu().get_pc(), 4);
    assert_eq!(m.cpu().get_r(), 2);
    assert_eq!(m.tacts(), 14);
}

#[test]
fn ld_ix_d_n_wraps_displacement() {
    let mut m = TestMachine::new(RunMode::OneInstruction);
    m.init_code(&[0xDD, 0x36, 0xFE, 0x55]); // LD (IX-2),0x55
    m.cpu_mut().set_index16(Prefix::Xdd, 0x1000);
    m.run();
    m.should_keep_registers("");
    m.should_keep_memory("0FFE");
    assert_eq!(m.memory()[0x0FFE], 0x55);
    assert_eq!(m.cpu().get_memptr(), 0x0FFE);
    assert_eq!(m.tacts(), 19);
}

#[test]
fn ld_r_ix_d_uses_plain_registers() {
    let mut m = TestMachine::new(RunMode::UntilEnd);
    m.init_code(&[
        0xDD, 0x66, 0x02, // LD H,(IX+2)
        0xDD, 0x75, 0xFF  // LD (IX-1),L
    ]);
    m.cpu_mut().set_index16(Prefix::Xdd, 0x1000);
    m.cpu_mut().set_reg16(Reg16::HL, 0x0077);
    m.memory_mut()[0x1002] = 0xAB;
    m.run();
    m.should_keep_registers("H");
    m.should_keep_memory("0FFF");
    assert_eq!(m.cpu().get_reg(Reg8::H, None), 0xAB);
    assert_eq!(m.cpu().get_index16(Prefix::Xdd), 0x1000);
    assert_eq!(m.memory()[0x0FFF], 0x77);
    assert_eq!(m.tacts(), 38);
}

#[test]
fn add_a_iy_d_works() {
    let mut m = TestMachine::new(RunMode::OneInstruction);
    m.init_code(&[0xFD, 0x86, 0x05]); // ADD A,(IY+5)
    m.cpu_mut().set_index16(Prefix::Yfd, 0x2000);
    m.cpu_mut().set_acc(0x20);
    m.memory_mut()[0x2005] = 0x10;
    m.run();
    m.should_keep_registers("AF");
    assert_eq!(m.cpu().get_acc(), 0x30);
    assert_eq!(m.cpu().get_memptr(), 0x2005);
    assert_eq!(m.cpu().get_pc(), 3);
    assert_eq!(m.tacts(), 19);
}

#[test]
fn inc_ix_d_works() {
    let mut m = TestMachine::new(RunMode::OneInstruction);
    m.init_code(&[0xDD, 0x34, 0x00]); // INC (IX+0)
    m.cpu_mut().set_index16(Prefix::Xdd, 0x3000);
    m.memory_mut()[0x3000] = 0x7F;
    m.run();
    m.should_keep_registers("F");
    m.should_keep_memory("3000");
    assert_eq!(m.memory()[0x3000], 0x80);
    let flags = m.flags();
    assert!(flags.sf());
    assert!(flags.hf());
    assert!(flags.pvf());
    assert_eq!(m.tacts(), 23);
}

#[test]
fn index_halves_work() {
    let mut m = TestMachine::new(RunMode::UntilEnd);
    m.init_code(&[
        0xDD, 0x26, 0x99, // LD IXH,0x99
        0xDD, 0x6C,       // LD IXL,IXH
        0xFD, 0x2C        // INC IYL
    ]);
    m.run();
    m.should_keep_registers("IX, IY, F");
    assert_eq!(m.cpu().get_index16(Prefix::Xdd), 0x9999);
    assert_eq!(m.cpu().get_index16(Prefix::Yfd), 0x0001);
    assert_eq!(m.tacts(), 11 + 8 + 8);
}

#[test]
fn add_ix_rp_works() {
    let mut m = TestMachine::new(RunMode::UntilEnd);
    m.init_code(&[
        0xDD, 0x09, // ADD IX,BC
        0xDD, 0x29  // ADD IX,IX
    ]);
    m.cpu_mut().set_index16(Prefix::Xdd, 0x1000);
    m.cpu_mut().set_reg16(Reg16::BC, 0x0234);
    m.cpu_mut().set_reg16(Reg16::HL, 0xFFFF);
    m.run();
    m.should_keep_registers("IX, F");
    assert_eq!(m.cpu().get_index16(Prefix::Xdd), 0x2468);
    assert_eq!(m.cpu().get_memptr(), 0x1235);
    assert_eq!(m.tacts(), 30);
}

#[test]
fn ld_sp_ix_and_jp_ix_work() {
    let mut m = TestMachine::new(RunMode::UntilEnd);
    m.init_code(&[
        0xDD, 0xF9, // LD SP,IX
        0xFD, 0xE9  // JP (IY)
    ]);
    m.cpu_mut().set_index16(Prefix::Xdd, 0x4000);
    m.cpu_mut().set_index16(Prefix::Yfd, 0x0004);
    m.run();
    assert_eq!(m.cpu().get_sp(), 0x4000);
    assert_eq!(m.cpu().get_pc(), 4);
    assert_eq!(m.tacts(), 10 + 8);
}

#[test]
fn push_ix_pop_iy_round_trip() {
    let mut rng = StdRng::seed_from_u64(0xDDFD);
    for _ in 0..100 {
        let mut m = TestMachine::new(RunMode::UntilEnd);
        m.init_code(&[
            0xDD, 0xE5, // PUSH IX
            0xFD, 0xE1  // POP IY
        ]);
        let ix: u16 = rng.gen();
        m.cpu_mut().set_index16(Prefix::Xdd, ix);
        m.cpu_mut().set_sp(0x8000);
        m.run();
        m.should_keep_registers("IY");
        m.should_keep_memory("7FFE-7FFF");
        assert_eq!(m.cpu().get_index16(Prefix::Yfd), ix);
        assert_eq!(m.tacts(), 15 + 14);
    }
}

#[test]
fn ex_sp_ix_round_trip() {
    let mut rng = StdRng::seed_from_u64(0xE3);
    for _ in 0..100 {
        let mut m = TestMachine::new(RunMode::OneInstruction);
        m.init_code(&[0xDD, 0xE3]); // EX (SP),IX
        let ix: u16 = rng.gen();
        let mem: u16 = rng.gen();
        let sp: u16 = rng.gen_range(0x1000..0xF000);
        m.cpu_mut().set_index16(Prefix::Xdd, ix);
        m.cpu_mut().set_sp(sp);
        m.memory_mut()[sp as usize..sp as usize + 2].copy_from_slice(&mem.to_le_bytes());
        m.run();
        m.should_keep_registers("IX");
        assert_eq!(m.cpu().get_index16(Prefix::Xdd), mem);
        assert_eq!(m.cpu().get_memptr(), mem);
        assert_eq!(&m.memory()[sp as usize..sp as usize + 2], &ix.to_le_bytes());
        assert_eq!(m.tacts(), 23);
    }
}

#[test]
fn repeated_prefixes_count_as_one_instruction() {
    let mut m = TestMachine::new(RunMode::OneInstruction);
    m.init_code(&[0xDD, 0xFD, 0x21, 0x34, 0x12]); // LD IY,0x1234
    m.run();
    m.should_keep_registers("IY");
    assert_eq!(m.cpu().get_index16(Prefix::Yfd), 0x1234);
    assert_eq!(m.cpu().get_index16(Prefix::Xdd), 0);
    assert_eq!(m.cpu().last_instruction(), &[0xFD, 0x21, 0x34, 0x12]);
    assert_eq!(m.cpu().get_pc(), 5);
    assert_eq!(m.cpu().get_r(), 3);
    assert_eq!(m.tacts(), 18);
}

#[test]
fn index_prefix_before_ed_is_dropped() {
    let mut m = TestMachine::new(RunMode::OneInstruction);
    m.init_code(&[0xDD, 0xED, 0x44]); // NEG
    m.cpu_mut().set_acc(0x01);
    m.run();
    assert_eq!(m.cpu().get_acc(), 0xFF);
    assert_eq!(m.cpu().last_instruction(), &[0xED, 0x44]);
    assert_eq!(m.cpu().get_pc(), 3);
    assert_eq!(m.tacts(), 12);
}

#[test]
fn index_prefix_on_unaffected_op() {
    let mut m = TestMachine::new(RunMode::OneInstruction);
    m.init_code(&[0xFD, 0x04]); // INC B
    m.run();
    m.should_keep_registers("B, F");
    assert_eq!(m.cpu().get_reg(Reg8::B, None), 1);
    assert_eq!(m.tacts(), 8);
}

#[test]
fn ld_ix_d_h_keeps_h() {
    let mut m = TestMachine::new(RunMode::OneInstruction);
    m.init_code(&[0xDD, 0x74, 0x01]); // LD (IX+1),H
    m.cpu_mut().set_index16(Prefix::Xdd, 0x3000);
    m.cpu_mut().set_reg16(Reg16::HL, 0x4200);
    m.run();
    m.should_keep_memory("3001");
    assert_eq!(m.memory()[0x3001], 0x42);
}
