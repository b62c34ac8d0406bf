//! Selected Z80 op-codes used to build the test programs.
pub const ED_PREFIX     : u8 = 0xED;
pub const CB_PREFIX     : u8 = 0xCB;
pub const DD_PREFIX     : u8 = 0xDD;
pub const FD_PREFIX     : u8 = 0xFD;
pub const NOP_OPCODE    : u8 = 0x00;
pub const HALT_OPCODE   : u8 = 0x76;
pub const DI_OPCODE     : u8 = 0xF3;
pub const EI_OPCODE     : u8 = 0xFB;
pub const RET_OPCODE    : u8 = 0xC9;
pub const CALL_OPCODE   : u8 = 0xCD;
pub const JP_OPCODE     : u8 = 0xC3;
pub const JR_OPCODE     : u8 = 0x18;
/// `RST p` is built with `RST_OPBASE|p`.
pub const RST_OPBASE    : u8 = 0b11_000_111;
pub const RETN_OPCODE_T2: (u8, u8) = (ED_PREFIX, 0x45);
pub const NEXTREG_OPCODE_T2: (u8, u8) = (ED_PREFIX, 0x91);
