/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! Cpu building blocks: flags, op-code bit fields and the register file.
mod flags;
mod parse;
mod registers;

pub use flags::*;
pub use parse::*;
pub use registers::*;
