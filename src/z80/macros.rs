/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! Macros used by the op-code tables and the instruction handlers.

/// Builds a `[descriptor; 256]` table by calling a `const fn` decoder for every op-code.
macro_rules! build_table {
    ($default:expr, $decode:ident) => {
        {
            let mut table = [$default; 256];
            let mut code = 0usize;
            while code < 256 {
                table[code] = $decode(code as u8);
                code += 1;
            }
            table
        }
    };
}

/// Adds a signed 8-bit displacement to an index register value, wrapping at 16 bits.
macro_rules! indexed_address {
    ($ii:expr, $d:expr) => {
        $ii.wrapping_add($d as i8 as i16 as u16)
    };
}
