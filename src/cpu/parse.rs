/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! Op-code bits parsing and their enum representations.
#![allow(clippy::inconsistent_digit_grouping)]
use core::fmt;
#[cfg(feature = "serde")] use serde::{Serialize, Deserialize};
use super::flags::CpuFlags;

/// An index prefix that modifies behaviour of the next op-code.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Prefix {
    Xdd  = 0xDD,
    Yfd  = 0xFD
}

impl TryFrom<u8> for Prefix {
    type Error = ();

    #[inline]
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0xDD => Ok(Prefix::Xdd),
            0xFD => Ok(Prefix::Yfd),
            _ => Err(())
        }
    }
}

/// Displays prefix as a corresponding register pair.
impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Prefix::Xdd  => "IX",
            Prefix::Yfd  => "IY",
        })
    }
}

macro_rules! reg_enum_mask_try_from {
    ($name:ident & ($mask:expr) {$($n:ident = $e:expr;)*}) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($n = $e,)*
        }

        impl $name {
            /// Parses the masked op-code bits, `None` if they select the memory operand.
            #[inline]
            pub const fn from_code(value: u8) -> Option<Self> {
                match value & ($mask) {
                    $($e => Some($name::$n),)*
                    _ => None
                }
            }
        }

        impl TryFrom<u8> for $name {
            type Error = ();

            #[inline]
            fn try_from(value: u8) -> Result<Self, Self::Error> {
                $name::from_code(value).ok_or(())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $($name::$n => stringify!($n),)*
                })
            }
        }
    };
}

/// The items must exhaust all the combinations of bits selected by `$mask`.
macro_rules! reg_enum_mask_from {
    ($vis:vis $name:ident & ($mask:expr) {$($n:ident = $e:expr;)*}) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        $vis enum $name {
            $($n = $e,)*
        }

        impl $name {
            #[inline]
            pub const fn from_code(value: u8) -> Self {
                match value & ($mask) {
                    $($e => $name::$n,)*
                    _ => unreachable!()
                }
            }
        }

        impl From<u8> for $name {
            #[inline]
            fn from(value: u8) -> Self {
                $name::from_code(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $($name::$n => stringify!($n),)*
                })
            }
        }
    };
}

reg_enum_mask_try_from!{
    Reg8 & (0b111) {
        B = 0b000;
        C = 0b001;
        D = 0b010;
        E = 0b011;
        H = 0b100;
        L = 0b101;
        // (HL)|n = 0b110;
        A = 0b111;
    }
}

reg_enum_mask_from!{
pub StkReg16  & (0b00_11_0000) {
            BC = 0b00_00_0000;
            DE = 0b00_01_0000;
            HL = 0b00_10_0000;
            AF = 0b00_11_0000;
    }
}

reg_enum_mask_from!{
pub Reg16 & (0b00_11_0000) {
        BC = 0b00_00_0000;
        DE = 0b00_01_0000;
        HL = 0b00_10_0000;
        SP = 0b00_11_0000;
    }
}

reg_enum_mask_from!{
pub Ops8   & (0b00_111_000) {
        ADD = 0b00_000_000;
        ADC = 0b00_001_000;
        SUB = 0b00_010_000;
        SBC = 0b00_011_000;
        AND = 0b00_100_000;
        XOR = 0b00_101_000;
        OR  = 0b00_110_000;
        CP  = 0b00_111_000;
    }
}

reg_enum_mask_from!{
pub Rot    & (0b00_111_000) {
        RLC = 0b00_000_000;
        RRC = 0b00_001_000;
        RL  = 0b00_010_000;
        RR  = 0b00_011_000;
        SLA = 0b00_100_000;
        SRA = 0b00_101_000;
        SLL = 0b00_110_000;
        SRL = 0b00_111_000;
    }
}

reg_enum_mask_from!{
pub Condition
           & (0b00_111_000) {
        NZ  = 0b00_000_000;
        Z   = 0b00_001_000;
        NC  = 0b00_010_000;
        C   = 0b00_011_000;
        PO  = 0b00_100_000;
        PE  = 0b00_101_000;
        P   = 0b00_110_000;
        M   = 0b00_111_000;
    }
}

impl Condition {
    /// Parses `JR cc` op-code into one of the 4 conditions it supports.
    #[inline]
    pub const fn from_jr_subset(code: u8) -> Self {
        Condition::from_code(code & 0b00_011_000)
    }

    #[inline]
    pub fn is_satisfied(self, flags: CpuFlags) -> bool {
        match self {
            Condition::NZ => !flags.zf(),
            Condition::Z  =>  flags.zf(),
            Condition::NC => !flags.cf(),
            Condition::C  =>  flags.cf(),
            Condition::PO => !flags.pvf(),
            Condition::PE =>  flags.pvf(),
            Condition::P  => !flags.sf(),
            Condition::M  =>  flags.sf(),
        }
    }
}

/// Parses the bit number from bits 3..=5 of a `0xCB` op-code.
#[inline]
pub(crate) const fn parse_bit_number(code: u8) -> u8 {
    (code >> 3) & 7
}

/// Parses `RST p` op-code as an absolute target address.
#[inline]
pub(crate) const fn parse_restart_address(code: u8) -> u16 {
    (code & 0b00_111_000) as u16
}
