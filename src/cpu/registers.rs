/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! This module contains cpu registers related building blocks.
use core::fmt;
use bitflags::bitflags;
#[cfg(feature = "serde")] use serde::{Serialize, Deserialize, Serializer, de::{
                                            self, Deserializer, Visitor, SeqAccess}};

use super::flags::CpuFlags;

/// The interrupt mode enum.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[repr(u8)]
pub enum InterruptMode {
    #[default]
    Mode0 = 0,
    Mode1 = 1,
    Mode2 = 2,
}

impl TryFrom<u8> for InterruptMode {
    type Error = ();

    #[inline]
    fn try_from(im: u8) -> Result<Self, Self::Error> {
        match im {
            0 => Ok(InterruptMode::Mode0),
            1 => Ok(InterruptMode::Mode1),
            2 => Ok(InterruptMode::Mode2),
            _ => Err(())
        }
    }
}

bitflags! {
    /// Signals and the HALT condition of the Cpu.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct StateFlags: u8 {
        /// The Cpu is idling after a `HALT` instruction.
        const HALTED = 0b0000_0001;
        /// A non-maskable interrupt is pending.
        const NMI    = 0b0000_0010;
        /// A maskable interrupt request is active.
        const INT    = 0b0000_0100;
    }
}

/// A register pair that can be treated as a single 16-bit register or as
/// separate 8-bit (MSB/LSB) registers.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct RegisterPair(u16);

impl RegisterPair {
    #[inline]
    pub const fn new(hi: u8, lo: u8) -> Self {
        RegisterPair((hi as u16) << 8 | lo as u16)
    }

    #[inline]
    pub const fn get16(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn set16(&mut self, val: u16) {
        self.0 = val;
    }

    #[inline]
    pub const fn hi(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn lo(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub fn set_hi(&mut self, val: u8) {
        self.0 = (self.0 & 0x00FF) | (val as u16) << 8;
    }

    #[inline]
    pub fn set_lo(&mut self, val: u8) {
        self.0 = (self.0 & 0xFF00) | val as u16;
    }

    /// Returns `(hi, lo)`.
    #[inline]
    pub const fn get(self) -> (u8, u8) {
        (self.hi(), self.lo())
    }

    #[inline]
    pub fn dec16(&mut self) {
        self.0 = self.0.wrapping_sub(1);
    }

    /// Subtracts 1 from the 16-bit register and returns true if the result is 0.
    #[inline]
    pub fn dec16_is_zero(&mut self) -> bool {
        self.dec16();
        self.0 == 0
    }
}

impl From<u16> for RegisterPair {
    fn from(uint: u16) -> Self {
        RegisterPair(uint)
    }
}

impl From<i16> for RegisterPair {
    fn from(int: i16) -> Self {
        RegisterPair(int as u16)
    }
}

/// Expects `[lo, hi]` as in memory.
impl From<[u8;2]> for RegisterPair {
    fn from(pair: [u8;2]) -> Self {
        RegisterPair(u16::from_le_bytes(pair))
    }
}

impl From<RegisterPair> for u16 {
    fn from(pair: RegisterPair) -> Self {
        pair.0
    }
}

impl fmt::Debug for RegisterPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

#[cfg(feature = "serde")]
impl Serialize for RegisterPair {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: Serializer
    {
        serializer.serialize_u16(self.0)
    }
}

#[cfg(feature = "serde")]
struct RegisterPairVisitor;

#[cfg(feature = "serde")]
impl<'de> Visitor<'de> for RegisterPairVisitor {
    type Value = RegisterPair;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a signed or unsigned 16-bit integer, a tuple of 8-bit integers or a hex string")
    }

    fn visit_u16<E: de::Error>(self, value: u16) -> Result<Self::Value, E> {
        Ok(RegisterPair::from(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        i16::try_from(value).map(RegisterPair::from)
            .map_err(|_| E::custom(format!("register pair out of range: {}", value)))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        u16::try_from(value).map(RegisterPair::from)
            .map_err(|_| E::custom(format!("register pair out of range: {}", value)))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where A: SeqAccess<'de>
    {
        if let Some(lo) = seq.next_element::<u8>()? {
            if let Some(hi) = seq.next_element::<u8>()? {
                if seq.next_element::<u8>()?.is_none() {
                    return Ok(RegisterPair::new(hi, lo))
                }
            }
        }
        Err(de::Error::custom("register pair expects a tuple of two 8-bit integers"))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Self::Value, E> {
        let body = s.strip_prefix('$')
                    .or_else(|| s.strip_prefix("0x"))
                    .unwrap_or(s);
        u16::from_str_radix(body, 16).map(RegisterPair::from)
            .map_err(|_| de::Error::custom("register pair expects a hexadecimal string"))
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for RegisterPair {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: Deserializer<'de>
    {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(RegisterPairVisitor)
        }
        else {
            deserializer.deserialize_u16(RegisterPairVisitor)
        }
    }
}

/// A complete snapshot of the Cpu registers and its internal state.
///
/// The snapshot is copied by value to and from [Z80][crate::Z80] with
/// [Z80::state][crate::Z80::state] and [Z80::set_state][crate::Z80::set_state].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CpuState {
    pub af: RegisterPair,
    pub bc: RegisterPair,
    pub de: RegisterPair,
    pub hl: RegisterPair,
    pub af_alt: RegisterPair,
    pub bc_alt: RegisterPair,
    pub de_alt: RegisterPair,
    pub hl_alt: RegisterPair,
    pub ix: RegisterPair,
    pub iy: RegisterPair,
    pub pc: u16,
    pub sp: u16,
    /// The internal address latch, also known as MEMPTR.
    pub wz: u16,
    pub i: u8,
    pub r: u8,
    pub iff1: bool,
    pub iff2: bool,
    pub im: InterruptMode,
    pub state: StateFlags,
    /// T-states elapsed since the clock was last reset.
    pub tacts: u64,
}

/// The state right after `RESET`.
impl Default for CpuState {
    fn default() -> Self {
        CpuState {
            af: RegisterPair(0xFFFF),
            bc: RegisterPair::default(),
            de: RegisterPair::default(),
            hl: RegisterPair::default(),
            af_alt: RegisterPair(0xFFFF),
            bc_alt: RegisterPair::default(),
            de_alt: RegisterPair::default(),
            hl_alt: RegisterPair::default(),
            ix: RegisterPair::default(),
            iy: RegisterPair::default(),
            pc: 0,
            sp: 0xFFFF,
            wz: 0,
            i: 0,
            r: 0,
            iff1: false,
            iff2: false,
            im: InterruptMode::Mode0,
            state: StateFlags::empty(),
            tacts: 0,
        }
    }
}

macro_rules! state_reg8 {
    ($($get:ident, $set:ident => $pair:ident.$half:ident, $set_half:ident;)*) => {
        $(
            #[inline]
            pub fn $get(&self) -> u8 {
                self.$pair.$half()
            }

            #[inline]
            pub fn $set(&mut self, val: u8) {
                self.$pair.$set_half(val)
            }
        )*
    };
}

impl CpuState {
    state_reg8! {
        a, set_a => af.hi, set_hi;
        f, set_f => af.lo, set_lo;
        b, set_b => bc.hi, set_hi;
        c, set_c => bc.lo, set_lo;
        d, set_d => de.hi, set_hi;
        e, set_e => de.lo, set_lo;
        h, set_h => hl.hi, set_hi;
        l, set_l => hl.lo, set_lo;
        xh, set_xh => ix.hi, set_hi;
        xl, set_xl => ix.lo, set_lo;
        yh, set_yh => iy.hi, set_hi;
        yl, set_yl => iy.lo, set_lo;
    }

    #[inline]
    pub fn flags(&self) -> CpuFlags {
        CpuFlags::from_bits_retain(self.af.lo())
    }

    #[inline]
    pub fn set_flags(&mut self, flags: CpuFlags) {
        self.af.set_lo(flags.bits())
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.state.contains(StateFlags::HALTED)
    }
}
