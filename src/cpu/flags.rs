/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! Cpu flags register bits definitions and flag helper methods.
use bitflags::bitflags;

bitflags! {
    /// Z80 Flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CpuFlags: u8 {
        /// Sign Flag.
        const S  = 0b1000_0000;
        /// Zero Flag.
        const Z  = 0b0100_0000;
        /// Undocumented bit 5 of the Flag.
        const Y  = 0b0010_0000;
        /// Half Carry Flag.
        const H  = 0b0001_0000;
        /// Undocumented bit 3 of the Flag.
        const X  = 0b0000_1000;
        /// Parity/Overflow Flag.
        const PV = 0b0000_0100;
        /// Add/Subtract Flag.
        const N  = 0b0000_0010;
        /// Carry Flag.
        const C  = 0b0000_0001;
        /// An alias of [CpuFlags::PV].
        const P  = Self::PV.bits();
        /// An alias of [CpuFlags::PV].
        const V  = Self::PV.bits();
        /// A mask of both undocumented Flag's bits 3 and 5. [CpuFlags::X] | [CpuFlags::Y].
        const XY = Self::X.bits() | Self::Y.bits();
        /// A mask of [CpuFlags::S], [CpuFlags::Z] and both undocumented bits.
        const SZXY = Self::S.bits() | Self::Z.bits() | Self::XY.bits();
    }
}

/// Half-carry detection mask over bits 0..=3.
const HMASK: u8 = CpuFlags::H.bits() - 1;
const H16: u16 = (CpuFlags::H.bits() as u16) << 8;
const HMASK16: u16 = H16 - 1;

impl CpuFlags {
    #[inline]
    pub fn sf(self) -> bool {
        self.contains(CpuFlags::S)
    }

    #[inline]
    pub fn zf(self) -> bool {
        self.contains(CpuFlags::Z)
    }

    #[inline]
    pub fn hf(self) -> bool {
        self.contains(CpuFlags::H)
    }

    #[inline]
    pub fn pvf(self) -> bool {
        self.contains(CpuFlags::PV)
    }

    #[inline]
    pub fn nf(self) -> bool {
        self.contains(CpuFlags::N)
    }

    #[inline]
    pub fn cf(self) -> bool {
        self.contains(CpuFlags::C)
    }

    /// Returns the flag set only when `cond` is `true`.
    #[inline]
    pub const fn when(self, cond: bool) -> Self {
        if cond { self } else { CpuFlags::empty() }
    }

    /// [S][CpuFlags::S] copied from bit 7 of `res`.
    #[inline]
    pub fn mask_sign(res: u8) -> Self {
        Self::from_bits_truncate(res & CpuFlags::S.bits())
    }

    #[inline]
    pub fn mask_zero(res: u8) -> Self {
        CpuFlags::Z.when(res == 0)
    }

    /// [PV][CpuFlags::PV] set if `res` has an even number of bits set.
    #[inline]
    pub fn parity(res: u8) -> Self {
        CpuFlags::PV.when(res.count_ones() & 1 == 0)
    }

    /// Bits 3 and 5 of `res` as [X][CpuFlags::X] and [Y][CpuFlags::Y].
    #[inline]
    pub fn mask_xy(res: u8) -> Self {
        Self::from_bits_truncate(res & CpuFlags::XY.bits())
    }

    #[inline]
    pub fn mask_sxy(res: u8) -> Self {
        Self::from_bits_truncate(res & (CpuFlags::S.bits() | CpuFlags::XY.bits()))
    }

    /// S, Z and both undocumented bits derived from `res`.
    #[inline]
    pub fn mask_szxy(res: u8) -> Self {
        Self::mask_sxy(res) | Self::mask_zero(res)
    }

    /// Flags of the logic group: SZ53 and parity of `res` with the given H and C.
    #[inline]
    pub fn mask_bitops(res: u8, hf: bool, cf: bool) -> Self {
        Self::mask_szxy(res) | Self::parity(res) | CpuFlags::H.when(hf) | CpuFlags::C.when(cf)
    }

    #[inline]
    pub fn mask_nh_add(tgt: u8, add: u8, cf: bool) -> Self {
        let half = (tgt & HMASK) + (add & HMASK) + u8::from(cf);
        CpuFlags::H.when(half & CpuFlags::H.bits() != 0)
    }

    #[inline]
    pub fn mask_nh_sub(tgt: u8, sub: u8, cf: bool) -> Self {
        let half = (tgt & HMASK).wrapping_sub(sub & HMASK).wrapping_sub(u8::from(cf));
        CpuFlags::N | CpuFlags::H.when(half & CpuFlags::H.bits() != 0)
    }

    #[inline]
    pub fn mask_nh_add16(tgt: u16, add: u16, cf: bool) -> Self {
        let half = (tgt & HMASK16) + (add & HMASK16) + u16::from(cf);
        CpuFlags::H.when(half & H16 != 0)
    }

    #[inline]
    pub fn mask_nh_sub16(tgt: u16, sub: u16, cf: bool) -> Self {
        let half = (tgt & HMASK16).wrapping_sub(sub & HMASK16).wrapping_sub(u16::from(cf));
        CpuFlags::N | CpuFlags::H.when(half & H16 != 0)
    }

    /// The undocumented block transfer/compare mapping: bit 3 to X, bit 1 to Y.
    #[inline]
    pub fn mask_block_op_xy(n: u8) -> Self {
        Self::from_bits_truncate(n & CpuFlags::X.bits() | n << 4 & CpuFlags::Y.bits())
    }
}
