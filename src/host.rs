/*
    z80nemu: ZiLOG Z80 and ZX Spectrum Next Z80N interpreter library.
    Copyright (C) 2019-2024  Rafal Michalski

    For the full copyright notice, see the lib.rs file.
*/
//! The interfaces between a host and the Cpu.
//!
//! The Cpu never owns memory, ports or the clock. Every instruction borrows them
//! through the [Memory], [Io] and [Clock] traits and charges its T-states with the
//! `Clock` methods, one machine cycle at a time.
use core::fmt;
use core::num::{NonZeroU8, Wrapping};
use core::ops::{AddAssign, Deref, DerefMut};

/// T-state constants of the Z80 machine cycles.
pub mod cycles {
    /// An op-code fetch (M1) cycle T-states. Also used by the HALT idle cycle.
    pub const M1_CYCLE_TS: u8 = 4;
    /// A memory read/write cycle T-states.
    pub const MEMRW_CYCLE_TS: u8 = 3;
    /// An I/O cycle T-states.
    pub const IO_CYCLE_TS: u8 = 4;
    /// A maskable interrupt acknowledge cycle T-states.
    pub const IRQ_ACK_CYCLE_TS: u8 = 6;
}
use cycles::*;

/// A trait responsible for advancing the T-state counter during the Cpu cycles.
///
/// Instructions call these methods in the order of their machine cycles. The
/// implementation decides how the counter is represented.
pub trait Clock {
    /// A type used to represent the limit of T-states.
    type Limit: Copy;
    /// A type produced by the clock methods and passed to the [Memory] and [Io] methods.
    type Timestamp: Copy;
    /// Returns `true` if the counter is at or past the given `limit`.
    fn is_past_limit(&self, limit: Self::Limit) -> bool;
    /// Adds [IRQ_ACK_CYCLE_TS] T-states. Called when a maskable interrupt is acknowledged.
    fn add_irq(&mut self, pc: u16) -> Self::Timestamp;
    /// Adds `add_ts` T-states of an internal operation with no memory request.
    fn add_no_mreq(&mut self, address: u16, add_ts: NonZeroU8);
    /// Adds [IO_CYCLE_TS] T-states and returns the timestamp of the port access.
    fn add_io(&mut self, port: u16) -> Self::Timestamp;
    /// Adds [MEMRW_CYCLE_TS] T-states and returns the timestamp of the memory access.
    fn add_mreq(&mut self, address: u16) -> Self::Timestamp;
    /// Adds [M1_CYCLE_TS] T-states of an op-code fetch.
    fn add_m1(&mut self, address: u16) -> Self::Timestamp;
    /// Returns the current value of the counter as a timestamp.
    fn as_timestamp(&self) -> Self::Timestamp;
}

/// An interface to the memory.
pub trait Memory {
    /// A type used for timestamping memory operations.
    type Timestamp: Sized;
    /// Reads a byte during a memory read cycle.
    fn read_mem(&mut self, address: u16, ts: Self::Timestamp) -> u8;
    /// Reads a byte during an M1 cycle. `ir` holds the `I` and `R` registers.
    ///
    /// The default implementation forwards to [Memory::read_mem].
    fn read_opcode(&mut self, pc: u16, _ir: u16, ts: Self::Timestamp) -> u8 {
        self.read_mem(pc, ts)
    }
    /// Writes a byte during a memory write cycle.
    fn write_mem(&mut self, address: u16, value: u8, ts: Self::Timestamp);
    /// Returns a memory byte without side effects. No timestamp.
    fn read_debug(&self, address: u16) -> u8;
}

/// An interface to the I/O ports.
pub trait Io {
    /// A type used for timestamping I/O operations.
    type Timestamp: Sized;
    /// Reads a byte from the `port`.
    fn read_io(&mut self, port: u16, ts: Self::Timestamp) -> u8;
    /// Writes a byte to the `port`.
    fn write_io(&mut self, port: u16, data: u8, ts: Self::Timestamp);
    /// Writes `value` to the ZX Spectrum Next register `reg` via the TBBlue register ports.
    fn write_next_reg(&mut self, reg: u8, value: u8, ts: Self::Timestamp);
}

/// A simple T-states counter wrapping at 2^bitsize of `T`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TsCounter<T: Copy>(pub Wrapping<T>);

impl<T> TsCounter<T>
    where T: Copy + From<u8>, Wrapping<T>: AddAssign
{
    #[inline]
    fn add_ts(&mut self, ts: u8) {
        self.0 += Wrapping(ts.into());
    }
}

impl<T> Clock for TsCounter<T>
    where T: Copy + PartialOrd + From<u8>,
          Wrapping<T>: AddAssign
{
    type Limit = T;
    type Timestamp = T;

    #[inline]
    fn is_past_limit(&self, limit: Self::Limit) -> bool {
        (self.0).0 >= limit
    }

    #[inline]
    fn add_irq(&mut self, _pc: u16) -> T {
        self.add_ts(IRQ_ACK_CYCLE_TS);
        (self.0).0
    }

    #[inline]
    fn add_no_mreq(&mut self, _address: u16, add_ts: NonZeroU8) {
        self.add_ts(add_ts.get());
    }

    #[inline]
    fn add_io(&mut self, _port: u16) -> T {
        self.add_ts(IO_CYCLE_TS);
        (self.0).0
    }

    #[inline]
    fn add_mreq(&mut self, _address: u16) -> T {
        self.add_ts(MEMRW_CYCLE_TS);
        (self.0).0
    }

    #[inline]
    fn add_m1(&mut self, _address: u16) -> T {
        self.add_ts(M1_CYCLE_TS);
        (self.0).0
    }

    #[inline]
    fn as_timestamp(&self) -> T {
        (self.0).0
    }
}

impl<T: Copy> From<T> for TsCounter<T> {
    fn from(tsc: T) -> Self {
        TsCounter(Wrapping(tsc))
    }
}

impl<T: Copy> Deref for TsCounter<T> {
    type Target = Wrapping<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Copy> DerefMut for TsCounter<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: Copy + fmt::Display> fmt::Display for TsCounter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} T", (self.0).0)
    }
}
